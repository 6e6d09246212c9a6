//! 相对时间解析
//!
//! 抽取（extract_relative_instruction）与换算（resolve）分离：抽取是句法层面的尽力而为，
//! 不匹配就返回 None；换算按固定偏移表计算，绝不从猜测捏造时间 —— 模糊指令一律降级为
//! 通过参数请求向用户显式询问。接受进 ResolvedAction 的时间戳必须严格大于当前时间。

use std::sync::OnceLock;

use regex::Regex;

use crate::core::EngineError;

/// 识别出的相对时间指令（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeInstruction {
    Minutes(u64),
    Hours(u64),
    Days(u64),
    Tomorrow,
    NextWeek,
}

static MINUTES_RE: OnceLock<Regex> = OnceLock::new();
static HOURS_RE: OnceLock<Regex> = OnceLock::new();
static DAYS_RE: OnceLock<Regex> = OnceLock::new();
static TOMORROW_RE: OnceLock<Regex> = OnceLock::new();
static NEXT_WEEK_RE: OnceLock<Regex> = OnceLock::new();

fn minutes_re() -> &'static Regex {
    MINUTES_RE.get_or_init(|| {
        Regex::new(r"(?i)(?:in|after|within)\s+(\d+)\s*(?:minutes?|mins?)").unwrap()
    })
}

fn hours_re() -> &'static Regex {
    HOURS_RE
        .get_or_init(|| Regex::new(r"(?i)(?:in|after|within)\s+(\d+)\s*(?:hours?|hrs?)").unwrap())
}

fn days_re() -> &'static Regex {
    DAYS_RE.get_or_init(|| Regex::new(r"(?i)(?:in|after|within)\s+(\d+)\s*(?:days?)").unwrap())
}

fn tomorrow_re() -> &'static Regex {
    TOMORROW_RE.get_or_init(|| Regex::new(r"(?i)tomorrow").unwrap())
}

fn next_week_re() -> &'static Regex {
    NEXT_WEEK_RE.get_or_init(|| Regex::new(r"(?i)next\s+week").unwrap())
}

fn capture_number(re: &Regex, text: &str) -> Option<u64> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// 从自由文本中抽取相对时间指令
///
/// 优先级：显式数字单位（分钟 > 小时 > 天）> tomorrow > next week，只取首个满足的规则；
/// 都不匹配返回 None，调用方应回退到显式询问时间戳。
pub fn extract_relative_instruction(text: &str) -> Option<RelativeInstruction> {
    if let Some(n) = capture_number(minutes_re(), text) {
        return Some(RelativeInstruction::Minutes(n));
    }
    if let Some(n) = capture_number(hours_re(), text) {
        return Some(RelativeInstruction::Hours(n));
    }
    if let Some(n) = capture_number(days_re(), text) {
        return Some(RelativeInstruction::Days(n));
    }
    if tomorrow_re().is_match(text) {
        return Some(RelativeInstruction::Tomorrow);
    }
    if next_week_re().is_match(text) {
        return Some(RelativeInstruction::NextWeek);
    }
    None
}

/// 按固定偏移表把相对指令换算为绝对 Unix 时间戳（秒）
///
/// 换算全程用受检算术：荒谬的数字（偏移或相加溢出 u64）返回 None，
/// 而不是回绕出一个看似合法的未来时间。
pub fn resolve(current_unix_time: u64, instruction: RelativeInstruction) -> Option<u64> {
    let offset = match instruction {
        RelativeInstruction::Minutes(n) => n.checked_mul(60)?,
        RelativeInstruction::Hours(n) => n.checked_mul(3600)?,
        RelativeInstruction::Days(n) => n.checked_mul(86_400)?,
        RelativeInstruction::Tomorrow => 86_400,
        RelativeInstruction::NextWeek => 604_800,
    };
    current_unix_time.checked_add(offset)
}

/// 抽取 + 换算的组合入口；文本中无可识别指令或换算溢出时返回 None
pub fn resolve_phrase(current_unix_time: u64, text: &str) -> Option<u64> {
    extract_relative_instruction(text).and_then(|instr| resolve(current_unix_time, instr))
}

/// 未来性校验：时间戳必须严格大于当前时间，过去的时间拒绝而非截断
pub fn ensure_future(current_unix_time: u64, timestamp: u64, field: &str) -> Result<u64, EngineError> {
    if timestamp > current_unix_time {
        Ok(timestamp)
    } else {
        Err(EngineError::PastTimestamp {
            field: field.to_string(),
        })
    }
}
