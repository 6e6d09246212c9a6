//! 字段解析器
//!
//! missing_fields 只管完整性（值缺失 / null / 空串即缺），known_values 给出「已理解」的子集，
//! 两者分开返回：表单对缺失字段不做预填，对已知字段照常展示上下文。
//! 类型转换（coerce_value）是显式的独立步骤，校验（validate_value）始终作用在已定型的值上。

pub mod request;

use serde_json::{Map, Value};

use crate::core::EngineError;
use crate::registry::{describe_action, ActionKind, FieldDescriptor, FieldType};
use crate::timestamp;

pub use request::ParamRequest;

/// 完整性判定：undefined / null / 空串一律视为缺失（空串对 Text 可选字段也视为缺）
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// 按注册表声明顺序返回缺失的必填字段（浅判定，不做类型校验）
pub fn missing_fields(
    kind: ActionKind,
    provided: &Map<String, Value>,
) -> Result<Vec<&'static FieldDescriptor>, EngineError> {
    let desc = describe_action(kind);
    Ok(desc
        .required_fields()?
        .into_iter()
        .filter(|field| !is_present(provided.get(&field.id)))
        .collect())
}

/// 返回已提供的值（限定在该动作声明的必填 + 可选字段内），作为 ParamRequest 的 known 块
pub fn known_values(
    kind: ActionKind,
    provided: &Map<String, Value>,
) -> Result<Map<String, Value>, EngineError> {
    let desc = describe_action(kind);
    let mut known = Map::new();
    for field in desc
        .required_fields()?
        .into_iter()
        .chain(desc.optional_fields()?)
    {
        if let Some(value) = provided.get(&field.id) {
            if is_present(Some(value)) {
                known.insert(field.id.clone(), value.clone());
            }
        }
    }
    Ok(known)
}

/// 合并用户回答：按字段 id 后写覆盖（last-write-wins），原 bag 不被修改
pub fn merge_answers(
    provided: &Map<String, Value>,
    answers: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = provided.clone();
    for (k, v) in answers {
        merged.insert(k.clone(), v.clone());
    }
    merged
}

/// 校验失败的字段及面向用户的原因，随下一轮 ParamRequest 返回
#[derive(Debug, Clone)]
pub struct FieldIssue {
    pub field: FieldDescriptor,
    pub message: String,
}

/// 全部必填字段齐备且通过校验的动作，余额闸门与模板化的输入
#[derive(Debug, Clone)]
pub struct ResolvedAction {
    pub kind: ActionKind,
    pub values: Map<String, Value>,
}

impl ResolvedAction {
    /// 取已定型的小数值（金额类字段）
    pub fn decimal(&self, field_id: &str) -> Option<f64> {
        self.values.get(field_id).and_then(Value::as_f64)
    }

    /// 取已定型的字符串值
    pub fn text(&self, field_id: &str) -> Option<&str> {
        self.values.get(field_id).and_then(Value::as_str)
    }
}

/// 解析结果：要么动作完整，要么带着逐字段原因回到参数请求
#[derive(Debug)]
pub enum Resolution {
    Complete(ResolvedAction),
    Incomplete(Vec<FieldIssue>),
}

/// 把 UI 层的原始值显式转换为字段类型对应的 JSON 值
///
/// Timestamp 字段额外接受相对时间短语（"in 5 minutes" / "tomorrow"），按请求携带的
/// now 换算；无法识别的短语不猜测，转换失败让字段重新进入缺失集合。
pub fn coerce_value(field: &FieldDescriptor, raw: &Value, now: u64) -> Result<Value, String> {
    match field.field_type {
        FieldType::Address | FieldType::String => match raw {
            Value::String(s) => Ok(Value::String(s.clone())),
            _ => Err(format!("expected a string for {}", field.label)),
        },
        FieldType::Enum => match raw {
            Value::String(s) => Ok(Value::String(s.clone())),
            _ => Err(format!("expected one of the listed options for {}", field.label)),
        },
        FieldType::UFix64 => match raw {
            Value::Number(n) => n
                .as_f64()
                .map(|f| Value::from(f))
                .ok_or_else(|| format!("invalid number for {}", field.label)),
            Value::String(s) => s
                .parse::<f64>()
                .map(Value::from)
                .map_err(|_| format!("could not parse '{s}' as a decimal amount")),
            _ => Err(format!("expected a decimal number for {}", field.label)),
        },
        FieldType::UInt64 | FieldType::UInt8 => {
            let n = match raw {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s.parse::<u64>().ok(),
                _ => None,
            }
            .ok_or_else(|| format!("expected a non-negative integer for {}", field.label))?;
            if field.field_type == FieldType::UInt8 && n > u8::MAX as u64 {
                return Err(format!("{} must fit in 8 bits", field.label));
            }
            Ok(Value::from(n))
        }
        FieldType::Timestamp => {
            let ts = match raw {
                Value::Number(n) => n.as_u64(),
                Value::String(s) => s
                    .parse::<u64>()
                    .ok()
                    .or_else(|| timestamp::resolve_phrase(now, s)),
                _ => None,
            }
            .ok_or_else(|| {
                "could not understand the time instruction; please pick an explicit time"
                    .to_string()
            })?;
            Ok(Value::from(ts))
        }
        FieldType::Bool => match raw {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) if s == "true" => Ok(Value::Bool(true)),
            Value::String(s) if s == "false" => Ok(Value::Bool(false)),
            _ => Err(format!("expected true or false for {}", field.label)),
        },
    }
}

/// 对已定型的值执行描述符校验（pattern / min / max / 枚举成员 / 时间未来性）
pub fn validate_value(field: &FieldDescriptor, typed: &Value, now: u64) -> Result<(), String> {
    if let Some(validation) = &field.validation {
        if let Some(pattern) = &validation.pattern {
            let s = typed.as_str().unwrap_or_default();
            let re = regex::Regex::new(pattern)
                .map_err(|e| format!("invalid pattern for {}: {e}", field.label))?;
            if !re.is_match(s) {
                return Err(format!("'{s}' is not a valid {}", field.label));
            }
        }
        if let Some(n) = typed.as_f64() {
            if let Some(min) = validation.min {
                if n < min {
                    return Err(format!("{} must be at least {min}", field.label));
                }
            }
            if let Some(max) = validation.max {
                if n > max {
                    return Err(format!("{} must be at most {max}", field.label));
                }
            }
        }
    }
    if let Some(options) = &field.enum_options {
        let s = typed.as_str().unwrap_or_default();
        if !options.iter().any(|o| o == s) {
            return Err(format!(
                "'{s}' is not one of the allowed options for {}: {}",
                field.label,
                options.join(", ")
            ));
        }
    }
    if field.field_type == FieldType::Timestamp {
        let ts = typed.as_u64().unwrap_or_default();
        if timestamp::ensure_future(now, ts, &field.id).is_err() {
            return Err("selected time is in the past".to_string());
        }
    }
    Ok(())
}

/// 把值袋解析为完整动作：必填字段逐个定型并校验，可选字段缺省时套用默认值
///
/// 校验失败不终止本轮，以 FieldIssue 列表返回，协议层据此发出新的参数请求。
pub fn resolve_action(
    kind: ActionKind,
    provided: &Map<String, Value>,
    now: u64,
) -> Result<Resolution, EngineError> {
    let desc = describe_action(kind);
    let mut values = Map::new();
    let mut issues = Vec::new();

    for field in desc.required_fields()? {
        if !is_present(provided.get(&field.id)) {
            issues.push(FieldIssue {
                field: field.clone(),
                message: format!("{} is required", field.label),
            });
            continue;
        }
        let raw = &provided[&field.id];
        match coerce_value(field, raw, now).and_then(|typed| {
            validate_value(field, &typed, now).map(|_| typed)
        }) {
            Ok(typed) => {
                values.insert(field.id.clone(), typed);
            }
            Err(message) => issues.push(FieldIssue {
                field: field.clone(),
                message,
            }),
        }
    }

    for field in desc.optional_fields()? {
        if is_present(provided.get(&field.id)) {
            let raw = &provided[&field.id];
            match coerce_value(field, raw, now).and_then(|typed| {
                validate_value(field, &typed, now).map(|_| typed)
            }) {
                Ok(typed) => {
                    values.insert(field.id.clone(), typed);
                }
                Err(message) => issues.push(FieldIssue {
                    field: field.clone(),
                    message,
                }),
            }
        } else if let Some(default) = desc.defaults.get(&field.id) {
            values.insert(field.id.clone(), default.clone());
        }
    }

    if issues.is_empty() {
        Ok(Resolution::Complete(ResolvedAction { kind, values }))
    } else {
        Ok(Resolution::Incomplete(issues))
    }
}
