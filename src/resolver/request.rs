//! 参数请求协议
//!
//! 当且仅当缺失集合非空才发出 ParamRequest；missing 携带完整字段快照（含校验与标签），
//! 前端渲染表单无需回查注册表。历史请求不可变：回答合并后重新计算，仍有缺口就发一条新请求。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::EngineError;
use crate::registry::{describe_action, ActionKind, FieldDescriptor};
use crate::resolver::{known_values, missing_fields, FieldIssue};

/// 发给外部 UI 的结构化参数请求
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParamRequest {
    /// 动作 id（如 sendToken）
    pub action: String,
    /// 面向用户的动作名
    pub action_label: String,
    /// 为什么需要这些参数（校验失败时附带字段级原因）
    pub reason: String,
    /// 缺失字段的完整描述符快照，按注册表声明顺序
    pub missing: Vec<FieldDescriptor>,
    /// 已经解析到的值
    #[serde(default)]
    pub known: Map<String, Value>,
}

impl ParamRequest {
    /// 构造参数请求；missing 为空是协议误用（EmptyRequest），禁止无意义往返
    pub fn build(
        kind: ActionKind,
        reason: String,
        missing: Vec<FieldDescriptor>,
        known: Map<String, Value>,
    ) -> Result<Self, EngineError> {
        if missing.is_empty() {
            return Err(EngineError::EmptyRequest);
        }
        // 不变式：missing 中不出现已在 known 里有值的字段
        let missing = missing
            .into_iter()
            .filter(|f| !known.contains_key(&f.id))
            .collect::<Vec<_>>();
        if missing.is_empty() {
            return Err(EngineError::EmptyRequest);
        }
        let desc = describe_action(kind);
        Ok(Self {
            action: kind.id().to_string(),
            action_label: desc.label.to_string(),
            reason,
            missing,
            known,
        })
    }

    /// 从当前值袋构造请求：缺失集合为空时返回 EmptyRequest，调用方应直接进入闸门 / 模板化
    pub fn from_provided(
        kind: ActionKind,
        reason: &str,
        provided: &Map<String, Value>,
    ) -> Result<Self, EngineError> {
        let missing = missing_fields(kind, provided)?
            .into_iter()
            .cloned()
            .collect();
        let known = known_values(kind, provided)?;
        Self::build(kind, reason.to_string(), missing, known)
    }

    /// 从校验失败构造新一轮请求：失败字段重新进入缺失集合，原因并入 reason
    pub fn from_issues(
        kind: ActionKind,
        issues: Vec<FieldIssue>,
        provided: &Map<String, Value>,
    ) -> Result<Self, EngineError> {
        let reason = issues
            .iter()
            .map(|i| i.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        let mut known = known_values(kind, provided)?;
        for issue in &issues {
            known.remove(&issue.field.id);
        }
        let missing = issues.into_iter().map(|i| i.field).collect();
        Self::build(kind, reason, missing, known)
    }
}
