//! 动作注册表
//!
//! ActionKind 是支持动作的封闭联合：会话层给出的动作名先经 parse 校验再分发，
//! 不信任任意字符串。每种动作的必填 / 可选字段与默认值在此集中声明，
//! 字段元数据一律回字段目录查询，不在别处复制。

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::core::EngineError;
use crate::registry::fields::{describe_field, FieldDescriptor};

/// 支持的动作种类（封闭联合，serde 名与会话层的 actionId 一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionKind {
    SendToken,
    ScheduleSendToken,
    ScheduleSwapToken,
    SwapTokens,
    SetupFlowMateActions,
    CancelScheduledAction,
    ClaimAndRestake,
}

impl ActionKind {
    /// 全部动作种类，注册工具时按此遍历
    pub const ALL: &'static [ActionKind] = &[
        ActionKind::SendToken,
        ActionKind::ScheduleSendToken,
        ActionKind::ScheduleSwapToken,
        ActionKind::SwapTokens,
        ActionKind::SetupFlowMateActions,
        ActionKind::CancelScheduledAction,
        ActionKind::ClaimAndRestake,
    ];

    /// 校验会话层传入的动作名；未注册返回 UnknownAction
    pub fn parse(id: &str) -> Result<Self, EngineError> {
        match id {
            "sendToken" => Ok(ActionKind::SendToken),
            "scheduleSendToken" => Ok(ActionKind::ScheduleSendToken),
            "scheduleSwapToken" => Ok(ActionKind::ScheduleSwapToken),
            "swapTokens" => Ok(ActionKind::SwapTokens),
            "setupFlowMateActions" => Ok(ActionKind::SetupFlowMateActions),
            "cancelScheduledAction" => Ok(ActionKind::CancelScheduledAction),
            "claimAndRestake" => Ok(ActionKind::ClaimAndRestake),
            other => Err(EngineError::UnknownAction(other.to_string())),
        }
    }

    /// 动作名（actionId），与 parse 互逆
    pub fn id(&self) -> &'static str {
        match self {
            ActionKind::SendToken => "sendToken",
            ActionKind::ScheduleSendToken => "scheduleSendToken",
            ActionKind::ScheduleSwapToken => "scheduleSwapToken",
            ActionKind::SwapTokens => "swapTokens",
            ActionKind::SetupFlowMateActions => "setupFlowMateActions",
            ActionKind::CancelScheduledAction => "cancelScheduledAction",
            ActionKind::ClaimAndRestake => "claimAndRestake",
        }
    }

    /// 是否为价值转移动作：是则在模板化前强制过余额闸门
    pub fn is_value_transferring(&self) -> bool {
        matches!(
            self,
            ActionKind::SendToken
                | ActionKind::ScheduleSendToken
                | ActionKind::ScheduleSwapToken
                | ActionKind::SwapTokens
        )
    }
}

/// 动作描述符：必填 / 可选字段（有序）与可选字段缺省值
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub kind: ActionKind,
    /// 面向用户的动作名（ParamRequest.actionLabel）
    pub label: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub defaults: Map<String, Value>,
}

impl ActionDescriptor {
    /// 按声明顺序解析必填字段描述符
    pub fn required_fields(&self) -> Result<Vec<&'static FieldDescriptor>, EngineError> {
        self.required.iter().map(|id| describe_field(id)).collect()
    }

    /// 按声明顺序解析可选字段描述符
    pub fn optional_fields(&self) -> Result<Vec<&'static FieldDescriptor>, EngineError> {
        self.optional.iter().map(|id| describe_field(id)).collect()
    }
}

fn defaults(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// 查询动作描述符（必填 ∩ 可选 = ∅，进程启动即固定，不可由用户修改）
pub fn describe_action(kind: ActionKind) -> ActionDescriptor {
    match kind {
        ActionKind::SendToken => ActionDescriptor {
            kind,
            label: "Send Tokens",
            required: &["recipient", "amount"],
            optional: &["tokenType"],
            defaults: defaults(&[("tokenType", json!("FlowToken"))]),
        },
        ActionKind::ScheduleSendToken => ActionDescriptor {
            kind,
            label: "Schedule Token Send",
            required: &["recipient", "amount", "timestamp"],
            optional: &["tokenType", "priority", "executionEffort", "feeAmount"],
            defaults: defaults(&[
                ("tokenType", json!("FlowToken")),
                ("priority", json!(2)),
                ("executionEffort", json!(1000)),
                ("feeAmount", json!(0.001)),
            ]),
        },
        ActionKind::ScheduleSwapToken => ActionDescriptor {
            kind,
            label: "Schedule Token Swap",
            required: &["fromToken", "toToken", "amount", "timestamp"],
            optional: &["priority", "executionEffort", "feeAmount"],
            defaults: defaults(&[
                ("priority", json!(2)),
                ("executionEffort", json!(1000)),
                ("feeAmount", json!(0.001)),
            ]),
        },
        ActionKind::SwapTokens => ActionDescriptor {
            kind,
            label: "Swap Tokens",
            required: &["amount"],
            optional: &[],
            defaults: Map::new(),
        },
        ActionKind::SetupFlowMateActions => ActionDescriptor {
            kind,
            label: "Setup FlowMate Actions",
            required: &[],
            optional: &[],
            defaults: Map::new(),
        },
        ActionKind::CancelScheduledAction => ActionDescriptor {
            kind,
            label: "Cancel Scheduled Action",
            required: &["transactionId"],
            optional: &[],
            defaults: Map::new(),
        },
        ActionKind::ClaimAndRestake => ActionDescriptor {
            kind,
            label: "Claim and Restake",
            required: &["pid"],
            optional: &[],
            defaults: Map::new(),
        },
    }
}
