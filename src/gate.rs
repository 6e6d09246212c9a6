//! 余额闸门
//!
//! 价值转移动作在模板化前必须经过一次余额观测：balance ≥ amount 放行，否则带观测余额与
//! 差额拒绝。定时动作同样在构建时刻闸门（引擎无法预知未来余额，只拦当下不足）。
//! 观测失败是「无法放行」而不是「余额不足」。拒绝后不自动重试，由用户改小金额或充值后重新发起。

use async_trait::async_trait;
use serde::Serialize;

use crate::core::{EngineError, ObservationError};
use crate::registry::ActionKind;
use crate::resolver::ResolvedAction;
use crate::templater::Network;

/// 余额观测接口（外部协作方：链上查询由传输层实现）
#[async_trait]
pub trait BalanceObserver: Send + Sync {
    /// 查询 holder 在指定网络上某代币的余额
    async fn get_balance(
        &self,
        holder: &str,
        token: &str,
        network: Network,
    ) -> Result<f64, ObservationError>;
}

/// 闸门状态机：PARAMS_PENDING → PARAMS_COMPLETE → BALANCE_CHECKED → {APPROVED, REJECTED}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateState {
    ParamsPending,
    ParamsComplete,
    BalanceChecked,
    Approved,
    Rejected,
}

/// 拒绝详情：观测到的余额与差额（requested − balance），供用户消息使用
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRejection {
    pub token: String,
    pub requested: f64,
    pub balance: f64,
    pub shortfall: f64,
}

/// 闸门结果：终态判定附带完整状态轨迹（随审计日志输出）
#[derive(Debug, Clone)]
pub enum GateOutcome {
    Approved { balance: f64, trail: Vec<GateState> },
    Rejected { rejection: BalanceRejection, trail: Vec<GateState> },
}

impl GateOutcome {
    pub fn state(&self) -> GateState {
        match self {
            GateOutcome::Approved { .. } => GateState::Approved,
            GateOutcome::Rejected { .. } => GateState::Rejected,
        }
    }

    /// 本次判定实际经过的状态序列；跳过闸门的动作不含 BALANCE_CHECKED
    pub fn trail(&self) -> &[GateState] {
        match self {
            GateOutcome::Approved { trail, .. } | GateOutcome::Rejected { trail, .. } => trail,
        }
    }
}

/// 动作中被闸门的 (代币, 金额)：send 用 tokenType（默认 FlowToken），
/// 定时 swap 用 fromToken，即时 swap 固定 FLOW→USDC。非转移动作返回 None。
pub fn gated_transfer(action: &ResolvedAction) -> Option<(String, f64)> {
    if !action.kind.is_value_transferring() {
        return None;
    }
    let amount = action.decimal("amount")?;
    let token = match action.kind {
        ActionKind::SendToken | ActionKind::ScheduleSendToken => action
            .text("tokenType")
            .unwrap_or("FlowToken")
            .to_string(),
        ActionKind::ScheduleSwapToken => action.text("fromToken")?.to_string(),
        ActionKind::SwapTokens => "FlowToken".to_string(),
        _ => return None,
    };
    Some((token, amount))
}

/// 对已完整的动作执行一次余额观测并判定
pub async fn check(
    action: &ResolvedAction,
    holder: &str,
    network: Network,
    observer: &dyn BalanceObserver,
) -> Result<GateOutcome, EngineError> {
    // 进入 check 的动作已解析完整
    let mut trail = vec![GateState::ParamsComplete];

    let (token, requested) = match gated_transfer(action) {
        Some(t) => t,
        // 非转移动作不进闸门，视同放行
        None => {
            trail.push(GateState::Approved);
            return Ok(GateOutcome::Approved { balance: 0.0, trail });
        }
    };

    let balance = observer.get_balance(holder, &token, network).await?;
    trail.push(GateState::BalanceChecked);
    tracing::debug!(holder, token = %token, balance, requested, "balance gate");

    if balance >= requested {
        trail.push(GateState::Approved);
        Ok(GateOutcome::Approved { balance, trail })
    } else {
        trail.push(GateState::Rejected);
        Ok(GateOutcome::Rejected {
            rejection: BalanceRejection {
                token,
                requested,
                balance,
                shortfall: requested - balance,
            },
            trail,
        })
    }
}
