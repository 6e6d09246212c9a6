//! 交易动作工具
//!
//! 每个 ActionKind 一个可调用工具，统一跑 prepare_action 流水线：
//! 参数不全返回 ParamRequest，余额不足返回拒绝，否则产出模板化交易载荷。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::core::EngineError;
use crate::engine::{prepare_action, RequestContext};
use crate::gate::BalanceObserver;
use crate::registry::ActionKind;
use crate::tools::registry::{ActionTool, ToolOutput, ToolRegistry};
use crate::tools::schema::action_parameters_schema;

/// 动作工具：kind 决定模式、闸门与源码，余额观测器注入以保持可测
pub struct TransactionTool {
    kind: ActionKind,
    balance: Arc<dyn BalanceObserver>,
}

impl TransactionTool {
    pub fn new(kind: ActionKind, balance: Arc<dyn BalanceObserver>) -> Self {
        Self { kind, balance }
    }

    fn static_description(kind: ActionKind) -> &'static str {
        match kind {
            ActionKind::SendToken => {
                "Send FLOW or USDC tokens to a recipient address. Use this when the user wants to transfer tokens immediately."
            }
            ActionKind::ScheduleSendToken => {
                "Schedule a token send for future execution. Use this when the user wants to send tokens at a specific time in the future."
            }
            ActionKind::ScheduleSwapToken => {
                "Schedule a token swap for future execution. Use this when the user wants to swap tokens at a specific time."
            }
            ActionKind::SwapTokens => {
                "Execute an immediate token swap from FLOW to USDC. Use this when the user wants to swap tokens now."
            }
            ActionKind::SetupFlowMateActions => {
                "Setup the FlowMate action handler. This must be run once before scheduling any actions."
            }
            ActionKind::CancelScheduledAction => {
                "Cancel a previously scheduled transaction. Use this when the user wants to cancel a pending scheduled action."
            }
            ActionKind::ClaimAndRestake => {
                "Claim staking rewards and automatically restake them in the same pool. Use this when the user wants to compound their staking rewards."
            }
        }
    }
}

fn value_bag(args: Value) -> Map<String, Value> {
    match args {
        Value::Object(map) => map,
        // 非对象参数按空值袋处理，缺字段会走参数请求
        _ => Map::new(),
    }
}

#[async_trait]
impl ActionTool for TransactionTool {
    fn name(&self) -> &str {
        self.kind.id()
    }

    fn description(&self) -> &str {
        Self::static_description(self.kind)
    }

    fn parameters_schema(&self) -> Value {
        action_parameters_schema(self.kind)
    }

    async fn execute(&self, args: Value, ctx: &RequestContext) -> Result<ToolOutput, EngineError> {
        let provided = value_bag(args);
        prepare_action(self.kind, &provided, ctx, self.balance.as_ref()).await
    }
}

/// 把全部动作工具注册进注册表（每个 ActionKind 一个）
pub fn register_transaction_tools(registry: &mut ToolRegistry, balance: Arc<dyn BalanceObserver>) {
    for kind in ActionKind::ALL {
        registry.register(TransactionTool::new(*kind, balance.clone()));
    }
}
