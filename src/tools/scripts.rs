//! 只读脚本工具
//!
//! 余额查询、setup 状态与当前时间三个观测类工具。链上查询与时钟都是外部协作方
//! （trait 注入），引擎不直接读本地时钟，解析保持确定可测。

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::{EngineError, ObservationError};
use crate::engine::RequestContext;
use crate::gate::BalanceObserver;
use crate::templater::Network;
use crate::tools::registry::{ActionTool, ToolOutput, ToolRegistry};

/// setup 状态观测接口（外部协作方）
#[async_trait]
pub trait SetupObserver: Send + Sync {
    async fn get_setup_status(
        &self,
        holder: &str,
        network: Network,
    ) -> Result<bool, ObservationError>;
}

/// 当前时间观测接口（外部协作方）
#[async_trait]
pub trait TimeObserver: Send + Sync {
    async fn current_time(&self) -> Result<u64, ObservationError>;
}

/// 查询已登录用户某代币的余额
pub struct GetUserBalanceTool {
    observer: Arc<dyn BalanceObserver>,
}

impl GetUserBalanceTool {
    pub fn new(observer: Arc<dyn BalanceObserver>) -> Self {
        Self { observer }
    }
}

#[async_trait]
impl ActionTool for GetUserBalanceTool {
    fn name(&self) -> &str {
        "getUserBalance"
    }

    fn description(&self) -> &str {
        "Get the signed in user's balance of a token. \
         Always call this before any send/swap/schedule action."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "tokenType": {
                    "type": "string",
                    "enum": ["FlowToken", "USDCFlow", "stFlowToken"],
                    "description": "Token type to get the balance of"
                }
            },
            "required": ["tokenType"]
        })
    }

    async fn execute(&self, args: Value, ctx: &RequestContext) -> Result<ToolOutput, EngineError> {
        let token = args
            .get("tokenType")
            .and_then(Value::as_str)
            .unwrap_or("FlowToken")
            .to_string();
        let balance = self
            .observer
            .get_balance(&ctx.wallet, &token, ctx.network)
            .await?;
        Ok(ToolOutput::Observation(json!({
            "balance": balance,
            "description": format!("The balance of {token} for {} is {balance}", ctx.wallet),
        })))
    }
}

/// 查询用户是否已完成 FlowMate setup
pub struct CheckSetupStatusTool {
    observer: Arc<dyn SetupObserver>,
}

impl CheckSetupStatusTool {
    pub fn new(observer: Arc<dyn SetupObserver>) -> Self {
        Self { observer }
    }
}

#[async_trait]
impl ActionTool for CheckSetupStatusTool {
    fn name(&self) -> &str {
        "checkSetupStatus"
    }

    fn description(&self) -> &str {
        "Check whether the signed in user has completed the FlowMate setup (no parameters)."
    }

    async fn execute(&self, _args: Value, ctx: &RequestContext) -> Result<ToolOutput, EngineError> {
        let is_setup = self
            .observer
            .get_setup_status(&ctx.wallet, ctx.network)
            .await?;
        Ok(ToolOutput::Observation(json!({ "isSetup": is_setup })))
    }
}

/// 获取当前 Unix 时间戳（秒），定时动作先调它再换算相对时间
pub struct GetCurrentTimestampTool {
    observer: Arc<dyn TimeObserver>,
}

impl GetCurrentTimestampTool {
    pub fn new(observer: Arc<dyn TimeObserver>) -> Self {
        Self { observer }
    }
}

#[async_trait]
impl ActionTool for GetCurrentTimestampTool {
    fn name(&self) -> &str {
        "getCurrentTimestamp"
    }

    fn description(&self) -> &str {
        "Get the current Unix timestamp in seconds (no parameters). \
         Call this first when the user wants to schedule an action."
    }

    async fn execute(&self, _args: Value, _ctx: &RequestContext) -> Result<ToolOutput, EngineError> {
        let timestamp = self.observer.current_time().await?;
        Ok(ToolOutput::Observation(json!({ "timestamp": timestamp })))
    }
}

/// 注册三个脚本工具
pub fn register_script_tools(
    registry: &mut ToolRegistry,
    balance: Arc<dyn BalanceObserver>,
    setup: Arc<dyn SetupObserver>,
    time: Arc<dyn TimeObserver>,
) {
    registry.register(GetUserBalanceTool::new(balance));
    registry.register(CheckSetupStatusTool::new(setup));
    registry.register(GetCurrentTimestampTool::new(time));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templater::AddressBook;

    struct FixedBalance(f64);

    #[async_trait]
    impl BalanceObserver for FixedBalance {
        async fn get_balance(
            &self,
            _holder: &str,
            _token: &str,
            _network: Network,
        ) -> Result<f64, ObservationError> {
            Ok(self.0)
        }
    }

    struct FixedSetup(bool);

    #[async_trait]
    impl SetupObserver for FixedSetup {
        async fn get_setup_status(
            &self,
            _holder: &str,
            _network: Network,
        ) -> Result<bool, ObservationError> {
            Ok(self.0)
        }
    }

    struct FixedClock(u64);

    #[async_trait]
    impl TimeObserver for FixedClock {
        async fn current_time(&self) -> Result<u64, ObservationError> {
            Ok(self.0)
        }
    }

    fn ctx() -> RequestContext {
        RequestContext::new(
            Network::Testnet,
            "0xabc0000000000001",
            0,
            Arc::new(AddressBook::empty()),
        )
    }

    #[tokio::test]
    async fn test_balance_observation() {
        let tool = GetUserBalanceTool::new(Arc::new(FixedBalance(42.5)));
        let out = tool
            .execute(json!({"tokenType": "USDCFlow"}), &ctx())
            .await
            .unwrap();
        match out {
            ToolOutput::Observation(v) => {
                assert_eq!(v["balance"], 42.5);
                assert!(v["description"].as_str().unwrap().contains("USDCFlow"));
            }
            other => panic!("expected observation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_setup_and_time_observations() {
        let setup = CheckSetupStatusTool::new(Arc::new(FixedSetup(true)));
        let out = setup.execute(Value::Null, &ctx()).await.unwrap();
        assert_eq!(out.to_json()["isSetup"], json!(true));

        let clock = GetCurrentTimestampTool::new(Arc::new(FixedClock(1_700_000_000)));
        let out = clock.execute(Value::Null, &ctx()).await.unwrap();
        assert_eq!(out.to_json()["timestamp"], json!(1_700_000_000));
    }
}
