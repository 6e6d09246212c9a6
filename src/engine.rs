//! 解析 → 闸门 → 模板化流水线
//!
//! 每个入站会话轮次自带值袋、目标网络与钱包身份，RequestContext 按请求构造、不可变，
//! 组件之间不保留跨请求可变状态。prepare_action 是动作工具的共同入口：
//! 缺字段发参数请求，校验失败带原因重新提问，价值转移动作过余额闸门，
//! 全部通过后产出模板化的交易载荷。

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::core::EngineError;
use crate::gate::{self, BalanceObserver, GateOutcome, GateState};
use crate::payload::{TransactionArg, TransactionPayload};
use crate::registry::{describe_action, ActionKind};
use crate::resolver::{self, ParamRequest, Resolution, ResolvedAction};
use crate::templater::{self, AddressBook, Network};
use crate::tools::registry::ToolOutput;

/// 请求级上下文：网络、钱包身份、观测到的当前时间与地址表，逐请求重建
#[derive(Clone)]
pub struct RequestContext {
    pub network: Network,
    /// 被查询余额 / setup 状态的钱包身份
    pub wallet: String,
    /// 外部时间观测结果，时间戳解析与未来性校验以此为基准（引擎不直接读本地时钟）
    pub now: u64,
    pub addresses: Arc<AddressBook>,
}

impl RequestContext {
    pub fn new(network: Network, wallet: impl Into<String>, now: u64, addresses: Arc<AddressBook>) -> Self {
        Self {
            network,
            wallet: wallet.into(),
            now,
            addresses,
        }
    }
}

const SEND_TOKEN_CDC: &str = include_str!("../cadence/transactions/SendToken.cdc");
const SCHEDULE_SEND_TOKEN_CDC: &str = include_str!("../cadence/transactions/ScheduleSendToken.cdc");
const SCHEDULE_SWAP_TOKEN_CDC: &str = include_str!("../cadence/transactions/ScheduleSwapToken.cdc");
const SWAPPER_ACTION_CDC: &str = include_str!("../cadence/transactions/SwapperAction.cdc");
const SETUP_FLOWMATE_ACTIONS_CDC: &str = include_str!("../cadence/transactions/SetupFlowMateActions.cdc");
const CANCEL_SCHEDULED_ACTION_CDC: &str = include_str!("../cadence/transactions/CancelScheduledAction.cdc");
const CLAIM_AND_RESTAKE_CDC: &str = include_str!("../cadence/transactions/ClaimAndRestake.cdc");

/// 动作对应的 (交易名, 源码逻辑路径, 原始源码)
fn transaction_source(kind: ActionKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        ActionKind::SendToken => (
            "Send Tokens",
            "cadence/transactions/SendToken.cdc",
            SEND_TOKEN_CDC,
        ),
        ActionKind::ScheduleSendToken => (
            "Schedule Token Send",
            "cadence/transactions/ScheduleSendToken.cdc",
            SCHEDULE_SEND_TOKEN_CDC,
        ),
        ActionKind::ScheduleSwapToken => (
            "Schedule Token Swap",
            "cadence/transactions/ScheduleSwapToken.cdc",
            SCHEDULE_SWAP_TOKEN_CDC,
        ),
        ActionKind::SwapTokens => (
            "Swap Tokens",
            "cadence/transactions/SwapperAction.cdc",
            SWAPPER_ACTION_CDC,
        ),
        ActionKind::SetupFlowMateActions => (
            "Setup FlowMate Actions",
            "cadence/transactions/SetupFlowMateActions.cdc",
            SETUP_FLOWMATE_ACTIONS_CDC,
        ),
        ActionKind::CancelScheduledAction => (
            "Cancel Scheduled Action",
            "cadence/transactions/CancelScheduledAction.cdc",
            CANCEL_SCHEDULED_ACTION_CDC,
        ),
        ActionKind::ClaimAndRestake => (
            "Claim and Restake",
            "cadence/transactions/ClaimAndRestake.cdc",
            CLAIM_AND_RESTAKE_CDC,
        ),
    }
}

/// UFix64 参数的字符串形式（JSON-CDC 要求带小数点）
fn format_ufix64(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        v.to_string()
    }
}

fn arg_str(s: &str) -> Value {
    Value::String(s.to_string())
}

/// 按被调用交易的接口顺序组装参数列表
fn build_args(action: &ResolvedAction) -> Vec<TransactionArg> {
    let v = &action.values;
    let ufix = |id: &str| arg_str(&format_ufix64(v[id].as_f64().unwrap_or_default()));
    let uint = |id: &str| arg_str(&v[id].as_u64().unwrap_or_default().to_string());
    let text = |id: &str| v[id].clone();

    match action.kind {
        ActionKind::SendToken => vec![
            TransactionArg::new("recipient", "Address", text("recipient")),
            TransactionArg::new("amount", "UFix64", ufix("amount")),
            TransactionArg::new("tokenType", "String", text("tokenType")),
        ],
        ActionKind::ScheduleSendToken => vec![
            TransactionArg::new("recipient", "Address", text("recipient")),
            TransactionArg::new("amount", "UFix64", ufix("amount")),
            TransactionArg::new("timestamp", "UFix64", ufix("timestamp")),
            TransactionArg::new("priority", "UInt8", uint("priority")),
            TransactionArg::new("executionEffort", "UInt64", uint("executionEffort")),
            TransactionArg::new("feeAmount", "UFix64", ufix("feeAmount")),
            TransactionArg::new("tokenType", "String", text("tokenType")),
        ],
        ActionKind::ScheduleSwapToken => vec![
            TransactionArg::new("fromToken", "String", text("fromToken")),
            TransactionArg::new("toToken", "String", text("toToken")),
            TransactionArg::new("amount", "UFix64", ufix("amount")),
            TransactionArg::new("timestamp", "UFix64", ufix("timestamp")),
            TransactionArg::new("priority", "UInt8", uint("priority")),
            TransactionArg::new("executionEffort", "UInt64", uint("executionEffort")),
            TransactionArg::new("feeAmount", "UFix64", ufix("feeAmount")),
        ],
        ActionKind::SwapTokens => vec![],
        ActionKind::SetupFlowMateActions => vec![],
        ActionKind::CancelScheduledAction => vec![TransactionArg::new(
            "transactionId",
            "UInt64",
            uint("transactionId"),
        )],
        ActionKind::ClaimAndRestake => vec![TransactionArg::new("pid", "UInt64", uint("pid"))],
    }
}

fn format_schedule_time(ts: u64) -> String {
    chrono::DateTime::from_timestamp(ts as i64, 0)
        .map(|d| d.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// 确认界面展示的人类可读描述
fn describe_payload(action: &ResolvedAction) -> String {
    let amount = action.decimal("amount").unwrap_or_default();
    match action.kind {
        ActionKind::SendToken => format!(
            "Send {} {} to {}",
            amount,
            action.text("tokenType").unwrap_or("FlowToken"),
            action.text("recipient").unwrap_or_default(),
        ),
        ActionKind::ScheduleSendToken => format!(
            "Schedule sending {} {} to {} on {}",
            amount,
            action.text("tokenType").unwrap_or("FlowToken"),
            action.text("recipient").unwrap_or_default(),
            format_schedule_time(action.values["timestamp"].as_u64().unwrap_or_default()),
        ),
        ActionKind::ScheduleSwapToken => format!(
            "Schedule swapping {} {} to {} on {}",
            amount,
            action.text("fromToken").unwrap_or_default(),
            action.text("toToken").unwrap_or_default(),
            format_schedule_time(action.values["timestamp"].as_u64().unwrap_or_default()),
        ),
        ActionKind::SwapTokens => format!(
            "Swap {amount} FLOW to USDC (note: amount is hardcoded in the transaction)"
        ),
        ActionKind::SetupFlowMateActions => {
            "Initialize your account for scheduled transactions and automated actions".to_string()
        }
        ActionKind::CancelScheduledAction => format!(
            "Cancel scheduled transaction with ID {}",
            action.values["transactionId"].as_u64().unwrap_or_default(),
        ),
        ActionKind::ClaimAndRestake => format!(
            "Claim and restake rewards from pool {}",
            action.values["pid"].as_u64().unwrap_or_default(),
        ),
    }
}

/// 动作工具的共同流水线：解析 → 闸门 → 模板化
pub async fn prepare_action(
    kind: ActionKind,
    provided: &Map<String, Value>,
    ctx: &RequestContext,
    balance_observer: &dyn BalanceObserver,
) -> Result<ToolOutput, EngineError> {
    let desc = describe_action(kind);

    let missing = resolver::missing_fields(kind, provided)?;
    if !missing.is_empty() {
        let labels: Vec<&str> = missing.iter().map(|f| f.label.as_str()).collect();
        let reason = format!("{} requires: {}", desc.label, labels.join(", "));
        let request = ParamRequest::build(
            kind,
            reason,
            missing.into_iter().cloned().collect(),
            resolver::known_values(kind, provided)?,
        )?;
        tracing::debug!(action = kind.id(), state = ?GateState::ParamsPending, "awaiting parameters");
        return Ok(ToolOutput::Request(request));
    }

    let action = match resolver::resolve_action(kind, provided, ctx.now)? {
        Resolution::Complete(action) => action,
        Resolution::Incomplete(issues) => {
            tracing::debug!(action = kind.id(), state = ?GateState::ParamsPending, "awaiting parameters");
            return Ok(ToolOutput::Request(ParamRequest::from_issues(
                kind, issues, provided,
            )?));
        }
    };

    if kind.is_value_transferring() {
        match gate::check(&action, &ctx.wallet, ctx.network, balance_observer).await? {
            GateOutcome::Approved { balance, trail } => {
                tracing::debug!(action = kind.id(), balance, trail = ?trail, "balance gate approved");
            }
            GateOutcome::Rejected { rejection, trail } => {
                tracing::info!(
                    action = kind.id(),
                    balance = rejection.balance,
                    shortfall = rejection.shortfall,
                    trail = ?trail,
                    "balance gate rejected"
                );
                return Ok(ToolOutput::Rejected(rejection));
            }
        }
    }

    let (name, code_path, source) = transaction_source(kind);
    let templated = templater::template(source, ctx.network, &ctx.addresses);
    if !templated.untemplated.is_empty() {
        tracing::warn!(
            action = kind.id(),
            contracts = ?templated.untemplated,
            "payload contains untemplated references"
        );
    }

    Ok(ToolOutput::Transaction(TransactionPayload {
        name: name.to_string(),
        code_path: code_path.to_string(),
        code: templated.code,
        args: build_args(&action),
        description: describe_payload(&action),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ObservationError;
    use async_trait::async_trait;
    use serde_json::json;

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

    fn ctx(network: Network) -> RequestContext {
        RequestContext::new(
            network,
            "0xabc0000000000001",
            1_700_000_000,
            Arc::new(AddressBook::builtin()),
        )
    }

    fn bag(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_missing_fields_yield_request() {
        let provided = bag(&[("recipient", json!("0xabc0000000000001"))]);
        let out = prepare_action(ActionKind::SendToken, &provided, &ctx(Network::Testnet), &FixedBalance(100.0))
            .await
            .unwrap();
        match out {
            ToolOutput::Request(req) => {
                assert_eq!(req.missing.len(), 1);
                assert_eq!(req.missing[0].id, "amount");
                assert!(req.known.contains_key("recipient"));
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_send_produces_templated_payload() {
        let provided = bag(&[
            ("recipient", json!("0xabc0000000000001")),
            ("amount", json!(10.0)),
        ]);
        let out = prepare_action(ActionKind::SendToken, &provided, &ctx(Network::Testnet), &FixedBalance(100.0))
            .await
            .unwrap();
        match out {
            ToolOutput::Transaction(payload) => {
                assert_eq!(payload.name, "Send Tokens");
                // 模板化后不再出现带引号的合约引用
                assert!(!payload.code.contains("import \""));
                assert!(payload.code.contains("0x7e60df042a9c0868"));
                assert_eq!(payload.args.len(), 3);
                assert_eq!(payload.args[0].name, "recipient");
                assert_eq!(payload.args[1].value, json!("10.0"));
                assert_eq!(payload.args[2].value, json!("FlowToken"));
                assert_eq!(payload.description, "Send 10 FlowToken to 0xabc0000000000001");
            }
            other => panic!("expected transaction, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_insufficient_balance_rejects_before_templating() {
        let provided = bag(&[
            ("recipient", json!("0xabc0000000000001")),
            ("amount", json!(50.0)),
        ]);
        let out = prepare_action(ActionKind::SendToken, &provided, &ctx(Network::Testnet), &FixedBalance(25.5))
            .await
            .unwrap();
        match out {
            ToolOutput::Rejected(r) => {
                assert_eq!(r.balance, 25.5);
                assert_eq!(r.shortfall, 24.5);
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_network_threaded_not_global() {
        let provided = bag(&[
            ("recipient", json!("0xabc0000000000001")),
            ("amount", json!(1.0)),
        ]);
        // 同一动作在不同上下文下模板化为各自网络的地址，互不影响
        let mainnet = prepare_action(ActionKind::SendToken, &provided, &ctx(Network::Mainnet), &FixedBalance(10.0))
            .await
            .unwrap();
        let testnet = prepare_action(ActionKind::SendToken, &provided, &ctx(Network::Testnet), &FixedBalance(10.0))
            .await
            .unwrap();
        match (mainnet, testnet) {
            (ToolOutput::Transaction(m), ToolOutput::Transaction(t)) => {
                assert!(m.code.contains("0x1654653399040a61"));
                assert!(t.code.contains("0x7e60df042a9c0868"));
            }
            other => panic!("expected transactions, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_scheduled_send_args_order_and_time_rendering() {
        let now = 1_700_000_000u64;
        let provided = bag(&[
            ("recipient", json!("0xabc0000000000001")),
            ("amount", json!(2.5)),
            ("timestamp", json!("in 5 minutes")),
        ]);
        let out = prepare_action(
            ActionKind::ScheduleSendToken,
            &provided,
            &ctx(Network::Testnet),
            &FixedBalance(10.0),
        )
        .await
        .unwrap();
        match out {
            ToolOutput::Transaction(payload) => {
                let names: Vec<&str> = payload.args.iter().map(|a| a.name.as_str()).collect();
                assert_eq!(
                    names,
                    vec![
                        "recipient",
                        "amount",
                        "timestamp",
                        "priority",
                        "executionEffort",
                        "feeAmount",
                        "tokenType"
                    ]
                );
                assert_eq!(payload.args[2].value, json!(format!("{}.0", now + 300)));
                // 可选字段的默认值生效
                assert_eq!(payload.args[3].value, json!("2"));
                assert!(payload.description.contains("Schedule sending 2.5 FlowToken"));
            }
            other => panic!("expected transaction, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_transferring_action_skips_gate() {
        struct PanicObserver;

        #[async_trait]
        impl BalanceObserver for PanicObserver {
            async fn get_balance(
                &self,
                _holder: &str,
                _token: &str,
                _network: Network,
            ) -> Result<f64, ObservationError> {
                panic!("balance must not be observed for non-transferring actions");
            }
        }

        let out = prepare_action(
            ActionKind::SetupFlowMateActions,
            &Map::new(),
            &ctx(Network::Emulator),
            &PanicObserver,
        )
        .await
        .unwrap();
        assert!(matches!(out, ToolOutput::Transaction(_)));
    }
}
