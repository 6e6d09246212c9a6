//! 流水线集成测试：参数请求往返 → 余额闸门 → 模板化载荷

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use flowmate::core::ObservationError;
use flowmate::engine::{prepare_action, RequestContext};
use flowmate::gate::BalanceObserver;
use flowmate::registry::ActionKind;
use flowmate::resolver::merge_answers;
use flowmate::tools::{
    register_script_tools, register_transaction_tools, SetupObserver, TimeObserver, ToolExecutor,
    ToolOutput, ToolRegistry,
};
use flowmate::templater::{AddressBook, Network};

const NOW: u64 = 1_700_000_000;

struct CountingBalance {
    balance: f64,
    calls: AtomicUsize,
}

impl CountingBalance {
    fn new(balance: f64) -> Self {
        Self {
            balance,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BalanceObserver for CountingBalance {
    async fn get_balance(
        &self,
        _holder: &str,
        _token: &str,
        _network: Network,
    ) -> Result<f64, ObservationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance)
    }
}

struct AlwaysSetup;

#[async_trait]
impl SetupObserver for AlwaysSetup {
    async fn get_setup_status(
        &self,
        _holder: &str,
        _network: Network,
    ) -> Result<bool, ObservationError> {
        Ok(true)
    }
}

struct FixedClock;

#[async_trait]
impl TimeObserver for FixedClock {
    async fn current_time(&self) -> Result<u64, ObservationError> {
        Ok(NOW)
    }
}

fn ctx(network: Network) -> RequestContext {
    RequestContext::new(network, "0xabc0000000000001", NOW, Arc::new(AddressBook::builtin()))
}

fn bag(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[tokio::test]
async fn test_full_round_trip_send_token() {
    let observer = CountingBalance::new(100.0);
    let ctx = ctx(Network::Testnet);

    // 第一轮：只说了收款人，引擎应请求 amount
    let provided = bag(&[("recipient", json!("0xabc0000000000001"))]);
    let out = prepare_action(ActionKind::SendToken, &provided, &ctx, &observer)
        .await
        .unwrap();
    let request = match out {
        ToolOutput::Request(r) => r,
        other => panic!("expected request, got {other:?}"),
    };
    assert_eq!(request.missing.len(), 1);
    assert_eq!(request.missing[0].id, "amount");
    // 缺参阶段不应观测余额
    assert_eq!(observer.calls.load(Ordering::SeqCst), 0);

    // 第二轮：用户在表单里填了 amount，合并后重跑
    let answers = bag(&[("amount", json!("25"))]);
    let merged = merge_answers(&provided, &answers);
    let out = prepare_action(ActionKind::SendToken, &merged, &ctx, &observer)
        .await
        .unwrap();
    let payload = match out {
        ToolOutput::Transaction(p) => p,
        other => panic!("expected transaction, got {other:?}"),
    };
    assert_eq!(observer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(payload.args[1].value, json!("25.0"));
    assert!(payload.code.contains("import FlowToken from 0x7e60df042a9c0868"));
    assert!(!payload.code.contains("import \""));
}

#[tokio::test]
async fn test_insufficient_balance_short_circuits() {
    let observer = CountingBalance::new(25.5);
    let provided = bag(&[
        ("recipient", json!("0xabc0000000000001")),
        ("amount", json!(50.0)),
    ]);
    let out = prepare_action(ActionKind::SendToken, &provided, &ctx(Network::Testnet), &observer)
        .await
        .unwrap();
    match out {
        ToolOutput::Rejected(r) => {
            assert_eq!(r.balance, 25.5);
            assert_eq!(r.requested, 50.0);
            assert_eq!(r.shortfall, 24.5);
        }
        other => panic!("expected rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_schedule_swap_with_relative_time_phrase() {
    let observer = CountingBalance::new(10.0);
    let provided = bag(&[
        ("fromToken", json!("FlowToken")),
        ("toToken", json!("USDCFlow")),
        ("amount", json!(2.0)),
        ("timestamp", json!("tomorrow")),
    ]);
    let out = prepare_action(
        ActionKind::ScheduleSwapToken,
        &provided,
        &ctx(Network::Mainnet),
        &observer,
    )
    .await
    .unwrap();
    let payload = match out {
        ToolOutput::Transaction(p) => p,
        other => panic!("expected transaction, got {other:?}"),
    };
    // "tomorrow" = +86400，渲染为 UFix64 字符串
    assert_eq!(payload.args[3].value, json!(format!("{}.0", NOW + 86_400)));
    assert!(payload.code.contains("0x1654653399040a61"));
}

#[tokio::test]
async fn test_past_timestamp_reenters_missing_set() {
    let observer = CountingBalance::new(10.0);
    let provided = bag(&[
        ("recipient", json!("0xabc0000000000001")),
        ("amount", json!(1.0)),
        ("timestamp", json!(NOW - 3600)),
    ]);
    let out = prepare_action(
        ActionKind::ScheduleSendToken,
        &provided,
        &ctx(Network::Testnet),
        &observer,
    )
    .await
    .unwrap();
    match out {
        ToolOutput::Request(req) => {
            assert!(req.missing.iter().any(|f| f.id == "timestamp"));
            assert!(req.reason.contains("in the past"));
        }
        other => panic!("expected request, got {other:?}"),
    }
    // 校验失败不应触发余额观测
    assert_eq!(observer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_executor_dispatches_full_tool_surface() {
    let balance: Arc<CountingBalance> = Arc::new(CountingBalance::new(100.0));
    let mut registry = ToolRegistry::new();
    register_transaction_tools(&mut registry, balance.clone());
    register_script_tools(&mut registry, balance.clone(), Arc::new(AlwaysSetup), Arc::new(FixedClock));
    let executor = ToolExecutor::new(registry, 5);
    let ctx = ctx(Network::Testnet);

    // 观测类工具
    let out = executor
        .execute("getCurrentTimestamp", Value::Null, &ctx)
        .await
        .unwrap();
    assert_eq!(out.to_json()["timestamp"], json!(NOW));

    let out = executor
        .execute("getUserBalance", json!({"tokenType": "FlowToken"}), &ctx)
        .await
        .unwrap();
    assert_eq!(out.to_json()["balance"], json!(100.0));

    let out = executor
        .execute("checkSetupStatus", Value::Null, &ctx)
        .await
        .unwrap();
    assert_eq!(out.to_json()["isSetup"], json!(true));

    // 动作工具：claimAndRestake 非转移，不过闸门
    let out = executor
        .execute("claimAndRestake", json!({"pid": 3}), &ctx)
        .await
        .unwrap();
    match out {
        ToolOutput::Transaction(p) => {
            assert_eq!(p.args[0].value, json!("3"));
            assert!(p.description.contains("pool 3"));
        }
        other => panic!("expected transaction, got {other:?}"),
    }

    // 未注册工具名被拒绝
    assert!(executor.execute("mintNft", Value::Null, &ctx).await.is_err());
}
