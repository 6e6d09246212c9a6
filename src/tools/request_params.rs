//! 参数请求工具
//!
//! 刻意的恒等函数：校验后把 ParamRequest 原样返回，唯一目的是让请求结构
//! 对 UI 层可见并渲染成表单。实际收集工作发生在前端。

use async_trait::async_trait;
use serde_json::Value;

use crate::core::EngineError;
use crate::engine::RequestContext;
use crate::registry::ActionKind;
use crate::resolver::ParamRequest;
use crate::tools::registry::{ActionTool, ToolOutput};

pub struct RequestParametersTool;

#[async_trait]
impl ActionTool for RequestParametersTool {
    fn name(&self) -> &str {
        "requestParameters"
    }

    fn description(&self) -> &str {
        "Request missing parameters from the user in a structured way. \
         Only call this when you have incomplete information; if the user provides \
         all required parameters, proceed directly to the appropriate transaction tool."
    }

    fn parameters_schema(&self) -> Value {
        serde_json::from_str(&crate::tools::schema::param_request_schema_json())
            .unwrap_or_else(|_| serde_json::json!({"type": "object"}))
    }

    async fn execute(&self, args: Value, _ctx: &RequestContext) -> Result<ToolOutput, EngineError> {
        let request: ParamRequest = serde_json::from_value(args).map_err(|e| {
            EngineError::Validation {
                field: "paramRequest".to_string(),
                message: format!("malformed parameter request: {e}"),
            }
        })?;
        // 动作名必须是注册表内的封闭联合成员
        ActionKind::parse(&request.action)?;
        if request.missing.is_empty() {
            return Err(EngineError::EmptyRequest);
        }
        Ok(ToolOutput::Request(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templater::{AddressBook, Network};
    use serde_json::json;
    use std::sync::Arc;

    fn ctx() -> RequestContext {
        RequestContext::new(
            Network::Testnet,
            "0xabc0000000000001",
            0,
            Arc::new(AddressBook::empty()),
        )
    }

    #[tokio::test]
    async fn test_echoes_request_unchanged() {
        let args = json!({
            "action": "sendToken",
            "actionLabel": "Send Tokens",
            "reason": "need the amount",
            "missing": [{
                "id": "amount",
                "label": "Amount",
                "type": "UFix64",
                "required": true
            }],
            "known": {"recipient": "0xabc0000000000001"}
        });
        let out = RequestParametersTool.execute(args.clone(), &ctx()).await.unwrap();
        match out {
            ToolOutput::Request(req) => {
                assert_eq!(req.action, "sendToken");
                assert_eq!(req.missing[0].id, "amount");
                assert_eq!(req.known["recipient"], json!("0xabc0000000000001"));
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_missing_is_rejected() {
        let args = json!({
            "action": "sendToken",
            "actionLabel": "Send Tokens",
            "reason": "",
            "missing": [],
            "known": {}
        });
        let err = RequestParametersTool.execute(args, &ctx()).await.unwrap_err();
        assert!(matches!(err, EngineError::EmptyRequest));
    }

    #[tokio::test]
    async fn test_unregistered_action_is_rejected() {
        let args = json!({
            "action": "mintNft",
            "actionLabel": "Mint",
            "reason": "",
            "missing": [{"id": "amount", "label": "Amount", "type": "UFix64", "required": true}],
            "known": {}
        });
        let err = RequestParametersTool.execute(args, &ctx()).await.unwrap_err();
        assert!(matches!(err, EngineError::UnknownAction(_)));
    }
}
