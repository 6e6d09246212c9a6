//! 工具注册表
//!
//! 暴露给会话代理的工具面：所有工具实现 ActionTool trait（name / description /
//! parameters_schema / execute），由 ToolRegistry 按名注册与查找，
//! ToolExecutor 在调用时加超时并输出结构化审计日志。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::core::EngineError;
use crate::engine::RequestContext;
use crate::gate::BalanceRejection;
use crate::payload::TransactionPayload;
use crate::resolver::ParamRequest;

/// 工具结果的封闭联合：参数请求、交易载荷、余额拒绝或只读观测值
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ToolOutput {
    /// 信息不全，UI 据此渲染表单
    #[serde(rename = "parameterRequest")]
    Request(ParamRequest),
    /// 完整且通过闸门，交给签名协作方
    Transaction(TransactionPayload),
    /// 余额不足的终态（不是异常），带观测余额与差额
    #[serde(rename = "insufficientBalance")]
    Rejected(BalanceRejection),
    /// 只读观测结果（余额 / setup 状态 / 当前时间）
    Observation(Value),
}

impl ToolOutput {
    /// 序列化给会话层（带 kind 判别标签）
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行
#[async_trait]
pub trait ActionTool: Send + Sync {
    /// 工具名（会话层 tool call 中的名字）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 判断何时调用）
    fn description(&self) -> &str;

    /// 参数 JSON Schema（供 LLM 生成正确的参数格式）
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 执行工具；上下文按请求传入，工具自身不保存网络 / 钱包状态
    async fn execute(&self, args: Value, ctx: &RequestContext) -> Result<ToolOutput, EngineError>;
}

/// 工具注册表：按名称存储 Arc<dyn ActionTool>
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ActionTool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl ActionTool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ActionTool>> {
        self.tools.get(name).cloned()
    }

    /// 执行指定工具；名字未注册按 UnknownAction 处理（不信任任意字符串）
    pub async fn execute(
        &self,
        name: &str,
        args: Value,
        ctx: &RequestContext,
    ) -> Result<ToolOutput, EngineError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| EngineError::UnknownAction(name.to_string()))?;
        tool.execute(args, ctx).await
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// (name, description) 列表，用于生成 prompt 中的 Available tools 段落
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.clone(), tool.description().to_string()))
            .collect()
    }

    /// 动态生成与实际注册工具一致的 schema JSON
    pub fn to_schema_json(&self) -> String {
        let tools: Vec<Value> = self
            .tools
            .iter()
            .map(|(name, tool)| {
                serde_json::json!({
                    "name": name,
                    "description": tool.description(),
                    "parameters": tool.parameters_schema()
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}
