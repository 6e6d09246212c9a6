//! 交易载荷
//!
//! 交给签名协作方的最终产物：模板化后的源码、按合约接口顺序排列的参数与人类可读描述。
//! args 的顺序与类型必须与脚本接口完全一致，不一致属于引擎缺陷而非用户错误。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 单个交易参数：名称、Cadence 类型标签与值
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TransactionArg {
    pub name: String,
    #[serde(rename = "type")]
    pub arg_type: String,
    pub value: Value,
}

impl TransactionArg {
    pub fn new(name: &str, arg_type: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            arg_type: arg_type.to_string(),
            value,
        }
    }
}

/// 可提交的交易载荷
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    /// 面向用户的交易名
    pub name: String,
    /// 源码逻辑路径（审计与展示用）
    pub code_path: String,
    /// 模板化后的 Cadence 源码（不再含符号化引用）
    pub code: String,
    /// 按被调用接口顺序排列的参数
    pub args: Vec<TransactionArg>,
    /// 人类可读描述，确认界面展示
    pub description: String,
}
