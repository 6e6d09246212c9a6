//! 字段目录
//!
//! 每个参数概念（地址、金额、代币类型、时间戳……）对应唯一一条 FieldDescriptor，
//! 是其他组件查询字段元数据的唯一来源；ParamRequest 中携带完整快照，前端渲染表单无需二次查询。

use std::collections::HashMap;
use std::sync::OnceLock;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::core::EngineError;

/// 字段数据类型（Cadence 对应类型）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum FieldType {
    /// Flow 钱包地址（0x 前缀 + 16 位十六进制）
    Address,
    /// 定点小数（代币金额）
    UFix64,
    UInt64,
    UInt8,
    String,
    /// 从 enum_options 中选择
    Enum,
    /// Unix 时间戳（秒）
    Timestamp,
    Bool,
}

/// 字段校验规则：数值上下界与正则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Validation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// 字段描述符：id、标签、类型、校验规则与表单提示信息的完整快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enum_options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

impl FieldDescriptor {
    fn new(id: &str, label: &str, field_type: FieldType, required: bool) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            field_type,
            required,
            description: None,
            placeholder: None,
            examples: None,
            enum_options: None,
            default: None,
            validation: None,
        }
    }

    fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    fn placeholder(mut self, text: &str) -> Self {
        self.placeholder = Some(text.to_string());
        self
    }

    fn examples(mut self, values: &[&str]) -> Self {
        self.examples = Some(values.iter().map(|s| s.to_string()).collect());
        self
    }

    fn enum_options(mut self, options: &[&str]) -> Self {
        self.enum_options = Some(options.iter().map(|s| s.to_string()).collect());
        self
    }

    fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    fn validation(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }
}

/// Flow 地址正则：0x 前缀可选，16 位十六进制
pub const FLOW_ADDRESS_PATTERN: &str = "^(0x)?[a-fA-F0-9]{16}$";

const TOKEN_OPTIONS: &[&str] = &["FlowToken", "USDCFlow", "stFlowToken"];

static FIELD_CATALOG: OnceLock<HashMap<&'static str, FieldDescriptor>> = OnceLock::new();

fn build_catalog() -> HashMap<&'static str, FieldDescriptor> {
    let mut m = HashMap::new();
    m.insert(
        "recipient",
        FieldDescriptor::new("recipient", "Recipient Address", FieldType::Address, true)
            .description("Flow wallet address of the recipient")
            .placeholder("0x1234567890abcdef")
            .examples(&["0x1234567890abcdef"])
            .validation(Validation {
                pattern: Some(FLOW_ADDRESS_PATTERN.to_string()),
                ..Validation::default()
            }),
    );
    m.insert(
        "amount",
        FieldDescriptor::new("amount", "Amount", FieldType::UFix64, true)
            .description("Amount of tokens to send")
            .placeholder("10.0")
            .examples(&["10.0", "5.5", "100"])
            .validation(Validation {
                min: Some(0.000_000_01),
                ..Validation::default()
            }),
    );
    m.insert(
        "tokenType",
        FieldDescriptor::new("tokenType", "Token Type", FieldType::Enum, true)
            .description("Type of token to use")
            .enum_options(TOKEN_OPTIONS)
            .default_value(json!("FlowToken")),
    );
    m.insert(
        "timestamp",
        FieldDescriptor::new("timestamp", "Execution Time", FieldType::Timestamp, true)
            .description("When to execute the transaction (Unix timestamp in seconds)")
            .placeholder("e.g., \"tomorrow at 3pm\" or specific timestamp"),
    );
    m.insert(
        "priority",
        FieldDescriptor::new("priority", "Priority", FieldType::UInt8, false)
            .description("Transaction priority (0=Low, 1=Below, 2=Medium, 3=Above, 4=High)")
            .default_value(json!(2))
            .validation(Validation {
                min: Some(0.0),
                max: Some(4.0),
                ..Validation::default()
            }),
    );
    m.insert(
        "executionEffort",
        FieldDescriptor::new("executionEffort", "Execution Effort", FieldType::UInt64, false)
            .description("Gas limit for transaction execution")
            .default_value(json!(1000))
            .validation(Validation {
                min: Some(100.0),
                ..Validation::default()
            }),
    );
    m.insert(
        "feeAmount",
        FieldDescriptor::new("feeAmount", "Fee Amount", FieldType::UFix64, false)
            .description("Fee amount in FLOW tokens")
            .default_value(json!(0.001))
            .validation(Validation {
                min: Some(0.0001),
                ..Validation::default()
            }),
    );
    m.insert(
        "fromToken",
        FieldDescriptor::new("fromToken", "From Token", FieldType::Enum, true)
            .description("Token to swap from")
            .enum_options(TOKEN_OPTIONS),
    );
    m.insert(
        "toToken",
        FieldDescriptor::new("toToken", "To Token", FieldType::Enum, true)
            .description("Token to swap to")
            .enum_options(TOKEN_OPTIONS),
    );
    m.insert(
        "pid",
        FieldDescriptor::new("pid", "Pool ID", FieldType::UInt64, true)
            .description("ID of the staking pool")
            .placeholder("0")
            .validation(Validation {
                min: Some(0.0),
                ..Validation::default()
            }),
    );
    m.insert(
        "transactionId",
        FieldDescriptor::new("transactionId", "Transaction ID", FieldType::UInt64, true)
            .description("ID of the scheduled transaction to cancel")
            .placeholder("123")
            .validation(Validation {
                min: Some(0.0),
                ..Validation::default()
            }),
    );
    m
}

fn catalog() -> &'static HashMap<&'static str, FieldDescriptor> {
    FIELD_CATALOG.get_or_init(build_catalog)
}

/// 按 id 查询字段描述符；目录中不存在返回 UnknownField
pub fn describe_field(field_id: &str) -> Result<&'static FieldDescriptor, EngineError> {
    catalog()
        .get(field_id)
        .ok_or_else(|| EngineError::UnknownField(field_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_field_known() {
        let field = describe_field("recipient").unwrap();
        assert_eq!(field.field_type, FieldType::Address);
        assert!(field.validation.as_ref().unwrap().pattern.is_some());
    }

    #[test]
    fn test_describe_field_unknown() {
        let err = describe_field("nonsense").unwrap_err();
        assert!(matches!(err, EngineError::UnknownField(_)));
    }

    #[test]
    fn test_token_type_has_default_and_options() {
        let field = describe_field("tokenType").unwrap();
        assert_eq!(field.default, Some(json!("FlowToken")));
        assert_eq!(field.enum_options.as_ref().unwrap().len(), 3);
    }
}
