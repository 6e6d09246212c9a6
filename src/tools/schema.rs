//! 工具参数 Schema 生成
//!
//! schemars 生成 ParamRequest 的 JSON Schema 拼入 system prompt，减少 LLM 输出格式错误；
//! 动作工具的参数 schema 直接由注册表的字段描述符推导，保证与实际校验规则一致。

use schemars::schema_for;
use serde_json::{json, Map, Value};

use crate::registry::{describe_action, ActionKind, FieldDescriptor, FieldType};
use crate::resolver::ParamRequest;

/// ParamRequest 的 JSON Schema 字符串，可拼入 system prompt
pub fn param_request_schema_json() -> String {
    let schema = schema_for!(ParamRequest);
    serde_json::to_string_pretty(&schema).unwrap_or_else(|_| String::new())
}

fn field_schema(field: &FieldDescriptor) -> Value {
    let mut s = Map::new();
    let ty = match field.field_type {
        FieldType::Address | FieldType::String | FieldType::Enum => "string",
        FieldType::UFix64 => "number",
        FieldType::UInt64 | FieldType::UInt8 => "integer",
        // 也接受相对时间短语（"in 5 minutes"），由解析器换算
        FieldType::Timestamp => "number",
        FieldType::Bool => "boolean",
    };
    s.insert("type".to_string(), json!(ty));
    if let Some(desc) = &field.description {
        s.insert("description".to_string(), json!(desc));
    }
    if let Some(options) = &field.enum_options {
        s.insert("enum".to_string(), json!(options));
    }
    if let Some(validation) = &field.validation {
        if let Some(pattern) = &validation.pattern {
            s.insert("pattern".to_string(), json!(pattern));
        }
        if let Some(min) = validation.min {
            s.insert("minimum".to_string(), json!(min));
        }
        if let Some(max) = validation.max {
            s.insert("maximum".to_string(), json!(max));
        }
    }
    Value::Object(s)
}

/// 从注册表推导某动作工具的参数 schema
pub fn action_parameters_schema(kind: ActionKind) -> Value {
    let desc = describe_action(kind);
    let mut properties = Map::new();
    for field in desc
        .required_fields()
        .into_iter()
        .flatten()
        .chain(desc.optional_fields().into_iter().flatten())
    {
        properties.insert(field.id.clone(), field_schema(field));
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": desc.required,
    })
}
