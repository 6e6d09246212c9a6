//! 注册表：动作模式与字段目录的唯一事实来源

pub mod actions;
pub mod fields;

pub use actions::{describe_action, ActionDescriptor, ActionKind};
pub use fields::{describe_field, FieldDescriptor, FieldType, Validation, FLOW_ADDRESS_PATTERN};
