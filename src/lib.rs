//! FlowMate - 链上意图解析引擎
//!
//! 把会话代理理解到的用户意图解析为网络正确、可供签名的 Flow 交易。
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 引擎错误类型
//! - **engine**: 解析 → 余额闸门 → 模板化流水线与请求级上下文
//! - **gate**: 余额闸门与余额观测接口
//! - **payload**: 交给签名协作方的交易载荷
//! - **registry**: 动作模式与字段目录（唯一事实来源）
//! - **resolver**: 缺失字段计算、类型转换、校验与参数请求协议
//! - **templater**: 符号化 import 重写为网络具体地址
//! - **timestamp**: 相对时间短语解析（仅未来）
//! - **tools**: 暴露给会话代理的工具面与执行器

pub mod config;
pub mod core;
pub mod engine;
pub mod gate;
pub mod observability;
pub mod payload;
pub mod registry;
pub mod resolver;
pub mod templater;
pub mod timestamp;
pub mod tools;

pub use crate::core::{EngineError, ObservationError};
pub use engine::{prepare_action, RequestContext};
pub use gate::{BalanceObserver, BalanceRejection, GateOutcome, GateState};
pub use payload::{TransactionArg, TransactionPayload};
pub use registry::{ActionKind, FieldDescriptor, FieldType};
pub use resolver::{ParamRequest, ResolvedAction};
pub use templater::{AddressBook, Network};
pub use tools::{ToolExecutor, ToolOutput, ToolRegistry};
