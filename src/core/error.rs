//! 引擎错误类型
//!
//! 分两类：程序性错误（UnknownAction / UnknownField / EmptyRequest，注册表或协议误用，终止本轮）
//! 与可恢复错误（Validation / PastTimestamp / Observation，转为结构化数据让会话层重新提问或重试）。

use thiserror::Error;

/// 引擎运行过程中可能出现的错误（注册表误用、校验失败、外部观测失败等）
#[derive(Error, Debug)]
pub enum EngineError {
    /// 会话层传入了注册表中不存在的动作名（程序性错误，不应在运行时出现）
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    /// 动作描述符引用了字段目录中不存在的字段（程序性错误）
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// 字段值未通过描述符的校验规则，重新进入缺失集合
    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    /// 调用方试图发出 missing 为空的参数请求（协议误用，空请求会造成无意义的往返）
    #[error("Parameter request must contain at least one missing field")]
    EmptyRequest,

    /// 外部观测（余额 / 当前时间）失败，向用户提示重试，不做静默重试
    #[error("Observation failed: {0}")]
    Observation(String),

    /// 解析或用户选择的时间不在未来，字段带纠正原因重新进入缺失集合
    #[error("Selected time for field '{field}' is in the past")]
    PastTimestamp { field: String },

    /// 工具执行超时（由执行器统一施加）
    #[error("Tool timeout: {0}")]
    ToolTimeout(String),
}

/// 外部观测调用（余额查询、setup 状态、当前时间）的传输层错误
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ObservationError(pub String);

impl From<ObservationError> for EngineError {
    fn from(e: ObservationError) -> Self {
        EngineError::Observation(e.0)
    }
}
