//! 错误类型定义
//!
//! 编译期错误使用 thiserror 定义的枚举，处理器运行期的失败统一使用 anyhow::Error，
//! 通过 [`Next::fail`](crate::handler::Next::fail) 交给路由器。

use std::path::PathBuf;

use thiserror::Error;

use crate::handler::HandlerShape;
use crate::method::HttpMethod;
use crate::wrapper::InvocationWrapper;

/// 端点编译错误
#[derive(Debug, Error)]
pub enum CompileError {
    /// 无法识别的 HTTP 方法字符串
    #[error("Unknown HTTP method: {0}")]
    UnknownMethod(String),

    /// 路由器没有提供该 HTTP 方法的注册函数
    #[error("Router does not support {method} (while registering '{path}')")]
    UnsupportedMethod { method: HttpMethod, path: String },

    /// 处理器签名与当前调用包装策略不匹配
    #[error("{method} {path}: {handler} handler cannot be wrapped by the {wrapper} invocation wrapper")]
    HandlerShapeMismatch {
        method: HttpMethod,
        path: String,
        wrapper: InvocationWrapper,
        handler: HandlerShape,
    },

    /// 路由器拒绝了注册请求
    #[error("Failed to register {method} {path}")]
    Registration {
        method: HttpMethod,
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl CompileError {
    /// 出错路由的 HTTP 方法（如果有）
    pub fn method(&self) -> Option<HttpMethod> {
        match self {
            Self::UnknownMethod(_) => None,
            Self::UnsupportedMethod { method, .. }
            | Self::HandlerShapeMismatch { method, .. }
            | Self::Registration { method, .. } => Some(*method),
        }
    }

    /// 出错路由的完整路径（如果有）
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::UnknownMethod(_) => None,
            Self::UnsupportedMethod { path, .. }
            | Self::HandlerShapeMismatch { path, .. }
            | Self::Registration { path, .. } => Some(path),
        }
    }
}

/// 编译结果
pub type CompileResult<T> = Result<T, CompileError>;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read config file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Unknown value '{value}' for '{key}'")]
    InvalidValue { key: String, value: String },
}

/// 日志初始化错误
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Failed to initialize logging: {0}")]
    InitFailed(String),
}
