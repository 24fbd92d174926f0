//! 配置键和环境变量名称

// ==================== 策略配置 ====================

/// 实例提供策略：`per-invocation` 或 `shared`
pub const INSTANCE_PROVIDER: &str = "trellis.strategies.instance-provider";

/// 调用包装策略：`direct` 或 `deferred`
pub const INVOCATION_WRAPPER: &str = "trellis.strategies.invocation-wrapper";

// ==================== 日志配置 ====================

/// 日志级别
pub const LOG_LEVEL: &str = "trellis.logging.level";

/// 日志格式
pub const LOG_FORMAT: &str = "trellis.logging.format";

// ==================== 环境变量 ====================

/// 覆盖实例提供策略
pub const ENV_INSTANCE_PROVIDER: &str = "TRELLIS_INSTANCE_PROVIDER";

/// 覆盖调用包装策略
pub const ENV_INVOCATION_WRAPPER: &str = "TRELLIS_INVOCATION_WRAPPER";

/// 覆盖日志级别
pub const ENV_LOG_LEVEL: &str = "TRELLIS_LOG_LEVEL";

/// 覆盖日志格式
pub const ENV_LOG_FORMAT: &str = "TRELLIS_LOG_FORMAT";
