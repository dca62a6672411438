//! CoordinatorConfig - Config Loader output
//!
//! 描述协调层的完整配置：服务元数据、延迟探测、批大小、重试/超时、追踪、传输。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

/// Default latency reference endpoints
pub const DEFAULT_PROBE_ENDPOINTS: [&str; 4] = [
    "google.com",
    "amazon.com",
    "cloudflare.com",
    "azure.microsoft.com",
];

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的协调层配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CoordinatorConfig {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 服务元数据（附加到每个 span）
    #[serde(default)]
    #[validate(nested)]
    pub service: ServiceConfig,

    /// 延迟探测
    #[serde(default)]
    #[validate(nested)]
    pub probe: ProbeConfig,

    /// 批大小计算
    #[serde(default)]
    #[validate(nested)]
    pub sizing: SizingConfig,

    /// 重试与超时
    #[serde(default)]
    #[validate(nested)]
    pub resilience: ResilienceConfig,

    /// 追踪后端
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// 传输配置
    #[serde(default)]
    #[validate(nested)]
    pub transport: TransportConfig,
}

/// 服务元数据
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceConfig {
    /// 服务名称 (tracer name)
    #[serde(default = "default_service_name")]
    #[validate(length(min = 1))]
    pub name: String,

    /// 消息系统 (e.g., "kafka")
    #[serde(default)]
    pub message_system: Option<String>,

    /// 消费组 / 生产组
    #[serde(default)]
    pub group_id: Option<String>,

    /// 客户端 ID
    #[serde(default)]
    pub client_id: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            message_system: None,
            group_id: None,
            client_id: None,
        }
    }
}

fn default_service_name() -> String {
    "dispatch-coord".to_string()
}

/// 延迟探测配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProbeConfig {
    /// 参考端点 (host 或 host:port)
    #[serde(default = "default_endpoints")]
    #[validate(length(min = 1))]
    pub endpoints: Vec<String>,

    /// 未指定端口时使用的端口
    #[serde(default = "default_probe_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// 单次探测超时 (毫秒)
    #[serde(default = "default_probe_timeout_ms")]
    #[validate(range(min = 1))]
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            endpoints: default_endpoints(),
            port: default_probe_port(),
            timeout_ms: default_probe_timeout_ms(),
        }
    }
}

fn default_endpoints() -> Vec<String> {
    DEFAULT_PROBE_ENDPOINTS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_probe_port() -> u16 {
    443
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

/// 批大小配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SizingConfig {
    /// 平均消息大小缺省值 (字节)
    #[serde(default = "default_message_size")]
    #[validate(range(min = 1))]
    pub default_message_size: usize,

    /// 所有探测失败时使用的延迟假设 (None = 直接返回错误)
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub fallback_latency_ms: Option<f64>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            default_message_size: default_message_size(),
            fallback_latency_ms: None,
        }
    }
}

fn default_message_size() -> usize {
    1024
}

/// 重试/超时配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResilienceConfig {
    /// 最大尝试次数 (含首次)
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1))]
    pub max_attempts: u32,

    /// 首次退避延迟 (毫秒)，之后每次翻倍
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// 超时预算 (毫秒)
    #[serde(default = "default_timeout_ms")]
    #[validate(range(min = 1))]
    pub timeout_ms: u64,

    /// 超时作用范围
    #[serde(default)]
    pub timeout_scope: TimeoutScope,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            timeout_ms: default_timeout_ms(),
            timeout_scope: TimeoutScope::default(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_timeout_ms() -> u64 {
    30_000
}

/// Where the timeout budget applies relative to the retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutScope {
    /// One budget around the whole retry loop; timeouts are never retried
    #[default]
    Overall,
    /// A fresh budget per attempt; an attempt timeout is retried
    PerAttempt,
}

/// 追踪配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// 追踪后端
    #[serde(default)]
    pub tracer: TracerKind,

    /// 导出器列表
    #[serde(default)]
    pub exporters: Vec<ExporterConfig>,
}

/// 追踪后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracerKind {
    /// 不产生 span
    Noop,
    /// tracing span
    #[default]
    Tracing,
    /// OpenTelemetry span
    Otel,
}

/// 导出器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// 导出器名称
    pub name: String,

    /// 导出端点 (e.g., "http://localhost:4317")
    pub endpoint: String,
}

/// 传输配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransportConfig {
    /// 传输名称
    #[validate(length(min = 1))]
    pub name: String,

    /// 传输类型
    pub kind: TransportKind,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            name: "log".to_string(),
            kind: TransportKind::Log,
            params: HashMap::new(),
        }
    }
}

/// 传输类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// 日志输出
    Log,
    /// 网络输出 (UDP)
    Network,
}
