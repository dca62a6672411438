//! # Dispatcher
//!
//! 工作单元分发模块。
//!
//! 负责：
//! - 为工作单元生成身份并计算批大小
//! - 每批生成 record key 并打开关联 span
//! - 在重试/超时策略下调用传输层
//! - 记录指标与进度

pub mod coordinator;
pub mod error;
pub mod metrics;
pub mod progress;
pub mod transports;

pub use contracts::{Batch, Transport};
pub use coordinator::{BatchOutcome, Coordinator, DispatchReport, UnitOfWork};
pub use error::DispatcherError;
pub use metrics::{DispatchMetrics, MetricsSnapshot};
pub use progress::{format_dhms, Progress};
pub use transports::{
    create_transport, ConfiguredTransport, LogTransport, NetworkFormat, NetworkTransport,
    NetworkTransportConfig,
};
