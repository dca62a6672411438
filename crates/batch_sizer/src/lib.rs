//! # Batch Sizer
//!
//! Network-aware adaptive batch sizing.
//!
//! 负责：
//! - 并发探测多个参考端点的往返延迟，取最小值
//! - 按延迟分级和数据量分级计算批大小上限
//! - 强制单批 10MB 字节上限

pub mod probe;
pub mod sizer;

pub use probe::{best_latency, sample_latency, split_endpoint, TcpConnectProbe};
pub use sizer::{
    latency_tier, size_for_latency, volume_tier, BatchSizer, LARGE_BATCH, MAX_BATCH_BYTES,
    MEDIUM_BATCH, SMALL_BATCH,
};
