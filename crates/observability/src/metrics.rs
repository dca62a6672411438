//! 协调层指标收集模块
//!
//! 延迟探测、批大小决策、重试与分发结果的 Prometheus 指标，以及进程内聚合统计。

use metrics::{counter, gauge, histogram};

/// 记录单个端点的探测延迟
pub fn record_probe_latency_ms(endpoint: &str, latency_ms: f64) {
    histogram!(
        "dispatch_coord_probe_latency_ms",
        "endpoint" => endpoint.to_string()
    )
    .record(latency_ms);
}

/// 记录探测失败
pub fn record_probe_failure(endpoint: &str) {
    counter!(
        "dispatch_coord_probe_failures_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

/// 记录批大小决策
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_batch_size;
///
/// let decision = sizer.decide(total, avg).await?;
/// record_batch_size(decision.size, decision.latency_ms);
/// ```
pub fn record_batch_size(size: usize, latency_ms: f64) {
    gauge!("dispatch_coord_batch_size").set(size as f64);
    histogram!("dispatch_coord_batch_size_hist").record(size as f64);
    gauge!("dispatch_coord_sizing_latency_ms").set(latency_ms);
}

/// 记录一次失败尝试（之后会退避重试）
pub fn record_retry_attempt(attempt: u32, delay_ms: u64) {
    counter!("dispatch_coord_retry_attempts_total").increment(1);
    histogram!("dispatch_coord_retry_delay_ms").record(delay_ms as f64);
    gauge!("dispatch_coord_last_failed_attempt").set(attempt as f64);
}

/// 记录重试耗尽
pub fn record_retry_exhausted() {
    counter!("dispatch_coord_retry_exhausted_total").increment(1);
}

/// 记录超时
pub fn record_timeout(timeout_ms: u64) {
    counter!("dispatch_coord_timeouts_total").increment(1);
    gauge!("dispatch_coord_timeout_budget_ms").set(timeout_ms as f64);
}

/// 记录批次分发结果
pub fn record_batch_dispatched(transport: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "dispatch_coord_batches_dispatched_total",
        "transport" => transport.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 分发指标聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchStatsAggregator {
    /// 批次总数
    pub total_batches: u64,

    /// 失败批次数
    pub failed_batches: u64,

    /// 已送达消息数
    pub delivered_messages: u64,

    /// 所有批次的尝试次数总和
    pub total_attempts: u64,

    /// 批大小统计
    pub batch_size_stats: RunningStats,

    /// 批次耗时统计 (毫秒)
    pub elapsed_stats: RunningStats,
}

impl DispatchStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个批次
    pub fn record_batch(&mut self, messages: usize, attempts: u32, delivered: bool, elapsed_ms: f64) {
        self.total_batches += 1;
        self.total_attempts += attempts as u64;
        if delivered {
            self.delivered_messages += messages as u64;
        } else {
            self.failed_batches += 1;
        }
        self.batch_size_stats.push(messages as f64);
        self.elapsed_stats.push(elapsed_ms);
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            total_batches: self.total_batches,
            failed_batches: self.failed_batches,
            delivered_messages: self.delivered_messages,
            failure_rate: if self.total_batches > 0 {
                self.failed_batches as f64 / self.total_batches as f64 * 100.0
            } else {
                0.0
            },
            mean_attempts: if self.total_batches > 0 {
                self.total_attempts as f64 / self.total_batches as f64
            } else {
                0.0
            },
            batch_size: StatsSummary::from(&self.batch_size_stats),
            elapsed_ms: StatsSummary::from(&self.elapsed_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub total_batches: u64,
    pub failed_batches: u64,
    pub delivered_messages: u64,
    pub failure_rate: f64,
    pub mean_attempts: f64,
    pub batch_size: StatsSummary,
    pub elapsed_ms: StatsSummary,
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Total batches: {}", self.total_batches)?;
        writeln!(
            f,
            "Failed batches: {} ({:.2}%)",
            self.failed_batches, self.failure_rate
        )?;
        writeln!(f, "Delivered messages: {}", self.delivered_messages)?;
        writeln!(f, "Attempts per batch: {:.2}", self.mean_attempts)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Batch time (ms): {}", self.elapsed_ms)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            self.m2 += delta * (value - self.mean);
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_counts_failures() {
        let mut aggregator = DispatchStatsAggregator::new();
        aggregator.record_batch(10, 1, true, 12.0);
        aggregator.record_batch(10, 3, false, 1500.0);

        let summary = aggregator.summary();
        assert_eq!(summary.total_batches, 2);
        assert_eq!(summary.failed_batches, 1);
        assert_eq!(summary.delivered_messages, 10);
        assert!((summary.failure_rate - 50.0).abs() < 1e-10);
        assert!((summary.mean_attempts - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = DispatchStatsAggregator::new();
        aggregator.record_batch(50, 1, true, 3.0);
        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Total batches: 1"));
        assert!(output.contains("0.00%"));
    }

    #[test]
    fn test_record_functions_without_recorder() {
        // No recorder installed: the macros must be no-ops
        record_probe_latency_ms("example.com", 12.5);
        record_probe_failure("example.com");
        record_batch_size(10, 12.5);
        record_retry_attempt(1, 500);
        record_retry_exhausted();
        record_timeout(100);
        record_batch_dispatched("log", true);
    }
}
