//! # Resilience
//!
//! 重试与超时执行器：
//! - `retry_with_backoff`: 指数退避重试，耗尽后原样返回最后一次错误
//! - `with_timeout`: 截止时间竞速，超时即丢弃操作
//! - `spawn_with_timeout`: 在独立任务上运行，超时后 abort
//! - `ExecutionPolicy`: 按配置组合以上原语

mod policy;
mod retry;
mod timeout;

pub use policy::ExecutionPolicy;
pub use retry::{retry_with_backoff, retry_with_backoff_if, RetryPolicy};
pub use timeout::{spawn_with_timeout, with_timeout};
