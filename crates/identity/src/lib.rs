//! # Identity
//!
//! Correlation identity generation.
//!
//! 负责：
//! - 为每个工作单元生成 correlationId / traceId / type 三元组
//! - 生成 record key（同时作为 span id）
//! - 随机令牌使用加密安全的随机源

mod builder;
mod token;

pub use builder::{build_identity, build_record_key, IdentityBuilder};
pub use token::{random_token, CORRELATION_TOKEN_BYTES, RECORD_TOKEN_BYTES};
