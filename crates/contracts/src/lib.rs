//! # Contracts
//!
//! Frozen interface contracts shared by every coordination crate: the
//! per-unit-of-work data model, the error taxonomy, collaborator traits
//! and the configuration model.
//! Business crates depend on this crate only, never the reverse.
//!
//! ## Identifier Model
//! - Tokens are lowercase hex strings of random bytes
//! - A record id doubles as the span id of the batch it keys

mod config;
mod error;
mod identity;
mod message;
mod probe;
mod schema;
mod sizing;
mod token;
mod transport;

pub use config::*;
pub use error::*;
pub use identity::*;
pub use message::*;
pub use probe::{LatencyProbe, LocalLatencyProbe};
pub use schema::SchemaValidator;
pub use sizing::*;
pub use token::Token;
pub use transport::{LocalTransport, Transport};
