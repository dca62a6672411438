//! Message / Batch - the unit handed to a transport

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{Identity, RecordKey};

/// One outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Optional partitioning key
    #[serde(default)]
    pub key: Option<String>,

    /// Opaque payload
    pub payload: Bytes,
}

impl Message {
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            key: None,
            payload: payload.into(),
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Messages dispatched together as one network operation
#[derive(Debug, Clone)]
pub struct Batch {
    /// Identity of the unit of work the batch belongs to
    pub identity: Identity,

    /// Record key of this batch (also its span id)
    pub record_key: RecordKey,

    /// Position of the batch within its unit of work (0-based)
    pub sequence: u64,

    /// Messages in dispatch order
    pub messages: Vec<Message>,
}

impl Batch {
    /// Total payload bytes
    pub fn byte_len(&self) -> usize {
        self.messages.iter().map(Message::len).sum()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Mean payload size in bytes, `None` for an empty slice
pub fn average_message_size(messages: &[Message]) -> Option<usize> {
    if messages.is_empty() {
        return None;
    }
    let total: usize = messages.iter().map(Message::len).sum();
    Some(total / messages.len())
}
