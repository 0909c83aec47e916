//! Requests handed from producers to executors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Keys are unsigned 64-bit integers
pub type Key = u64;

/// Bit set on a live key to turn it into a key that is guaranteed absent
///
/// Loaded and inserted keys are required to stay below 2^63, so a key with
/// this bit set never exists in the store.
pub const NEGATIVE_KEY_BIT: Key = 1 << 63;

/// Request kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Read,
    ReadModifyWrite,
    NegativeRead,
    Scan,
    Update,
    Delete,
    Insert,
}

impl Operation {
    /// Every operation, in threshold order (insert takes the remainder)
    pub const ALL: [Operation; 7] = [
        Operation::Read,
        Operation::ReadModifyWrite,
        Operation::NegativeRead,
        Operation::Scan,
        Operation::Update,
        Operation::Delete,
        Operation::Insert,
    ];

    /// Operations that address an existing key through a chooser
    pub const KEYED: [Operation; 6] = [
        Operation::Read,
        Operation::ReadModifyWrite,
        Operation::NegativeRead,
        Operation::Scan,
        Operation::Update,
        Operation::Delete,
    ];

    /// Position in [`Operation::ALL`]
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Whether the request carries a value to write
    #[inline]
    pub fn writes_value(self) -> bool {
        matches!(
            self,
            Operation::Insert | Operation::Update | Operation::ReadModifyWrite | Operation::Delete
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Read => "read",
            Operation::ReadModifyWrite => "read_modify_write",
            Operation::NegativeRead => "negative_read",
            Operation::Scan => "scan",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Insert => "insert",
        };
        f.write_str(name)
    }
}

/// A single request
///
/// `value` borrows from the producer's value pool and is only valid until the
/// next call to [`Producer::next`](super::Producer::next). Requests that carry
/// no payload use an empty slice; deletes carry the tombstone value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub op: Operation,
    pub key: Key,
    pub value: &'a [u8],
    /// Number of records to scan (zero for everything but scans)
    pub scan_amount: usize,
}

impl<'a> Request<'a> {
    pub fn new(op: Operation, key: Key, value: &'a [u8], scan_amount: usize) -> Self {
        Self {
            op,
            key,
            value,
            scan_amount,
        }
    }
}
