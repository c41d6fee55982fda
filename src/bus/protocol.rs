//! Shared Transaction Records and Channel Bundles.
//!
//! Defines the tagged transaction entity both agents track, the pending
//! request queue entry, and the signal bundles for the four protocol
//! channels (read/write address, read data, write data). Signal names are
//! stable so a tracer can record them.

use crate::sim::{Kernel, Signal};

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kind {
    #[default]
    Read,
    Write,
}

/// An untagged request produced by the traffic generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub kind: Kind,
    pub addr: u32,
}

/// A tagged in-flight transaction.
///
/// Created when a channel process admits a request from the pending queue;
/// destroyed when the final data beat is observed. `size` is the log2 of
/// bytes per beat, `len` the number of beats minus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transaction {
    pub tag: u32,
    pub kind: Kind,
    pub addr: u32,
    pub size: u8,
    pub len: u8,
}

impl Transaction {
    /// Number of data beats in the burst.
    pub fn beats(&self) -> u32 {
        self.len as u32 + 1
    }

    /// Bytes transferred per beat.
    pub fn beat_bytes(&self) -> u64 {
        1u64 << self.size
    }

    /// Total payload size of the burst in bytes.
    pub fn bytes(&self) -> u64 {
        self.beat_bytes() * (self.len as u64 + 1)
    }
}

/// Address-phase signal bundle, used for both the AR and AW channels.
///
/// The requester drives everything except `ready`.
#[derive(Clone)]
pub struct AddrChannel {
    pub valid: Signal<bool>,
    pub ready: Signal<bool>,
    pub id: Signal<u32>,
    pub addr: Signal<u32>,
    pub size: Signal<u32>,
    pub len: Signal<u32>,
}

impl AddrChannel {
    /// Registers the bundle's signals under `<prefix>valid`,
    /// `<prefix>ready`, and so on (`prefix` is `"ar"` or `"aw"`).
    pub fn new(kernel: &mut Kernel, prefix: &str) -> Self {
        Self {
            valid: kernel.signal(format!("{prefix}valid"), false),
            ready: kernel.signal(format!("{prefix}ready"), false),
            id: kernel.signal(format!("{prefix}id"), 0u32),
            addr: kernel.signal(format!("{prefix}addr"), 0u32),
            size: kernel.signal(format!("{prefix}size"), 0u32),
            len: kernel.signal(format!("{prefix}len"), 0u32),
        }
    }
}

/// Read-data signal bundle. The slave drives all but `ready`.
#[derive(Clone)]
pub struct ReadDataChannel {
    pub valid: Signal<bool>,
    pub ready: Signal<bool>,
    pub id: Signal<u32>,
    pub data: Signal<u32>,
    pub last: Signal<bool>,
}

impl ReadDataChannel {
    pub fn new(kernel: &mut Kernel) -> Self {
        Self {
            valid: kernel.signal("rvalid", false),
            ready: kernel.signal("rready", false),
            id: kernel.signal("rid", 0u32),
            data: kernel.signal("rdata", 0u32),
            last: kernel.signal("rlast", false),
        }
    }
}

/// Write-data signal bundle.
///
/// The slave opens the phase by driving `id` and `ready`; the master then
/// streams `data`/`valid` and flags the final beat with `last`.
#[derive(Clone)]
pub struct WriteDataChannel {
    pub ready: Signal<bool>,
    pub id: Signal<u32>,
    pub valid: Signal<bool>,
    pub data: Signal<u32>,
    pub last: Signal<bool>,
}

impl WriteDataChannel {
    pub fn new(kernel: &mut Kernel) -> Self {
        Self {
            ready: kernel.signal("wready", false),
            id: kernel.signal("wid", 0u32),
            valid: kernel.signal("wvalid", false),
            data: kernel.signal("wdata", 0u32),
            last: kernel.signal("wlast", false),
        }
    }
}
