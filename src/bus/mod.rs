//! Bus Protocol Engines.
//!
//! The split-transaction protocol between the master and the slave:
//! separate address and data channels per direction, ready/valid flow
//! control, burst transfers, and out-of-order-safe tagging by transaction
//! ID.

/// Master engine: traffic generator and channel processes.
pub mod master;

/// Transaction records, tables, and channel signal bundles.
pub mod protocol;

/// Slave engine: channel processes and memory command issue.
pub mod slave;

pub use master::{AddrIssue, BurstBounds, MasterHandle, MasterState, ReadSink, TrafficGenerator, WriteSource};
pub use protocol::{AddrChannel, Kind, ReadDataChannel, Request, Transaction, WriteDataChannel};
pub use slave::{AddrAccept, ReadServe, SlaveHandle, SlaveState, WriteServe};
