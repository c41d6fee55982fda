//! Common utilities and types used throughout the bus system simulator.
//!
//! This module provides the address decomposition shared by every component
//! on the bus and the fatal error taxonomy that halts a run.

/// Bank/row/column address decomposition.
pub mod addr;

/// Fatal error definitions.
pub mod error;

pub use addr::AddressMap;
pub use error::SimError;
