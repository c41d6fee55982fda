//! Discrete-Event Scheduling Substrate.
//!
//! A cooperative, single-threaded simulation kernel with delta-cycle signal
//! semantics: a periodic clock, named signals whose writes become visible
//! only in the next evaluation round, named wake-up events, and processes
//! that suspend on clock edges, events, or explicit delays. Wake order
//! within a round follows process registration order, so runs are
//! deterministic and reproducible.

/// Periodic clock generation.
mod clock;

/// Named wake-up events.
pub mod event;

/// The event loop, process table, and delta-round evaluation.
pub mod kernel;

/// Process trait and suspension descriptors.
pub mod process;

/// Named signals with delta-cycle update semantics.
pub mod signal;

/// Signal-transition observation.
pub mod trace;

pub use event::Event;
pub use kernel::Kernel;
pub use process::{ns, Process, SimTime, Wait};
pub use signal::{Signal, SignalValue};
pub use trace::{JsonTracer, TraceValue, Tracer};
