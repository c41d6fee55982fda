//! Process and Suspension Primitives.
//!
//! Every concurrently-behaving part of the system is a process: a resumable
//! state machine that runs until it reaches a suspension point and tells the
//! kernel what to wait for next. Exactly one process runs at a time, so a
//! process may freely mutate shared state between suspensions.

use crate::common::SimError;
use crate::sim::event::Event;

/// Simulated time in picoseconds.
pub type SimTime = u64;

/// Converts nanoseconds (the configuration unit) to simulated time.
pub fn ns(t: f64) -> SimTime {
    (t * 1000.0).round() as SimTime
}

/// What a process is suspended on.
///
/// Returned from [`Process::resume`] to hand control back to the kernel.
#[derive(Debug, Clone)]
pub enum Wait {
    /// Wake at the next rising clock edge.
    Edge,
    /// Wake after a fixed simulated delay, which need not land on an edge.
    Delay(SimTime),
    /// Wake when the named event is notified.
    Event(Event),
}

/// A cooperatively-scheduled simulation process.
///
/// `resume` is called each time the process's wait condition is met. The
/// process runs until it returns its next suspension; signal writes it
/// performs become visible to other processes only after it suspends.
/// Returning an error halts the whole simulation.
pub trait Process {
    /// Short stable name, used in logs.
    fn name(&self) -> &'static str;

    /// Runs the process up to its next suspension point.
    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError>;
}
