//! Memory Timing Model.
//!
//! The DDR back-end: a command queue fed over the `ca`/`ca_en` signal pair,
//! one open-row register per bank with a fixed row-switch penalty on a
//! miss, and burst streaming of read data over `data_out` behind a
//! `data_ready` pulse.

/// Command queue, bank/row state, and data streaming processes.
pub mod ddr;

/// The `[bank][row][column]` word array.
pub mod store;

pub use ddr::{DdrCommandFeed, DdrService};
pub use store::{BackingStore, PATTERN_BASE};

use crate::bus::protocol::Kind;
use crate::sim::process::SimTime;
use crate::sim::signal::{Signal, SignalValue};
use crate::sim::trace::{TraceValue, Tracer};
use crate::sim::{Event, Kernel};

/// One command presented to the memory model: a whole burst at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemCommand {
    pub kind: Kind,
    pub addr: u32,
    /// Number of beats in the burst.
    pub burst: u32,
}

impl SignalValue for MemCommand {
    /// A command traces as three named sub-entries, like a record signal.
    fn record(&self, name: &str, time: SimTime, tracer: &mut dyn Tracer) {
        tracer.change(time, &format!("{name}.kind"), TraceValue::Word(self.kind as u32));
        tracer.change(time, &format!("{name}.addr"), TraceValue::Word(self.addr));
        tracer.change(time, &format!("{name}.burst"), TraceValue::Word(self.burst));
    }
}

/// Signal bundle between the slave and the memory model.
#[derive(Clone)]
pub struct MemChannel {
    /// Command payload, sampled while `ca_en` is held.
    pub ca: Signal<MemCommand>,
    /// Command enable, held by the issuer until accepted.
    pub ca_en: Signal<bool>,
    /// Service pulse: the current command has reached its data phase.
    pub data_ready: Signal<bool>,
    /// Read data, one word per beat.
    pub data_out: Signal<u32>,
    /// Notified once per accepted command, releasing the issuer.
    pub accept: Event,
    /// Notified alongside the ready pulse, releasing the command feed.
    pub ready_event: Event,
}

impl MemChannel {
    pub fn new(kernel: &mut Kernel) -> Self {
        Self {
            ca: kernel.signal("ca", MemCommand::default()),
            ca_en: kernel.signal("ca_en", false),
            data_ready: kernel.signal("data_ready", false),
            data_out: kernel.signal("data_out", 0u32),
            accept: kernel.event("ca_accept"),
            ready_event: kernel.event("data_ready_event"),
        }
    }
}
