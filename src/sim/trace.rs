//! Waveform Trace Observation.
//!
//! The kernel reports every committed signal transition to an optional
//! [`Tracer`], keyed by the signal's stable name. The trace format itself is
//! an external concern: this module only fixes the observation interface and
//! ships a JSON-lines implementation for the CLI.

use std::io::Write;

use crate::sim::process::SimTime;

/// A traced signal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceValue {
    Bit(bool),
    Word(u32),
}

/// Observer of committed signal transitions.
pub trait Tracer {
    /// Called once per signal change, after the change became visible.
    fn change(&mut self, time: SimTime, name: &str, value: TraceValue);
}

/// Tracer writing one JSON object per transition.
pub struct JsonTracer<W: Write> {
    out: W,
}

impl<W: Write> JsonTracer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Tracer for JsonTracer<W> {
    fn change(&mut self, time: SimTime, name: &str, value: TraceValue) {
        let entry = match value {
            TraceValue::Bit(b) => serde_json::json!({
                "t_ps": time,
                "signal": name,
                "value": b,
            }),
            TraceValue::Word(w) => serde_json::json!({
                "t_ps": time,
                "signal": name,
                "value": w,
            }),
        };
        writeln!(self.out, "{entry}").ok();
    }
}
