//! Discrete-Event Kernel.
//!
//! Owns simulated time, the clock, the process table, the signal registry,
//! and the event registry. Scheduling is cooperative and single-threaded:
//! at each instant the kernel runs every ready process once (in registration
//! order), commits buffered signal writes, wakes event waiters, and repeats
//! these delta rounds until the instant is quiescent before advancing time.
//! With a fixed process registration order the whole simulation is
//! deterministic and reproducible.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::common::SimError;
use crate::sim::clock::Clock;
use crate::sim::event::Event;
use crate::sim::process::{ns, Process, SimTime, Wait};
use crate::sim::signal::{Commit, Signal, SignalValue};
use crate::sim::trace::Tracer;

enum WaitState {
    /// Not yet started; runs in the first evaluation round.
    Init,
    Edge,
    /// Parked in the timer heap.
    Timer,
    Event(Event),
}

struct ProcEntry {
    proc: Box<dyn Process>,
    wait: WaitState,
}

/// The simulation context: clock, signals, events, processes, time.
pub struct Kernel {
    now: SimTime,
    clock: Clock,
    procs: Vec<ProcEntry>,
    signals: Vec<Box<dyn Commit>>,
    events: Vec<Event>,
    timers: BinaryHeap<Reverse<(SimTime, usize)>>,
    tracer: Option<Box<dyn Tracer>>,
    started: bool,
}

impl Kernel {
    /// Creates a kernel with a clock of the given period, duty cycle, and
    /// start delay (all but the duty cycle in nanoseconds).
    pub fn new(period_ns: f64, duty_cycle: f64, start_delay_ns: f64) -> Self {
        let mut signals: Vec<Box<dyn Commit>> = Vec::new();
        let clk = Signal::new("clk", false);
        signals.push(Box::new(clk.clone()));
        Self {
            now: 0,
            clock: Clock::new(ns(period_ns), duty_cycle, ns(start_delay_ns), clk),
            procs: Vec::new(),
            signals,
            events: Vec::new(),
            timers: BinaryHeap::new(),
            tracer: None,
            started: false,
        }
    }

    /// Current simulated time in picoseconds.
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Registers a named signal and returns a handle to it.
    pub fn signal<T: SignalValue>(&mut self, name: impl Into<String>, init: T) -> Signal<T> {
        let sig = Signal::new(name, init);
        self.signals.push(Box::new(sig.clone()));
        sig
    }

    /// Registers a named event and returns a handle to it.
    pub fn event(&mut self, name: impl Into<String>) -> Event {
        let ev = Event::new(name);
        self.events.push(ev.clone());
        ev
    }

    /// Adds a process. Registration order fixes the wake order within an
    /// evaluation round.
    pub fn add_process(&mut self, proc: Box<dyn Process>) {
        self.procs.push(ProcEntry {
            proc,
            wait: WaitState::Init,
        });
    }

    /// Installs a signal-transition observer.
    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>) {
        self.tracer = Some(tracer);
    }

    /// Runs the simulation until `end` (inclusive of events at `end`).
    ///
    /// May be called repeatedly with increasing horizons. A fatal error from
    /// any process stops the run immediately and is returned.
    pub fn run_until(&mut self, end: SimTime) -> Result<(), SimError> {
        if !self.started {
            self.started = true;
            let all: Vec<usize> = (0..self.procs.len()).collect();
            self.eval_rounds(all)?;
        }

        loop {
            let mut next = self.clock.next_transition();
            if let Some(Reverse((t, _))) = self.timers.peek() {
                next = next.min(*t);
            }
            if next > end {
                self.now = end;
                return Ok(());
            }
            self.now = next;

            let rising = self.clock.advance_to(next);
            let mut runnable = Vec::new();
            if rising {
                for (i, entry) in self.procs.iter().enumerate() {
                    if matches!(entry.wait, WaitState::Edge | WaitState::Init) {
                        runnable.push(i);
                    }
                }
            }
            while let Some(Reverse((t, i))) = self.timers.peek().copied() {
                if t != next {
                    break;
                }
                self.timers.pop();
                runnable.push(i);
            }
            runnable.sort_unstable();
            runnable.dedup();

            self.eval_rounds(runnable)?;
        }
    }

    /// Runs delta rounds at the current instant until quiescent.
    fn eval_rounds(&mut self, mut runnable: Vec<usize>) -> Result<(), SimError> {
        loop {
            for &i in &runnable {
                let wait = match self.procs[i].proc.resume(self.now) {
                    Ok(wait) => wait,
                    Err(e) => {
                        log::error!(
                            "[kernel] t={} fatal in {}: {e}",
                            self.now,
                            self.procs[i].proc.name()
                        );
                        return Err(e);
                    }
                };
                self.procs[i].wait = match wait {
                    Wait::Edge => WaitState::Edge,
                    Wait::Delay(d) => {
                        debug_assert!(d > 0, "zero-length delay");
                        self.timers.push(Reverse((self.now + d, i)));
                        WaitState::Timer
                    }
                    Wait::Event(ev) => WaitState::Event(ev),
                };
            }

            for sig in &self.signals {
                sig.commit(self.now, self.tracer.as_deref_mut());
            }

            let mut woken = Vec::new();
            for (i, entry) in self.procs.iter().enumerate() {
                if let WaitState::Event(ev) = &entry.wait {
                    if ev.pending() {
                        woken.push(i);
                    }
                }
            }
            for ev in &self.events {
                ev.clear();
            }

            if woken.is_empty() {
                return Ok(());
            }
            runnable = woken;
        }
    }
}
