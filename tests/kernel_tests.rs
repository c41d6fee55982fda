//! Integration tests for the discrete-event kernel.

use std::cell::RefCell;
use std::rc::Rc;

use axi_simulator::common::SimError;
use axi_simulator::sim::process::{ns, Process, SimTime, Wait};
use axi_simulator::sim::{Event, Kernel, Signal, TraceValue, Tracer};

/// Records every resume time, then suspends on the next clock edge.
struct EdgeLogger {
    log: Rc<RefCell<Vec<SimTime>>>,
}

impl Process for EdgeLogger {
    fn name(&self) -> &'static str {
        "edge_logger"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        self.log.borrow_mut().push(now);
        Ok(Wait::Edge)
    }
}

/// Writes a value to a signal on its first resume.
struct Writer {
    sig: Signal<u32>,
    done: bool,
}

impl Process for Writer {
    fn name(&self) -> &'static str {
        "writer"
    }

    fn resume(&mut self, _now: SimTime) -> Result<Wait, SimError> {
        if !self.done {
            self.sig.write(7);
            self.done = true;
        }
        Ok(Wait::Edge)
    }
}

/// Samples a signal on every resume.
struct Reader {
    sig: Signal<u32>,
    log: Rc<RefCell<Vec<(SimTime, u32)>>>,
}

impl Process for Reader {
    fn name(&self) -> &'static str {
        "reader"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        self.log.borrow_mut().push((now, self.sig.read()));
        Ok(Wait::Edge)
    }
}

/// Tests that processes wake on rising edges at the configured schedule.
#[test]
fn test_clock_edge_schedule() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut kernel = Kernel::new(10.0, 0.5, 5.0);
    kernel.add_process(Box::new(EdgeLogger { log: log.clone() }));

    kernel.run_until(ns(50.0)).expect("run");

    // Initial evaluation at t=0, then rising edges at 5, 15, 25, 35, 45 ns.
    let expected: Vec<SimTime> = vec![0, 5_000, 15_000, 25_000, 35_000, 45_000];
    assert_eq!(*log.borrow(), expected);
}

/// Tests that a write is invisible within its own evaluation round and
/// visible in the next one (delta-cycle semantics).
#[test]
fn test_delta_cycle_visibility() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut kernel = Kernel::new(5.0, 0.5, 5.0);
    let sig = kernel.signal("delta_sig", 0u32);

    // The writer runs before the reader in every round.
    kernel.add_process(Box::new(Writer {
        sig: sig.clone(),
        done: false,
    }));
    kernel.add_process(Box::new(Reader {
        sig,
        log: log.clone(),
    }));

    kernel.run_until(ns(7.0)).expect("run");

    // At t=0 the writer has already written 7, but the reader still sees 0.
    assert_eq!(*log.borrow(), vec![(0, 0), (5_000, 7)]);
}

/// Records resume times, then suspends on a fixed delay.
struct Sleeper {
    log: Rc<RefCell<Vec<SimTime>>>,
    delay: SimTime,
}

impl Process for Sleeper {
    fn name(&self) -> &'static str {
        "sleeper"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        self.log.borrow_mut().push(now);
        Ok(Wait::Delay(self.delay))
    }
}

/// Tests that explicit delays wake at exact times, independent of edges.
#[test]
fn test_delay_wakeups() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut kernel = Kernel::new(10.0, 0.5, 5.0);
    kernel.add_process(Box::new(Sleeper {
        log: log.clone(),
        delay: ns(3.0),
    }));

    kernel.run_until(ns(10.0)).expect("run");

    assert_eq!(*log.borrow(), vec![0, 3_000, 6_000, 9_000]);
}

/// Notifies an event at the first rising edge.
struct Notifier {
    ev: Event,
    fired: bool,
}

impl Process for Notifier {
    fn name(&self) -> &'static str {
        "notifier"
    }

    fn resume(&mut self, _now: SimTime) -> Result<Wait, SimError> {
        if !self.fired {
            self.fired = true;
        } else {
            self.ev.notify();
        }
        Ok(Wait::Edge)
    }
}

/// Suspends on an event and records each wake time.
struct Waiter {
    ev: Event,
    log: Rc<RefCell<Vec<SimTime>>>,
}

impl Process for Waiter {
    fn name(&self) -> &'static str {
        "waiter"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        self.log.borrow_mut().push(now);
        Ok(Wait::Event(self.ev.clone()))
    }
}

/// Tests that an event notification wakes waiters within the same instant.
#[test]
fn test_event_wakes_in_same_instant() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut kernel = Kernel::new(5.0, 0.5, 5.0);
    let ev = kernel.event("test_event");

    kernel.add_process(Box::new(Notifier {
        ev: ev.clone(),
        fired: false,
    }));
    kernel.add_process(Box::new(Waiter { ev, log: log.clone() }));

    kernel.run_until(ns(6.0)).expect("run");

    // The waiter runs at t=0 and is woken again at the 5 ns edge, in the
    // delta round following the notification.
    assert_eq!(*log.borrow(), vec![0, 5_000]);
}

/// Appends its id to a shared log on every resume.
struct Tagger {
    id: u32,
    log: Rc<RefCell<Vec<u32>>>,
}

impl Process for Tagger {
    fn name(&self) -> &'static str {
        "tagger"
    }

    fn resume(&mut self, _now: SimTime) -> Result<Wait, SimError> {
        self.log.borrow_mut().push(self.id);
        Ok(Wait::Edge)
    }
}

/// Tests that wake order within a round follows registration order.
#[test]
fn test_deterministic_wake_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut kernel = Kernel::new(5.0, 0.5, 5.0);
    for id in [2, 0, 1] {
        kernel.add_process(Box::new(Tagger { id, log: log.clone() }));
    }

    kernel.run_until(ns(12.0)).expect("run");

    // Initial round plus the edges at 5 and 10 ns.
    assert_eq!(*log.borrow(), vec![2, 0, 1, 2, 0, 1, 2, 0, 1]);
}

/// Fails immediately with a fatal error.
struct Faulty;

impl Process for Faulty {
    fn name(&self) -> &'static str {
        "faulty"
    }

    fn resume(&mut self, _now: SimTime) -> Result<Wait, SimError> {
        Err(SimError::UnknownTag { tag: 9 })
    }
}

/// Tests that a fatal error from any process stops the whole run.
#[test]
fn test_fatal_error_halts_run() {
    let mut kernel = Kernel::new(5.0, 0.5, 5.0);
    kernel.add_process(Box::new(Faulty));

    let result = kernel.run_until(ns(100.0));
    assert_eq!(result, Err(SimError::UnknownTag { tag: 9 }));
}

#[derive(Clone, Default)]
struct Recorder {
    changes: Rc<RefCell<Vec<(SimTime, String, TraceValue)>>>,
}

impl Tracer for Recorder {
    fn change(&mut self, time: SimTime, name: &str, value: TraceValue) {
        self.changes.borrow_mut().push((time, name.to_string(), value));
    }
}

/// Tests that committed transitions, including the clock itself, reach the
/// tracer under their stable names.
#[test]
fn test_tracer_observes_transitions() {
    let recorder = Recorder::default();
    let changes = recorder.changes.clone();

    let mut kernel = Kernel::new(5.0, 0.5, 5.0);
    let sig = kernel.signal("traced_sig", 0u32);
    kernel.set_tracer(Box::new(recorder));
    kernel.add_process(Box::new(Writer { sig, done: false }));

    kernel.run_until(ns(9.0)).expect("run");

    let log = changes.borrow();
    assert!(log.contains(&(0, "traced_sig".to_string(), TraceValue::Word(7))));
    assert!(log.contains(&(5_000, "clk".to_string(), TraceValue::Bit(true))));
    assert!(log.contains(&(7_500, "clk".to_string(), TraceValue::Bit(false))));
}
