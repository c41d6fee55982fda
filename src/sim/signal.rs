//! Named Signals with Delta-Cycle Update Semantics.
//!
//! A signal write is buffered and only committed once every process in the
//! current evaluation round has suspended, so all processes reading a signal
//! within one round observe the same pre-update value. Committed changes are
//! reported to the kernel's tracer under the signal's stable name.

use std::cell::RefCell;
use std::rc::Rc;

use crate::sim::process::SimTime;
use crate::sim::trace::{TraceValue, Tracer};

/// Value types that can travel on a signal.
///
/// Implementors describe how a committed change is presented to a
/// [`Tracer`]; compound values may record several named sub-entries.
pub trait SignalValue: Copy + PartialEq + 'static {
    /// Reports this value to the tracer under the signal's name.
    fn record(&self, name: &str, time: SimTime, tracer: &mut dyn Tracer);
}

impl SignalValue for bool {
    fn record(&self, name: &str, time: SimTime, tracer: &mut dyn Tracer) {
        tracer.change(time, name, TraceValue::Bit(*self));
    }
}

impl SignalValue for u32 {
    fn record(&self, name: &str, time: SimTime, tracer: &mut dyn Tracer) {
        tracer.change(time, name, TraceValue::Word(*self));
    }
}

struct SignalInner<T> {
    name: String,
    cur: T,
    next: Option<T>,
}

/// Handle to a named, double-buffered signal.
///
/// Handles are cheap to clone; all clones refer to the same signal.
pub struct Signal<T: SignalValue> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T: SignalValue> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: SignalValue> Signal<T> {
    pub(crate) fn new(name: impl Into<String>, init: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                name: name.into(),
                cur: init,
                next: None,
            })),
        }
    }

    /// Reads the committed value.
    pub fn read(&self) -> T {
        self.inner.borrow().cur
    }

    /// Schedules a new value, visible to other processes from the next
    /// evaluation round. A later write in the same round wins.
    pub fn write(&self, value: T) {
        self.inner.borrow_mut().next = Some(value);
    }

    /// The signal's stable name.
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }
}

/// Kernel-side view of a signal: apply the pending value, if any.
pub(crate) trait Commit {
    /// Commits a pending write. Returns `true` if the value changed.
    fn commit(&self, time: SimTime, tracer: Option<&mut (dyn Tracer + '_)>) -> bool;
}

impl<T: SignalValue> Commit for Signal<T> {
    fn commit(&self, time: SimTime, tracer: Option<&mut (dyn Tracer + '_)>) -> bool {
        let mut inner = self.inner.borrow_mut();
        match inner.next.take() {
            Some(v) if v != inner.cur => {
                inner.cur = v;
                if let Some(t) = tracer {
                    v.record(&inner.name, time, t);
                }
                true
            }
            _ => false,
        }
    }
}
