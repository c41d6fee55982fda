//! Named Wake-Up Events.
//!
//! An event is a one-shot notification channel between processes. Notifying
//! an event wakes every process suspended on it in the next delta round of
//! the same simulated instant, then the notification is consumed.

use std::cell::RefCell;
use std::rc::Rc;

struct EventInner {
    name: String,
    pending: bool,
}

/// Handle to a named event. Clones refer to the same event.
#[derive(Clone)]
pub struct Event {
    inner: Rc<RefCell<EventInner>>,
}

impl Event {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EventInner {
                name: name.into(),
                pending: false,
            })),
        }
    }

    /// Notifies the event, waking waiters in the next delta round.
    pub fn notify(&self) {
        self.inner.borrow_mut().pending = true;
    }

    /// The event's stable name.
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    pub(crate) fn pending(&self) -> bool {
        self.inner.borrow().pending
    }

    pub(crate) fn clear(&self) {
        self.inner.borrow_mut().pending = false;
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event({})", self.inner.borrow().name)
    }
}
