//! DDR Command and Data Processes.
//!
//! Two cooperating processes model the memory device. The command feed
//! samples `ca` while `ca_en` is held, queues the command, and blocks until
//! the service process reaches that command's data phase. The service
//! process peeks the oldest command, charges the row-switch penalty on a
//! row-buffer miss, pulses `data_ready`, then for a READ streams the burst
//! one word per cycle before retiring the command. A WRITE retires
//! immediately after the ready pulse; no payload is transferred.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::bus::protocol::Kind;
use crate::common::SimError;
use crate::mem::store::BackingStore;
use crate::mem::{MemChannel, MemCommand};
use crate::sim::process::{Process, SimTime, Wait};
use crate::stats::StatsHandle;

/// Shared command queue handle.
pub type CommandQueue = Rc<RefCell<VecDeque<MemCommand>>>;

/// Accepts commands from the `ca`/`ca_en` handshake into the queue.
pub struct DdrCommandFeed {
    chan: MemChannel,
    queue: CommandQueue,
    state: FeedState,
}

#[derive(Clone, Copy)]
enum FeedState {
    Poll,
    Accepted,
}

impl DdrCommandFeed {
    pub fn new(chan: MemChannel, queue: CommandQueue) -> Self {
        Self {
            chan,
            queue,
            state: FeedState::Poll,
        }
    }
}

impl Process for DdrCommandFeed {
    fn name(&self) -> &'static str {
        "ddr_cmd"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        match self.state {
            FeedState::Poll => {
                if !self.chan.ca_en.read() {
                    return Ok(Wait::Edge);
                }
                let cmd = self.chan.ca.read();
                log::debug!(
                    "[ddr] t={now} accept {:?} addr={:#010x} burst={}",
                    cmd.kind,
                    cmd.addr,
                    cmd.burst
                );
                self.queue.borrow_mut().push_back(cmd);
                self.chan.accept.notify();
                self.state = FeedState::Accepted;
                Ok(Wait::Event(self.chan.ready_event.clone()))
            }
            FeedState::Accepted => {
                self.state = FeedState::Poll;
                Ok(Wait::Edge)
            }
        }
    }
}

/// Services queued commands against the backing store and bank state.
pub struct DdrService {
    chan: MemChannel,
    queue: CommandQueue,
    store: BackingStore,
    open_rows: Vec<Option<u32>>,
    row_switch: SimTime,
    stats: StatsHandle,
    state: ServeState,
}

#[derive(Clone, Copy)]
enum ServeState {
    Idle,
    /// Resumed after the row-switch delay.
    Switched,
    Ready,
    Notify,
    Dispatch,
    Stream { index: u32 },
    Retire,
}

impl DdrService {
    pub fn new(
        chan: MemChannel,
        queue: CommandQueue,
        store: BackingStore,
        row_switch: SimTime,
        stats: StatsHandle,
    ) -> Self {
        let banks = store.map().banks() as usize;
        Self {
            chan,
            queue,
            store,
            open_rows: vec![None; banks],
            row_switch,
            stats,
            state: ServeState::Idle,
        }
    }

    fn head(&self) -> MemCommand {
        *self
            .queue
            .borrow()
            .front()
            .expect("service state requires a queued command")
    }
}

impl Process for DdrService {
    fn name(&self) -> &'static str {
        "ddr_data"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        loop {
            match self.state {
                ServeState::Idle => {
                    if self.queue.borrow().is_empty() {
                        return Ok(Wait::Edge);
                    }
                    let cmd = self.head();
                    let map = self.store.map();
                    let bank = map.bank(cmd.addr) as usize;
                    let row = map.row(cmd.addr);
                    if self.open_rows[bank] != Some(row) {
                        self.stats.borrow_mut().row_misses += 1;
                        log::trace!("[ddr] t={now} row switch bank={bank} row={row}");
                        self.state = ServeState::Switched;
                        return Ok(Wait::Delay(self.row_switch));
                    }
                    self.stats.borrow_mut().row_hits += 1;
                    self.state = ServeState::Ready;
                }
                ServeState::Switched => {
                    let cmd = self.head();
                    let map = self.store.map();
                    let bank = map.bank(cmd.addr) as usize;
                    self.open_rows[bank] = Some(map.row(cmd.addr));
                    self.state = ServeState::Ready;
                }
                ServeState::Ready => {
                    self.chan.data_ready.write(true);
                    self.state = ServeState::Notify;
                    return Ok(Wait::Edge);
                }
                ServeState::Notify => {
                    self.chan.ready_event.notify();
                    self.state = ServeState::Dispatch;
                    return Ok(Wait::Edge);
                }
                ServeState::Dispatch => {
                    let cmd = self.head();
                    match cmd.kind {
                        Kind::Read => {
                            let map = self.store.map();
                            let row = map.row(cmd.addr);
                            let col = map.col(cmd.addr);
                            if row >= map.rows() || col + cmd.burst > map.cols() {
                                return Err(SimError::AddressOutOfBounds {
                                    addr: cmd.addr,
                                    row,
                                    col,
                                    burst: cmd.burst,
                                });
                            }
                            self.state = ServeState::Stream { index: 0 };
                        }
                        Kind::Write => {
                            self.queue.borrow_mut().pop_front();
                            self.chan.data_ready.write(false);
                            self.state = ServeState::Idle;
                            return Ok(Wait::Edge);
                        }
                    }
                }
                ServeState::Stream { index } => {
                    let cmd = self.head();
                    let map = self.store.map();
                    let word = self.store.word(
                        map.bank(cmd.addr),
                        map.row(cmd.addr),
                        map.col(cmd.addr) + index,
                    );
                    self.chan.data_out.write(word);
                    let next = index + 1;
                    self.state = if next == cmd.burst {
                        ServeState::Retire
                    } else {
                        ServeState::Stream { index: next }
                    };
                    return Ok(Wait::Edge);
                }
                ServeState::Retire => {
                    self.queue.borrow_mut().pop_front();
                    self.chan.data_ready.write(false);
                    self.state = ServeState::Idle;
                    return Ok(Wait::Edge);
                }
            }
        }
    }
}
