//! Master Transaction Engine.
//!
//! A synthetic traffic generator plus four channel processes: read-address,
//! read-data, write-address, and write-data. The address processes admit
//! pending requests in strict FIFO order (a mismatched head stalls the
//! channel), tag them, and drive the address-phase handshake; the data
//! processes reconcile returned beats against the outstanding tables by tag
//! and retire transactions on the final beat.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use rand::Rng;
use rand_pcg::Pcg32;

use crate::bus::protocol::{AddrChannel, Kind, ReadDataChannel, Request, Transaction, WriteDataChannel};
use crate::common::{AddressMap, SimError};
use crate::sim::process::{Process, SimTime, Wait};
use crate::stats::StatsHandle;

/// State shared by the master's processes.
pub struct MasterState {
    pub pending: VecDeque<Request>,
    pub read_outstanding: HashMap<u32, Transaction>,
    pub write_outstanding: HashMap<u32, Transaction>,
    next_read_tag: u32,
    next_write_tag: u32,
}

/// Shared handle to the master state.
pub type MasterHandle = Rc<RefCell<MasterState>>;

impl MasterState {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
            read_outstanding: HashMap::new(),
            write_outstanding: HashMap::new(),
            next_read_tag: 0,
            next_write_tag: 0,
        }
    }

    /// Allocates the next tag for a direction. Counters are per-direction
    /// and monotonically increasing, so a tag cannot recur while an earlier
    /// transaction with it is still outstanding.
    fn alloc_tag(&mut self, kind: Kind) -> u32 {
        let counter = match kind {
            Kind::Read => &mut self.next_read_tag,
            Kind::Write => &mut self.next_write_tag,
        };
        let tag = *counter;
        *counter += 1;
        tag
    }

    fn outstanding_mut(&mut self, kind: Kind) -> &mut HashMap<u32, Transaction> {
        match kind {
            Kind::Read => &mut self.read_outstanding,
            Kind::Write => &mut self.write_outstanding,
        }
    }
}

impl Default for MasterState {
    fn default() -> Self {
        Self::new()
    }
}

/// Burst-parameter bounds for admitted requests.
#[derive(Debug, Clone, Copy)]
pub struct BurstBounds {
    pub size_exp: u8,
    pub len_min: u8,
    pub len_max: u8,
}

/// Enqueues a random request at a fixed simulated interval.
pub struct TrafficGenerator {
    master: MasterHandle,
    stats: StatsHandle,
    rng: Pcg32,
    interval: SimTime,
    map: AddressMap,
    /// Largest burst any admitted request can carry, constraining the
    /// column choice so bursts stay inside a row.
    max_burst: u32,
    primed: bool,
}

impl TrafficGenerator {
    pub fn new(
        master: MasterHandle,
        stats: StatsHandle,
        rng: Pcg32,
        interval: SimTime,
        map: AddressMap,
        max_burst: u32,
    ) -> Self {
        Self {
            master,
            stats,
            rng,
            interval,
            map,
            max_burst,
            primed: false,
        }
    }
}

impl Process for TrafficGenerator {
    fn name(&self) -> &'static str {
        "gen"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        if !self.primed {
            self.primed = true;
            return Ok(Wait::Delay(self.interval));
        }
        let kind = if self.rng.gen_bool(0.5) {
            Kind::Read
        } else {
            Kind::Write
        };
        let bank = self.rng.gen_range(0..self.map.banks());
        let row = self.rng.gen_range(0..self.map.rows());
        let col = self.rng.gen_range(0..=self.map.cols() - self.max_burst);
        let addr = self.map.compose(bank, row, col);
        log::trace!("[master] t={now} generate {kind:?} addr={addr:#010x}");
        self.master.borrow_mut().pending.push_back(Request { kind, addr });
        self.stats.borrow_mut().requests_generated += 1;
        Ok(Wait::Delay(self.interval))
    }
}

#[derive(Clone, Copy)]
enum IssueState {
    Poll,
    Admit,
    WaitReady,
}

/// Address-phase issue process; one instance each for the AR and AW
/// channels, distinguished by `kind`.
pub struct AddrIssue {
    kind: Kind,
    master: MasterHandle,
    stats: StatsHandle,
    chan: AddrChannel,
    rng: Pcg32,
    bounds: BurstBounds,
    state: IssueState,
}

impl AddrIssue {
    pub fn new(
        kind: Kind,
        master: MasterHandle,
        stats: StatsHandle,
        chan: AddrChannel,
        rng: Pcg32,
        bounds: BurstBounds,
    ) -> Self {
        Self {
            kind,
            master,
            stats,
            chan,
            rng,
            bounds,
            state: IssueState::Poll,
        }
    }
}

impl Process for AddrIssue {
    fn name(&self) -> &'static str {
        match self.kind {
            Kind::Read => "master_ar",
            Kind::Write => "master_aw",
        }
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        loop {
            match self.state {
                IssueState::Poll => {
                    let head_matches = matches!(
                        self.master.borrow().pending.front(),
                        Some(req) if req.kind == self.kind
                    );
                    if head_matches {
                        self.state = IssueState::Admit;
                    }
                    return Ok(Wait::Edge);
                }
                IssueState::Admit => {
                    let mut master = self.master.borrow_mut();
                    let req = match master.pending.front().copied() {
                        Some(req) if req.kind == self.kind => {
                            master.pending.pop_front();
                            req
                        }
                        _ => {
                            self.state = IssueState::Poll;
                            continue;
                        }
                    };
                    let tag = master.alloc_tag(self.kind);
                    let len = self.rng.gen_range(self.bounds.len_min..=self.bounds.len_max);
                    let txn = Transaction {
                        tag,
                        kind: self.kind,
                        addr: req.addr,
                        size: self.bounds.size_exp,
                        len,
                    };
                    let prev = master.outstanding_mut(self.kind).insert(tag, txn);
                    debug_assert!(prev.is_none(), "tag reused while outstanding");
                    drop(master);

                    match self.kind {
                        Kind::Read => self.stats.borrow_mut().reads_issued += 1,
                        Kind::Write => self.stats.borrow_mut().writes_issued += 1,
                    }
                    log::debug!(
                        "[master] t={now} issue {:?} tag={tag} addr={:#010x} size={} len={}",
                        self.kind,
                        txn.addr,
                        txn.size,
                        txn.len
                    );
                    self.chan.id.write(tag);
                    self.chan.addr.write(txn.addr);
                    self.chan.size.write(txn.size as u32);
                    self.chan.len.write(txn.len as u32);
                    self.chan.valid.write(true);
                    self.state = IssueState::WaitReady;
                    return Ok(Wait::Edge);
                }
                IssueState::WaitReady => {
                    if !self.chan.ready.read() {
                        return Ok(Wait::Edge);
                    }
                    self.chan.valid.write(false);
                    self.state = IssueState::Poll;
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum SinkState {
    Top,
    WaitValid,
    Ack,
    Beat { tag: u32, done: u32 },
    Finish,
    Drain,
}

/// Read-data process: accepts response bursts and retires read
/// transactions by tag.
pub struct ReadSink {
    master: MasterHandle,
    stats: StatsHandle,
    chan: ReadDataChannel,
    state: SinkState,
}

impl ReadSink {
    pub fn new(master: MasterHandle, stats: StatsHandle, chan: ReadDataChannel) -> Self {
        Self {
            master,
            stats,
            chan,
            state: SinkState::Top,
        }
    }
}

impl Process for ReadSink {
    fn name(&self) -> &'static str {
        "master_r"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        loop {
            match self.state {
                SinkState::Top => {
                    self.state = SinkState::WaitValid;
                    return Ok(Wait::Edge);
                }
                SinkState::WaitValid => {
                    if self.master.borrow().read_outstanding.is_empty() {
                        return Ok(Wait::Edge);
                    }
                    if !self.chan.valid.read() {
                        return Ok(Wait::Edge);
                    }
                    self.chan.ready.write(true);
                    self.state = SinkState::Ack;
                    return Ok(Wait::Edge);
                }
                SinkState::Ack => {
                    if !self.chan.valid.read() {
                        return Ok(Wait::Edge);
                    }
                    let tag = self.chan.id.read();
                    if !self.master.borrow().read_outstanding.contains_key(&tag) {
                        return Err(SimError::UnknownTag { tag });
                    }
                    self.state = SinkState::Beat { tag, done: 0 };
                    return Ok(Wait::Edge);
                }
                SinkState::Beat { tag, done } => {
                    if !self.chan.valid.read() {
                        return Ok(Wait::Edge);
                    }
                    let word = self.chan.data.read();
                    let txn = *self
                        .master
                        .borrow()
                        .read_outstanding
                        .get(&tag)
                        .ok_or(SimError::UnknownTag { tag })?;
                    self.stats.borrow_mut().bytes_received += txn.beat_bytes();
                    let done = done + 1;
                    log::trace!(
                        "[master] t={now} read beat tag={tag} beat={done}/{} data={word:#010x}",
                        txn.beats()
                    );
                    if self.chan.last.read() {
                        self.master.borrow_mut().read_outstanding.remove(&tag);
                        self.stats.borrow_mut().reads_completed += 1;
                        log::debug!(
                            "[master] t={now} read done tag={tag} beats={done} bytes={}",
                            txn.bytes()
                        );
                        self.state = SinkState::Finish;
                    } else {
                        self.state = SinkState::Beat { tag, done };
                    }
                    return Ok(Wait::Edge);
                }
                SinkState::Finish => {
                    self.chan.ready.write(false);
                    self.state = SinkState::Drain;
                    return Ok(Wait::Edge);
                }
                SinkState::Drain => {
                    if self.chan.valid.read() {
                        return Ok(Wait::Edge);
                    }
                    self.state = SinkState::Top;
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum SourceState {
    WaitPhase,
    Produce { tag: u32, sent: u32 },
    Finish { tag: u32 },
}

/// Write-data process: answers the slave's data-phase announcement with a
/// burst of pseudo-random words, flagging the final beat.
pub struct WriteSource {
    master: MasterHandle,
    stats: StatsHandle,
    chan: WriteDataChannel,
    rng: Pcg32,
    state: SourceState,
}

impl WriteSource {
    pub fn new(
        master: MasterHandle,
        stats: StatsHandle,
        chan: WriteDataChannel,
        rng: Pcg32,
    ) -> Self {
        Self {
            master,
            stats,
            chan,
            rng,
            state: SourceState::WaitPhase,
        }
    }
}

impl Process for WriteSource {
    fn name(&self) -> &'static str {
        "master_w"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        match self.state {
            SourceState::WaitPhase => {
                if !self.chan.ready.read() {
                    return Ok(Wait::Edge);
                }
                let tag = self.chan.id.read();
                if !self.master.borrow().write_outstanding.contains_key(&tag) {
                    return Err(SimError::UnknownTag { tag });
                }
                self.state = SourceState::Produce { tag, sent: 0 };
                Ok(Wait::Edge)
            }
            SourceState::Produce { tag, sent } => {
                if !self.chan.ready.read() {
                    return Ok(Wait::Edge);
                }
                let txn = *self
                    .master
                    .borrow()
                    .write_outstanding
                    .get(&tag)
                    .ok_or(SimError::UnknownTag { tag })?;
                let word: u32 = self.rng.gen();
                self.chan.data.write(word);
                self.chan.valid.write(true);
                let last = sent == txn.len as u32;
                self.chan.last.write(last);
                log::trace!(
                    "[master] t={now} write beat tag={tag} beat={}/{}",
                    sent + 1,
                    txn.beats()
                );
                self.state = if last {
                    SourceState::Finish { tag }
                } else {
                    SourceState::Produce { tag, sent: sent + 1 }
                };
                Ok(Wait::Edge)
            }
            SourceState::Finish { tag } => {
                self.chan.valid.write(false);
                self.chan.last.write(false);
                self.master.borrow_mut().write_outstanding.remove(&tag);
                self.stats.borrow_mut().writes_completed += 1;
                log::debug!("[master] t={now} write done tag={tag}");
                self.state = SourceState::WaitPhase;
                Ok(Wait::Edge)
            }
        }
    }
}
