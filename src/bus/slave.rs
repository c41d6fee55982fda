//! Slave Transaction Engine.
//!
//! Two independent channel pairs: address+data for reads and address+data
//! for writes. The address processes register incoming requests in
//! admission FIFOs and tables; the data processes service those FIFOs in
//! strict order, drive one whole-burst command through the shared memory
//! port, and run the data-phase handshake with the master.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::bus::protocol::{AddrChannel, Kind, ReadDataChannel, Transaction, WriteDataChannel};
use crate::common::SimError;
use crate::mem::{MemChannel, MemCommand};
use crate::sim::process::{Process, SimTime, Wait};
use crate::stats::StatsHandle;

/// State shared by the slave's processes.
pub struct SlaveState {
    pub read_fifo: VecDeque<u32>,
    pub read_table: HashMap<u32, Transaction>,
    pub write_fifo: VecDeque<u32>,
    pub write_table: HashMap<u32, Transaction>,
    /// Held by whichever data process currently owns the memory port.
    port_busy: bool,
}

/// Shared handle to the slave state.
pub type SlaveHandle = Rc<RefCell<SlaveState>>;

impl SlaveState {
    pub fn new() -> Self {
        Self {
            read_fifo: VecDeque::new(),
            read_table: HashMap::new(),
            write_fifo: VecDeque::new(),
            write_table: HashMap::new(),
            port_busy: false,
        }
    }

    fn fifo_mut(&mut self, kind: Kind) -> &mut VecDeque<u32> {
        match kind {
            Kind::Read => &mut self.read_fifo,
            Kind::Write => &mut self.write_fifo,
        }
    }

    fn table_mut(&mut self, kind: Kind) -> &mut HashMap<u32, Transaction> {
        match kind {
            Kind::Read => &mut self.read_table,
            Kind::Write => &mut self.write_table,
        }
    }
}

impl Default for SlaveState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy)]
enum AcceptState {
    Top,
    WaitValid,
    Confirm,
}

/// Address-phase accept process; one instance each for AR and AW.
pub struct AddrAccept {
    kind: Kind,
    slave: SlaveHandle,
    chan: AddrChannel,
    state: AcceptState,
}

impl AddrAccept {
    pub fn new(kind: Kind, slave: SlaveHandle, chan: AddrChannel) -> Self {
        Self {
            kind,
            slave,
            chan,
            state: AcceptState::Top,
        }
    }
}

impl Process for AddrAccept {
    fn name(&self) -> &'static str {
        match self.kind {
            Kind::Read => "slave_ar",
            Kind::Write => "slave_aw",
        }
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        loop {
            match self.state {
                AcceptState::Top => {
                    self.state = AcceptState::WaitValid;
                    return Ok(Wait::Edge);
                }
                AcceptState::WaitValid => {
                    if !self.chan.valid.read() {
                        return Ok(Wait::Edge);
                    }
                    let txn = Transaction {
                        tag: self.chan.id.read(),
                        kind: self.kind,
                        addr: self.chan.addr.read(),
                        size: self.chan.size.read() as u8,
                        len: self.chan.len.read() as u8,
                    };
                    log::debug!(
                        "[slave] t={now} accept {:?} tag={} addr={:#010x} size={} len={}",
                        self.kind,
                        txn.tag,
                        txn.addr,
                        txn.size,
                        txn.len
                    );
                    let mut slave = self.slave.borrow_mut();
                    slave.fifo_mut(self.kind).push_back(txn.tag);
                    let prev = slave.table_mut(self.kind).insert(txn.tag, txn);
                    debug_assert!(prev.is_none(), "tag reused while outstanding");
                    drop(slave);
                    self.chan.ready.write(true);
                    self.state = AcceptState::Confirm;
                    return Ok(Wait::Edge);
                }
                AcceptState::Confirm => {
                    if !self.chan.valid.read() {
                        return Ok(Wait::Edge);
                    }
                    self.chan.ready.write(false);
                    self.state = AcceptState::Top;
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum PortPhase {
    Acquire,
    AwaitAccept,
    AwaitReady,
    Hold,
}

/// Issue-side driver for the shared memory command port.
///
/// At most one data process interacts with the memory model at a time; the
/// port is acquired before `ca`/`ca_en` are driven and released only after
/// the ready pulse has cleared.
struct CommandPort {
    slave: SlaveHandle,
    chan: MemChannel,
    cmd: MemCommand,
    phase: PortPhase,
}

impl CommandPort {
    fn new(slave: SlaveHandle, chan: MemChannel) -> Self {
        Self {
            slave,
            chan,
            cmd: MemCommand::default(),
            phase: PortPhase::Hold,
        }
    }

    fn begin(&mut self, cmd: MemCommand) {
        self.cmd = cmd;
        self.phase = PortPhase::Acquire;
    }

    /// Drives the command in. Returns `Some(wait)` to suspend, `None` once
    /// the ready pulse has been observed.
    fn step_issue(&mut self) -> Option<Wait> {
        match self.phase {
            PortPhase::Acquire => {
                let mut slave = self.slave.borrow_mut();
                if slave.port_busy {
                    return Some(Wait::Edge);
                }
                slave.port_busy = true;
                drop(slave);
                self.chan.ca.write(self.cmd);
                self.chan.ca_en.write(true);
                self.phase = PortPhase::AwaitAccept;
                Some(Wait::Event(self.chan.accept.clone()))
            }
            PortPhase::AwaitAccept => {
                self.chan.ca_en.write(false);
                self.phase = PortPhase::AwaitReady;
                Some(Wait::Edge)
            }
            PortPhase::AwaitReady => {
                if !self.chan.data_ready.read() {
                    return Some(Wait::Edge);
                }
                self.phase = PortPhase::Hold;
                None
            }
            PortPhase::Hold => None,
        }
    }

    /// Waits for the ready pulse to clear, then releases the port.
    fn step_release(&mut self) -> Option<Wait> {
        if self.chan.data_ready.read() {
            return Some(Wait::Edge);
        }
        self.slave.borrow_mut().port_busy = false;
        None
    }
}

#[derive(Clone, Copy)]
enum ReadServeState {
    Top,
    Head,
    MemIssue { tag: u32 },
    Align { tag: u32 },
    Buffer { tag: u32, index: u32 },
    MemRelease { tag: u32 },
    Announce { tag: u32 },
    Stream { tag: u32, index: u32 },
    Retire { tag: u32 },
    FinalPoll,
}

/// Read-data process: services registered reads in admission order,
/// buffers the whole burst from the memory model, then streams it to the
/// master beat by beat.
pub struct ReadServe {
    slave: SlaveHandle,
    chan: ReadDataChannel,
    port: CommandPort,
    buf: Vec<u32>,
    state: ReadServeState,
}

impl ReadServe {
    pub fn new(slave: SlaveHandle, chan: ReadDataChannel, mem: MemChannel) -> Self {
        Self {
            slave: slave.clone(),
            chan,
            port: CommandPort::new(slave, mem),
            buf: Vec::new(),
            state: ReadServeState::Top,
        }
    }

    fn lookup(&self, tag: u32) -> Result<Transaction, SimError> {
        self.slave
            .borrow()
            .read_table
            .get(&tag)
            .copied()
            .ok_or(SimError::UnknownTag { tag })
    }
}

impl Process for ReadServe {
    fn name(&self) -> &'static str {
        "slave_r"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        loop {
            match self.state {
                ReadServeState::Top => {
                    self.state = ReadServeState::Head;
                    return Ok(Wait::Edge);
                }
                ReadServeState::Head => {
                    let tag = match self.slave.borrow().read_fifo.front() {
                        Some(tag) => *tag,
                        None => return Ok(Wait::Edge),
                    };
                    let txn = self.lookup(tag)?;
                    self.buf.clear();
                    self.port.begin(MemCommand {
                        kind: Kind::Read,
                        addr: txn.addr,
                        burst: txn.beats(),
                    });
                    self.state = ReadServeState::MemIssue { tag };
                }
                ReadServeState::MemIssue { tag } => match self.port.step_issue() {
                    Some(wait) => return Ok(wait),
                    None => {
                        self.state = ReadServeState::Align { tag };
                        return Ok(Wait::Edge);
                    }
                },
                ReadServeState::Align { tag } => {
                    self.state = ReadServeState::Buffer { tag, index: 0 };
                    return Ok(Wait::Edge);
                }
                ReadServeState::Buffer { tag, index } => {
                    let txn = self.lookup(tag)?;
                    self.buf.push(self.port.chan.data_out.read());
                    let next = index + 1;
                    self.state = if next == txn.beats() {
                        ReadServeState::MemRelease { tag }
                    } else {
                        ReadServeState::Buffer { tag, index: next }
                    };
                    return Ok(Wait::Edge);
                }
                ReadServeState::MemRelease { tag } => match self.port.step_release() {
                    Some(wait) => return Ok(wait),
                    None => self.state = ReadServeState::Announce { tag },
                },
                ReadServeState::Announce { tag } => {
                    log::debug!(
                        "[slave] t={now} respond tag={tag} beats={}",
                        self.buf.len()
                    );
                    self.chan.id.write(tag);
                    self.chan.valid.write(true);
                    self.state = ReadServeState::Stream { tag, index: 0 };
                    return Ok(Wait::Edge);
                }
                ReadServeState::Stream { tag, index } => {
                    if !self.chan.ready.read() {
                        return Ok(Wait::Edge);
                    }
                    let last = index as usize == self.buf.len() - 1;
                    self.chan.data.write(self.buf[index as usize]);
                    self.chan.last.write(last);
                    self.state = if last {
                        ReadServeState::Retire { tag }
                    } else {
                        ReadServeState::Stream {
                            tag,
                            index: index + 1,
                        }
                    };
                    return Ok(Wait::Edge);
                }
                ReadServeState::Retire { tag } => {
                    let mut slave = self.slave.borrow_mut();
                    slave.read_fifo.pop_front();
                    slave.read_table.remove(&tag);
                    drop(slave);
                    self.chan.valid.write(false);
                    self.chan.last.write(false);
                    self.state = ReadServeState::FinalPoll;
                    return Ok(Wait::Edge);
                }
                ReadServeState::FinalPoll => {
                    if !self.chan.ready.read() {
                        return Ok(Wait::Edge);
                    }
                    self.state = ReadServeState::Top;
                }
            }
        }
    }
}

#[derive(Clone, Copy)]
enum WriteServeState {
    Top,
    Head,
    MemIssue { tag: u32 },
    MemRelease { tag: u32 },
    Announce { tag: u32 },
    Collect { tag: u32, count: u32 },
    Drain,
}

/// Write-data process: services registered writes in admission order,
/// charges the memory timing for the burst, then collects the data phase
/// from the master. Accepted payloads are counted, never committed to the
/// backing store.
pub struct WriteServe {
    slave: SlaveHandle,
    stats: StatsHandle,
    chan: WriteDataChannel,
    port: CommandPort,
    state: WriteServeState,
}

impl WriteServe {
    pub fn new(
        slave: SlaveHandle,
        stats: StatsHandle,
        chan: WriteDataChannel,
        mem: MemChannel,
    ) -> Self {
        Self {
            slave: slave.clone(),
            stats,
            chan,
            port: CommandPort::new(slave, mem),
            state: WriteServeState::Top,
        }
    }

    fn lookup(&self, tag: u32) -> Result<Transaction, SimError> {
        self.slave
            .borrow()
            .write_table
            .get(&tag)
            .copied()
            .ok_or(SimError::UnknownTag { tag })
    }
}

impl Process for WriteServe {
    fn name(&self) -> &'static str {
        "slave_w"
    }

    fn resume(&mut self, now: SimTime) -> Result<Wait, SimError> {
        loop {
            match self.state {
                WriteServeState::Top => {
                    self.state = WriteServeState::Head;
                    return Ok(Wait::Edge);
                }
                WriteServeState::Head => {
                    let tag = match self.slave.borrow().write_fifo.front() {
                        Some(tag) => *tag,
                        None => return Ok(Wait::Edge),
                    };
                    let txn = self.lookup(tag)?;
                    self.port.begin(MemCommand {
                        kind: Kind::Write,
                        addr: txn.addr,
                        burst: txn.beats(),
                    });
                    self.state = WriteServeState::MemIssue { tag };
                }
                WriteServeState::MemIssue { tag } => match self.port.step_issue() {
                    Some(wait) => return Ok(wait),
                    None => {
                        self.state = WriteServeState::MemRelease { tag };
                        return Ok(Wait::Edge);
                    }
                },
                WriteServeState::MemRelease { tag } => match self.port.step_release() {
                    Some(wait) => return Ok(wait),
                    None => self.state = WriteServeState::Announce { tag },
                },
                WriteServeState::Announce { tag } => {
                    log::debug!("[slave] t={now} write phase tag={tag}");
                    self.chan.id.write(tag);
                    self.chan.ready.write(true);
                    self.state = WriteServeState::Collect { tag, count: 0 };
                    return Ok(Wait::Edge);
                }
                WriteServeState::Collect { tag, count } => {
                    if !self.chan.valid.read() {
                        return Ok(Wait::Edge);
                    }
                    let txn = self.lookup(tag)?;
                    let _word = self.chan.data.read();
                    self.stats.borrow_mut().bytes_written += txn.beat_bytes();
                    let count = count + 1;
                    if self.chan.last.read() {
                        let mut slave = self.slave.borrow_mut();
                        slave.write_fifo.pop_front();
                        slave.write_table.remove(&tag);
                        drop(slave);
                        self.chan.ready.write(false);
                        log::debug!(
                            "[slave] t={now} write done tag={tag} beats={count} bytes={}",
                            txn.bytes()
                        );
                        self.state = WriteServeState::Drain;
                    } else {
                        self.state = WriteServeState::Collect { tag, count };
                    }
                    return Ok(Wait::Edge);
                }
                WriteServeState::Drain => {
                    if self.chan.valid.read() {
                        return Ok(Wait::Edge);
                    }
                    self.state = WriteServeState::Top;
                }
            }
        }
    }
}
