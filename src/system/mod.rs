//! System Builder.
//!
//! Constructs the kernel, the protocol channels, the shared tables, and the
//! processes of the master, slave, and memory model, wired together by
//! stable signal names. This is the only consumer-facing surface: the CLI
//! and the integration tests drive the simulation through it.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rand_pcg::Pcg32;

use crate::bus::master::{
    AddrIssue, BurstBounds, MasterHandle, MasterState, ReadSink, TrafficGenerator, WriteSource,
};
use crate::bus::protocol::{AddrChannel, Kind, ReadDataChannel, Request, WriteDataChannel};
use crate::bus::slave::{AddrAccept, ReadServe, SlaveHandle, SlaveState, WriteServe};
use crate::common::{AddressMap, SimError};
use crate::config::Config;
use crate::mem::ddr::{CommandQueue, DdrCommandFeed, DdrService};
use crate::mem::{BackingStore, MemChannel};
use crate::sim::process::{ns, SimTime};
use crate::sim::{Kernel, Tracer};
use crate::stats::{SimStats, StatsHandle};

/// The wired-up simulation: master, slave, memory model, and kernel.
pub struct System {
    kernel: Kernel,
    master: MasterHandle,
    slave: SlaveHandle,
    stats: StatsHandle,
    run_duration: SimTime,
}

impl System {
    /// Builds and wires all components according to the configuration.
    pub fn new(config: &Config) -> Self {
        let mut kernel = Kernel::new(
            config.clock.period_ns,
            config.clock.duty_cycle,
            config.clock.start_delay_ns,
        );
        let map = AddressMap::new(
            config.memory.bank_bits,
            config.memory.row_bits,
            config.memory.col_bits,
        );

        let ar = AddrChannel::new(&mut kernel, "ar");
        let r = ReadDataChannel::new(&mut kernel);
        let aw = AddrChannel::new(&mut kernel, "aw");
        let w = WriteDataChannel::new(&mut kernel);
        let mem = MemChannel::new(&mut kernel);

        let master: MasterHandle = Rc::new(RefCell::new(MasterState::new()));
        let slave: SlaveHandle = Rc::new(RefCell::new(SlaveState::new()));
        let stats: StatsHandle = Rc::new(RefCell::new(SimStats::default()));
        let queue: CommandQueue = Rc::new(RefCell::new(VecDeque::new()));

        let bounds = BurstBounds {
            size_exp: config.traffic.size_exp,
            len_min: config.traffic.len_min,
            len_max: config.traffic.len_max,
        };
        let seed = config.general.seed;

        if config.traffic.request_interval_ns > 0.0 {
            kernel.add_process(Box::new(TrafficGenerator::new(
                master.clone(),
                stats.clone(),
                Pcg32::new(seed, 0),
                ns(config.traffic.request_interval_ns),
                map,
                bounds.len_max as u32 + 1,
            )));
        }
        kernel.add_process(Box::new(AddrIssue::new(
            Kind::Read,
            master.clone(),
            stats.clone(),
            ar.clone(),
            Pcg32::new(seed, 1),
            bounds,
        )));
        kernel.add_process(Box::new(ReadSink::new(
            master.clone(),
            stats.clone(),
            r.clone(),
        )));
        kernel.add_process(Box::new(AddrIssue::new(
            Kind::Write,
            master.clone(),
            stats.clone(),
            aw.clone(),
            Pcg32::new(seed, 2),
            bounds,
        )));
        kernel.add_process(Box::new(WriteSource::new(
            master.clone(),
            stats.clone(),
            w.clone(),
            Pcg32::new(seed, 3),
        )));

        kernel.add_process(Box::new(AddrAccept::new(Kind::Read, slave.clone(), ar)));
        kernel.add_process(Box::new(AddrAccept::new(Kind::Write, slave.clone(), aw)));
        kernel.add_process(Box::new(ReadServe::new(slave.clone(), r, mem.clone())));
        kernel.add_process(Box::new(WriteServe::new(
            slave.clone(),
            stats.clone(),
            w,
            mem.clone(),
        )));

        kernel.add_process(Box::new(DdrCommandFeed::new(mem.clone(), queue.clone())));
        kernel.add_process(Box::new(DdrService::new(
            mem,
            queue,
            BackingStore::new(map),
            ns(config.memory.row_switch_ns),
            stats.clone(),
        )));

        Self {
            kernel,
            master,
            slave,
            stats,
            run_duration: ns(config.general.run_duration_ns),
        }
    }

    /// Installs a signal-transition observer.
    pub fn set_tracer(&mut self, tracer: Box<dyn Tracer>) {
        self.kernel.set_tracer(tracer);
    }

    /// Appends a request to the master's pending queue directly, bypassing
    /// the traffic generator. Used by tests and scripted drivers.
    pub fn enqueue(&mut self, kind: Kind, addr: u32) {
        self.master.borrow_mut().pending.push_back(Request { kind, addr });
        self.stats.borrow_mut().requests_generated += 1;
    }

    /// Runs until the configured run duration.
    pub fn run(&mut self) -> Result<(), SimError> {
        self.kernel.run_until(self.run_duration)
    }

    /// Runs until the given simulated time in nanoseconds. May be called
    /// repeatedly with increasing horizons.
    pub fn run_until_ns(&mut self, t_ns: f64) -> Result<(), SimError> {
        self.kernel.run_until(ns(t_ns))
    }

    /// Current simulated time in picoseconds.
    pub fn now_ps(&self) -> SimTime {
        self.kernel.now()
    }

    /// Snapshot of the aggregate counters.
    pub fn stats(&self) -> SimStats {
        self.stats.borrow().clone()
    }

    /// Entries currently in the master's read outstanding table.
    pub fn outstanding_reads(&self) -> usize {
        self.master.borrow().read_outstanding.len()
    }

    /// Entries currently in the master's write outstanding table.
    pub fn outstanding_writes(&self) -> usize {
        self.master.borrow().write_outstanding.len()
    }

    /// Requests still waiting for admission.
    pub fn pending_requests(&self) -> usize {
        self.master.borrow().pending.len()
    }

    /// Requests registered at the slave but not yet fully serviced.
    pub fn slave_backlog(&self) -> usize {
        let slave = self.slave.borrow();
        slave.read_fifo.len() + slave.write_fifo.len()
    }
}
