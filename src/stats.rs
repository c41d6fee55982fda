//! Simulation statistics collection and reporting.
//!
//! Tracks traffic, transaction, byte, and row-buffer counters during a run
//! and prints a formatted summary with derived throughput.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Aggregate counters updated by the master, slave, and memory model.
#[derive(Clone)]
pub struct SimStats {
    start_time: Instant,
    pub requests_generated: u64,
    pub reads_issued: u64,
    pub writes_issued: u64,
    pub reads_completed: u64,
    pub writes_completed: u64,
    pub bytes_received: u64,
    pub bytes_written: u64,
    pub row_hits: u64,
    pub row_misses: u64,
}

/// Shared handle to the statistics counters.
pub type StatsHandle = Rc<RefCell<SimStats>>;

impl Default for SimStats {
    /// Returns the default value.
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            requests_generated: 0,
            reads_issued: 0,
            writes_issued: 0,
            reads_completed: 0,
            writes_completed: 0,
            bytes_received: 0,
            bytes_written: 0,
            row_hits: 0,
            row_misses: 0,
        }
    }
}

impl SimStats {
    /// Prints a formatted summary of the run.
    ///
    /// `sim_ns` is the simulated duration used for throughput derivation.
    pub fn print(&self, sim_ns: f64) {
        let duration = self.start_time.elapsed();
        let seconds = duration.as_secs_f64();
        let sim_s = sim_ns * 1e-9;
        let throughput = |bytes: u64| {
            if sim_s > 0.0 {
                bytes as f64 / sim_s
            } else {
                0.0
            }
        };

        println!("\n==========================================================");
        println!("BUS SYSTEM SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_time                 {} ns", sim_ns);
        println!("requests_generated       {}", self.requests_generated);
        println!("----------------------------------------------------------");
        println!("READ CHANNEL");
        println!("  reads.issued           {}", self.reads_issued);
        println!("  reads.completed        {}", self.reads_completed);
        println!("  bytes.received         {}", self.bytes_received);
        println!(
            "  throughput             {:.3} GB/s",
            throughput(self.bytes_received) / 1e9
        );
        println!("----------------------------------------------------------");
        println!("WRITE CHANNEL");
        println!("  writes.issued          {}", self.writes_issued);
        println!("  writes.completed       {}", self.writes_completed);
        println!("  bytes.written          {}", self.bytes_written);
        println!(
            "  throughput             {:.3} GB/s",
            throughput(self.bytes_written) / 1e9
        );
        println!("----------------------------------------------------------");
        println!("MEMORY");
        let accesses = self.row_hits + self.row_misses;
        let hit_rate = if accesses > 0 {
            (self.row_hits as f64 / accesses as f64) * 100.0
        } else {
            0.0
        };
        println!("  row.hits               {}", self.row_hits);
        println!("  row.misses             {}", self.row_misses);
        println!("  row.hit_rate           {:.2}%", hit_rate);
        println!("==========================================================");
    }
}
