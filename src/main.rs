//! Bus System Simulator CLI.
//!
//! The main executable for the simulator. It loads the TOML configuration,
//! wires the master, slave, and memory model together, runs the simulation
//! for the configured duration, and prints the aggregate statistics.

use clap::Parser;
use std::{fs, process};

extern crate axi_simulator;

use axi_simulator::config::Config;
use axi_simulator::sim::JsonTracer;
use axi_simulator::system::System;

/// Command-line arguments for the bus system simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "AXI-Style Bus System Simulator")]
struct Args {
    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,

    /// Write every signal transition to this file as JSON lines.
    #[arg(long)]
    trace: Option<String>,

    /// Override the configured run duration (nanoseconds).
    #[arg(long)]
    duration_ns: Option<f64>,
}

/// Main entry point for the bus system simulator.
///
/// # Behavior
///
/// 1. **Configuration**: parses command-line arguments and loads the TOML
///    configuration file.
/// 2. **Initialization**: constructs the `System` (kernel, channels,
///    master, slave, memory model) and optionally attaches a trace file.
/// 3. **Simulation**: runs for the configured duration. A fatal protocol
///    or memory violation stops the run immediately.
/// 4. **Teardown**: prints simulation statistics and exits nonzero on a
///    fatal error.
fn main() {
    env_logger::init();

    let args = Args::parse();
    let config_content = fs::read_to_string(&args.config).expect("Failed to read config");
    let mut config: Config = toml::from_str(&config_content).expect("Failed to parse config");
    if let Some(duration) = args.duration_ns {
        config.general.run_duration_ns = duration;
    }

    println!("Global Configuration");
    println!("--------------------");
    println!("General:");
    println!("  Run Duration:       {} ns", config.general.run_duration_ns);
    println!("  Seed:               {}", config.general.seed);
    println!("Clock:");
    println!("  Period:             {} ns", config.clock.period_ns);
    println!("  Duty Cycle:         {}", config.clock.duty_cycle);
    println!("  Start Delay:        {} ns", config.clock.start_delay_ns);
    println!("Traffic:");
    println!(
        "  Request Interval:   {} ns",
        config.traffic.request_interval_ns
    );
    println!(
        "  Beat Size:          {} B",
        1u64 << config.traffic.size_exp
    );
    println!(
        "  Burst Length:       {}..={} beats",
        config.traffic.len_min as u32 + 1,
        config.traffic.len_max as u32 + 1
    );
    println!("Memory:");
    println!("  Row Switch:         {} ns", config.memory.row_switch_ns);
    println!(
        "  Geometry:           {}/{}/{} bits (bank/row/col)",
        config.memory.bank_bits, config.memory.row_bits, config.memory.col_bits
    );
    println!("--------------------");

    let mut system = System::new(&config);

    if let Some(path) = &args.trace {
        let file = fs::File::create(path).expect("Failed to create trace file");
        system.set_tracer(Box::new(JsonTracer::new(std::io::BufWriter::new(file))));
        println!("[*] Tracing signal transitions to {path}");
    }

    if let Err(e) = system.run() {
        eprintln!("\n[!] FATAL: {e}");
        system.stats().print(config.general.run_duration_ns);
        process::exit(1);
    }

    system.stats().print(config.general.run_duration_ns);
}
