use serde::Deserialize;

const DEFAULT_RUN_DURATION_NS: f64 = 500_000.0;
const DEFAULT_SEED: u64 = 1;

const DEFAULT_PERIOD_NS: f64 = 5.0;
const DEFAULT_DUTY_CYCLE: f64 = 0.5;
const DEFAULT_START_DELAY_NS: f64 = 5.0;

const DEFAULT_REQUEST_INTERVAL_NS: f64 = 2.0;
const DEFAULT_SIZE_EXP: u8 = 7;
const DEFAULT_LEN_MAX: u8 = 4;

const DEFAULT_ROW_SWITCH_NS: f64 = 50.0;
const DEFAULT_BANK_BITS: u32 = 2;
const DEFAULT_ROW_BITS: u32 = 15;
const DEFAULT_COL_BITS: u32 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub traffic: TrafficConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            clock: ClockConfig::default(),
            traffic: TrafficConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Simulated run duration in nanoseconds.
    #[serde(default = "default_run_duration")]
    pub run_duration_ns: f64,

    /// Seed for the traffic and burst-parameter generators.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            run_duration_ns: DEFAULT_RUN_DURATION_NS,
            seed: DEFAULT_SEED,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_period")]
    pub period_ns: f64,

    #[serde(default = "default_duty_cycle")]
    pub duty_cycle: f64,

    #[serde(default = "default_start_delay")]
    pub start_delay_ns: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            period_ns: DEFAULT_PERIOD_NS,
            duty_cycle: DEFAULT_DUTY_CYCLE,
            start_delay_ns: DEFAULT_START_DELAY_NS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrafficConfig {
    /// Interval between generated requests; zero disables the generator.
    #[serde(default = "default_request_interval")]
    pub request_interval_ns: f64,

    /// Beat-size exponent (log2 of bytes per beat) for every burst.
    #[serde(default = "default_size_exp")]
    pub size_exp: u8,

    /// Inclusive bounds for the randomly chosen burst length minus one.
    #[serde(default)]
    pub len_min: u8,

    #[serde(default = "default_len_max")]
    pub len_max: u8,
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            request_interval_ns: DEFAULT_REQUEST_INTERVAL_NS,
            size_exp: DEFAULT_SIZE_EXP,
            len_min: 0,
            len_max: DEFAULT_LEN_MAX,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemoryConfig {
    /// Row-buffer miss penalty in nanoseconds.
    #[serde(default = "default_row_switch")]
    pub row_switch_ns: f64,

    #[serde(default = "default_bank_bits")]
    pub bank_bits: u32,

    #[serde(default = "default_row_bits")]
    pub row_bits: u32,

    #[serde(default = "default_col_bits")]
    pub col_bits: u32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            row_switch_ns: DEFAULT_ROW_SWITCH_NS,
            bank_bits: DEFAULT_BANK_BITS,
            row_bits: DEFAULT_ROW_BITS,
            col_bits: DEFAULT_COL_BITS,
        }
    }
}

fn default_run_duration() -> f64 {
    DEFAULT_RUN_DURATION_NS
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_period() -> f64 {
    DEFAULT_PERIOD_NS
}

fn default_duty_cycle() -> f64 {
    DEFAULT_DUTY_CYCLE
}

fn default_start_delay() -> f64 {
    DEFAULT_START_DELAY_NS
}

fn default_request_interval() -> f64 {
    DEFAULT_REQUEST_INTERVAL_NS
}

fn default_size_exp() -> u8 {
    DEFAULT_SIZE_EXP
}

fn default_len_max() -> u8 {
    DEFAULT_LEN_MAX
}

fn default_row_switch() -> f64 {
    DEFAULT_ROW_SWITCH_NS
}

fn default_bank_bits() -> u32 {
    DEFAULT_BANK_BITS
}

fn default_row_bits() -> u32 {
    DEFAULT_ROW_BITS
}

fn default_col_bits() -> u32 {
    DEFAULT_COL_BITS
}
