use argh::FromArgs;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use sigtools::TRIGGER_NEVER;

#[derive(Debug, FromArgs, Clone)]
/// sample stream bridge args
pub struct CliArgs {
    /// print version information
    #[argh(switch, short = 'v')]
    pub version: bool,
    /// config file path
    #[argh(option, short = 'c')]
    pub config: Option<String>,
    /// simulated channel count
    #[argh(option, default = "8")]
    pub channels: usize,
    /// simulated sample rate in Hz
    #[argh(option, default = "250")]
    pub rate: u64,
}

/// Millisecond timestamp of the last trigger pulse, shared between the
/// acquisition loop and the control dispatcher. Reads and writes cross
/// thread boundaries, so the value lives in an atomic; it starts at the
/// [`TRIGGER_NEVER`] sentinel and only ever moves forward from there.
#[derive(Clone, Debug)]
pub struct TriggerClock(Arc<AtomicI64>);

impl TriggerClock {
    pub fn new() -> TriggerClock {
        TriggerClock(Arc::new(AtomicI64::new(TRIGGER_NEVER)))
    }

    /// Record a trigger at `ms` since the epoch
    pub fn mark(&self, ms: i64) {
        self.0.store(ms, Ordering::Release);
    }

    /// Most recent trigger time, or the sentinel if none has fired
    pub fn last(&self) -> i64 {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for TriggerClock {
    fn default() -> Self {
        TriggerClock::new()
    }
}

pub mod acquire;
pub mod client;
pub mod dispatch;
pub mod source;
