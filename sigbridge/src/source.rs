//! Sample sources: the upstream end of the bridge

use std::time::{Duration, Instant};

use sigtools::Error;

/// Upstream producer of per-tick sample vectors.
///
/// `pull` blocks until the next tick is available, so the source paces
/// the acquisition loop. A source that can no longer produce returns
/// [`Error::Upstream`], which tears the bridge down.
pub trait SampleSource: Send {
    /// Channel count of every vector this source yields
    fn channels(&self) -> usize;
    /// Block until the next sample vector is ready
    fn pull(&mut self) -> Result<Vec<f32>, Error>;
    /// Self-description forwarded verbatim in the registration descriptor
    fn info(&self) -> String;
}

/// Synthetic source for setups without hardware: channel `c` carries a
/// unit sine at `c + 1` Hz, sampled at a fixed rate.
pub struct SimSource {
    channels: usize,
    period: Duration,
    tick: u64,
    last_tick: Instant,
}

impl SimSource {
    pub fn new(channels: usize, rate: u64) -> SimSource {
        assert!(rate > 0, "sample rate must be nonzero");
        SimSource {
            channels,
            period: Duration::from_nanos(1_000_000_000 / rate),
            tick: 0,
            last_tick: Instant::now(),
        }
    }
}

impl SampleSource for SimSource {
    fn channels(&self) -> usize {
        self.channels
    }

    fn pull(&mut self) -> Result<Vec<f32>, Error> {
        // Sleep for the rest of the sample period
        let timeout = self
            .period
            .checked_sub(self.last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        std::thread::sleep(timeout);
        self.last_tick = Instant::now();

        let t = self.tick as f32 * self.period.as_secs_f32();
        self.tick += 1;
        let sample = (0..self.channels)
            .map(|c| (2.0 * std::f32::consts::PI * (c + 1) as f32 * t).sin())
            .collect();
        Ok(sample)
    }

    fn info(&self) -> String {
        format!(
            "<info><name>sim</name><channel_count>{}</channel_count><nominal_srate>{}</nominal_srate></info>",
            self.channels,
            1.0 / self.period.as_secs_f64(),
        )
    }
}
