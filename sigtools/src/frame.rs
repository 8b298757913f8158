//! Aggregation of per-tick sample vectors into fixed-size frames

use crate::Error;

/// A completed batch of consecutive ticks, tick-major: `ticks[j][c]`
/// holds channel `c` at tick `j` of the frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub ticks: Vec<Vec<f32>>,
}

impl Frame {
    /// Width of every tick in the frame
    pub fn channels(&self) -> usize {
        self.ticks.first().map_or(0, Vec::len)
    }

    /// Number of ticks in the frame
    pub fn depth(&self) -> usize {
        self.ticks.len()
    }
}

/// Buffers sample vectors until exactly `depth` have arrived, then hands
/// the batch off as a [`Frame`] and starts over. Frames never overlap and
/// a partial batch never leaves the aggregator.
pub struct Aggregator {
    channels: usize,
    depth: usize,
    ticks: Vec<Vec<f32>>,
}

impl Aggregator {
    pub fn new(channels: usize, depth: usize) -> Aggregator {
        assert!(depth > 0, "frame depth must be nonzero");
        Aggregator {
            channels,
            depth,
            ticks: Vec::with_capacity(depth),
        }
    }

    /// Append one tick. Returns the completed frame on the tick that
    /// fills the buffer, `None` otherwise. A vector whose width differs
    /// from the channel count is a fatal configuration error.
    pub fn push(&mut self, tick: Vec<f32>) -> Result<Option<Frame>, Error> {
        if tick.len() != self.channels {
            return Err(Error::Config(format!(
                "sample vector has {} values, expected {}",
                tick.len(),
                self.channels,
            )));
        }
        self.ticks.push(tick);
        if self.ticks.len() < self.depth {
            return Ok(None);
        }
        let ticks = std::mem::replace(&mut self.ticks, Vec::with_capacity(self.depth));
        Ok(Some(Frame { ticks }))
    }
}

/// Reorganize tick-major rows into channel-major columns, preserving
/// temporal order within each channel and channel order across them.
/// On the rectangular frames the aggregator produces, applying it twice
/// restores the original layout. A short row simply contributes nothing
/// to the trailing columns.
pub fn transpose(rows: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut cols: Vec<Vec<f32>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();
    for row in rows {
        for (c, &v) in row.iter().enumerate() {
            cols[c].push(v);
        }
    }
    cols
}
