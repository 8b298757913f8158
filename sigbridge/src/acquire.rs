//! Acquisition loop: pull ticks, aggregate, encode, hand off to the wire

#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

use sigtools::frame::Aggregator;
use sigtools::{ser, Error};

use crate::source::SampleSource;
use crate::TriggerClock;

/// Run the acquisition loop until the source or the wire gives out.
///
/// Every pulled tick feeds the aggregator; each completed frame is
/// encoded and queued for the wire. With `control` set the frame
/// carries the clock's current timestamp, read at encode time, so a
/// trigger fired while the frame was filling shows up in that same
/// frame. Without `control` no timestamp field is emitted at all.
pub fn run(
    mut source: impl SampleSource,
    mut agg: Aggregator,
    clock: TriggerClock,
    control: bool,
    frames: flume::Sender<Vec<u8>>,
) -> Result<(), Error> {
    info!("acquisition started: {} channels", source.channels());
    loop {
        let tick = source.pull()?;
        if let Some(frame) = agg.push(tick)? {
            let trigger_ms = match control {
                true => Some(clock.last()),
                false => None,
            };
            let msg = ser::frame(&frame, trigger_ms)?;
            frames
                .send(msg)
                .map_err(|_| Error::Transport("wire loop gone".into()))?;
        }
    }
}
