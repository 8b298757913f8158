//! Control dispatcher: decode trigger requests and pulse the serial box

use std::io::Write;
use std::time::Duration;

#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

use sigtools::{cfg, de, Error};

use crate::TriggerClock;

/// Settle time between the writes of one pulse, unless configured
pub const SETTLE_DEFAULT: Duration = Duration::from_millis(10);

// line levels understood by the trigger box
const PULSE_ASSERT: u8 = 0x01;
const PULSE_DEASSERT: u8 = 0x00;

const PORT_TIMEOUT: Duration = Duration::from_millis(100);

/// Open the configured serial port for driving pulses
pub fn open_port(trigger: &cfg::Trigger) -> Result<Box<dyn serialport::SerialPort>, Error> {
    let port = serialport::new(trigger.port.as_str(), trigger.baud)
        .timeout(PORT_TIMEOUT)
        .open()
        .map_err(|e| Error::Hardware(e.into()))?;
    Ok(port)
}

/// Serves control payloads until the channel closes. Generic over the
/// port so tests can stand in any writer for the hardware.
pub struct Dispatcher<P: Write + Send> {
    port: P,
    clock: TriggerClock,
    settle: Duration,
}

impl<P: Write + Send> Dispatcher<P> {
    pub fn new(port: P, clock: TriggerClock, settle: Duration) -> Dispatcher<P> {
        Dispatcher {
            port,
            clock,
            settle,
        }
    }

    /// Decode and execute trigger requests one at a time, in arrival
    /// order. A payload that does not decode is logged and dropped, and
    /// the loop keeps serving; a hardware fault is fatal. Returns `Ok`
    /// only when the control channel closes.
    pub fn run(mut self, control: flume::Receiver<Vec<u8>>) -> Result<(), Error> {
        info!("control dispatcher started");
        while let Ok(payload) = control.recv() {
            let cmd = match de::command(&payload) {
                Ok(cmd) => cmd,
                Err(e) => {
                    warn!("dropping control payload: {}", e);
                    continue;
                }
            };
            self.pulse(cmd.trigger_channel)?;
        }
        Ok(())
    }

    /// One full pulse: select the channel, stamp the shared clock, then
    /// assert and deassert the line. The clock is stamped right after
    /// the channel-select write, so the reported time marks when the
    /// hardware was told to fire rather than when the pulse finished.
    fn pulse(&mut self, channel: u8) -> Result<(), Error> {
        self.write_byte(channel)?;
        self.clock.mark(chrono::Utc::now().timestamp_millis());
        std::thread::sleep(self.settle);
        self.write_byte(PULSE_ASSERT)?;
        std::thread::sleep(self.settle);
        self.write_byte(PULSE_DEASSERT)?;
        std::thread::sleep(self.settle);
        debug!("pulsed channel {}", channel);
        Ok(())
    }

    fn write_byte(&mut self, byte: u8) -> Result<(), Error> {
        self.port
            .write_all(&[byte])
            .and_then(|_| self.port.flush())
            .map_err(Error::Hardware)
    }
}
