use anyhow::{bail, Result};
use std::net::ToSocketAddrs;
use std::path::Path;
use std::time::Duration;

use sigbridge::client::ClientHandle;
use sigbridge::dispatch::{self, Dispatcher};
use sigbridge::source::{SampleSource, SimSource};
use sigbridge::{acquire, CliArgs, TriggerClock};
use sigtools::frame::Aggregator;
use sigtools::{cfg, ser};

#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

const GIT_VERSION: &str = git_version::git_version!(fallback = "unknown");

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args: CliArgs = argh::from_env();

    if args.version {
        println!(
            concat!(
                env!("CARGO_BIN_NAME"),
                " ",
                "{}",
            ),
            GIT_VERSION,
        );
        return Ok(())
    }

    tracing_subscriber::fmt::init();

    // Load the bridge config and descriptor template
    let bridge = match &args.config {
        Some(c) => cfg::load(Path::new(c))?,
        None => bail!("no config file provided"),
    };
    let template = cfg::load_template(bridge.descriptor.as_path())?;

    let addr = match bridge.addr.to_socket_addrs()?.next() {
        Some(a) => a,
        None => bail!("could not parse address {}", bridge.addr),
    };

    // Simulated upstream; a hardware inlet slots in behind the same trait
    let source = SimSource::new(args.channels, args.rate);
    let info = source.info();
    info!("upstream: {}", info);
    let control_enabled = bridge.trigger.is_some();
    let descriptor = ser::descriptor(&template, source.channels(), &info, control_enabled)?;

    // Fatal faults from any loop land here
    let (tx_fault, rx_fault) = flume::bounded(1);

    // Connect and register, then start the wire loops
    let client = ClientHandle::connect(addr, descriptor, tx_fault.clone())?;
    let ClientHandle {
        frames,
        control,
        join_handle: _,
    } = client;

    let clock = TriggerClock::new();

    // Control dispatcher only runs with trigger hardware attached
    match bridge.trigger {
        Some(trig) => {
            let port = dispatch::open_port(&trig)?;
            let dispatcher = Dispatcher::new(
                port,
                clock.clone(),
                Duration::from_millis(trig.settle_ms),
            );
            let tx_fault_2 = tx_fault.clone();
            std::thread::spawn(move || {
                match dispatcher.run(control) {
                    Ok(()) => info!("control channel closed"),
                    Err(e) => {
                        let _ = tx_fault_2.send(e);
                    }
                }
            });
        }
        None => {
            // inbound payloads get dropped at the wire instead
            drop(control);
        }
    }

    // Acquisition thread
    let agg = Aggregator::new(source.channels(), bridge.subframes);
    let clock_2 = clock.clone();
    let tx_fault_3 = tx_fault.clone();
    std::thread::spawn(move || {
        match acquire::run(source, agg, clock_2, control_enabled, frames) {
            Ok(()) => {}
            Err(e) => {
                let _ = tx_fault_3.send(e);
            }
        }
    });
    drop(tx_fault);

    tokio::select! {
        fault = rx_fault.recv_async() => match fault {
            Ok(e) => {
                error!("fatal: {}", e);
                return Err(e.into());
            }
            // all loops ended without a fault
            Err(_) => {}
        },
        ctrl_c_signal = tokio::signal::ctrl_c() => match ctrl_c_signal {
            Ok(()) => info!("Manual shutdown signal received. Goodbye!"),
            Err(e) => error!("Unable to listen to shutdown signal: {}", e),
        },
    }

    Ok(())
}
