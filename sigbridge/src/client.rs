//! Telemetry connection: registration, outbound frames, inbound control

use std::io::Write;
use std::net::SocketAddr;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::runtime::Builder;

#[allow(unused_imports)]
use tracing::{debug, error, info, warn};

use sigtools::Error;

/// Upper bound on an inbound payload length; anything larger means a
/// corrupt length prefix
const MESSAGE_MAX: u32 = 1 << 20;

/// Handle to the wire loops. Every message in both directions is a
/// little-endian `u32` byte length followed by a JSON payload.
#[derive(Debug)]
pub struct ClientHandle {
    /// Encoded frames pushed here go out on the wire in order
    pub frames: flume::Sender<Vec<u8>>,
    /// Control payloads read off the wire land here
    pub control: flume::Receiver<Vec<u8>>,
    pub join_handle: std::thread::JoinHandle<()>,
}

impl ClientHandle {
    /// Connect, register with the descriptor, and start the wire loops
    /// on their own thread.
    ///
    /// Registration happens synchronously so a refused or broken server
    /// fails the bridge before any loop starts. Frames queue through a
    /// bounded channel: a stalled server backpressures the acquisition
    /// loop instead of growing the heap. A wire fault afterwards goes
    /// out on `faults` and the thread exits.
    pub fn connect(
        addr: SocketAddr,
        descriptor: Vec<u8>,
        faults: flume::Sender<Error>,
    ) -> Result<ClientHandle, Error> {
        let mut stream = std::net::TcpStream::connect(addr)
            .map_err(|e| Error::Transport(format!("connect {}: {}", addr, e)))?;
        stream
            .set_nodelay(true)
            .map_err(|e| Error::Transport(format!("connect {}: {}", addr, e)))?;

        stream
            .write_all(&(descriptor.len() as u32).to_le_bytes())
            .and_then(|_| stream.write_all(&descriptor))
            .and_then(|_| stream.flush())
            .map_err(|e| Error::Transport(format!("registration: {}", e)))?;
        info!("registered with {} ({} descriptor bytes)", addr, descriptor.len());

        // tokio requires the converted stream to be nonblocking
        stream
            .set_nonblocking(true)
            .map_err(|e| Error::Transport(format!("connect {}: {}", addr, e)))?;

        let (tx_frames, rx_frames) = flume::bounded(4);
        let (tx_control, rx_control) = flume::unbounded();
        let rt = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Transport(format!("io runtime: {}", e)))?;

        let join_handle = std::thread::spawn(move || {
            // runtime is started here
            if let Err(e) = rt.block_on(io_loop(stream, rx_frames, tx_control)) {
                let _ = faults.send(e);
            }
        });

        Ok(ClientHandle {
            frames: tx_frames,
            control: rx_control,
            join_handle,
        })
    }
}

async fn io_loop(
    stream: std::net::TcpStream,
    frames: flume::Receiver<Vec<u8>>,
    control: flume::Sender<Vec<u8>>,
) -> Result<(), Error> {
    let stream = tokio::net::TcpStream::from_std(stream)
        .map_err(|e| Error::Transport(format!("io loop: {}", e)))?;
    let (mut reader, mut writer) = stream.into_split();

    let outbound = async move {
        while let Ok(msg) = frames.recv_async().await {
            writer
                .write_u32_le(msg.len() as u32)
                .await
                .map_err(|e| Error::Transport(format!("send: {}", e)))?;
            writer
                .write_all(&msg)
                .await
                .map_err(|e| Error::Transport(format!("send: {}", e)))?;
        }
        // all frame senders gone: orderly shutdown
        Ok::<(), Error>(())
    };

    let inbound = async move {
        loop {
            let len = reader
                .read_u32_le()
                .await
                .map_err(|e| Error::Transport(format!("recv: {}", e)))?;
            if len > MESSAGE_MAX {
                return Err(Error::Transport(format!("oversized payload: {} bytes", len)));
            }
            let mut buf = vec![0u8; len as usize];
            reader
                .read_exact(&mut buf)
                .await
                .map_err(|e| Error::Transport(format!("recv: {}", e)))?;
            if control.send(buf).is_err() {
                // no dispatcher on this bridge
                debug!("dropping inbound control payload");
            }
        }
    };

    tokio::select! {
        r = outbound => r,
        r = inbound => r,
    }
}
