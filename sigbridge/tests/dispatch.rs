use parking_lot::Mutex;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sigbridge::dispatch::{Dispatcher, SETTLE_DEFAULT};
use sigbridge::TriggerClock;
use sigtools::{Error, TRIGGER_NEVER};

/// Captures every byte with its arrival time
#[derive(Clone)]
struct RecordingPort {
    writes: Arc<Mutex<Vec<(Instant, u8)>>>,
}

impl RecordingPort {
    fn new() -> RecordingPort {
        RecordingPort {
            writes: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Write for RecordingPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let now = Instant::now();
        let mut writes = self.writes.lock();
        for &b in buf {
            writes.push((now, b));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct FailingPort;

impl Write for FailingPort {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "wire cut"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn drives_the_full_pulse_sequence() {
    let port = RecordingPort::new();
    let writes = port.writes.clone();
    let clock = TriggerClock::new();
    let dispatcher = Dispatcher::new(port, clock.clone(), Duration::from_millis(5));

    let (tx, rx) = flume::unbounded();
    tx.send(br#"{"trigger_channel": 4}"#.to_vec()).unwrap();
    tx.send(br#"{"trigger_channel": 9}"#.to_vec()).unwrap();
    drop(tx);

    dispatcher.run(rx).unwrap();

    let writes = writes.lock();
    let bytes: Vec<u8> = writes.iter().map(|&(_, b)| b).collect();
    assert_eq!(vec![4, 1, 0, 9, 1, 0], bytes);

    // the settle time elapses between any two consecutive writes
    for pair in writes.windows(2) {
        let gap = pair[1].0.duration_since(pair[0].0);
        assert!(gap >= Duration::from_millis(5), "gap was {:?}", gap);
    }

    assert_ne!(TRIGGER_NEVER, clock.last());
}

#[test]
fn drops_malformed_payloads_and_keeps_serving() {
    let port = RecordingPort::new();
    let writes = port.writes.clone();
    let clock = TriggerClock::new();
    let dispatcher = Dispatcher::new(port, clock, Duration::from_millis(1));

    let (tx, rx) = flume::unbounded();
    tx.send(b"not json at all".to_vec()).unwrap();
    tx.send(br#"{"wrong_field": 2}"#.to_vec()).unwrap();
    tx.send(br#"{"trigger_channel": 2}"#.to_vec()).unwrap();
    drop(tx);

    dispatcher.run(rx).unwrap();

    let bytes: Vec<u8> = writes.lock().iter().map(|&(_, b)| b).collect();
    assert_eq!(vec![2, 1, 0], bytes);
}

#[test]
fn malformed_payloads_leave_the_clock_alone() {
    let clock = TriggerClock::new();
    let dispatcher = Dispatcher::new(
        RecordingPort::new(),
        clock.clone(),
        Duration::from_millis(1),
    );

    let (tx, rx) = flume::unbounded();
    tx.send(b"{}".to_vec()).unwrap();
    drop(tx);

    dispatcher.run(rx).unwrap();
    assert_eq!(TRIGGER_NEVER, clock.last());
}

#[test]
fn stamps_wall_clock_time_of_the_pulse() {
    let clock = TriggerClock::new();
    let dispatcher = Dispatcher::new(
        RecordingPort::new(),
        clock.clone(),
        Duration::from_millis(1),
    );

    let (tx, rx) = flume::unbounded();
    tx.send(br#"{"trigger_channel": 1}"#.to_vec()).unwrap();
    drop(tx);

    let before = chrono::Utc::now().timestamp_millis();
    dispatcher.run(rx).unwrap();
    let after = chrono::Utc::now().timestamp_millis();

    let t = clock.last();
    assert!(t >= before && t <= after, "stamp {} outside [{}, {}]", t, before, after);
}

#[test]
fn default_settle_paces_a_pulse() {
    let port = RecordingPort::new();
    let writes = port.writes.clone();
    let dispatcher = Dispatcher::new(port, TriggerClock::new(), SETTLE_DEFAULT);

    let (tx, rx) = flume::unbounded();
    tx.send(br#"{"trigger_channel": 1}"#.to_vec()).unwrap();
    drop(tx);

    let start = Instant::now();
    dispatcher.run(rx).unwrap();

    assert!(start.elapsed() >= SETTLE_DEFAULT * 3);
    assert_eq!(3, writes.lock().len());
}

#[test]
fn hardware_fault_is_fatal() {
    let dispatcher = Dispatcher::new(FailingPort, TriggerClock::new(), Duration::from_millis(1));

    let (tx, rx) = flume::unbounded();
    tx.send(br#"{"trigger_channel": 1}"#.to_vec()).unwrap();

    let err = dispatcher.run(rx).unwrap_err();
    assert!(matches!(err, Error::Hardware(_)));
}
