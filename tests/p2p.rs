#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    io::Read,
    net::{SocketAddr, TcpStream},
    sync::{Arc, mpsc},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use rustyshare::{
    cancellation::Cancellation,
    channel::{Sender, TrySendError, channel},
    log::NoopLogSink,
    tcp::P2PSender,
    transport::UnitSender,
    unit::Unit,
};

const SETTLE: Duration = Duration::from_millis(300);
const TICK_WAIT: Duration = Duration::from_millis(20);

fn start() -> (SocketAddr, Sender<Unit>, JoinHandle<()>) {
    start_with_capacity(16)
}

fn start_with_capacity(capacity: usize) -> (SocketAddr, Sender<Unit>, JoinHandle<()>) {
    let mut sender = P2PSender::bind(
        "127.0.0.1:0".parse().unwrap(),
        Arc::new(NoopLogSink),
        Cancellation::new(),
    )
    .unwrap();
    let addr = sender.local_addr();
    let (tx, rx) = channel(capacity);
    let handle = thread::spawn(move || sender.run(rx).unwrap());
    (addr, tx, handle)
}

fn frame(nal_type: u8, tag: u8) -> Vec<u8> {
    vec![0, 0, 1, nal_type, tag]
}

/// Reads length-prefixed frames until the broadcaster hangs up.
fn read_all(mut stream: TcpStream) -> Vec<Vec<u8>> {
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut frames = Vec::new();
    loop {
        let mut len = [0u8; 4];
        if stream.read_exact(&mut len).is_err() {
            return frames;
        }
        let mut body = vec![0u8; u32::from_le_bytes(len) as usize];
        stream.read_exact(&mut body).unwrap();
        frames.push(body);
    }
}

#[test]
fn test_viewer_starts_at_an_idr() {
    let (addr, tx, handle) = start();
    let viewer = TcpStream::connect(addr).unwrap();
    thread::sleep(SETTLE);

    tx.send(Unit::from_annexb(frame(0x41, 1), 0)).unwrap();
    tx.send(Unit::from_annexb(frame(0x65, 2), 3000)).unwrap();
    tx.send(Unit::from_annexb(frame(0x41, 3), 6000)).unwrap();
    thread::sleep(SETTLE);
    drop(tx);
    handle.join().unwrap();

    let frames = read_all(viewer);
    assert_eq!(frames, vec![frame(0x65, 2), frame(0x41, 3)]);
}

#[test]
fn test_units_fan_out_to_every_viewer() {
    let (addr, tx, handle) = start();
    let first = TcpStream::connect(addr).unwrap();
    let second = TcpStream::connect(addr).unwrap();
    thread::sleep(SETTLE);

    let sent = [frame(0x65, 7), frame(0x41, 8), frame(0x41, 9)];
    for (i, data) in sent.iter().enumerate() {
        tx.send(Unit::from_annexb(data.clone(), i as u64 * 3000)).unwrap();
    }
    thread::sleep(SETTLE);
    drop(tx);
    handle.join().unwrap();

    let readers = [first, second].map(|s| thread::spawn(move || read_all(s)));
    for reader in readers {
        assert_eq!(reader.join().unwrap(), sent.to_vec());
    }
}

#[test]
fn test_viewer_leaving_does_not_stop_the_broadcast() {
    let (addr, tx, handle) = start();
    let leaving = TcpStream::connect(addr).unwrap();
    let staying = TcpStream::connect(addr).unwrap();
    thread::sleep(SETTLE);
    drop(leaving);

    for tag in 0..5 {
        tx.send(Unit::from_annexb(frame(0x65, tag), 0)).unwrap();
        thread::sleep(Duration::from_millis(20));
    }
    thread::sleep(SETTLE);
    drop(tx);
    handle.join().unwrap();

    let frames = read_all(staying);
    assert_eq!(frames.len(), 5);
    assert_eq!(frames[4], frame(0x65, 4));
}

/// Joins the broadcaster, failing instead of hanging.
fn join_within(handle: JoinHandle<()>, limit: Duration) {
    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        handle.join().unwrap();
        let _ = done_tx.send(());
    });
    done_rx.recv_timeout(limit).expect("broadcaster did not stop");
}

#[test]
fn test_stalled_viewer_blocks_ingestion_until_it_leaves() {
    let (addr, tx, handle) = start_with_capacity(4);
    let stalled = TcpStream::connect(addr).unwrap();
    thread::sleep(SETTLE);

    let mut data = vec![0, 0, 1, 0x65];
    data.resize(256 * 1024, 0x55);
    let unit = Unit::from_annexb(data, 0);

    // socket buffers absorb some units, then the viewer's queue fills up
    let deadline = Instant::now() + Duration::from_secs(30);
    let mut full_for = 0;
    while full_for < 10 {
        assert!(Instant::now() < deadline, "ingestion never stalled");
        match tx.try_send(unit.clone()) {
            Ok(()) => full_for = 0,
            Err(TrySendError::Full(_)) => {
                full_for += 1;
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => panic!("broadcaster gone: {e:?}"),
        }
    }

    drop(stalled);
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        assert!(Instant::now() < deadline, "ingestion never resumed");
        match tx.try_send(unit.clone()) {
            Ok(()) => break,
            Err(TrySendError::Full(_)) => thread::sleep(TICK_WAIT),
            Err(e) => panic!("broadcaster gone: {e:?}"),
        }
    }

    drop(tx);
    join_within(handle, Duration::from_secs(5));
}

#[test]
fn test_shutdown_while_viewers_keep_arriving() {
    let (addr, tx, handle) = start();
    let connector = thread::spawn(move || {
        let mut viewers = Vec::new();
        for _ in 0..40 {
            match TcpStream::connect(addr) {
                Ok(s) => viewers.push(s),
                Err(_) => break,
            }
            thread::sleep(Duration::from_millis(5));
        }
        viewers
    });

    tx.send(Unit::from_annexb(frame(0x65, 1), 0)).unwrap();
    thread::sleep(Duration::from_millis(50));
    drop(tx);
    join_within(handle, Duration::from_secs(5));
    drop(connector.join().unwrap());
}
