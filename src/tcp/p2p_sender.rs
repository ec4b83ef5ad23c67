//! One-to-many TCP broadcaster.
//!
//! Every accepted client gets its own writer thread and FIFO. Units are
//! wrapped once in an `Arc` and queued by reference, so the payload is never
//! copied per client. A client that falls `HIGH_WATERMARK` units behind stalls
//! ingestion for everyone until it drains back to `LOW_WATERMARK`.

use std::{
    collections::{HashMap, VecDeque},
    io::ErrorKind,
    net::{Shutdown, SocketAddr, TcpListener, TcpStream},
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use parking_lot::{Condvar, Mutex};
use socket2::{Domain, Protocol, Socket, Type};

use crate::{
    cancellation::Cancellation,
    channel::{Receiver, RecvTimeoutError},
    error::NetError,
    log::LogSink,
    sink_debug, sink_error, sink_info, sink_warn,
    transport::UnitSender,
    unit::Unit,
};

use super::{
    framing::{FrameWriter, LENGTH_PREFIX_SIZE},
    tcp_error::TcpError,
};

pub const HIGH_WATERMARK: usize = 120;
pub const LOW_WATERMARK: usize = 80;

const LISTEN_BACKLOG: i32 = 10;
const TICK: Duration = Duration::from_millis(10);

type ClientId = usize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct P2PStats {
    pub clients: usize,
    pub packets_sent: u64,
    pub bytes_sent: u64,
}

/// Per-client FIFO plus the flags guarded by the same lock.
#[derive(Debug, Default)]
struct ClientQueue {
    units: VecDeque<Arc<Unit>>,
    idr_received: bool,
    overflown: bool,
    closed: bool,
}

impl ClientQueue {
    /// Queues `unit` unless the client is still waiting for its first IDR.
    /// Returns `true` when this push made the client overflown.
    fn push(&mut self, unit: &Arc<Unit>) -> bool {
        if self.closed {
            return false;
        }
        if !self.idr_received {
            if !unit.is_idr() {
                return false;
            }
            self.idr_received = true;
        }
        self.units.push_back(Arc::clone(unit));
        if !self.overflown && self.units.len() >= HIGH_WATERMARK {
            self.overflown = true;
            return true;
        }
        false
    }

    /// Drops the unit that was just sent. Returns `true` when this cleared the
    /// overflown flag.
    fn pop(&mut self) -> bool {
        self.units.pop_front();
        if self.overflown && self.units.len() <= LOW_WATERMARK {
            self.overflown = false;
            return true;
        }
        false
    }

    /// Returns `true` if the client still held an overflow slot.
    fn close(&mut self) -> bool {
        self.closed = true;
        self.units.clear();
        std::mem::take(&mut self.overflown)
    }
}

struct Client {
    id: ClientId,
    stream: TcpStream,
    queue: Mutex<ClientQueue>,
    ready: Condvar,
}

struct Shared {
    logger: Arc<dyn LogSink>,
    running: Cancellation,
    clients: Mutex<HashMap<ClientId, Arc<Client>>>,
    overflown: AtomicUsize,
    packets_sent: AtomicU64,
    bytes_sent: AtomicU64,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Shared {
    /// Removes the client and gives back its overflow slot.
    fn drop_client(&self, client: &Client) {
        if client.queue.lock().close() {
            self.overflown.fetch_sub(1, Ordering::SeqCst);
        }
        client.ready.notify_all();
        let _ = client.stream.shutdown(Shutdown::Both);
        self.clients.lock().remove(&client.id);
    }
}

pub struct P2PSender {
    shared: Arc<Shared>,
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
}

impl P2PSender {
    /// Opens the listening socket (`SO_REUSEADDR`, backlog 10).
    pub fn bind(
        addr: SocketAddr,
        logger: Arc<dyn LogSink>,
        running: Cancellation,
    ) -> Result<Self, TcpError> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.bind(&addr.into())?;
        socket.listen(LISTEN_BACKLOG)?;
        let listener: TcpListener = socket.into();
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        sink_info!(logger, "[P2P Sender] listening on {local_addr}");

        Ok(Self {
            shared: Arc::new(Shared {
                logger,
                running,
                clients: Mutex::new(HashMap::new()),
                overflown: AtomicUsize::new(0),
                packets_sent: AtomicU64::new(0),
                bytes_sent: AtomicU64::new(0),
                workers: Mutex::new(Vec::new()),
            }),
            listener: Some(listener),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn client_count(&self) -> usize {
        self.shared.clients.lock().len()
    }

    pub fn stats(&self) -> P2PStats {
        P2PStats {
            clients: self.client_count(),
            packets_sent: self.shared.packets_sent.load(Ordering::Relaxed),
            bytes_sent: self.shared.bytes_sent.load(Ordering::Relaxed),
        }
    }

    /// Wraps the unit once and queues it for every client.
    pub fn schedule_send(&self, unit: Unit) {
        let unit = Arc::new(unit);
        let clients: Vec<Arc<Client>> = self.shared.clients.lock().values().cloned().collect();
        for client in clients {
            if client.queue.lock().push(&unit) {
                self.shared.overflown.fetch_add(1, Ordering::SeqCst);
                sink_warn!(self.shared.logger, "[P2P Sender] Client {}: packets queue overflow", client.id);
            }
            client.ready.notify_one();
        }
    }

    /// Disconnects every client.
    pub fn teardown(&self) {
        let clients: Vec<Arc<Client>> = self.shared.clients.lock().values().cloned().collect();
        for client in clients {
            self.shared.drop_client(&client);
        }
        self.shared.overflown.store(0, Ordering::SeqCst);
    }

    fn start_accepting(&mut self) -> Option<JoinHandle<()>> {
        let listener = self.listener.take()?;
        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name("p2p-acceptor".into())
            .spawn(move || accept_loop(listener, shared));
        match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                sink_error!(self.shared.logger, "[P2P Sender] failed to start acceptor: {e}");
                self.shared.running.cancel();
                None
            }
        }
    }
}

impl UnitSender for P2PSender {
    fn run(&mut self, units: Receiver<Unit>) -> Result<(), NetError> {
        let acceptor = self.start_accepting();

        while !self.shared.running.expired() {
            if self.shared.overflown.load(Ordering::SeqCst) != 0 {
                thread::sleep(TICK);
                continue;
            }
            match units.receive_timeout(TICK) {
                Ok(unit) => self.schedule_send(unit),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.shared.running.cancel();
        // no client may be added after the teardown snapshot
        if let Some(handle) = acceptor {
            let _ = handle.join();
        }
        self.teardown();
        let workers = std::mem::take(&mut *self.shared.workers.lock());
        for handle in workers {
            let _ = handle.join();
        }

        let stats = self.stats();
        sink_info!(
            self.shared.logger,
            "[P2P Sender] stopped after {} packets ({} bytes)",
            stats.packets_sent,
            stats.bytes_sent
        );
        Ok(())
    }
}

fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    let mut next_id: ClientId = 0;
    while !shared.running.expired() {
        match listener.accept() {
            Ok((stream, peer)) => {
                next_id += 1;
                if let Err(e) = add_client(&shared, next_id, stream) {
                    sink_error!(shared.logger, "[P2P Sender] Client {next_id}: setup failed: {e}");
                    continue;
                }
                sink_info!(shared.logger, "[P2P Sender] Client {next_id}: connected from {peer}");
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(TICK),
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => {
                sink_error!(shared.logger, "[P2P Sender] Acceptor failed: {e}");
                if shared.clients.lock().is_empty() {
                    shared.running.cancel();
                }
                return;
            }
        }
    }
}

fn add_client(shared: &Arc<Shared>, id: ClientId, stream: TcpStream) -> Result<(), TcpError> {
    // accepted sockets may inherit the listener's non-blocking mode
    stream.set_nonblocking(false)?;
    let _ = stream.set_nodelay(true);
    let client = Arc::new(Client {
        id,
        stream,
        queue: Mutex::new(ClientQueue::default()),
        ready: Condvar::new(),
    });

    shared.clients.lock().insert(id, Arc::clone(&client));
    let worker_shared = Arc::clone(shared);
    let worker_client = Arc::clone(&client);
    let spawned = thread::Builder::new()
        .name(format!("p2p-client-{id}"))
        .spawn(move || client_loop(worker_shared, worker_client));
    match spawned {
        Ok(handle) => {
            let mut workers = shared.workers.lock();
            workers.retain(|h| !h.is_finished());
            workers.push(handle);
            Ok(())
        }
        Err(e) => {
            shared.drop_client(&client);
            Err(e.into())
        }
    }
}

/// Writer thread: sends queued units in order until the client fails or is
/// closed.
fn client_loop(shared: Arc<Shared>, client: Arc<Client>) {
    let mut writer = FrameWriter::new();
    let mut stream = &client.stream;

    loop {
        let unit = {
            let mut queue = client.queue.lock();
            loop {
                if queue.closed || shared.running.expired() {
                    return;
                }
                if let Some(unit) = queue.units.front() {
                    break Arc::clone(unit);
                }
                client.ready.wait_for(&mut queue, TICK);
            }
        };

        if let Err(e) = writer.write_frame(&mut stream, unit.data()) {
            if !client.queue.lock().closed {
                sink_error!(shared.logger, "[P2P Sender] Client {}: failed to send packet ({e})", client.id);
            }
            shared.drop_client(&client);
            return;
        }

        shared.packets_sent.fetch_add(1, Ordering::Relaxed);
        shared
            .bytes_sent
            .fetch_add((LENGTH_PREFIX_SIZE + unit.size()) as u64, Ordering::Relaxed);

        if client.queue.lock().pop() {
            shared.overflown.fetch_sub(1, Ordering::SeqCst);
            sink_debug!(shared.logger, "[P2P Sender] Client {}: queue drained", client.id);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;
    use std::time::Instant;

    fn unit(idr: bool) -> Arc<Unit> {
        let nal = if idr { 0x65 } else { 0x41 };
        Arc::new(Unit::from_annexb(vec![0, 0, 1, nal], 0))
    }

    #[test]
    fn test_units_before_first_idr_are_dropped() {
        let mut q = ClientQueue::default();
        assert!(!q.push(&unit(false)));
        assert!(q.units.is_empty());
        q.push(&unit(true));
        q.push(&unit(false));
        assert_eq!(q.units.len(), 2);
        assert!(q.units[0].is_idr());
    }

    #[test]
    fn test_watermarks() {
        let mut q = ClientQueue::default();
        q.push(&unit(true));
        for _ in 1..HIGH_WATERMARK - 1 {
            assert!(!q.push(&unit(false)));
        }
        assert!(q.push(&unit(false)), "reaching the high watermark overflows");
        assert!(!q.push(&unit(false)), "counted only once");
        assert_eq!(q.units.len(), HIGH_WATERMARK + 1);

        while q.units.len() > LOW_WATERMARK + 1 {
            assert!(!q.pop());
        }
        assert!(q.pop());
        assert!(!q.overflown);
        assert_eq!(q.units.len(), LOW_WATERMARK);
    }

    #[test]
    fn test_close_releases_overflow_slot() {
        let mut q = ClientQueue::default();
        q.push(&unit(true));
        assert!(!q.close(), "not overflown");

        let mut q = ClientQueue::default();
        for i in 0..HIGH_WATERMARK {
            q.push(&unit(i == 0));
        }
        assert!(q.overflown);
        assert!(q.close());
        assert!(!q.push(&unit(true)), "closed queues ignore pushes");
        assert!(q.units.is_empty());
    }

    fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let viewer = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (accepted, _) = listener.accept().unwrap();
        (viewer, accepted)
    }

    #[test]
    fn test_finished_workers_are_pruned() {
        let sender = P2PSender::bind(
            "127.0.0.1:0".parse().unwrap(),
            Arc::new(NoopLogSink),
            Cancellation::new(),
        )
        .unwrap();
        let shared = &sender.shared;
        let mut viewers = Vec::new();

        for id in 1..=5 {
            let (viewer, accepted) = connected_pair();
            viewers.push(viewer);
            add_client(shared, id, accepted).unwrap();
            let client = shared.clients.lock().get(&id).cloned().unwrap();
            shared.drop_client(&client);

            let deadline = Instant::now() + Duration::from_secs(2);
            while !shared.workers.lock().iter().all(JoinHandle::is_finished) {
                assert!(Instant::now() < deadline, "worker {id} did not exit");
                thread::sleep(TICK);
            }
        }
        assert_eq!(shared.workers.lock().len(), 1);
        assert_eq!(sender.client_count(), 0);
    }

    #[test]
    fn test_shared_payload_is_not_copied() {
        let mut a = ClientQueue::default();
        let mut b = ClientQueue::default();
        let u = unit(true);
        a.push(&u);
        b.push(&u);
        assert_eq!(Arc::strong_count(&u), 3);
        assert!(std::ptr::eq(a.units[0].data().as_ptr(), b.units[0].data().as_ptr()));
    }
}
