//! One line-oriented TCP connection.
//!
//! The connection is found by probing a window of consecutive ports:
//! - the hosting side binds the first free port of the window on every
//!   interface, accepts exactly one peer and stops listening;
//! - the joining side dials each port of the window in order and keeps
//!   the first that answers.
//!
//! Reads are fail-soft: [`Transport::read_input_line`] never errors, it
//! returns `""` once the link is gone (or before it exists). Writes go
//! through a per-connection writer task, so [`Transport::write_output_line`]
//! never blocks and silently drops lines while unconnected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::config::candidate_ports;
use crate::types::{LineReader, LineRx, LineTx, LinkId};

pub struct Transport {
    link: LinkId,
    reader: Mutex<Option<LineReader>>,
    writer: OnceLock<LineTx>,
    port: OnceLock<u16>,

    /// Cleared once the peer closed the link or a read failed.
    reading: AtomicBool,
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport {
    pub fn new() -> Self {
        Transport {
            link: LinkId::next(),
            reader: Mutex::new(None),
            writer: OnceLock::new(),
            port: OnceLock::new(),
            reading: AtomicBool::new(false),
        }
    }

    pub fn link(&self) -> LinkId {
        self.link
    }

    /// Port of the connection; on the hosting side, set as soon as a
    /// port of the window was bound.
    pub fn port(&self) -> Option<u16> {
        self.port.get().copied()
    }

    /// Whether both directions of the link are usable.
    pub fn is_complete(&self) -> bool {
        self.writer.get().is_some_and(|tx| !tx.is_closed()) && self.reading.load(Ordering::Acquire)
    }

    /// Listen on the first free port of the window and accept one peer.
    ///
    /// Returns `false` if no port could be bound or the accept failed.
    pub async fn connect_as_server(&self, base_port: u16, window: u16) -> bool {
        if self.writer.get().is_some() {
            return self.is_complete();
        }

        let mut listener = None;
        for port in candidate_ports(base_port, window) {
            match TcpListener::bind(("0.0.0.0", port)).await {
                Ok(l) => {
                    listener = Some((l, port));
                    break;
                }
                Err(e) => debug!(link = %self.link, port, error = %e, "port unavailable"),
            }
        }

        let Some((listener, port)) = listener else {
            warn!(link = %self.link, base_port, window, "no free port in window");
            return false;
        };

        let _ = self.port.set(port);
        info!(link = %self.link, port, "waiting for a peer");

        // The listener is dropped on return: one peer per transport.
        match listener.accept().await {
            Ok((stream, peer)) => {
                info!(link = %self.link, port, %peer, "peer connected");
                self.attach(stream).await;
                true
            }
            Err(e) => {
                warn!(link = %self.link, port, error = %e, "accept failed");
                false
            }
        }
    }

    /// Dial each port of the window on `host`, keeping the first that
    /// answers. Returns `false` if none did.
    pub async fn connect_as_client(&self, host: &str, base_port: u16, window: u16) -> bool {
        if self.writer.get().is_some() {
            return self.is_complete();
        }

        for port in candidate_ports(base_port, window) {
            match TcpStream::connect((host, port)).await {
                Ok(stream) => {
                    let _ = self.port.set(port);
                    info!(link = %self.link, host, port, "connected");
                    self.attach(stream).await;
                    return true;
                }
                Err(e) => debug!(link = %self.link, host, port, error = %e, "no answer"),
            }
        }

        warn!(link = %self.link, host, base_port, window, "nobody answered in window");
        false
    }

    /// Next line from the peer, without its terminator.
    ///
    /// Returns `""` if not connected, on EOF and on any read error; the
    /// latter two also close the reading side for good.
    pub async fn read_input_line(&self) -> String {
        let mut guard = self.reader.lock().await;
        let Some(lines) = guard.as_mut() else {
            return String::new();
        };

        match lines.next_line().await {
            Ok(Some(line)) => {
                debug!(link = %self.link, %line, "<-");
                line
            }
            Ok(None) => {
                info!(link = %self.link, "peer closed the link");
                self.close_reader(&mut guard);
                String::new()
            }
            Err(e) => {
                warn!(link = %self.link, error = %e, "read failed");
                self.close_reader(&mut guard);
                String::new()
            }
        }
    }

    /// Queue `line` for the peer. Dropped if not connected.
    pub fn write_output_line(&self, line: &str) {
        match self.writer.get() {
            Some(tx) => {
                if tx.send(line.to_owned()).is_err() {
                    debug!(link = %self.link, %line, "writer gone; dropping line");
                }
            }
            None => debug!(link = %self.link, %line, "not connected; dropping line"),
        }
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    async fn attach(&self, stream: TcpStream) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!(link = %self.link, error = %e, "could not disable nagle");
        }
        let (read_half, write_half) = stream.into_split();

        let (tx, rx) = mpsc::unbounded_channel();
        if self.writer.set(tx).is_err() {
            warn!(link = %self.link, "already connected; dropping second stream");
            return;
        }
        tokio::spawn(run_writer(self.link, write_half, rx));

        *self.reader.lock().await = Some(BufReader::new(read_half).lines());
        self.reading.store(true, Ordering::Release);
    }

    fn close_reader(&self, reader: &mut Option<LineReader>) {
        *reader = None;
        self.reading.store(false, Ordering::Release);
    }
}

/// Writer task: drain outbound lines onto the socket until every sender
/// is gone or a write fails.
async fn run_writer(link: LinkId, mut stream: OwnedWriteHalf, mut rx: LineRx) {
    while let Some(line) = rx.recv().await {
        debug!(%link, %line, "->");
        let data = format!("{line}\n");
        if let Err(e) = stream.write_all(data.as_bytes()).await {
            warn!(%link, error = %e, "write failed");
            break;
        }
        if let Err(e) = stream.flush().await {
            warn!(%link, error = %e, "flush failed");
            break;
        }
    }
    debug!(%link, "writer stopped");
}
