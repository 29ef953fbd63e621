//! TCP front of the proxy. The patched client connects here, sends a short
//! handshake naming the real game server, and from then on both directions
//! are relayed frame by frame through the dispatcher. Each connection gets
//! its own farming bot whose forged frames go straight to the server
//! socket.

use std::io::{self, Read, Write};
use std::net::{Ipv6Addr, Shutdown, SocketAddrV6, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use wire_proto::FrameBuffer;

use crate::bot::FarmingBot;
use crate::config::ProxyConfig;
use crate::data::GameData;
use crate::dispatch::{Dispatcher, FrameDisposition};
use crate::schedule::BotHandle;

const READ_BUFFER_SIZE: usize = 2048;
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(200);

/// The handshake the patched client sends right after connecting: the real
/// server's address, the address structure length, and the port in network
/// byte order.
#[derive(Debug, PartialEq, Eq)]
pub struct Handshake {
    pub address: Ipv6Addr,
    pub port: u16,
}

impl Handshake {
    pub const WIRE_SIZE: usize = 22;

    pub fn parse(raw: &[u8; Self::WIRE_SIZE]) -> Handshake {
        let mut address = [0u8; 16];
        address.copy_from_slice(&raw[0..16]);
        // Bytes 16..20 carry the sockaddr length; the address and port are
        // all we need.
        let port = u16::from_be_bytes([raw[20], raw[21]]);
        Handshake {
            address: Ipv6Addr::from(address),
            port,
        }
    }

    fn read_from(stream: &mut TcpStream) -> io::Result<Handshake> {
        let mut raw = [0u8; Self::WIRE_SIZE];
        stream.read_exact(&mut raw)?;
        Ok(Handshake::parse(&raw))
    }

    pub fn server_addr(&self) -> SocketAddrV6 {
        SocketAddrV6::new(self.address, self.port, 0, 0)
    }
}

/// Tracks the live sockets so a shutdown request can unblock every relay
/// thread at once.
pub struct SessionRegistry {
    running: AtomicBool,
    sockets: Mutex<Vec<TcpStream>>,
}

impl SessionRegistry {
    pub fn new() -> SessionRegistry {
        SessionRegistry {
            running: AtomicBool::new(false),
            sockets: Mutex::new(Vec::new()),
        }
    }

    pub fn start(&self) {
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn register(&self, stream: &TcpStream) {
        match stream.try_clone() {
            Ok(clone) => self
                .sockets
                .lock()
                .expect("socket registry mutex poisoned")
                .push(clone),
            Err(err) => warn!(target: "gridghost::relay", error = %err, "failed to register socket"),
        }
    }

    /// Stops the accept loop and half-closes every registered socket so
    /// blocked reads return.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
        let sockets = self.sockets.lock().expect("socket registry mutex poisoned");
        for socket in sockets.iter() {
            let _ = socket.shutdown(Shutdown::Read);
        }
        info!(target: "gridghost::relay", sockets = sockets.len(), "shutting down");
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        SessionRegistry::new()
    }
}

pub struct Proxy {
    config: ProxyConfig,
    data: Arc<GameData>,
    registry: Arc<SessionRegistry>,
}

impl Proxy {
    pub fn new(config: ProxyConfig, data: Arc<GameData>) -> Proxy {
        Proxy {
            config,
            data,
            registry: Arc::new(SessionRegistry::new()),
        }
    }

    pub fn registry(&self) -> Arc<SessionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Accept loop. Polls a nonblocking listener so a shutdown request is
    /// noticed between connections.
    pub fn run(&self) -> io::Result<()> {
        let listener = TcpListener::bind(("0.0.0.0", self.config.listen_port))?;
        listener.set_nonblocking(true)?;
        self.registry.start();

        info!(
            target: "gridghost::relay",
            port = self.config.listen_port,
            "proxy listening"
        );

        let mut workers = Vec::new();
        while self.registry.is_running() {
            match listener.accept() {
                Ok((stream, peer)) => {
                    info!(target: "gridghost::relay", %peer, "client connected");
                    stream.set_nonblocking(false)?;

                    let config = self.config.clone();
                    let data = Arc::clone(&self.data);
                    let registry = Arc::clone(&self.registry);
                    workers.push(thread::spawn(move || {
                        if let Err(err) = handle_connection(stream, config, data, registry) {
                            error!(target: "gridghost::relay", error = %err, "connection failed");
                        }
                    }));
                }
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(err) => {
                    error!(target: "gridghost::relay", error = %err, "accept failed");
                    thread::sleep(ACCEPT_ERROR_BACKOFF);
                }
            }
        }

        for worker in workers {
            let _ = worker.join();
        }

        Ok(())
    }
}

fn handle_connection(
    mut client: TcpStream,
    config: ProxyConfig,
    data: Arc<GameData>,
    registry: Arc<SessionRegistry>,
) -> io::Result<()> {
    let handshake = Handshake::read_from(&mut client)?;
    let target = handshake.server_addr();
    info!(target: "gridghost::relay", server = %target, "connecting to game server");

    let server = TcpStream::connect(target)?;

    registry.register(&client);
    registry.register(&server);

    let mut bot = FarmingBot::new(&config, Arc::clone(&data), Box::new(server.try_clone()?));
    bot.start();

    let dispatcher = Arc::new(Dispatcher::new(data));
    let handle = bot.handle();

    let upstream = {
        let src = client.try_clone()?;
        let dst = server.try_clone()?;
        let dispatcher = Arc::clone(&dispatcher);
        let handle = Arc::clone(&handle);
        thread::spawn(move || relay_loop(src, dst, dispatcher, handle, "client"))
    };
    let downstream = {
        let src = server;
        let dst = client;
        thread::spawn(move || relay_loop(src, dst, dispatcher, handle, "server"))
    };

    let _ = upstream.join();
    let _ = downstream.join();

    bot.stop();
    info!(target: "gridghost::relay", "connection closed");

    Ok(())
}

/// Pumps one direction: reassemble frames from `src`, run each through the
/// dispatcher, and forward whatever it allows to `dst`. On EOF or error the
/// peer stream is half-closed so the opposite pump exits too.
fn relay_loop(
    mut src: TcpStream,
    mut dst: TcpStream,
    dispatcher: Arc<Dispatcher>,
    handle: Arc<BotHandle>,
    label: &str,
) {
    let mut read_buffer = [0u8; READ_BUFFER_SIZE];
    let mut frames = FrameBuffer::new();

    loop {
        let bytes_read = match src.read(&mut read_buffer) {
            Ok(0) => {
                info!(target: "gridghost::relay", side = label, "connection closed");
                break;
            }
            Ok(bytes_read) => bytes_read,
            Err(err) => {
                info!(target: "gridghost::relay", side = label, error = %err, "read error");
                break;
            }
        };

        debug!(target: "gridghost::relay", side = label, bytes = bytes_read, "relaying");
        frames.extend(&read_buffer[..bytes_read]);

        loop {
            let payload = match frames.next_frame() {
                Ok(Some(payload)) => payload,
                Ok(None) => break,
                Err(err) => {
                    error!(target: "gridghost::relay", side = label, error = %err, "bad frame, dropping connection");
                    let _ = dst.shutdown(Shutdown::Read);
                    return;
                }
            };

            match dispatcher.handle_frame(&payload, &handle) {
                FrameDisposition::Forward(frame) => {
                    if let Err(err) = dst.write_all(&frame) {
                        info!(target: "gridghost::relay", side = label, error = %err, "write error");
                        let _ = dst.shutdown(Shutdown::Read);
                        return;
                    }
                }
                FrameDisposition::Suppress => {
                    debug!(target: "gridghost::relay", side = label, "frame suppressed");
                }
            }
        }
    }

    let _ = dst.shutdown(Shutdown::Read);
}
