/*!
UDP command endpoint.

Each datagram carries one JSON command object; the response is sent back to
the sender as JSON. Two threads cooperate:
1. Receiver thread (tokio): datagrams -> bounded command queue, replies -> socket
2. Transmit worker thread: command queue -> transmitter -> replies

The single worker is the only caller of the transmitter, so transmissions
never overlap. When the queue is full new commands are refused immediately.
*/

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use serde_json::Value;
use std::net::{SocketAddr, UdpSocket as StdUdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::command::{self, CommandMap};
use crate::error::BoxError;
use crate::transmitter::Transmitter;

/// Largest command datagram accepted
const MAX_DATAGRAM: usize = 4096;

/// How often both threads re-check the running flag
const POLL_INTERVAL: Duration = Duration::from_millis(100);

struct Job {
    peer: SocketAddr,
    command: CommandMap,
}

struct Reply {
    peer: SocketAddr,
    response: CommandMap,
}

pub struct CommandServer {
    socket: StdUdpSocket,
    queue_depth: usize,
    running: Arc<AtomicBool>,
}

impl CommandServer {
    /// Bind the command socket
    pub fn bind(bind_addr: &str, port: u16, queue_depth: usize) -> Result<Self, BoxError> {
        let socket_addr = format!("{}:{}", bind_addr, port);
        info!("🔌 Binding UDP command socket to {}", socket_addr);
        let socket = StdUdpSocket::bind(&socket_addr)?;
        socket.set_nonblocking(true)?;

        Ok(Self {
            socket,
            queue_depth: queue_depth.max(1),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Get a reference to the running flag for external control
    pub fn get_running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Serve commands until the running flag is cleared
    ///
    /// The transmitter is closed when the worker exits.
    pub fn run(self, transmitter: Transmitter) -> Result<(), BoxError> {
        let (job_tx, job_rx) = bounded::<Job>(self.queue_depth);
        let (reply_tx, reply_rx) = unbounded_channel::<Reply>();

        let running_worker = Arc::clone(&self.running);
        let worker_handle = thread::spawn(move || {
            Self::transmit_worker_thread(transmitter, job_rx, reply_tx, running_worker);
        });

        let running_receiver = Arc::clone(&self.running);
        let socket = self.socket;
        let receiver_handle = thread::spawn(move || -> Result<(), BoxError> {
            let rt = Runtime::new()?;
            let socket = {
                let _guard = rt.enter();
                UdpSocket::from_std(socket)?
            };
            rt.block_on(async {
                match Self::receiver_loop(socket, job_tx, reply_rx, running_receiver).await {
                    Ok(_) => {
                        info!("UDP command receiver finished successfully");
                        Ok(())
                    }
                    Err(e) => {
                        error!("UDP command receiver failed: {}", e);
                        Err(e)
                    }
                }
            })
        });

        let receiver_result = receiver_handle.join().map_err(|_| "Receiver thread panicked")?;
        // The receiver may have failed on its own; make sure the worker stops too
        self.running.store(false, Ordering::SeqCst);
        worker_handle.join().map_err(|_| "Worker thread panicked")?;

        receiver_result
    }

    async fn receiver_loop(
        socket: UdpSocket,
        job_tx: Sender<Job>,
        mut reply_rx: UnboundedReceiver<Reply>,
        running: Arc<AtomicBool>,
    ) -> Result<(), BoxError> {
        let mut buffer = vec![0u8; MAX_DATAGRAM];
        let mut command_count = 0u64;
        let mut refused_count = 0u64;

        while running.load(Ordering::SeqCst) {
            tokio::select! {
                received = socket.recv_from(&mut buffer) => {
                    let (len, peer) = received?;
                    command_count += 1;
                    let command = match serde_json::from_slice::<Value>(&buffer[..len]) {
                        Ok(Value::Object(command)) => command,
                        Ok(_) => {
                            Self::send_reply(&socket, peer, error_response("command must be a JSON object")).await;
                            continue;
                        }
                        Err(e) => {
                            Self::send_reply(&socket, peer, error_response(&format!("invalid JSON command: {}", e))).await;
                            continue;
                        }
                    };

                    debug!("Command from {}: {:?}", peer, command);
                    match job_tx.try_send(Job { peer, command }) {
                        Ok(()) => {}
                        Err(TrySendError::Full(job)) => {
                            refused_count += 1;
                            warn!("Command queue full, refusing command from {}", job.peer);
                            Self::send_reply(&socket, job.peer, error_response("transmitter busy")).await;
                        }
                        Err(TrySendError::Disconnected(_)) => {
                            warn!("Transmit worker stopped, closing command socket");
                            break;
                        }
                    }
                }
                Some(reply) = reply_rx.recv() => {
                    Self::send_reply(&socket, reply.peer, reply.response).await;
                }
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        }

        info!(
            "📊 Command receiver stopped: {} commands received, {} refused",
            command_count, refused_count
        );
        Ok(())
    }

    async fn send_reply(socket: &UdpSocket, peer: SocketAddr, response: CommandMap) {
        let payload = match serde_json::to_vec(&Value::Object(response)) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to encode reply for {}: {}", peer, e);
                return;
            }
        };
        if let Err(e) = socket.send_to(&payload, peer).await {
            warn!("Failed to send reply to {}: {}", peer, e);
        }
    }

    fn transmit_worker_thread(
        transmitter: Transmitter,
        job_rx: Receiver<Job>,
        reply_tx: UnboundedSender<Reply>,
        running: Arc<AtomicBool>,
    ) {
        info!("📡 Transmit worker started");
        while running.load(Ordering::SeqCst) {
            match job_rx.recv_timeout(POLL_INTERVAL) {
                Ok(job) => {
                    let response = command::respond(&transmitter, &job.command);
                    if reply_tx.send(Reply { peer: job.peer, response }).is_err() {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        transmitter.close();
        info!("Transmit worker stopped");
    }
}

fn error_response(message: &str) -> CommandMap {
    let mut response = CommandMap::new();
    response.insert("error".to_string(), Value::String(message.to_string()));
    response
}
