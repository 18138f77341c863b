//! Binds `ActorRef`-shaped operations to a pluggable `RemoteTransport`
//! (6.1): the core defines the interface and a reference TCP
//! implementation; it never picks envelope serialization for the caller
//! (a stated Non-goal), so frames carry pre-serialized bytes the caller
//! produced however it likes.
//!
//! `TcpRemoteTransport` is the one place in this crate that touches
//! `tokio` — scoped here exactly as recorded in DESIGN.md, since the actor
//! core itself (kernel/dispatcher/mailbox) stays on `std::thread`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::{cluster::membership::NodeId, error::RemoteDeliveryFailed};

/// One hop of cluster traffic: a destination actor path and an opaque,
/// already-serialized payload. What goes in `payload` is the caller's
/// concern — domain state (de)serialization is out of scope for the core.
#[derive(Clone, Debug)]
pub struct WireFrame {
    pub dest_path: String,
    pub payload: Vec<u8>,
}

pub type InboundHandler = Arc<dyn Fn(WireFrame, String) + Send + Sync>;

/// The collaborator interface the core assumes for inter-node delivery
/// (6.1): send an envelope to a destination node, and be told about
/// envelopes arriving for a local ref. Delivery is at-most-once; failures
/// are reported back to the caller, who routes them to dead letters.
pub trait RemoteTransport: Send + Sync {
    fn send(&self, frame: WireFrame, dest_address: &str) -> Result<(), RemoteDeliveryFailed>;
    fn set_inbound_handler(&self, handler: InboundHandler);
}

/// A ref bound to a remote node: `tell`-shaped sends hand the payload to
/// the transport instead of a local mailbox. Produced by
/// `cluster::shard::ShardRegion::entity_ref` when the owning node isn't
/// this one.
pub struct RemoteRef {
    node: NodeId,
    path: String,
}

impl RemoteRef {
    pub fn new(node: NodeId, path: String) -> Self {
        RemoteRef { node, path }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Hand a pre-serialized payload to `transport` for delivery to this
    /// ref's node and path.
    pub fn tell_bytes(&self, transport: &dyn RemoteTransport, dest_address: &str, payload: Vec<u8>) -> Result<(), RemoteDeliveryFailed> {
        transport.send(
            WireFrame {
                dest_path: self.path.clone(),
                payload,
            },
            dest_address,
        )
    }
}

/// A minimal, real TCP `RemoteTransport`: one length-prefixed frame per
/// message (`u32` path length, path bytes, `u32` payload length, payload
/// bytes), one outbound writer task per peer address, and a listener task
/// handing inbound frames to the registered handler. Runs its own
/// multi-thread `tokio` runtime so it can be constructed and used from the
/// otherwise fully synchronous actor core.
pub struct TcpRemoteTransport {
    runtime: Runtime,
    outbound: Mutex<HashMap<String, mpsc::UnboundedSender<WireFrame>>>,
    handler: Mutex<Option<InboundHandler>>,
}

impl TcpRemoteTransport {
    pub fn bind(listen_address: &str) -> std::io::Result<Arc<Self>> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;

        let transport = Arc::new(TcpRemoteTransport {
            runtime,
            outbound: Mutex::new(HashMap::new()),
            handler: Mutex::new(None),
        });

        let accept_transport = transport.clone();
        let listen_address = listen_address.to_string();
        transport.runtime.spawn(async move {
            let listener = match TcpListener::bind(&listen_address).await {
                Ok(l) => l,
                Err(_) => return,
            };
            loop {
                let (socket, _peer) = match listener.accept().await {
                    Ok(pair) => pair,
                    Err(_) => continue,
                };
                let transport = accept_transport.clone();
                tokio::spawn(read_frames(socket, transport));
            }
        });

        Ok(transport)
    }

    fn writer_for(self: &Arc<Self>, dest_address: &str) -> mpsc::UnboundedSender<WireFrame> {
        let mut outbound = self.outbound.lock().unwrap();
        if let Some(tx) = outbound.get(dest_address) {
            return tx.clone();
        }
        let (tx, mut rx) = mpsc::unbounded_channel::<WireFrame>();
        let address = dest_address.to_string();
        self.runtime.spawn(async move {
            let mut stream = match TcpStream::connect(&address).await {
                Ok(stream) => stream,
                Err(_) => return,
            };
            while let Some(frame) = rx.recv().await {
                if write_frame(&mut stream, &frame).await.is_err() {
                    break;
                }
            }
        });
        outbound.insert(dest_address.to_string(), tx.clone());
        tx
    }
}

impl RemoteTransport for Arc<TcpRemoteTransport> {
    fn send(&self, frame: WireFrame, dest_address: &str) -> Result<(), RemoteDeliveryFailed> {
        let tx = self.writer_for(dest_address);
        tx.send(frame).map_err(|_| RemoteDeliveryFailed {
            reason: format!("no writer for {}", dest_address),
        })
    }

    fn set_inbound_handler(&self, handler: InboundHandler) {
        *self.handler.lock().unwrap() = Some(handler);
    }
}

async fn write_frame(stream: &mut TcpStream, frame: &WireFrame) -> std::io::Result<()> {
    stream.write_u32(frame.dest_path.len() as u32).await?;
    stream.write_all(frame.dest_path.as_bytes()).await?;
    stream.write_u32(frame.payload.len() as u32).await?;
    stream.write_all(&frame.payload).await?;
    stream.flush().await
}

async fn read_frames(mut stream: TcpStream, transport: Arc<TcpRemoteTransport>) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".into());

    loop {
        let path_len = match stream.read_u32().await {
            Ok(n) => n as usize,
            Err(_) => return,
        };
        let mut path_buf = vec![0u8; path_len];
        if stream.read_exact(&mut path_buf).await.is_err() {
            return;
        }
        let payload_len = match stream.read_u32().await {
            Ok(n) => n as usize,
            Err(_) => return,
        };
        let mut payload = vec![0u8; payload_len];
        if stream.read_exact(&mut payload).await.is_err() {
            return;
        }

        let dest_path = match String::from_utf8(path_buf) {
            Ok(s) => s,
            Err(_) => return,
        };

        if let Some(handler) = transport.handler.lock().unwrap().clone() {
            handler(WireFrame { dest_path, payload }, peer.clone());
        }
    }
}
