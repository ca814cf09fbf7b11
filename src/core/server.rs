use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use uuid::Uuid;

use crate::core::relay::RelayService;
use crate::domain::model::AngleBroadcast;
use crate::domain::ports::{ActuatorLink, AnglePredictor};
use crate::utils::error::Result;

/// WebSocket front door for the relay.
///
/// Every accepted peer is a listener: it receives all joint-angle
/// broadcasts, and any text frame it sends is relayed as a target
/// position.
pub struct RelayServer<P: AnglePredictor + 'static, A: ActuatorLink + 'static> {
    relay: Arc<RelayService<P, A>>,
    listener: TcpListener,
    clients: Arc<RwLock<HashMap<Uuid, SocketAddr>>>,
}

impl<P: AnglePredictor + 'static, A: ActuatorLink + 'static> RelayServer<P, A> {
    pub async fn bind(addr: SocketAddr, relay: Arc<RelayService<P, A>>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            relay,
            listener,
            clients: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(self) -> Result<()> {
        tracing::info!("WebSocket relay listening on ws://{}", self.local_addr()?);

        loop {
            let (stream, addr) = self.listener.accept().await?;
            let relay = Arc::clone(&self.relay);
            let clients = Arc::clone(&self.clients);

            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, relay, clients).await {
                    tracing::warn!("Connection from {} ended with error: {}", addr, e);
                }
            });
        }
    }
}

async fn handle_connection<P: AnglePredictor, A: ActuatorLink>(
    stream: TcpStream,
    addr: SocketAddr,
    relay: Arc<RelayService<P, A>>,
    clients: Arc<RwLock<HashMap<Uuid, SocketAddr>>>,
) -> Result<()> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let client_id = Uuid::new_v4();
    let stats = relay.stats();

    tracing::info!("Listener connected from {} (id: {})", addr, client_id);

    {
        let mut guard = clients.write().await;
        guard.insert(client_id, addr);
        stats.connected.store(guard.len(), Ordering::Relaxed);
    }

    let (mut write, mut read) = ws_stream.split();
    let mut broadcast_rx = relay.subscribe();

    let result = serve_listener(&mut write, &mut read, &relay, &mut broadcast_rx).await;

    // 不論怎麼結束,清理只做這一次
    {
        let mut guard = clients.write().await;
        guard.remove(&client_id);
        stats.connected.store(guard.len(), Ordering::Relaxed);
    }
    tracing::info!("Listener {} removed", client_id);

    result
}

async fn serve_listener<P: AnglePredictor, A: ActuatorLink>(
    write: &mut SplitSink<WebSocketStream<TcpStream>, Message>,
    read: &mut SplitStream<WebSocketStream<TcpStream>>,
    relay: &RelayService<P, A>,
    broadcast_rx: &mut broadcast::Receiver<AngleBroadcast>,
) -> Result<()> {
    loop {
        tokio::select! {
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        // inline: the next frame waits until this one is
                        // fully relayed, actuator attempt included
                        relay.process_message(&text).await;
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        write.send(Message::Pong(payload)).await?;
                    }
                    Some(Ok(Message::Close(_))) => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                }
            }
            update = broadcast_rx.recv() => {
                match update {
                    Ok(frame) => {
                        let json = serde_json::to_string(&frame)?;
                        if write.send(Message::Text(json)).await.is_err() {
                            // peer went away mid-send; teardown handles it
                            return Ok(());
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Listener lagged, {} broadcasts skipped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }
        }
    }
}
