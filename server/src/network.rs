//! Server network layer: WebSocket transport, admin HTTP endpoints and the
//! event loop that serializes every state change through the router

use crate::client_manager::{self, Outbox};
use crate::error::ServerError;
use crate::router::{Router, ServerStatus};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::Json;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use serde::Serialize;
use shared::{ClientEvent, ClientId, WS_PATH};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tower_http::cors::CorsLayer;

/// Messages sent from connection tasks and HTTP handlers to the event loop
#[derive(Debug)]
pub enum ServerMessage {
    Connect {
        outbox: Outbox,
        reply: oneshot::Sender<ClientId>,
    },
    Event {
        client_id: ClientId,
        event: ClientEvent,
    },
    Disconnect {
        client_id: ClientId,
    },
    Reset {
        reply: Option<oneshot::Sender<()>>,
    },
    Status {
        reply: oneshot::Sender<ServerStatus>,
    },
    Shutdown,
}

/// Cloneable handle for talking to a running server from outside
#[derive(Debug, Clone)]
pub struct ServerHandle {
    server_tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ServerHandle {
    /// Resets the tower and waits until the reset has been broadcast
    pub async fn reset(&self) -> Result<(), ServerError> {
        let (reply, done) = oneshot::channel();
        self.send(ServerMessage::Reset { reply: Some(reply) })?;
        done.await.map_err(|_| ServerError::LoopClosed)
    }

    pub async fn status(&self) -> Result<ServerStatus, ServerError> {
        let (reply, status) = oneshot::channel();
        self.send(ServerMessage::Status { reply })?;
        status.await.map_err(|_| ServerError::LoopClosed)
    }

    /// Asks the event loop to stop; the listener goes down with it
    pub fn shutdown(&self) {
        let _ = self.server_tx.send(ServerMessage::Shutdown);
    }

    fn send(&self, message: ServerMessage) -> Result<(), ServerError> {
        self.server_tx
            .send(message)
            .map_err(|_| ServerError::LoopClosed)
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    message: &'static str,
    players: usize,
    blocks: usize,
}

#[derive(Debug, Serialize)]
struct ResetResponse {
    message: &'static str,
}

/// Main server: owns the listener and the router
pub struct Server {
    listener: TcpListener,
    router: Router,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        info!("Server listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            router: Router::new(),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn handle(&self) -> ServerHandle {
        ServerHandle {
            server_tx: self.server_tx.clone(),
        }
    }

    /// Builds the HTTP routes: the WebSocket endpoint plus admin surface
    pub fn app(handle: ServerHandle) -> axum::Router {
        axum::Router::new()
            .route(WS_PATH, get(ws_handler))
            .route("/health", get(health))
            .route("/reset", post(reset))
            .layer(CorsLayer::permissive())
            .with_state(handle)
    }

    /// Runs the HTTP listener and the event loop until shutdown
    ///
    /// The loop is the only place the router is touched. Messages are applied
    /// strictly in the order they are dequeued.
    pub async fn run(self) -> Result<(), ServerError> {
        let Server {
            listener,
            mut router,
            server_tx,
            mut server_rx,
        } = self;

        let app = Self::app(ServerHandle { server_tx });
        let mut http = tokio::spawn(async move { axum::serve(listener, app).await });

        info!("Server started successfully");

        let result = loop {
            tokio::select! {
                message = server_rx.recv() => {
                    match message {
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            break Ok(());
                        }
                        Some(message) => Self::dispatch(&mut router, message),
                    }
                },
                joined = &mut http => {
                    break match joined {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(ServerError::Serve(e)),
                        Err(e) => Err(ServerError::Task(e.to_string())),
                    };
                },
            }
        };

        http.abort();
        result
    }

    fn dispatch(router: &mut Router, message: ServerMessage) {
        match message {
            ServerMessage::Connect { outbox, reply } => {
                let client_id = router.connect(outbox);
                if reply.send(client_id).is_err() {
                    // Connection task died before admission completed
                    router.disconnect(client_id);
                }
            }
            ServerMessage::Event { client_id, event } => {
                router.handle_event(client_id, event);
            }
            ServerMessage::Disconnect { client_id } => {
                router.disconnect(client_id);
            }
            ServerMessage::Reset { reply } => {
                router.reset();
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
            }
            ServerMessage::Status { reply } => {
                let _ = reply.send(router.status());
            }
            ServerMessage::Shutdown => {}
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(handle): State<ServerHandle>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, handle))
}

/// Drives one WebSocket connection from admission to disconnect
///
/// A writer task drains the client's outbound queue onto the socket and a
/// reader task decodes frames into router events. Whichever ends first tears
/// down the other, then a disconnect is queued. The router ignores the
/// disconnect if the client is already gone.
async fn handle_socket(socket: WebSocket, handle: ServerHandle) {
    let (mut sink, mut stream) = socket.split();
    let (outbox, mut inbox) = client_manager::outbox();
    let (reply, admitted) = oneshot::channel();

    if handle
        .send(ServerMessage::Connect { outbox, reply })
        .is_err()
    {
        return;
    }
    let client_id = match admitted.await {
        Ok(client_id) => client_id,
        Err(_) => return,
    };

    let mut writer = tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode event for {}: {}", client_id, e);
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(text)).await {
                debug!("Send to {} failed: {}", client_id, e);
                break;
            }
        }
        let _ = sink.close().await;
    });

    let reader_handle = handle.clone();
    let mut reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match ClientEvent::decode(&text) {
                    Some(event) => {
                        if reader_handle
                            .send(ServerMessage::Event { client_id, event })
                            .is_err()
                        {
                            break;
                        }
                    }
                    None => debug!("Dropping malformed frame from {}", client_id),
                },
                Ok(Message::Binary(_)) => {
                    warn!("Ignoring binary frame from {}", client_id);
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!("Receive from {} failed: {}", client_id, e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut writer => reader.abort(),
        _ = &mut reader => writer.abort(),
    }

    let _ = handle.send(ServerMessage::Disconnect { client_id });
}

async fn health(
    State(handle): State<ServerHandle>,
) -> Result<Json<HealthResponse>, (StatusCode, String)> {
    let status = handle
        .status()
        .await
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    Ok(Json(HealthResponse {
        status: "ok",
        message: "Tower Builder server is running",
        players: status.players,
        blocks: status.blocks,
    }))
}

async fn reset(
    State(handle): State<ServerHandle>,
) -> Result<Json<ResetResponse>, (StatusCode, String)> {
    handle
        .reset()
        .await
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))?;

    info!("Tower reset via admin endpoint");
    Ok(Json(ResetResponse {
        message: "Tower reset successfully",
    }))
}
