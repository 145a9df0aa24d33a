use crate::game::ClientGameState;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use shared::{BlockRequest, ClientEvent, ClientId, ServerEvent};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode event: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("connection closed before the initial game state arrived")]
    Closed,
}

/// What a headless builder does once connected
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Display name to request right after joining
    pub name: Option<String>,
    /// Number of blocks to stack before leaving; zero watches until the server closes
    pub blocks: u32,
    /// Delay between placements
    pub interval: Duration,
    /// Block color; defaults to the color the server assigned us
    pub color: Option<String>,
}

impl Default for BuildPlan {
    fn default() -> Self {
        Self {
            name: None,
            blocks: 10,
            interval: Duration::from_millis(500),
            color: None,
        }
    }
}

enum Step {
    Event(Option<ServerEvent>),
    Place,
}

/// Headless tower client
///
/// Holds one WebSocket connection and a local mirror kept up to date from
/// every server event it reads.
pub struct Client {
    socket: WsStream,
    game_state: ClientGameState,
}

impl Client {
    /// Connects and waits for the initial `gameState` sync
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        info!("Connecting to {}", url);
        let (socket, _response) = connect_async(url).await?;

        let mut client = Self {
            socket,
            game_state: ClientGameState::new(),
        };

        while !client.game_state.is_synced() {
            if client.next_event().await?.is_none() {
                return Err(ClientError::Closed);
            }
        }

        if let Some(me) = client.game_state.me() {
            info!("Joined as '{}' ({}) with color {}", me.name, me.id, me.color);
        }
        Ok(client)
    }

    pub fn state(&self) -> &ClientGameState {
        &self.game_state
    }

    pub async fn send(&mut self, event: &ClientEvent) -> Result<(), ClientError> {
        let text = event.to_json()?;
        self.socket.send(Message::Text(text)).await?;
        Ok(())
    }

    pub async fn place_block(&mut self, request: BlockRequest) -> Result<(), ClientError> {
        self.send(&ClientEvent::PlaceBlock(request)).await
    }

    pub async fn rename(&mut self, name: impl Into<String>) -> Result<(), ClientError> {
        self.send(&ClientEvent::ChangeName(name.into())).await
    }

    /// Reads the next server event and applies it to the mirror
    ///
    /// Returns `Ok(None)` once the server closes the connection. Frames that
    /// do not decode as a known event are logged and skipped.
    pub async fn next_event(&mut self) -> Result<Option<ServerEvent>, ClientError> {
        loop {
            let message = match self.socket.next().await {
                Some(message) => message?,
                None => return Ok(None),
            };

            match message {
                Message::Text(text) => match ServerEvent::from_json(&text) {
                    Ok(event) => {
                        self.game_state.apply(&event);
                        return Ok(Some(event));
                    }
                    Err(e) => warn!("Ignoring unrecognized server frame: {}", e),
                },
                Message::Close(_) => return Ok(None),
                _ => {}
            }
        }
    }

    /// Runs a build plan to completion
    ///
    /// Each block is stacked one above the mirror's current maximum height.
    /// The loop ends once every placed block has been echoed back, or when
    /// the server goes away. Echoes are counted as they arrive, so a tower
    /// reset in the middle of the run does not lose track of them.
    pub async fn run(&mut self, plan: &BuildPlan) -> Result<(), ClientError> {
        let self_id = match self.game_state.self_id {
            Some(id) => id,
            None => return Err(ClientError::Closed),
        };

        if let Some(name) = &plan.name {
            self.rename(name.clone()).await?;
        }

        let color = match (&plan.color, self.game_state.me()) {
            (Some(color), _) => color.clone(),
            (None, Some(me)) => me.color.clone(),
            (None, None) => "#ffffff".to_string(),
        };

        let mut placed = 0u32;
        let mut echoed = 0u32;
        let mut ticker = tokio::time::interval(plan.interval.max(Duration::from_millis(1)));

        loop {
            let step = tokio::select! {
                event = self.next_event() => Step::Event(event?),
                _ = ticker.tick(), if placed < plan.blocks => Step::Place,
            };

            match step {
                Step::Event(None) => {
                    info!("Server closed the connection");
                    break;
                }
                Step::Event(Some(event)) => {
                    log_event(&event);
                    if is_own_block(&event, &self_id) {
                        echoed += 1;
                    }
                    if plan.blocks > 0 && placed == plan.blocks && echoed >= plan.blocks {
                        info!(
                            "All {} blocks placed, tower height {}",
                            placed, self.game_state.max_height
                        );
                        break;
                    }
                }
                Step::Place => {
                    let y = self.game_state.stack_height();
                    self.place_block(BlockRequest::new(0.0, y as f64, 0.0, color.clone()))
                        .await?;
                    placed += 1;
                    debug!("Placed block {}/{} at y={}", placed, plan.blocks, y);
                }
            }
        }

        Ok(())
    }

    /// Sends a close frame and waits for the server to finish the handshake
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.socket.close(None).await?;
        while let Some(message) = self.socket.next().await {
            if message.is_err() {
                break;
            }
        }
        Ok(())
    }
}

fn is_own_block(event: &ServerEvent, self_id: &ClientId) -> bool {
    matches!(event, ServerEvent::BlockPlaced(block) if block.player_id == *self_id)
}

fn log_event(event: &ServerEvent) {
    match event {
        ServerEvent::GameState { tower, players, .. } => {
            info!("Resynced: {} blocks, {} players", tower.len(), players.len());
        }
        ServerEvent::BlockPlaced(block) => {
            debug!("Block at ({}, {}, {}) by {}", block.x, block.y, block.z, block.player_id);
        }
        ServerEvent::MaxHeightUpdated(height) => debug!("Tower height {}", height),
        ServerEvent::PlayerJoined(player) => info!("{} joined", player.name),
        ServerEvent::PlayerLeft(id) => info!("Player {} left", id),
        ServerEvent::PlayerNameChanged { id, name } => info!("Player {} is now '{}'", id, name),
        ServerEvent::PlayerMoved { id, position } => {
            debug!("Player {} moved to ({}, {}, {})", id, position.x, position.y, position.z);
        }
        ServerEvent::TowerReset => info!("Tower was reset"),
    }
}
