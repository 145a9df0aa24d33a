use log::debug;
use shared::{Block, ClientId, PlayerInfo, ServerEvent};

/// Local mirror of the server's tower and roster
///
/// Everything here is a cache. A `GameState` sync replaces it wholesale, and
/// every other event is applied additively in arrival order. Placements are
/// never predicted locally, so the server's echo of our own block is simply
/// appended like anyone else's.
#[derive(Debug, Clone, Default)]
pub struct ClientGameState {
    pub self_id: Option<ClientId>,
    pub blocks: Vec<Block>,
    pub players: Vec<PlayerInfo>,
    pub max_height: i64,
    synced: bool,
}

impl ClientGameState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &ServerEvent) {
        match event {
            ServerEvent::GameState {
                self_id,
                tower,
                players,
                max_height,
            } => {
                self.self_id = Some(*self_id);
                self.blocks = tower.clone();
                self.players = players.clone();
                self.max_height = *max_height;
                self.synced = true;
                debug!(
                    "Synced: {} blocks, {} players, height {}",
                    self.blocks.len(),
                    self.players.len(),
                    self.max_height
                );
            }
            ServerEvent::BlockPlaced(block) => {
                self.max_height = self.max_height.max(block.y);
                self.blocks.push(block.clone());
            }
            ServerEvent::MaxHeightUpdated(height) => {
                self.max_height = *height;
            }
            ServerEvent::PlayerJoined(player) => {
                match self.players.iter_mut().find(|p| p.id == player.id) {
                    Some(existing) => *existing = player.clone(),
                    None => self.players.push(player.clone()),
                }
            }
            ServerEvent::PlayerLeft(id) => {
                self.players.retain(|p| p.id != *id);
            }
            ServerEvent::PlayerNameChanged { id, name } => {
                if let Some(player) = self.player_mut(id) {
                    player.name = name.clone();
                }
            }
            ServerEvent::PlayerMoved { id, position } => {
                if let Some(player) = self.player_mut(id) {
                    player.position = Some(*position);
                }
            }
            ServerEvent::TowerReset => {
                self.blocks.clear();
                self.max_height = 0;
            }
        }
    }

    pub fn is_synced(&self) -> bool {
        self.synced
    }

    pub fn player(&self, id: &ClientId) -> Option<&PlayerInfo> {
        self.players.iter().find(|p| p.id == *id)
    }

    fn player_mut(&mut self, id: &ClientId) -> Option<&mut PlayerInfo> {
        self.players.iter_mut().find(|p| p.id == *id)
    }

    /// Our own roster entry, once synced
    pub fn me(&self) -> Option<&PlayerInfo> {
        self.self_id.as_ref().and_then(|id| self.player(id))
    }

    /// Height at which the next stacked block goes
    pub fn stack_height(&self) -> i64 {
        if self.blocks.is_empty() {
            0
        } else {
            self.max_height + 1
        }
    }

    pub fn blocks_by(&self, id: &ClientId) -> usize {
        self.blocks.iter().filter(|b| b.player_id == *id).count()
    }
}
