// Mirrored game state, shared by the two reader threads.
//
// `ClientState` tracks everything the renderer needs: the advertised server
// parameters, the lobby roster, and during a game the board contents plus
// the per-turn explosion overlay. Server frames mutate it under the lock;
// each mutation that the GUI should see yields an encoded snapshot datagram
// for the caller to send.

use std::collections::{BTreeMap, BTreeSet};

use robots_protocol::{
    Bomb, BombId, ClientMessage, Event, GameSnapshot, GuiInput, LobbySnapshot, Player, PlayerId,
    Position, Score, ServerMessage,
};

pub struct ClientState {
    pub player_name: String,
    pub is_lobby: bool,

    // Advertised parameters, set on Hello.
    pub server_name: String,
    pub players_count: u8,
    pub size_x: u16,
    pub size_y: u16,
    pub game_length: u16,
    pub explosion_radius: u16,
    pub bomb_timer: u16,

    // Game mirror.
    pub turn: u16,
    pub players: BTreeMap<PlayerId, Player>,
    pub player_positions: BTreeMap<PlayerId, Position>,
    pub blocks: BTreeSet<Position>,
    pub bombs: BTreeMap<BombId, Bomb>,
    pub explosions: BTreeSet<Position>,
    pub scores: BTreeMap<PlayerId, Score>,

    // Aggregated from the event list of the current Turn frame.
    robots_destroyed_in_turn: BTreeSet<PlayerId>,
    blocks_destroyed_in_turn: BTreeSet<Position>,
}

impl ClientState {
    pub fn new(player_name: String) -> Self {
        Self {
            player_name,
            is_lobby: true,
            server_name: String::new(),
            players_count: 0,
            size_x: 0,
            size_y: 0,
            game_length: 0,
            explosion_radius: 0,
            bomb_timer: 0,
            turn: 0,
            players: BTreeMap::new(),
            player_positions: BTreeMap::new(),
            blocks: BTreeSet::new(),
            bombs: BTreeMap::new(),
            explosions: BTreeSet::new(),
            scores: BTreeMap::new(),
            robots_destroyed_in_turn: BTreeSet::new(),
            blocks_destroyed_in_turn: BTreeSet::new(),
        }
    }

    /// Apply one server frame. Returns the snapshot datagram to forward to
    /// the GUI, or `None` for frames the GUI does not hear about
    /// (GameStarted: the GUI first learns of the game when Turn 0 arrives).
    pub fn handle_server_message(&mut self, message: ServerMessage) -> Option<Vec<u8>> {
        match message {
            ServerMessage::Hello {
                server_name,
                players_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
            } => {
                self.server_name = server_name;
                self.players_count = players_count;
                self.size_x = size_x;
                self.size_y = size_y;
                self.game_length = game_length;
                self.explosion_radius = explosion_radius;
                self.bomb_timer = bomb_timer;
                Some(self.snapshot())
            }
            ServerMessage::AcceptedPlayer { id, player } => {
                self.players.insert(id, player);
                Some(self.snapshot())
            }
            ServerMessage::GameStarted { players } => {
                self.on_game_started(players);
                None
            }
            ServerMessage::Turn { turn, events } => {
                self.on_turn(turn, events);
                Some(self.snapshot())
            }
            ServerMessage::GameEnded { scores } => {
                self.on_game_ended(scores);
                Some(self.snapshot())
            }
        }
    }

    /// Translate a renderer input into the message for the server. While
    /// the lobby is open every input doubles as the join request.
    pub fn translate_input(&self, input: GuiInput) -> ClientMessage {
        if self.is_lobby {
            return ClientMessage::Join {
                name: self.player_name.clone(),
            };
        }
        match input {
            GuiInput::PlaceBomb => ClientMessage::PlaceBomb,
            GuiInput::PlaceBlock => ClientMessage::PlaceBlock,
            GuiInput::Move(direction) => ClientMessage::Move { direction },
        }
    }

    fn on_game_started(&mut self, players: BTreeMap<PlayerId, Player>) {
        self.is_lobby = false;
        self.blocks.clear();
        self.bombs.clear();
        self.explosions.clear();
        self.player_positions.clear();
        self.scores.clear();
        for &player_id in players.keys() {
            self.scores.insert(player_id, Score(0));
        }
        self.players = players;
    }

    fn on_turn(&mut self, turn: u16, events: Vec<Event>) {
        self.turn = turn;
        self.explosions.clear();
        self.robots_destroyed_in_turn.clear();
        self.blocks_destroyed_in_turn.clear();

        // Countdown runs before the events, so a bomb placed this turn
        // keeps its full fuse.
        for bomb in self.bombs.values_mut() {
            bomb.timer = bomb.timer.saturating_sub(1);
        }

        for event in events {
            self.apply_event(event);
        }

        // Settle the turn's casualties: one point per destroyed robot,
        // destroyed blocks leave the board.
        let Self {
            robots_destroyed_in_turn,
            blocks_destroyed_in_turn,
            scores,
            blocks,
            ..
        } = self;
        for player_id in robots_destroyed_in_turn.iter() {
            scores.entry(*player_id).or_default().0 += 1;
        }
        for position in blocks_destroyed_in_turn.iter() {
            blocks.remove(position);
        }
    }

    fn apply_event(&mut self, event: Event) {
        match event {
            Event::BombPlaced { id, position } => {
                self.bombs.insert(
                    id,
                    Bomb {
                        position,
                        timer: self.bomb_timer,
                    },
                );
            }
            Event::BombExploded {
                id,
                robots_destroyed,
                blocks_destroyed,
            } => {
                if let Some(bomb) = self.bombs.remove(&id) {
                    self.mark_explosion(bomb.position);
                }
                for position in blocks_destroyed {
                    self.blocks_destroyed_in_turn.insert(position);
                }
                for player_id in robots_destroyed {
                    self.robots_destroyed_in_turn.insert(player_id);
                    self.player_positions.remove(&player_id);
                }
            }
            Event::PlayerMoved { id, position } => {
                self.player_positions.insert(id, position);
            }
            Event::BlockPlaced { position } => {
                self.blocks.insert(position);
            }
        }
    }

    /// Explosion cross for the renderer, mirroring the server's rule: four
    /// arms of up to `explosion_radius` cells, each stopped by (and
    /// including) the first block. Blocks destroyed this turn are still
    /// standing here; they only leave the board after the event list.
    fn mark_explosion(&mut self, origin: Position) {
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            for r in 0..=i32::from(self.explosion_radius) {
                let x = i32::from(origin.x) + dx * r;
                let y = i32::from(origin.y) + dy * r;
                if x < 0 || x >= i32::from(self.size_x) || y < 0 || y >= i32::from(self.size_y) {
                    continue;
                }
                #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let position = Position {
                    x: x as u16,
                    y: y as u16,
                };
                self.explosions.insert(position);
                if self.blocks.contains(&position) {
                    break;
                }
            }
        }
    }

    fn on_game_ended(&mut self, scores: BTreeMap<PlayerId, Score>) {
        self.is_lobby = true;
        self.scores = scores;
        self.players.clear();
        self.blocks.clear();
        self.bombs.clear();
        self.explosions.clear();
    }

    /// Encode the state for the GUI, as a lobby or game snapshot depending
    /// on the phase.
    pub fn snapshot(&self) -> Vec<u8> {
        if self.is_lobby {
            LobbySnapshot {
                server_name: self.server_name.clone(),
                players_count: self.players_count,
                size_x: self.size_x,
                size_y: self.size_y,
                game_length: self.game_length,
                explosion_radius: self.explosion_radius,
                bomb_timer: self.bomb_timer,
                players: self.players.clone(),
            }
            .encode()
        } else {
            GameSnapshot {
                server_name: self.server_name.clone(),
                size_x: self.size_x,
                size_y: self.size_y,
                game_length: self.game_length,
                turn: self.turn,
                players: self.players.clone(),
                player_positions: self.player_positions.clone(),
                blocks: self.blocks.iter().copied().collect(),
                bombs: self.bombs.values().copied().collect(),
                explosions: self.explosions.iter().copied().collect(),
                scores: self.scores.clone(),
            }
            .encode()
        }
    }
}
