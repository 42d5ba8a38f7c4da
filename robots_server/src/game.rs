// Authoritative game loop and turn resolution.
//
// `GameState` holds one game's mutable board and exposes the resolution
// steps as plain methods, so the rules are testable without sockets or a
// hub. `GameManager` is the thin driver: it owns the RNG, waits for a full
// lobby, ticks turns on the wall clock, and publishes events through the
// hub.
//
// Determinism contract: given the same seed, parameters and per-turn input
// maps, the emitted event stream is bit-identical. Every iteration that
// produces events runs in ascending key order (`BTreeMap`/`BTreeSet`), and
// random draws happen in a fixed sequence (per player in ascending id
// order, x before y).

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info};
use robots_protocol::{Bomb, BombId, ClientMessage, Event, Player, PlayerId, Position, Score};

use crate::config::ServerParams;
use crate::hub::Hub;
use crate::rng::Lcg;

/// One game's mutable state, owned by the game manager.
#[derive(Debug, Default)]
struct GameState {
    bombs: BTreeMap<BombId, Bomb>,
    blocks: BTreeSet<Position>,
    player_pos: BTreeMap<PlayerId, Position>,
    scores: BTreeMap<PlayerId, Score>,
    next_bomb_id: BombId,
}

impl GameState {
    fn reset_scores(&mut self, players: &BTreeMap<PlayerId, Player>) {
        self.scores.clear();
        for &player_id in players.keys() {
            self.scores.insert(player_id, Score(0));
        }
    }

    /// Put every robot missing from the board onto a random cell, in
    /// ascending player id order. Covers both initial placement and the
    /// same-turn respawn after a death.
    fn place_missing_robots(
        &mut self,
        players: &BTreeMap<PlayerId, Player>,
        params: &ServerParams,
        rng: &mut Lcg,
        events: &mut Vec<Event>,
    ) {
        for &player_id in players.keys() {
            if !self.player_pos.contains_key(&player_id) {
                let position = random_position(rng, params);
                self.player_pos.insert(player_id, position);
                events.push(Event::PlayerMoved {
                    id: player_id,
                    position,
                });
            }
        }
    }

    /// Scatter the configured number of starting blocks. Duplicate draws
    /// coalesce in the set but still show up on the wire, one event per
    /// draw.
    fn place_initial_blocks(
        &mut self,
        params: &ServerParams,
        rng: &mut Lcg,
        events: &mut Vec<Event>,
    ) {
        for _ in 0..params.initial_blocks {
            let position = random_position(rng, params);
            self.blocks.insert(position);
            events.push(Event::BlockPlaced { position });
        }
    }

    /// Tick every bomb, exploding the ones whose timer has run out, in
    /// ascending bomb id order. Casualties are applied only after the scan,
    /// so every explosion this turn sees the turn-start board; inputs from
    /// robots destroyed here get skipped during interpretation.
    fn update_bombs(&mut self, params: &ServerParams, events: &mut Vec<Event>) {
        let exploding: Vec<BombId> = self
            .bombs
            .iter()
            .filter(|(_, bomb)| bomb.timer <= 1)
            .map(|(&id, _)| id)
            .collect();

        let mut robots_destroyed_total = BTreeSet::new();
        let mut blocks_destroyed_total = BTreeSet::new();

        for &id in &exploding {
            let area = self.explosion_area(self.bombs[&id].position, params);
            let robots: BTreeSet<PlayerId> = self
                .player_pos
                .iter()
                .filter(|(_, position)| area.contains(position))
                .map(|(&player_id, _)| player_id)
                .collect();
            let blocks: BTreeSet<Position> = area
                .iter()
                .filter(|position| self.blocks.contains(position))
                .copied()
                .collect();

            events.push(Event::BombExploded {
                id,
                robots_destroyed: robots.iter().copied().collect(),
                blocks_destroyed: blocks.iter().copied().collect(),
            });
            robots_destroyed_total.extend(robots);
            blocks_destroyed_total.extend(blocks);
        }

        for bomb in self.bombs.values_mut() {
            if bomb.timer > 1 {
                bomb.timer -= 1;
            }
        }
        for id in exploding {
            self.bombs.remove(&id);
        }
        for player_id in robots_destroyed_total {
            self.scores.entry(player_id).or_default().0 += 1;
            self.player_pos.remove(&player_id);
        }
        for position in blocks_destroyed_total {
            self.blocks.remove(&position);
        }
    }

    /// Cells affected by a bomb at `origin`: four axis-aligned arms of up
    /// to `explosion_radius` cells. A block is affected and terminates its
    /// arm; the bomb's own cell is always affected.
    fn explosion_area(&self, origin: Position, params: &ServerParams) -> BTreeSet<Position> {
        let mut affected = BTreeSet::new();
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            for r in 0..=i32::from(params.explosion_radius) {
                let x = i32::from(origin.x) + dx * r;
                let y = i32::from(origin.y) + dy * r;
                if x < 0 || x >= i32::from(params.size_x) || y < 0 || y >= i32::from(params.size_y)
                {
                    continue;
                }
                #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let position = Position {
                    x: x as u16,
                    y: y as u16,
                };
                affected.insert(position);
                if self.blocks.contains(&position) {
                    break;
                }
            }
        }
        affected
    }

    /// Resolve one player's input for this turn. Invalid gameplay (a move
    /// off the board or into a block, a block on a block) is silently
    /// ignored, never an error.
    fn interpret_input(
        &mut self,
        player_id: PlayerId,
        message: &ClientMessage,
        params: &ServerParams,
        events: &mut Vec<Event>,
    ) {
        // A robot destroyed earlier this turn has no say until it respawns.
        let Some(&position) = self.player_pos.get(&player_id) else {
            return;
        };

        match message {
            ClientMessage::Join { .. } => {}
            ClientMessage::PlaceBomb => {
                let id = self.next_bomb_id;
                self.bombs.insert(
                    id,
                    Bomb {
                        position,
                        timer: params.bomb_timer,
                    },
                );
                events.push(Event::BombPlaced { id, position });
                self.next_bomb_id = BombId(id.0 + 1);
            }
            ClientMessage::PlaceBlock => {
                if self.blocks.insert(position) {
                    events.push(Event::BlockPlaced { position });
                }
            }
            ClientMessage::Move { direction } => {
                let (dx, dy) = direction.delta();
                let x = i32::from(position.x) + dx;
                let y = i32::from(position.y) + dy;
                if x < 0 || x >= i32::from(params.size_x) || y < 0 || y >= i32::from(params.size_y)
                {
                    return;
                }
                #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let target = Position {
                    x: x as u16,
                    y: y as u16,
                };
                if !self.blocks.contains(&target) {
                    self.player_pos.insert(player_id, target);
                    events.push(Event::PlayerMoved {
                        id: player_id,
                        position: target,
                    });
                }
            }
        }
    }

    /// One mid-game turn: bombs first, then inputs, then respawns.
    fn resolve_turn(
        &mut self,
        inputs: &BTreeMap<PlayerId, ClientMessage>,
        players: &BTreeMap<PlayerId, Player>,
        params: &ServerParams,
        rng: &mut Lcg,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        self.update_bombs(params, &mut events);
        for (&player_id, message) in inputs {
            self.interpret_input(player_id, message, params, &mut events);
        }
        self.place_missing_robots(players, params, rng, &mut events);
        events
    }
}

fn random_position(rng: &mut Lcg, params: &ServerParams) -> Position {
    #[expect(clippy::cast_possible_truncation)]
    let x = (rng.next_u32() % u32::from(params.size_x)) as u16;
    #[expect(clippy::cast_possible_truncation)]
    let y = (rng.next_u32() % u32::from(params.size_y)) as u16;
    Position { x, y }
}

/// The single task that owns game state and drives the lobby-game-lobby
/// cycle forever.
pub struct GameManager {
    params: ServerParams,
    hub: Arc<Hub>,
    rng: Lcg,
}

impl GameManager {
    pub fn new(params: ServerParams, hub: Arc<Hub>) -> Self {
        let rng = Lcg::new(params.seed);
        Self { params, hub, rng }
    }

    pub fn run(mut self) -> ! {
        loop {
            let players = self.hub.wait_for_full_lobby();
            info!("game starting with {} players", players.len());

            let mut state = GameState::default();
            let mut initial_events = Vec::new();
            state.reset_scores(&players);
            state.place_missing_robots(&players, &self.params, &mut self.rng, &mut initial_events);
            state.place_initial_blocks(&self.params, &mut self.rng, &mut initial_events);
            self.hub.close_turn(0, initial_events);

            for turn in 1..=self.params.game_length {
                thread::sleep(Duration::from_millis(self.params.turn_duration));
                let inputs = self.hub.drain_turn_inputs();
                let events = state.resolve_turn(&inputs, &players, &self.params, &mut self.rng);
                debug!("turn {turn}: {} inputs, {} events", inputs.len(), events.len());
                self.hub.close_turn(turn, events);
            }

            info!("game over");
            self.hub.end_game(state.scores);
        }
    }
}
