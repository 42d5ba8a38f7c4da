// Renderer bridge vocabulary.
//
// The bridge client talks to a local front-end over UDP in both directions:
// - `GuiInput` is one inbound datagram from the renderer. Datagrams are
//   tiny and fixed-size; anything that does not match its tag's exact size
//   is silently discarded rather than punished (the renderer is local and
//   trusted, just possibly buggy).
// - `LobbySnapshot` / `GameSnapshot` are the outbound state dumps the
//   client sends after each meaningful server frame, one datagram each,
//   distinguished by the leading byte (0 = lobby, 1 = game).

use std::collections::BTreeMap;

use crate::codec::Encode;
use crate::types::{Bomb, Direction, Player, PlayerId, Position, Score};

/// One input datagram from the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuiInput {
    PlaceBomb,
    PlaceBlock,
    Move(Direction),
}

impl GuiInput {
    /// Parse one datagram. Wrong length for the tag, an unknown tag, or a
    /// direction above 3 all yield `None`.
    pub fn parse(datagram: &[u8]) -> Option<Self> {
        match datagram {
            [0] => Some(Self::PlaceBomb),
            [1] => Some(Self::PlaceBlock),
            [2, direction] => Direction::from_tag(*direction).ok().map(Self::Move),
            _ => None,
        }
    }
}

/// Pre-game state for the renderer: advertised parameters plus the players
/// seated so far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LobbySnapshot {
    pub server_name: String,
    pub players_count: u8,
    pub size_x: u16,
    pub size_y: u16,
    pub game_length: u16,
    pub explosion_radius: u16,
    pub bomb_timer: u16,
    pub players: BTreeMap<PlayerId, Player>,
}

impl LobbySnapshot {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8];
        self.server_name.encode(&mut buf);
        self.players_count.encode(&mut buf);
        self.size_x.encode(&mut buf);
        self.size_y.encode(&mut buf);
        self.game_length.encode(&mut buf);
        self.explosion_radius.encode(&mut buf);
        self.bomb_timer.encode(&mut buf);
        self.players.encode(&mut buf);
        buf
    }
}

/// In-game state for the renderer, rebuilt after every turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSnapshot {
    pub server_name: String,
    pub size_x: u16,
    pub size_y: u16,
    pub game_length: u16,
    pub turn: u16,
    pub players: BTreeMap<PlayerId, Player>,
    pub player_positions: BTreeMap<PlayerId, Position>,
    pub blocks: Vec<Position>,
    /// Bomb values in ascending `BombId` order; ids themselves are of no
    /// use to the renderer.
    pub bombs: Vec<Bomb>,
    pub explosions: Vec<Position>,
    pub scores: BTreeMap<PlayerId, Score>,
}

impl GameSnapshot {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![1u8];
        self.server_name.encode(&mut buf);
        self.size_x.encode(&mut buf);
        self.size_y.encode(&mut buf);
        self.game_length.encode(&mut buf);
        self.turn.encode(&mut buf);
        self.players.encode(&mut buf);
        self.player_positions.encode(&mut buf);
        self.blocks.encode(&mut buf);
        self.bombs.encode(&mut buf);
        self.explosions.encode(&mut buf);
        self.scores.encode(&mut buf);
        buf
    }
}
