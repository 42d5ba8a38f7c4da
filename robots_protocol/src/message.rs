// Protocol messages for client-server communication.
//
// Three enums define the full vocabulary of the TCP path:
// - `ClientMessage`: sent by game clients to the server.
// - `ServerMessage`: sent by the server to game clients.
// - `Event`: one entry in a `Turn`'s event list.
//
// Dispatch is by the leading tag byte. An unknown tag, or an out-of-range
// direction, decodes to `WireError::BadTag` and costs the offender its
// connection.

use std::collections::BTreeMap;
use std::io::Read;

use crate::codec::{Decode, Encode, WireError};
use crate::types::{BombId, Direction, Player, PlayerId, Position, Score};

/// Messages sent by a client to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientMessage {
    /// Ask for a seat in the lobby.
    Join { name: String },
    /// Drop a bomb on the player's current cell.
    PlaceBomb,
    /// Put a block on the player's current cell.
    PlaceBlock,
    /// Step one cell in a cardinal direction.
    Move { direction: Direction },
}

impl Encode for ClientMessage {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Join { name } => {
                buf.push(0);
                name.encode(buf);
            }
            Self::PlaceBomb => buf.push(1),
            Self::PlaceBlock => buf.push(2),
            Self::Move { direction } => {
                buf.push(3);
                buf.push(direction.tag());
            }
        }
    }
}

impl Decode for ClientMessage {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        match u8::decode(r)? {
            0 => Ok(Self::Join {
                name: String::decode(r)?,
            }),
            1 => Ok(Self::PlaceBomb),
            2 => Ok(Self::PlaceBlock),
            3 => Ok(Self::Move {
                direction: Direction::from_tag(u8::decode(r)?)?,
            }),
            tag => Err(WireError::BadTag {
                kind: "client message",
                tag,
            }),
        }
    }
}

/// Messages sent by the server to game clients.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ServerMessage {
    /// Server parameters, sent immediately after the connection is accepted.
    Hello {
        server_name: String,
        players_count: u8,
        size_x: u16,
        size_y: u16,
        game_length: u16,
        explosion_radius: u16,
        bomb_timer: u16,
    },
    /// A player took a seat in the lobby.
    AcceptedPlayer { id: PlayerId, player: Player },
    /// The lobby filled and a game began.
    GameStarted {
        players: BTreeMap<PlayerId, Player>,
    },
    /// One resolved turn.
    Turn { turn: u16, events: Vec<Event> },
    /// The game finished; final scores.
    GameEnded {
        scores: BTreeMap<PlayerId, Score>,
    },
}

impl Encode for ServerMessage {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Hello {
                server_name,
                players_count,
                size_x,
                size_y,
                game_length,
                explosion_radius,
                bomb_timer,
            } => {
                buf.push(0);
                server_name.encode(buf);
                players_count.encode(buf);
                size_x.encode(buf);
                size_y.encode(buf);
                game_length.encode(buf);
                explosion_radius.encode(buf);
                bomb_timer.encode(buf);
            }
            Self::AcceptedPlayer { id, player } => {
                buf.push(1);
                id.encode(buf);
                player.encode(buf);
            }
            Self::GameStarted { players } => {
                buf.push(2);
                players.encode(buf);
            }
            Self::Turn { turn, events } => {
                buf.push(3);
                turn.encode(buf);
                events.encode(buf);
            }
            Self::GameEnded { scores } => {
                buf.push(4);
                scores.encode(buf);
            }
        }
    }
}

impl Decode for ServerMessage {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        match u8::decode(r)? {
            0 => Ok(Self::Hello {
                server_name: String::decode(r)?,
                players_count: u8::decode(r)?,
                size_x: u16::decode(r)?,
                size_y: u16::decode(r)?,
                game_length: u16::decode(r)?,
                explosion_radius: u16::decode(r)?,
                bomb_timer: u16::decode(r)?,
            }),
            1 => Ok(Self::AcceptedPlayer {
                id: PlayerId::decode(r)?,
                player: Player::decode(r)?,
            }),
            2 => Ok(Self::GameStarted {
                players: BTreeMap::decode(r)?,
            }),
            3 => Ok(Self::Turn {
                turn: u16::decode(r)?,
                events: Vec::decode(r)?,
            }),
            4 => Ok(Self::GameEnded {
                scores: BTreeMap::decode(r)?,
            }),
            tag => Err(WireError::BadTag {
                kind: "server message",
                tag,
            }),
        }
    }
}

/// One thing that happened during a turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    BombPlaced {
        id: BombId,
        position: Position,
    },
    BombExploded {
        id: BombId,
        robots_destroyed: Vec<PlayerId>,
        blocks_destroyed: Vec<Position>,
    },
    PlayerMoved {
        id: PlayerId,
        position: Position,
    },
    BlockPlaced {
        position: Position,
    },
}

impl Encode for Event {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Self::BombPlaced { id, position } => {
                buf.push(0);
                id.encode(buf);
                position.encode(buf);
            }
            Self::BombExploded {
                id,
                robots_destroyed,
                blocks_destroyed,
            } => {
                buf.push(1);
                id.encode(buf);
                robots_destroyed.encode(buf);
                blocks_destroyed.encode(buf);
            }
            Self::PlayerMoved { id, position } => {
                buf.push(2);
                id.encode(buf);
                position.encode(buf);
            }
            Self::BlockPlaced { position } => {
                buf.push(3);
                position.encode(buf);
            }
        }
    }
}

impl Decode for Event {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        match u8::decode(r)? {
            0 => Ok(Self::BombPlaced {
                id: BombId::decode(r)?,
                position: Position::decode(r)?,
            }),
            1 => Ok(Self::BombExploded {
                id: BombId::decode(r)?,
                robots_destroyed: Vec::decode(r)?,
                blocks_destroyed: Vec::decode(r)?,
            }),
            2 => Ok(Self::PlayerMoved {
                id: PlayerId::decode(r)?,
                position: Position::decode(r)?,
            }),
            3 => Ok(Self::BlockPlaced {
                position: Position::decode(r)?,
            }),
            tag => Err(WireError::BadTag { kind: "event", tag }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn client_roundtrip(msg: &ClientMessage) {
        let mut wire = Vec::new();
        msg.encode(&mut wire);
        let mut cursor = Cursor::new(&wire);
        let recovered = ClientMessage::decode(&mut cursor).unwrap();
        assert_eq!(&recovered, msg);
        assert_eq!(cursor.position() as usize, wire.len());
    }

    fn server_roundtrip(msg: &ServerMessage) {
        let mut wire = Vec::new();
        msg.encode(&mut wire);
        let mut cursor = Cursor::new(&wire);
        let recovered = ServerMessage::decode(&mut cursor).unwrap();
        assert_eq!(&recovered, msg);
        assert_eq!(cursor.position() as usize, wire.len());
    }

    #[test]
    fn roundtrip_join() {
        client_roundtrip(&ClientMessage::Join {
            name: "robot".into(),
        });
    }

    #[test]
    fn roundtrip_simple_actions() {
        client_roundtrip(&ClientMessage::PlaceBomb);
        client_roundtrip(&ClientMessage::PlaceBlock);
        client_roundtrip(&ClientMessage::Move {
            direction: Direction::Left,
        });
    }

    #[test]
    fn join_layout() {
        let mut wire = Vec::new();
        ClientMessage::Join { name: "ab".into() }.encode(&mut wire);
        assert_eq!(wire, [0, 2, b'a', b'b']);
    }

    #[test]
    fn move_layout() {
        let mut wire = Vec::new();
        ClientMessage::Move {
            direction: Direction::Down,
        }
        .encode(&mut wire);
        assert_eq!(wire, [3, 2]);
    }

    #[test]
    fn client_message_rejects_unknown_tag() {
        let mut cursor = Cursor::new(vec![4u8]);
        assert!(matches!(
            ClientMessage::decode(&mut cursor),
            Err(WireError::BadTag {
                kind: "client message",
                tag: 4
            })
        ));
    }

    #[test]
    fn move_rejects_direction_out_of_range() {
        let mut cursor = Cursor::new(vec![3u8, 4u8]);
        assert!(matches!(
            ClientMessage::decode(&mut cursor),
            Err(WireError::BadTag {
                kind: "direction",
                tag: 4
            })
        ));
    }

    #[test]
    fn roundtrip_hello() {
        server_roundtrip(&ServerMessage::Hello {
            server_name: "arena".into(),
            players_count: 4,
            size_x: 20,
            size_y: 10,
            game_length: 500,
            explosion_radius: 3,
            bomb_timer: 5,
        });
    }

    #[test]
    fn roundtrip_accepted_player() {
        server_roundtrip(&ServerMessage::AcceptedPlayer {
            id: PlayerId(2),
            player: Player {
                name: "robot".into(),
                address: "[::1]:9000".into(),
            },
        });
    }

    #[test]
    fn roundtrip_game_started() {
        let mut players = BTreeMap::new();
        players.insert(
            PlayerId(0),
            Player {
                name: "a".into(),
                address: "x:1".into(),
            },
        );
        players.insert(
            PlayerId(1),
            Player {
                name: "b".into(),
                address: "y:2".into(),
            },
        );
        server_roundtrip(&ServerMessage::GameStarted { players });
    }

    #[test]
    fn roundtrip_turn_with_every_event() {
        server_roundtrip(&ServerMessage::Turn {
            turn: 17,
            events: vec![
                Event::BombPlaced {
                    id: BombId(0),
                    position: Position { x: 1, y: 2 },
                },
                Event::BombExploded {
                    id: BombId(0),
                    robots_destroyed: vec![PlayerId(0), PlayerId(3)],
                    blocks_destroyed: vec![Position { x: 1, y: 3 }],
                },
                Event::PlayerMoved {
                    id: PlayerId(1),
                    position: Position { x: 4, y: 4 },
                },
                Event::BlockPlaced {
                    position: Position { x: 0, y: 0 },
                },
            ],
        });
    }

    #[test]
    fn roundtrip_game_ended() {
        let mut scores = BTreeMap::new();
        scores.insert(PlayerId(0), Score(3));
        scores.insert(PlayerId(1), Score(0));
        server_roundtrip(&ServerMessage::GameEnded { scores });
    }

    #[test]
    fn turn_layout_pins_event_tags() {
        let mut wire = Vec::new();
        ServerMessage::Turn {
            turn: 1,
            events: vec![Event::BlockPlaced {
                position: Position { x: 2, y: 3 },
            }],
        }
        .encode(&mut wire);
        // tag, turn, event count, event tag, x, y
        assert_eq!(wire, [3, 0, 1, 0, 0, 0, 1, 3, 0, 2, 0, 3]);
    }

    #[test]
    fn event_rejects_unknown_tag() {
        let mut cursor = Cursor::new(vec![9u8]);
        assert!(matches!(
            Event::decode(&mut cursor),
            Err(WireError::BadTag { kind: "event", tag: 9 })
        ));
    }
}
