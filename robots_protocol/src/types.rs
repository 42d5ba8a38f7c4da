// Core value types shared by every protocol message.
//
// Ids are compact newtypes with derived ordering so they can key
// `BTreeMap`/`BTreeSet`: the wire format requires ascending key order for
// mappings, and ordered containers give it for free.

use std::io::Read;

use crate::codec::{Decode, Encode, WireError};

/// Game-scoped player identifier, assigned on lobby admission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(pub u8);

/// Session-unique bomb identifier, monotonically increasing from 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BombId(pub u32);

/// Number of times a player's robot has been destroyed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(pub u32);

/// A cell on the board. Ordered by `(x, y)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: u16,
    pub y: u16,
}

/// Public identity of an admitted player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub address: String,
}

/// A ticking bomb on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bomb {
    pub position: Position,
    pub timer: u16,
}

/// A move direction, one wire tag per cardinal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub fn from_tag(tag: u8) -> Result<Self, WireError> {
        match tag {
            0 => Ok(Self::Up),
            1 => Ok(Self::Right),
            2 => Ok(Self::Down),
            3 => Ok(Self::Left),
            _ => Err(WireError::BadTag {
                kind: "direction",
                tag,
            }),
        }
    }

    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Board-coordinate delta, with y growing upwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, 1),
            Self::Down => (0, -1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

impl Encode for PlayerId {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.0.encode(buf);
    }
}

impl Decode for PlayerId {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        Ok(Self(u8::decode(r)?))
    }
}

impl Encode for BombId {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.0.encode(buf);
    }
}

impl Decode for BombId {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        Ok(Self(u32::decode(r)?))
    }
}

impl Encode for Score {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.0.encode(buf);
    }
}

impl Decode for Score {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        Ok(Self(u32::decode(r)?))
    }
}

impl Encode for Position {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.x.encode(buf);
        self.y.encode(buf);
    }
}

impl Decode for Position {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        let x = u16::decode(r)?;
        let y = u16::decode(r)?;
        Ok(Self { x, y })
    }
}

impl Encode for Player {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.name.encode(buf);
        self.address.encode(buf);
    }
}

impl Decode for Player {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        let name = String::decode(r)?;
        let address = String::decode(r)?;
        Ok(Self { name, address })
    }
}

impl Encode for Bomb {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.position.encode(buf);
        self.timer.encode(buf);
    }
}

impl Decode for Bomb {
    fn decode(r: &mut impl Read) -> Result<Self, WireError> {
        let position = Position::decode(r)?;
        let timer = u16::decode(r)?;
        Ok(Self { position, timer })
    }
}
