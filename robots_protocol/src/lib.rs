// robots_protocol — wire protocol for the Robots game.
//
// This crate defines the value types, binary codec, and message vocabulary
// shared by the game server and the bridge client. It is pure data plumbing:
// no sockets, no threads, no game rules.
//
// Module overview:
// - `types.rs`:   Core value types: `PlayerId`, `BombId`, `Score`,
//                 `Position`, `Player`, `Bomb`, `Direction`.
// - `codec.rs`:   Big-endian binary codec, the `Encode`/`Decode` traits and
//                 their implementations for primitives, strings, lists and
//                 mappings.
// - `message.rs`: Client-to-server and server-to-client message enums plus
//                 the in-turn `Event` enum, one variant per wire tag.
// - `gui.rs`:     The renderer bridge vocabulary: input datagrams from the
//                 front-end and the lobby/game snapshots sent back to it.
//
// Design decisions:
// - **Self-delimiting messages.** Every message starts with a tag byte and
//   all variable-size fields carry length prefixes, so the TCP path needs no
//   outer framing and decoding can run straight off a buffered stream.
// - **Ordered containers.** Mappings serialize in ascending key order;
//   `BTreeMap`/`BTreeSet` supply that ordering for free, so encoding is
//   deterministic by construction.
// - **Fatal decode errors.** A failed decode poisons the stream it came
//   from. Callers drop the connection rather than attempt to resynchronize.

pub mod codec;
pub mod gui;
pub mod message;
pub mod types;

pub use codec::{Decode, Encode, WireError};
pub use gui::{GameSnapshot, GuiInput, LobbySnapshot};
pub use message::{ClientMessage, Event, ServerMessage};
pub use types::{Bomb, BombId, Direction, Player, PlayerId, Position, Score};
