// robots_server — authoritative game server for Robots.
//
// Architecture: blocking I/O with one thread per role.
//
// - **Acceptor thread** (`net::serve`): accepts TCP connections; each one
//   gets a fresh client id, an outbound queue seeded with the message
//   history, and a sender/receiver thread pair.
// - **Receiver threads** (one per client): decode `ClientMessage` frames
//   and feed the hub (Join goes to lobby admission, everything else becomes
//   the client's pending input for the current turn).
// - **Sender threads** (one per client): pop from the client's queue,
//   encode, write. A closed queue drains as end-of-stream.
// - **Game manager** (main thread): the only game-state owner. Waits for a
//   full lobby, then resolves one turn per `turn_duration` tick and
//   publishes results through the hub.
//
// All cross-thread state lives in the `Hub` behind a single mutex; blocking
// operations (socket I/O, queue pops, the lobby condvar wait, the turn
// sleep) never hold it.

pub mod config;
pub mod game;
pub mod hub;
pub mod net;
pub mod queue;
pub mod rng;
