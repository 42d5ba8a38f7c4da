// Cross-thread coordination point for the whole server.
//
// The hub is the only holder of cross-task state: client bookkeeping, lobby
// seats, per-client outbound queues, the pending input of each client for
// the current turn, and the replayable message history. Everything sits
// behind one mutex; the "enough players joined" condvar is the only other
// synchronization primitive.
//
// The message history is what makes late joiners consistent: every queue is
// created pre-loaded with it, so a client connecting mid-session replays
// the full prologue (Hello, then either the lobby admissions so far or the
// whole game transcript) before seeing live broadcasts. The history resets
// to a lone Hello whenever the session returns to the lobby, which bounds
// it by one game's worth of broadcasts.
//
// Locking discipline: no blocking operation (socket I/O, queue pop, turn
// sleep) ever runs under the hub mutex. Broadcasts only clone `Arc`s into
// queues and return.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use log::{debug, info};
use robots_protocol::{ClientMessage, Event, Player, PlayerId, Score, ServerMessage};

use crate::config::ServerParams;
use crate::queue::MessageQueue;

/// Connection-scoped identifier, distinct from the game-scoped `PlayerId`.
/// Never recycled within a server process.
pub type ClientId = u64;

pub struct Hub {
    params: ServerParams,
    state: Mutex<HubState>,
    players_joined: Condvar,
}

struct HubState {
    next_client_id: ClientId,
    is_lobby: bool,
    players: BTreeMap<PlayerId, Player>,
    seats: HashMap<ClientId, PlayerId>,
    queues: HashMap<ClientId, Arc<MessageQueue>>,
    last_inputs: HashMap<ClientId, ClientMessage>,
    history: Vec<Arc<ServerMessage>>,
}

impl Hub {
    pub fn new(params: ServerParams) -> Self {
        let history = vec![Arc::new(params.hello())];
        Self {
            params,
            state: Mutex::new(HubState {
                next_client_id: 0,
                is_lobby: true,
                players: BTreeMap::new(),
                seats: HashMap::new(),
                queues: HashMap::new(),
                last_inputs: HashMap::new(),
                history,
            }),
            players_joined: Condvar::new(),
        }
    }

    /// Assign a fresh id to a newly accepted connection.
    pub fn accept_client(&self) -> ClientId {
        let mut st = self.lock();
        let id = st.next_client_id;
        st.next_client_id += 1;
        id
    }

    /// Create the client's outbound queue, seeded with the history snapshot
    /// so the new client replays the full session prologue.
    pub fn create_queue(&self, client_id: ClientId) -> Arc<MessageQueue> {
        let mut st = self.lock();
        debug_assert!(!st.queues.contains_key(&client_id));
        let queue = Arc::new(MessageQueue::seeded(&st.history));
        st.queues.insert(client_id, queue.clone());
        queue
    }

    /// Lobby admission. Ignored outside the lobby, for clients that already
    /// hold a seat, and once all seats are taken.
    pub fn try_accept_player(&self, client_id: ClientId, name: String, address: String) {
        let mut st = self.lock();
        if !st.is_lobby
            || st.seats.contains_key(&client_id)
            || st.seats.len() >= usize::from(self.params.players_count)
        {
            return;
        }

        #[expect(clippy::cast_possible_truncation)]
        let player_id = PlayerId(st.seats.len() as u8);
        let player = Player { name, address };
        info!(
            "client {client_id} seated as player {} ({} from {})",
            player_id.0, player.name, player.address
        );

        st.seats.insert(client_id, player_id);
        st.players.insert(player_id, player.clone());
        st.broadcast(ServerMessage::AcceptedPlayer {
            id: player_id,
            player,
        });
        self.players_joined.notify_all();
    }

    /// Record the client's most recent input for the current turn,
    /// overwriting any previous one. Join never lands here; the receiver
    /// routes it to `try_accept_player` instead.
    pub fn set_last_message(&self, client_id: ClientId, message: ClientMessage) {
        let mut st = self.lock();
        st.last_inputs.insert(client_id, message);
    }

    /// Atomically take the pending inputs, keyed by seat. Inputs from
    /// clients that never took a seat are dropped.
    pub fn drain_turn_inputs(&self) -> BTreeMap<PlayerId, ClientMessage> {
        let mut guard = self.lock();
        let HubState {
            seats, last_inputs, ..
        } = &mut *guard;
        last_inputs
            .drain()
            .filter_map(|(client_id, message)| {
                seats.get(&client_id).map(|&player_id| (player_id, message))
            })
            .collect()
    }

    /// Block until every seat is taken, then flip to the in-game state:
    /// stale inputs are discarded, the history resets to the Hello frame,
    /// and GameStarted goes out. Returns the roster.
    pub fn wait_for_full_lobby(&self) -> BTreeMap<PlayerId, Player> {
        let mut st = self.lock();
        while st.players.len() < usize::from(self.params.players_count) {
            st = self.players_joined.wait(st).expect("hub mutex poisoned");
        }

        st.is_lobby = false;
        st.last_inputs.clear();
        st.history = vec![Arc::new(self.params.hello())];
        let players = st.players.clone();
        st.broadcast(ServerMessage::GameStarted {
            players: players.clone(),
        });
        players
    }

    /// Broadcast one resolved turn.
    pub fn close_turn(&self, turn: u16, events: Vec<Event>) {
        let mut st = self.lock();
        st.broadcast(ServerMessage::Turn { turn, events });
    }

    /// Broadcast the final scores and reopen the lobby. Clients connected
    /// from this moment on replay only a fresh Hello.
    pub fn end_game(&self, scores: BTreeMap<PlayerId, Score>) {
        let mut st = self.lock();
        st.broadcast(ServerMessage::GameEnded { scores });
        st.is_lobby = true;
        st.players.clear();
        st.seats.clear();
        st.last_inputs.clear();
        st.history = vec![Arc::new(self.params.hello())];
        info!("lobby reopened");
    }

    /// Tear down everything the hub knows about a client. Safe to call
    /// twice; the sender and receiver threads race to get here.
    pub fn erase_client(&self, client_id: ClientId) {
        let mut st = self.lock();
        if let Some(player_id) = st.seats.remove(&client_id) {
            st.players.remove(&player_id);
            debug!("client {client_id} gone, seat {} freed", player_id.0);
        }
        if let Some(queue) = st.queues.remove(&client_id) {
            queue.close();
        }
        st.last_inputs.remove(&client_id);
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().expect("hub mutex poisoned")
    }
}

impl HubState {
    /// Append to the history and every open per-client queue. Each client
    /// sees broadcasts in the order the hub issued them.
    fn broadcast(&mut self, message: ServerMessage) {
        let message = Arc::new(message);
        self.history.push(message.clone());
        for queue in self.queues.values() {
            queue.push(message.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robots_protocol::{Direction, Score};
    use std::thread;
    use std::time::Duration;

    fn params(players_count: u8) -> ServerParams {
        ServerParams {
            server_name: "arena".into(),
            players_count,
            size_x: 10,
            size_y: 10,
            game_length: 100,
            bomb_timer: 5,
            explosion_radius: 3,
            initial_blocks: 0,
            turn_duration: 50,
            port: 0,
            seed: 1,
        }
    }

    /// Drain everything currently buffered in a queue without blocking on
    /// an empty one.
    fn drain(queue: &MessageQueue, expected: usize) -> Vec<ServerMessage> {
        (0..expected)
            .map(|_| (*queue.pop().expect("queue closed early")).clone())
            .collect()
    }

    fn join(hub: &Hub, client_id: ClientId, name: &str) {
        hub.try_accept_player(client_id, name.into(), format!("[::1]:{client_id}"));
    }

    #[test]
    fn fresh_queue_replays_hello() {
        let hub = Hub::new(params(2));
        let client = hub.accept_client();
        let queue = hub.create_queue(client);
        let frames = drain(&queue, 1);
        assert!(matches!(frames[0], ServerMessage::Hello { .. }));
    }

    #[test]
    fn lobby_queue_replays_admissions_so_far() {
        let hub = Hub::new(params(3));
        let a = hub.accept_client();
        let _qa = hub.create_queue(a);
        join(&hub, a, "alpha");

        let b = hub.accept_client();
        let qb = hub.create_queue(b);
        join(&hub, b, "beta");

        // B's queue was seeded with Hello + A's admission, then saw B's own.
        let frames = drain(&qb, 3);
        assert!(matches!(frames[0], ServerMessage::Hello { .. }));
        assert!(
            matches!(&frames[1], ServerMessage::AcceptedPlayer { id, player } if *id == PlayerId(0) && player.name == "alpha")
        );
        assert!(
            matches!(&frames[2], ServerMessage::AcceptedPlayer { id, player } if *id == PlayerId(1) && player.name == "beta")
        );
    }

    #[test]
    fn admission_stops_at_the_seat_cap() {
        let hub = Hub::new(params(1));
        let a = hub.accept_client();
        let qa = hub.create_queue(a);
        join(&hub, a, "alpha");

        let b = hub.accept_client();
        let _qb = hub.create_queue(b);
        join(&hub, b, "beta");

        // Only one admission broadcast ever happened.
        let frames = drain(&qa, 2);
        assert!(matches!(frames[0], ServerMessage::Hello { .. }));
        assert!(
            matches!(&frames[1], ServerMessage::AcceptedPlayer { id, .. } if *id == PlayerId(0))
        );

        // The rejected client never took a seat, so its inputs vanish.
        hub.set_last_message(b, ClientMessage::PlaceBomb);
        assert!(hub.drain_turn_inputs().is_empty());
    }

    #[test]
    fn double_join_from_one_client_is_ignored() {
        let hub = Hub::new(params(2));
        let a = hub.accept_client();
        let qa = hub.create_queue(a);
        join(&hub, a, "alpha");
        join(&hub, a, "alpha-again");

        let frames = drain(&qa, 2);
        assert!(matches!(frames[0], ServerMessage::Hello { .. }));
        assert!(
            matches!(&frames[1], ServerMessage::AcceptedPlayer { player, .. } if player.name == "alpha")
        );
        assert!(qa.is_open());
    }

    #[test]
    fn last_input_wins_within_a_turn() {
        let hub = Hub::new(params(1));
        let a = hub.accept_client();
        let _qa = hub.create_queue(a);
        join(&hub, a, "alpha");

        hub.set_last_message(a, ClientMessage::PlaceBomb);
        hub.set_last_message(
            a,
            ClientMessage::Move {
                direction: Direction::Up,
            },
        );
        hub.set_last_message(a, ClientMessage::PlaceBlock);

        let inputs = hub.drain_turn_inputs();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[&PlayerId(0)], ClientMessage::PlaceBlock);

        // The drain cleared the map.
        assert!(hub.drain_turn_inputs().is_empty());
    }

    #[test]
    fn inputs_from_unseated_clients_are_dropped() {
        let hub = Hub::new(params(1));
        let spectator = hub.accept_client();
        let _q = hub.create_queue(spectator);
        hub.set_last_message(spectator, ClientMessage::PlaceBomb);
        assert!(hub.drain_turn_inputs().is_empty());
    }

    #[test]
    fn full_lobby_wakes_the_waiter_and_starts_the_game() {
        let hub = Arc::new(Hub::new(params(2)));
        let waiter = {
            let hub = hub.clone();
            thread::spawn(move || hub.wait_for_full_lobby())
        };
        thread::sleep(Duration::from_millis(50));

        let a = hub.accept_client();
        let qa = hub.create_queue(a);
        join(&hub, a, "alpha");
        let b = hub.accept_client();
        let _qb = hub.create_queue(b);
        join(&hub, b, "beta");

        let roster = waiter.join().unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[&PlayerId(0)].name, "alpha");
        assert_eq!(roster[&PlayerId(1)].name, "beta");

        // A saw Hello, both admissions, then GameStarted.
        let frames = drain(&qa, 4);
        assert!(matches!(frames[3], ServerMessage::GameStarted { .. }));
    }

    #[test]
    fn mid_game_queue_replays_the_whole_transcript() {
        let hub = Arc::new(Hub::new(params(1)));
        let a = hub.accept_client();
        let _qa = hub.create_queue(a);
        join(&hub, a, "alpha");
        let _roster = hub.wait_for_full_lobby();
        hub.close_turn(0, Vec::new());
        hub.close_turn(1, Vec::new());

        let late = hub.accept_client();
        let q = hub.create_queue(late);
        let frames = drain(&q, 4);
        assert!(matches!(frames[0], ServerMessage::Hello { .. }));
        assert!(matches!(frames[1], ServerMessage::GameStarted { .. }));
        assert!(matches!(frames[2], ServerMessage::Turn { turn: 0, .. }));
        assert!(matches!(frames[3], ServerMessage::Turn { turn: 1, .. }));
    }

    #[test]
    fn joins_after_game_start_are_ignored() {
        let hub = Arc::new(Hub::new(params(1)));
        let a = hub.accept_client();
        let qa = hub.create_queue(a);
        join(&hub, a, "alpha");
        let _roster = hub.wait_for_full_lobby();

        let late = hub.accept_client();
        let _q = hub.create_queue(late);
        join(&hub, late, "latecomer");

        hub.close_turn(0, Vec::new());
        // A's stream: Hello, AcceptedPlayer, GameStarted, Turn. No second
        // admission in between.
        let frames = drain(&qa, 4);
        assert!(matches!(frames[3], ServerMessage::Turn { turn: 0, .. }));
    }

    #[test]
    fn end_game_resets_to_a_fresh_lobby() {
        let hub = Arc::new(Hub::new(params(1)));
        let a = hub.accept_client();
        let _qa = hub.create_queue(a);
        join(&hub, a, "alpha");
        let _roster = hub.wait_for_full_lobby();
        hub.close_turn(0, Vec::new());

        let mut scores = BTreeMap::new();
        scores.insert(PlayerId(0), Score(2));
        hub.end_game(scores);

        // A brand-new client sees only the Hello.
        let fresh = hub.accept_client();
        let q = hub.create_queue(fresh);
        let frames = drain(&q, 1);
        assert!(matches!(frames[0], ServerMessage::Hello { .. }));

        // And the old client's seat is gone, so it can join the new lobby
        // as player 0 again.
        join(&hub, a, "alpha-round-two");
        let frames = drain(&q, 1);
        assert!(
            matches!(&frames[0], ServerMessage::AcceptedPlayer { id, player } if *id == PlayerId(0) && player.name == "alpha-round-two")
        );
    }

    #[test]
    fn erase_client_is_idempotent_and_closes_the_queue() {
        let hub = Hub::new(params(2));
        let a = hub.accept_client();
        let qa = hub.create_queue(a);
        join(&hub, a, "alpha");

        hub.erase_client(a);
        assert!(!qa.is_open());
        hub.erase_client(a);

        // The erase freed the only seat, so the next admission starts the
        // numbering over.
        let b = hub.accept_client();
        let qb = hub.create_queue(b);
        join(&hub, b, "beta");
        let frames = drain(&qb, 3);
        assert!(
            matches!(&frames[2], ServerMessage::AcceptedPlayer { id, player } if *id == PlayerId(0) && player.name == "beta")
        );
    }

    #[test]
    fn erase_of_unseated_client_leaves_players_alone() {
        let hub = Hub::new(params(2));
        let a = hub.accept_client();
        let _qa = hub.create_queue(a);
        join(&hub, a, "alpha");

        let spectator = hub.accept_client();
        let _q = hub.create_queue(spectator);
        hub.erase_client(spectator);

        // Player 0 still seated: the next admission takes seat 1.
        let b = hub.accept_client();
        let qb = hub.create_queue(b);
        join(&hub, b, "beta");
        let frames = drain(&qb, 3);
        assert!(
            matches!(&frames[2], ServerMessage::AcceptedPlayer { id, .. } if *id == PlayerId(1))
        );
    }
}
