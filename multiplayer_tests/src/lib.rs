// Test-only TCP client for multiplayer integration tests.
//
// `TestClient` is a synchronous wrapper around a real `TcpStream` speaking
// the real wire protocol: it encodes `ClientMessage` frames out and decodes
// `ServerMessage` frames in, with a read timeout so a hung expectation
// fails the test instead of wedging it. `send_raw` exists so tests can
// write deliberately malformed bytes.
//
// `start_server` brings up a complete in-process server (hub, acceptor,
// game manager) on an OS-assigned port; the threads live for the rest of
// the test process, which is fine since every test gets its own port.
//
// See also: `tests/full_pipeline.rs` for the end-to-end scenarios.

use std::io::{BufReader, BufWriter, Write};
use std::net::{Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use robots_protocol::{ClientMessage, Decode, Encode, ServerMessage};
use robots_server::config::ServerParams;
use robots_server::game::GameManager;
use robots_server::hub::Hub;
use robots_server::net;

/// Read timeout for `recv`. Generous enough for slow CI, short enough that
/// a missing frame fails the test quickly.
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl TestClient {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect failed");
        stream.set_nodelay(true).expect("nodelay failed");
        stream
            .set_read_timeout(Some(RECV_TIMEOUT))
            .expect("read timeout failed");
        let writer = BufWriter::new(stream.try_clone().expect("clone failed"));
        Self {
            reader: BufReader::new(stream),
            writer,
        }
    }

    pub fn send(&mut self, message: &ClientMessage) {
        let mut buf = Vec::new();
        message.encode(&mut buf);
        self.send_raw(&buf);
    }

    /// Write raw bytes, bypassing the encoder.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).expect("write failed");
        self.writer.flush().expect("flush failed");
    }

    pub fn join(&mut self, name: &str) {
        self.send(&ClientMessage::Join { name: name.into() });
    }

    /// Blocking read of the next server frame.
    pub fn recv(&mut self) -> ServerMessage {
        ServerMessage::decode(&mut self.reader).expect("decode failed")
    }

    /// Assert the server drops this connection. Frames already in flight
    /// may still arrive first; the read timeout bounds the wait.
    pub fn expect_disconnect(&mut self) {
        for _ in 0..64 {
            if ServerMessage::decode(&mut self.reader).is_err() {
                return;
            }
        }
        panic!("server kept the connection alive");
    }
}

/// Start a full in-process server on an OS-assigned port and return its
/// address.
pub fn start_server(params: ServerParams) -> SocketAddr {
    let listener = TcpListener::bind((Ipv6Addr::LOCALHOST, 0)).expect("bind failed");
    let addr = listener.local_addr().expect("local_addr failed");

    let hub = Arc::new(Hub::new(params.clone()));
    let acceptor_hub = hub.clone();
    thread::spawn(move || net::serve(listener, acceptor_hub));
    thread::spawn(move || GameManager::new(params, hub).run());

    addr
}

/// Parameter block for a small fast test game. Scenarios override the
/// fields they care about.
pub fn test_params() -> ServerParams {
    ServerParams {
        server_name: "test-arena".into(),
        players_count: 1,
        size_x: 10,
        size_y: 10,
        game_length: 3,
        bomb_timer: 1,
        explosion_radius: 1,
        initial_blocks: 0,
        turn_duration: 300,
        port: 0,
        seed: 1,
    }
}
