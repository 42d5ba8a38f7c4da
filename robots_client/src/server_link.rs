// Server-to-GUI half of the bridge.
//
// Blocking decode loop on the TCP stream. Every frame updates the shared
// mirror under the lock; frames the GUI cares about produce a snapshot
// datagram, sent after the lock is released. Any decode or socket failure
// is fatal for the whole client.

use std::io::BufReader;
use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::sync::Mutex;

use log::debug;
use robots_protocol::{Decode, ServerMessage, WireError};

use crate::state::ClientState;

pub fn run(
    server: &TcpStream,
    gui: &UdpSocket,
    gui_target: SocketAddr,
    state: &Mutex<ClientState>,
) -> Result<(), WireError> {
    let mut reader = BufReader::new(server);
    loop {
        let message = ServerMessage::decode(&mut reader)?;
        debug!("server frame: {message:?}");

        let snapshot = {
            let mut state = state.lock().expect("client state poisoned");
            state.handle_server_message(message)
        };
        if let Some(datagram) = snapshot {
            gui.send_to(&datagram, gui_target)?;
        }
    }
}
