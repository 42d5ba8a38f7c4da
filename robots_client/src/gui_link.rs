// GUI-to-server half of the bridge.
//
// Blocking receive loop on the UDP socket. Valid datagrams are translated
// under the state lock and written to the server while the lock is still
// held: a Join must not slip out after a GameStarted frame has flipped the
// state out of the lobby. Malformed datagrams are dropped; socket failures
// are fatal for the whole client.

use std::io::{self, BufWriter, Write};
use std::net::{TcpStream, UdpSocket};
use std::sync::Mutex;

use log::debug;
use robots_protocol::{Encode, GuiInput};

use crate::state::ClientState;

/// Largest datagram worth receiving. Valid inputs are one or two bytes;
/// the headroom just lets oversized garbage be read and discarded.
const DATAGRAM_MAX_SIZE: usize = 65_507;

pub fn run(gui: &UdpSocket, server: &TcpStream, state: &Mutex<ClientState>) -> io::Result<()> {
    let mut writer = BufWriter::new(server);
    let mut datagram = vec![0u8; DATAGRAM_MAX_SIZE];
    let mut buf = Vec::new();
    loop {
        let len = gui.recv(&mut datagram)?;
        let Some(input) = GuiInput::parse(&datagram[..len]) else {
            debug!("ignoring malformed GUI datagram ({len} bytes)");
            continue;
        };

        let state = state.lock().expect("client state poisoned");
        let message = state.translate_input(input);
        buf.clear();
        message.encode(&mut buf);
        writer.write_all(&buf)?;
        writer.flush()?;
    }
}
