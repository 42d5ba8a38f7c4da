// TCP plumbing: the accept loop and the per-client thread pairs.
//
// Each accepted connection gets two threads sharing the stream (receiver on
// the accepted handle, sender on a clone) and one outbound queue. Either
// side tears the pair down on failure: shut the socket down, close the
// queue, erase the client from the hub. Both may race to do so; the hub
// tolerates repeated erases and the shutdowns are best-effort.
//
// The receiver never replies on its own. Join goes to lobby admission,
// every other well-formed message becomes the client's pending input for
// the current turn, and the first malformed byte ends the connection.

use std::io::{BufReader, BufWriter, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use log::{debug, info, warn};
use robots_protocol::{ClientMessage, Decode, Encode};

use crate::hub::{ClientId, Hub};
use crate::queue::MessageQueue;

/// Accept connections forever, spawning a sender/receiver pair per client.
pub fn serve(listener: TcpListener, hub: Arc<Hub>) {
    loop {
        let (stream, peer) = match listener.accept() {
            Ok(conn) => conn,
            Err(e) => {
                warn!("accept failed: {e}");
                continue;
            }
        };
        if let Err(e) = spawn_client(stream, peer.to_string(), &hub) {
            warn!("failed to set up client from {peer}: {e}");
        }
    }
}

fn spawn_client(stream: TcpStream, address: String, hub: &Arc<Hub>) -> std::io::Result<()> {
    stream.set_nodelay(true)?;
    let sender_stream = stream.try_clone()?;

    let client_id = hub.accept_client();
    let queue = hub.create_queue(client_id);
    info!("client {client_id} connected from {address}");

    {
        let hub = hub.clone();
        let queue = queue.clone();
        thread::spawn(move || sender_loop(sender_stream, queue, hub, client_id));
    }
    {
        let hub = hub.clone();
        thread::spawn(move || receiver_loop(stream, queue, hub, client_id, address));
    }
    Ok(())
}

/// Drain the client's queue onto the socket until either side dies.
fn sender_loop(stream: TcpStream, queue: Arc<MessageQueue>, hub: Arc<Hub>, client_id: ClientId) {
    let mut writer = BufWriter::new(&stream);
    let mut buf = Vec::new();
    while let Some(message) = queue.pop() {
        buf.clear();
        message.encode(&mut buf);
        if let Err(e) = writer.write_all(&buf).and_then(|()| writer.flush()) {
            debug!("client {client_id}: write failed: {e}");
            break;
        }
    }
    drop(writer);
    let _ = stream.shutdown(Shutdown::Both);
    queue.close();
    hub.erase_client(client_id);
    debug!("client {client_id}: sender done");
}

/// Decode client messages until the stream fails or produces garbage.
fn receiver_loop(
    stream: TcpStream,
    queue: Arc<MessageQueue>,
    hub: Arc<Hub>,
    client_id: ClientId,
    address: String,
) {
    let mut reader = BufReader::new(&stream);
    loop {
        match ClientMessage::decode(&mut reader) {
            Ok(ClientMessage::Join { name }) => {
                hub.try_accept_player(client_id, name, address.clone());
            }
            Ok(message) => hub.set_last_message(client_id, message),
            Err(e) => {
                debug!("client {client_id}: dropping connection: {e}");
                break;
            }
        }
    }
    let _ = stream.shutdown(Shutdown::Both);
    queue.close();
    hub.erase_client(client_id);
    debug!("client {client_id}: receiver done");
}
