// CLI entry point for the Robots bridge client.
//
// Connects to the game server over TCP, binds the local UDP socket for the
// renderer, and runs the two reader loops: the GUI reader on a helper
// thread, the server reader on the main thread. Either loop failing takes
// the whole process down with a nonzero exit.

use std::net::{Ipv6Addr, SocketAddr, TcpStream, ToSocketAddrs, UdpSocket};
use std::process;
use std::sync::{Arc, Mutex};
use std::thread;

use clap::Parser;
use log::{error, info};

use robots_client::state::ClientState;
use robots_client::{gui_link, server_link};

#[derive(Parser, Debug)]
#[command(name = "robots-client", about = "Robots game client")]
struct Args {
    /// Player name, at most 255 bytes
    #[arg(short = 'n', long)]
    player_name: String,

    /// Game server address, host:port
    #[arg(short = 's', long)]
    server_address: String,

    /// GUI address, host:port
    #[arg(short = 'd', long)]
    gui_address: String,

    /// Local UDP port for GUI datagrams
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

/// Split "host:port" on the last ':', since IPv6 hosts contain colons.
/// Bracketed IPv6 literals are unwrapped.
fn split_host_port(address: &str) -> Result<(&str, u16), String> {
    let idx = address
        .rfind(':')
        .ok_or_else(|| format!("missing port in address: {address}"))?;
    let (host, port) = (&address[..idx], &address[idx + 1..]);
    let port = port
        .parse()
        .map_err(|_| format!("invalid port in address: {address}"))?;
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    if host.is_empty() {
        return Err(format!("missing host in address: {address}"));
    }
    Ok((host, port))
}

/// Resolve the GUI endpoint. IPv4 results are v6-mapped so they can be
/// reached through the dual-stack UDP socket.
fn resolve_gui(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    let addr = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "address resolved to nothing")
    })?;
    Ok(match addr {
        SocketAddr::V4(v4) => SocketAddr::new(v4.ip().to_ipv6_mapped().into(), v4.port()),
        SocketAddr::V6(_) => addr,
    })
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    if args.player_name.len() > usize::from(u8::MAX) {
        eprintln!("player name exceeds 255 bytes");
        process::exit(1);
    }

    let (server_host, server_port) = split_host_port(&args.server_address).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });
    let (gui_host, gui_port) = split_host_port(&args.gui_address).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let server = TcpStream::connect((server_host, server_port)).unwrap_or_else(|e| {
        eprintln!("Failed to connect to game server at {server_host}:{server_port}: {e}");
        process::exit(1);
    });
    if let Err(e) = server.set_nodelay(true) {
        eprintln!("Failed to configure server connection: {e}");
        process::exit(1);
    }

    let gui = UdpSocket::bind((Ipv6Addr::UNSPECIFIED, args.port)).unwrap_or_else(|e| {
        eprintln!("Failed to bind UDP port {}: {e}", args.port);
        process::exit(1);
    });
    let gui_target = resolve_gui(gui_host, gui_port).unwrap_or_else(|e| {
        eprintln!("Failed to resolve GUI address {gui_host}:{gui_port}: {e}");
        process::exit(1);
    });
    info!("connected to {server_host}:{server_port}, GUI at {gui_target}");

    let state = Arc::new(Mutex::new(ClientState::new(args.player_name)));

    // GUI -> client -> server on a helper thread.
    {
        let state = state.clone();
        let server = server.try_clone().unwrap_or_else(|e| {
            eprintln!("Failed to share server connection: {e}");
            process::exit(1);
        });
        let gui = gui.try_clone().unwrap_or_else(|e| {
            eprintln!("Failed to share GUI socket: {e}");
            process::exit(1);
        });
        thread::spawn(move || {
            if let Err(e) = gui_link::run(&gui, &server, &state) {
                error!("GUI link failed: {e}");
                process::exit(1);
            }
        });
    }

    // Server -> client -> GUI on the main thread.
    if let Err(e) = server_link::run(&server, &gui, gui_target, &state) {
        error!("server link failed: {e}");
        process::exit(1);
    }
}
