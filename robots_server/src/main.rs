// CLI entry point for the Robots game server.
//
// Binds the listen socket, spawns the acceptor thread, and runs the game
// manager on the main thread. See `lib.rs` for the threading architecture.

use std::net::{Ipv6Addr, TcpListener};
use std::process;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use log::info;

use robots_server::config::{Args, ServerParams};
use robots_server::game::GameManager;
use robots_server::hub::Hub;
use robots_server::net;

fn main() {
    env_logger::init();

    let args = Args::parse();
    let params = match ServerParams::from_args(args) {
        Ok(params) => params,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    // The IPv6 wildcard accepts IPv4 clients too on dual-stack hosts.
    let listener = match TcpListener::bind((Ipv6Addr::UNSPECIFIED, params.port)) {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("Failed to bind port {}: {e}", params.port);
            process::exit(1);
        }
    };
    info!(
        "{} listening on port {}, seed {}",
        params.server_name, params.port, params.seed
    );

    let hub = Arc::new(Hub::new(params.clone()));
    let acceptor_hub = hub.clone();
    thread::spawn(move || net::serve(listener, acceptor_hub));

    GameManager::new(params, hub).run();
}
