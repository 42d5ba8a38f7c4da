// Server configuration: the CLI surface and the immutable parameter block.

use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use robots_protocol::ServerMessage;

/// Command-line arguments for the game server.
#[derive(Parser, Debug)]
#[command(name = "robots-server", about = "Authoritative Robots game server")]
pub struct Args {
    /// Advertised server name, at most 255 bytes
    #[arg(short = 'n', long)]
    pub server_name: String,

    /// Seats per game
    #[arg(short = 'c', long, value_parser = clap::value_parser!(u8).range(1..))]
    pub players_count: u8,

    /// Board width
    #[arg(short = 'x', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub size_x: u16,

    /// Board height
    #[arg(short = 'y', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub size_y: u16,

    /// Turns per game
    #[arg(short = 'l', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub game_length: u16,

    /// Turns until a placed bomb explodes
    #[arg(short = 'b', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub bomb_timer: u16,

    /// Length of each explosion arm, in cells
    #[arg(short = 'e', long)]
    pub explosion_radius: u16,

    /// Random blocks placed at game start
    #[arg(short = 'k', long)]
    pub initial_blocks: u16,

    /// Wall-clock turn length in milliseconds
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u64).range(1..))]
    pub turn_duration: u64,

    /// TCP listen port
    #[arg(short = 'p', long, value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// RNG seed; defaults to the current time
    #[arg(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
    pub seed: Option<u32>,
}

/// Process-wide immutable parameters, fixed at startup.
#[derive(Clone, Debug)]
pub struct ServerParams {
    pub server_name: String,
    pub players_count: u8,
    pub size_x: u16,
    pub size_y: u16,
    pub game_length: u16,
    pub bomb_timer: u16,
    pub explosion_radius: u16,
    pub initial_blocks: u16,
    pub turn_duration: u64,
    pub port: u16,
    pub seed: u32,
}

impl ServerParams {
    pub fn from_args(args: Args) -> Result<Self, String> {
        if args.server_name.len() > usize::from(u8::MAX) {
            return Err("server name exceeds 255 bytes".into());
        }
        let seed = args.seed.unwrap_or_else(seed_from_clock);
        Ok(Self {
            server_name: args.server_name,
            players_count: args.players_count,
            size_x: args.size_x,
            size_y: args.size_y,
            game_length: args.game_length,
            bomb_timer: args.bomb_timer,
            explosion_radius: args.explosion_radius,
            initial_blocks: args.initial_blocks,
            turn_duration: args.turn_duration,
            port: args.port,
            seed,
        })
    }

    /// The advertisement every connection receives first.
    pub fn hello(&self) -> ServerMessage {
        ServerMessage::Hello {
            server_name: self.server_name.clone(),
            players_count: self.players_count,
            size_x: self.size_x,
            size_y: self.size_y,
            game_length: self.game_length,
            explosion_radius: self.explosion_radius,
            bomb_timer: self.bomb_timer,
        }
    }
}

#[expect(clippy::cast_possible_truncation)]
fn seed_from_clock() -> u32 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    now.as_secs() as u32
}
