// crates/duel-nim/src/main.rs

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use duel_core::{ComputerPlayer, Engine, Game, GameOutcome, GameRef, GameTimer, PlayerId, PlayerRef};
use duel_net::{LinkStatus, NetConfig, ProxyGame, ProxyPlayer};
use duel_protocol::GameCodec;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use duel_nim::{ConsoleInput, ConsolePlayer, NimBrain, NimCodec, NimRules, NimState, Take, DEFAULT_STONES};

type NimPlayer = PlayerRef<Take, NimState>;

#[derive(Parser)]
#[clap(name = "nim-duel")]
#[clap(about = "Play Nim locally or across the network")]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// First port to probe (both sides must agree)
    #[clap(short = 'p', long, global = true)]
    base_port: Option<u16>,

    /// Enable debug logging
    #[clap(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Run the game here; remote seats wait for someone to join
    Host {
        /// Who sits in each seat, in order
        #[clap(short, long = "seat", value_enum, default_values_t = [Seat::Human, Seat::Computer])]
        seats: Vec<Seat>,

        /// Stones on the heap at the start
        #[clap(short = 'n', long, default_value_t = DEFAULT_STONES)]
        stones: u32,

        /// Timer tick interval in milliseconds; enables the turn limit
        #[clap(short, long)]
        timer_ms: Option<u64>,

        /// Ticks a player may idle before a stone is taken for them
        #[clap(short = 'l', long, default_value = "10")]
        turn_limit: u64,
    },

    /// Take a seat in a game hosted elsewhere
    Join {
        /// Host running the game
        #[clap(long)]
        host: Option<String>,

        /// Who plays on this side
        #[clap(short = 'a', long = "as", value_enum, default_value = "human")]
        player: LocalSeat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Seat {
    Computer,
    Human,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LocalSeat {
    Computer,
    Human,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = NetConfig::from_env(NimCodec.base_port())?;
    if let Some(port) = cli.base_port {
        config = config.with_base_port(port);
    }

    match cli.command {
        Command::Host {
            seats,
            stones,
            timer_ms,
            turn_limit,
        } => host(&config, &seats, stones, timer_ms, turn_limit).await,
        Command::Join { host, player } => {
            if let Some(host) = host {
                config = config.with_host(host);
            }
            join(&config, player).await
        }
    }
}

async fn host(config: &NetConfig, seats: &[Seat], stones: u32, timer_ms: Option<u64>, turn_limit: u64) -> Result<()> {
    let mut rules = NimRules::new(stones);
    if timer_ms.is_some() {
        rules = rules.with_turn_limit(turn_limit);
    }
    let engine = Arc::new(Engine::new(rules));
    let game: GameRef<Take, NimState> = engine.clone();

    let input = ConsoleInput::stdin();
    let players: Vec<NimPlayer> = seats
        .iter()
        .enumerate()
        .map(|(i, seat)| match seat {
            Seat::Computer => Arc::new(ComputerPlayer::new(NimBrain::with_think_time(Duration::from_millis(500)))) as NimPlayer,
            Seat::Human => Arc::new(ConsolePlayer::new(format!("player {i}"), Arc::clone(&input))) as NimPlayer,
            Seat::Remote => ProxyPlayer::listen(NimCodec, config) as NimPlayer,
        })
        .collect();

    game.set_players(players.iter().cloned().map(Some).collect())
        .context("cannot seat these players")?;
    for (i, player) in players.iter().enumerate() {
        player.set_game(Arc::clone(&game), PlayerId::from_index(i));
    }

    if seats.contains(&Seat::Remote) {
        info!(base_port = config.base_port, "waiting for remote players to join");
    }

    let timer = timer_ms.map(|ms| GameTimer::new(Arc::clone(&game), Duration::from_millis(ms)));
    if let Some(timer) = &timer {
        timer.start();
    }

    let outcome = game.play_game().await;
    if let Some(timer) = &timer {
        timer.stop();
    }

    match outcome {
        GameOutcome::Finished => {
            match engine.inspect(|r| r.winner()).await {
                Some(winner) => info!(%winner, "game over"),
                None => info!("game ended without a winner"),
            }
            Ok(())
        }
        other => bail!("game did not run: {other:?}"),
    }
}

async fn join(config: &NetConfig, seat: LocalSeat) -> Result<()> {
    let proxy = match ProxyGame::connect(NimCodec, config).await {
        Ok(proxy) => proxy,
        Err(e) => {
            error!(error = %e, "could not join");
            return Err(e.into());
        }
    };

    let player: NimPlayer = match seat {
        LocalSeat::Computer => Arc::new(ComputerPlayer::new(NimBrain::with_think_time(Duration::from_millis(500)))),
        LocalSeat::Human => Arc::new(ConsolePlayer::new("you", ConsoleInput::stdin())),
    };
    proxy.set_players(vec![Some(player)]).context("cannot take a seat")?;
    proxy.play_game().await;

    match proxy.wait_finished().await {
        LinkStatus::Lost => bail!("lost the connection to {}", config.host),
        _ => {
            info!("game over");
            Ok(())
        }
    }
}
