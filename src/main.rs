//! GROT - command-line client
//!
//! Registers a token, manages rooms, and plays games against the GROT server.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use grot_client::{
    ClientConfig, DEVEL_ROOM_ID, MatchReport, RoomSettings, RoomsClient, SessionOptions,
    SessionParams, ShutdownSignal, TokenStore, format_results, join_room, play_vs_bot,
    shutdown_channel, watch_interrupts,
};
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing(cli.debug);

    let config = ClientConfig::load(cli.config.as_deref())?
        .with_env_overrides(cli.server.clone(), cli.proxy.clone());
    debug!(?config, "Configuration resolved");

    let tokens = match config.token_file() {
        Some(path) => TokenStore::new(path.clone()),
        None => TokenStore::at_default_path(),
    };

    match cli.command {
        Command::Register { token } => register(&config, &tokens, &token),
        Command::NewRoom {
            title,
            board_size,
            max_players,
            allow_multi,
            auto_start,
            auto_restart,
        } => {
            let settings = RoomSettings::default()
                .with_title(Some(title))
                .with_board_size(board_size)
                .with_max_players(max_players)
                .with_allow_multi(allow_multi)
                .with_auto_start(Some(auto_start))
                .with_auto_restart(Some(auto_restart));
            let rooms = rooms_client(&config, &tokens)?;
            let room_id = rooms
                .create_room(&settings)
                .await
                .context("Failed to create new room")?;
            println!("New game room_id is {}", room_id);
            Ok(())
        }
        Command::Remove { room_id } => {
            rooms_client(&config, &tokens)?.remove_room(&room_id).await?;
            Ok(())
        }
        Command::Start { room_id } => {
            rooms_client(&config, &tokens)?.start_game(&room_id).await?;
            Ok(())
        }
        Command::Join { room_id, alias } => {
            let rooms = rooms_client(&config, &tokens)?;
            println!("Check game results {}", rooms.results_page_url(&room_id)?);
            let mut shutdown = listen_for_ctrl_c();
            let options = session_options(&config, cli.debug);
            let report =
                join_room(&rooms, &room_id, alias.as_deref(), &options, &mut shutdown).await;
            finish_match(report)
        }
        Command::Results { room_id } => {
            let rooms = rooms_client(&config, &tokens)?;
            show_results(&rooms, &room_id).await
        }
        Command::PlayDevel => {
            let rooms = rooms_client(&config, &tokens)?;
            let game_url = rooms.board_url(DEVEL_ROOM_ID, None)?;
            let mut shutdown = listen_for_ctrl_c();
            play_session(&config, game_url, true, &mut shutdown).await
        }
        Command::PlayVsBot => {
            let rooms = rooms_client(&config, &tokens)?;
            let mut shutdown = listen_for_ctrl_c();
            let options = session_options(&config, cli.debug);
            let report = play_vs_bot(&rooms, &options, &mut shutdown)
                .await
                .context("Failed to create new room")?;
            finish_match(report)
        }
    }
}

/// Validates and stores the player token.
#[instrument(skip(config, tokens, token))]
fn register(config: &ClientConfig, tokens: &TokenStore, token: &str) -> Result<()> {
    tokens
        .save(token)
        .with_context(|| format!("Sign in to {} to get your token.", config.server()))?;
    println!("Token have been saved.");
    Ok(())
}

/// Builds a rooms client from the stored token.
fn rooms_client(config: &ClientConfig, tokens: &TokenStore) -> Result<RoomsClient> {
    let token = tokens.load().with_context(|| {
        format!(
            "Sign in to {} to get your token.\nUse 'grot register <token>' before using other commands.",
            config.server()
        )
    })?;
    Ok(RoomsClient::new(
        config.server(),
        token,
        config.proxy().as_deref(),
    )?)
}

/// Session knobs derived from the resolved config.
fn session_options(config: &ClientConfig, debug_mode: bool) -> SessionOptions {
    SessionOptions::new(debug_mode, config.proxy().clone(), config.debug_delay())
}

/// Maps Ctrl-C to a graceful shutdown. A second Ctrl-C exits immediately.
fn listen_for_ctrl_c() -> ShutdownSignal {
    let (handle, shutdown) = shutdown_channel();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, handle).await {
            std::process::exit(130);
        }
    });
    shutdown
}

/// Prints the results of a finished match and returns its session outcome.
fn finish_match(report: MatchReport) -> Result<()> {
    if let Some(players) = report.results() {
        println!("{}", format_results(players));
    }
    let summary = report.into_outcome().context("Game session failed")?;
    info!(turns = summary.turns(), "Session finished");
    Ok(())
}

/// Plays one session without a room around it.
#[instrument(skip(config, shutdown, game_url))]
async fn play_session(
    config: &ClientConfig,
    game_url: String,
    debug_mode: bool,
    shutdown: &mut ShutdownSignal,
) -> Result<()> {
    let params = SessionParams::new(game_url, debug_mode, config.proxy().clone());
    let summary = grot_client::play(params, config.debug_delay(), shutdown)
        .await
        .context("Game session failed")?;

    info!(turns = summary.turns(), "Session finished");
    Ok(())
}

/// Prints the ranked results of a room.
#[instrument(skip(rooms))]
async fn show_results(rooms: &RoomsClient, room_id: &str) -> Result<()> {
    let players = rooms.results(room_id).await?;
    println!("{}", format_results(&players));
    Ok(())
}

#[instrument]
fn initialize_tracing(debug_mode: bool) {
    let default_filter = if debug_mode {
        "info,grot_client=debug,grot=debug"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
