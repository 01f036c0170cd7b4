//! Command-line interface for grot.

use clap::{Parser, Subcommand};

/// GROT - command-line client for the GROT board game server
#[derive(Parser, Debug)]
#[command(name = "grot")]
#[command(about = "Play GROT from the command line", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Log every snapshot and move, and pause between turns
    #[arg(long, global = true)]
    pub debug: bool,

    /// Proxy URL for every request
    #[arg(long, global = true, value_name = "PROXY_URL")]
    pub proxy: Option<String>,

    /// Game server URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register your unique token
    Register {
        /// Token issued by the server after signing in
        token: String,
    },

    /// Create new game room
    NewRoom {
        /// Room title
        title: String,

        /// GROT board size
        #[arg(long, default_value = "5")]
        board_size: u32,

        /// Maximum players in the room
        #[arg(long, default_value = "15")]
        max_players: u32,

        /// Allow users to connect multiple times with the same token
        #[arg(long)]
        allow_multi: bool,

        /// Automatically start game after X minutes
        #[arg(long, default_value = "5")]
        auto_start: u32,

        /// Automatically clear results after X minutes
        #[arg(long, default_value = "5")]
        auto_restart: u32,
    },

    /// Remove game room
    Remove {
        /// Room to remove
        room_id: String,
    },

    /// Start game
    Start {
        /// Room to start
        room_id: String,
    },

    /// Join game room and wait for start
    Join {
        /// Room to join
        room_id: String,

        /// Added to your name displayed on results page
        #[arg(long)]
        alias: Option<String>,
    },

    /// Show game results
    Results {
        /// Room to show
        room_id: String,
    },

    /// Play one move in loop (development mode)
    PlayDevel,

    /// Play full game against the server bot
    PlayVsBot,
}
