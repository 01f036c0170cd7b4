//! GROT client library - play the GROT board game against a remote server
//!
//! # Architecture
//!
//! - **Session**: bootstrap GET, then a paced or immediate turn loop
//! - **Strategy**: pluggable move selection (currently random)
//! - **Transport**: JSON over HTTP, optionally through a proxy
//! - **Rooms**: create, start, remove rooms and fetch results
//! - **Orchestrator**: join or bot matches that always collect results
//! - **Token / Config**: player token storage and client settings
//!
//! # Example
//!
//! ```no_run
//! use grot_client::{GameSession, HttpTransport, RandomStrategy, SessionParams, shutdown_channel};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let params = SessionParams::new(
//!     "http://grot-server.games.stxnext.pl/games/abc/board?token=...".to_string(),
//!     false,
//!     None,
//! );
//! let transport = HttpTransport::new(None)?;
//! let mut session = GameSession::new(params, transport, RandomStrategy::new());
//!
//! let (_handle, mut shutdown) = shutdown_channel();
//! session.start(&mut shutdown).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod error;
mod orchestrator;
mod rooms;
mod session;
mod shutdown;
mod strategy;
mod token;
mod transport;

// Crate-level exports - Errors
pub use error::{ConfigError, TokenError, TransportError, TransportErrorKind};

// Crate-level exports - Configuration
pub use config::{ClientConfig, DEFAULT_SERVER};

// Crate-level exports - Game session
pub use session::{
    DEFAULT_DEBUG_DELAY, GameSession, NextTurn, SessionParams, SessionSummary, play,
};
pub use shutdown::{ShutdownHandle, ShutdownSignal, shutdown_channel, watch_interrupts};

// Crate-level exports - Moves and strategies
pub use strategy::{BOARD_SIZE, Move, MoveStrategy, RandomStrategy, Snapshot};

// Crate-level exports - Transport
pub use transport::{HttpTransport, Transport, build_http_client, redact_url};

// Crate-level exports - Rooms and results
pub use rooms::{
    DEVEL_ROOM_ID, PlayerScore, RoomSettings, RoomsClient, format_results, parse_room_id,
};

// Crate-level exports - Match flows
pub use orchestrator::{MatchReport, SessionOptions, join_room, play_vs_bot};

// Crate-level exports - Token storage
pub use token::{TOKEN_LENGTH, TokenStore, validate_token};
