//! Match orchestration: join or set up a room, play it, then collect results.
//!
//! These flows never stop halfway on a failed session. Results are always
//! fetched once the session ends, and a room created for a bot match is
//! always removed afterwards.

use crate::error::TransportError;
use crate::rooms::{PlayerScore, RoomSettings, RoomsClient};
use crate::session::{SessionParams, SessionSummary, play};
use crate::shutdown::ShutdownSignal;
use derive_getters::Getters;
use derive_new::new;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Per-session knobs shared by every match flow.
#[derive(Debug, Clone, PartialEq, Eq, Getters, new)]
pub struct SessionOptions {
    /// Verbose logging and paced turns.
    debug_mode: bool,
    /// Optional proxy URL for the board requests.
    proxy: Option<String>,
    /// Pause between debug-mode turns.
    debug_delay: Duration,
}

/// What a finished match leaves behind.
#[derive(Debug, Getters)]
pub struct MatchReport {
    /// Room the session played in.
    room_id: String,
    /// How the session itself ended.
    outcome: Result<SessionSummary, TransportError>,
    /// Ranked results, if the server returned them.
    results: Option<Vec<PlayerScore>>,
}

impl MatchReport {
    /// Consumes the report, keeping only the session outcome.
    pub fn into_outcome(self) -> Result<SessionSummary, TransportError> {
        self.outcome
    }
}

/// Plays in an existing room, then fetches its results.
///
/// Session failures are reported in the returned [`MatchReport`] rather
/// than short-circuiting, so results are fetched either way.
#[instrument(skip(rooms, options, shutdown))]
pub async fn join_room(
    rooms: &RoomsClient,
    room_id: &str,
    alias: Option<&str>,
    options: &SessionOptions,
    shutdown: &mut ShutdownSignal,
) -> MatchReport {
    let outcome = match rooms.board_url(room_id, alias) {
        Ok(game_url) => play_board(game_url, options, shutdown).await,
        Err(e) => Err(e),
    };
    let results = fetch_results(rooms, room_id).await;

    MatchReport {
        room_id: room_id.to_string(),
        outcome,
        results,
    }
}

/// Creates a two-player room with the server bot, plays it, then cleans up.
///
/// The room is removed whether or not the session succeeded.
///
/// # Errors
///
/// Returns [`TransportError`] only if the room cannot be created. Later
/// failures are carried in the [`MatchReport`].
#[instrument(skip(rooms, options, shutdown))]
pub async fn play_vs_bot(
    rooms: &RoomsClient,
    options: &SessionOptions,
    shutdown: &mut ShutdownSignal,
) -> Result<MatchReport, TransportError> {
    info!("Creating new room");
    let room_id = rooms.create_room(&RoomSettings::versus_bot()).await?;

    let report = join_room(rooms, &room_id, None, options, shutdown).await;

    if let Err(e) = rooms.remove_room(&room_id).await {
        warn!(error = %e, room_id = %room_id, "Failed to remove room");
    }
    Ok(report)
}

async fn play_board(
    game_url: String,
    options: &SessionOptions,
    shutdown: &mut ShutdownSignal,
) -> Result<SessionSummary, TransportError> {
    let params = SessionParams::new(game_url, options.debug_mode, options.proxy.clone());
    play(params, options.debug_delay, shutdown).await
}

async fn fetch_results(rooms: &RoomsClient, room_id: &str) -> Option<Vec<PlayerScore>> {
    rooms
        .results(room_id)
        .await
        .inspect_err(|e| warn!(error = %e, "Could not fetch results"))
        .ok()
}
