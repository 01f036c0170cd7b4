//! Game session: bootstrap GET followed by the turn loop.
//!
//! A session fetches the first snapshot, then repeatedly asks its strategy
//! for a move, submits it, and waits for the next snapshot. It never detects
//! game over on its own; it runs until the server rejects a request or
//! shutdown is requested.

use crate::error::TransportError;
use crate::shutdown::ShutdownSignal;
use crate::strategy::{MoveStrategy, RandomStrategy, Snapshot};
use crate::transport::{HttpTransport, Transport, redact_url};
use derive_getters::Getters;
use derive_new::new;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// Pause between turns in debug mode.
pub const DEFAULT_DEBUG_DELAY: Duration = Duration::from_millis(3000);

/// Inputs fixed for the lifetime of one session.
#[derive(Clone, PartialEq, Eq, Getters, new)]
pub struct SessionParams {
    /// Board URL with the token (and optional alias) already embedded.
    game_url: String,
    /// Verbose logging and paced turns.
    debug: bool,
    /// Optional proxy URL, passed through to the transport.
    proxy: Option<String>,
}

impl fmt::Debug for SessionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionParams")
            .field("game_url", &redact_url(&self.game_url))
            .field("debug", &self.debug)
            .field("proxy", &self.proxy)
            .finish()
    }
}

/// What a finished turn hands to the next one.
#[derive(Debug, Clone, PartialEq)]
pub struct NextTurn {
    /// State returned by the server for the submitted move.
    pub snapshot: Snapshot,
    /// Debug flag for the next turn. Once a turn runs in debug mode, every
    /// following turn does too.
    pub debug: bool,
    /// Wait before the next turn, if any.
    pub delay: Option<Duration>,
}

/// Outcome of a session that was shut down cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Getters)]
pub struct SessionSummary {
    /// Turns whose move was accepted by the server.
    turns: u64,
}

/// One game played against the server.
#[derive(Debug)]
pub struct GameSession<T, S> {
    params: SessionParams,
    transport: T,
    strategy: S,
    debug_delay: Duration,
    turns: u64,
}

impl<T: Transport, S: MoveStrategy> GameSession<T, S> {
    /// Creates a session that has not yet contacted the server.
    #[instrument(
        skip(params, transport, strategy),
        fields(game_url = %redact_url(&params.game_url), strategy = %strategy.name())
    )]
    pub fn new(params: SessionParams, transport: T, strategy: S) -> Self {
        Self {
            params,
            transport,
            strategy,
            debug_delay: DEFAULT_DEBUG_DELAY,
            turns: 0,
        }
    }

    /// Overrides the pause between debug-mode turns.
    pub fn with_debug_delay(mut self, delay: Duration) -> Self {
        self.debug_delay = delay;
        self
    }

    /// Returns the session parameters.
    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    /// Returns the number of accepted turns so far.
    pub fn turns(&self) -> u64 {
        self.turns
    }

    /// Fetches the first snapshot and plays turns until failure or shutdown.
    ///
    /// # Errors
    ///
    /// Returns the first [`TransportError`] hit by the bootstrap GET or by any
    /// turn. Nothing is retried.
    #[instrument(
        skip(self, shutdown),
        fields(game_url = %redact_url(&self.params.game_url), debug_mode = self.params.debug)
    )]
    pub async fn start(
        &mut self,
        shutdown: &mut ShutdownSignal,
    ) -> Result<SessionSummary, TransportError> {
        if self.params.debug {
            info!(game_url = %redact_url(&self.params.game_url), "Start playing");
        } else {
            debug!("Start playing");
        }

        let first = tokio::select! {
            biased;
            _ = shutdown.cancelled() => return Ok(self.stop()),
            result = self.transport.fetch_snapshot(&self.params.game_url) => result,
        };
        let first = first.inspect_err(|e| error!(error = %e, "Failed to fetch first snapshot"))?;

        let mut turn = NextTurn {
            snapshot: first,
            debug: self.params.debug,
            delay: None,
        };

        loop {
            if let Some(delay) = turn.delay {
                debug!(delay_ms = delay.as_millis() as u64, "Waiting before next turn");
                tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => return Ok(self.stop()),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            let result = tokio::select! {
                biased;
                _ = shutdown.cancelled() => return Ok(self.stop()),
                result = self.play_turn(turn.snapshot, turn.debug) => result,
            };

            turn = result.inspect_err(|e| {
                error!(error = %e, "Turn failed, ending session");
            })?;
        }
    }

    /// Plays a single turn: pick a move, submit it, schedule the next turn.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the move submission fails.
    #[instrument(skip(self, snapshot), fields(turn = self.turns + 1))]
    pub async fn play_turn(
        &mut self,
        snapshot: Snapshot,
        debug_mode: bool,
    ) -> Result<NextTurn, TransportError> {
        let mv = self.strategy.next_move(&snapshot);

        if debug_mode {
            info!(snapshot = %snapshot, "Current snapshot");
            info!(mv = %mv, "Sending move");
        } else {
            debug!(mv = %mv, "Sending move");
        }

        let next = self
            .transport
            .submit_move(&self.params.game_url, &mv)
            .await?;
        self.turns += 1;

        let next_turn = if debug_mode {
            NextTurn {
                snapshot: next,
                debug: true,
                delay: Some(self.debug_delay),
            }
        } else {
            NextTurn {
                snapshot: next,
                debug: false,
                delay: None,
            }
        };
        Ok(next_turn)
    }

    fn stop(&self) -> SessionSummary {
        info!(turns = self.turns, "Session shut down");
        SessionSummary { turns: self.turns }
    }
}

/// Plays a game over HTTP with the random strategy.
///
/// Convenience wrapper that wires [`HttpTransport`] and [`RandomStrategy`]
/// into a [`GameSession`] and runs it until failure or shutdown.
///
/// # Errors
///
/// Returns [`TransportError`] if the proxy is invalid or any request fails.
#[instrument(skip(shutdown))]
pub async fn play(
    params: SessionParams,
    debug_delay: Duration,
    shutdown: &mut ShutdownSignal,
) -> Result<SessionSummary, TransportError> {
    let transport = HttpTransport::new(params.proxy().as_deref())?;
    let mut session =
        GameSession::new(params, transport, RandomStrategy::new()).with_debug_delay(debug_delay);
    session.start(shutdown).await
}
