//! Game snapshots, moves, and the strategies that pick them.

use derive_more::{Display, From};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Width and height of the GROT board.
pub const BOARD_SIZE: u8 = 5;

/// Opaque game state returned by the server.
///
/// The client never looks inside; it is logged in debug mode and handed to
/// the strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Display, From)]
#[serde(transparent)]
pub struct Snapshot(serde_json::Value);

impl Snapshot {
    /// Borrows the raw JSON document.
    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Consumes the snapshot, returning the raw JSON document.
    pub fn into_value(self) -> serde_json::Value {
        self.0
    }
}

/// Start point of the next chain reaction, sent as `{"x": .., "y": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("({x}, {y})")]
pub struct Move {
    /// Column, `0..BOARD_SIZE`.
    pub x: u8,
    /// Row, `0..BOARD_SIZE`.
    pub y: u8,
}

impl Move {
    /// Creates a move.
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

/// Picks the next move from the current game state.
pub trait MoveStrategy: Send {
    /// Returns the move to submit for `snapshot`.
    fn next_move(&mut self, snapshot: &Snapshot) -> Move;

    /// Returns the strategy's display name.
    fn name(&self) -> &str;
}

/// Strategy that picks a uniformly random cell and ignores the board.
#[derive(Debug, Clone)]
pub struct RandomStrategy {
    rng: StdRng,
}

impl RandomStrategy {
    /// Creates a strategy seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Creates a strategy with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveStrategy for RandomStrategy {
    #[instrument(skip_all)]
    fn next_move(&mut self, _snapshot: &Snapshot) -> Move {
        let mv = Move::new(
            self.rng.random_range(0..BOARD_SIZE),
            self.rng.random_range(0..BOARD_SIZE),
        );
        debug!(%mv, "Random move chosen");
        mv
    }

    fn name(&self) -> &str {
        "Random"
    }
}
