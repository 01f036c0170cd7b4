//! Room management and results against the GROT REST API.

use crate::error::{TransportError, TransportErrorKind};
use crate::transport::build_http_client;
use derive_getters::Getters;
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error, info, instrument};

/// Room used for development play.
pub const DEVEL_ROOM_ID: &str = "000000000000000000000000";

/// Settings for a new game room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Setters)]
#[serde(rename_all = "kebab-case")]
#[setters(prefix = "with_")]
pub struct RoomSettings {
    /// Room title shown on the server.
    pub title: Option<String>,
    /// Board width and height.
    pub board_size: u32,
    /// Maximum players in the room.
    pub max_players: u32,
    /// Start the game automatically after this many minutes.
    pub auto_start: Option<u32>,
    /// Clear results automatically after this many minutes.
    pub auto_restart: Option<u32>,
    /// Allow one token to join more than once.
    pub allow_multi: bool,
    /// Add the server's bot as an opponent.
    pub with_bot: bool,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            title: None,
            board_size: 5,
            max_players: 15,
            auto_start: Some(5),
            auto_restart: Some(5),
            allow_multi: false,
            with_bot: false,
        }
    }
}

impl RoomSettings {
    /// Settings for a two-player game against the server bot.
    pub fn versus_bot() -> Self {
        Self {
            max_players: 2,
            auto_start: Some(1),
            auto_restart: None,
            with_bot: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize)]
struct NewRoomPayload<'a> {
    #[serde(flatten)]
    settings: &'a RoomSettings,
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct NewRoomResponse {
    room_id: String,
}

/// One line of the results table.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct PlayerScore {
    /// Player login.
    login: String,
    /// Final score.
    score: i64,
}

impl PlayerScore {
    /// Creates a results entry.
    pub fn new(login: impl Into<String>, score: i64) -> Self {
        Self {
            login: login.into(),
            score,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ResultsResponse {
    players: Vec<PlayerScore>,
}

/// Renders results as `"{rank}. {login} - {score}"`, one player per line.
pub fn format_results(players: &[PlayerScore]) -> String {
    players
        .iter()
        .enumerate()
        .map(|(index, player)| format!("{}. {} - {}", index + 1, player.login, player.score))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extracts the room id from a create-room response.
///
/// The server may answer with the JSON object itself or with a JSON string
/// that contains it.
#[instrument(skip(body))]
pub fn parse_room_id(body: &str) -> Result<String, TransportError> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    let value = match value {
        serde_json::Value::String(inner) => serde_json::from_str(&inner)?,
        other => other,
    };
    let response: NewRoomResponse = serde_json::from_value(value)?;
    Ok(response.room_id)
}

/// Client for room management endpoints.
#[derive(Clone)]
pub struct RoomsClient {
    server: String,
    token: String,
    client: reqwest::Client,
}

impl fmt::Debug for RoomsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomsClient")
            .field("server", &self.server)
            .finish_non_exhaustive()
    }
}

impl RoomsClient {
    /// Creates a client for `server`, authenticating with `token`.
    #[instrument(skip(token))]
    pub fn new(server: &str, token: String, proxy: Option<&str>) -> Result<Self, TransportError> {
        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            token,
            client: build_http_client(proxy)?,
        })
    }

    /// Returns the server base URL.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Builds the board URL a session plays against.
    #[instrument(skip(self))]
    pub fn board_url(&self, room_id: &str, alias: Option<&str>) -> Result<String, TransportError> {
        let mut query = vec![("token", self.token.as_str())];
        if let Some(alias) = alias {
            query.push(("alias", alias));
        }
        let url = self.url(&["games", room_id, "board"], &query)?;
        Ok(url.to_string())
    }

    /// Appends percent-encoded path segments and query pairs to the server URL.
    fn url(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> Result<reqwest::Url, TransportError> {
        let invalid = |reason: String| {
            TransportError::new(
                TransportErrorKind::Client,
                format!("Invalid server URL {}: {}", self.server, reason),
            )
        };

        let mut url = reqwest::Url::parse(&self.server).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Returns the public page where a room's results are shown.
    pub fn results_page_url(&self, room_id: &str) -> Result<String, TransportError> {
        Ok(self.url(&["games", room_id], &[])?.to_string())
    }

    /// Creates a room and returns its id.
    #[instrument(skip(self))]
    pub async fn create_room(&self, settings: &RoomSettings) -> Result<String, TransportError> {
        info!("Creating room");
        let payload = NewRoomPayload {
            settings,
            token: &self.token,
        };

        let response = self
            .client
            .post(self.url(&["games"], &[])?)
            .json(&payload)
            .send()
            .await?;

        let body = Self::success_body(response).await?;
        let room_id = parse_room_id(&body).inspect_err(|e| {
            error!(error = %e, body = %body, "Unexpected create-room response");
        })?;

        info!(room_id = %room_id, "Room created");
        Ok(room_id)
    }

    /// Deletes a room.
    #[instrument(skip(self))]
    pub async fn remove_room(&self, room_id: &str) -> Result<(), TransportError> {
        info!("Removing room");
        let response = self
            .client
            .delete(self.url(&["games", room_id], &[("token", self.token.as_str())])?)
            .send()
            .await?;

        Self::success_body(response).await?;
        Ok(())
    }

    /// Starts the game in a room.
    #[instrument(skip(self))]
    pub async fn start_game(&self, room_id: &str) -> Result<(), TransportError> {
        info!("Starting game");
        let response = self
            .client
            .post(self.url(&["games", room_id], &[])?)
            .json(&serde_json::json!({ "token": self.token }))
            .send()
            .await?;

        Self::success_body(response).await?;
        Ok(())
    }

    /// Fetches the ranked results of a room.
    #[instrument(skip(self))]
    pub async fn results(&self, room_id: &str) -> Result<Vec<PlayerScore>, TransportError> {
        debug!("Fetching results");
        let response = self
            .client
            .get(self.url(
                &["games", room_id, "results", ""],
                &[("token", self.token.as_str())],
            )?)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let body = Self::success_body(response).await?;
        let results: ResultsResponse = serde_json::from_str(&body)?;
        debug!(players = results.players.len(), "Results received");
        Ok(results.players)
    }

    async fn success_body(response: reqwest::Response) -> Result<String, TransportError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            error!(status = %status, body = %body, "Server returned error");
            return Err(TransportError::new(
                TransportErrorKind::Status(status.as_u16()),
                format!("{} - {}", status, body),
            ));
        }
        Ok(body)
    }
}
