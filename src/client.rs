//! Scoreboard HTTP Client
//!
//! Thin read-only client for the plugin's scoreboard endpoint. No auth:
//! the scoreboard is public data. The challenge name is pushed as a
//! single percent-encoded path segment, so names containing reserved URL
//! characters cannot escape the route.

use crate::scoreboard::{parse_rows, ScoreboardError, ScoreboardRow};
use tracing::debug;
use url::Url;

pub struct ScoreboardClient {
    base_url: String,
    client: reqwest::Client,
}

impl ScoreboardClient {
    /// Create a client against the platform origin, e.g.
    /// `http://localhost:8000`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn scoreboard_url(&self, challenge_name: &str) -> Result<Url, ScoreboardError> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| ScoreboardError::BaseUrlNotHierarchical)?
            .pop_if_empty()
            .extend(["plugins", "awd", "api", "scoreboard", challenge_name]);
        Ok(url)
    }

    /// Fetch the scoreboard for a challenge
    pub async fn fetch_scoreboard(
        &self,
        challenge_name: &str,
    ) -> Result<Vec<ScoreboardRow>, ScoreboardError> {
        let url = self.scoreboard_url(challenge_name)?;
        debug!(%url, "fetching scoreboard");

        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(ScoreboardError::Status(resp.status()));
        }

        let body: serde_json::Value = resp.json().await?;
        parse_rows(&body)
    }
}
