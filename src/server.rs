//! Plugin API Server
//!
//! HTTP half of the AWD plugin, mounted on the host platform (or served
//! standalone by `awd-server`):
//!
//! - `GET /plugins/awd/api/scoreboard/:name` - public per-challenge
//!   scoreboard, positional JSON rows
//! - `POST /plugins/awd/api/update` - score updates from the game
//!   infrastructure, authorized by the challenge's update token
//! - `GET /health` - liveness check
//!
//! Updates are accepted only while the contest window is running, the
//! challenge exists and is visible, and the token matches. Unknown teams
//! and zero-point attacks are skipped rather than rejected, so one bad
//! entry cannot void a round's batch.

use crate::challenge::ChallengeState;
use crate::config::PluginConfig;
use crate::scoreboard::ScoreboardEntry;
use crate::storage::{AwardCategory, AwdStorage, NewAward, TeamAwards};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// ============================================================================
// SERVER STATE
// ============================================================================

pub struct PluginState {
    pub storage: AwdStorage,
    pub config: RwLock<PluginConfig>,
}

impl PluginState {
    pub fn new(storage: AwdStorage, config: PluginConfig) -> Self {
        Self {
            storage,
            config: RwLock::new(config),
        }
    }

    /// Freeze-aware AWD award listing for a team, for host team pages.
    /// Awards at or after the configured freeze cutoff are hidden.
    pub async fn team_awards(&self, team_id: i64) -> anyhow::Result<TeamAwards> {
        let freeze = self.config.read().await.freeze;
        self.storage.team_awd_awards(team_id, freeze)
    }
}

// ============================================================================
// SCOREBOARD ENDPOINT (public)
// ============================================================================

/// GET /plugins/awd/api/scoreboard/:name
///
/// No authentication: the scoreboard is public. An unknown challenge
/// name yields an empty array, not a 404.
pub async fn get_scoreboard(
    State(state): State<Arc<PluginState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<serde_json::Value>>, (StatusCode, String)> {
    let entries = state.storage.scoreboard(&name).map_err(|e| {
        warn!("scoreboard query failed for {}: {:?}", name, e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(entries.iter().map(ScoreboardEntry::to_wire_row).collect()))
}

// ============================================================================
// UPDATE ENDPOINT (game infrastructure)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    /// Challenge id the round belongs to
    pub id: i64,
    /// The challenge's update token
    pub token: String,
    /// Attack points per team id (object keys are team ids)
    #[serde(default)]
    pub attacks: HashMap<String, i64>,
    /// Teams that kept their service alive this round
    #[serde(default)]
    pub defenses: Vec<i64>,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl UpdateResponse {
    fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

/// POST /plugins/awd/api/update
///
/// Credits one attack award per non-zero entry and one defense award of
/// the challenge's `defense_point` per defending team. Requires a
/// running contest, a visible challenge and a matching token.
pub async fn update_awards(
    State(state): State<Arc<PluginState>>,
    Json(req): Json<UpdateRequest>,
) -> Result<Json<UpdateResponse>, (StatusCode, String)> {
    let running = {
        let config = state.config.read().await;
        config.contest.is_running(Utc::now())
    };
    if !running {
        return Ok(Json(UpdateResponse::rejected("contest is paused or ended")));
    }

    let challenge = state
        .storage
        .get_challenge(req.id)
        .map_err(internal_error)?;
    let Some(challenge) = challenge else {
        return Ok(Json(UpdateResponse::rejected("challenge not found")));
    };

    if challenge.token != req.token {
        warn!("rejected update for challenge {}: invalid token", challenge.id);
        return Ok(Json(UpdateResponse::rejected("invalid token")));
    }

    if challenge.state != ChallengeState::Visible {
        return Ok(Json(UpdateResponse::rejected("challenge is hidden")));
    }

    let now = Utc::now();

    for (team_key, points) in &req.attacks {
        if *points == 0 {
            continue;
        }
        let Ok(team_id) = team_key.parse::<i64>() else {
            warn!("skipping attack entry with malformed team id: {}", team_key);
            continue;
        };
        let Some(team) = state.storage.get_team(team_id).map_err(internal_error)? else {
            continue;
        };

        state
            .storage
            .add_award(&NewAward {
                team_id: team.id,
                challenge_name: challenge.name.clone(),
                value: *points,
                category: AwardCategory::Attack,
                date: now,
            })
            .map_err(internal_error)?;
        info!("{} attacked {} for {}", team.name, challenge.name, points);
    }

    for team_id in &req.defenses {
        let Some(team) = state.storage.get_team(*team_id).map_err(internal_error)? else {
            continue;
        };

        state
            .storage
            .add_award(&NewAward {
                team_id: team.id,
                challenge_name: challenge.name.clone(),
                value: challenge.defense_point,
                category: AwardCategory::Defense,
                date: now,
            })
            .map_err(internal_error)?;
        info!("{} defended {}", team.name, challenge.name);
    }

    Ok(Json(UpdateResponse::ok()))
}

fn internal_error(e: anyhow::Error) -> (StatusCode, String) {
    warn!("update failed: {:?}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

// ============================================================================
// /health ENDPOINT
// ============================================================================

pub async fn health_check() -> &'static str {
    "OK"
}

// ============================================================================
// ROUTER & STARTUP
// ============================================================================

pub fn router(state: Arc<PluginState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/plugins/awd/api/scoreboard/:name", get(get_scoreboard))
        .route("/plugins/awd/api/update", post(update_awards))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn run_server(state: Arc<PluginState>, host: &str, port: u16) -> anyhow::Result<()> {
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("AWD challenge plugin listening on {}", addr);
    info!("  GET  /health                            - health check");
    info!("  GET  /plugins/awd/api/scoreboard/:name  - challenge scoreboard");
    info!("  POST /plugins/awd/api/update            - score updates (token)");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::challenge::NewChallenge;
    use crate::config::ContestWindow;

    fn test_state(config: PluginConfig) -> Arc<PluginState> {
        let storage = AwdStorage::in_memory().unwrap();
        Arc::new(PluginState::new(storage, config))
    }

    fn update_req(id: i64, token: &str, attacks: &[(&str, i64)], defenses: &[i64]) -> UpdateRequest {
        UpdateRequest {
            id,
            token: token.to_string(),
            attacks: attacks
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            defenses: defenses.to_vec(),
        }
    }

    #[tokio::test]
    async fn test_update_rejected_while_paused() {
        let state = test_state(PluginConfig {
            contest: ContestWindow {
                paused: true,
                ..Default::default()
            },
            ..Default::default()
        });

        let resp = update_awards(State(state), Json(update_req(1, "t", &[], &[])))
            .await
            .unwrap();
        assert!(!resp.0.success);
        assert_eq!(resp.0.message.as_deref(), Some("contest is paused or ended"));
    }

    #[tokio::test]
    async fn test_update_rejects_bad_token_and_hidden_challenge() {
        let state = test_state(PluginConfig::default());
        let challenge = state
            .storage
            .create_challenge(&NewChallenge::new("awd-1"))
            .unwrap();

        let resp = update_awards(
            State(state.clone()),
            Json(update_req(challenge.id, "wrong", &[], &[])),
        )
        .await
        .unwrap();
        assert!(!resp.0.success);
        assert_eq!(resp.0.message.as_deref(), Some("invalid token"));

        state
            .storage
            .set_challenge_state(challenge.id, ChallengeState::Hidden)
            .unwrap();
        let resp = update_awards(
            State(state.clone()),
            Json(update_req(challenge.id, &challenge.token, &[], &[])),
        )
        .await
        .unwrap();
        assert!(!resp.0.success);
        assert_eq!(resp.0.message.as_deref(), Some("challenge is hidden"));

        let resp = update_awards(
            State(state),
            Json(update_req(999, "t", &[], &[])),
        )
        .await
        .unwrap();
        assert_eq!(resp.0.message.as_deref(), Some("challenge not found"));
    }

    #[tokio::test]
    async fn test_update_credits_awards_and_moves_scoreboard() {
        let state = test_state(PluginConfig::default());
        let challenge = state
            .storage
            .create_challenge(&NewChallenge::new("awd-1"))
            .unwrap();
        state.storage.upsert_team(1, "Alpha").unwrap();
        state.storage.upsert_team(2, "Beta").unwrap();

        let resp = update_awards(
            State(state.clone()),
            Json(update_req(
                challenge.id,
                &challenge.token,
                // Zero points, unknown team and malformed ids are skipped
                &[("1", 30), ("2", 0), ("99", 10), ("not-an-id", 10)],
                &[1, 2, 77],
            )),
        )
        .await
        .unwrap();
        assert!(resp.0.success);
        assert!(resp.0.message.is_none());

        let board = get_scoreboard(State(state), Path("awd-1".to_string()))
            .await
            .unwrap();
        let rows = board.0;
        assert_eq!(rows.len(), 2);

        // Alpha: 30 attack + 5 defense = 35; Beta: 5 defense
        assert_eq!(rows[0][1], "Alpha");
        assert_eq!(rows[0][2], 30);
        assert_eq!(rows[0][3], 5);
        assert_eq!(rows[0][4], 35);
        assert_eq!(rows[1][1], "Beta");
        assert_eq!(rows[1][4], 5);
    }

    #[tokio::test]
    async fn test_team_awards_respect_freeze() {
        use chrono::TimeZone;

        let freeze = Utc.timestamp_opt(1_000, 0).unwrap();
        let state = test_state(PluginConfig {
            freeze: Some(freeze),
            ..Default::default()
        });

        let challenge = {
            let config = state.config.read().await;
            state.storage.create_challenge(&config.new_challenge("awd-1")).unwrap()
        };
        assert_eq!(challenge.defense_point, 5);

        state.storage.upsert_team(1, "Alpha").unwrap();
        let award = |value: i64, secs: i64| NewAward {
            team_id: 1,
            challenge_name: "awd-1".to_string(),
            value,
            category: AwardCategory::Attack,
            date: Utc.timestamp_opt(secs, 0).unwrap(),
        };
        state.storage.add_award(&award(10, 500)).unwrap();
        state.storage.add_award(&award(20, 1_500)).unwrap();

        // Only the pre-freeze award is visible on team pages
        let awards = state.team_awards(1).await.unwrap();
        assert_eq!(awards.attack.len(), 1);
        assert_eq!(awards.attack[0].value, 10);

        // The raw score still counts everything
        assert_eq!(state.storage.team_awd_score(1).unwrap(), 30);
    }

    #[tokio::test]
    async fn test_scoreboard_empty_for_unknown_challenge() {
        let state = test_state(PluginConfig::default());
        let board = get_scoreboard(State(state), Path("nope".to_string()))
            .await
            .unwrap();
        assert!(board.0.is_empty());
    }
}
