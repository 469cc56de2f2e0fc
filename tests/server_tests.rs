//! End-to-end tests for the AWD plugin
//!
//! Boots the plugin router on a real listener, pushes score updates the
//! way the game infrastructure would, and drives the challenge view
//! against the live scoreboard endpoint.

use awd_challenge::{
    AwdStorage, ChallengeView, CmarkRenderer, NewChallenge, PluginConfig, PluginState,
    RefreshOutcome, ScoreboardClickHandler, ScoreboardPanel, ViewBindings,
    SCOREBOARD_TRIGGER_SELECTOR,
};
use parking_lot::Mutex;
use std::sync::Arc;

// ============================================================================
// TEST HELPERS
// ============================================================================

async fn spawn_plugin(state: Arc<PluginState>) -> String {
    let app = awd_challenge::router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn seeded_state() -> Arc<PluginState> {
    let storage = AwdStorage::in_memory().unwrap();
    storage.upsert_team(1, "Alpha").unwrap();
    storage.upsert_team(2, "Beta").unwrap();
    Arc::new(PluginState::new(storage, PluginConfig::default()))
}

#[derive(Default)]
struct RecordingPanel {
    bodies: Mutex<Vec<String>>,
}

impl ScoreboardPanel for RecordingPanel {
    fn set_body_html(&self, html: &str) {
        self.bodies.lock().push(html.to_string());
    }
}

struct HostBindings {
    panel: Arc<RecordingPanel>,
    handlers: Vec<(String, ScoreboardClickHandler)>,
}

impl ViewBindings for HostBindings {
    fn scoreboard_panel(&self) -> Arc<dyn ScoreboardPanel> {
        self.panel.clone()
    }

    fn add_click_handler(&mut self, selector: &str, handler: ScoreboardClickHandler) {
        self.handlers.push((selector.to_string(), handler));
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[tokio::test]
async fn test_update_then_scoreboard_over_http() {
    let state = seeded_state();
    let challenge = state
        .storage
        .create_challenge(&NewChallenge::new("pwn-box"))
        .unwrap();
    let base = spawn_plugin(state).await;

    let client = reqwest::Client::new();

    // Health first
    let health = client.get(format!("{}/health", base)).send().await.unwrap();
    assert_eq!(health.text().await.unwrap(), "OK");

    // Round update: Alpha scores an attack, both teams defended
    let resp: serde_json::Value = client
        .post(format!("{}/plugins/awd/api/update", base))
        .json(&serde_json::json!({
            "id": challenge.id,
            "token": challenge.token,
            "attacks": { "1": 100 },
            "defenses": [1, 2]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp["success"], true);

    let rows: serde_json::Value = client
        .get(format!("{}/plugins/awd/api/scoreboard/pwn-box", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    // Alpha: 100 attack + 5 defense = 105
    assert_eq!(rows[0][1], "Alpha");
    assert_eq!(rows[0][2], 100);
    assert_eq!(rows[0][3], 5);
    assert_eq!(rows[0][4], 105);
    // Beta: defense only
    assert_eq!(rows[1][1], "Beta");
    assert_eq!(rows[1][4], 5);
}

#[tokio::test]
async fn test_update_with_wrong_token_is_rejected() {
    let state = seeded_state();
    let challenge = state
        .storage
        .create_challenge(&NewChallenge::new("pwn-box"))
        .unwrap();
    let base = spawn_plugin(state.clone()).await;

    let resp: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/plugins/awd/api/update", base))
        .json(&serde_json::json!({
            "id": challenge.id,
            "token": "00000000000000000000000000000000",
            "attacks": { "1": 100 },
            "defenses": []
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(resp["success"], false);
    assert_eq!(resp["message"], "invalid token");
    assert!(state.storage.scoreboard("pwn-box").unwrap().is_empty());
}

#[tokio::test]
async fn test_view_lifecycle_against_live_server() {
    let state = seeded_state();
    let challenge = state
        .storage
        .create_challenge(&NewChallenge::new("pwn-box"))
        .unwrap();
    let base = spawn_plugin(state.clone()).await;

    // Score a round: Alpha attacks, Beta defends
    let resp: serde_json::Value = reqwest::Client::new()
        .post(format!("{}/plugins/awd/api/update", base))
        .json(&serde_json::json!({
            "id": challenge.id,
            "token": challenge.token,
            "attacks": { "1": 40 },
            "defenses": [2]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(resp["success"], true);

    // Mount the view the way the host would
    let view = ChallengeView::register(Arc::new(CmarkRenderer), &base);
    view.set_data(challenge.read());

    let description_html = view.render("# AWD\n\nkeep your service alive");
    assert!(description_html.contains("<h1>AWD</h1>"));

    let mut bindings = HostBindings {
        panel: Arc::new(RecordingPanel::default()),
        handlers: Vec::new(),
    };
    view.pre_render();
    view.post_render(&mut bindings);
    assert_eq!(bindings.handlers[0].0, SCOREBOARD_TRIGGER_SELECTOR);

    // Click the scoreboard
    let outcome = bindings.handlers[0].1.handle().await.unwrap();
    assert_eq!(outcome, RefreshOutcome::Applied);

    let body = bindings.panel.bodies.lock().last().cloned().unwrap();
    assert!(body.contains(r#"<a href="/teams/1">Alpha</a>"#));
    assert!(body.contains("40 / 0"));
    assert!(body.contains(r#"<a href="/teams/2">Beta</a>"#));
    assert!(body.contains("0 / 5"));
    // Alpha ranks first
    assert!(body.starts_with("<tr><td>1</td><td><a href=\"/teams/1\">"));
}
