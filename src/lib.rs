//! Attack & Defense Challenge Plugin
//!
//! An `awd_challenge` challenge type for CTF scoring platforms. Unlike
//! jeopardy challenges, AWD challenges carry no static point value:
//! teams earn attack awards for compromising other teams' services and
//! defense awards for keeping their own alive, credited round by round
//! by the game infrastructure.
//!
//! ## Module Structure
//!
//! - `config`: plugin configuration and the contest window
//! - `challenge`: the challenge model, type descriptor and view payload
//! - `storage`: SQLite persistence for challenges, teams and awards
//! - `scoreboard`: scoreboard wire format, typed parsing, table rendering
//! - `client`: HTTP client for the scoreboard endpoint
//! - `markdown`: markdown rendering capability (host contract + default)
//! - `view`: the challenge view adapter (lifecycle hooks, click handling)
//! - `server`: axum routes for the scoreboard and update endpoints

/// Plugin configuration and contest window
pub mod config;

/// Challenge model and view payload
pub mod challenge;

/// Data persistence layer
pub mod storage;

/// Scoreboard wire format and rendering
pub mod scoreboard;

/// Scoreboard HTTP client
pub mod client;

/// Markdown rendering capability
pub mod markdown;

/// Challenge view adapter
pub mod view;

/// Plugin API server
pub mod server;

pub use challenge::{
    generate_token, AssetPaths, AwdChallenge, ChallengeData, ChallengeState,
    ChallengeTypeDescriptor, NewChallenge, ASSETS_ROUTE, CHALLENGE_TYPE_ID,
};
pub use client::ScoreboardClient;
pub use config::{ContestPhase, ContestWindow, PluginConfig};
pub use markdown::{CmarkRenderer, MarkdownRenderer};
pub use scoreboard::{
    parse_rows, render_table_body, ScoreboardEntry, ScoreboardError, ScoreboardRow,
};
pub use server::{router, run_server, PluginState, UpdateRequest, UpdateResponse};
pub use storage::{Award, AwardCategory, AwdStorage, NewAward, Team, TeamAwards};
pub use view::{
    ChallengeView, RefreshOutcome, ScoreboardClickHandler, ScoreboardPanel, ViewBindings,
    ViewError, SCOREBOARD_BODY_ID, SCOREBOARD_TRIGGER_SELECTOR,
};
