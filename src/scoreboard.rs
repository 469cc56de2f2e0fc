//! Scoreboard Wire Format and Rendering
//!
//! Both halves of the scoreboard wire format live here:
//! - `ScoreboardEntry`: the server-side aggregate, one per team, emitted
//!   as a JSON array row `[team_id, team_name, attack, defense, score, date]`
//! - `ScoreboardRow`: the client-side typed view of such a row
//!
//! plus the HTML table-body rendering the challenge view injects into the
//! scoreboard panel.
//!
//! Wire rows are positional arrays, not objects. Numeric fields may arrive
//! as JSON numbers or numeric strings; parsing is explicit and a
//! non-numeric field is an error rather than a silent NaN. Rows keep the
//! server's ranking order and are never re-sorted client side.

use chrono::{DateTime, Utc};
use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Write as _;
use thiserror::Error;

/// Errors from fetching or decoding a scoreboard
#[derive(Debug, Error)]
pub enum ScoreboardError {
    #[error("invalid scoreboard URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("scoreboard base URL cannot carry path segments")]
    BaseUrlNotHierarchical,
    #[error("scoreboard request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("scoreboard endpoint returned {0}")]
    Status(reqwest::StatusCode),
    #[error("scoreboard body is not a JSON array")]
    MalformedBody,
    #[error("malformed scoreboard row {index}: {reason}")]
    MalformedRow { index: usize, reason: &'static str },
}

// ============================================================================
// SERVER SIDE: AGGREGATED ENTRIES
// ============================================================================

/// Per-team scoreboard aggregate for one challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreboardEntry {
    pub team_id: i64,
    pub team_name: String,
    /// Sum of attack award values
    pub attack: i64,
    /// Sum of defense award values
    pub defense: i64,
    /// Sum of all award values
    pub score: i64,
    /// Date of the team's latest award, used as the ranking tie-break
    pub latest: DateTime<Utc>,
}

impl ScoreboardEntry {
    /// Emit the positional wire row. The trailing element is the latest
    /// award timestamp in unix seconds; clients are free to ignore it.
    pub fn to_wire_row(&self) -> Value {
        serde_json::json!([
            self.team_id,
            self.team_name,
            self.attack,
            self.defense,
            self.score,
            self.latest.timestamp(),
        ])
    }
}

// ============================================================================
// CLIENT SIDE: TYPED ROWS
// ============================================================================

/// One parsed scoreboard row as consumed by the challenge view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreboardRow {
    pub team_id: String,
    pub team_name: String,
    pub attack: i64,
    pub defense: i64,
    pub score: i64,
}

/// Parse a scoreboard response body into typed rows.
///
/// Each row must carry at least the five leading elements; trailing
/// elements (such as the tie-break timestamp) are ignored so clients
/// interoperate with both 5- and 6-element producers.
pub fn parse_rows(body: &Value) -> Result<Vec<ScoreboardRow>, ScoreboardError> {
    let rows = body.as_array().ok_or(ScoreboardError::MalformedBody)?;
    rows.iter()
        .enumerate()
        .map(|(index, row)| parse_row(index, row))
        .collect()
}

fn parse_row(index: usize, row: &Value) -> Result<ScoreboardRow, ScoreboardError> {
    let malformed = |reason| ScoreboardError::MalformedRow { index, reason };

    let fields = row.as_array().ok_or(malformed("row is not an array"))?;
    if fields.len() < 5 {
        return Err(malformed("expected at least 5 elements"));
    }

    Ok(ScoreboardRow {
        team_id: id_field(&fields[0]).ok_or(malformed("team id is not a string or number"))?,
        team_name: fields[1]
            .as_str()
            .map(str::to_owned)
            .ok_or(malformed("team name is not a string"))?,
        attack: int_field(&fields[2]).ok_or(malformed("attack count is not numeric"))?,
        defense: int_field(&fields[3]).ok_or(malformed("defense count is not numeric"))?,
        score: int_field(&fields[4]).ok_or(malformed("score is not numeric"))?,
    })
}

/// Integer field that may arrive as a JSON number or a numeric string
fn int_field(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Team id field: strings pass through, numbers are stringified
fn id_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// ============================================================================
// TABLE RENDERING
// ============================================================================

/// Render the scoreboard table body: one `<tr>` per row, rank 1-based,
/// team name linking to the host's team page. Team names and ids are
/// HTML-escaped. An empty slice renders the empty string.
pub fn render_table_body(rows: &[ScoreboardRow]) -> String {
    let mut html = String::new();
    for (i, row) in rows.iter().enumerate() {
        // String writes cannot fail
        let _ = write!(
            html,
            "<tr><td>{rank}</td>\
             <td><a href=\"/teams/{id}\">{name}</a></td>\
             <td>{attack} / {defense}</td>\
             <td>{score}</td></tr>",
            rank = i + 1,
            id = encode_double_quoted_attribute(&row.team_id),
            name = encode_text(&row.team_name),
            attack = row.attack,
            defense = row.defense,
            score = row.score,
        );
    }
    html
}
