//! Local SQLite Storage for the AWD Plugin
//!
//! Persists everything the plugin owns:
//! - Challenges (the awd_challenge rows, including their update tokens)
//! - Teams (id + name mirror of the host's team registry)
//! - Awards (attack/defense credits, the only scoring record AWD keeps)
//!
//! The scoreboard for a challenge is an aggregation over awards, computed
//! per fetch. Nothing here caches.

use crate::challenge::{generate_token, AwdChallenge, ChallengeState, NewChallenge};
use crate::scoreboard::ScoreboardEntry;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS challenges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    category TEXT NOT NULL DEFAULT '',
    connection_info TEXT,
    state TEXT NOT NULL DEFAULT 'visible',
    max_attempts INTEGER NOT NULL DEFAULT 0,
    defense_point INTEGER NOT NULL DEFAULT 5,
    token TEXT NOT NULL,
    value INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS teams (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS awards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    team_id INTEGER NOT NULL,
    challenge_name TEXT NOT NULL,
    value INTEGER NOT NULL,
    category TEXT NOT NULL,
    icon TEXT NOT NULL,
    date INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_awards_challenge ON awards(challenge_name);
CREATE INDEX IF NOT EXISTS idx_awards_team ON awards(team_id);
"#;

// ============================================================================
// AWARD TYPES
// ============================================================================

/// Category of an AWD award
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AwardCategory {
    Attack,
    Defense,
}

impl AwardCategory {
    /// Label stored with the award and matched by scoreboard queries
    pub fn label(&self) -> &'static str {
        match self {
            AwardCategory::Attack => "[AWD] Attack",
            AwardCategory::Defense => "[AWD] Defense",
        }
    }

    /// Icon shown next to the award on team pages
    pub fn icon(&self) -> &'static str {
        match self {
            AwardCategory::Attack => "lightning",
            AwardCategory::Defense => "shield",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "[AWD] Attack" => Some(AwardCategory::Attack),
            "[AWD] Defense" => Some(AwardCategory::Defense),
            _ => None,
        }
    }
}

/// An award credited to a team for one attack or defended round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Award {
    pub id: i64,
    pub team_id: i64,
    pub challenge_name: String,
    pub value: i64,
    pub category: AwardCategory,
    pub date: DateTime<Utc>,
}

/// Parameters for crediting a new award
#[derive(Debug, Clone)]
pub struct NewAward {
    pub team_id: i64,
    pub challenge_name: String,
    pub value: i64,
    pub category: AwardCategory,
    pub date: DateTime<Utc>,
}

/// A team as mirrored from the host platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: i64,
    pub name: String,
}

/// A team's AWD awards, split by category, newest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamAwards {
    pub attack: Vec<Award>,
    pub defense: Vec<Award>,
}

// ============================================================================
// STORAGE
// ============================================================================

pub struct AwdStorage {
    conn: Arc<Mutex<Connection>>,
}

impl AwdStorage {
    /// Create storage at the specified path
    pub fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.execute_batch(SCHEMA)?;
        info!("AWD storage initialized at {:?}", path);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create in-memory storage (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    // ========================================================================
    // CHALLENGES
    // ========================================================================

    /// Create a challenge. The value is fixed at 0 and a fresh update
    /// token is generated; the stored row is returned.
    pub fn create_challenge(&self, challenge: &NewChallenge) -> Result<AwdChallenge> {
        let token = generate_token();
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO challenges (name, description, category, connection_info, max_attempts, defense_point, token)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                challenge.name,
                challenge.description,
                challenge.category,
                challenge.connection_info,
                challenge.max_attempts,
                challenge.defense_point,
                token
            ],
        )?;
        let id = conn.last_insert_rowid();

        Ok(AwdChallenge {
            id,
            name: challenge.name.clone(),
            description: challenge.description.clone(),
            category: challenge.category.clone(),
            connection_info: challenge.connection_info.clone(),
            state: ChallengeState::Visible,
            max_attempts: challenge.max_attempts,
            defense_point: challenge.defense_point,
            token,
            value: 0,
        })
    }

    /// Get a challenge by id
    pub fn get_challenge(&self, id: i64) -> Result<Option<AwdChallenge>> {
        let conn = self.conn.lock();
        let result = conn
            .query_row(
                "SELECT id, name, description, category, connection_info, state, max_attempts, defense_point, token, value
                 FROM challenges WHERE id = ?1",
                params![id],
                row_to_challenge,
            )
            .optional()?;
        result.transpose().map_err(Into::into)
    }

    /// Get a challenge by name
    pub fn get_challenge_by_name(&self, name: &str) -> Result<Option<AwdChallenge>> {
        let conn = self.conn.lock();
        let result = conn
            .query_row(
                "SELECT id, name, description, category, connection_info, state, max_attempts, defense_point, token, value
                 FROM challenges WHERE name = ?1",
                params![name],
                row_to_challenge,
            )
            .optional()?;
        result.transpose().map_err(Into::into)
    }

    /// Change a challenge's visibility state
    pub fn set_challenge_state(&self, id: i64, state: ChallengeState) -> Result<()> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE challenges SET state = ?1 WHERE id = ?2",
            params![state.as_str(), id],
        )?;
        if updated == 0 {
            return Err(anyhow!("challenge {} not found", id));
        }
        Ok(())
    }

    /// Delete a challenge and every award credited for it
    pub fn delete_challenge(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock();
        let name: Option<String> = conn
            .query_row(
                "SELECT name FROM challenges WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(name) = name else {
            return Err(anyhow!("challenge {} not found", id));
        };

        conn.execute(
            "DELETE FROM awards WHERE challenge_name = ?1 AND category IN (?2, ?3)",
            params![
                name,
                AwardCategory::Attack.label(),
                AwardCategory::Defense.label()
            ],
        )?;
        conn.execute("DELETE FROM challenges WHERE id = ?1", params![id])?;
        info!("Deleted challenge {} ({}) and its awards", id, name);
        Ok(())
    }

    // ========================================================================
    // TEAMS
    // ========================================================================

    /// Insert or update a team mirrored from the host
    pub fn upsert_team(&self, id: i64, name: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT OR REPLACE INTO teams (id, name) VALUES (?1, ?2)",
            params![id, name],
        )?;
        Ok(())
    }

    /// Get a team by id
    pub fn get_team(&self, id: i64) -> Result<Option<Team>> {
        let conn = self.conn.lock();
        let result = conn
            .query_row(
                "SELECT id, name FROM teams WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Team {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(result)
    }

    // ========================================================================
    // AWARDS
    // ========================================================================

    /// Credit an award
    pub fn add_award(&self, award: &NewAward) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO awards (team_id, challenge_name, value, category, icon, date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                award.team_id,
                award.challenge_name,
                award.value,
                award.category.label(),
                award.category.icon(),
                award.date.timestamp_millis()
            ],
        )?;
        Ok(())
    }

    /// Scoreboard for one challenge: per team, the attack sum, defense
    /// sum, total score and latest award date; ordered by score descending
    /// with the more recent latest award breaking ties. Unknown challenge
    /// names yield an empty list.
    pub fn scoreboard(&self, challenge_name: &str) -> Result<Vec<ScoreboardEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT a.team_id, t.name,
                    COALESCE(SUM(CASE WHEN a.category = ?1 THEN a.value END), 0) AS attack,
                    COALESCE(SUM(CASE WHEN a.category = ?2 THEN a.value END), 0) AS defense,
                    COALESCE(SUM(a.value), 0) AS score,
                    MAX(a.date) AS latest
             FROM awards a
             JOIN teams t ON t.id = a.team_id
             WHERE a.challenge_name = ?3 AND a.category IN (?1, ?2)
             GROUP BY a.team_id
             ORDER BY score DESC, latest DESC",
        )?;

        let entries = stmt
            .query_map(
                params![
                    AwardCategory::Attack.label(),
                    AwardCategory::Defense.label(),
                    challenge_name
                ],
                |row| {
                    Ok(ScoreboardEntry {
                        team_id: row.get(0)?,
                        team_name: row.get(1)?,
                        attack: row.get(2)?,
                        defense: row.get(3)?,
                        score: row.get(4)?,
                        latest: millis_to_datetime(row.get(5)?),
                    })
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }

    /// A team's AWD awards split by category, newest first. When a freeze
    /// cutoff is given, awards at or after it are excluded.
    pub fn team_awd_awards(
        &self,
        team_id: i64,
        freeze: Option<DateTime<Utc>>,
    ) -> Result<TeamAwards> {
        let cutoff = freeze
            .map(|f| f.timestamp_millis())
            .unwrap_or(i64::MAX);

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, team_id, challenge_name, value, category, date
             FROM awards
             WHERE team_id = ?1 AND category IN (?2, ?3) AND date < ?4
             ORDER BY date DESC",
        )?;

        let awards = stmt
            .query_map(
                params![
                    team_id,
                    AwardCategory::Attack.label(),
                    AwardCategory::Defense.label(),
                    cutoff
                ],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let mut result = TeamAwards::default();
        for (id, team_id, challenge_name, value, category, date) in awards {
            let category = AwardCategory::parse(&category)
                .ok_or_else(|| anyhow!("unknown award category: {}", category))?;
            let award = Award {
                id,
                team_id,
                challenge_name,
                value,
                category,
                date: millis_to_datetime(date),
            };
            match category {
                AwardCategory::Attack => result.attack.push(award),
                AwardCategory::Defense => result.defense.push(award),
            }
        }

        Ok(result)
    }

    /// Sum of a team's AWD award values across all challenges. The host
    /// adds this on top of its own base score for the team.
    pub fn team_awd_score(&self, team_id: i64) -> Result<i64> {
        let conn = self.conn.lock();
        let score: i64 = conn.query_row(
            "SELECT COALESCE(SUM(value), 0) FROM awards
             WHERE team_id = ?1 AND category IN (?2, ?3)",
            params![
                team_id,
                AwardCategory::Attack.label(),
                AwardCategory::Defense.label()
            ],
            |row| row.get(0),
        )?;
        Ok(score)
    }
}

fn row_to_challenge(row: &rusqlite::Row<'_>) -> rusqlite::Result<Result<AwdChallenge>> {
    let state: String = row.get(5)?;
    Ok(match ChallengeState::parse(&state) {
        Some(state) => Ok(AwdChallenge {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            category: row.get(3)?,
            connection_info: row.get(4)?,
            state,
            max_attempts: row.get(6)?,
            defense_point: row.get(7)?,
            token: row.get(8)?,
            value: row.get(9)?,
        }),
        None => Err(anyhow!("unknown challenge state: {}", state)),
    })
}

fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(millis).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
