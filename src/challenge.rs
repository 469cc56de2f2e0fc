//! Attack & Defense Challenge Type
//!
//! Defines the challenge model for the `awd_challenge` type, the type
//! descriptor the host platform registers, and the view payload handed to
//! the challenge view on the front end.
//!
//! AWD challenges carry no static point value: all scoring flows through
//! attack and defense awards credited by the update endpoint. Each
//! challenge owns a random API token that authorizes those updates.

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Challenge type identifier registered with the host platform
pub const CHALLENGE_TYPE_ID: &str = "awd_challenge";

/// Route under which plugin assets are served by the host
pub const ASSETS_ROUTE: &str = "/plugins/awd/assets/";

// ============================================================================
// CHALLENGE MODEL
// ============================================================================

/// Visibility state of a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeState {
    Visible,
    Hidden,
}

impl ChallengeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeState::Visible => "visible",
            ChallengeState::Hidden => "hidden",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "visible" => Some(ChallengeState::Visible),
            "hidden" => Some(ChallengeState::Hidden),
            _ => None,
        }
    }
}

/// A stored attack & defense challenge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwdChallenge {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: String,
    pub connection_info: Option<String>,
    pub state: ChallengeState,
    pub max_attempts: i64,
    /// Points credited per defended round
    pub defense_point: i64,
    /// Token authorizing score updates for this challenge (32 hex chars)
    pub token: String,
    /// Static point value, always 0 for AWD (scoring flows through awards)
    pub value: i64,
}

impl AwdChallenge {
    /// Produce the payload the front end receives when viewing this
    /// challenge. The token never leaves the server.
    pub fn read(&self) -> ChallengeData {
        ChallengeData {
            id: self.id,
            name: self.name.clone(),
            value: self.value,
            description: self.description.clone(),
            connection_info: self.connection_info.clone(),
            category: self.category.clone(),
            state: self.state,
            max_attempts: self.max_attempts,
            challenge_type: CHALLENGE_TYPE_ID.to_string(),
            type_data: ChallengeTypeDescriptor::default(),
        }
    }
}

/// Parameters for creating a new challenge
///
/// The id, token and value are assigned at creation time.
#[derive(Debug, Clone)]
pub struct NewChallenge {
    pub name: String,
    pub description: String,
    pub category: String,
    pub connection_info: Option<String>,
    pub max_attempts: i64,
    pub defense_point: i64,
}

impl NewChallenge {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            category: String::new(),
            connection_info: None,
            max_attempts: 0,
            defense_point: 5,
        }
    }
}

/// Generate a challenge API token: 16 random bytes, hex encoded.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// ============================================================================
// VIEW PAYLOAD
// ============================================================================

/// Challenge payload handed to the front-end view
///
/// Owned and populated by the host platform before the view renders; the
/// view adapter only reads `name` when refreshing the scoreboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeData {
    pub id: i64,
    pub name: String,
    pub value: i64,
    pub description: String,
    pub connection_info: Option<String>,
    pub category: String,
    pub state: ChallengeState,
    pub max_attempts: i64,
    #[serde(rename = "type")]
    pub challenge_type: String,
    pub type_data: ChallengeTypeDescriptor,
}

/// Descriptor the host platform uses to register the challenge type:
/// which templates and scripts drive each editing/viewing surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengeTypeDescriptor {
    pub id: String,
    pub name: String,
    pub templates: AssetPaths,
    pub scripts: AssetPaths,
    pub route: String,
}

/// Asset paths for the create/update/view surfaces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetPaths {
    pub create: String,
    pub update: String,
    pub view: String,
}

impl Default for ChallengeTypeDescriptor {
    fn default() -> Self {
        Self {
            id: CHALLENGE_TYPE_ID.to_string(),
            name: CHALLENGE_TYPE_ID.to_string(),
            templates: AssetPaths {
                create: "/plugins/awd/assets/create.html".to_string(),
                update: "/plugins/awd/assets/update.html".to_string(),
                view: "/plugins/awd/assets/view.html".to_string(),
            },
            scripts: AssetPaths {
                create: "/plugins/awd/assets/create.js".to_string(),
                update: "/plugins/awd/assets/update.js".to_string(),
                view: "/plugins/awd/assets/view.js".to_string(),
            },
            route: ASSETS_ROUTE.to_string(),
        }
    }
}
