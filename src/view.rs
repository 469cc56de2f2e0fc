//! Challenge View Adapter
//!
//! Front-end adapter for the `awd_challenge` type. The host platform
//! drives four lifecycle hooks, in order:
//!
//! 1. `set_data` - assigns the challenge payload
//! 2. `pre_render` - before the description is displayed (no-op here)
//! 3. `render` - markdown description to HTML, delegated to the host
//!    renderer unchanged
//! 4. `post_render` - after the view is mounted, wires the scoreboard
//!    click handler into the host's event bindings
//!
//! A click fetches the challenge's scoreboard and replaces the table
//! body. Each click is an independent fetch-render cycle: no caching, no
//! debouncing, no retry. Overlapping clicks are resolved with a
//! monotonic sequence guard so a response can never overwrite the result
//! of a later request, whatever order the responses arrive in.

use crate::challenge::ChallengeData;
use crate::client::ScoreboardClient;
use crate::markdown::MarkdownRenderer;
use crate::scoreboard::{render_table_body, ScoreboardError};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Selector of the element that triggers a scoreboard refresh
pub const SCOREBOARD_TRIGGER_SELECTOR: &str = ".challenge-scoreboard";

/// Id of the element the table body is rendered into
pub const SCOREBOARD_BODY_ID: &str = "challenge-scoreboard-body";

/// Errors surfaced by the scoreboard click handler
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("challenge data has not been assigned to the view")]
    ChallengeDataUnset,
    #[error(transparent)]
    Scoreboard(#[from] ScoreboardError),
}

/// What happened to a completed scoreboard fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The response was rendered into the panel
    Applied,
    /// A later request already applied its response; this one was dropped
    Stale,
}

// ============================================================================
// HOST CONTRACTS
// ============================================================================

/// Render target for the scoreboard table body
/// (`#challenge-scoreboard-body` in the mounted view)
pub trait ScoreboardPanel: Send + Sync {
    /// Replace the element's contents with the given HTML
    fn set_body_html(&self, html: &str);
}

/// Event wiring the host exposes for the mounted challenge view
pub trait ViewBindings {
    /// The scoreboard render target present in the mounted view
    fn scoreboard_panel(&self) -> Arc<dyn ScoreboardPanel>;

    /// Attach `handler` to clicks on the element matching `selector`
    fn add_click_handler(&mut self, selector: &str, handler: ScoreboardClickHandler);
}

// ============================================================================
// VIEW ADAPTER
// ============================================================================

struct ViewShared {
    /// Challenge payload, assigned by the host before render/post_render
    data: RwLock<Option<ChallengeData>>,
    renderer: Arc<dyn MarkdownRenderer>,
    client: ScoreboardClient,
    /// Sequence number handed to each fetch at click time
    issued: AtomicU64,
    /// Highest sequence number whose response reached the panel
    applied: Mutex<u64>,
}

/// The challenge view for the `awd_challenge` type
pub struct ChallengeView {
    shared: Arc<ViewShared>,
}

impl ChallengeView {
    /// Register a view against the host's markdown renderer and the
    /// platform origin serving the scoreboard API.
    pub fn register(renderer: Arc<dyn MarkdownRenderer>, api_base: &str) -> Self {
        Self {
            shared: Arc::new(ViewShared {
                data: RwLock::new(None),
                renderer,
                client: ScoreboardClient::new(api_base),
                issued: AtomicU64::new(0),
                applied: Mutex::new(0),
            }),
        }
    }

    /// The challenge payload, if the host has assigned one yet
    pub fn data(&self) -> Option<ChallengeData> {
        self.shared.data.read().clone()
    }

    /// Assign the challenge payload. The view never mutates it.
    pub fn set_data(&self, data: ChallengeData) {
        *self.shared.data.write() = Some(data);
    }

    /// The markdown renderer this view delegates to
    pub fn renderer(&self) -> &dyn MarkdownRenderer {
        self.shared.renderer.as_ref()
    }

    /// Called once before the challenge description is displayed.
    /// Intentionally does nothing.
    pub fn pre_render(&self) {}

    /// Render the challenge description. Pure delegation: whatever the
    /// host renderer produces (or panics with) passes through unchanged.
    pub fn render(&self, markdown: &str) -> String {
        self.shared.renderer.render(markdown)
    }

    /// Called once after the challenge view is mounted. Wires the
    /// scoreboard click handler to the trigger element.
    pub fn post_render(&self, bindings: &mut dyn ViewBindings) {
        let handler = ScoreboardClickHandler {
            shared: self.shared.clone(),
            panel: bindings.scoreboard_panel(),
        };
        bindings.add_click_handler(SCOREBOARD_TRIGGER_SELECTOR, handler);
    }
}

// ============================================================================
// CLICK HANDLER
// ============================================================================

/// Handler the host invokes on each scoreboard trigger click
#[derive(Clone)]
pub struct ScoreboardClickHandler {
    shared: Arc<ViewShared>,
    panel: Arc<dyn ScoreboardPanel>,
}

impl ScoreboardClickHandler {
    /// Fetch the scoreboard for the current challenge and render it into
    /// the panel.
    ///
    /// Fails fast with [`ViewError::ChallengeDataUnset`] if the host has
    /// not assigned the payload yet; no request is issued in that case.
    /// Network and decode failures are returned to the caller for
    /// display. A response superseded by a later click is dropped and
    /// reported as [`RefreshOutcome::Stale`].
    pub async fn handle(&self) -> Result<RefreshOutcome, ViewError> {
        // Name is read at click time, not at registration time
        let name = self
            .shared
            .data
            .read()
            .as_ref()
            .map(|d| d.name.clone())
            .ok_or(ViewError::ChallengeDataUnset)?;

        let seq = self.next_seq();
        let rows = self.shared.client.fetch_scoreboard(&name).await?;
        let html = render_table_body(&rows);
        Ok(self.apply(seq, &html))
    }

    fn next_seq(&self) -> u64 {
        self.shared.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Write `html` to the panel unless a later request already did.
    /// The lock spans the check and the write, so apply order cannot
    /// interleave.
    fn apply(&self, seq: u64, html: &str) -> RefreshOutcome {
        let mut applied = self.shared.applied.lock();
        if seq <= *applied {
            debug!(seq, applied = *applied, "dropping stale scoreboard response");
            return RefreshOutcome::Stale;
        }
        *applied = seq;
        self.panel.set_body_html(html);
        RefreshOutcome::Applied
    }
}
