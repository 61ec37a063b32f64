//! Session state: the append-only turn log plus the user's current mode
//! and tier selection.

use chrono::{DateTime, Utc};

use crate::core::attachment::Attachment;
use crate::core::persona::Mode;
use crate::core::router::Tier;

/// Which side of the conversation a turn belongs to. The wire-level role
/// strings ("user"/"model") live with the request builders in `api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

/// One message in the conversation. Immutable once appended to the log.
#[derive(Debug, Clone)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub attachment: Option<Attachment>,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn user(content: impl Into<String>, attachment: Option<Attachment>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            attachment,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            attachment: None,
            timestamp: Utc::now(),
        }
    }
}

/// Append-only record of the conversation, in submission order.
#[derive(Debug, Default)]
pub struct TurnLog {
    turns: Vec<Turn>,
}

impl TurnLog {
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

/// Per-run chat state. Owned by a single control flow; the core never
/// shares it across tasks.
pub struct Session {
    pub turn_log: TurnLog,
    pub mode: Mode,
    tier: Tier,
    elevated_unlocked: bool,
}

impl Session {
    pub fn new(mode: Mode) -> Self {
        Self {
            turn_log: TurnLog::default(),
            mode,
            tier: Tier::Basic,
            elevated_unlocked: false,
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Select a tier. Elevated requires a prior successful unlock.
    pub fn select_tier(&mut self, tier: Tier) -> Result<(), String> {
        if tier == Tier::Elevated && !self.elevated_unlocked {
            return Err(
                "The elevated tier is locked. Unlock it first with /unlock <token>.".to_string(),
            );
        }
        self.tier = tier;
        Ok(())
    }

    pub fn unlock_elevated(&mut self) {
        self.elevated_unlocked = true;
    }

    pub fn elevated_unlocked(&self) -> bool {
        self.elevated_unlocked
    }

    /// Clear the turn log. Mode, tier, and unlock state survive a reset.
    pub fn reset(&mut self) {
        self.turn_log.clear();
    }
}
