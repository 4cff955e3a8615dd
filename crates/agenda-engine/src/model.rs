//! Persisted entities: users, agenda sources and agenda invites.
//!
//! Relations are plain id sets. An invite knows the ids of the sources whose busy
//! time counts against it; the store resolves those ids, nothing holds a pointer
//! back to its owner.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AgendaError, Result};
use crate::interval::{SourceId, UserId};
use crate::procedural::ProceduralAgendaId;
use crate::resolver::{self, Window};

pub type InviteId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Calendar backends a source can be pulled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Proton,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proton => "proton",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = AgendaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proton" => Ok(Self::Proton),
            other => Err(AgendaError::Validation(format!(
                "unknown source type '{other}'. Available types: proton"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaSource {
    pub id: SourceId,
    pub owner_user_id: UserId,
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The mutable part of an invite, as supplied by its owner on create/update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteDraft {
    pub description: String,
    pub expires_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub padding_before: Duration,
    pub padding_after: Duration,
    pub slot_sizes: Vec<Duration>,
    pub source_ids: BTreeSet<SourceId>,
    pub procedural_agenda_ids: BTreeSet<ProceduralAgendaId>,
}

impl InviteDraft {
    /// # Errors
    /// `AgendaError::Validation` when `not_before > not_after`, slot sizes are
    /// empty or non-positive, or padding is negative.
    pub fn validate(&self) -> Result<()> {
        resolver::validate(
            &Window::new(self.not_before, self.not_after),
            self.padding_before,
            self.padding_after,
            &self.slot_sizes,
        )
    }
}

/// A shareable, time-boxed view onto one user's availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgendaInvite {
    pub id: InviteId,
    pub owner_user_id: UserId,
    pub description: String,
    pub expires_at: DateTime<Utc>,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub padding_before: Duration,
    pub padding_after: Duration,
    pub slot_sizes: Vec<Duration>,
    pub source_ids: BTreeSet<SourceId>,
    pub procedural_agenda_ids: BTreeSet<ProceduralAgendaId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgendaInvite {
    pub fn from_draft(
        id: InviteId,
        owner_user_id: UserId,
        draft: InviteDraft,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_user_id,
            description: draft.description,
            expires_at: draft.expires_at,
            not_before: draft.not_before,
            not_after: draft.not_after,
            padding_before: draft.padding_before,
            padding_after: draft.padding_after,
            slot_sizes: draft.slot_sizes,
            source_ids: draft.source_ids,
            procedural_agenda_ids: draft.procedural_agenda_ids,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every owner-editable field, keeping identity and `created_at`.
    pub fn apply(&mut self, draft: InviteDraft, now: DateTime<Utc>) {
        self.description = draft.description;
        self.expires_at = draft.expires_at;
        self.not_before = draft.not_before;
        self.not_after = draft.not_after;
        self.padding_before = draft.padding_before;
        self.padding_after = draft.padding_after;
        self.slot_sizes = draft.slot_sizes;
        self.source_ids = draft.source_ids;
        self.procedural_agenda_ids = draft.procedural_agenda_ids;
        self.updated_at = now;
    }

    pub fn window(&self) -> Window {
        Window::new(self.not_before, self.not_after)
    }
}
