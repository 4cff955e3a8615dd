//! JSON shapes exchanged at the service boundary.
//!
//! Agenda items, invites and views use PascalCase keys with `ID` suffixes;
//! sources, users and pagination use camelCase. Durations travel as strings
//! (`"30m"`, `"1h0m0s"`) and are parsed here, so malformed durations fail
//! with a validation error before anything reaches the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::duration::{format_duration, parse_duration};
use crate::error::{AgendaError, Result};
use crate::interval::BusyInterval;
use crate::model::{AgendaInvite, AgendaSource, InviteDraft, User};
use crate::procedural::ProceduralAgenda;
use crate::store::StoreRecords;

fn malformed(e: serde_json::Error) -> AgendaError {
    AgendaError::Validation(format!("malformed JSON: {e}"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaItemDto {
    #[serde(rename = "ResourceID")]
    pub resource_id: Uuid,
    #[serde(rename = "StartTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "EndTime")]
    pub end_time: DateTime<Utc>,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "AgendaSourceID")]
    pub agenda_source_id: Uuid,
    #[serde(rename = "UserID")]
    pub user_id: Uuid,
}

impl TryFrom<AgendaItemDto> for BusyInterval {
    type Error = AgendaError;

    fn try_from(dto: AgendaItemDto) -> Result<Self> {
        BusyInterval::new(
            dto.resource_id,
            dto.user_id,
            dto.agenda_source_id,
            dto.start_time,
            dto.end_time,
            dto.description,
        )
    }
}

impl From<&BusyInterval> for AgendaItemDto {
    fn from(i: &BusyInterval) -> Self {
        Self {
            resource_id: i.id,
            start_time: i.start,
            end_time: i.end,
            description: i.description.clone(),
            agenda_source_id: i.source_id,
            user_id: i.owner_user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaSourceDto {
    pub id: Uuid,
    pub url: String,
    #[serde(rename = "type")]
    pub source_type: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<AgendaSourceDto> for AgendaSource {
    type Error = AgendaError;

    fn try_from(dto: AgendaSourceDto) -> Result<Self> {
        Ok(Self {
            id: dto.id,
            owner_user_id: dto.user_id,
            url: dto.url,
            source_type: dto.source_type.parse()?,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        })
    }
}

impl From<&AgendaSource> for AgendaSourceDto {
    fn from(s: &AgendaSource) -> Self {
        Self {
            id: s.id,
            url: s.url.clone(),
            source_type: s.source_type.to_string(),
            user_id: s.owner_user_id,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Public user shape; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// User row as persisted in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecordDto {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecordDto> for User {
    fn from(dto: UserRecordDto) -> Self {
        Self {
            id: dto.id,
            email: dto.email,
            password_hash: dto.password_hash,
            created_at: dto.created_at,
            updated_at: dto.updated_at,
        }
    }
}

impl From<&User> for UserRecordDto {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

fn zero_duration() -> String {
    "0s".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaInviteDto {
    #[serde(rename = "ResourceID", default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<Uuid>,
    #[serde(rename = "UserID", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    #[serde(rename = "Description", default)]
    pub description: String,
    #[serde(rename = "ExpiresAt")]
    pub expires_at: DateTime<Utc>,
    #[serde(rename = "NotBefore")]
    pub not_before: DateTime<Utc>,
    #[serde(rename = "NotAfter")]
    pub not_after: DateTime<Utc>,
    #[serde(rename = "PaddingBefore", default = "zero_duration")]
    pub padding_before: String,
    #[serde(rename = "PaddingAfter", default = "zero_duration")]
    pub padding_after: String,
    #[serde(rename = "SlotSizes", default)]
    pub slot_sizes: Vec<String>,
    #[serde(rename = "AgendaSources", default)]
    pub agenda_sources: Vec<Uuid>,
    #[serde(rename = "ProceduralAgendas", default)]
    pub procedural_agendas: Vec<Uuid>,
    #[serde(rename = "CreatedAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "UpdatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl AgendaInviteDto {
    /// Parse durations and check the draft invariants.
    ///
    /// # Errors
    /// `AgendaError::Validation` for a malformed duration string, empty or
    /// non-positive slot sizes, negative padding, or `NotBefore > NotAfter`.
    pub fn to_draft(&self) -> Result<InviteDraft> {
        let slot_sizes = self
            .slot_sizes
            .iter()
            .map(|s| parse_duration(s))
            .collect::<Result<Vec<_>>>()?;

        let draft = InviteDraft {
            description: self.description.clone(),
            expires_at: self.expires_at,
            not_before: self.not_before,
            not_after: self.not_after,
            padding_before: parse_duration(&self.padding_before)?,
            padding_after: parse_duration(&self.padding_after)?,
            slot_sizes,
            source_ids: self.agenda_sources.iter().copied().collect(),
            procedural_agenda_ids: self.procedural_agendas.iter().copied().collect(),
        };
        draft.validate()?;
        Ok(draft)
    }

    /// # Errors
    /// As [`AgendaInviteDto::to_draft`], plus `Validation` when the id or
    /// owner is missing.
    pub fn to_invite(&self) -> Result<AgendaInvite> {
        let id = self
            .resource_id
            .ok_or_else(|| AgendaError::Validation("invite is missing ResourceID".to_string()))?;
        let owner = self
            .user_id
            .ok_or_else(|| AgendaError::Validation(format!("invite {id} is missing UserID")))?;
        let created_at = self.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let mut invite = AgendaInvite::from_draft(id, owner, self.to_draft()?, created_at);
        invite.updated_at = self.updated_at.unwrap_or(created_at);
        Ok(invite)
    }
}

impl From<&AgendaInvite> for AgendaInviteDto {
    fn from(i: &AgendaInvite) -> Self {
        Self {
            resource_id: Some(i.id),
            user_id: Some(i.owner_user_id),
            description: i.description.clone(),
            expires_at: i.expires_at,
            not_before: i.not_before,
            not_after: i.not_after,
            padding_before: format_duration(i.padding_before),
            padding_after: format_duration(i.padding_after),
            slot_sizes: i.slot_sizes.iter().map(|d| format_duration(*d)).collect(),
            agenda_sources: i.source_ids.iter().copied().collect(),
            procedural_agendas: i.procedural_agenda_ids.iter().copied().collect(),
            created_at: Some(i.created_at),
            updated_at: Some(i.updated_at),
        }
    }
}

/// A whole store as a single JSON document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<UserRecordDto>,
    #[serde(default)]
    pub sources: Vec<AgendaSourceDto>,
    #[serde(default)]
    pub items: Vec<AgendaItemDto>,
    #[serde(default)]
    pub invites: Vec<AgendaInviteDto>,
    #[serde(default)]
    pub procedural_agendas: Vec<ProceduralAgenda>,
}

impl Snapshot {
    /// # Errors
    /// `AgendaError::Validation` for malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(malformed)
    }

    /// # Errors
    /// `AgendaError::Validation` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(malformed)
    }

    /// # Errors
    /// `AgendaError::Validation` for any row that fails conversion.
    pub fn into_records(self) -> Result<StoreRecords> {
        tracing::debug!(
            users = self.users.len(),
            sources = self.sources.len(),
            items = self.items.len(),
            invites = self.invites.len(),
            "decoding snapshot"
        );

        Ok(StoreRecords {
            users: self.users.into_iter().map(User::from).collect(),
            sources: self
                .sources
                .into_iter()
                .map(AgendaSource::try_from)
                .collect::<Result<_>>()?,
            intervals: self
                .items
                .into_iter()
                .map(BusyInterval::try_from)
                .collect::<Result<_>>()?,
            invites: self
                .invites
                .iter()
                .map(AgendaInviteDto::to_invite)
                .collect::<Result<_>>()?,
            procedural_agendas: self.procedural_agendas,
        })
    }

    pub fn from_records(records: &StoreRecords) -> Self {
        Self {
            users: records.users.iter().map(UserRecordDto::from).collect(),
            sources: records.sources.iter().map(AgendaSourceDto::from).collect(),
            items: records.intervals.iter().map(AgendaItemDto::from).collect(),
            invites: records.invites.iter().map(AgendaInviteDto::from).collect(),
            procedural_agendas: records.procedural_agendas.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVITE: &str = r#"{
        "Description": "intro call",
        "ExpiresAt": "2026-04-01T00:00:00Z",
        "NotBefore": "2026-03-02T09:00:00Z",
        "NotAfter": "2026-03-02T17:00:00Z",
        "PaddingBefore": "15m",
        "PaddingAfter": "15m",
        "SlotSizes": ["1h", "30m"]
    }"#;

    #[test]
    fn invite_dto_parses_duration_strings() {
        let dto: AgendaInviteDto = serde_json::from_str(INVITE).unwrap();
        let draft = dto.to_draft().unwrap();
        assert_eq!(draft.padding_before, chrono::Duration::minutes(15));
        assert_eq!(
            draft.slot_sizes,
            vec![chrono::Duration::hours(1), chrono::Duration::minutes(30)]
        );
    }

    #[test]
    fn bad_duration_string_is_a_validation_error() {
        let mut dto: AgendaInviteDto = serde_json::from_str(INVITE).unwrap();
        dto.slot_sizes = vec!["an hour".into()];
        assert!(matches!(dto.to_draft(), Err(AgendaError::Validation(_))));
    }

    #[test]
    fn missing_padding_defaults_to_zero() {
        let json = r#"{
            "ExpiresAt": "2026-04-01T00:00:00Z",
            "NotBefore": "2026-03-02T09:00:00Z",
            "NotAfter": "2026-03-02T17:00:00Z",
            "SlotSizes": ["1h"]
        }"#;
        let dto: AgendaInviteDto = serde_json::from_str(json).unwrap();
        assert_eq!(dto.to_draft().unwrap().padding_after, chrono::Duration::zero());
    }

    #[test]
    fn invite_without_id_cannot_be_restored() {
        let dto: AgendaInviteDto = serde_json::from_str(INVITE).unwrap();
        assert!(dto.to_invite().is_err());
    }

    #[test]
    fn user_dto_omits_password_hash() {
        let user = User {
            id: Uuid::nil(),
            email: "a@example.com".into(),
            password_hash: "secret".into(),
            created_at: DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&UserDto::from(&user)).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("createdAt"));
    }
}
