//! Invite policy guard: the privacy boundary between an owner's calendars and
//! whoever holds an invite link.
//!
//! A view request is checked against the invite's lifecycle, clipped to the
//! invite's window, resolved into free slots, and projected onto
//! [`AgendaItemView`]. Nothing but start, end and a fixed placeholder crosses
//! this boundary: no owner id, no source id, no event text.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::aggregator;
use crate::error::{AgendaError, Result};
use crate::interval::Interval;
use crate::model::{AgendaInvite, InviteId};
use crate::procedural;
use crate::resolver::{self, FreeSlot, Window};
use crate::store::AgendaStore;

pub const DEFAULT_PLACEHOLDER: &str = "Available";

/// Lifecycle state, derived from the clock on every request. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InviteState {
    Active,
    Expired,
}

impl InviteState {
    /// `Expired` once `now >= expires_at`.
    pub fn at(invite: &AgendaInvite, now: DateTime<Utc>) -> Self {
        if now >= invite.expires_at {
            Self::Expired
        } else {
            Self::Active
        }
    }
}

/// What an invite viewer receives for each offered slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaItemView {
    #[serde(rename = "StartTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "EndTime")]
    pub end_time: DateTime<Utc>,
    #[serde(rename = "Description")]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    /// Description attached to every view item.
    pub placeholder: String,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }
}

/// The requested range intersected with the invite's `[not_before, not_after]`.
///
/// A missing bound defaults to the invite's own. The result may be empty.
pub fn effective_window(
    invite: &AgendaInvite,
    requested_from: Option<DateTime<Utc>>,
    requested_to: Option<DateTime<Utc>>,
) -> Window {
    let start = requested_from.map_or(invite.not_before, |from| from.max(invite.not_before));
    let end = requested_to.map_or(invite.not_after, |to| to.min(invite.not_after));
    Window::new(start, end)
}

/// Strip free slots down to the whitelisted view fields.
pub fn project(slots: &[FreeSlot], placeholder: &str) -> Vec<AgendaItemView> {
    slots
        .iter()
        .map(|slot| AgendaItemView {
            start_time: slot.start,
            end_time: slot.end,
            description: placeholder.to_string(),
        })
        .collect()
}

/// Resolves invite views against an injected store.
#[derive(Debug)]
pub struct InviteGuard<'a, S: AgendaStore + ?Sized> {
    store: &'a S,
    options: ViewOptions,
}

impl<'a, S: AgendaStore + ?Sized> InviteGuard<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self::with_options(store, ViewOptions::default())
    }

    pub fn with_options(store: &'a S, options: ViewOptions) -> Self {
        Self { store, options }
    }

    /// Load an invite and compute the slots its holder may see.
    ///
    /// # Errors
    /// `NotFound` for an unknown invite, `Expired` once `now >= expires_at`,
    /// plus anything aggregation or resolution reports. Callers facing an
    /// outside viewer should translate with [`AgendaError::public`].
    pub fn view(
        &self,
        invite_id: InviteId,
        requested_from: Option<DateTime<Utc>>,
        requested_to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AgendaItemView>> {
        let invite = self.store.load_invite(invite_id)?;
        self.view_loaded(invite_id, invite.as_ref(), requested_from, requested_to, now)
    }

    /// As [`InviteGuard::view`], for an invite the caller already looked up.
    ///
    /// # Errors
    /// See [`InviteGuard::view`].
    pub fn view_loaded(
        &self,
        invite_id: InviteId,
        invite: Option<&AgendaInvite>,
        requested_from: Option<DateTime<Utc>>,
        requested_to: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<AgendaItemView>> {
        let Some(invite) = invite else {
            tracing::info!(invite = %invite_id, reason = "not_found", "invite view rejected");
            return Err(AgendaError::not_found("invite", invite_id));
        };

        if InviteState::at(invite, now) == InviteState::Expired {
            tracing::info!(
                invite = %invite_id,
                reason = "expired",
                expires_at = %invite.expires_at.to_rfc3339(),
                "invite view rejected"
            );
            return Err(AgendaError::Expired {
                id: invite_id.to_string(),
            });
        }

        let window = effective_window(invite, requested_from, requested_to);
        if window.is_empty() {
            return Ok(Vec::new());
        }

        let slots = self.free_slots(invite, window)?;
        tracing::debug!(invite = %invite_id, slots = slots.len(), "invite view resolved");
        Ok(project(&slots, &self.options.placeholder))
    }

    fn free_slots(&self, invite: &AgendaInvite, window: Window) -> Result<Vec<FreeSlot>> {
        let source_ids: Vec<_> = invite.source_ids.iter().copied().collect();
        let timeline = aggregator::aggregate(self.store, invite.owner_user_id, &source_ids)?;

        let mut busy: Vec<Interval> = timeline.intervals().collect();
        busy.extend(self.procedural_busy(invite, &window)?);

        resolver::resolve(
            busy,
            window,
            invite.padding_before,
            invite.padding_after,
            &invite.slot_sizes,
        )
    }

    /// Occurrences of linked procedural agendas that padding could push into `window`.
    fn procedural_busy(&self, invite: &AgendaInvite, window: &Window) -> Result<Vec<Interval>> {
        if invite.procedural_agenda_ids.is_empty() {
            return Ok(Vec::new());
        }

        let reach = Window::new(
            window
                .start
                .checked_sub_signed(invite.padding_after.max(Duration::zero()))
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
            window
                .end
                .checked_add_signed(invite.padding_before.max(Duration::zero()))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        );

        let ids: Vec<_> = invite.procedural_agenda_ids.iter().copied().collect();
        let agendas = self
            .store
            .load_procedural_agendas(invite.owner_user_id, &ids)?;

        let mut busy = Vec::new();
        for agenda in &agendas {
            busy.extend(procedural::expand_occurrences(agenda, &reach)?);
        }
        Ok(busy)
    }
}

/// [`InviteGuard::view`] with the default placeholder.
///
/// # Errors
/// See [`InviteGuard::view`].
pub fn view_invite<S: AgendaStore + ?Sized>(
    store: &S,
    invite_id: InviteId,
    requested_from: Option<DateTime<Utc>>,
    requested_to: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<Vec<AgendaItemView>> {
    InviteGuard::new(store).view(invite_id, requested_from, requested_to, now)
}
