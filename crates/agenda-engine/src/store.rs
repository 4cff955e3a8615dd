//! Persistence contract and the in-memory reference store.
//!
//! [`AgendaStore`] is the read side the aggregator and invite guard consume.
//! [`MemoryStore`] implements it together with the owner-scoped CRUD the
//! service layer needs. Every mutation runs under a single write lock, so
//! concurrent updates to the same invite cannot lose each other's writes.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{AgendaError, Result};
use crate::interval::{BusyInterval, IntervalId, SourceId, UserId};
use crate::model::{AgendaInvite, AgendaSource, InviteDraft, InviteId, SourceType, User};
use crate::pagination::{Page, PageRequest, SortOrder};
use crate::procedural::{ProceduralAgenda, ProceduralAgendaId};

/// Read access used by the resolution path.
///
/// Each call is its own read. An invite view issues several of them (invite,
/// sources, intervals, procedural agendas), so a write landing between two
/// calls is visible to the later ones only. Implementations that need one
/// consistent snapshot per view must provide it themselves.
pub trait AgendaStore: Send + Sync {
    fn load_source(&self, source_id: SourceId) -> Result<Option<AgendaSource>>;

    /// Busy intervals of `user_id` belonging to any of `source_ids`.
    fn load_busy_intervals(
        &self,
        user_id: UserId,
        source_ids: &[SourceId],
    ) -> Result<Vec<BusyInterval>>;

    fn load_invite(&self, invite_id: InviteId) -> Result<Option<AgendaInvite>>;

    /// Procedural agendas of `user_id` among `ids`; foreign or missing ids are skipped.
    fn load_procedural_agendas(
        &self,
        user_id: UserId,
        ids: &[ProceduralAgendaId],
    ) -> Result<Vec<ProceduralAgenda>>;
}

/// Partial update for a user; `None` or an empty string leaves the field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Partial update for a source. Only url and type are mutable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceUpdate {
    pub url: Option<String>,
    pub source_type: Option<SourceType>,
}

/// Filters for [`MemoryStore::list_intervals`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntervalQuery {
    pub source_id: Option<SourceId>,
    /// Keep intervals ending after this instant.
    pub from: Option<DateTime<Utc>>,
    /// Keep intervals starting before this instant.
    pub to: Option<DateTime<Utc>>,
}

/// Everything a [`MemoryStore`] holds, in plain form for import/export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreRecords {
    pub users: Vec<User>,
    pub sources: Vec<AgendaSource>,
    pub intervals: Vec<BusyInterval>,
    pub invites: Vec<AgendaInvite>,
    pub procedural_agendas: Vec<ProceduralAgenda>,
}

#[derive(Debug, Clone)]
struct Row<T> {
    seq: u64,
    value: T,
}

#[derive(Debug, Default)]
struct Inner {
    next_seq: u64,
    users: BTreeMap<UserId, User>,
    sources: BTreeMap<SourceId, Row<AgendaSource>>,
    intervals: BTreeMap<IntervalId, BusyInterval>,
    invites: BTreeMap<InviteId, Row<AgendaInvite>>,
    procedural: BTreeMap<ProceduralAgendaId, ProceduralAgenda>,
}

impl Inner {
    fn seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    fn require_user(&self, user_id: UserId) -> Result<&User> {
        self.users
            .get(&user_id)
            .ok_or_else(|| AgendaError::not_found("user", user_id))
    }

    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }

    fn owned_source(&self, owner: UserId, source_id: SourceId) -> Result<&Row<AgendaSource>> {
        let row = self
            .sources
            .get(&source_id)
            .ok_or_else(|| AgendaError::not_found("source", source_id))?;
        if row.value.owner_user_id != owner {
            return Err(AgendaError::Unauthorized(format!(
                "source {source_id} does not belong to user {owner}"
            )));
        }
        Ok(row)
    }

    fn owned_invite_mut(&mut self, owner: UserId, invite_id: InviteId) -> Result<&mut Row<AgendaInvite>> {
        match self.invites.get_mut(&invite_id) {
            Some(row) if row.value.owner_user_id == owner => Ok(row),
            _ => Err(AgendaError::not_found("invite", invite_id)),
        }
    }

    /// Every source and procedural agenda a draft links must belong to `owner`.
    fn check_draft_links(&self, owner: UserId, draft: &InviteDraft) -> Result<()> {
        for source_id in &draft.source_ids {
            self.owned_source(owner, *source_id)?;
        }
        for agenda_id in &draft.procedural_agenda_ids {
            let agenda = self
                .procedural
                .get(agenda_id)
                .ok_or_else(|| AgendaError::not_found("procedural agenda", agenda_id))?;
            if agenda.owner_user_id != owner {
                return Err(AgendaError::Unauthorized(format!(
                    "procedural agenda {agenda_id} does not belong to user {owner}"
                )));
            }
        }
        Ok(())
    }

    fn check_interval(&self, owner: UserId, item: &BusyInterval) -> Result<()> {
        if item.start >= item.end {
            return Err(AgendaError::Validation(format!(
                "agenda item {} must start before it ends",
                item.id
            )));
        }
        if item.owner_user_id != owner {
            return Err(AgendaError::Unauthorized(format!(
                "agenda item {} is not owned by user {owner}",
                item.id
            )));
        }
        self.owned_source(owner, item.source_id)?;
        if let Some(existing) = self.intervals.get(&item.id) {
            if existing.owner_user_id != owner {
                return Err(AgendaError::Unauthorized(format!(
                    "agenda item {} belongs to another user",
                    item.id
                )));
            }
        }
        Ok(())
    }

    fn remove_source_cascade(&mut self, source_id: SourceId) {
        self.sources.remove(&source_id);
        self.intervals.retain(|_, i| i.source_id != source_id);
        for row in self.invites.values_mut() {
            row.value.source_ids.remove(&source_id);
        }
    }
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Thread-safe in-memory implementation of the persistence collaborator.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    clock: Clock,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("inner", &*self.inner.read())
            .finish_non_exhaustive()
    }
}

fn sort_rows<T: Clone>(
    mut rows: Vec<&Row<T>>,
    order: SortOrder,
    updated_at: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    rows.sort_by_key(|r| (updated_at(&r.value), r.seq));
    if order == SortOrder::Desc {
        rows.reverse();
    }
    rows.into_iter().map(|r| r.value.clone()).collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn check_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AgendaError::Validation(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}

fn check_url(raw: &str) -> Result<()> {
    url::Url::parse(raw.trim())
        .map(|_| ())
        .map_err(|e| AgendaError::Validation(format!("'{raw}' is not a valid URL: {e}")))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Utc::now)
    }

    /// Use `clock` for `created_at`/`updated_at` stamps.
    pub fn with_clock(clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock: Box::new(clock),
        }
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    // ── Users ───────────────────────────────────────────────────────────────

    /// # Errors
    /// `Validation` for a malformed email or empty hash, `Conflict` when the
    /// email is already registered (case-insensitive).
    pub fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        let email = email.trim();
        check_email(email)?;
        if password_hash.is_empty() {
            return Err(AgendaError::Validation(
                "password hash must not be empty".to_string(),
            ));
        }

        let now = self.now();
        let mut inner = self.inner.write();
        if inner.email_taken(email, None) {
            return Err(AgendaError::Conflict(format!("email {email} is already registered")));
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        tracing::debug!(user = %user.id, "user created");
        Ok(user)
    }

    /// # Errors
    /// `NotFound` when the user does not exist.
    pub fn get_user(&self, user_id: UserId) -> Result<User> {
        self.inner.read().require_user(user_id).cloned()
    }

    /// # Errors
    /// `NotFound`, `Validation` for a malformed email, `Conflict` on a taken email.
    pub fn update_user(&self, user_id: UserId, update: UserUpdate) -> Result<User> {
        let email = non_empty(update.email).map(|e| e.trim().to_string());
        if let Some(email) = &email {
            check_email(email)?;
        }
        let password_hash = non_empty(update.password_hash);

        let now = self.now();
        let mut inner = self.inner.write();
        inner.require_user(user_id)?;
        if let Some(email) = &email {
            if inner.email_taken(email, Some(user_id)) {
                return Err(AgendaError::Conflict(format!("email {email} is already registered")));
            }
        }

        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AgendaError::not_found("user", user_id))?;
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(hash) = password_hash {
            user.password_hash = hash;
        }
        user.updated_at = now;
        Ok(user.clone())
    }

    /// Delete a user and everything they own.
    ///
    /// # Errors
    /// `NotFound` when the user does not exist.
    pub fn delete_user(&self, user_id: UserId) -> Result<()> {
        let mut inner = self.inner.write();
        inner.require_user(user_id)?;
        inner.users.remove(&user_id);
        inner.sources.retain(|_, r| r.value.owner_user_id != user_id);
        inner.intervals.retain(|_, i| i.owner_user_id != user_id);
        inner.invites.retain(|_, r| r.value.owner_user_id != user_id);
        inner.procedural.retain(|_, p| p.owner_user_id != user_id);
        tracing::debug!(user = %user_id, "user deleted with all owned data");
        Ok(())
    }

    // ── Agenda sources ──────────────────────────────────────────────────────

    /// # Errors
    /// `NotFound` for an unknown owner, `Validation` for a malformed URL.
    pub fn create_source(
        &self,
        owner: UserId,
        url: &str,
        source_type: SourceType,
    ) -> Result<AgendaSource> {
        check_url(url)?;
        let now = self.now();
        let mut inner = self.inner.write();
        inner.require_user(owner)?;

        let source = AgendaSource {
            id: Uuid::new_v4(),
            owner_user_id: owner,
            url: url.trim().to_string(),
            source_type,
            created_at: now,
            updated_at: now,
        };
        let seq = inner.seq();
        inner.sources.insert(
            source.id,
            Row {
                seq,
                value: source.clone(),
            },
        );
        Ok(source)
    }

    /// # Errors
    /// `NotFound` for an unknown source, `Unauthorized` for someone else's.
    pub fn get_source(&self, owner: UserId, source_id: SourceId) -> Result<AgendaSource> {
        let inner = self.inner.read();
        inner.owned_source(owner, source_id).map(|r| r.value.clone())
    }

    /// # Errors
    /// As [`MemoryStore::get_source`], plus `Validation` for a malformed URL.
    pub fn update_source(
        &self,
        owner: UserId,
        source_id: SourceId,
        update: SourceUpdate,
    ) -> Result<AgendaSource> {
        let url = non_empty(update.url);
        if let Some(url) = &url {
            check_url(url)?;
        }

        let now = self.now();
        let mut inner = self.inner.write();
        inner.owned_source(owner, source_id)?;
        let row = inner
            .sources
            .get_mut(&source_id)
            .ok_or_else(|| AgendaError::not_found("source", source_id))?;
        if let Some(url) = url {
            row.value.url = url.trim().to_string();
        }
        if let Some(source_type) = update.source_type {
            row.value.source_type = source_type;
        }
        row.value.updated_at = now;
        Ok(row.value.clone())
    }

    /// Delete a source, its agenda items, and its links from invites.
    ///
    /// # Errors
    /// `NotFound` for an unknown source, `Unauthorized` for someone else's.
    pub fn delete_source(&self, owner: UserId, source_id: SourceId) -> Result<()> {
        let mut inner = self.inner.write();
        inner.owned_source(owner, source_id)?;
        inner.remove_source_cascade(source_id);
        tracing::debug!(source = %source_id, "source deleted with its agenda items");
        Ok(())
    }

    /// Sources of `owner`, ordered by `updated_at`.
    ///
    /// # Errors
    /// `Validation` for an out-of-range page request.
    pub fn list_sources(&self, owner: UserId, request: &PageRequest) -> Result<Page<AgendaSource>> {
        request.validate()?;
        let inner = self.inner.read();
        let rows: Vec<&Row<AgendaSource>> = inner
            .sources
            .values()
            .filter(|r| r.value.owner_user_id == owner)
            .collect();
        Page::from_sorted(sort_rows(rows, request.order, |s| s.updated_at), request)
    }

    // ── Agenda items ────────────────────────────────────────────────────────

    /// Insert or replace agenda items by id. All-or-nothing.
    ///
    /// # Errors
    /// `Validation` for an empty interval, `NotFound` for an unknown source,
    /// `Unauthorized` when any item or its source belongs to someone else.
    pub fn ingest_intervals(&self, owner: UserId, items: Vec<BusyInterval>) -> Result<usize> {
        let mut inner = self.inner.write();
        inner.require_user(owner)?;
        for item in &items {
            inner.check_interval(owner, item)?;
        }
        let count = items.len();
        for item in items {
            inner.intervals.insert(item.id, item);
        }
        tracing::debug!(user = %owner, count, "agenda items ingested");
        Ok(count)
    }

    /// # Errors
    /// `NotFound` when missing or owned by someone else.
    pub fn get_interval(&self, owner: UserId, interval_id: IntervalId) -> Result<BusyInterval> {
        let inner = self.inner.read();
        inner
            .intervals
            .get(&interval_id)
            .filter(|i| i.owner_user_id == owner)
            .cloned()
            .ok_or_else(|| AgendaError::not_found("agenda item", interval_id))
    }

    /// # Errors
    /// `NotFound` when missing or owned by someone else.
    pub fn delete_interval(&self, owner: UserId, interval_id: IntervalId) -> Result<()> {
        let mut inner = self.inner.write();
        match inner.intervals.get(&interval_id) {
            Some(i) if i.owner_user_id == owner => {
                inner.intervals.remove(&interval_id);
                Ok(())
            }
            _ => Err(AgendaError::not_found("agenda item", interval_id)),
        }
    }

    /// Agenda items of `owner` matching `query`, ordered by `(start, end)`.
    ///
    /// # Errors
    /// `Validation` for an out-of-range page request.
    pub fn list_intervals(
        &self,
        owner: UserId,
        query: &IntervalQuery,
        request: &PageRequest,
    ) -> Result<Page<BusyInterval>> {
        request.validate()?;
        let inner = self.inner.read();
        let mut items: Vec<BusyInterval> = inner
            .intervals
            .values()
            .filter(|i| i.owner_user_id == owner)
            .filter(|i| query.source_id.is_none_or(|s| i.source_id == s))
            .filter(|i| query.from.is_none_or(|from| i.end > from))
            .filter(|i| query.to.is_none_or(|to| i.start < to))
            .cloned()
            .collect();
        items.sort_by_key(|i| (i.start, i.end, i.id));
        if request.order == SortOrder::Desc {
            items.reverse();
        }
        Page::from_sorted(items, request)
    }

    // ── Agenda invites ──────────────────────────────────────────────────────

    /// # Errors
    /// `Validation` for a bad draft, `NotFound`/`Unauthorized` for bad links.
    pub fn create_invite(&self, owner: UserId, draft: InviteDraft) -> Result<AgendaInvite> {
        draft.validate()?;
        let now = self.now();
        let mut inner = self.inner.write();
        inner.require_user(owner)?;
        inner.check_draft_links(owner, &draft)?;

        let invite = AgendaInvite::from_draft(Uuid::new_v4(), owner, draft, now);
        let seq = inner.seq();
        inner.invites.insert(
            invite.id,
            Row {
                seq,
                value: invite.clone(),
            },
        );
        tracing::debug!(invite = %invite.id, user = %owner, "invite created");
        Ok(invite)
    }

    /// # Errors
    /// `NotFound` when missing or owned by someone else.
    pub fn get_invite(&self, owner: UserId, invite_id: InviteId) -> Result<AgendaInvite> {
        let inner = self.inner.read();
        inner
            .invites
            .get(&invite_id)
            .filter(|r| r.value.owner_user_id == owner)
            .map(|r| r.value.clone())
            .ok_or_else(|| AgendaError::not_found("invite", invite_id))
    }

    /// Replace the owner-editable fields of an invite.
    ///
    /// # Errors
    /// As [`MemoryStore::create_invite`], plus `NotFound` for a foreign invite.
    pub fn update_invite(
        &self,
        owner: UserId,
        invite_id: InviteId,
        draft: InviteDraft,
    ) -> Result<AgendaInvite> {
        draft.validate()?;
        let now = self.now();
        let mut inner = self.inner.write();
        inner.owned_invite_mut(owner, invite_id)?;
        inner.check_draft_links(owner, &draft)?;
        let row = inner.owned_invite_mut(owner, invite_id)?;
        row.value.apply(draft, now);
        Ok(row.value.clone())
    }

    /// # Errors
    /// `NotFound` when missing or owned by someone else.
    pub fn delete_invite(&self, owner: UserId, invite_id: InviteId) -> Result<()> {
        let mut inner = self.inner.write();
        inner.owned_invite_mut(owner, invite_id)?;
        inner.invites.remove(&invite_id);
        Ok(())
    }

    /// Invites of `owner`, ordered by `updated_at`.
    ///
    /// # Errors
    /// `Validation` for an out-of-range page request.
    pub fn list_invites(&self, owner: UserId, request: &PageRequest) -> Result<Page<AgendaInvite>> {
        request.validate()?;
        let inner = self.inner.read();
        let rows: Vec<&Row<AgendaInvite>> = inner
            .invites
            .values()
            .filter(|r| r.value.owner_user_id == owner)
            .collect();
        Page::from_sorted(sort_rows(rows, request.order, |i| i.updated_at), request)
    }

    // ── Procedural agendas ──────────────────────────────────────────────────

    /// Store a procedural agenda under a fresh id owned by `owner`.
    ///
    /// # Errors
    /// `NotFound` for an unknown owner, rule/timezone errors from validation.
    pub fn create_procedural_agenda(
        &self,
        owner: UserId,
        mut agenda: ProceduralAgenda,
    ) -> Result<ProceduralAgenda> {
        agenda.id = Uuid::new_v4();
        agenda.owner_user_id = owner;
        agenda.validate()?;

        let mut inner = self.inner.write();
        inner.require_user(owner)?;
        inner.procedural.insert(agenda.id, agenda.clone());
        Ok(agenda)
    }

    /// Delete a procedural agenda and unlink it from invites.
    ///
    /// # Errors
    /// `NotFound` when missing or owned by someone else.
    pub fn delete_procedural_agenda(&self, owner: UserId, agenda_id: ProceduralAgendaId) -> Result<()> {
        let mut inner = self.inner.write();
        match inner.procedural.get(&agenda_id) {
            Some(a) if a.owner_user_id == owner => {}
            _ => return Err(AgendaError::not_found("procedural agenda", agenda_id)),
        }
        inner.procedural.remove(&agenda_id);
        for row in inner.invites.values_mut() {
            row.value.procedural_agenda_ids.remove(&agenda_id);
        }
        Ok(())
    }

    // ── Import / export ─────────────────────────────────────────────────────

    /// Build a store from previously exported records, checking every reference.
    ///
    /// # Errors
    /// `Conflict` on duplicate emails, `Validation` for malformed rows, and
    /// `NotFound`/`Unauthorized` for dangling or cross-user references.
    pub fn restore(records: StoreRecords) -> Result<Self> {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for mut user in records.users {
                user.email = user.email.trim().to_string();
                check_email(&user.email)?;
                if inner.email_taken(&user.email, None) {
                    return Err(AgendaError::Conflict(format!(
                        "email {} is already registered",
                        user.email
                    )));
                }
                inner.users.insert(user.id, user);
            }
            for source in records.sources {
                inner.require_user(source.owner_user_id)?;
                check_url(&source.url)?;
                let seq = inner.seq();
                inner.sources.insert(source.id, Row { seq, value: source });
            }
            for agenda in records.procedural_agendas {
                inner.require_user(agenda.owner_user_id)?;
                agenda.validate()?;
                inner.procedural.insert(agenda.id, agenda);
            }
            for item in records.intervals {
                inner.check_interval(item.owner_user_id, &item)?;
                inner.intervals.insert(item.id, item);
            }
            for invite in records.invites {
                inner.require_user(invite.owner_user_id)?;
                let draft = InviteDraft {
                    description: invite.description.clone(),
                    expires_at: invite.expires_at,
                    not_before: invite.not_before,
                    not_after: invite.not_after,
                    padding_before: invite.padding_before,
                    padding_after: invite.padding_after,
                    slot_sizes: invite.slot_sizes.clone(),
                    source_ids: invite.source_ids.clone(),
                    procedural_agenda_ids: invite.procedural_agenda_ids.clone(),
                };
                draft.validate()?;
                inner.check_draft_links(invite.owner_user_id, &draft)?;
                let seq = inner.seq();
                inner.invites.insert(invite.id, Row { seq, value: invite });
            }
        }
        Ok(store)
    }

    /// Copy out everything in insertion order.
    pub fn dump(&self) -> StoreRecords {
        let inner = self.inner.read();
        let mut sources: Vec<&Row<AgendaSource>> = inner.sources.values().collect();
        sources.sort_by_key(|r| r.seq);
        let mut invites: Vec<&Row<AgendaInvite>> = inner.invites.values().collect();
        invites.sort_by_key(|r| r.seq);

        StoreRecords {
            users: inner.users.values().cloned().collect(),
            sources: sources.into_iter().map(|r| r.value.clone()).collect(),
            intervals: inner.intervals.values().cloned().collect(),
            invites: invites.into_iter().map(|r| r.value.clone()).collect(),
            procedural_agendas: inner.procedural.values().cloned().collect(),
        }
    }
}

impl AgendaStore for MemoryStore {
    fn load_source(&self, source_id: SourceId) -> Result<Option<AgendaSource>> {
        Ok(self
            .inner
            .read()
            .sources
            .get(&source_id)
            .map(|r| r.value.clone()))
    }

    fn load_busy_intervals(
        &self,
        user_id: UserId,
        source_ids: &[SourceId],
    ) -> Result<Vec<BusyInterval>> {
        let wanted: HashSet<&SourceId> = source_ids.iter().collect();
        Ok(self
            .inner
            .read()
            .intervals
            .values()
            .filter(|i| i.owner_user_id == user_id && wanted.contains(&i.source_id))
            .cloned()
            .collect())
    }

    fn load_invite(&self, invite_id: InviteId) -> Result<Option<AgendaInvite>> {
        Ok(self
            .inner
            .read()
            .invites
            .get(&invite_id)
            .map(|r| r.value.clone()))
    }

    fn load_procedural_agendas(
        &self,
        user_id: UserId,
        ids: &[ProceduralAgendaId],
    ) -> Result<Vec<ProceduralAgenda>> {
        let inner = self.inner.read();
        let unique: BTreeSet<&ProceduralAgendaId> = ids.iter().collect();
        Ok(unique
            .into_iter()
            .filter_map(|id| inner.procedural.get(id))
            .filter(|a| a.owner_user_id == user_id)
            .cloned()
            .collect())
    }
}
