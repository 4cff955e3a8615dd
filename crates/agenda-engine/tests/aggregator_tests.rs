//! Tests for cross-source busy time aggregation.

use agenda_engine::error::Result;
use agenda_engine::{
    aggregate, AgendaError, AgendaInvite, AgendaSource, AgendaStore, BusyInterval, MemoryStore,
    ProceduralAgenda, SourceType,
};
use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, min, 0).unwrap()
}

fn item(owner: Uuid, source: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) -> BusyInterval {
    BusyInterval::new(Uuid::new_v4(), owner, source, start, end, "standup").unwrap()
}

struct Fixture {
    store: MemoryStore,
    alice: Uuid,
    work: Uuid,
    personal: Uuid,
    bob: Uuid,
    bob_cal: Uuid,
}

fn fixture() -> Fixture {
    let store = MemoryStore::with_clock(|| Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    let alice = store.create_user("alice@example.com", "h1").unwrap().id;
    let bob = store.create_user("bob@example.com", "h2").unwrap().id;
    let work = store
        .create_source(alice, "https://cal.example.com/work.ics", SourceType::Proton)
        .unwrap()
        .id;
    let personal = store
        .create_source(alice, "https://cal.example.com/me.ics", SourceType::Proton)
        .unwrap()
        .id;
    let bob_cal = store
        .create_source(bob, "https://cal.example.com/bob.ics", SourceType::Proton)
        .unwrap()
        .id;

    store
        .ingest_intervals(
            alice,
            vec![
                item(alice, work, at(14, 0), at(15, 0)),
                item(alice, work, at(10, 0), at(11, 0)),
                item(alice, personal, at(10, 30), at(12, 0)),
            ],
        )
        .unwrap();
    store
        .ingest_intervals(bob, vec![item(bob, bob_cal, at(9, 0), at(10, 0))])
        .unwrap();

    Fixture {
        store,
        alice,
        work,
        personal,
        bob,
        bob_cal,
    }
}

#[test]
fn timeline_spans_all_requested_sources_sorted_by_start() {
    let f = fixture();
    let timeline = aggregate(&f.store, f.alice, &[f.work, f.personal]).unwrap();

    let starts: Vec<_> = timeline.iter().map(|i| i.start).collect();
    assert_eq!(starts, vec![at(10, 0), at(10, 30), at(14, 0)]);
}

#[test]
fn overlapping_intervals_are_kept_unmerged() {
    // Merging belongs to the resolver; aggregation only collects.
    let f = fixture();
    let timeline = aggregate(&f.store, f.alice, &[f.work, f.personal]).unwrap();
    assert_eq!(timeline.len(), 3);
}

#[test]
fn only_requested_sources_contribute() {
    let f = fixture();
    let timeline = aggregate(&f.store, f.alice, &[f.personal]).unwrap();
    assert_eq!(timeline.len(), 1);
    assert!(timeline.iter().all(|i| i.source_id == f.personal));
}

#[test]
fn repeated_source_ids_do_not_duplicate_intervals() {
    let f = fixture();
    let timeline = aggregate(&f.store, f.alice, &[f.work, f.work, f.work]).unwrap();
    assert_eq!(timeline.len(), 2);
}

#[test]
fn no_sources_means_empty_timeline() {
    let f = fixture();
    let timeline = aggregate(&f.store, f.alice, &[]).unwrap();
    assert!(timeline.is_empty());
}

#[test]
fn foreign_source_is_an_error_not_a_silent_drop() {
    let f = fixture();
    let err = aggregate(&f.store, f.alice, &[f.work, f.bob_cal]).unwrap_err();
    assert!(matches!(err, AgendaError::Unauthorized(_)));
}

#[test]
fn unknown_source_is_not_found() {
    let f = fixture();
    let err = aggregate(&f.store, f.alice, &[Uuid::new_v4()]).unwrap_err();
    assert!(matches!(err, AgendaError::NotFound { kind: "source", .. }));
}

#[test]
fn other_users_intervals_never_leak_in() {
    let f = fixture();
    let timeline = aggregate(&f.store, f.bob, &[f.bob_cal]).unwrap();
    assert_eq!(timeline.len(), 1);
    assert!(timeline.iter().all(|i| i.owner_user_id == f.bob));
}

#[test]
fn timeline_converts_to_plain_intervals() {
    let f = fixture();
    let timeline = aggregate(&f.store, f.alice, &[f.work]).unwrap();
    let plain: Vec<_> = timeline.intervals().collect();
    assert_eq!(plain[0].start, at(10, 0));
    assert_eq!(plain[0].end, at(11, 0));
}

/// A store that hands back whatever rows it holds, duplicates and foreign
/// rows included.
struct LeakyStore {
    source: AgendaSource,
    rows: Vec<BusyInterval>,
}

impl AgendaStore for LeakyStore {
    fn load_source(&self, source_id: Uuid) -> Result<Option<AgendaSource>> {
        Ok((source_id == self.source.id).then(|| self.source.clone()))
    }

    fn load_busy_intervals(
        &self,
        _user_id: Uuid,
        _source_ids: &[Uuid],
    ) -> Result<Vec<BusyInterval>> {
        Ok(self.rows.clone())
    }

    fn load_invite(&self, _invite_id: Uuid) -> Result<Option<AgendaInvite>> {
        Ok(None)
    }

    fn load_procedural_agendas(
        &self,
        _user_id: Uuid,
        _ids: &[Uuid],
    ) -> Result<Vec<ProceduralAgenda>> {
        Ok(Vec::new())
    }
}

#[test]
fn duplicate_and_foreign_rows_from_the_store_are_dropped() {
    let alice = Uuid::new_v4();
    let mallory = Uuid::new_v4();
    let source = AgendaSource {
        id: Uuid::new_v4(),
        owner_user_id: alice,
        url: "https://cal.example.com/work.ics".to_string(),
        source_type: SourceType::Proton,
        created_at: at(0, 0),
        updated_at: at(0, 0),
    };
    let meeting = item(alice, source.id, at(10, 0), at(11, 0));
    let foreign = item(mallory, source.id, at(12, 0), at(13, 0));
    let store = LeakyStore {
        source: source.clone(),
        rows: vec![meeting.clone(), foreign, meeting.clone()],
    };

    let timeline = aggregate(&store, alice, &[source.id]).unwrap();

    assert_eq!(timeline.into_vec(), vec![meeting]);
}
