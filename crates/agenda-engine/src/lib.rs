//! # agenda-engine
//!
//! Availability resolution for shareable agenda invites.
//!
//! A user registers agenda sources (external calendars), busy intervals are
//! ingested from them, and the user hands out invites. An invite holder sees
//! bookable free slots computed from the owner's busy time, never the events
//! themselves.
//!
//! ## Quick start
//!
//! ```rust
//! use agenda_engine::{resolve, Interval, Window};
//! use chrono::{Duration, TimeZone, Utc};
//!
//! let day = |h| Utc.with_ymd_and_hms(2026, 3, 2, h, 0, 0).unwrap();
//! let busy = vec![Interval::new(day(10), day(11)).unwrap()];
//!
//! let slots = resolve(
//!     busy,
//!     Window::new(day(9), day(17)),
//!     Duration::minutes(15),
//!     Duration::minutes(15),
//!     &[Duration::hours(1)],
//! )
//! .unwrap();
//!
//! // 09:00-09:45 is too short for an hour; the next region opens at 11:15.
//! assert_eq!(slots.len(), 1);
//! assert_eq!(slots[0].start, day(11) + Duration::minutes(15));
//! ```
//!
//! ## Modules
//!
//! - [`interval`] - half-open intervals, overlap and padding
//! - [`aggregator`] - merge busy intervals across a user's sources
//! - [`resolver`] - busy timeline + window + padding → free slots
//! - [`invite`] - invite lifecycle and the privacy-stripped view
//! - [`procedural`] - RRULE-described recurring busy blocks
//! - [`model`] - users, sources, invites
//! - [`store`] - persistence contract and in-memory store
//! - [`pagination`] - page/pageSize/order for listings
//! - [`duration`] - `"30m"`-style duration strings
//! - [`wire`] - JSON shapes for the service boundary
//! - [`error`] - Error types

pub mod aggregator;
pub mod duration;
pub mod error;
pub mod interval;
pub mod invite;
pub mod model;
pub mod pagination;
pub mod procedural;
pub mod resolver;
pub mod store;
pub mod wire;

pub use aggregator::{aggregate, BusyTimeline};
pub use duration::{format_duration, parse_duration};
pub use error::{AgendaError, PublicError};
pub use interval::{overlaps, pad, BusyInterval, Interval};
pub use invite::{view_invite, AgendaItemView, InviteGuard, InviteState, ViewOptions};
pub use model::{AgendaInvite, AgendaSource, InviteDraft, SourceType, User};
pub use pagination::{Page, PageRequest, Pagination, SortOrder};
pub use procedural::{expand_occurrences, ProceduralAgenda};
pub use resolver::{resolve, FreeSlot, Window};
pub use store::{AgendaStore, MemoryStore};
