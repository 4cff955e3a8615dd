//! `agenda` CLI: resolve availability and invite views from JSON on the command line.
//!
//! ## Usage
//!
//! ```sh
//! # Free slots for a raw busy list (stdin → stdout)
//! cat busy.json | agenda resolve --from 2026-03-02T09:00:00Z --to 2026-03-02T17:00:00Z \
//!     --padding-before 15m --padding-after 15m --slot 1h
//!
//! # What an invite holder sees, from an exported store snapshot
//! agenda view --snapshot store.json --invite 6f1c...
//!
//! # Validate an invite document and print it normalised
//! agenda check-invite -i invite.json
//!
//! # Page through a user's sources or invites
//! agenda sources --snapshot store.json --user 0b7e... --page 2 --order desc
//! ```

mod settings;

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use agenda_engine::wire::{AgendaInviteDto, AgendaSourceDto, Snapshot};
use agenda_engine::{
    format_duration, parse_duration, resolve, Interval, InviteGuard, MemoryStore, SortOrder,
    Window,
};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::settings::Settings;

#[derive(Parser)]
#[command(
    name = "agenda",
    version,
    about = "Resolve bookable availability for agenda invites"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (defaults to ./agenda.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "agenda_engine=trace"
    #[arg(long, global = true, env = "AGENDA_LOG")]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute free slots from a JSON list of busy intervals
    Resolve {
        /// Busy intervals as `[{"start": .., "end": ..}]` (reads stdin if omitted or "-")
        #[arg(long)]
        busy: Option<String>,
        /// Window start (RFC 3339)
        #[arg(long)]
        from: DateTime<Utc>,
        /// Window end (RFC 3339)
        #[arg(long)]
        to: DateTime<Utc>,
        #[arg(long, value_parser = parse_duration, default_value = "0s")]
        padding_before: Duration,
        #[arg(long, value_parser = parse_duration, default_value = "0s")]
        padding_after: Duration,
        /// Slot size to offer, repeatable (e.g. --slot 1h --slot 30m)
        #[arg(long = "slot", value_parser = parse_duration)]
        slots: Vec<Duration>,
    },
    /// Show the free slots an invite holder would see
    View {
        /// Store snapshot JSON
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        invite: Uuid,
        /// Narrow the invite window from this instant
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Narrow the invite window up to this instant
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        /// Evaluate expiry at this instant instead of the current time
        #[arg(long)]
        now: Option<DateTime<Utc>>,
    },
    /// Validate an invite document and print it normalised
    CheckInvite {
        /// Input file (reads from stdin if omitted or "-")
        #[arg(short, long)]
        input: Option<String>,
    },
    /// List a user's agenda sources, ordered by last update
    Sources {
        #[command(flatten)]
        listing: Listing,
    },
    /// List a user's invites, ordered by last update
    Invites {
        #[command(flatten)]
        listing: Listing,
    },
}

#[derive(clap::Args)]
struct Listing {
    /// Store snapshot JSON
    #[arg(long)]
    snapshot: PathBuf,
    #[arg(long)]
    user: Uuid,
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Defaults to `pagination.default_page_size`
    #[arg(long)]
    page_size: Option<usize>,
    #[arg(long, value_enum, default_value_t = Order::Asc)]
    order: Order,
}

#[derive(Clone, Copy, ValueEnum)]
enum Order {
    Asc,
    Desc,
}

impl From<Order> for SortOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Asc => SortOrder::Asc,
            Order::Desc => SortOrder::Desc,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    init_logging(cli.log_level.as_deref().unwrap_or(settings.logging.level.as_str()));

    match cli.command {
        Commands::Resolve {
            busy,
            from,
            to,
            padding_before,
            padding_after,
            slots,
        } => {
            let raw = read_input(busy.as_deref())?;
            let busy = parse_busy(&raw)?;
            let free = resolve(
                busy,
                Window::new(from, to),
                padding_before,
                padding_after,
                &slots,
            )?;
            print_json(&free)?;
        }
        Commands::View {
            snapshot,
            invite,
            from,
            to,
            now,
        } => {
            let store = load_store(&snapshot)?;
            let guard = InviteGuard::with_options(&store, settings.view_options());
            let view = guard
                .view(invite, from, to, now.unwrap_or_else(Utc::now))
                .map_err(|e| anyhow!(e.public()))?;
            print_json(&view)?;
        }
        Commands::CheckInvite { input } => {
            let raw = read_input(input.as_deref())?;
            let dto: AgendaInviteDto =
                serde_json::from_str(&raw).context("Failed to parse invite JSON")?;
            print_json(&normalise_invite(dto)?)?;
        }
        Commands::Sources { listing } => {
            let store = load_store(&listing.snapshot)?;
            let request = page_request(&settings, &listing)?;
            let page = store
                .list_sources(listing.user, &request)?
                .map(|s| AgendaSourceDto::from(&s));
            print_json(&page)?;
        }
        Commands::Invites { listing } => {
            let store = load_store(&listing.snapshot)?;
            let request = page_request(&settings, &listing)?;
            let page = store
                .list_invites(listing.user, &request)?
                .map(|i| AgendaInviteDto::from(&i));
            print_json(&page)?;
        }
    }

    Ok(())
}

/// Log to stderr so stdout stays parseable JSON.
fn init_logging(level: &str) {
    let (filter, rejected) = match EnvFilter::try_new(level) {
        Ok(filter) => (filter, false),
        Err(_) => (EnvFilter::new("info"), true),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .init();

    if rejected {
        tracing::warn!(level = %level, "Invalid log level, falling back to info");
    }
}

#[derive(serde::Deserialize)]
struct BusyRow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

fn parse_busy(raw: &str) -> Result<Vec<Interval>> {
    let rows: Vec<BusyRow> = serde_json::from_str(raw).context("Failed to parse busy JSON")?;
    rows.into_iter()
        .enumerate()
        .map(|(n, row)| {
            Interval::new(row.start, row.end).with_context(|| format!("Busy interval #{n}"))
        })
        .collect()
}

fn load_store(path: &Path) -> Result<MemoryStore> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let records = Snapshot::from_json(&raw)?.into_records()?;
    MemoryStore::restore(records).context("Snapshot is inconsistent")
}

fn page_request(settings: &Settings, listing: &Listing) -> Result<agenda_engine::PageRequest> {
    settings.page_request(listing.page, listing.page_size, listing.order.into())
}

/// Parse every duration and re-emit it in canonical form.
fn normalise_invite(dto: AgendaInviteDto) -> Result<AgendaInviteDto> {
    let draft = dto.to_draft()?;
    Ok(AgendaInviteDto {
        padding_before: format_duration(draft.padding_before),
        padding_after: format_duration(draft.padding_after),
        slot_sizes: draft.slot_sizes.iter().map(|d| format_duration(*d)).collect(),
        agenda_sources: draft.source_ids.iter().copied().collect(),
        procedural_agendas: draft.procedural_agenda_ids.iter().copied().collect(),
        ..dto
    })
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) if path != "-" => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
