//! House listing store: per-district collections of observed for-sale plots.
//!
//! Semantics in brief:
//! - A listing is keyed by (district, ward, plot); active duplicates are
//!   rejected and report the existing entry's age instead.
//! - Explicit removal parks the listing in a single recovery slot; the next
//!   removal overwrites the slot, `recover` empties it.
//! - Listings older than 24 hours are swept out silently and permanently.
//!   The sweep never touches the recovery slot; only explicit removal does.
//!
//! The full district map is rewritten to the snapshot after every mutation.

use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::SnapshotStore;

pub const WARD_MAX: i64 = 21;
pub const PLOT_MAX: i64 = 60;

/// Listings at least this old are pruned by the sweep.
const EXPIRY_HOURS: i64 = 24;

/// The four housing districts. Fixed set; acts as the partition key for
/// listings and is never created or destroyed at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum District {
    Gridania,
    Kugane,
    Limsa,
    Uldah,
}

impl District {
    pub const ALL: [District; 4] = [
        District::Gridania,
        District::Kugane,
        District::Limsa,
        District::Uldah,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            District::Gridania => "Gridania",
            District::Kugane => "Kugane",
            District::Limsa => "Limsa",
            District::Uldah => "Uldah",
        }
    }

    /// Resolve user input to a district: case-insensitive full name, or a
    /// single-letter abbreviation (each district starts with a unique letter).
    pub fn resolve(input: &str) -> Option<District> {
        let wanted = input.trim();
        for district in District::ALL {
            if district.name().eq_ignore_ascii_case(wanted) {
                return Some(district);
            }
        }
        let mut chars = wanted.chars();
        if let (Some(first), None) = (chars.next(), chars.next()) {
            for district in District::ALL {
                let initial = district.name().chars().next().unwrap_or_default();
                if initial.eq_ignore_ascii_case(&first) {
                    return Some(district);
                }
            }
        }
        None
    }
}

impl fmt::Display for District {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One observed for-sale plot. Field names match the `houses.json` wire
/// format, timestamps as `YYYY-MM-DD HH:MM:SS`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "Ward")]
    pub ward: i64,
    #[serde(rename = "Plot")]
    pub plot: i64,
    /// Display-only; never parsed numerically.
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "First Seen", with = "super::stamp")]
    pub first_seen: NaiveDateTime,
}

/// Snapshot shape: canonical district name → ordered listing array.
pub type ListingBook = BTreeMap<District, Vec<Listing>>;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("'{0}' is not a housing district I know about")]
    InvalidDistrict(String),
    #[error("ward {0} is out of range (0-{WARD_MAX})")]
    InvalidWard(i64),
    #[error("plot {0} is out of range (0-{PLOT_MAX})")]
    InvalidPlot(i64),
    #[error("that house is already being tracked ({age} ago)")]
    Duplicate {
        district: District,
        ward: i64,
        plot: i64,
        age: String,
    },
    #[error("there is no listing {index} in {district}")]
    IndexOutOfRange { district: District, index: usize },
    #[error("no recently removed house to recover")]
    NothingToRecover,
    #[error(transparent)]
    Persist(#[from] anyhow::Error),
}

/// Owns the full listing collection plus the one-slot recovery buffer.
///
/// The recovery slot is deliberately a bounded history of size one: every
/// removal overwrites it, so only the most recent removal can be undone. It
/// lives in memory only and does not survive a restart.
pub struct ListingStore {
    book: ListingBook,
    recovery: Option<(District, Listing)>,
    snapshot: Box<dyn SnapshotStore<ListingBook>>,
}

impl ListingStore {
    /// Load the collection from the snapshot (empty on first run).
    pub fn open(snapshot: Box<dyn SnapshotStore<ListingBook>>) -> anyhow::Result<Self> {
        let book = snapshot.load()?;
        Ok(Self {
            book,
            recovery: None,
            snapshot,
        })
    }

    /// Record a newly spotted house. `age_hours_offset` backdates the first
    /// seen time for houses that were spotted a while ago; the sign is
    /// ignored and offsets beyond the expiry window are clamped to it (the
    /// entry is already due for the next sweep either way). Returns the
    /// canonical district on success.
    pub fn add(
        &mut self,
        district_input: &str,
        ward: i64,
        plot: i64,
        price: &str,
        age_hours_offset: i64,
    ) -> Result<District, ListingError> {
        let district = District::resolve(district_input)
            .ok_or_else(|| ListingError::InvalidDistrict(district_input.to_string()))?;
        if !(0..=WARD_MAX).contains(&ward) {
            return Err(ListingError::InvalidWard(ward));
        }
        if !(0..=PLOT_MAX).contains(&plot) {
            return Err(ListingError::InvalidPlot(plot));
        }

        let now = Utc::now().naive_utc();
        // Sweep first so a long-dead entry can't block a fresh report of the
        // same plot.
        self.sweep(now);

        if let Some(existing) = self
            .book
            .get(&district)
            .into_iter()
            .flatten()
            .find(|l| l.ward == ward && l.plot == plot)
        {
            let age = format_uptime((now - existing.first_seen).num_seconds());
            return Err(ListingError::Duplicate {
                district,
                ward,
                plot,
                age,
            });
        }

        let backdate_hours = age_hours_offset.unsigned_abs().min(EXPIRY_HOURS as u64) as i64;
        let first_seen = now - Duration::hours(backdate_hours);
        self.book.entry(district).or_default().push(Listing {
            ward,
            plot,
            price: price.to_string(),
            first_seen,
        });
        self.flush()?;
        log::debug!("listing added: {district} ward {ward} plot {plot}");
        Ok(district)
    }

    /// Render every active listing, one line per entry with its per-district
    /// index. Runs the expiry sweep first.
    pub fn render_all(&mut self) -> Result<String, ListingError> {
        let now = Utc::now().naive_utc();
        if self.sweep(now) > 0 {
            self.flush()?;
        }

        let mut out = String::new();
        for (district, entries) in &self.book {
            for (i, listing) in entries.iter().enumerate() {
                let age = format_uptime((now - listing.first_seen).num_seconds());
                out.push_str(&format!(
                    "{i}: {district} - Ward {}, Plot {} for {} gil. First spotted {age} ago\n",
                    listing.ward, listing.plot, listing.price
                ));
            }
        }
        if out.is_empty() {
            out.push_str("No houses on the market right now.");
        }
        Ok(out)
    }

    /// Remove the listing at `index` within the district's current list and
    /// park it in the recovery slot, overwriting whatever was there.
    pub fn remove(
        &mut self,
        district_input: &str,
        index: usize,
    ) -> Result<(District, Listing), ListingError> {
        let district = District::resolve(district_input)
            .ok_or_else(|| ListingError::InvalidDistrict(district_input.to_string()))?;
        let entries = self.book.entry(district).or_default();
        if index >= entries.len() {
            return Err(ListingError::IndexOutOfRange { district, index });
        }
        let listing = entries.remove(index);
        self.recovery = Some((district, listing.clone()));
        self.flush()?;
        log::debug!(
            "listing removed: {district} ward {} plot {} (recoverable)",
            listing.ward,
            listing.plot
        );
        Ok((district, listing))
    }

    /// Re-append the most recently removed listing to its district and clear
    /// the slot.
    pub fn recover(&mut self) -> Result<District, ListingError> {
        let (district, listing) = self.recovery.take().ok_or(ListingError::NothingToRecover)?;
        self.book.entry(district).or_default().push(listing);
        self.flush()?;
        Ok(district)
    }

    /// Number of active listings across all districts.
    pub fn active_count(&self) -> usize {
        self.book.values().map(Vec::len).sum()
    }

    pub fn district_count(&self, district: District) -> usize {
        self.book.get(&district).map_or(0, Vec::len)
    }

    /// Drop every listing aged `EXPIRY_HOURS` or more. Hard prune: expired
    /// entries never reach the recovery slot.
    fn sweep(&mut self, now: NaiveDateTime) -> usize {
        let cutoff = Duration::hours(EXPIRY_HOURS);
        let mut dropped = 0;
        for entries in self.book.values_mut() {
            let before = entries.len();
            entries.retain(|l| now - l.first_seen < cutoff);
            dropped += before - entries.len();
        }
        if dropped > 0 {
            log::info!("expiry sweep dropped {dropped} listing(s)");
        }
        dropped
    }

    fn flush(&self) -> Result<(), ListingError> {
        self.snapshot.save(&self.book).map_err(ListingError::Persist)
    }
}

/// Format elapsed seconds as `{h}h{m}m{s}s`, omitting zero hours/minutes.
/// Seconds are always shown, so zero elapsed renders as `0s`.
pub fn format_uptime(total_seconds: i64) -> String {
    let secs = total_seconds.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m"));
    }
    out.push_str(&format!("{seconds}s"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemorySnapshot;

    fn store() -> ListingStore {
        ListingStore::open(Box::new(MemorySnapshot::new())).expect("open")
    }

    #[test]
    fn uptime_format_edges() {
        assert_eq!(format_uptime(0), "0s");
        assert_eq!(format_uptime(90), "1m30s");
        assert_eq!(format_uptime(3600), "1h0s");
        assert_eq!(format_uptime(3661), "1h1m1s");
    }

    #[test]
    fn resolves_full_names_and_initials() {
        assert_eq!(District::resolve("uldah"), Some(District::Uldah));
        assert_eq!(District::resolve("ULDAH"), Some(District::Uldah));
        assert_eq!(District::resolve("g"), Some(District::Gridania));
        assert_eq!(District::resolve("K"), Some(District::Kugane));
        assert_eq!(District::resolve("limsa"), Some(District::Limsa));
        assert_eq!(District::resolve("ishgard"), None);
        assert_eq!(District::resolve("gr"), None);
        assert_eq!(District::resolve(""), None);
    }

    #[test]
    fn add_rejects_out_of_range() {
        let mut s = store();
        assert!(matches!(
            s.add("uldah", 22, 1, "1m", 0),
            Err(ListingError::InvalidWard(22))
        ));
        assert!(matches!(
            s.add("uldah", 1, 61, "1m", 0),
            Err(ListingError::InvalidPlot(61))
        ));
        assert!(matches!(
            s.add("ishgard", 1, 1, "1m", 0),
            Err(ListingError::InvalidDistrict(_))
        ));
        assert_eq!(s.active_count(), 0);
    }

    #[test]
    fn add_rejects_duplicate_with_age() {
        let mut s = store();
        s.add("uldah", 5, 10, "500k", 0).expect("add");
        let err = s.add("U", 5, 10, "999k", 0).expect_err("dup");
        match err {
            ListingError::Duplicate { district, age, .. } => {
                assert_eq!(district, District::Uldah);
                assert_eq!(age, "0s");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(s.active_count(), 1);
    }

    #[test]
    fn remove_then_recover_restores_listing() {
        let mut s = store();
        s.add("limsa", 3, 4, "2.5m", 0).expect("add");
        let (district, removed) = s.remove("l", 0).expect("remove");
        assert_eq!(district, District::Limsa);
        assert_eq!(s.active_count(), 0);

        let restored_to = s.recover().expect("recover");
        assert_eq!(restored_to, District::Limsa);
        assert_eq!(s.district_count(District::Limsa), 1);
        let rendered = s.render_all().expect("render");
        assert!(rendered.contains("Ward 3, Plot 4"));
        assert!(rendered.contains(&removed.price));
    }

    #[test]
    fn recover_twice_fails() {
        let mut s = store();
        s.add("kugane", 1, 2, "750k", 0).expect("add");
        s.remove("kugane", 0).expect("remove");
        s.recover().expect("recover");
        assert!(matches!(s.recover(), Err(ListingError::NothingToRecover)));
    }

    #[test]
    fn second_removal_overwrites_recovery_slot() {
        let mut s = store();
        s.add("uldah", 1, 1, "100k", 0).expect("add");
        s.add("uldah", 2, 2, "200k", 0).expect("add");
        s.remove("uldah", 0).expect("remove first");
        s.remove("uldah", 0).expect("remove second");
        s.recover().expect("recover");
        // Only the second removal survives; the first is gone for good.
        assert_eq!(s.active_count(), 1);
        assert!(matches!(s.recover(), Err(ListingError::NothingToRecover)));
        let rendered = s.render_all().expect("render");
        assert!(rendered.contains("Ward 2, Plot 2"));
    }

    #[test]
    fn remove_index_out_of_range() {
        let mut s = store();
        s.add("gridania", 1, 1, "300k", 0).expect("add");
        assert!(matches!(
            s.remove("gridania", 5),
            Err(ListingError::IndexOutOfRange { index: 5, .. })
        ));
    }

    #[test]
    fn expired_listings_are_swept_and_unrecoverable() {
        let mut s = store();
        s.add("uldah", 7, 8, "1m", 25).expect("add backdated");
        assert_eq!(s.active_count(), 1);
        let rendered = s.render_all().expect("render");
        assert_eq!(rendered, "No houses on the market right now.");
        assert_eq!(s.active_count(), 0);
        // The sweep bypasses the recovery slot entirely.
        assert!(matches!(s.recover(), Err(ListingError::NothingToRecover)));
    }

    #[test]
    fn backdated_add_reports_age_in_listing() {
        let mut s = store();
        s.add("uldah", 9, 9, "4m", 2).expect("add");
        let rendered = s.render_all().expect("render");
        assert!(rendered.contains("First spotted 2h"), "got: {rendered}");
    }

    #[test]
    fn extreme_backdate_offsets_are_clamped() {
        let mut s = store();
        s.add("uldah", 1, 1, "1m", 9_999_999_999_999_999).expect("add huge offset");
        s.add("limsa", 2, 2, "1m", i64::MIN).expect("add i64::MIN offset");
        // Both land exactly at the expiry cutoff and vanish on the next sweep.
        let rendered = s.render_all().expect("render");
        assert_eq!(rendered, "No houses on the market right now.");
        assert_eq!(s.active_count(), 0);
    }

    #[test]
    fn dead_entry_does_not_block_fresh_report() {
        let mut s = store();
        s.add("limsa", 6, 6, "800k", 30).expect("add stale");
        // Same plot again: the stale entry is swept before the duplicate scan.
        s.add("limsa", 6, 6, "850k", 0).expect("re-add");
        assert_eq!(s.district_count(District::Limsa), 1);
    }
}
