use crate::domains::complaint::types::ComplaintStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A change to the complaint population, emitted by the service layer as
/// writes commit. Dashboards fold these into counters instead of
/// rescanning the store on every update.
#[derive(Debug, Clone, PartialEq)]
pub enum ComplaintEvent {
    /// A complaint entered the processed layer (initial status: submitted).
    Submitted { locality: String },
    /// A processed complaint moved between statuses.
    StatusChanged {
        to: ComplaintStatus,
        locality: String,
        on: NaiveDate,
    },
}

/// Dashboard counters, maintained incrementally from events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplaintCounts {
    pub total: u64,
    /// Complaints not yet in a terminal state.
    pub pending: u64,
    pub resolved: u64,
    pub rejected: u64,
    pub resolved_today: u64,
    pub today: Option<NaiveDate>,
    open_by_locality: HashMap<String, u64>,
}

impl ComplaintCounts {
    /// Reset the daily counter when the date rolls over.
    pub fn roll_over(&mut self, date: NaiveDate) {
        if self.today != Some(date) {
            self.today = Some(date);
            self.resolved_today = 0;
        }
    }

    fn close_locality(&mut self, locality: &str) {
        if let Some(count) = self.open_by_locality.get_mut(locality) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.open_by_locality.remove(locality);
            }
        }
    }

    /// Fold one event into the counters.
    pub fn apply(&mut self, event: ComplaintEvent) {
        match event {
            ComplaintEvent::Submitted { locality } => {
                self.total += 1;
                self.pending += 1;
                *self.open_by_locality.entry(locality).or_insert(0) += 1;
            }
            ComplaintEvent::StatusChanged { to, locality, on } => match to {
                ComplaintStatus::Resolved => {
                    self.pending = self.pending.saturating_sub(1);
                    self.resolved += 1;
                    self.roll_over(on);
                    if self.today == Some(on) {
                        self.resolved_today += 1;
                    }
                    self.close_locality(&locality);
                }
                ComplaintStatus::Rejected => {
                    self.pending = self.pending.saturating_sub(1);
                    self.rejected += 1;
                    self.close_locality(&locality);
                }
                // Verified (and the unreachable pre-triage states) keep the
                // complaint open; nothing moves.
                _ => {}
            },
        }
    }

    /// Seed counters from a one-time scan; only deltas apply afterwards.
    /// Entries are `(status, locality, last updated)` per complaint.
    pub fn seed<I>(today: NaiveDate, entries: I) -> Self
    where
        I: IntoIterator<Item = (ComplaintStatus, String, NaiveDate)>,
    {
        let mut counts = Self::default();
        counts.today = Some(today);
        for (status, locality, updated_on) in entries {
            counts.total += 1;
            match status {
                ComplaintStatus::Resolved => {
                    counts.resolved += 1;
                    if updated_on == today {
                        counts.resolved_today += 1;
                    }
                }
                ComplaintStatus::Rejected => counts.rejected += 1,
                _ => {
                    counts.pending += 1;
                    *counts.open_by_locality.entry(locality).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// Locality with the most open complaints. Ties break on name so the
    /// answer is stable across recomputes.
    pub fn most_critical_area(&self) -> Option<(&str, u64)> {
        self.open_by_locality
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(locality, count)| (locality.as_str(), *count))
    }

    pub fn open_in(&self, locality: &str) -> u64 {
        self.open_by_locality.get(locality).copied().unwrap_or(0)
    }
}
