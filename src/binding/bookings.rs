//! Booking list, calendar day and date-grouped views.

use super::{contains_ci, normalize_search};
use crate::resources::{Booking, BookingStatus};
use crate::store::ResourceSnapshot;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingFilter {
    /// `None` shows every status.
    pub status: Option<BookingStatus>,
    /// Matches name or email case-insensitively, or a phone substring.
    pub search: String,
    /// Restrict to one `YYYY-MM-DD` day.
    pub date: Option<String>,
}

impl BookingFilter {
    fn matches(&self, booking: &Booking, needle: &str) -> bool {
        if let Some(status) = self.status {
            if booking.status != status {
                return false;
            }
        }
        if let Some(date) = &self.date {
            if &booking.date != date {
                return false;
            }
        }
        needle.is_empty()
            || contains_ci(&booking.user_name, needle)
            || booking.user_phone.contains(needle)
            || booking
                .user_email
                .as_deref()
                .map(|email| contains_ci(email, needle))
                .unwrap_or(false)
    }
}

/// Bookings passing `filter`, in snapshot order.
pub fn filter_bookings<'a>(
    snapshot: &'a ResourceSnapshot<Booking>,
    filter: &BookingFilter,
) -> Vec<&'a Booking> {
    let needle = normalize_search(&filter.search);
    snapshot
        .iter()
        .filter(|b| filter.matches(b, &needle))
        .collect()
}

/// All bookings of one day.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingGroup {
    pub date: String,
    /// Sorted by time.
    pub bookings: Vec<Booking>,
}

/// Filtered bookings grouped by date, earliest date first.
pub fn group_by_date(snapshot: &ResourceSnapshot<Booking>, filter: &BookingFilter) -> Vec<BookingGroup> {
    let mut groups: BTreeMap<&str, Vec<Booking>> = BTreeMap::new();
    for booking in filter_bookings(snapshot, filter) {
        groups.entry(booking.date.as_str()).or_default().push(booking.clone());
    }
    groups
        .into_iter()
        .map(|(date, mut bookings)| {
            bookings.sort_by(|a, b| a.time.cmp(&b.time));
            BookingGroup {
                date: date.to_string(),
                bookings,
            }
        })
        .collect()
}

/// Calendar cell of one day.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DaySummary {
    pub date: String,
    pub total: usize,
    pub confirmed: usize,
    pub pending: usize,
    pub guests: u32,
}

pub fn day_summary(snapshot: &ResourceSnapshot<Booking>, date: &str) -> DaySummary {
    snapshot
        .iter()
        .filter(|b| b.date == date)
        .fold(
            DaySummary {
                date: date.to_string(),
                ..Default::default()
            },
            |mut summary, booking| {
                summary.total += 1;
                match booking.status {
                    BookingStatus::Confirmed => summary.confirmed += 1,
                    BookingStatus::Pending => summary.pending += 1,
                    _ => {}
                }
                if booking.status != BookingStatus::Cancelled {
                    summary.guests += booking.party_size;
                }
                summary
            },
        )
}
