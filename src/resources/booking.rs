//! Table reservations.

use super::{patch_field, Resource};
use crate::error::ErrorInfo;
use crate::types::{RecordId, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Completed => "completed",
            BookingStatus::NoShow => "no_show",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: RecordId,
    #[serde(default)]
    pub venue_id: String,
    #[serde(default)]
    pub event_id: Option<String>,
    pub user_name: String,
    #[serde(default)]
    pub user_phone: String,
    #[serde(default)]
    pub user_email: Option<String>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    pub party_size: u32,
    #[serde(default)]
    pub table_number: Option<String>,
    pub status: BookingStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub deposit_paid: Option<f64>,
    #[serde(default)]
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Timestamp,
}

impl Booking {
    /// A pending booking with the required fields set.
    pub fn new(
        id: impl Into<RecordId>,
        user_name: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
        party_size: u32,
    ) -> Self {
        Self {
            id: id.into(),
            venue_id: String::new(),
            event_id: None,
            user_name: user_name.into(),
            user_phone: String::new(),
            user_email: None,
            date: date.into(),
            time: time.into(),
            party_size,
            table_number: None,
            status: BookingStatus::Pending,
            notes: None,
            total_amount: None,
            deposit_paid: None,
            created_at: Timestamp::default(),
            updated_at: Timestamp::default(),
        }
    }

    pub fn with_status(mut self, status: BookingStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_contact(mut self, phone: impl Into<String>, email: Option<String>) -> Self {
        self.user_phone = phone.into();
        self.user_email = email;
        self
    }
}

/// Partial booking update. `Some(None)` clears a nullable field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
    pub user_name: Option<String>,
    pub user_phone: Option<String>,
    pub user_email: Option<Option<String>>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub party_size: Option<u32>,
    pub table_number: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}

impl BookingPatch {
    pub fn status(status: BookingStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }
}

impl Resource for Booking {
    type Patch = BookingPatch;
    const NAME: &'static str = "bookings";

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn set_id(&mut self, id: RecordId) {
        self.id = id;
    }

    fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }

    fn apply_patch(&mut self, patch: &BookingPatch) {
        patch_field(&mut self.status, &patch.status);
        patch_field(&mut self.user_name, &patch.user_name);
        patch_field(&mut self.user_phone, &patch.user_phone);
        patch_field(&mut self.user_email, &patch.user_email);
        patch_field(&mut self.date, &patch.date);
        patch_field(&mut self.time, &patch.time);
        patch_field(&mut self.party_size, &patch.party_size);
        patch_field(&mut self.table_number, &patch.table_number);
        patch_field(&mut self.notes, &patch.notes);
    }

    fn validate(&self) -> Result<(), ErrorInfo> {
        if self.user_name.trim().is_empty() {
            return Err(ErrorInfo::validation("user_name", "guest name is required"));
        }
        if self.party_size == 0 {
            return Err(ErrorInfo::validation(
                "party_size",
                "party size must be at least 1",
            ));
        }
        Ok(())
    }
}
