//! Booking domain entity

use chrono::NaiveDate;

use super::stay::Stay;

/// Booking identifier assigned by the store on insert.
pub type BookingId = i32;

/// A stay not yet (or not yet in this shape) committed to the store.
///
/// Used both for a brand-new booking and for an existing booking with its
/// night count hypothetically increased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingCandidate {
    pub guest_name: String,
    pub unit_id: String,
    /// First occupied night
    pub check_in_date: NaiveDate,
    pub number_of_nights: u32,
}

impl BookingCandidate {
    pub fn new(
        guest_name: impl Into<String>,
        unit_id: impl Into<String>,
        check_in_date: NaiveDate,
        number_of_nights: u32,
    ) -> Self {
        Self {
            guest_name: guest_name.into(),
            unit_id: unit_id.into(),
            check_in_date,
            number_of_nights,
        }
    }

    /// `None` when the night count is zero or the checkout date overflows.
    pub fn stay(&self) -> Option<Stay> {
        Stay::from_nights(self.check_in_date, self.number_of_nights)
    }
}

/// Persisted booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: BookingId,
    pub guest_name: String,
    pub unit_id: String,
    pub check_in_date: NaiveDate,
    pub number_of_nights: u32,
}

impl Booking {
    pub fn from_candidate(id: BookingId, candidate: BookingCandidate) -> Self {
        Self {
            id,
            guest_name: candidate.guest_name,
            unit_id: candidate.unit_id,
            check_in_date: candidate.check_in_date,
            number_of_nights: candidate.number_of_nights,
        }
    }

    pub fn stay(&self) -> Option<Stay> {
        Stay::from_nights(self.check_in_date, self.number_of_nights)
    }

    pub fn check_out_date(&self) -> Option<NaiveDate> {
        self.stay().map(|s| s.check_out)
    }

    /// Candidate describing this booking with `additional_nights` added.
    /// Check-in date, guest and unit never change on extension.
    pub fn extended_by(&self, additional_nights: u32) -> Option<BookingCandidate> {
        let number_of_nights = self.number_of_nights.checked_add(additional_nights)?;
        Some(BookingCandidate {
            guest_name: self.guest_name.clone(),
            unit_id: self.unit_id.clone(),
            check_in_date: self.check_in_date,
            number_of_nights,
        })
    }
}

/// Which stored bookings a conflict query compares against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictFilter {
    /// Every booking held by this guest, on any unit
    ByGuest(String),
    /// Every booking on this unit, by any guest
    ByUnit(String),
}

impl ConflictFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        match self {
            Self::ByGuest(guest) => booking.guest_name == *guest,
            Self::ByUnit(unit) => booking.unit_id == *unit,
        }
    }
}

/// Why a stay was refused admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    GuestOverlap,
    UnitUnavailable,
    PastCheckout,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GuestOverlap => "Guest already has a booking during these dates",
            Self::UnitUnavailable => {
                "The unit is already booked for one or more of the selected nights"
            }
            Self::PastCheckout => "Cannot extend booking after checkout date",
        }
    }

    /// Short label for metrics and structured logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::GuestOverlap => "guest_overlap",
            Self::UnitUnavailable => "unit_unavailable",
            Self::PastCheckout => "past_checkout",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating a stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Admissible,
    Rejected(RejectionReason),
}

impl Verdict {
    pub fn is_admissible(&self) -> bool {
        matches!(self, Self::Admissible)
    }

    /// Rejection message, empty when admissible.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Admissible => "",
            Self::Rejected(reason) => reason.as_str(),
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────
