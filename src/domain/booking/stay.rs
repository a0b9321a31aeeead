//! Half-open date interval occupied by a booking

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Nights occupied from `check_in` up to (not including) `check_out`.
///
/// Dates are `NaiveDate`, so comparisons are always at day granularity:
/// a stay ending on day D never conflicts with one starting on day D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stay {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl Stay {
    /// Build the stay for `nights` nights starting at `check_in`.
    ///
    /// Returns `None` for zero nights or when the checkout date would
    /// fall outside chrono's calendar range.
    pub fn from_nights(check_in: NaiveDate, nights: u32) -> Option<Self> {
        if nights == 0 {
            return None;
        }
        let check_out = check_in.checked_add_days(Days::new(u64::from(nights)))?;
        Some(Self {
            check_in,
            check_out,
        })
    }

    pub fn overlaps(&self, other: &Stay) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }
}
