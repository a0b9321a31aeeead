//! Booking DTOs

use std::borrow::Cow;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::domain::booking::{Booking, BookingCandidate};
use crate::domain::{DomainError, DomainResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[schema(example = "GuestA")]
    #[validate(
        length(min = 1, max = 100, message = "Guest name must be between 1 and 100 characters"),
        custom(function = "not_blank")
    )]
    pub guest_name: String,
    #[serde(rename = "unitID")]
    #[schema(example = "1")]
    #[validate(
        length(min = 1, message = "Unit ID is required"),
        custom(function = "not_blank")
    )]
    pub unit_id: String,
    /// First night of the stay, `YYYY-MM-DD`
    #[schema(format = Date, example = "2030-01-15")]
    #[validate(custom(function = "valid_check_in"))]
    pub check_in_date: String,
    #[schema(example = 5, minimum = 1, maximum = 365)]
    #[validate(range(min = 1, max = 365, message = "Number of nights must be between 1 and 365"))]
    pub number_of_nights: u32,
}

impl CreateBookingRequest {
    pub fn into_candidate(self) -> DomainResult<BookingCandidate> {
        let check_in_date = parse_date(&self.check_in_date).ok_or_else(|| {
            DomainError::InvalidInput(format!("invalid check-in date {:?}", self.check_in_date))
        })?;
        Ok(BookingCandidate::new(
            self.guest_name.trim(),
            self.unit_id.trim(),
            check_in_date,
            self.number_of_nights,
        ))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ExtendBookingRequest {
    #[schema(example = 2, minimum = 1, maximum = 365)]
    #[validate(range(min = 1, max = 365, message = "Additional nights must be between 1 and 365"))]
    pub additional_nights: u32,
}

/// Stored booking as returned by the API
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingDto {
    pub id: i32,
    pub guest_name: String,
    #[serde(rename = "unitID")]
    pub unit_id: String,
    #[schema(example = "2030-01-15")]
    pub check_in_date: String,
    pub number_of_nights: u32,
    /// Day the guest leaves; the unit is free again from this date
    #[schema(example = "2030-01-20")]
    pub check_out_date: Option<String>,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        let check_out_date = b
            .check_out_date()
            .map(|d| d.format(DATE_FORMAT).to_string());
        Self {
            id: b.id,
            guest_name: b.guest_name,
            unit_id: b.unit_id,
            check_in_date: b.check_in_date.format(DATE_FORMAT).to_string(),
            number_of_nights: b.number_of_nights,
            check_out_date,
        }
    }
}

fn rule_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(rule_error("blank", "must not be blank"));
    }
    Ok(())
}

/// Zero-padded `YYYY-MM-DD` naming a real calendar day.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let well_formed = raw.len() == 10
        && raw.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return None;
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

fn valid_check_in(raw: &str) -> Result<(), ValidationError> {
    let Some(date) = parse_date(raw) else {
        return Err(rule_error(
            "date_format",
            "Check-in date must be a valid date in YYYY-MM-DD format",
        ));
    };
    if date < Utc::now().date_naive() {
        return Err(rule_error("past_date", "Check-in date cannot be in the past"));
    }
    Ok(())
}
