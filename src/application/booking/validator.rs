//! Admission rules for new and extended bookings
//!
//! Two rules guard every stay:
//!
//! - **guest exclusivity**: a guest never holds two overlapping stays, on any unit
//! - **unit availability**: a unit never hosts two overlapping stays
//!
//! New bookings run both (guest first when both fail). Extensions check the
//! booking has not already checked out, then run unit availability against
//! every *other* booking on the unit.

use std::sync::Arc;

use crate::domain::booking::{
    Booking, BookingCandidate, BookingId, ConflictFilter, RejectionReason, Stay, Verdict,
};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

use super::clock::Clock;

pub struct BookingValidator {
    repos: Arc<dyn RepositoryProvider>,
    clock: Arc<dyn Clock>,
}

impl BookingValidator {
    pub fn new(repos: Arc<dyn RepositoryProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { repos, clock }
    }

    /// Validate a brand-new stay. Performs reads only.
    pub async fn validate_new_booking(&self, candidate: &BookingCandidate) -> DomainResult<Verdict> {
        let stay = candidate_stay(candidate)?;
        let bookings = self.repos.bookings();

        let guest = ConflictFilter::ByGuest(candidate.guest_name.clone());
        let unit = ConflictFilter::ByUnit(candidate.unit_id.clone());

        // Independent reads; the guest result is inspected first so its
        // rejection wins when both rules fail.
        let (guest_conflict, unit_conflict) = tokio::join!(
            bookings.find_conflicting(&guest, &stay, None),
            bookings.find_conflicting(&unit, &stay, None),
        );

        if guest_conflict? {
            return Ok(Verdict::Rejected(RejectionReason::GuestOverlap));
        }
        if unit_conflict? {
            return Ok(Verdict::Rejected(RejectionReason::UnitUnavailable));
        }
        Ok(Verdict::Admissible)
    }

    /// Validate extending `existing` by `additional_nights`. Performs reads only.
    pub async fn validate_extension(
        &self,
        existing: &Booking,
        additional_nights: u32,
    ) -> DomainResult<Verdict> {
        check_additional_nights(additional_nights)?;

        let current = existing.stay().ok_or_else(|| {
            DomainError::InvalidInput(format!("booking {} has no valid stay", existing.id))
        })?;
        if self.clock.today() > current.check_out {
            return Ok(Verdict::Rejected(RejectionReason::PastCheckout));
        }

        let extended = existing.extended_by(additional_nights).ok_or_else(|| {
            DomainError::InvalidInput("extended night count is out of range".into())
        })?;
        let stay = candidate_stay(&extended)?;

        self.check_unit_available(&extended.unit_id, &stay, Some(existing.id))
            .await
    }

    async fn check_unit_available(
        &self,
        unit_id: &str,
        stay: &Stay,
        exclude: Option<BookingId>,
    ) -> DomainResult<Verdict> {
        let unit = ConflictFilter::ByUnit(unit_id.to_string());
        if self
            .repos
            .bookings()
            .find_conflicting(&unit, stay, exclude)
            .await?
        {
            return Ok(Verdict::Rejected(RejectionReason::UnitUnavailable));
        }
        Ok(Verdict::Admissible)
    }
}

pub(crate) fn check_additional_nights(additional_nights: u32) -> DomainResult<()> {
    if additional_nights == 0 {
        return Err(DomainError::InvalidInput(
            "additional nights must be at least 1".into(),
        ));
    }
    Ok(())
}

/// Reject malformed candidates instead of evaluating them.
pub(crate) fn candidate_stay(candidate: &BookingCandidate) -> DomainResult<Stay> {
    if candidate.guest_name.trim().is_empty() {
        return Err(DomainError::InvalidInput("guest name cannot be empty".into()));
    }
    if candidate.unit_id.trim().is_empty() {
        return Err(DomainError::InvalidInput("unit ID cannot be empty".into()));
    }
    if candidate.number_of_nights == 0 {
        return Err(DomainError::InvalidInput(
            "number of nights must be at least 1".into(),
        ));
    }
    candidate.stay().ok_or_else(|| {
        DomainError::InvalidInput("checkout date is outside the supported calendar".into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};

    use crate::application::booking::clock::FixedClock;
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 4, 1).unwrap()
    }

    fn day(offset: u64) -> NaiveDate {
        today() + Days::new(offset)
    }

    fn setup() -> (Arc<InMemoryRepositoryProvider>, BookingValidator) {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let validator = BookingValidator::new(repos.clone(), Arc::new(FixedClock(today())));
        (repos, validator)
    }

    async fn seed(repos: &InMemoryRepositoryProvider, guest: &str, unit: &str, start: u64, nights: u32) -> Booking {
        repos
            .bookings()
            .insert(BookingCandidate::new(guest, unit, day(start), nights))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn empty_store_admits() {
        let (_, validator) = setup();
        let verdict = validator
            .validate_new_booking(&BookingCandidate::new("GuestA", "1", day(0), 5))
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Admissible);
    }

    #[tokio::test]
    async fn guest_overlap_on_other_unit_is_rejected() {
        let (repos, validator) = setup();
        seed(&repos, "GuestA", "2", 0, 5).await;

        let verdict = validator
            .validate_new_booking(&BookingCandidate::new("GuestA", "1", day(2), 1))
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Rejected(RejectionReason::GuestOverlap));
    }

    #[tokio::test]
    async fn guest_rejection_takes_precedence() {
        let (repos, validator) = setup();
        seed(&repos, "GuestA", "2", 0, 5).await;
        seed(&repos, "GuestB", "1", 0, 5).await;

        // Violates both rules at once
        let verdict = validator
            .validate_new_booking(&BookingCandidate::new("GuestA", "1", day(1), 2))
            .await
            .unwrap();
        assert_eq!(
            verdict.reason(),
            "Guest already has a booking during these dates"
        );
    }

    #[tokio::test]
    async fn unit_overlap_is_rejected() {
        let (repos, validator) = setup();
        seed(&repos, "GuestA", "1", 0, 5).await;

        let verdict = validator
            .validate_new_booking(&BookingCandidate::new("GuestB", "1", day(1), 5))
            .await
            .unwrap();
        assert_eq!(verdict, Verdict::Rejected(RejectionReason::UnitUnavailable));
    }

    #[tokio::test]
    async fn back_to_back_stays_are_admitted() {
        let (repos, validator) = setup();
        seed(&repos, "GuestA", "1", 0, 5).await;

        let verdict = validator
            .validate_new_booking(&BookingCandidate::new("GuestB", "1", day(5), 3))
            .await
            .unwrap();
        assert!(verdict.is_admissible());

        // Same guest checking out of one unit and into another the same day
        let verdict = validator
            .validate_new_booking(&BookingCandidate::new("GuestA", "2", day(5), 3))
            .await
            .unwrap();
        assert!(verdict.is_admissible());
    }

    #[tokio::test]
    async fn malformed_candidate_is_invalid_input() {
        let (_, validator) = setup();
        for candidate in [
            BookingCandidate::new("GuestA", "1", day(0), 0),
            BookingCandidate::new("  ", "1", day(0), 1),
            BookingCandidate::new("GuestA", "", day(0), 1),
            BookingCandidate::new("GuestA", "1", NaiveDate::MAX, 1),
        ] {
            let err = validator.validate_new_booking(&candidate).await.unwrap_err();
            assert!(matches!(err, DomainError::InvalidInput(_)), "{candidate:?}");
        }
    }

    #[tokio::test]
    async fn extension_ignores_its_own_stay() {
        let (repos, validator) = setup();
        let booking = seed(&repos, "GuestA", "1", 0, 5).await;

        let verdict = validator.validate_extension(&booking, 3).await.unwrap();
        assert!(verdict.is_admissible());
    }

    #[tokio::test]
    async fn extension_into_next_booking_is_rejected() {
        let (repos, validator) = setup();
        let booking = seed(&repos, "GuestA", "1", 0, 5).await;
        seed(&repos, "GuestB", "1", 5, 3).await;

        let verdict = validator.validate_extension(&booking, 1).await.unwrap();
        assert_eq!(verdict, Verdict::Rejected(RejectionReason::UnitUnavailable));
    }

    #[tokio::test]
    async fn extension_after_checkout_is_rejected_first() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        // Booking [Mar 20, Mar 25); today is Apr 1
        let booking = repos
            .bookings()
            .insert(BookingCandidate::new(
                "GuestA",
                "1",
                NaiveDate::from_ymd_opt(2030, 3, 20).unwrap(),
                5,
            ))
            .await
            .unwrap();
        let validator = BookingValidator::new(repos.clone(), Arc::new(FixedClock(today())));

        let verdict = validator.validate_extension(&booking, 2).await.unwrap();
        assert_eq!(verdict, Verdict::Rejected(RejectionReason::PastCheckout));
    }

    #[tokio::test]
    async fn past_checkout_wins_over_unit_conflict() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        // Ended Mar 25; GuestB holds the unit over the nights an extension would add
        let booking = repos
            .bookings()
            .insert(BookingCandidate::new(
                "GuestA",
                "1",
                NaiveDate::from_ymd_opt(2030, 3, 20).unwrap(),
                5,
            ))
            .await
            .unwrap();
        repos
            .bookings()
            .insert(BookingCandidate::new(
                "GuestB",
                "1",
                NaiveDate::from_ymd_opt(2030, 3, 25).unwrap(),
                10,
            ))
            .await
            .unwrap();
        let validator = BookingValidator::new(repos.clone(), Arc::new(FixedClock(today())));

        let verdict = validator.validate_extension(&booking, 3).await.unwrap();
        assert_eq!(verdict, Verdict::Rejected(RejectionReason::PastCheckout));
    }

    #[tokio::test]
    async fn extension_on_checkout_day_is_allowed() {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        // Checkout is exactly today
        let booking = repos
            .bookings()
            .insert(BookingCandidate::new(
                "GuestA",
                "1",
                NaiveDate::from_ymd_opt(2030, 3, 27).unwrap(),
                5,
            ))
            .await
            .unwrap();
        let validator = BookingValidator::new(repos.clone(), Arc::new(FixedClock(today())));

        let verdict = validator.validate_extension(&booking, 2).await.unwrap();
        assert!(verdict.is_admissible());
    }

    #[tokio::test]
    async fn zero_additional_nights_is_invalid() {
        let (repos, validator) = setup();
        let booking = seed(&repos, "GuestA", "1", 0, 5).await;
        let err = validator.validate_extension(&booking, 0).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }
}
