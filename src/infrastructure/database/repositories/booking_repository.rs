//! SeaORM implementation of BookingRepository

use async_trait::async_trait;
use chrono::{Days, Utc};
use log::debug;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Select, Set,
};

use crate::domain::booking::{
    Booking, BookingCandidate, BookingId, BookingRepository, ConflictFilter, Stay,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::booking;

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conflict reads ──────────────────────────────────────────────

/// Bookings matching `filter`, minus `exclude`.
fn scoped(filter: &ConflictFilter, exclude: Option<BookingId>) -> Select<booking::Entity> {
    let mut query = match filter {
        ConflictFilter::ByGuest(guest_name) => {
            booking::Entity::find().filter(booking::Column::GuestName.eq(guest_name.as_str()))
        }
        ConflictFilter::ByUnit(unit_id) => {
            booking::Entity::find().filter(booking::Column::UnitId.eq(unit_id.as_str()))
        }
    };
    if let Some(id) = exclude {
        query = query.filter(booking::Column::Id.ne(id));
    }
    query
}

impl SeaOrmBookingRepository {
    /// Rows that could overlap `stay`.
    ///
    /// No stored stay is longer than the longest one in scope, so anything
    /// checking in on or before `stay.check_in - longest` has already left.
    /// Both reads walk the `(column, check_in_date)` and
    /// `(column, number_of_nights)` indexes; the exact overlap is decided by
    /// the caller.
    async fn conflict_window(
        &self,
        filter: &ConflictFilter,
        stay: &Stay,
        exclude: Option<BookingId>,
    ) -> DomainResult<Vec<booking::Model>> {
        let longest = scoped(filter, exclude)
            .order_by_desc(booking::Column::NumberOfNights)
            .one(&self.db)
            .await?;
        let Some(longest) = longest else {
            return Ok(Vec::new());
        };

        let mut query = scoped(filter, exclude)
            .filter(booking::Column::CheckInDate.lt(stay.check_out));
        let reach = u64::try_from(longest.number_of_nights).map_err(|_| {
            DomainError::Storage(format!(
                "booking {} has invalid night count {}",
                longest.id, longest.number_of_nights
            ))
        })?;
        if let Some(earliest) = stay.check_in.checked_sub_days(Days::new(reach)) {
            query = query.filter(booking::Column::CheckInDate.gt(earliest));
        }

        let rows = query
            .order_by_asc(booking::Column::CheckInDate)
            .all(&self.db)
            .await?;

        debug!(
            "Conflict window {:?} [{}, {}) longest={} rows={}",
            filter,
            stay.check_in,
            stay.check_out,
            reach,
            rows.len()
        );
        Ok(rows)
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn model_to_domain(m: booking::Model) -> DomainResult<Booking> {
    let number_of_nights = u32::try_from(m.number_of_nights).map_err(|_| {
        DomainError::Storage(format!(
            "booking {} has invalid night count {}",
            m.id, m.number_of_nights
        ))
    })?;
    Ok(Booking {
        id: m.id,
        guest_name: m.guest_name,
        unit_id: m.unit_id,
        check_in_date: m.check_in_date,
        number_of_nights,
    })
}

fn nights_to_column(nights: u32) -> DomainResult<i32> {
    i32::try_from(nights)
        .map_err(|_| DomainError::InvalidInput(format!("night count {} is too large", nights)))
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn find_conflicting(
        &self,
        filter: &ConflictFilter,
        stay: &Stay,
        exclude: Option<BookingId>,
    ) -> DomainResult<bool> {
        for row in self.conflict_window(filter, stay, exclude).await? {
            let existing = model_to_domain(row)?;
            if existing.stay().is_some_and(|s| s.overlaps(stay)) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn insert(&self, candidate: BookingCandidate) -> DomainResult<Booking> {
        debug!(
            "Inserting booking: guest={} unit={} check_in={} nights={}",
            candidate.guest_name,
            candidate.unit_id,
            candidate.check_in_date,
            candidate.number_of_nights
        );

        let now = Utc::now();
        let model = booking::ActiveModel {
            id: NotSet,
            guest_name: Set(candidate.guest_name),
            unit_id: Set(candidate.unit_id),
            check_in_date: Set(candidate.check_in_date),
            number_of_nights: Set(nights_to_column(candidate.number_of_nights)?),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let inserted = model.insert(&self.db).await?;
        model_to_domain(inserted)
    }

    async fn find_by_id(&self, id: BookingId) -> DomainResult<Option<Booking>> {
        booking::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(model_to_domain)
            .transpose()
    }

    async fn update_nights(&self, id: BookingId, number_of_nights: u32) -> DomainResult<Booking> {
        debug!("Updating booking {} to {} nights", id, number_of_nights);

        let existing = booking::Entity::find_by_id(id).one(&self.db).await?;

        let Some(existing) = existing else {
            return Err(DomainError::booking_not_found(id));
        };

        let mut active: booking::ActiveModel = existing.into();
        active.number_of_nights = Set(nights_to_column(number_of_nights)?);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&self.db).await?;
        model_to_domain(updated)
    }
}

// ── Tests ──────────────────────────────────────────────────────
