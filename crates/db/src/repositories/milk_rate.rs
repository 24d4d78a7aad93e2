//! Milk rate repository - the versioned rate schedule.
//!
//! Owns the `milk_rates` table and enforces the uniqueness invariant: at
//! most one rate per (milk type, delivery session, effective-from) triple,
//! where a NULL session is a key value of its own. Concurrent writers racing
//! on the same key are serialized by the unique index; this repository only
//! translates the driver-level violation into [`RateError::Duplicate`].

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use tracing::info;
use uuid::Uuid;

use milkbook_core::rates::{DeliverySession, MilkType, RateCandidate, RateLookup, resolve};
use milkbook_shared::types::PageRequest;

use crate::entities::{milk_rates, sea_orm_active_enums};

/// Error types for rate schedule operations.
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    /// Rate not found.
    #[error("Milk rate not found: {0}")]
    NotFound(Uuid),

    /// Duplicate (milk type, session, effective-from) key.
    #[error("Rate already exists for this milkType/session/effectiveFrom combination")]
    Duplicate {
        /// Id of the pre-existing colliding rate, when known. The
        /// race-resolved case (unique index violation) carries `None`.
        conflicting_rate_id: Option<Uuid>,
    },

    /// Price must not be negative.
    #[error("Price per unit must not be negative")]
    NegativePrice,

    /// No applicable rate for a lookup.
    #[error(transparent)]
    Resolution(#[from] milkbook_core::rates::RateResolutionError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating (or merging into) a rate.
#[derive(Debug, Clone)]
pub struct CreateRateInput {
    /// Milk type.
    pub milk_type: MilkType,
    /// Session scope; `None` applies to any session.
    pub session: Option<DeliverySession>,
    /// Price per unit.
    pub price_per_unit: Decimal,
    /// First date the rate applies.
    pub effective_from: NaiveDate,
    /// Active flag; defaults to true on insert, untouched on merge.
    pub is_active: Option<bool>,
}

/// Partial update for a rate.
#[derive(Debug, Clone, Default)]
pub struct UpdateRateInput {
    /// New milk type.
    pub milk_type: Option<MilkType>,
    /// New session scope.
    pub session: Option<DeliverySession>,
    /// New price per unit.
    pub price_per_unit: Option<Decimal>,
    /// New effective-from date.
    pub effective_from: Option<NaiveDate>,
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Filter options for the administrative rate listing.
#[derive(Debug, Clone, Default)]
pub struct RateFilter {
    /// Filter by milk type.
    pub milk_type: Option<MilkType>,
    /// Filter by session. When absent, NULL-session legacy rows are hidden.
    pub session: Option<DeliverySession>,
    /// Only rates effective on or before this date.
    pub as_of_date: Option<NaiveDate>,
    /// Filter by active flag.
    pub is_active: Option<bool>,
    /// Pagination.
    pub page: Option<PageRequest>,
}

/// Milk rate repository.
#[derive(Debug, Clone)]
pub struct RateRepository {
    db: DatabaseConnection,
}

impl RateRepository {
    /// Creates a new rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a rate, or overwrites the price (and optionally the active
    /// flag) of the rate already occupying the exact key. The merge keeps
    /// repeated admin submissions for the same day from piling up duplicate
    /// history.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::NegativePrice`] for a negative price and
    /// [`RateError::Duplicate`] when a concurrent writer produced the key
    /// first (resolved by the unique index, not by application locking).
    pub async fn upsert(&self, input: CreateRateInput) -> Result<milk_rates::Model, RateError> {
        if input.price_per_unit < Decimal::ZERO {
            return Err(RateError::NegativePrice);
        }

        let existing = self
            .find_by_key(input.milk_type, input.session, input.effective_from, None)
            .await?;

        if let Some(existing) = existing {
            let mut active: milk_rates::ActiveModel = existing.into();
            active.price_per_unit = Set(input.price_per_unit);
            if let Some(is_active) = input.is_active {
                active.is_active = Set(is_active);
            }
            let updated = active.update(&self.db).await.map_err(into_rate_error)?;
            info!(rate_id = %updated.id, "milk rate merged in place");
            return Ok(updated);
        }

        let now = Utc::now().into();
        let rate = milk_rates::ActiveModel {
            id: Set(Uuid::new_v4()),
            milk_type: Set(input.milk_type.into()),
            delivery_session: Set(input.session.map(Into::into)),
            price_per_unit: Set(input.price_per_unit),
            effective_from: Set(input.effective_from),
            is_active: Set(input.is_active.unwrap_or(true)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let inserted = rate.insert(&self.db).await.map_err(into_rate_error)?;
        info!(rate_id = %inserted.id, "milk rate created");
        Ok(inserted)
    }

    /// Applies field changes to a rate, re-checking the uniqueness invariant
    /// against the new key before committing.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::NotFound`] if the id is absent and
    /// [`RateError::Duplicate`] (naming the colliding rate) if the new key
    /// is already taken.
    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateRateInput,
    ) -> Result<milk_rates::Model, RateError> {
        let rate = self.find_by_id(id).await?;

        if let Some(price) = patch.price_per_unit {
            if price < Decimal::ZERO {
                return Err(RateError::NegativePrice);
            }
        }

        let new_milk_type = patch
            .milk_type
            .map_or_else(|| rate.milk_type.clone().into(), |m| m);
        let new_session = match patch.session {
            Some(session) => Some(session),
            None => rate.delivery_session.clone().map(Into::into),
        };
        let new_effective_from = patch.effective_from.unwrap_or(rate.effective_from);

        if let Some(colliding) = self
            .find_by_key(new_milk_type, new_session, new_effective_from, Some(id))
            .await?
        {
            return Err(RateError::Duplicate {
                conflicting_rate_id: Some(colliding.id),
            });
        }

        let mut active: milk_rates::ActiveModel = rate.into();
        active.milk_type = Set(new_milk_type.into());
        active.delivery_session = Set(new_session.map(Into::into));
        active.effective_from = Set(new_effective_from);
        if let Some(price) = patch.price_per_unit {
            active.price_per_unit = Set(price);
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }

        active.update(&self.db).await.map_err(into_rate_error)
    }

    /// Hard-deletes a rate.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::NotFound`] if no row was affected.
    pub async fn remove(&self, id: Uuid) -> Result<(), RateError> {
        let result = milk_rates::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(RateError::NotFound(id));
        }
        Ok(())
    }

    /// Finds a rate by id.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::NotFound`] if the id is absent.
    pub async fn find_by_id(&self, id: Uuid) -> Result<milk_rates::Model, RateError> {
        milk_rates::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(RateError::NotFound(id))
    }

    /// Administrative listing, most recent first (effective-from, then
    /// updated-at, then created-at, all descending - a stable order for
    /// pagination). NULL-session legacy rows are hidden unless the caller
    /// filters by session explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: RateFilter) -> Result<Vec<milk_rates::Model>, RateError> {
        let mut query = milk_rates::Entity::find()
            .order_by_desc(milk_rates::Column::EffectiveFrom)
            .order_by_desc(milk_rates::Column::UpdatedAt)
            .order_by_desc(milk_rates::Column::CreatedAt);

        if let Some(milk_type) = filter.milk_type {
            query = query.filter(
                milk_rates::Column::MilkType.eq(sea_orm_active_enums::MilkType::from(milk_type)),
            );
        }

        if let Some(session) = filter.session {
            query = query.filter(
                milk_rates::Column::DeliverySession
                    .eq(sea_orm_active_enums::DeliverySession::from(session)),
            );
        } else {
            query = query.filter(milk_rates::Column::DeliverySession.is_not_null());
        }

        if let Some(as_of) = filter.as_of_date {
            query = query.filter(milk_rates::Column::EffectiveFrom.lte(as_of));
        }

        if let Some(is_active) = filter.is_active {
            query = query.filter(milk_rates::Column::IsActive.eq(is_active));
        }

        if let Some(page) = filter.page {
            query = query.offset(page.offset()).limit(page.limit());
        }

        Ok(query.all(&self.db).await?)
    }

    /// Returns all active rates that could price a delivery of the given
    /// milk type and session on or before the given date: session equal to
    /// the requested one or NULL (catch-all).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn candidates_for(
        &self,
        milk_type: MilkType,
        session: DeliverySession,
        on_or_before: NaiveDate,
    ) -> Result<Vec<RateCandidate>, RateError> {
        let rows = milk_rates::Entity::find()
            .filter(
                milk_rates::Column::MilkType.eq(sea_orm_active_enums::MilkType::from(milk_type)),
            )
            .filter(milk_rates::Column::IsActive.eq(true))
            .filter(milk_rates::Column::EffectiveFrom.lte(on_or_before))
            .filter(
                Condition::any()
                    .add(
                        milk_rates::Column::DeliverySession
                            .eq(sea_orm_active_enums::DeliverySession::from(session)),
                    )
                    .add(milk_rates::Column::DeliverySession.is_null()),
            )
            .all(&self.db)
            .await?;

        Ok(rows.into_iter().map(to_candidate).collect())
    }

    /// Resolves the single applicable rate for a delivery key.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::Resolution`] when no active rate applies.
    pub async fn resolve_rate(
        &self,
        milk_type: MilkType,
        session: DeliverySession,
        date: NaiveDate,
    ) -> Result<RateCandidate, RateError> {
        let candidates = self.candidates_for(milk_type, session, date).await?;
        let lookup = RateLookup {
            milk_type,
            session,
            date,
        };
        Ok(resolve(&lookup, &candidates)?.clone())
    }

    /// Finds the rate occupying an exact key, comparing NULL sessions as a
    /// key value of their own. `exclude` skips a row (used by update's
    /// self-check).
    async fn find_by_key(
        &self,
        milk_type: MilkType,
        session: Option<DeliverySession>,
        effective_from: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Option<milk_rates::Model>, RateError> {
        let mut query = milk_rates::Entity::find()
            .filter(
                milk_rates::Column::MilkType.eq(sea_orm_active_enums::MilkType::from(milk_type)),
            )
            .filter(milk_rates::Column::EffectiveFrom.eq(effective_from));

        query = match session {
            Some(session) => query.filter(
                milk_rates::Column::DeliverySession
                    .eq(sea_orm_active_enums::DeliverySession::from(session)),
            ),
            None => query.filter(milk_rates::Column::DeliverySession.is_null()),
        };

        if let Some(exclude) = exclude {
            query = query.filter(milk_rates::Column::Id.ne(exclude));
        }

        Ok(query
            .order_by_desc(milk_rates::Column::UpdatedAt)
            .one(&self.db)
            .await?)
    }
}

fn to_candidate(row: milk_rates::Model) -> RateCandidate {
    RateCandidate {
        id: row.id,
        session: row.delivery_session.map(Into::into),
        price_per_unit: row.price_per_unit,
        effective_from: row.effective_from,
        is_active: row.is_active,
        created_at: row.created_at.to_utc(),
    }
}

/// Translates a driver-level unique violation (the concurrent-writer race)
/// into the Conflict taxonomy; everything else stays a database error.
fn into_rate_error(err: DbErr) -> RateError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        RateError::Duplicate {
            conflicting_rate_id: None,
        }
    } else {
        RateError::Database(err)
    }
}
