//! User repository - the seller/buyer/admin registry.
//!
//! Plain data plumbing with no pricing relevance: mobile-unique accounts,
//! role filtering, activation toggling, and the display identity the ledger
//! joins against.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr,
};
use uuid::Uuid;

use milkbook_core::auth::{hash_password, PasswordError, Role};

use crate::entities::{sea_orm_active_enums, users};

/// Error types for user registry operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// User not found.
    #[error("User not found: {0}")]
    NotFound(Uuid),

    /// Mobile number is already registered.
    #[error("Mobile number already registered")]
    MobileTaken,

    /// Password hashing failed.
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for registering a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// Display name.
    pub name: String,
    /// Mobile number (unique).
    pub mobile: String,
    /// Optional email.
    pub email: Option<String>,
    /// Plaintext password; hashed before storage.
    pub password: String,
    /// Role; defaults to seller.
    pub role: Option<Role>,
    /// Active flag; defaults to true.
    pub is_active: Option<bool>,
    /// Opening pending amount carried over from outside the system.
    pub opening_pending_amount: Decimal,
    /// Current pending amount.
    pub pending_amount: Decimal,
}

/// Partial update for a user.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New display name.
    pub name: Option<String>,
    /// New mobile number (uniqueness re-checked).
    pub mobile: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New active flag.
    pub is_active: Option<bool>,
    /// New opening pending amount.
    pub opening_pending_amount: Option<Decimal>,
    /// New pending amount.
    pub pending_amount: Option<Decimal>,
}

/// Filter options for listing users.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    /// Filter by role.
    pub role: Option<Role>,
    /// Case-insensitive search across name, mobile, and email.
    pub search: Option<String>,
}

/// User repository.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Registers a user with a hashed password.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::MobileTaken`] when the mobile number is already
    /// registered (pre-checked, with the unique index covering the race).
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, UserError> {
        self.assert_mobile_unique(&input.mobile, None).await?;

        let password_hash = hash_password(&input.password)?;
        let now = Utc::now().into();
        let user = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            mobile: Set(input.mobile),
            email: Set(input.email),
            password_hash: Set(password_hash),
            role: Set(input.role.unwrap_or(Role::Seller).into()),
            is_active: Set(input.is_active.unwrap_or(true)),
            opening_pending_amount: Set(input.opening_pending_amount),
            pending_amount: Set(input.pending_amount),
            created_at: Set(now),
            updated_at: Set(now),
        };

        user.insert(&self.db).await.map_err(into_user_error)
    }

    /// Finds a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if the id is absent.
    pub async fn find_by_id(&self, id: Uuid) -> Result<users::Model, UserError> {
        users::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(UserError::NotFound(id))
    }

    /// Finds a user by mobile number (for login).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_mobile(&self, mobile: &str) -> Result<Option<users::Model>, UserError> {
        Ok(users::Entity::find()
            .filter(users::Column::Mobile.eq(mobile))
            .one(&self.db)
            .await?)
    }

    /// Lists users, newest first, with optional role and search filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, filter: UserFilter) -> Result<Vec<users::Model>, UserError> {
        let mut query =
            users::Entity::find().order_by_desc(users::Column::CreatedAt);

        if let Some(role) = filter.role {
            query = query.filter(users::Column::Role.eq(sea_orm_active_enums::UserRole::from(role)));
        }

        if let Some(search) = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            query = query.filter(
                Condition::any()
                    .add(users::Column::Name.contains(search))
                    .add(users::Column::Mobile.contains(search))
                    .add(users::Column::Email.contains(search)),
            );
        }

        Ok(query.all(&self.db).await?)
    }

    /// Applies field changes to a user, re-checking mobile uniqueness when
    /// the number changes.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if the id is absent and
    /// [`UserError::MobileTaken`] on a mobile collision.
    pub async fn update(
        &self,
        id: Uuid,
        patch: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let user = self.find_by_id(id).await?;

        if let Some(mobile) = &patch.mobile {
            if *mobile != user.mobile {
                self.assert_mobile_unique(mobile, Some(id)).await?;
            }
        }

        let mut active: users::ActiveModel = user.into();
        if let Some(name) = patch.name {
            active.name = Set(name);
        }
        if let Some(mobile) = patch.mobile {
            active.mobile = Set(mobile);
        }
        if let Some(email) = patch.email {
            active.email = Set(Some(email));
        }
        if let Some(is_active) = patch.is_active {
            active.is_active = Set(is_active);
        }
        if let Some(opening) = patch.opening_pending_amount {
            active.opening_pending_amount = Set(opening);
        }
        if let Some(pending) = patch.pending_amount {
            active.pending_amount = Set(pending);
        }

        active.update(&self.db).await.map_err(into_user_error)
    }

    /// Flips a user's active flag.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if the id is absent.
    pub async fn toggle_active(&self, id: Uuid) -> Result<users::Model, UserError> {
        let user = self.find_by_id(id).await?;
        let flipped = !user.is_active;
        let mut active: users::ActiveModel = user.into();
        active.is_active = Set(flipped);
        Ok(active.update(&self.db).await?)
    }

    /// Hard-deletes a user.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] if no row was affected.
    pub async fn delete(&self, id: Uuid) -> Result<(), UserError> {
        let result = users::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(UserError::NotFound(id));
        }
        Ok(())
    }

    async fn assert_mobile_unique(
        &self,
        mobile: &str,
        exclude: Option<Uuid>,
    ) -> Result<(), UserError> {
        let existing = self.find_by_mobile(mobile).await?;
        match existing {
            Some(user) if Some(user.id) != exclude => Err(UserError::MobileTaken),
            _ => Ok(()),
        }
    }
}

/// Translates the unique-index race on mobile into `MobileTaken`.
fn into_user_error(err: DbErr) -> UserError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        UserError::MobileTaken
    } else {
        UserError::Database(err)
    }
}
