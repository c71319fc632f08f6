//! User directory business logic.
//!
//! Resolves users by username or id for the workflows, and covers the sign-up
//! lifecycle the ledger depends on: registration mints a sequential username,
//! and email verification creates the user's zero-balance investment.

use crate::{
    core::{counter, investment},
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Admin edit of a user. Fields left `None` keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// New email, normalised like at registration
    pub email: Option<String>,
    /// New wallet address
    pub wallet_address: Option<String>,
    /// Marks the email verified (opening the investment) or unverified
    pub email_verified: Option<bool>,
    /// Suspends or restores the account
    pub locked: Option<bool>,
}

/// Finds a user by username.
pub async fn get_user_by_username<C>(db: &C, username: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a user by id.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by email.
pub async fn get_user_by_email<C>(db: &C, email: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Fetches a user by id.
///
/// # Errors
/// Returns `Error::UserIdNotFound` if no such user exists.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    get_user_by_id(db, user_id)
        .await?
        .ok_or(Error::UserIdNotFound { user_id })
}

/// Number of registered users.
pub async fn count_users(db: &DatabaseConnection) -> Result<u64> {
    User::find().count(db).await.map_err(Into::into)
}

/// Lists all users in registration order.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Resolves a username to a user who may take part in ledger operations.
///
/// Fails with `UserNotFound` when nobody has that username and with
/// `UserNotVerified` when the email has not been confirmed yet.
pub async fn resolve_verified_user<C>(db: &C, username: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let found = get_user_by_username(db, username)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            username: username.to_string(),
        })?;
    ensure_verified(&found)?;
    Ok(found)
}

/// Fails with `UserNotVerified` unless the user's email is confirmed.
pub fn ensure_verified(user: &user::Model) -> Result<()> {
    if user.email_verified {
        Ok(())
    } else {
        Err(Error::UserNotVerified {
            username: user.username.clone(),
        })
    }
}

/// Registers a new, unverified user and mints their username.
#[instrument(skip(db))]
pub async fn register_user(
    db: &DatabaseConnection,
    email: String,
    wallet_address: Option<String>,
) -> Result<user::Model> {
    let txn = db.begin().await?;
    let created = insert_user(&txn, email, wallet_address, false).await?;
    txn.commit().await?;

    info!(username = %created.username, "Registered user");
    Ok(created)
}

/// Marks the user's email as verified and opens their investment.
///
/// Verifying an already verified user is a no-op, and an existing investment
/// is never replaced.
#[instrument(skip(db))]
pub async fn verify_user_email(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    let txn = db.begin().await?;

    let found = get_user_by_id(&txn, user_id)
        .await?
        .ok_or(Error::UserIdNotFound { user_id })?;

    let verified = if found.email_verified {
        found
    } else {
        let mut active_model: user::ActiveModel = found.into();
        active_model.email_verified = Set(true);
        active_model.updated_at = Set(Some(chrono::Utc::now()));
        active_model.update(&txn).await?
    };

    if investment::get_investment_for_user(&txn, verified.id)
        .await?
        .is_none()
    {
        investment::create_investment(&txn, verified.id).await?;
    }

    txn.commit().await?;

    info!(username = %verified.username, "Verified user email");
    Ok(verified)
}

/// Admin path: registers a user who is verified immediately and has an investment.
#[instrument(skip(db))]
pub async fn create_verified_user(
    db: &DatabaseConnection,
    email: String,
    wallet_address: Option<String>,
) -> Result<user::Model> {
    let txn = db.begin().await?;
    let created = insert_user(&txn, email, wallet_address, true).await?;
    investment::create_investment(&txn, created.id).await?;
    txn.commit().await?;

    info!(username = %created.username, "Created verified user");
    Ok(created)
}

/// Applies an admin edit to a user.
///
/// Verifying a user here opens their investment exactly as
/// [`verify_user_email`] does. Changing the email to one owned by another
/// user fails like a duplicate registration.
#[instrument(skip(db))]
pub async fn update_user(
    db: &DatabaseConnection,
    user_id: i64,
    update: UserUpdate,
) -> Result<user::Model> {
    let txn = db.begin().await?;

    let found = get_user_by_id(&txn, user_id)
        .await?
        .ok_or(Error::UserIdNotFound { user_id })?;
    let mut active_model: user::ActiveModel = found.clone().into();

    if let Some(email) = update.email {
        let email = normalize_email(&email)?;
        if email != found.email {
            if let Some(existing) = get_user_by_email(&txn, &email).await? {
                return Err(duplicate_error(&existing));
            }
            active_model.email = Set(email);
        }
    }
    if let Some(wallet_address) = update.wallet_address {
        active_model.wallet_address = Set(Some(wallet_address));
    }
    if let Some(locked) = update.locked {
        active_model.locked = Set(locked);
    }
    if let Some(email_verified) = update.email_verified {
        active_model.email_verified = Set(email_verified);
        if email_verified
            && investment::get_investment_for_user(&txn, user_id)
                .await?
                .is_none()
        {
            investment::create_investment(&txn, user_id).await?;
        }
    }
    active_model.updated_at = Set(Some(chrono::Utc::now()));
    let updated = active_model.update(&txn).await?;

    txn.commit().await?;

    info!(username = %updated.username, "Updated user");
    Ok(updated)
}

fn normalize_email(raw: &str) -> Result<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() {
        return Err(Error::InvalidArgument {
            message: "Email cannot be empty".to_string(),
        });
    }
    Ok(email)
}

fn duplicate_error(existing: &user::Model) -> Error {
    if existing.email_verified {
        Error::DuplicateUser {
            email: existing.email.clone(),
        }
    } else {
        Error::DuplicateUnverifiedUser {
            email: existing.email.clone(),
        }
    }
}

async fn insert_user<C>(
    db: &C,
    email: String,
    wallet_address: Option<String>,
    email_verified: bool,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let email = normalize_email(&email)?;
    if let Some(existing) = get_user_by_email(db, &email).await? {
        return Err(duplicate_error(&existing));
    }

    let username = counter::next_record_number(db, counter::USER_COLLECTION).await?;
    let new_user = user::ActiveModel {
        username: Set(username),
        email: Set(email),
        email_verified: Set(email_verified),
        wallet_address: Set(wallet_address),
        locked: Set(false),
        created_at: Set(chrono::Utc::now()),
        updated_at: Set(None),
        ..Default::default()
    };

    new_user.insert(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_register_user_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = register_user(&db, "   ".to_string(), None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidArgument { message: _ }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_register_user_mints_sequential_usernames() -> Result<()> {
        let db = setup_test_db().await?;

        let first = register_user(&db, "First@Example.com".to_string(), None).await?;
        let second =
            register_user(&db, "second@example.com".to_string(), Some("0xabc".to_string()))
                .await?;

        assert_eq!(first.username, "User0000000001");
        assert_eq!(first.email, "first@example.com");
        assert!(!first.email_verified);
        assert_eq!(second.username, "User0000000002");
        assert_eq!(second.wallet_address.as_deref(), Some("0xabc"));

        // No investment until the email is verified
        assert!(
            investment::get_investment_for_user(&db, first.id)
                .await?
                .is_none()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_register_duplicate_email() -> Result<()> {
        let db = setup_test_db().await?;
        register_user(&db, "dup@example.com".to_string(), None).await?;

        // Still awaiting confirmation
        let result = register_user(&db, "DUP@example.com".to_string(), None).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::DuplicateUnverifiedUser { .. }
        ));

        create_test_user(&db, "taken@example.com").await?;
        let result = create_verified_user(&db, "taken@example.com".to_string(), None).await;
        assert!(matches!(result.unwrap_err(), Error::DuplicateUser { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_verify_user_email_creates_zero_investment() -> Result<()> {
        let db = setup_test_db().await?;
        let registered = register_user(&db, "new@example.com".to_string(), None).await?;

        let verified = verify_user_email(&db, registered.id).await?;
        assert!(verified.email_verified);
        assert!(verified.updated_at.is_some());

        let balances = balances_of(&db, registered.id).await?;
        assert!(balances.purchased_total.is_zero());
        assert!(balances.released_total.is_zero());
        assert!(balances.locked_total.is_zero());

        // Verifying twice keeps the single investment row
        verify_user_email(&db, registered.id).await?;
        let rows = crate::entities::Investment::find()
            .filter(crate::entities::InvestmentColumn::UserId.eq(registered.id))
            .all(&db)
            .await?;
        assert_eq!(rows.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_verify_unknown_user() -> Result<()> {
        let db = setup_test_db().await?;
        let result = verify_user_email(&db, 42).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::UserIdNotFound { user_id: 42 }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_resolve_verified_user() -> Result<()> {
        let db = setup_test_db().await?;
        let verified = create_test_user(&db, "ok@example.com").await?;
        let pending = create_unverified_user(&db, "pending@example.com").await?;

        let resolved = resolve_verified_user(&db, &verified.username).await?;
        assert_eq!(resolved.id, verified.id);

        assert!(matches!(
            resolve_verified_user(&db, &pending.username).await.unwrap_err(),
            Error::UserNotVerified { .. }
        ));
        assert!(matches!(
            resolve_verified_user(&db, "User9999999999").await.unwrap_err(),
            Error::UserNotFound { .. }
        ));

        let all = list_users(&db).await?;
        assert_eq!(all.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_and_count_users() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(count_users(&db).await?, 0);

        let created = create_test_user(&db, "a@example.com").await?;
        create_unverified_user(&db, "b@example.com").await?;

        assert_eq!(count_users(&db).await?, 2);
        assert_eq!(get_user(&db, created.id).await?.email, "a@example.com");
        assert!(matches!(
            get_user(&db, 999).await.unwrap_err(),
            Error::UserIdNotFound { user_id: 999 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_user_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_user(&db, "a@example.com").await?;
        assert!(!created.locked);

        let updated = update_user(
            &db,
            created.id,
            UserUpdate {
                email: Some(" New@Example.com ".to_string()),
                wallet_address: Some("0xbeef".to_string()),
                locked: Some(true),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.wallet_address.as_deref(), Some("0xbeef"));
        assert!(updated.locked);
        assert!(updated.email_verified);
        assert_eq!(updated.username, created.username);
        assert!(updated.updated_at.is_some());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_user_verification_opens_investment() -> Result<()> {
        let db = setup_test_db().await?;
        let pending = create_unverified_user(&db, "pending@example.com").await?;

        let verified = update_user(
            &db,
            pending.id,
            UserUpdate {
                email_verified: Some(true),
                ..Default::default()
            },
        )
        .await?;

        assert!(verified.email_verified);
        assert!(
            investment::get_investment_for_user(&db, pending.id)
                .await?
                .is_some()
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_update_user_rejects_taken_email() -> Result<()> {
        let db = setup_test_db().await?;
        let first = create_test_user(&db, "first@example.com").await?;
        create_unverified_user(&db, "waiting@example.com").await?;
        create_test_user(&db, "verified@example.com").await?;

        let to_email = |email: &str| UserUpdate {
            email: Some(email.to_string()),
            ..Default::default()
        };

        assert!(matches!(
            update_user(&db, first.id, to_email("waiting@example.com")).await.unwrap_err(),
            Error::DuplicateUnverifiedUser { .. }
        ));
        assert!(matches!(
            update_user(&db, first.id, to_email("verified@example.com")).await.unwrap_err(),
            Error::DuplicateUser { .. }
        ));
        assert!(matches!(
            update_user(&db, 77, to_email("x@example.com")).await.unwrap_err(),
            Error::UserIdNotFound { user_id: 77 }
        ));

        // Re-saving the current email is not a conflict
        let unchanged = update_user(&db, first.id, to_email("FIRST@example.com")).await?;
        assert_eq!(unchanged.email, "first@example.com");

        Ok(())
    }
}
