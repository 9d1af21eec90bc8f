use std::sync::Arc;

use super::domain::{ImageRecord, NewImage, NewUser, User, UserId};
use super::store::{MarketStore, StoreError, UserFilter};

/// Error enumeration for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    Validation(String),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound(entity),
            other => Self::Store(other),
        }
    }
}

/// Signup, login, and profile management. Passwords live only inside the
/// store; callers shape responses through `User::view`.
pub struct AccountService<S> {
    store: Arc<S>,
}

impl<S> Clone for AccountService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: MarketStore> AccountService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn signup(&self, new: NewUser) -> Result<User, AccountError> {
        if new.name.trim().is_empty() {
            return Err(AccountError::Validation("name must not be empty".to_string()));
        }
        if new.email.trim().is_empty() || !new.email.contains('@') {
            return Err(AccountError::Validation(
                "email must be a valid address".to_string(),
            ));
        }
        if new.password.is_empty() {
            return Err(AccountError::Validation(
                "password must not be empty".to_string(),
            ));
        }
        Ok(self.store.insert_user(new)?)
    }

    pub fn login(&self, email: &str, password: &str) -> Result<User, AccountError> {
        self.store
            .find_user_by_credentials(email, password)?
            .ok_or(AccountError::InvalidCredentials)
    }

    pub fn get(&self, id: &UserId) -> Result<User, AccountError> {
        self.store
            .fetch_user(id)?
            .ok_or(AccountError::NotFound("user"))
    }

    pub fn list(&self, filter: &UserFilter) -> Result<Vec<User>, AccountError> {
        Ok(self.store.list_users(filter)?)
    }

    pub fn delete(&self, id: &UserId) -> Result<(), AccountError> {
        Ok(self.store.delete_user(id)?)
    }

    /// Swap the profile image. Old image removal, new image insertion, and
    /// the pointer update happen in one store transaction.
    pub fn set_profile_image(
        &self,
        user: &UserId,
        image: NewImage,
    ) -> Result<ImageRecord, AccountError> {
        Ok(self.store.replace_profile_image(user, image)?)
    }

    pub fn profile_image(&self, user: &UserId) -> Result<ImageRecord, AccountError> {
        let user = self.get(user)?;
        let id = user
            .profile_image
            .ok_or(AccountError::NotFound("image"))?;
        self.store
            .fetch_image(&id)?
            .ok_or(AccountError::NotFound("image"))
    }
}
