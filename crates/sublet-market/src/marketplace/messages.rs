use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{Message, MessageId, NewMessage};
use super::store::{MarketStore, MessageDraft, MessageFilter, StoreError};

/// Error enumeration for messaging operations.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for MessageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound(entity),
            other => Self::Store(other),
        }
    }
}

/// Two-party messaging. Messages are immutable once stored; the only
/// mutation is deletion.
pub struct MessageService<S> {
    store: Arc<S>,
}

impl<S> Clone for MessageService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: MarketStore> MessageService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn send(&self, new: NewMessage, at: DateTime<Utc>) -> Result<Message, MessageError> {
        if new.content.trim().is_empty() {
            return Err(MessageError::Validation(
                "content must not be empty".to_string(),
            ));
        }
        if new.sender == new.recipient {
            return Err(MessageError::Validation(
                "sender and recipient must be two distinct users".to_string(),
            ));
        }
        for party in [&new.sender, &new.recipient] {
            self.store
                .fetch_user(party)?
                .ok_or(MessageError::NotFound("user"))?;
        }
        let draft = MessageDraft {
            sender: new.sender.clone(),
            participants: [new.sender, new.recipient],
            content: new.content,
            sent_at: at,
        };
        Ok(self.store.insert_message(draft)?)
    }

    pub fn list(&self, filter: &MessageFilter) -> Result<Vec<Message>, MessageError> {
        Ok(self.store.list_messages(filter)?)
    }

    pub fn delete(&self, id: &MessageId) -> Result<(), MessageError> {
        Ok(self.store.delete_message(id)?)
    }
}
