use std::sync::Arc;

use super::domain::{DateRange, ListingId};
use super::store::{MarketStore, StoreError};

/// Error enumeration for availability queries.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityError {
    #[error("listing not found")]
    NotFound,
    #[error("startDate must not come after endDate")]
    InvalidRange,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for AvailabilityError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => Self::NotFound,
            other => Self::Store(other),
        }
    }
}

/// Decides whether a candidate reservation is admissible against a listing.
/// Pure query over current agreement state; creation re-runs the same checks
/// inside the store transaction, so a positive answer here is advisory, not a
/// reservation.
pub struct AvailabilityEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for AvailabilityEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: MarketStore> AvailabilityEngine<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// `Ok(true)` iff the closed range fits the listing window and touches no
    /// existing agreement. Single-day queries (`start == end`) are valid;
    /// inverted ranges are not.
    pub fn check(&self, listing: &ListingId, range: DateRange) -> Result<bool, AvailabilityError> {
        if range.start > range.end {
            return Err(AvailabilityError::InvalidRange);
        }
        let listing = self
            .store
            .fetch_listing(listing)?
            .ok_or(AvailabilityError::NotFound)?;
        if !listing.window.contains(&range) {
            return Ok(false);
        }
        let agreements = self.store.agreements_for_listing(&listing.id)?;
        Ok(agreements
            .iter()
            .all(|agreement| !agreement.term.overlaps(&range)))
    }
}
