use std::sync::Arc;

use super::domain::{
    DateRange, ImageId, ImageRecord, Listing, ListingId, ListingPatch, NewImage, NewListing,
    UserId,
};
use super::geocode::Geocoder;
use super::store::{ListingFilter, MarketStore, StoreError};

/// Error enumeration for listing operations.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("only the listing owner may modify it")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ListingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound(entity),
            StoreError::OutsideWindow => Self::Conflict(
                "existing agreements fall outside the new availability window".to_string(),
            ),
            StoreError::SlotTaken => Self::Conflict(err.to_string()),
            StoreError::NotParty => Self::Forbidden,
            StoreError::Unavailable(_) => Self::Store(err),
        }
    }
}

/// Listing CRUD with owner-only mutation, saved-listing bookkeeping, and the
/// explicit geocoding step that used to hide in a persistence hook.
pub struct ListingService<S> {
    store: Arc<S>,
    geocoder: Arc<dyn Geocoder>,
}

impl<S> Clone for ListingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            geocoder: self.geocoder.clone(),
        }
    }
}

fn validate_window(window: &DateRange) -> Result<(), ListingError> {
    if !window.is_chronological() {
        return Err(ListingError::Validation(
            "endDate must come after startDate".to_string(),
        ));
    }
    Ok(())
}

impl<S: MarketStore> ListingService<S> {
    pub fn new(store: Arc<S>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    /// Create a listing. Geocoding runs here, as an orchestration step the
    /// caller can see; a failed lookup leaves the location empty.
    pub async fn create(&self, new: NewListing) -> Result<Listing, ListingError> {
        if new.title.trim().is_empty() {
            return Err(ListingError::Validation("title must not be empty".to_string()));
        }
        if new.address.trim().is_empty() {
            return Err(ListingError::Validation(
                "address must not be empty".to_string(),
            ));
        }
        validate_window(&new.window)?;
        if new.capacity == 0 {
            return Err(ListingError::Validation(
                "capacity must be at least 1".to_string(),
            ));
        }
        let location = self.geocoder.resolve(&new.address).await;
        Ok(self.store.insert_listing(new, location)?)
    }

    pub fn get(&self, id: &ListingId) -> Result<Listing, ListingError> {
        self.store
            .fetch_listing(id)?
            .ok_or(ListingError::NotFound("listing"))
    }

    pub fn list(&self, filter: &ListingFilter) -> Result<Vec<Listing>, ListingError> {
        Ok(self.store.list_listings(filter)?)
    }

    /// Owner-only partial update. A changed address is re-geocoded; a
    /// shrunken window is rejected by the store if an agreement no longer
    /// fits.
    pub async fn update(
        &self,
        id: &ListingId,
        actor: &UserId,
        patch: ListingPatch,
    ) -> Result<Listing, ListingError> {
        let mut listing = self.get(id)?;
        if &listing.owner != actor {
            return Err(ListingError::Forbidden);
        }

        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(ListingError::Validation("title must not be empty".to_string()));
            }
            listing.title = title;
        }
        if let Some(description) = patch.description {
            listing.description = Some(description);
        }
        if let Some(website) = patch.website {
            listing.website = Some(website);
        }
        if let Some(rent) = patch.rent {
            listing.rent = rent;
        }
        if let Some(deposit) = patch.security_deposit {
            listing.security_deposit = Some(deposit);
        }
        if let Some(start) = patch.start_date {
            listing.window.start = start;
        }
        if let Some(end) = patch.end_date {
            listing.window.end = end;
        }
        validate_window(&listing.window)?;
        if let Some(capacity) = patch.capacity {
            if capacity == 0 {
                return Err(ListingError::Validation(
                    "capacity must be at least 1".to_string(),
                ));
            }
            listing.capacity = capacity;
        }
        if let Some(address) = patch.address {
            if address.trim().is_empty() {
                return Err(ListingError::Validation(
                    "address must not be empty".to_string(),
                ));
            }
            listing.location = self.geocoder.resolve(&address).await;
            listing.address = address;
        }

        self.store.update_listing(listing.clone())?;
        Ok(listing)
    }

    /// Owner-only removal; gallery images and agreements go with the listing.
    pub fn delete(&self, id: &ListingId, actor: &UserId) -> Result<(), ListingError> {
        let listing = self.get(id)?;
        if &listing.owner != actor {
            return Err(ListingError::Forbidden);
        }
        Ok(self.store.delete_listing(id)?)
    }

    pub fn save(&self, user: &UserId, listing: &ListingId) -> Result<(), ListingError> {
        Ok(self.store.save_listing(user, listing)?)
    }

    pub fn unsave(&self, user: &UserId, listing: &ListingId) -> Result<(), ListingError> {
        Ok(self.store.unsave_listing(user, listing)?)
    }

    pub fn saved(&self, user: &UserId) -> Result<Vec<Listing>, ListingError> {
        Ok(self.store.saved_listings(user)?)
    }

    pub fn add_image(
        &self,
        id: &ListingId,
        actor: &UserId,
        image: NewImage,
    ) -> Result<ImageRecord, ListingError> {
        let listing = self.get(id)?;
        if &listing.owner != actor {
            return Err(ListingError::Forbidden);
        }
        Ok(self.store.add_listing_image(id, image)?)
    }

    /// Fetch one gallery image, refusing ids that belong to another parent.
    pub fn image(&self, id: &ListingId, image: &ImageId) -> Result<ImageRecord, ListingError> {
        let listing = self.get(id)?;
        if !listing.images.contains(image) {
            return Err(ListingError::NotFound("image"));
        }
        self.store
            .fetch_image(image)?
            .ok_or(ListingError::NotFound("image"))
    }
}
