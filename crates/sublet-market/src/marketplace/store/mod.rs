//! Storage seam for the marketplace. Services talk to a [`MarketStore`]
//! implementation so they can be exercised in isolation; the bundled
//! [`InMemoryStore`] keeps every multi-entity mutation inside a single lock
//! acquisition, which is what makes reservation, signing, and image
//! replacement all-or-nothing.

mod memory;

use chrono::{DateTime, Utc};

use super::domain::{
    Agreement, AgreementId, DateRange, ImageId, ImageRecord, Listing, ListingId, Message,
    MessageId, NewImage, NewListing, NewUser, PayTerm, User, UserId,
};
use super::geocode::GeoPoint;

pub use memory::InMemoryStore;

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("requested dates overlap an existing agreement on this listing")]
    SlotTaken,
    #[error("requested dates fall outside the listing's availability window")]
    OutsideWindow,
    #[error("signer is not a party to the agreement")]
    NotParty,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Fully resolved agreement draft, ready to be reserved against a listing.
/// Money fallbacks and field presence have already been settled by the
/// agreement service.
#[derive(Debug, Clone)]
pub struct AgreementDraft {
    pub term: DateRange,
    pub rent: u32,
    pub security_deposit: u32,
    pub num_people: u32,
    pub pay_term: PayTerm,
    pub listing: ListingId,
    pub owner: UserId,
    pub tenant: UserId,
}

/// Validated message draft.
#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub sender: UserId,
    pub participants: [UserId; 2],
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub id: Option<UserId>,
}

#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub id: Option<ListingId>,
    pub owner: Option<UserId>,
    pub range: Option<DateRange>,
}

#[derive(Debug, Clone, Default)]
pub struct AgreementFilter {
    pub id: Option<AgreementId>,
    pub owner: Option<UserId>,
    pub tenant: Option<UserId>,
    pub range: Option<DateRange>,
}

#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub participant: Option<UserId>,
}

/// Entity store contract: CRUD plus the transactional operations the
/// services rely on. `Result` everywhere so a backing implementation with
/// real I/O can surface `Unavailable`.
pub trait MarketStore: Send + Sync {
    // Users
    fn insert_user(&self, new: NewUser) -> Result<User, StoreError>;
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, StoreError>;
    fn find_user_by_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, StoreError>;
    fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, StoreError>;
    /// Removes the user and the profile image it owns.
    fn delete_user(&self, id: &UserId) -> Result<(), StoreError>;
    fn save_listing(&self, user: &UserId, listing: &ListingId) -> Result<(), StoreError>;
    /// Idempotent: unsaving a listing that was never saved is not an error.
    fn unsave_listing(&self, user: &UserId, listing: &ListingId) -> Result<(), StoreError>;
    fn saved_listings(&self, user: &UserId) -> Result<Vec<Listing>, StoreError>;
    /// Atomically deletes the previous profile image (if any), stores the new
    /// one, and repoints the user. The store is never left referencing
    /// neither image.
    fn replace_profile_image(
        &self,
        user: &UserId,
        image: NewImage,
    ) -> Result<ImageRecord, StoreError>;

    // Listings
    fn insert_listing(
        &self,
        new: NewListing,
        location: Option<GeoPoint>,
    ) -> Result<Listing, StoreError>;
    fn fetch_listing(&self, id: &ListingId) -> Result<Option<Listing>, StoreError>;
    fn list_listings(&self, filter: &ListingFilter) -> Result<Vec<Listing>, StoreError>;
    /// Replaces the stored listing. Fails with `OutsideWindow` if the new
    /// availability window no longer contains an existing agreement.
    fn update_listing(&self, listing: Listing) -> Result<(), StoreError>;
    /// Removes the listing together with its gallery images and agreements.
    fn delete_listing(&self, id: &ListingId) -> Result<(), StoreError>;
    fn add_listing_image(
        &self,
        listing: &ListingId,
        image: NewImage,
    ) -> Result<ImageRecord, StoreError>;

    // Agreements
    /// Checks window containment and overlap against every agreement on the
    /// listing and inserts in the same critical section. Two racing reserves
    /// for conflicting ranges produce exactly one success.
    fn reserve_agreement(&self, draft: AgreementDraft) -> Result<Agreement, StoreError>;
    fn fetch_agreement(&self, id: &AgreementId) -> Result<Option<Agreement>, StoreError>;
    fn agreements_for_listing(&self, listing: &ListingId) -> Result<Vec<Agreement>, StoreError>;
    fn list_agreements(&self, filter: &AgreementFilter) -> Result<Vec<Agreement>, StoreError>;
    /// Matches the signer against the stored owner then tenant and stamps
    /// that side, all under one lock. `NotParty` if the signer is neither.
    fn sign_agreement(
        &self,
        id: &AgreementId,
        signer: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Agreement, StoreError>;
    fn delete_agreement(&self, id: &AgreementId) -> Result<(), StoreError>;

    // Messages
    fn insert_message(&self, draft: MessageDraft) -> Result<Message, StoreError>;
    fn list_messages(&self, filter: &MessageFilter) -> Result<Vec<Message>, StoreError>;
    fn delete_message(&self, id: &MessageId) -> Result<(), StoreError>;

    // Images
    fn fetch_image(&self, id: &ImageId) -> Result<Option<ImageRecord>, StoreError>;
}
