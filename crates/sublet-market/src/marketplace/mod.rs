//! Sublease marketplace domain: listings, availability checking, the
//! agreement signing lifecycle, contract generation, and the surrounding
//! account/messaging/image CRUD.

pub mod accounts;
pub mod agreements;
pub mod availability;
pub mod contract;
pub mod domain;
pub mod geocode;
pub mod import;
pub mod lease;
pub mod listings;
pub mod messages;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use accounts::{AccountError, AccountService};
pub use agreements::{AgreementError, AgreementService};
pub use availability::{AvailabilityEngine, AvailabilityError};
pub use contract::{ContractError, ContractFields, ContractService, FieldValue};
pub use domain::{
    Agreement, AgreementId, AgreementTerms, DateRange, ImageId, ImageRecord, Listing, ListingId,
    ListingPatch, Message, MessageId, NewImage, NewListing, NewMessage, NewUser, Party, PayTerm,
    User, UserId, UserView,
};
pub use geocode::{GeoPoint, Geocoder, NoGeocoder};
pub use lease::{check_sublease_terms, LeaseAnalyzer, LeaseVerdict, SubleaseAllowance};
pub use listings::{ListingError, ListingService};
pub use messages::{MessageError, MessageService};
pub use router::{market_router, Collaborators, MarketState};
pub use store::{
    AgreementFilter, InMemoryStore, ListingFilter, MarketStore, MessageFilter, StoreError,
    UserFilter,
};
