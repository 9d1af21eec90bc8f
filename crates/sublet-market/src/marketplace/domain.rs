use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::geocode::GeoPoint;

/// Identifier wrapper for registered users.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Identifier wrapper for posted listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

/// Identifier wrapper for sublease agreements.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgreementId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub String);

/// Closed date interval. Both endpoints are part of the range, so two leases
/// sharing a boundary date occupy the same night and conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(rename = "startDate")]
    pub start: NaiveDate,
    #[serde(rename = "endDate")]
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Inclusive-boundary intersection: `[a1,a2]` and `[b1,b2]` overlap when
    /// `a1 <= b2 && b1 <= a2`.
    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn contains(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Schema-level ordering invariant for stored entities.
    pub fn is_chronological(&self) -> bool {
        self.end > self.start
    }
}

/// Payment cadence agreed between owner and tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayTerm {
    #[default]
    Monthly,
    Weekly,
    OneTime,
}

impl PayTerm {
    pub const fn label(self) -> &'static str {
        match self {
            PayTerm::Monthly => "monthly",
            PayTerm::Weekly => "weekly",
            PayTerm::OneTime => "one_time",
        }
    }
}

/// A registered account. The password stays inside the store; every outbound
/// payload goes through [`UserView`] instead.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password: String,
    pub wallet_address: Option<String>,
    pub zipcode: Option<String>,
    pub saved_listings: Vec<ListingId>,
    pub profile_image: Option<ImageId>,
}

impl User {
    pub fn view(&self) -> UserView {
        UserView {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            wallet_address: self.wallet_address.clone(),
            zipcode: self.zipcode.clone(),
            saved_listings: self.saved_listings.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

/// Response shape for users: everything except the password.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    pub saved_listings: Vec<ListingId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<ImageId>,
}

/// A postable sublease offer with a fixed availability window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub rent: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_deposit: Option<u32>,
    #[serde(flatten)]
    pub window: DateRange,
    pub capacity: u32,
    pub owner: UserId,
    pub images: Vec<ImageId>,
    pub agreements: Vec<AgreementId>,
}

/// A concrete sublease reservation against a listing for a sub-range of its
/// availability window.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Agreement {
    pub id: AgreementId,
    #[serde(flatten)]
    pub term: DateRange,
    pub rent: u32,
    pub security_deposit: u32,
    pub num_people: u32,
    pub pay_term: PayTerm,
    pub listing: ListingId,
    pub owner: UserId,
    pub tenant: UserId,
    pub owner_sign_date: Option<DateTime<Utc>>,
    pub tenant_sign_date: Option<DateTime<Utc>>,
}

/// Which side of an agreement a user stands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Owner,
    Tenant,
}

impl Agreement {
    pub fn owner_signed(&self) -> bool {
        self.owner_sign_date.is_some()
    }

    pub fn tenant_signed(&self) -> bool {
        self.tenant_sign_date.is_some()
    }

    /// Fully signed once both sign timestamps are present, in either order.
    pub fn is_fully_signed(&self) -> bool {
        self.owner_signed() && self.tenant_signed()
    }

    /// Exact identity comparison, owner side first. A user listed on both
    /// sides signs as the owner.
    pub fn party_for(&self, user: &UserId) -> Option<Party> {
        if &self.owner == user {
            Some(Party::Owner)
        } else if &self.tenant == user {
            Some(Party::Tenant)
        } else {
            None
        }
    }
}

/// A message between exactly two participants; the sender is always one of
/// them. Immutable once stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender: UserId,
    pub participants: [UserId; 2],
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Stored binary image, owned by exactly one parent (a user profile or a
/// listing gallery) at a time.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub id: ImageId,
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

/// Upload payload for an image, validated before it reaches the store.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub data: Vec<u8>,
    pub content_type: String,
    pub filename: String,
}

#[derive(Debug, thiserror::Error)]
#[error("content type '{0}' is not an image")]
pub struct NotAnImage(pub String);

impl NewImage {
    pub fn new(data: Vec<u8>, content_type: &str, filename: &str) -> Result<Self, NotAnImage> {
        let parsed: mime::Mime = content_type
            .parse()
            .map_err(|_| NotAnImage(content_type.to_string()))?;
        if parsed.type_() != mime::IMAGE {
            return Err(NotAnImage(content_type.to_string()));
        }
        Ok(Self {
            data,
            content_type: parsed.essence_str().to_string(),
            filename: filename.to_string(),
        })
    }
}

/// Signup payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub zipcode: Option<String>,
}

/// Listing creation payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub address: String,
    #[serde(default)]
    pub website: Option<String>,
    pub rent: u32,
    #[serde(default)]
    pub security_deposit: Option<u32>,
    #[serde(flatten)]
    pub window: DateRange,
    pub capacity: u32,
    pub owner: UserId,
}

/// Owner-only partial update for a listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub rent: Option<u32>,
    pub security_deposit: Option<u32>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub capacity: Option<u32>,
}

/// Terms submitted when a tenant's offer on a listing is accepted. Every
/// field is optional at the wire level; presence is validated by the
/// agreement service so missing fields report as one 400 rather than a
/// deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgreementTerms {
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub owner: Option<UserId>,
    #[serde(default)]
    pub tenant: Option<UserId>,
    #[serde(default)]
    pub num_people: Option<u32>,
    #[serde(default)]
    pub rent: Option<u32>,
    #[serde(default)]
    pub security_deposit: Option<u32>,
    #[serde(default)]
    pub pay_term: Option<PayTerm>,
}

/// Message creation payload; stored participants are `[sender, recipient]`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    pub sender: UserId,
    pub recipient: UserId,
    pub content: String,
}
