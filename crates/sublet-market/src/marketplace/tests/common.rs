use std::sync::Arc;

use chrono::NaiveDate;

use crate::marketplace::domain::{
    AgreementTerms, DateRange, Listing, NewListing, NewUser, User, UserId,
};
use crate::marketplace::store::{InMemoryStore, MarketStore};

pub(super) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub(super) fn range(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateRange {
    DateRange::new(date(start.0, start.1, start.2), date(end.0, end.1, end.2))
}

pub(super) fn new_user(name: &str, email: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        password: "correct horse".to_string(),
        wallet_address: None,
        zipcode: Some("53703".to_string()),
    }
}

pub(super) fn new_listing(owner: &UserId, deposit: Option<u32>) -> NewListing {
    NewListing {
        title: "Sunny room near campus".to_string(),
        description: Some("Third floor, bus line outside".to_string()),
        address: "123 State St, Madison WI".to_string(),
        website: None,
        rent: 1100,
        security_deposit: deposit,
        window: range((2026, 1, 1), (2026, 5, 31)),
        capacity: 2,
        owner: owner.clone(),
    }
}

/// Store pre-populated with an owner, a tenant, and one listing covering
/// 2026-01-01 through 2026-05-31.
pub(super) struct Fixture {
    pub(super) store: Arc<InMemoryStore>,
    pub(super) owner: User,
    pub(super) tenant: User,
    pub(super) listing: Listing,
}

pub(super) fn fixture() -> Fixture {
    fixture_with_deposit(Some(1100))
}

pub(super) fn fixture_without_deposit() -> Fixture {
    fixture_with_deposit(None)
}

fn fixture_with_deposit(deposit: Option<u32>) -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let owner = store
        .insert_user(new_user("John Doe", "john@example.edu"))
        .expect("owner inserts");
    let tenant = store
        .insert_user(new_user("Alice Smith", "alice@example.edu"))
        .expect("tenant inserts");
    let listing = store
        .insert_listing(new_listing(&owner.id, deposit), None)
        .expect("listing inserts");
    Fixture {
        store,
        owner,
        tenant,
        listing,
    }
}

impl Fixture {
    pub(super) fn terms(&self, start: (i32, u32, u32), end: (i32, u32, u32)) -> AgreementTerms {
        AgreementTerms {
            start_date: Some(date(start.0, start.1, start.2)),
            end_date: Some(date(end.0, end.1, end.2)),
            owner: Some(self.owner.id.clone()),
            tenant: Some(self.tenant.id.clone()),
            num_people: Some(1),
            ..AgreementTerms::default()
        }
    }
}
