use super::common::{fixture, range};
use crate::marketplace::availability::{AvailabilityEngine, AvailabilityError};
use crate::marketplace::agreements::AgreementService;
use crate::marketplace::domain::ListingId;

#[test]
fn unknown_listing_is_not_found() {
    let fx = fixture();
    let engine = AvailabilityEngine::new(fx.store.clone());
    let err = engine
        .check(&ListingId("listing-999999".to_string()), range((2026, 2, 1), (2026, 2, 10)))
        .expect_err("missing listing rejected");
    assert!(matches!(err, AvailabilityError::NotFound));
}

#[test]
fn inverted_ranges_are_invalid() {
    let fx = fixture();
    let engine = AvailabilityEngine::new(fx.store.clone());
    let err = engine
        .check(&fx.listing.id, range((2026, 3, 10), (2026, 3, 1)))
        .expect_err("inverted range rejected");
    assert!(matches!(err, AvailabilityError::InvalidRange));
}

#[test]
fn single_day_queries_are_valid() {
    let fx = fixture();
    let engine = AvailabilityEngine::new(fx.store.clone());
    let available = engine
        .check(&fx.listing.id, range((2026, 2, 1), (2026, 2, 1)))
        .expect("query runs");
    assert!(available);
}

#[test]
fn ranges_outside_the_listing_window_are_unavailable() {
    let fx = fixture();
    let engine = AvailabilityEngine::new(fx.store.clone());
    for candidate in [
        range((2025, 12, 1), (2025, 12, 20)),
        range((2025, 12, 28), (2026, 1, 10)),
        range((2026, 5, 20), (2026, 6, 10)),
        range((2026, 6, 1), (2026, 6, 30)),
    ] {
        let available = engine.check(&fx.listing.id, candidate).expect("query runs");
        assert!(!available, "{candidate:?} should be unavailable");
    }
}

#[test]
fn booked_ranges_block_equal_contained_and_intersecting_queries() {
    let fx = fixture();
    let agreements = AgreementService::new(fx.store.clone());
    let engine = AvailabilityEngine::new(fx.store.clone());

    agreements
        .create(&fx.listing.id, fx.terms((2026, 2, 1), (2026, 2, 28)))
        .expect("first booking lands");

    for candidate in [
        range((2026, 2, 1), (2026, 2, 28)),
        range((2026, 2, 10), (2026, 2, 14)),
        range((2026, 1, 20), (2026, 2, 5)),
        range((2026, 2, 25), (2026, 3, 10)),
        range((2026, 2, 28), (2026, 3, 10)),
        range((2026, 1, 20), (2026, 2, 1)),
    ] {
        let available = engine.check(&fx.listing.id, candidate).expect("query runs");
        assert!(!available, "{candidate:?} should conflict");
    }

    let available = engine
        .check(&fx.listing.id, range((2026, 3, 1), (2026, 3, 15)))
        .expect("query runs");
    assert!(available, "disjoint later range stays open");
}

#[test]
fn checking_has_no_side_effects() {
    let fx = fixture();
    let engine = AvailabilityEngine::new(fx.store.clone());
    let agreements = AgreementService::new(fx.store.clone());

    engine
        .check(&fx.listing.id, range((2026, 2, 1), (2026, 2, 28)))
        .expect("query runs");
    // The checked range is still free to reserve.
    agreements
        .create(&fx.listing.id, fx.terms((2026, 2, 1), (2026, 2, 28)))
        .expect("check reserved nothing");
}
