use std::sync::Arc;
use std::thread;

use chrono::Utc;

use super::common::{fixture, fixture_without_deposit};
use crate::marketplace::agreements::{AgreementError, AgreementService};
use crate::marketplace::domain::{AgreementId, PayTerm, UserId};
use crate::marketplace::store::MarketStore;

#[test]
fn missing_required_fields_report_as_one_validation_error() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());
    let mut terms = fx.terms((2026, 1, 1), (2026, 2, 28));
    terms.num_people = None;

    let err = service
        .create(&fx.listing.id, terms)
        .expect_err("incomplete terms rejected");
    match err {
        AgreementError::Validation(message) => assert!(message.contains("numPeople")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn deposit_falls_back_to_the_listing_default() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());
    let agreement = service
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("terms without deposit accepted");
    assert_eq!(agreement.security_deposit, 1100);
    assert_eq!(agreement.rent, 1100);
    assert_eq!(agreement.pay_term, PayTerm::Monthly);
}

#[test]
fn explicit_deposit_overrides_the_listing_default() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());
    let mut terms = fx.terms((2026, 1, 1), (2026, 2, 28));
    terms.security_deposit = Some(900);
    terms.rent = Some(1000);

    let agreement = service.create(&fx.listing.id, terms).expect("terms accepted");
    assert_eq!(agreement.security_deposit, 900);
    assert_eq!(agreement.rent, 1000);
}

#[test]
fn missing_deposit_on_both_sides_is_a_validation_error() {
    let fx = fixture_without_deposit();
    let service = AgreementService::new(fx.store.clone());
    let err = service
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect_err("deposit required somewhere");
    match err {
        AgreementError::Validation(message) => assert!(message.contains("securityDeposit")),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn boundary_touching_ranges_conflict_and_disjoint_ranges_land() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());

    service
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("first agreement lands");

    let err = service
        .create(&fx.listing.id, fx.terms((2026, 2, 28), (2026, 3, 15)))
        .expect_err("shared boundary date conflicts");
    assert!(matches!(err, AgreementError::Conflict(_)));

    service
        .create(&fx.listing.id, fx.terms((2026, 3, 1), (2026, 3, 15)))
        .expect("next-day start is free");
}

#[test]
fn ranges_outside_the_listing_window_conflict() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());
    let err = service
        .create(&fx.listing.id, fx.terms((2025, 12, 15), (2026, 1, 15)))
        .expect_err("window is closed before January");
    assert!(matches!(err, AgreementError::Conflict(_)));
}

#[test]
fn signing_stamps_only_the_matching_side() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());
    let agreement = service
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("agreement lands");
    assert!(!agreement.owner_signed() && !agreement.tenant_signed());

    let signed = service
        .sign(&agreement.id, &fx.owner.id, Utc::now())
        .expect("owner signs");
    assert!(signed.owner_signed());
    assert!(!signed.tenant_signed());
    assert!(!signed.is_fully_signed());
}

#[test]
fn strangers_cannot_sign_and_nothing_changes() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());
    let agreement = service
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("agreement lands");

    let err = service
        .sign(&agreement.id, &UserId("user-999999".to_string()), Utc::now())
        .expect_err("stranger rejected");
    assert!(matches!(err, AgreementError::Forbidden));

    let unchanged = service.get(&agreement.id).expect("agreement still there");
    assert!(unchanged.owner_sign_date.is_none());
    assert!(unchanged.tenant_sign_date.is_none());
}

#[test]
fn fully_signed_in_either_order() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());
    let agreement = service
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("agreement lands");

    service
        .sign(&agreement.id, &fx.tenant.id, Utc::now())
        .expect("tenant signs first");
    let both = service
        .sign(&agreement.id, &fx.owner.id, Utc::now())
        .expect("owner signs second");
    assert!(both.is_fully_signed());
}

#[test]
fn resigning_refreshes_the_timestamp() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());
    let agreement = service
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("agreement lands");

    let first = Utc::now();
    service
        .sign(&agreement.id, &fx.owner.id, first)
        .expect("owner signs");
    let later = first + chrono::Duration::minutes(5);
    let resigned = service
        .sign(&agreement.id, &fx.owner.id, later)
        .expect("owner re-signs");
    assert_eq!(resigned.owner_sign_date, Some(later));
    assert!(resigned.tenant_sign_date.is_none());
}

#[test]
fn deleting_an_agreement_frees_its_slot_and_cleans_the_listing() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());
    let agreement = service
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("agreement lands");

    service.delete(&agreement.id).expect("delete succeeds");
    let listing = fx
        .store
        .fetch_listing(&fx.listing.id)
        .expect("store reachable")
        .expect("listing still there");
    assert!(listing.agreements.is_empty());

    // The slot is open again.
    service
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("same range reservable after delete");

    let err = service
        .delete(&AgreementId("agreement-999999".to_string()))
        .expect_err("double delete rejected");
    assert!(matches!(err, AgreementError::NotFound(_)));
}

#[test]
fn racing_conflicting_reservations_produce_exactly_one_success() {
    let fx = fixture();
    let service = Arc::new(AgreementService::new(fx.store.clone()));

    let ranges = [((2026, 3, 1), (2026, 3, 10)), ((2026, 3, 5), (2026, 3, 20))];
    let handles: Vec<_> = ranges
        .into_iter()
        .map(|(start, end)| {
            let service = service.clone();
            let listing = fx.listing.id.clone();
            let terms = fx.terms(start, end);
            thread::spawn(move || service.create(&listing, terms))
        })
        .collect();

    let outcomes: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("reservation thread joins"))
        .collect();

    let successes = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    assert_eq!(successes, 1, "exactly one racing reservation may land");
    assert!(outcomes
        .iter()
        .filter_map(|outcome| outcome.as_ref().err())
        .all(|err| matches!(err, AgreementError::Conflict(_))));

    let stored = fx
        .store
        .agreements_for_listing(&fx.listing.id)
        .expect("store reachable");
    assert_eq!(stored.len(), 1);
}

#[test]
fn persisted_agreements_never_overlap() {
    let fx = fixture();
    let service = AgreementService::new(fx.store.clone());

    let candidates = [
        ((2026, 1, 1), (2026, 1, 31)),
        ((2026, 1, 20), (2026, 2, 10)),
        ((2026, 2, 1), (2026, 2, 28)),
        ((2026, 2, 20), (2026, 3, 5)),
        ((2026, 3, 1), (2026, 3, 31)),
    ];
    for (start, end) in candidates {
        // Some land, some conflict; either way the store invariant holds.
        let _ = service.create(&fx.listing.id, fx.terms(start, end));
    }

    let stored = fx
        .store
        .agreements_for_listing(&fx.listing.id)
        .expect("store reachable");
    for (i, a) in stored.iter().enumerate() {
        for b in stored.iter().skip(i + 1) {
            assert!(
                !a.term.overlaps(&b.term),
                "{:?} and {:?} must not both be persisted",
                a.term,
                b.term
            );
        }
    }
}
