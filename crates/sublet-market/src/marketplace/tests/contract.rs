use std::sync::Arc;

use chrono::{TimeZone, Utc};

use super::common::{date, fixture};
use crate::marketplace::agreements::AgreementService;
use crate::marketplace::contract::{
    fields, ContractError, ContractService, FieldValue, IdentityConverter, TokenTemplater,
    DEFAULT_TEMPLATE,
};
use crate::marketplace::domain::AgreementId;

fn contract_service(
    fx: &super::common::Fixture,
) -> ContractService<crate::marketplace::store::InMemoryStore> {
    ContractService::new(
        fx.store.clone(),
        Arc::new(TokenTemplater),
        Arc::new(IdentityConverter),
        DEFAULT_TEMPLATE.as_bytes().to_vec(),
    )
}

#[test]
fn unsigned_agreements_resolve_to_placeholders() {
    let fx = fixture();
    let agreements = AgreementService::new(fx.store.clone());
    let agreement = agreements
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("agreement lands");

    let map = contract_service(&fx)
        .fields_for(&agreement.id, date(2025, 11, 22))
        .expect("fields resolve");

    assert_eq!(
        map.get(fields::OWNER_NAME),
        Some(&FieldValue::Resolved("John Doe".to_string()))
    );
    assert_eq!(
        map.get(fields::ADDRESS),
        Some(&FieldValue::Resolved("123 State St, Madison WI".to_string()))
    );
    assert_eq!(
        map.get(fields::DATE),
        Some(&FieldValue::Resolved("11/22/2025".to_string()))
    );
    assert_eq!(
        map.get(fields::START_DATE),
        Some(&FieldValue::Resolved("01/01/2026".to_string()))
    );
    assert_eq!(map.get(fields::OWNER_SIGNATURE), Some(&FieldValue::Pending));
    assert_eq!(map.get(fields::TENANT_SIGN_DATE), Some(&FieldValue::Pending));
}

#[test]
fn signing_turns_the_placeholder_into_name_and_date() {
    let fx = fixture();
    let agreements = AgreementService::new(fx.store.clone());
    let agreement = agreements
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("agreement lands");

    let signed_at = Utc
        .with_ymd_and_hms(2025, 11, 23, 9, 30, 0)
        .single()
        .expect("valid timestamp");
    agreements
        .sign(&agreement.id, &fx.owner.id, signed_at)
        .expect("owner signs");

    let map = contract_service(&fx)
        .fields_for(&agreement.id, date(2025, 11, 23))
        .expect("fields resolve");
    assert_eq!(
        map.get(fields::OWNER_SIGNATURE),
        Some(&FieldValue::Resolved("John Doe".to_string()))
    );
    assert_eq!(
        map.get(fields::OWNER_SIGN_DATE),
        Some(&FieldValue::Resolved("11/23/2025".to_string()))
    );
    assert_eq!(map.get(fields::TENANT_SIGNATURE), Some(&FieldValue::Pending));
}

#[tokio::test]
async fn rendering_produces_a_document_with_live_values() {
    let fx = fixture();
    let agreements = AgreementService::new(fx.store.clone());
    let agreement = agreements
        .create(&fx.listing.id, fx.terms((2026, 1, 1), (2026, 2, 28)))
        .expect("agreement lands");

    let service = contract_service(&fx);
    let document = service
        .render(&agreement.id, date(2025, 11, 22))
        .await
        .expect("render succeeds");
    let text = String::from_utf8(document).expect("identity conversion is text");

    assert!(text.contains("John Doe"));
    assert!(text.contains("Alice Smith"));
    assert!(text.contains("$1100"));
    assert!(text.contains("{OWNER_SIGNATURE}"));
    assert_eq!(service.output_content_type(), "text/plain; charset=utf-8");
}

#[test]
fn unknown_agreements_are_not_found() {
    let fx = fixture();
    let err = contract_service(&fx)
        .fields_for(&AgreementId("agreement-999999".to_string()), date(2025, 11, 22))
        .expect_err("missing agreement rejected");
    assert!(matches!(err, ContractError::NotFound("agreement")));
}
