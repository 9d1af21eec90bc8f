use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::marketplace::domain::{Agreement, Listing, User};

pub const OWNER_NAME: &str = "OWNER_NAME";
pub const TENANT_NAME: &str = "TENANT_NAME";
pub const ADDRESS: &str = "ADDRESS";
pub const DATE: &str = "DATE";
pub const START_DATE: &str = "START_DATE";
pub const END_DATE: &str = "END_DATE";
pub const RENT: &str = "RENT";
pub const DEPOSIT: &str = "DEPOSIT";
pub const OWNER_SIGNATURE: &str = "OWNER_SIGNATURE";
pub const OWNER_SIGN_DATE: &str = "OWNER_SIGN_DATE";
pub const TENANT_SIGNATURE: &str = "TENANT_SIGNATURE";
pub const TENANT_SIGN_DATE: &str = "TENANT_SIGN_DATE";

/// A document field is either a concrete value or still pending. Pending
/// fields keep their `{TAG}` token in the rendered document so a later
/// render pass can fill them in once that side signs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Resolved(String),
    Pending,
}

impl FieldValue {
    pub fn is_pending(&self) -> bool {
        matches!(self, FieldValue::Pending)
    }

    pub fn resolved(&self) -> Option<&str> {
        match self {
            FieldValue::Resolved(value) => Some(value),
            FieldValue::Pending => None,
        }
    }
}

/// Deterministic tag-to-value mapping for one agreement at one render date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractFields {
    entries: BTreeMap<&'static str, FieldValue>,
}

impl ContractFields {
    pub fn get(&self, tag: &str) -> Option<&FieldValue> {
        self.entries.get(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(tag, value)| (*tag, value))
    }
}

pub fn format_contract_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Project an agreement and its populated listing/owner/tenant records into
/// the contract field map. Pure: same inputs, same map.
pub fn contract_fields(
    agreement: &Agreement,
    listing: &Listing,
    owner: &User,
    tenant: &User,
    today: NaiveDate,
) -> ContractFields {
    let mut entries = BTreeMap::new();
    entries.insert(OWNER_NAME, FieldValue::Resolved(owner.name.clone()));
    entries.insert(TENANT_NAME, FieldValue::Resolved(tenant.name.clone()));
    entries.insert(ADDRESS, FieldValue::Resolved(listing.address.clone()));
    entries.insert(DATE, FieldValue::Resolved(format_contract_date(today)));
    entries.insert(
        START_DATE,
        FieldValue::Resolved(format_contract_date(agreement.term.start)),
    );
    entries.insert(
        END_DATE,
        FieldValue::Resolved(format_contract_date(agreement.term.end)),
    );
    entries.insert(RENT, FieldValue::Resolved(agreement.rent.to_string()));
    entries.insert(
        DEPOSIT,
        FieldValue::Resolved(agreement.security_deposit.to_string()),
    );

    match agreement.owner_sign_date {
        Some(at) => {
            entries.insert(OWNER_SIGNATURE, FieldValue::Resolved(owner.name.clone()));
            entries.insert(
                OWNER_SIGN_DATE,
                FieldValue::Resolved(format_contract_date(at.date_naive())),
            );
        }
        None => {
            entries.insert(OWNER_SIGNATURE, FieldValue::Pending);
            entries.insert(OWNER_SIGN_DATE, FieldValue::Pending);
        }
    }
    match agreement.tenant_sign_date {
        Some(at) => {
            entries.insert(TENANT_SIGNATURE, FieldValue::Resolved(tenant.name.clone()));
            entries.insert(
                TENANT_SIGN_DATE,
                FieldValue::Resolved(format_contract_date(at.date_naive())),
            );
        }
        None => {
            entries.insert(TENANT_SIGNATURE, FieldValue::Pending);
            entries.insert(TENANT_SIGN_DATE, FieldValue::Pending);
        }
    }

    ContractFields { entries }
}
