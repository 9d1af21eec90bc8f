use std::sync::Arc;

use chrono::{DateTime, Utc};

use super::domain::{Agreement, AgreementId, AgreementTerms, DateRange, ListingId, UserId};
use super::store::{AgreementDraft, AgreementFilter, MarketStore, StoreError};

/// Error enumeration for agreement lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum AgreementError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("only the owner or tenant may sign this agreement")]
    Forbidden,
    #[error("{0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for AgreementError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound(entity),
            StoreError::SlotTaken | StoreError::OutsideWindow => Self::Conflict(err.to_string()),
            StoreError::NotParty => Self::Forbidden,
            StoreError::Unavailable(_) => Self::Store(err),
        }
    }
}

/// Signing state machine over agreements: creation with money fallbacks,
/// independent owner/tenant signing, and administrative deletion.
pub struct AgreementService<S> {
    store: Arc<S>,
}

impl<S> Clone for AgreementService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: MarketStore> AgreementService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Accept an offer on a listing, producing an unsigned agreement.
    ///
    /// Rent falls back to the listing's rent; the deposit falls back to the
    /// listing's deposit and is an error when neither side provides one.
    /// Window containment and non-overlap are re-validated by the store in
    /// the same transaction that inserts, so racing accepts for conflicting
    /// ranges cannot both land.
    pub fn create(
        &self,
        listing_id: &ListingId,
        terms: AgreementTerms,
    ) -> Result<Agreement, AgreementError> {
        let (Some(start), Some(end), Some(owner), Some(tenant), Some(num_people)) = (
            terms.start_date,
            terms.end_date,
            terms.owner.clone(),
            terms.tenant.clone(),
            terms.num_people,
        ) else {
            return Err(AgreementError::Validation(
                "missing some required fields (startDate, endDate, tenant, owner, numPeople)"
                    .to_string(),
            ));
        };

        let term = DateRange::new(start, end);
        if !term.is_chronological() {
            return Err(AgreementError::Validation(
                "endDate must come after startDate".to_string(),
            ));
        }
        if num_people == 0 {
            return Err(AgreementError::Validation(
                "numPeople must be at least 1".to_string(),
            ));
        }

        let listing = self
            .store
            .fetch_listing(listing_id)?
            .ok_or(AgreementError::NotFound("listing"))?;

        let security_deposit = terms
            .security_deposit
            .or(listing.security_deposit)
            .ok_or_else(|| {
                AgreementError::Validation(
                    "must specify securityDeposit for this listing".to_string(),
                )
            })?;
        let rent = terms.rent.unwrap_or(listing.rent);

        for party in [&owner, &tenant] {
            self.store
                .fetch_user(party)?
                .ok_or(AgreementError::NotFound("user"))?;
        }

        let draft = AgreementDraft {
            term,
            rent,
            security_deposit,
            num_people,
            pay_term: terms.pay_term.unwrap_or_default(),
            listing: listing.id,
            owner,
            tenant,
        };
        Ok(self.store.reserve_agreement(draft)?)
    }

    /// Stamp the signer's side of the agreement with `at`. Re-signing simply
    /// refreshes the timestamp; the other side is never touched.
    pub fn sign(
        &self,
        id: &AgreementId,
        signer: &UserId,
        at: DateTime<Utc>,
    ) -> Result<Agreement, AgreementError> {
        Ok(self.store.sign_agreement(id, signer, at)?)
    }

    pub fn get(&self, id: &AgreementId) -> Result<Agreement, AgreementError> {
        self.store
            .fetch_agreement(id)?
            .ok_or(AgreementError::NotFound("agreement"))
    }

    pub fn list(&self, filter: &AgreementFilter) -> Result<Vec<Agreement>, AgreementError> {
        Ok(self.store.list_agreements(filter)?)
    }

    /// Unconditional administrative removal; the listing's agreement list is
    /// cleaned up by the store.
    pub fn delete(&self, id: &AgreementId) -> Result<(), AgreementError> {
        Ok(self.store.delete_agreement(id)?)
    }
}
