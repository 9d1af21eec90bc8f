use std::sync::Arc;

use chrono::NaiveDate;

use super::fields::{contract_fields, ContractFields};
use super::template::{ContractTemplater, ConvertError, DocumentConverter, TemplateError};
use crate::marketplace::domain::AgreementId;
use crate::marketplace::store::{MarketStore, StoreError};

/// Error enumeration for contract generation.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error(transparent)]
    Convert(#[from] ConvertError),
    #[error("storage failure: {0}")]
    Store(StoreError),
}

impl From<StoreError> for ContractError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(entity) => Self::NotFound(entity),
            other => Self::Store(other),
        }
    }
}

/// Builds the field map for an agreement and hands it to the templating and
/// conversion collaborators. Field resolution is the hard contract here; the
/// collaborators own presentation.
pub struct ContractService<S> {
    store: Arc<S>,
    templater: Arc<dyn ContractTemplater>,
    converter: Arc<dyn DocumentConverter>,
    template: Vec<u8>,
}

impl<S> Clone for ContractService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            templater: self.templater.clone(),
            converter: self.converter.clone(),
            template: self.template.clone(),
        }
    }
}

impl<S: MarketStore> ContractService<S> {
    pub fn new(
        store: Arc<S>,
        templater: Arc<dyn ContractTemplater>,
        converter: Arc<dyn DocumentConverter>,
        template: Vec<u8>,
    ) -> Self {
        Self {
            store,
            templater,
            converter,
            template,
        }
    }

    /// Resolve the field map for one agreement at the given render date.
    pub fn fields_for(
        &self,
        id: &AgreementId,
        today: NaiveDate,
    ) -> Result<ContractFields, ContractError> {
        let agreement = self
            .store
            .fetch_agreement(id)?
            .ok_or(ContractError::NotFound("agreement"))?;
        let listing = self
            .store
            .fetch_listing(&agreement.listing)?
            .ok_or(ContractError::NotFound("listing"))?;
        let owner = self
            .store
            .fetch_user(&agreement.owner)?
            .ok_or(ContractError::NotFound("user"))?;
        let tenant = self
            .store
            .fetch_user(&agreement.tenant)?
            .ok_or(ContractError::NotFound("user"))?;
        Ok(contract_fields(&agreement, &listing, &owner, &tenant, today))
    }

    /// Fill the template and convert it to the distributable format.
    pub async fn render(
        &self,
        id: &AgreementId,
        today: NaiveDate,
    ) -> Result<Vec<u8>, ContractError> {
        let fields = self.fields_for(id, today)?;
        let filled = self.templater.fill(&self.template, &fields)?;
        Ok(self.converter.convert(&filled).await?)
    }

    pub fn output_content_type(&self) -> &'static str {
        self.converter.output_content_type()
    }
}
