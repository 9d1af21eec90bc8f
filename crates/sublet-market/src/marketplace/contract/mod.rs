//! Contract generation: deterministic field resolution plus the templating
//! and conversion collaborator seams.

pub mod fields;
mod service;
pub mod template;

pub use fields::{contract_fields, format_contract_date, ContractFields, FieldValue};
pub use service::{ContractError, ContractService};
pub use template::{
    ContractTemplater, ConvertError, DocumentConverter, IdentityConverter, TemplateError,
    TokenTemplater, DEFAULT_TEMPLATE,
};
