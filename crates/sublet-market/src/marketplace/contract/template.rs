use async_trait::async_trait;

use super::fields::{ContractFields, FieldValue};

/// Default agreement template shipped with the service; deployments point
/// `CONTRACT_TEMPLATE` at their own letterhead instead.
pub const DEFAULT_TEMPLATE: &str = "\
SUBLEASE AGREEMENT

This sublease agreement, dated {DATE}, is made between {OWNER_NAME}
(the sublessor) and {TENANT_NAME} (the subtenant) for the premises at
{ADDRESS}.

Term: {START_DATE} through {END_DATE}.
Rent: ${RENT} per pay period.
Security deposit: ${DEPOSIT}.

Sublessor signature: {OWNER_SIGNATURE}    Date: {OWNER_SIGN_DATE}
Subtenant signature: {TENANT_SIGNATURE}    Date: {TENANT_SIGN_DATE}
";

#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("contract template is not valid UTF-8 text")]
    NotText,
}

/// Template-filling collaborator. Pending fields must survive as `{TAG}`
/// tokens so the same document can be re-rendered after a signature lands.
pub trait ContractTemplater: Send + Sync {
    fn fill(&self, template: &[u8], fields: &ContractFields) -> Result<Vec<u8>, TemplateError>;
}

/// Substitutes `{TAG}` tokens in a text template. Only resolved fields are
/// substituted; everything else is left untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenTemplater;

impl ContractTemplater for TokenTemplater {
    fn fill(&self, template: &[u8], fields: &ContractFields) -> Result<Vec<u8>, TemplateError> {
        let mut text =
            String::from_utf8(template.to_vec()).map_err(|_| TemplateError::NotText)?;
        for (tag, value) in fields.iter() {
            if let FieldValue::Resolved(resolved) = value {
                text = text.replace(&format!("{{{tag}}}"), resolved);
            }
        }
        Ok(text.into_bytes())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("document conversion failed: {0}")]
    Failed(String),
    #[error("document conversion did not finish in time")]
    TimedOut,
}

/// Conversion collaborator turning a filled document into its distributable
/// form. Conversions may take seconds and must report completion or failure
/// explicitly.
#[async_trait]
pub trait DocumentConverter: Send + Sync {
    async fn convert(&self, document: &[u8]) -> Result<Vec<u8>, ConvertError>;
    /// Content type of the converted output.
    fn output_content_type(&self) -> &'static str;
}

/// Pass-through converter for deployments without an external conversion
/// tool; the filled text itself is served.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityConverter;

#[async_trait]
impl DocumentConverter for IdentityConverter {
    async fn convert(&self, document: &[u8]) -> Result<Vec<u8>, ConvertError> {
        Ok(document.to_vec())
    }

    fn output_content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }
}
