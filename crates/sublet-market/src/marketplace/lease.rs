use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Whether an uploaded master lease permits subleasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubleaseAllowance {
    Allowed,
    Conditional,
    Prohibited,
    NotMentioned,
}

/// Analyzer outcome: an allowance plus the supporting rationale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseVerdict {
    pub allowed: SubleaseAllowance,
    pub reason: String,
}

impl LeaseVerdict {
    fn prohibited(reason: &str) -> Self {
        Self {
            allowed: SubleaseAllowance::Prohibited,
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AnalyzerError {
    #[error("lease analyzer unavailable: {0}")]
    Unavailable(String),
    #[error("lease analyzer returned an unusable response")]
    BadResponse,
}

/// Document-analysis collaborator deciding whether the lease text permits
/// subleasing.
#[async_trait]
pub trait LeaseAnalyzer: Send + Sync {
    async fn analyze(&self, document: &[u8]) -> Result<LeaseVerdict, AnalyzerError>;
}

/// Analyzer for deployments without an analysis backend; every call reports
/// unavailable and the caller degrades.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineAnalyzer;

#[async_trait]
impl LeaseAnalyzer for OfflineAnalyzer {
    async fn analyze(&self, _document: &[u8]) -> Result<LeaseVerdict, AnalyzerError> {
        Err(AnalyzerError::Unavailable(
            "no analyzer configured".to_string(),
        ))
    }
}

/// Anything smaller cannot be a real lease document.
pub const MIN_LEASE_BYTES: usize = 500;

fn looks_like_pdf(document: &[u8]) -> bool {
    document.starts_with(b"%PDF")
}

/// Check an uploaded lease for subleasability. Structural prechecks run
/// locally; analyzer failures degrade to a prohibited verdict with a
/// human-readable reason rather than an error.
pub async fn check_sublease_terms(analyzer: &dyn LeaseAnalyzer, document: &[u8]) -> LeaseVerdict {
    if document.len() < MIN_LEASE_BYTES {
        return LeaseVerdict::prohibited(
            "The provided file is too small to be a real lease document.",
        );
    }
    if !looks_like_pdf(document) {
        return LeaseVerdict::prohibited("This file is not a valid PDF.");
    }
    match analyzer.analyze(document).await {
        Ok(verdict) => verdict,
        Err(_) => LeaseVerdict::prohibited("Lease analysis failed. Try again later."),
    }
}
