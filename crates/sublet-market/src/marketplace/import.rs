//! CSV seed import for demo and staging data sets.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};

use super::domain::DateRange;

/// One importable listing row together with the owner it belongs to; owners
/// are matched up by email and created on first sight by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedListing {
    pub owner_name: String,
    pub owner_email: String,
    pub title: String,
    pub address: String,
    pub rent: u32,
    pub security_deposit: Option<u32>,
    pub window: DateRange,
    pub capacity: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum SeedImportError {
    #[error("failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid seed CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("seed row {row}: {message}")]
    Invalid { row: usize, message: String },
}

pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<SeedListing>, SeedImportError> {
    let file = std::fs::File::open(path)?;
    parse_listings(file)
}

pub fn parse_listings<R: Read>(reader: R) -> Result<Vec<SeedListing>, SeedImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut listings = Vec::new();

    for (index, record) in csv_reader.deserialize::<SeedRow>().enumerate() {
        let row = record?;
        let row_number = index + 1;
        let window = DateRange::new(
            parse_date(&row.start_date, row_number)?,
            parse_date(&row.end_date, row_number)?,
        );
        if !window.is_chronological() {
            return Err(SeedImportError::Invalid {
                row: row_number,
                message: "End Date must come after Start Date".to_string(),
            });
        }
        if row.capacity == 0 {
            return Err(SeedImportError::Invalid {
                row: row_number,
                message: "Capacity must be at least 1".to_string(),
            });
        }
        listings.push(SeedListing {
            owner_name: row.owner_name,
            owner_email: row.owner_email,
            title: row.title,
            address: row.address,
            rent: row.rent,
            security_deposit: row.security_deposit,
            window,
            capacity: row.capacity,
        });
    }

    Ok(listings)
}

#[derive(Debug, Deserialize)]
struct SeedRow {
    #[serde(rename = "Owner Name")]
    owner_name: String,
    #[serde(rename = "Owner Email")]
    owner_email: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Rent")]
    rent: u32,
    #[serde(
        rename = "Security Deposit",
        default,
        deserialize_with = "empty_field_as_none"
    )]
    security_deposit: Option<u32>,
    #[serde(rename = "Start Date")]
    start_date: String,
    #[serde(rename = "End Date")]
    end_date: String,
    #[serde(rename = "Capacity")]
    capacity: u32,
}

fn parse_date(raw: &str, row: usize) -> Result<NaiveDate, SeedImportError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| SeedImportError::Invalid {
        row,
        message: format!("'{raw}' is not a YYYY-MM-DD date"),
    })
}

fn empty_field_as_none<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
