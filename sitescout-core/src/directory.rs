use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("Failed to read company directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse company directory: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
}

// Directory exports carry numeric ids as often as string ones
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}

/// Lookup of companies by id
pub trait CompanyDirectory: Send + Sync {
    fn find(&self, id: &str) -> Option<CompanyRecord>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Directory backed by a JSON array of `{id, name, website}` records
#[derive(Debug, Default)]
pub struct JsonDirectory {
    companies: HashMap<String, CompanyRecord>,
}

impl JsonDirectory {
    pub fn from_records(records: Vec<CompanyRecord>) -> Self {
        let companies = records
            .into_iter()
            .map(|record| (record.id.trim().to_string(), record))
            .collect();
        Self { companies }
    }

    pub fn from_json_str(json: &str) -> Result<Self, DirectoryError> {
        let records: Vec<CompanyRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let content = fs::read_to_string(path)?;
        let directory = Self::from_json_str(&content)?;
        debug!("Loaded {} companies from {}", directory.len(), path.display());
        Ok(directory)
    }
}

impl CompanyDirectory for JsonDirectory {
    fn find(&self, id: &str) -> Option<CompanyRecord> {
        self.companies.get(id.trim()).cloned()
    }

    fn len(&self) -> usize {
        self.companies.len()
    }
}
