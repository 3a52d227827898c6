// Read endpoint and admin operation exposed to directory front-ends

use crate::directory::CompanyDirectory;
use crate::model::{CacheClearReport, ScoredPage};
use crate::service::PageService;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Response document of the relevant-pages endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagesResponse {
    pub company_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub pages: Vec<ScoredPage>,
    pub total_found: usize,
    pub subdomains_checked: usize,
    pub from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Default to 10 and clamp into 1..=100
pub fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

pub async fn relevant_pages_for_company(
    service: &PageService,
    directory: &dyn CompanyDirectory,
    company_id: &str,
    limit: Option<usize>,
) -> PagesResponse {
    let Some(company) = directory.find(company_id) else {
        return PagesResponse {
            company_id: company_id.to_string(),
            company_name: None,
            website: None,
            pages: Vec::new(),
            total_found: 0,
            subdomains_checked: 0,
            from_cache: false,
            error: Some(format!("Company not found: {}", company_id)),
        };
    };

    info!("Resolving relevant pages for company {} ({})", company.id, company.name);
    let result = service
        .get_relevant_pages(company.website.as_deref(), &company.name, clamp_limit(limit))
        .await;

    PagesResponse {
        company_id: company.id,
        company_name: Some(company.name),
        website: company.website,
        pages: result.pages,
        total_found: result.total_found,
        subdomains_checked: result.subdomains_checked,
        from_cache: result.from_cache,
        error: result.error,
    }
}

pub fn clear_cache(service: &PageService) -> CacheClearReport {
    service.clear_cache()
}
