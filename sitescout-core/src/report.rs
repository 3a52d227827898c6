// Report generation for relevant-page results

use crate::model::{Category, RelevantPages, ScoredPage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
            ReportFormat::Markdown => "md",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub company_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub result: RelevantPages,
}

impl ReportData {
    pub fn new(company_name: &str, website: Option<&str>, result: RelevantPages) -> Self {
        Self {
            company_name: company_name.to_string(),
            website: website.map(|w| w.to_string()),
            generated_at: Utc::now(),
            result,
        }
    }

    /// Number of returned pages per category, in category order
    pub fn category_counts(&self) -> BTreeMap<Category, usize> {
        let mut counts = BTreeMap::new();
        for page in &self.result.pages {
            *counts.entry(page.category).or_insert(0) += 1;
        }
        counts
    }

    fn source_to_string(&self) -> &str {
        if self.result.from_cache { "Cache" } else { "Live discovery" }
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    // Header
    report.push_str(RULE);
    report.push('\n');
    report.push_str("                        SITESCOUT RELEVANT PAGES REPORT\n");
    report.push_str(RULE);
    report.push_str("\n\n");

    report.push_str(&format!("Company:      {}\n", data.company_name));
    report.push_str(&format!(
        "Website:      {}\n",
        data.website.as_deref().unwrap_or("(none)")
    ));
    report.push_str(&format!(
        "Generated:    {}\n",
        data.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("Source:       {}\n", data.source_to_string()));
    report.push_str(&format!("Sitemaps:     {}\n", data.result.sitemaps_found));
    report.push_str(&format!("Subdomains:   {} checked\n", data.result.subdomains_checked));
    report.push_str(&format!(
        "Pages Found:  {} (showing {})\n",
        data.result.total_found,
        data.result.pages.len()
    ));

    if let Some(ref error) = data.result.error {
        report.push_str(&format!("Error:        {}\n", error));
    }
    report.push('\n');

    if !data.result.pages.is_empty() {
        report.push_str(RULE);
        report.push('\n');
        report.push_str("SUMMARY\n");
        report.push_str(RULE);
        report.push_str("\n\n");

        for (category, count) in data.category_counts() {
            report.push_str(&format!("  {:<14} {}\n", category.label(), count));
        }
        report.push('\n');

        report.push_str(RULE);
        report.push('\n');
        report.push_str("RANKED PAGES\n");
        report.push_str(RULE);
        report.push_str("\n\n");
        report.push_str(&generate_page_list(&data.result.pages));
        report.push('\n');
    }

    // Footer
    report.push_str(RULE);
    report.push('\n');
    report.push_str("                          End of Report\n");
    report.push_str(RULE);
    report.push('\n');
    report.push_str("\nGenerated by SiteScout - sitemap discovery and page ranking\n\n");

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "SiteScout",
                "version": env!("CARGO_PKG_VERSION"),
                "generatedAt": data.generated_at.to_rfc3339(),
                "format": "json"
            },
            "company": {
                "name": data.company_name,
                "website": data.website,
            },
            "summary": {
                "totalFound": data.result.total_found,
                "returned": data.result.pages.len(),
                "sitemapsFound": data.result.sitemaps_found,
                "subdomainsChecked": data.result.subdomains_checked,
                "fromCache": data.result.from_cache,
                "categories": data.category_counts()
                    .into_iter()
                    .map(|(category, count)| (category.as_str().to_string(), count))
                    .collect::<BTreeMap<_, _>>(),
            },
            "error": data.result.error,
            "pages": data.result.pages,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_csv_report(data: &ReportData) -> String {
    let mut csv = String::from(
        "rank,url,title,category,relevance_score,last_modified,change_frequency,declared_priority\n",
    );

    for (idx, page) in data.result.pages.iter().enumerate() {
        let row = [
            (idx + 1).to_string(),
            page.page.url.clone(),
            page.page.title.clone().unwrap_or_default(),
            page.category.as_str().to_string(),
            page.relevance_score.to_string(),
            page.page
                .last_modified
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            page.page
                .change_frequency
                .map(|f| f.as_str().to_string())
                .unwrap_or_default(),
            page.page
                .declared_priority
                .map(|p| p.to_string())
                .unwrap_or_default(),
        ];
        let escaped: Vec<String> = row.iter().map(|field| escape_csv(field)).collect();
        csv.push_str(&escaped.join(","));
        csv.push('\n');
    }

    csv
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Relevant pages: {}\n\n", data.company_name));
    if let Some(ref website) = data.website {
        md.push_str(&format!("- **Website:** {}\n", website));
    }
    md.push_str(&format!(
        "- **Generated:** {}\n",
        data.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    md.push_str(&format!("- **Source:** {}\n", data.source_to_string()));
    md.push_str(&format!(
        "- **Pages found:** {} (showing {})\n",
        data.result.total_found,
        data.result.pages.len()
    ));
    md.push_str(&format!("- **Sitemaps:** {}\n", data.result.sitemaps_found));
    md.push_str(&format!(
        "- **Subdomains checked:** {}\n",
        data.result.subdomains_checked
    ));

    if let Some(ref error) = data.result.error {
        md.push_str(&format!("\n> **Error:** {}\n", error));
    }

    if !data.result.pages.is_empty() {
        md.push_str("\n| # | Score | Category | Title | URL |\n");
        md.push_str("|---|------:|----------|-------|-----|\n");
        for (idx, page) in data.result.pages.iter().enumerate() {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                idx + 1,
                page.relevance_score,
                page.category.label(),
                escape_markdown(page.title().unwrap_or("")),
                page.url()
            ));
        }
    }

    md
}

pub fn generate_report(data: &ReportData, format: ReportFormat) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => generate_json_report(data),
        ReportFormat::Csv => Ok(generate_csv_report(data)),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|")
}

fn generate_page_list(pages: &[ScoredPage]) -> String {
    let mut result = String::new();

    for (i, page) in pages.iter().enumerate() {
        let is_last = i == pages.len() - 1;
        let prefix = if is_last { "└── " } else { "├── " };

        let display_url = url::Url::parse(page.url())
            .ok()
            .and_then(|u| u.host_str().map(|host| format!("{}{}", host, u.path())))
            .unwrap_or_else(|| page.url().to_string());

        result.push_str(&format!(
            "{}[{:>3}] {:<12} {}\n",
            prefix,
            page.relevance_score,
            page.category.label(),
            display_url
        ));

        if let Some(title) = page.title() {
            let continuation = if is_last { "    " } else { "│   " };
            result.push_str(&format!("{}      {}\n", continuation, title));
        }
    }

    result
}
