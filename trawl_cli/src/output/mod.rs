use crate::cli::OutputFormat;
use crate::commands::Result;
use serde::{Deserialize, Serialize};
use trawl_core::{AggregationRun, Link, RunSummary, SearchSettings, SourceFailure, SourceInfo};

pub mod csv;

/// A link together with the scores computed for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkView {
    pub url: String,
    pub title: String,
    pub source: String,
    pub junk_score: usize,
    pub likely_profile: bool,
    pub reliable: bool,
    pub document: bool,
    pub filtered: bool,
}

impl LinkView {
    pub fn new(link: &Link, threshold: usize) -> Self {
        Self {
            url: link.url().to_string(),
            title: link.title().to_string(),
            source: link.source().to_string(),
            junk_score: link.junk_score(),
            likely_profile: link.is_likely_profile(),
            reliable: link.is_reliable(threshold),
            document: link.is_document(),
            filtered: link.is_filtered(),
        }
    }
}

/// Machine-readable form of one search run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchReport {
    pub username: String,
    pub threshold: usize,
    pub summary: RunSummary,
    pub reliable: Vec<LinkView>,
    pub documents: Vec<LinkView>,
    pub unique_links: Vec<LinkView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SourceFailure>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    pub from_cache: bool,
    pub duration_ms: u64,
}

impl SearchReport {
    pub fn from_run(run: &AggregationRun, threshold: usize) -> Self {
        let view = |l: &Link| LinkView::new(l, threshold);
        Self {
            username: run.username.clone(),
            threshold,
            summary: run.summary(threshold),
            reliable: run.reliable_links(threshold).into_iter().map(view).collect(),
            documents: run.documents().into_iter().map(view).collect(),
            unique_links: run.unique_links.iter().map(view).collect(),
            errors: run.errors.clone(),
            warnings: run.warnings.clone(),
            from_cache: run.from_cache,
            duration_ms: run.duration_ms,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OutputData {
    SearchReport(Box<SearchReport>),
    UrlList(Vec<String>),
    SourceList(Vec<SourceInfo>),
    Settings {
        path: String,
        exists: bool,
        settings: SearchSettings,
    },
}

/// Render non-pretty formats; pretty rendering lives with each command.
pub fn format_output(data: &OutputData, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(data)?);
        }
        OutputFormat::Text | OutputFormat::Pretty => {
            format_text_output(data)?;
        }
    }
    Ok(())
}

fn format_text_output(data: &OutputData) -> Result<()> {
    match data {
        OutputData::SearchReport(report) => {
            for link in &report.reliable {
                println!("{}\t{}\t{}", link.junk_score, link.url, link.title);
            }
            println!("{}", status_line(&report.summary));
            for err in &report.errors {
                println!("{}", problem_line(err));
            }
            for warning in &report.warnings {
                println!("Warning: {}", warning);
            }
        }
        OutputData::UrlList(urls) => {
            for url in urls {
                println!("{}", url);
            }
        }
        OutputData::SourceList(sources) => {
            for source in sources {
                println!("{}: {}", source.name, source.description);
            }
        }
        OutputData::Settings { path, settings, .. } => {
            println!("# {}", path);
            print!("{}", serde_yaml::to_string(settings)?);
        }
    }
    Ok(())
}

/// `Links: total collected N / unique with username in URL M / reliable R / documents D`
pub fn status_line(summary: &RunSummary) -> String {
    format!(
        "Links: total collected {} / unique with username in URL {} / reliable {} / documents {}",
        summary.total, summary.unique, summary.reliable, summary.documents
    )
}

pub fn problem_line(failure: &SourceFailure) -> String {
    format!("Problem with source \"{}\": {}", failure.source, failure.error)
}
