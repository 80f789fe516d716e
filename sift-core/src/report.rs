// Report generation from ranked results

use crate::model::RankedResult;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(format!("Unknown report format '{}'", other)),
        }
    }
}

pub fn generate_report(
    format: ReportFormat,
    keyword: &str,
    results: &[RankedResult],
) -> Result<String, serde_json::Error> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(keyword, results)),
        ReportFormat::Json => generate_json_report(keyword, results),
        ReportFormat::Csv => Ok(generate_csv_report(results)),
        ReportFormat::Markdown => Ok(generate_markdown_report(keyword, results)),
    }
}

pub fn generate_text_report(keyword: &str, results: &[RankedResult]) -> String {
    let rule = "━".repeat(72);
    let mut report = String::new();
    report.push_str(&format!("{}\n\n", rule.bright_blue()));
    report.push_str(&format!(
        "{} {}\n",
        "Results for".bold(),
        keyword.bright_white().bold()
    ));
    report.push_str(&format!("  Ranked pages: {}\n\n", results.len()));
    report.push_str(&format!("{}\n\n", rule.bright_blue()));

    if results.is_empty() {
        report.push_str("  No relevant pages found.\n");
        return report;
    }

    for (idx, result) in results.iter().enumerate() {
        report.push_str(&format!(
            "{:>3}. {} {}\n",
            idx + 1,
            format!("[{}]", result.score).green().bold(),
            result.title.bright_white()
        ));
        report.push_str(&format!("     {}\n", result.url.cyan()));
        report.push_str(&format!(
            "     {}\n\n",
            format!(
                "AI keywords: {}  |  '{}' hits: {}",
                result.ai_keyword_count, keyword, result.user_keyword_count
            )
            .bright_black()
        ));
    }

    report
}

pub fn generate_json_report(
    keyword: &str,
    results: &[RankedResult],
) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "Sift",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "format": "json"
            },
            "keyword": keyword,
            "total_results": results.len(),
            "results": results
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_csv_report(results: &[RankedResult]) -> String {
    let mut report = String::from("rank,url,title,ai_keyword_count,user_keyword_count,score\n");
    for (idx, result) in results.iter().enumerate() {
        report.push_str(&format!(
            "{},{},{},{},{},{}\n",
            idx + 1,
            csv_field(&result.url),
            csv_field(&result.title),
            result.ai_keyword_count,
            result.user_keyword_count,
            result.score
        ));
    }
    report
}

pub fn generate_markdown_report(keyword: &str, results: &[RankedResult]) -> String {
    let mut report = format!("# Results for \"{}\"\n\n", keyword);
    report.push_str(&format!("{} ranked pages\n\n", results.len()));
    report.push_str("| # | Title | Score | AI keywords | Keyword hits |\n");
    report.push_str("|---|-------|-------|-------------|--------------|\n");
    for (idx, result) in results.iter().enumerate() {
        report.push_str(&format!(
            "| {} | [{}]({}) | {} | {} | {} |\n",
            idx + 1,
            result.title.replace('|', "\\|").replace(']', "\\]"),
            result.url,
            result.score,
            result.ai_keyword_count,
            result.user_keyword_count
        ));
    }
    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
