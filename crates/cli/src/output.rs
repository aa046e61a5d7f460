// Table and JSON rendering for CLI results

use anyhow::Result;
use colored::Colorize;
use gpoctl_core::application::{RetrievalError, RetrievalOutcome};
use gpoctl_core::domain::{PolicyRecord, PolicyRecordView, PolicyReport};
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Tabled)]
struct PolicyRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Owner")]
    owner: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "Links")]
    links: usize,
}

impl From<&PolicyRecord> for PolicyRow {
    fn from(record: &PolicyRecord) -> Self {
        Self {
            name: record.display_name.clone(),
            id: record.id.to_string(),
            domain: record.domain.clone(),
            status: if record.is_enabled { "Enabled" } else { "Disabled" }.to_string(),
            owner: record.owner.clone(),
            modified: record.modified.format("%Y-%m-%d %H:%M").to_string(),
            links: record.link_count(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorEntry<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    selector: Option<&'a str>,
    message: String,
}

impl<'a> From<&'a RetrievalError> for ErrorEntry<'a> {
    fn from(error: &'a RetrievalError) -> Self {
        Self {
            selector: error.selector(),
            message: error.to_string(),
        }
    }
}

#[derive(Serialize)]
struct RetrievalDocument<'a> {
    records: Vec<PolicyRecordView>,
    errors: Vec<ErrorEntry<'a>>,
}

#[derive(Serialize)]
struct ReportDocument<'a> {
    report: &'a PolicyReport,
    errors: Vec<ErrorEntry<'a>>,
}

pub fn print_outcome(outcome: &RetrievalOutcome, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let document = RetrievalDocument {
                records: outcome.records.iter().map(PolicyRecord::to_structured).collect(),
                errors: outcome.errors.iter().map(ErrorEntry::from).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        OutputFormat::Table => {
            if outcome.records.is_empty() {
                println!("{}", "No GPOs found".yellow());
            } else {
                let rows: Vec<PolicyRow> = outcome.records.iter().map(PolicyRow::from).collect();
                println!("{}", Table::new(rows));
            }
            print_errors(&outcome.errors);
        }
    }
    Ok(())
}

pub fn print_report(
    report: &PolicyReport,
    errors: &[RetrievalError],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let document = ReportDocument {
                report,
                errors: errors.iter().map(ErrorEntry::from).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&document)?);
        }
        OutputFormat::Table => {
            println!("{}", "GPO Report".cyan().bold());
            println!();
            println!("  {} {}", "Total:".bold(), report.total);
            println!("  {} {}", "Enabled:".bold(), report.enabled.to_string().green());
            println!("  {} {}", "Disabled:".bold(), report.disabled.to_string().red());
            println!("  {} {}", "Linked:".bold(), report.linked);
            println!("  {} {}", "Unlinked:".bold(), report.unlinked);
            println!("  {} {}", "OU links:".bold(), report.total_links);

            if !report.by_domain.is_empty() {
                println!();
                println!("  {}", "By domain:".bold());
                for (domain, count) in &report.by_domain {
                    let domain = if domain.is_empty() { "(none)" } else { domain };
                    println!("    {} {}", domain, count);
                }
            }
            print_errors(errors);
        }
    }
    Ok(())
}

fn print_errors(errors: &[RetrievalError]) {
    if errors.is_empty() {
        return;
    }
    eprintln!();
    for error in errors {
        eprintln!("{} {}", "✗".red().bold(), error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gpoctl_core::domain::PolicyRecord;

    #[test]
    fn test_row_from_record() {
        let mut record = PolicyRecord::with_identity("Baseline", uuid::Uuid::from_u128(7));
        record.link_to("OU=Servers,DC=corp,DC=local").unwrap();
        record.is_enabled = false;

        let row = PolicyRow::from(&record);
        assert_eq!(row.name, "Baseline");
        assert_eq!(row.status, "Disabled");
        assert_eq!(row.links, 1);
        assert_eq!(row.modified, "0001-01-01 00:00");
    }

    #[test]
    fn test_error_entry_carries_selector() {
        let error = RetrievalError::IdentityNotFound {
            selector: "NoSuchGPO".to_string(),
        };
        let json = serde_json::to_value(ErrorEntry::from(&error)).unwrap();
        assert_eq!(json["selector"], "NoSuchGPO");
        assert_eq!(json["message"], "GPO not found: NoSuchGPO");

        let error = RetrievalError::RecordConstruction {
            message: "missing id".to_string(),
        };
        let json = serde_json::to_value(ErrorEntry::from(&error)).unwrap();
        assert!(json.get("selector").is_none());
    }
}
