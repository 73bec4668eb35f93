//! Shared helper functions for CLI commands.

use std::path::{Path, PathBuf};

use console::style;

use rollsift::enrich::Dataset;
use rollsift::models::{Category, ScoredRecord};
use rollsift::output::{encode, write_records, Envelope, OutputFormat, Summary};

/// Load the enrichment dataset if one is configured.
pub async fn load_dataset(path: Option<PathBuf>) -> anyhow::Result<Option<Dataset>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let dataset = Dataset::load(&path).await?;
    eprintln!(
        "{} Loaded {} dataset entries from {}",
        style("→").cyan(),
        dataset.len(),
        path.display()
    );
    if dataset.skipped() > 0 {
        eprintln!(
            "  {} {} malformed entries skipped",
            style("!").yellow(),
            dataset.skipped()
        );
    }
    Ok(Some(dataset))
}

/// Write records to `output`, or print them as JSON when no file is given.
/// Status lines go to stderr so stdout stays parseable.
pub async fn emit_records(
    output: Option<&Path>,
    summary: Summary,
    records: Vec<ScoredRecord>,
) -> anyhow::Result<()> {
    let envelope = Envelope::new(summary, records);
    match output {
        Some(path) => {
            write_records(path, &envelope).await?;
            eprintln!(
                "{} Wrote {} records to {}",
                style("✓").green(),
                envelope.records.len(),
                path.display()
            );
        }
        None => print!("{}", encode(&envelope, OutputFormat::Json)?),
    }
    Ok(())
}

/// Print a run summary.
pub fn print_summary(summary: &Summary) {
    eprintln!("\n{}", style("Summary").bold());
    eprintln!("{}", "-".repeat(50));
    eprintln!("  {:<24} {}", "Records", summary.total);
    for category in Category::ALL {
        let count = summary.count(category);
        let label = match category {
            Category::Large => style(category.label()).green(),
            Category::Medium => style(category.label()).cyan(),
            Category::Small => style(category.label()).yellow(),
            Category::Offline => style(category.label()).dim(),
        };
        eprintln!("  {:<24} {}", label, count);
    }
    eprintln!(
        "  {:<24} {} matched, {} unmatched",
        "Enrichment", summary.matched, summary.unmatched
    );
    if let Some(avg) = summary.average_score_with_site {
        eprintln!(
            "  {:<24} {:.1} ({} records)",
            "Avg score (with site)", avg, summary.with_site
        );
    }
    if let Some(pages) = summary.pages {
        eprintln!(
            "  {:<24} {}/{} readable, {} with failures",
            "Pages", pages.readable_pages, pages.total_pages, pages.failed_pages
        );
    }

    if !summary.top.is_empty() {
        eprintln!("\n{}", style("Top records").bold());
        for (i, top) in summary.top.iter().enumerate() {
            eprintln!(
                "  {:>2}. {:<40} {:>3}  {}",
                i + 1,
                truncate(&top.name, 40),
                top.tech_score,
                top.site.as_deref().unwrap_or("-")
            );
        }
    }
}

/// Truncate a string to `max` characters, adding an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Ana Lima", 40), "Ana Lima");
        assert_eq!(truncate("João da Silva", 5), "João…");
    }
}
