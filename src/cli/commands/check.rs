//! Check command: external tool availability and effective config.

use console::style;

use rollsift::config::Config;
use rollsift::document::check_tools;
use rollsift::ocr::{OcrBackend, TesseractBackend};

pub async fn cmd_check(config: &Config) -> anyhow::Result<()> {
    println!("\n{}", style("Tool Status").bold());
    println!("{}", "-".repeat(50));

    let tools = check_tools();
    let mut all_found = true;
    for (tool, available) in &tools {
        let status = if *available {
            style("✓ found").green()
        } else {
            all_found = false;
            style("✗ not found").red()
        };
        println!("  {:<15} {}", tool, status);
    }

    let tesseract = TesseractBackend::new();
    if !tesseract.is_available() {
        println!("                  {}", style(tesseract.availability_hint()).dim());
    }

    println!("\n{}", style("Configuration").bold());
    println!("{}", "-".repeat(50));
    match &config.source_path {
        Some(path) => println!("  {:<15} {}", "Config", path.display()),
        None => println!("  {:<15} {}", "Config", style("defaults").dim()),
    }
    let strategies: Vec<_> = config
        .extraction
        .strategies
        .iter()
        .map(|s| s.as_str())
        .collect();
    println!("  {:<15} {}", "Strategies", strategies.join(", "));
    println!("  {:<15} {}", "Workers", config.workers);
    println!(
        "  {:<15} {}",
        "OCR language",
        config.extraction.language.as_deref().unwrap_or("(none)")
    );
    match config.dataset_path() {
        Some(path) if path.exists() => {
            println!("  {:<15} {}", "Dataset", path.display())
        }
        Some(path) => println!(
            "  {:<15} {} {}",
            "Dataset",
            path.display(),
            style("(missing)").red()
        ),
        None => println!("  {:<15} {}", "Dataset", style("none").dim()),
    }

    println!();
    if all_found {
        println!("{} All tools available", style("✓").green());
    } else {
        println!(
            "{} Some tools are missing; text-layer strategies need poppler-utils, OCR strategies need tesseract",
            style("!").yellow()
        );
    }

    Ok(())
}
