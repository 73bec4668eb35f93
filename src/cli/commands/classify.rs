//! Classify command: debug the noise rules and assembler on single lines.

use std::sync::Arc;

use console::style;

use rollsift::classify::{LineClass, NoiseClassifier};
use rollsift::config::Config;
use rollsift::extraction::{Assembler, AssemblyMode};
use rollsift::models::SourceStrategy;

pub fn cmd_classify(config: &Config, lines: &[String]) -> anyhow::Result<()> {
    let classifier = Arc::new(NoiseClassifier::new(&config.noise)?);
    let assembler = Assembler::new(classifier.clone(), AssemblyMode::EmailAnchored);

    for line in lines {
        match classifier.classify(line) {
            LineClass::Noise(rule) => {
                println!("{} {:?}", style("✗").red(), line);
                println!("    noise: {}", style(rule).dim());
            }
            LineClass::Candidate => {
                println!("{} {:?}", style("✓").green(), line);
                let records = assembler.assemble(line, 1, SourceStrategy::DirectText);
                if records.is_empty() {
                    println!("    {}", style("no email; name-only line").dim());
                }
                for record in records {
                    println!("    name:  {}", record.name());
                    if let Some(email) = record.email() {
                        println!("    email: {}", email);
                    }
                    if let Some(site) = record.site() {
                        println!("    site:  {}", site);
                    }
                }
            }
        }
    }

    Ok(())
}
