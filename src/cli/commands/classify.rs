//! One-off classification of a local file.

use std::path::Path;

use console::style;

use crate::classify::build_classifier;
use crate::cli::icons::{dim_arrow, error, success};
use crate::config::Settings;
use crate::extraction::{TextExtraction, TextExtractor};

/// Extract and classify `file`, printing the label.
pub async fn cmd_classify(settings: &Settings, file: &Path) -> anyhow::Result<()> {
    let extractor = TextExtractor::new(settings.extraction.clone());
    let classifier = build_classifier(&settings.classifier)?;

    let text = match extractor.extract(file).await {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{} Could not read {}: {}", error(), file.display(), e);
            return Err(e.into());
        }
    };
    println!(
        "  {} Extracted {} characters",
        dim_arrow(),
        text.chars().count()
    );

    let label = classifier.classify(&text).await?;
    println!(
        "{} {} {}",
        success(),
        style(file.display()).bold(),
        style(&label).cyan()
    );
    println!("  {} Classifier: {}", dim_arrow(), classifier.name());

    Ok(())
}
