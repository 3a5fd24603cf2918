//! External tool availability check.

use console::style;

use crate::cli::icons::{error, success};
use crate::extraction::TextExtractor;

pub fn cmd_tools() -> anyhow::Result<()> {
    println!("{}", style("Extraction tools").bold());

    let tools = TextExtractor::check_tools();
    for (tool, available) in &tools {
        if *available {
            println!("  {} {}", success(), tool);
        } else {
            println!("  {} {} {}", error(), tool, style("(not found)").dim());
        }
    }

    if tools.iter().any(|(_, available)| !available) {
        println!();
        println!(
            "{}",
            style("Missing tools limit which formats can be extracted:").dim()
        );
        println!("  pdftotext, pdftoppm: poppler-utils");
        println!("  tesseract: tesseract-ocr");
        println!("  antiword / catdoc: legacy .doc files");
    }

    Ok(())
}
