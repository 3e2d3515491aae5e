use anyhow::{Context, Result};
use resume_search::config::Config;
use resume_search::record::{JsonRecordSource, RecordSource};
use resume_search::search::{NormalizedText, Normalizer};
use std::io::Read;
use std::path::PathBuf;

fn print_normalized(label: &str, normalized: &NormalizedText) {
    println!("== {label}");
    println!("tokens   ({}): {}", normalized.tokens().len(), normalized.as_text());
    let variants: Vec<&str> = normalized.variants().iter().map(String::as_str).collect();
    println!("variants ({}): {}", variants.len(), variants.join(" "));
    println!();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        eprintln!("Usage: {} [--records <file>] [text...]", args[0]);
        eprintln!("Prints the normalized tokens and variants of each record, of the");
        eprintln!("given text, or of stdin when neither is provided.");
        eprintln!("Example: {} \"Experienced with HuggingFace and .NET\"", args[0]);
        return Ok(());
    }

    let normalizer = Normalizer::default();

    if args.len() >= 3 && args[1] == "--records" {
        let path = PathBuf::from(&args[2]);
        let source = JsonRecordSource::with_config(&path, Config::default());
        let records = source.fetch_all().await?;

        println!("Records: {} ({})", records.len(), path.display());
        println!();
        for record in &records {
            print_normalized(&record.id, &normalizer.normalize(record.text()));
        }
        return Ok(());
    }

    let text = if args.len() > 1 {
        args[1..].join(" ")
    } else {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        buffer
    };

    print_normalized("input", &normalizer.normalize(&text));
    Ok(())
}
