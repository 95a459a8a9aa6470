use std::path::PathBuf;

use cardlist_scraping::language::{detect_dominant, detect_from_code};
use clap::Parser;
use itertools::Itertools;

#[derive(Parser)]
struct Opts {
    codes: Vec<String>,
    /// Reads additional codes from this file, one per line.
    #[arg(long)]
    file: Option<PathBuf>,
    /// Prints the verdict for every code as well.
    #[arg(long)]
    each: bool,
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let opts = Opts::parse();

    let mut codes = opts.codes;
    if let Some(path) = &opts.file {
        let content = fs_err::read_to_string(path)?;
        codes.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_owned),
        );
    }

    if opts.each {
        for code in &codes {
            match detect_from_code(code) {
                Some(language) => println!("{code}\t{language}\t{}", language.label()),
                None => println!("{code}\t-"),
            }
        }
    }

    let result = detect_dominant(&codes);
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        match result.code() {
            Some(language) => println!(
                "{} ({}): {}% of {} matched codes, {} codes in total",
                language,
                language.label(),
                result.confidence_percent(),
                result.matches(),
                result.total(),
            ),
            None => println!(
                "No language found in {} codes: {}",
                result.total(),
                codes.iter().take(5).join(", ")
            ),
        }
    }
    Ok(())
}
