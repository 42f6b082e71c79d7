use clap::{Parser, Subcommand};
use lipid_core::constants::{DEFAULT_HISTORY_LIMIT, DEFAULT_USER_ID};
use lipid_core::{
    engine_from_config, ChatHistory, LipidEngine, NonEmptyText, ReferenceDataset, ServiceConfig,
};
use lipid_report::{detect_lipids, PdfTextExtractor, TextExtractor};
use serde_json::{json, Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "lipid")]
#[command(about = "Lipid report explainer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question about lipid values
    Ask {
        /// The question, e.g. "Is my LDL high?"
        question: String,
        /// A reading as CODE=VALUE (repeatable), e.g. --value LDL=145
        #[arg(long = "value", value_parser = parse_reading)]
        values: Vec<(String, String)>,
        /// Reference dataset CSV (defaults to LIPID_REFERENCE_CSV or the bundled path)
        #[arg(long)]
        reference: Option<PathBuf>,
    },
    /// Detect and interpret lipid values in a PDF report
    Extract {
        /// Path to the PDF
        pdf: PathBuf,
        /// Reference dataset CSV (defaults to LIPID_REFERENCE_CSV or the bundled path)
        #[arg(long)]
        reference: Option<PathBuf>,
    },
    /// Show stored chat exchanges
    History {
        /// Chat history database (defaults to CHAT_DB_PATH or the bundled path)
        #[arg(long)]
        db: Option<PathBuf>,
        /// User whose history to show
        #[arg(long, default_value = DEFAULT_USER_ID)]
        user_id: String,
        /// Number of exchanges
        #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
        limit: u32,
    },
}

/// Parses `CODE=VALUE`. The value is kept as text; the engine decides whether it is usable.
fn parse_reading(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((code, value)) if !code.trim().is_empty() && !value.trim().is_empty() => {
            Ok((code.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected CODE=VALUE, got '{arg}'")),
    }
}

fn readings_map(values: Vec<(String, String)>) -> Map<String, Value> {
    values
        .into_iter()
        .map(|(code, value)| (code, Value::String(value)))
        .collect()
}

fn build_engine(cfg: &ServiceConfig, reference: Option<PathBuf>) -> LipidEngine {
    let path = reference.unwrap_or_else(|| cfg.reference_csv().clone());
    let dataset = match ReferenceDataset::load(&path) {
        Ok(dataset) => dataset,
        Err(e) => {
            eprintln!("Warning: reference dataset unavailable ({e}); using thresholds only");
            ReferenceDataset::empty()
        }
    };
    engine_from_config(cfg, Arc::new(dataset))
}

fn extract(engine: &LipidEngine, pdf: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(pdf)?;
    let text = PdfTextExtractor.extract_text(&bytes)?;
    let detection = detect_lipids(&text);
    let result = engine.summarise(&detection.panel());

    let detected: Vec<Value> = detection
        .values
        .iter()
        .map(|d| {
            json!({
                "code": d.code,
                "value": d.value,
                "converted_from_mmol": d.converted_from_mmol,
                "line": d.line,
            })
        })
        .collect();

    Ok(json!({
        "detected": detected,
        "warnings": detection.warnings,
        "result": result,
    }))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let cfg = ServiceConfig::from_lookup(|key| std::env::var(key).ok())?;

    match cli.command {
        Some(Commands::Ask {
            question,
            values,
            reference,
        }) => {
            let engine = build_engine(&cfg, reference);
            let result = engine.interpret(&question, &readings_map(values));
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Some(Commands::Extract { pdf, reference }) => {
            let engine = build_engine(&cfg, reference);
            match extract(&engine, &pdf) {
                Ok(output) => println!("{}", serde_json::to_string_pretty(&output)?),
                Err(e) => eprintln!("Error reading {}: {}", pdf.display(), e),
            }
        }
        Some(Commands::History { db, user_id, limit }) => {
            let history = ChatHistory::open(db.unwrap_or_else(|| cfg.chat_db_path().clone()))?;
            let user_id = NonEmptyText::or_fallback(Some(user_id.as_str()), DEFAULT_USER_ID);
            let entries = history.recent(&user_id, limit)?;
            if entries.is_empty() {
                println!("No chat history for {}.", user_id);
            } else {
                for entry in entries {
                    println!(
                        "[{}] Q: {}\n    A: {} ({})",
                        entry.created_at.as_deref().unwrap_or("-"),
                        entry.question,
                        entry.answer,
                        entry.mode
                    );
                }
            }
        }
        None => {
            println!("Lipid report explainer. Run with --help for commands.");
        }
    }

    Ok(())
}
