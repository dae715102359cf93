#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for identity form transcription.
//!
//! Run with a subcommand for scripted use, or without one for an
//! interactive session that lets the operator review and correct the
//! extracted fields before the template is filled.
//!
//! Uses `indicatif-log-bridge` (via [`formfill_cli_utils::init_logger`])
//! so that log lines and progress bars never fight for the terminal.

mod display;
mod interactive;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use formfill_cli_utils::IndicatifProgress;
use formfill_parser::{DataParser, PatternTable};
use formfill_record_models::ParsedRecord;
use formfill_transcribe::{TranscribeConfig, Transcriber};

#[derive(Parser)]
#[command(name = "formfill", about = "Transcribe OCR'd KYC forms into a fillable PDF")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract form fields from an OCR'd PDF or text file
    Extract {
        /// Input PDF (with a text layer) or plain text file
        input: PathBuf,
        /// Print the record and summary as JSON
        #[arg(long)]
        json: bool,
        /// Pattern table (TOML) overlaid on the built-in patterns
        #[arg(long)]
        patterns: Option<PathBuf>,
    },
    /// List the fillable fields of a template as JSON
    Fields {
        template: PathBuf,
        /// Write the listing here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Extract an input and fill the template with it
    Fill {
        /// Input PDF (with a text layer) or plain text file
        #[arg(required_unless_present = "data")]
        input: Option<PathBuf>,
        /// Where to write the filled PDF
        #[arg(long)]
        output: PathBuf,
        /// Template PDF (defaults to `FORMFILL_TEMPLATE` or ./EditablePdf.pdf)
        #[arg(long)]
        template: Option<PathBuf>,
        /// Fill from this JSON record instead of extracting `input`
        #[arg(long)]
        data: Option<PathBuf>,
        /// Field mapping (TOML) replacing the built-in one
        #[arg(long)]
        mapping: Option<PathBuf>,
        /// Pattern table (TOML) overlaid on the built-in patterns
        #[arg(long)]
        patterns: Option<PathBuf>,
    },
    /// Transcribe many inputs into a directory
    Batch {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        #[arg(long)]
        template: Option<PathBuf>,
        #[arg(long)]
        mapping: Option<PathBuf>,
    },
    /// Show which PDF field each extracted field is written to
    Mapping {
        /// Field mapping (TOML) to show instead of the built-in one
        #[arg(long)]
        mapping: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

fn config(template: Option<PathBuf>, mapping: Option<PathBuf>) -> TranscribeConfig {
    let config = TranscribeConfig::from_env().with_mapping(mapping);
    match template {
        Some(template) => config.with_template(template),
        None => config,
    }
}

fn load_record(path: &Path) -> Result<ParsedRecord, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

#[allow(clippy::too_many_lines)]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = formfill_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run();
    };

    match command {
        Commands::Extract {
            input,
            json,
            patterns,
        } => {
            let mut parser = DataParser::new()?;
            if let Some(path) = patterns {
                parser.extend(PatternTable::from_path(&path)?);
            }

            let spinner =
                IndicatifProgress::spinner(&multi, &format!("Extracting {}", input.display()));
            let text = formfill_pdf::read_input_text(&input);
            spinner.finish_and_clear();

            let record = parser.parse(&text?);
            let summary = parser.summary(&record);

            if json {
                let out = serde_json::json!({
                    "fields": record,
                    "summary": summary,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                display::print_record(&record);
                display::print_summary(&summary);
            }
        }
        Commands::Fields { template, output } => {
            let bytes = std::fs::read(&template)?;
            let fields = formfill_pdf::read_form_fields(&bytes)?;
            let json = serde_json::to_string_pretty(&fields)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    log::info!("Wrote {} fields to {}", fields.len(), path.display());
                }
                None => println!("{json}"),
            }
        }
        Commands::Fill {
            input,
            output,
            template,
            data,
            mapping,
            patterns,
        } => {
            let config = config(template, mapping).with_patterns(patterns);
            let transcriber = Transcriber::new(&config)?;

            let spinner =
                IndicatifProgress::spinner(&multi, &format!("Filling {}", output.display()));
            let filled = match (data, input) {
                (Some(data), _) => load_record(&data).and_then(|record| {
                    log::info!("Loaded {} fields from {}", record.len(), data.display());
                    Ok((None, transcriber.write_filled(&record, &output)?))
                }),
                (None, Some(input)) => transcriber
                    .transcribe(&input, &output)
                    .map(|outcome| (Some(outcome.summary), outcome.report))
                    .map_err(Into::into),
                (None, None) => Err("fill needs an input file or --data".into()),
            };
            spinner.finish_and_clear();

            let (summary, report) = filled?;
            if let Some(summary) = summary {
                display::print_summary(&summary);
            }

            display::print_fill_report(&report);
            println!("Saved {}", output.display());
        }
        Commands::Batch {
            inputs,
            output_dir,
            template,
            mapping,
        } => {
            let mut config = config(template, mapping);
            if let Some(dir) = output_dir {
                config = config.with_output_dir(dir);
            }
            let transcriber = Transcriber::new(&config)?;

            let progress =
                IndicatifProgress::files_bar(&multi, "Transcribing", inputs.len() as u64);
            let report = transcriber.transcribe_batch(&inputs, &config.output_dir, &progress);

            for outcome in &report.succeeded {
                println!(
                    "{} -> {} ({} fields)",
                    outcome.input.display(),
                    outcome.output.display(),
                    outcome.summary.filled_fields
                );
            }
            for failure in &report.failed {
                println!("FAILED {}: {}", failure.input.display(), failure.error);
            }

            if !report.failed.is_empty() {
                return Err(format!("{} of {} inputs failed", report.failed.len(), inputs.len()).into());
            }
        }
        Commands::Mapping { mapping, json } => {
            let mapping = match mapping {
                Some(path) => formfill_pdf::FieldMapping::from_path(&path)?,
                None => formfill_pdf::FieldMapping::embedded()?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&mapping)?);
            } else {
                for (key, field) in &mapping.text {
                    println!("{:<28} -> {field}", key.to_string());
                }
                println!();
                display::print_mapping_info(&mapping.info());
            }
        }
    }

    Ok(())
}
