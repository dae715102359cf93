#![allow(clippy::module_name_repetitions)]

//! Interactive transcription session.
//!
//! Walks the operator through one form: pick the OCR'd input, review what
//! was extracted, correct or add any field, then choose the template and
//! output path and fill it.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use formfill_parser::DataParser;
use formfill_record_models::{FieldCategory, FieldKey, ParsedRecord};
use formfill_transcribe::{TranscribeConfig, Transcriber, output_path_for};

use crate::display;

/// What to do after reviewing the extracted record.
enum ReviewAction {
    Fill,
    EditField,
    ShowRecord,
    Quit,
}

impl ReviewAction {
    const ALL: &[Self] = &[Self::Fill, Self::EditField, Self::ShowRecord, Self::Quit];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Fill => "Fill the template",
            Self::EditField => "Edit a field",
            Self::ShowRecord => "Show extracted fields",
            Self::Quit => "Quit without filling",
        }
    }
}

/// Runs one interactive transcription.
///
/// # Errors
///
/// Returns an error if a prompt fails, the input cannot be read, or the
/// template cannot be filled.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("Form Transcription");
    println!();

    let input: String = Input::new()
        .with_prompt("OCR'd form (PDF or text file)")
        .validate_with(|path: &String| {
            if PathBuf::from(path).is_file() {
                Ok(())
            } else {
                Err("file not found")
            }
        })
        .interact_text()?;
    let input = PathBuf::from(input);

    let parser = DataParser::new()?;
    let text = formfill_pdf::read_input_text(&input)?;
    let mut record = parser.parse(&text);

    if record.is_empty() {
        println!("No fields could be extracted. You can still enter them by hand.");
    } else {
        display::print_record(&record);
        display::print_summary(&parser.summary(&record));
    }
    println!();

    loop {
        let labels: Vec<&str> = ReviewAction::ALL.iter().map(ReviewAction::label).collect();
        let idx = Select::new()
            .with_prompt("What next?")
            .items(&labels)
            .default(0)
            .interact()?;

        match ReviewAction::ALL[idx] {
            ReviewAction::Fill => break,
            ReviewAction::EditField => edit_field(&mut record)?,
            ReviewAction::ShowRecord => display::print_record(&record),
            ReviewAction::Quit => return Ok(()),
        }
    }

    let defaults = TranscribeConfig::from_env();
    let template: String = Input::new()
        .with_prompt("Template PDF")
        .default(defaults.template.display().to_string())
        .interact_text()?;
    let output: String = Input::new()
        .with_prompt("Save filled PDF as")
        .default(
            output_path_for(&input, &defaults.output_dir)
                .display()
                .to_string(),
        )
        .interact_text()?;
    let output = PathBuf::from(output);

    if output.exists()
        && !Confirm::new()
            .with_prompt(format!("{} exists. Overwrite?", output.display()))
            .default(false)
            .interact()?
    {
        println!("Aborted.");
        return Ok(());
    }

    let transcriber = Transcriber::new(&defaults.with_template(template))?;
    let report = transcriber.write_filled(&record, &output)?;

    display::print_fill_report(&report);
    println!("Saved {}", output.display());

    Ok(())
}

/// Prompts for a section, then a field, then its new value.
///
/// An empty value removes the field from the record.
fn edit_field(record: &mut ParsedRecord) -> Result<(), Box<dyn std::error::Error>> {
    let sections: Vec<&str> = FieldCategory::all()
        .iter()
        .map(|c| c.label())
        .collect();
    let section = Select::new()
        .with_prompt("Section")
        .items(&sections)
        .default(0)
        .interact()?;

    let keys = FieldKey::for_category(FieldCategory::all()[section]);
    let items: Vec<String> = keys
        .iter()
        .map(|k| format!("{:<28} {}", k.label(), record.get(*k).unwrap_or("-")))
        .collect();
    let field = Select::new()
        .with_prompt("Field")
        .items(&items)
        .default(0)
        .interact()?;
    let key = keys[field];

    let value: String = Input::new()
        .with_prompt(key.label())
        .with_initial_text(record.get(key).unwrap_or_default())
        .allow_empty(true)
        .interact_text()?;

    if record.insert(key, &value) {
        log::debug!("Set {key} to {value:?}");
    } else if record.remove(key).is_some() {
        println!("Cleared {}", key.label());
    }

    Ok(())
}
