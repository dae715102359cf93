//! Plain-text rendering of records and reports.

use formfill_pdf::FillReport;
use formfill_pdf::mapping::MappingInfo;
use formfill_record_models::{ExtractionSummary, FieldCategory, FieldKey, ParsedRecord};

/// Prints `record` grouped by form section, marking absent fields.
pub fn print_record(record: &ParsedRecord) {
    for category in FieldCategory::all() {
        let keys = FieldKey::for_category(*category);
        if !keys.iter().any(|k| record.contains(*k)) {
            continue;
        }

        println!("{}", category.label());
        println!("{}", "-".repeat(50));
        for key in keys {
            println!("  {:<28} {}", key.label(), record.get(key).unwrap_or("-"));
        }
        println!();
    }
}

pub fn print_summary(summary: &ExtractionSummary) {
    println!(
        "Extracted {}/{} fields ({}%)",
        summary.filled_fields,
        FieldKey::all().len(),
        summary.coverage_percent()
    );
    for (category, count) in &summary.categories {
        println!("  {:<22} {count}", category.label());
    }
}

pub fn print_fill_report(report: &FillReport) {
    println!("Filled {} fields", report.filled.len());
    if !report.skipped.is_empty() {
        println!("Skipped (wrong field type): {}", report.skipped.join(", "));
    }
    if !report.missing.is_empty() {
        println!("Not in template: {}", report.missing.join(", "));
    }
}

pub fn print_mapping_info(info: &MappingInfo) {
    println!("Text fields:     {}", info.text_fields);
    println!("Checkbox fields: {}", info.checkbox_fields);
    for (category, count) in &info.categories {
        println!("  {:<22} {count}", category.label());
    }
}
