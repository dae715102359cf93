//! Writes field values into a fillable template.
//!
//! Text widgets get a new `/V`, their cached `/AP` is dropped and the
//! document sets `/NeedAppearances` so viewers regenerate the appearance.
//! Checkbox widgets are switched by setting `/V` and `/AS` to the widget's
//! on-state name or `/Off`. Checking a radio group turns on its first button
//! and turns the others off.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;

use crate::PdfError;
use crate::form::{self, FieldType, WidgetRef};
use crate::mapping::FieldUpdate;

/// Substrings (lower-case) marking a field laid out as one box per character.
const CHARACTER_BOX_HINTS: &[&str] = &[
    "name in block letter",
    "father",
    "mother",
    "grandfather",
    "spouse",
    "son",
    "daughter",
    "beneficiary id number",
];

/// Substrings marking a field as holding a person's name.
const NAME_HINTS: &[&str] = &["name", "father", "mother", "spouse", "son", "daughter"];

/// Width assumed for fields without a usable `/Rect`.
const DEFAULT_FIELD_WIDTH: f64 = 300.0;

/// Outcome of a fill, per PDF field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub filled: Vec<String>,
    /// Fields present in the template whose type cannot take the update.
    pub skipped: Vec<String>,
    /// Update targets the template does not contain.
    pub missing: Vec<String>,
}

/// The filled document and what happened while producing it.
#[derive(Debug, Clone)]
pub struct FilledPdf {
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

/// Fills `template` with `updates` and returns the saved document.
///
/// # Errors
///
/// * [`PdfError::Lopdf`] if the template cannot be parsed or saved
/// * [`PdfError::NoForm`] if the template has no interactive form
pub fn fill_template(
    template: &[u8],
    updates: &BTreeMap<String, FieldUpdate>,
) -> Result<FilledPdf, PdfError> {
    let mut doc = Document::load_mem(template)?;
    let report = fill_document(&mut doc, updates)?;

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;

    Ok(FilledPdf { bytes, report })
}

/// Applies `updates` to an already loaded document.
///
/// # Errors
///
/// Returns [`PdfError::NoForm`] if the document has no AcroForm fields.
pub fn fill_document(
    doc: &mut Document,
    updates: &BTreeMap<String, FieldUpdate>,
) -> Result<FillReport, PdfError> {
    let widgets = form::collect_widgets(doc)?;
    if widgets.is_empty() {
        return Err(PdfError::NoForm);
    }
    log_pages_without_widgets(doc, &widgets);

    let mut by_name: BTreeMap<&str, Vec<&WidgetRef>> = BTreeMap::new();
    for widget in &widgets {
        by_name.entry(widget.name.as_str()).or_default().push(widget);
    }

    let mut report = FillReport::default();

    for (name, update) in updates {
        let Some(targets) = by_name.get(name.as_str()) else {
            log::warn!("Field {name:?} not found in template");
            report.missing.push(name.clone());
            continue;
        };

        let applied = match update {
            FieldUpdate::Text(value) => fill_text(doc, name, targets, value)?,
            FieldUpdate::Check(on) => fill_check(doc, targets, *on)?,
        };

        if applied {
            log::debug!("Filled {name:?}");
            report.filled.push(name.clone());
        } else {
            log::warn!(
                "Field {name:?} is a {:?} field; cannot apply {update:?}",
                targets[0].field_type
            );
            report.skipped.push(name.clone());
        }
    }

    set_need_appearances(doc)?;

    log::info!(
        "Filled {} fields ({} skipped, {} missing)",
        report.filled.len(),
        report.skipped.len(),
        report.missing.len()
    );

    Ok(report)
}

fn fill_text(
    doc: &mut Document,
    name: &str,
    targets: &[&WidgetRef],
    value: &str,
) -> Result<bool, PdfError> {
    if !matches!(targets[0].field_type, FieldType::Text | FieldType::Choice) {
        return Ok(false);
    }

    let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    let width = rect_width(doc, targets[0].widget_id).unwrap_or(DEFAULT_FIELD_WIDTH);
    let font_size = font_size_for(name, &value, width);

    let mut fields_done = BTreeSet::new();
    for target in targets {
        if fields_done.insert(target.field_id) {
            let field = dict_mut(doc, target.field_id)?;
            field.set("V", form::encode_pdf_string(&value));
        }

        let font = font_size.map(|_| appearance_font(doc, target.widget_id));

        let widget = dict_mut(doc, target.widget_id)?;
        widget.remove(b"AP");
        if let (Some(size), Some(font)) = (font_size, font) {
            widget.set("DA", Object::string_literal(format!("{font} {size} Tf 0 g")));
        }
    }

    Ok(true)
}

fn fill_check(doc: &mut Document, targets: &[&WidgetRef], on: bool) -> Result<bool, PdfError> {
    if !matches!(
        targets[0].field_type,
        FieldType::Checkbox | FieldType::Radio
    ) {
        return Ok(false);
    }

    let radio = targets[0].field_type == FieldType::Radio;

    let mut value: Option<Vec<u8>> = None;
    for (idx, target) in targets.iter().enumerate() {
        let state = if on && (!radio || idx == 0) {
            on_state(doc, target.widget_id)
        } else {
            b"Off".to_vec()
        };
        if value.is_none() {
            value = Some(state.clone());
        }
        dict_mut(doc, target.widget_id)?.set("AS", Object::Name(state));
    }

    if let Some(value) = value {
        let field_ids: BTreeSet<ObjectId> = targets.iter().map(|t| t.field_id).collect();
        for id in field_ids {
            dict_mut(doc, id)?.set("V", Object::Name(value.clone()));
        }
    }

    Ok(true)
}

/// Picks a font size for `value` in field `name`, or `None` to keep the
/// template's size.
///
/// Field names are matched case-insensitively by substring. Character-box
/// fields shrink with the number of non-space characters.
/// Other name fields longer than ten characters shrink with how densely the
/// text packs their width.
#[must_use]
pub fn font_size_for(name: &str, value: &str, width: f64) -> Option<f64> {
    if value.is_empty() {
        return None;
    }

    let lower = name.to_lowercase();
    if CHARACTER_BOX_HINTS.iter().any(|hint| lower.contains(hint)) {
        let chars = value.chars().filter(|c| !c.is_whitespace()).count();
        return Some(if chars > 15 {
            7.0
        } else if chars > 10 {
            8.0
        } else {
            9.0
        });
    }

    if !NAME_HINTS.iter().any(|hint| lower.contains(hint)) {
        return None;
    }

    let chars = value.chars().count();
    if chars <= 10 {
        return None;
    }

    let width = if width > 0.0 { width } else { DEFAULT_FIELD_WIDTH };
    #[allow(clippy::cast_precision_loss)]
    let density = chars as f64 / width;
    Some(if density > 0.04 {
        9.0
    } else if density > 0.035 {
        10.0
    } else {
        11.0
    })
}

/// Font resource for a widget's rewritten `/DA`.
///
/// Looks at the widget's own `/DA`, then each `/Parent` field up the tree,
/// then the AcroForm default, and falls back to `/Helv`.
fn appearance_font(doc: &Document, widget_id: ObjectId) -> String {
    let mut seen = BTreeSet::new();
    let mut next = Some(widget_id);

    while let Some(id) = next {
        if !seen.insert(id) {
            break;
        }
        let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) else {
            break;
        };
        if let Some(font) = form::dict_string(dict, b"DA").and_then(|da| da_font(&da)) {
            return font;
        }
        next = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    form::acroform(doc)
        .ok()
        .flatten()
        .and_then(|acroform| form::dict_string(acroform, b"DA"))
        .and_then(|da| da_font(&da))
        .unwrap_or_else(|| "/Helv".to_owned())
}

/// Extracts the font resource (`/Helv`) from a default appearance string.
fn da_font(da: &str) -> Option<String> {
    let tokens: Vec<&str> = da.split_whitespace().collect();
    tokens
        .iter()
        .position(|t| *t == "Tf")
        .and_then(|idx| idx.checked_sub(2))
        .and_then(|idx| tokens.get(idx))
        .filter(|t| t.starts_with('/'))
        .map(|t| (*t).to_owned())
}

/// The name of a widget's on appearance state: the first key of `/AP /N`
/// other than `Off`, defaulting to `Yes`.
fn on_state(doc: &Document, widget_id: ObjectId) -> Vec<u8> {
    let states = doc
        .get_object(widget_id)
        .and_then(Object::as_dict)
        .and_then(|w| w.get(b"AP"))
        .ok()
        .and_then(|ap| form::resolve(doc, ap).ok())
        .and_then(|ap| ap.as_dict().ok())
        .and_then(|ap| ap.get(b"N").ok())
        .and_then(|n| form::resolve(doc, n).ok())
        .and_then(|n| n.as_dict().ok());

    states
        .and_then(|n| {
            n.iter()
                .map(|(k, _)| k)
                .find(|k| k.as_slice() != b"Off")
                .cloned()
        })
        .unwrap_or_else(|| b"Yes".to_vec())
}

fn rect_width(doc: &Document, widget_id: ObjectId) -> Option<f64> {
    let widget = doc.get_object(widget_id).ok()?.as_dict().ok()?;
    let rect = form::dict_rect(widget)?;
    match rect.as_slice() {
        [x1, _, x2, _] => Some((x2 - x1).abs()),
        _ => None,
    }
}

fn dict_mut(doc: &mut Document, id: ObjectId) -> Result<&mut Dictionary, PdfError> {
    Ok(doc.get_object_mut(id)?.as_dict_mut()?)
}

/// Sets `/NeedAppearances true` on the AcroForm, wherever it lives.
fn set_need_appearances(doc: &mut Document) -> Result<(), PdfError> {
    let catalog_id = doc.trailer.get(b"Root")?.as_reference()?;
    let acroform_ref = doc
        .get_object(catalog_id)?
        .as_dict()?
        .get(b"AcroForm")
        .ok()
        .and_then(|obj| obj.as_reference().ok());

    let acroform = match acroform_ref {
        Some(id) => dict_mut(doc, id)?,
        None => dict_mut(doc, catalog_id)?
            .get_mut(b"AcroForm")?
            .as_dict_mut()?,
    };
    acroform.set("NeedAppearances", Object::Boolean(true));

    Ok(())
}

fn log_pages_without_widgets(doc: &Document, widgets: &[WidgetRef]) {
    let widget_ids: BTreeSet<ObjectId> = widgets.iter().map(|w| w.widget_id).collect();
    for (page_num, page_id) in doc.get_pages() {
        let has_widgets = form::page_annotations(doc, page_id)
            .iter()
            .any(|id| widget_ids.contains(id));
        if !has_widgets {
            log::warn!("Page {page_num} has no form widgets");
        }
    }
}
