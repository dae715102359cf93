//! AcroForm inspection.
//!
//! Walks the interactive form tree of a PDF (`/AcroForm /Fields`, recursing
//! through `/Kids`) and resolves every widget annotation to its fully
//! qualified field name, inherited field type and page.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;

use crate::PdfError;

/// `/Ff` bit marking a button field as a radio group.
const FF_RADIO: i64 = 1 << 15;
/// `/Ff` bit marking a button field as a push button.
const FF_PUSHBUTTON: i64 = 1 << 16;

/// Interactive field kind, derived from `/FT` and `/Ff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Checkbox,
    Radio,
    PushButton,
    Choice,
    Signature,
    Unknown,
}

impl FieldType {
    fn from_pdf(ft: Option<&[u8]>, flags: i64) -> Self {
        match ft {
            Some(b"Tx") => Self::Text,
            Some(b"Btn") if flags & FF_PUSHBUTTON != 0 => Self::PushButton,
            Some(b"Btn") if flags & FF_RADIO != 0 => Self::Radio,
            Some(b"Btn") => Self::Checkbox,
            Some(b"Ch") => Self::Choice,
            Some(b"Sig") => Self::Signature,
            _ => Self::Unknown,
        }
    }
}

/// Where a [`FormField`] was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldSource {
    /// Reached through the document's `/AcroForm` field tree.
    AcroForm,
    /// Found as a page annotation carrying a `/T` name, for documents
    /// whose AcroForm is missing or empty.
    Annotation,
}

/// A form field as reported by [`list_form_fields`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormField {
    pub name: String,
    pub field_type: FieldType,
    pub value: String,
    /// Widget rectangle `[x1, y1, x2, y2]` in points, if present.
    pub rect: Vec<f64>,
    /// 1-based page number of the first widget, if it is placed on a page.
    pub page: Option<u32>,
    pub source: FieldSource,
}

/// One widget annotation bound to a terminal field.
///
/// For single-widget fields `field_id == widget_id`; otherwise the field
/// dictionary holds `/V` and each kid widget holds `/AS`, `/AP` and `/Rect`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetRef {
    pub name: String,
    pub field_id: ObjectId,
    pub widget_id: ObjectId,
    pub field_type: FieldType,
}

/// Returns the object behind `obj`, following one level of reference.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Result<&'a Object, PdfError> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

/// Returns the document's AcroForm dictionary, if it has one.
pub(crate) fn acroform(doc: &Document) -> Result<Option<&Dictionary>, PdfError> {
    let catalog = doc.catalog()?;
    let Ok(obj) = catalog.get(b"AcroForm") else {
        return Ok(None);
    };
    Ok(resolve(doc, obj)?.as_dict().ok())
}

/// Collects every widget reachable from the AcroForm field tree.
///
/// # Errors
///
/// Returns [`PdfError::Lopdf`] if the catalog cannot be read.
pub fn collect_widgets(doc: &Document) -> Result<Vec<WidgetRef>, PdfError> {
    let mut widgets = Vec::new();
    let Some(form) = acroform(doc)? else {
        return Ok(widgets);
    };
    let Ok(fields) = form.get(b"Fields").and_then(|f| resolve_array(doc, f)) else {
        return Ok(widgets);
    };

    let mut visited = BTreeSet::new();
    for field in fields {
        if let Object::Reference(id) = field {
            walk_field(doc, *id, "", None, 0, &mut visited, &mut widgets);
        } else {
            log::debug!("Skipping inline field dictionary in /Fields");
        }
    }

    Ok(widgets)
}

fn resolve_array<'a>(doc: &'a Document, obj: &'a Object) -> lopdf::Result<&'a Vec<Object>> {
    match obj {
        Object::Reference(id) => doc.get_object(*id)?.as_array(),
        other => other.as_array(),
    }
}

#[allow(clippy::too_many_arguments)]
fn walk_field(
    doc: &Document,
    id: ObjectId,
    parent_name: &str,
    inherited_ft: Option<&[u8]>,
    inherited_flags: i64,
    visited: &mut BTreeSet<ObjectId>,
    out: &mut Vec<WidgetRef>,
) {
    if !visited.insert(id) {
        log::warn!("Cycle in form field tree at object {id:?}");
        return;
    }
    let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) else {
        return;
    };

    let name = match dict_string(dict, b"T") {
        Some(partial) if parent_name.is_empty() => partial,
        Some(partial) => format!("{parent_name}.{partial}"),
        None => parent_name.to_owned(),
    };
    let ft = dict
        .get(b"FT")
        .and_then(Object::as_name)
        .ok()
        .or(inherited_ft);
    let flags = dict
        .get(b"Ff")
        .and_then(Object::as_i64)
        .unwrap_or(inherited_flags);

    let kids: Vec<ObjectId> = dict
        .get(b"Kids")
        .and_then(|k| resolve_array(doc, k))
        .map(|arr| {
            arr.iter()
                .filter_map(|k| k.as_reference().ok())
                .collect()
        })
        .unwrap_or_default();

    if kids.is_empty() {
        out.push(WidgetRef {
            name,
            field_id: id,
            widget_id: id,
            field_type: FieldType::from_pdf(ft, flags),
        });
        return;
    }

    for kid in kids {
        let is_child_field = doc
            .get_object(kid)
            .and_then(Object::as_dict)
            .is_ok_and(|d| d.has(b"T"));

        if is_child_field {
            walk_field(doc, kid, &name, ft, flags, visited, out);
        } else {
            out.push(WidgetRef {
                name: name.clone(),
                field_id: id,
                widget_id: kid,
                field_type: FieldType::from_pdf(ft, flags),
            });
        }
    }
}

/// Maps each annotation object to the 1-based page it is placed on.
fn annotation_pages(doc: &Document) -> BTreeMap<ObjectId, u32> {
    let mut pages = BTreeMap::new();
    for (page_num, page_id) in doc.get_pages() {
        for annot in page_annotations(doc, page_id) {
            pages.entry(annot).or_insert(page_num);
        }
    }
    pages
}

/// Returns the annotation references of a page.
pub(crate) fn page_annotations(doc: &Document, page_id: ObjectId) -> Vec<ObjectId> {
    doc.get_object(page_id)
        .and_then(Object::as_dict)
        .and_then(|page| page.get(b"Annots"))
        .and_then(|annots| resolve_array(doc, annots))
        .map(|arr| arr.iter().filter_map(|a| a.as_reference().ok()).collect())
        .unwrap_or_default()
}

/// Lists the fillable fields of a PDF, keyed by fully qualified name.
///
/// Uses the AcroForm field tree; if it yields nothing, falls back to page
/// annotations that carry a `/T` name.
///
/// # Errors
///
/// Returns [`PdfError::Lopdf`] if the document structure cannot be read.
pub fn list_form_fields(doc: &Document) -> Result<BTreeMap<String, FormField>, PdfError> {
    let pages = annotation_pages(doc);
    let mut fields = BTreeMap::new();

    for widget in collect_widgets(doc)? {
        if fields.contains_key(&widget.name) {
            continue;
        }
        let field_dict = doc.get_object(widget.field_id)?.as_dict()?;
        let widget_dict = doc.get_object(widget.widget_id)?.as_dict()?;

        fields.insert(
            widget.name.clone(),
            FormField {
                name: widget.name,
                field_type: widget.field_type,
                value: dict_value(field_dict).unwrap_or_default(),
                rect: dict_rect(widget_dict).unwrap_or_default(),
                page: pages.get(&widget.widget_id).copied(),
                source: FieldSource::AcroForm,
            },
        );
    }

    if fields.is_empty() {
        for (page_num, page_id) in doc.get_pages() {
            for annot_id in page_annotations(doc, page_id) {
                let Ok(dict) = doc.get_object(annot_id).and_then(Object::as_dict) else {
                    continue;
                };
                let Some(name) = dict_string(dict, b"T") else {
                    continue;
                };
                let ft = dict.get(b"FT").and_then(Object::as_name).ok();
                let flags = dict.get(b"Ff").and_then(Object::as_i64).unwrap_or(0);
                fields.entry(name.clone()).or_insert_with(|| FormField {
                    name,
                    field_type: FieldType::from_pdf(ft, flags),
                    value: dict_value(dict).unwrap_or_default(),
                    rect: dict_rect(dict).unwrap_or_default(),
                    page: Some(page_num),
                    source: FieldSource::Annotation,
                });
            }
        }
    }

    log::debug!("Found {} form fields", fields.len());

    Ok(fields)
}

/// Loads a PDF from memory and lists its form fields.
///
/// # Errors
///
/// Returns [`PdfError::Lopdf`] if the bytes are not a readable PDF.
pub fn read_form_fields(bytes: &[u8]) -> Result<BTreeMap<String, FormField>, PdfError> {
    let doc = Document::load_mem(bytes)?;
    list_form_fields(&doc)
}

// ── Dictionary helpers ───────────────────────────────────────────────────

/// Reads a text string entry (`/T`, `/V`, `/DA`, ...) as UTF-8.
pub(crate) fn dict_string(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Reads `/V` as either a text string or a name (checkbox state).
fn dict_value(dict: &Dictionary) -> Option<String> {
    match dict.get(b"V").ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Reads `/Rect` as four numbers.
pub(crate) fn dict_rect(dict: &Dictionary) -> Option<Vec<f64>> {
    let rect = dict.get(b"Rect").ok()?.as_array().ok()?;
    rect.iter().map(object_number).collect()
}

pub(crate) fn object_number(obj: &Object) -> Option<f64> {
    match obj {
        #[allow(clippy::cast_precision_loss)]
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

/// Decodes a PDF text string: UTF-16BE with BOM, otherwise UTF-8 with a
/// Latin-1 fallback for PDFDocEncoding bytes.
#[must_use]
pub fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    std::str::from_utf8(bytes).map_or_else(
        |_| bytes.iter().map(|&b| char::from(b)).collect(),
        str::to_owned,
    )
}

/// Encodes `text` as a PDF text string: literal for ASCII, UTF-16BE with
/// BOM otherwise.
#[must_use]
pub fn encode_pdf_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, lopdf::StringFormat::Hexadecimal)
}

#[cfg(test)]
pub(crate) mod tests {
    use lopdf::{Stream, dictionary};

    use super::*;

    /// Builds a one-page form with a text field, a checkbox pair split
    /// across a parent/kid hierarchy and a two-widget text field.
    pub(crate) fn sample_form() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let name_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal("Name In Block Letter"),
            "Rect" => vec![
                Object::Integer(50),
                Object::Integer(700),
                Object::Integer(250),
                Object::Integer(720),
            ],
            "DA" => Object::string_literal("/Helv 12 Tf 0.5 g"),
            "AP" => dictionary! {},
        });

        let yes_ap = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let off_ap = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
        let male_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Btn",
            "T" => Object::string_literal("MaleCheck"),
            "Rect" => vec![
                Object::Integer(50),
                Object::Integer(650),
                Object::Integer(60),
                Object::Integer(660),
            ],
            "V" => "Off",
            "AS" => "Off",
            "AP" => dictionary! {
                "N" => dictionary! { "On" => yes_ap, "Off" => off_ap },
            },
        });

        let phone_parent_id = doc.new_object_id();
        let phone_a = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Parent" => phone_parent_id,
            "Rect" => vec![
                Object::Integer(50),
                Object::Integer(600),
                Object::Integer(150),
                Object::Integer(620),
            ],
        });
        let phone_b = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Parent" => phone_parent_id,
            "Rect" => vec![
                Object::Integer(160),
                Object::Integer(600),
                Object::Integer(260),
                Object::Integer(620),
            ],
        });
        doc.objects.insert(
            phone_parent_id,
            Object::Dictionary(dictionary! {
                "FT" => "Tx",
                "T" => Object::string_literal("Mobile Number"),
                "Kids" => vec![Object::Reference(phone_a), Object::Reference(phone_b)],
            }),
        );

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
            "Annots" => vec![
                Object::Reference(name_id),
                Object::Reference(male_id),
                Object::Reference(phone_a),
                Object::Reference(phone_b),
            ],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => dictionary! {
                "Fields" => vec![
                    Object::Reference(name_id),
                    Object::Reference(male_id),
                    Object::Reference(phone_parent_id),
                ],
                "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
            },
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// Wraps `annots` in a one-page document, with `acroform` as the
    /// catalog's interactive form if given.
    pub(crate) fn single_page(
        mut doc: Document,
        annots: &[ObjectId],
        acroform: Option<Dictionary>,
    ) -> Vec<u8> {
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Annots" => annots.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => Object::Integer(1),
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        if let Some(acroform) = acroform {
            catalog.set("AcroForm", acroform);
        }
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn lists_acroform_fields() {
        let doc = Document::load_mem(&sample_form()).unwrap();
        let fields = list_form_fields(&doc).unwrap();

        assert_eq!(fields.len(), 3);

        let name = &fields["Name In Block Letter"];
        assert_eq!(name.field_type, FieldType::Text);
        assert_eq!(name.page, Some(1));
        assert_eq!(name.rect, vec![50.0, 700.0, 250.0, 720.0]);
        assert_eq!(name.source, FieldSource::AcroForm);

        let male = &fields["MaleCheck"];
        assert_eq!(male.field_type, FieldType::Checkbox);
        assert_eq!(male.value, "Off");

        let mobile = &fields["Mobile Number"];
        assert_eq!(mobile.field_type, FieldType::Text);
        assert_eq!(mobile.rect, vec![50.0, 600.0, 150.0, 620.0]);
    }

    #[test]
    fn collects_every_widget_of_multi_widget_fields() {
        let doc = Document::load_mem(&sample_form()).unwrap();
        let widgets = collect_widgets(&doc).unwrap();
        let mobile: Vec<_> = widgets
            .iter()
            .filter(|w| w.name == "Mobile Number")
            .collect();
        assert_eq!(mobile.len(), 2);
        assert_eq!(mobile[0].field_id, mobile[1].field_id);
        assert_ne!(mobile[0].widget_id, mobile[1].widget_id);
    }

    #[test]
    fn field_listing_serializes_to_json() {
        let doc = Document::load_mem(&sample_form()).unwrap();
        let fields = list_form_fields(&doc).unwrap();
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["MaleCheck"]["field_type"], "checkbox");
        assert_eq!(json["Name In Block Letter"]["source"], "acro_form");
    }

    #[test]
    fn falls_back_to_named_annotations_without_acroform() {
        let mut doc = Document::with_version("1.5");
        let remarks = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal("Remarks"),
            "V" => Object::string_literal("none"),
        });
        let unnamed = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
        });
        let bytes = single_page(doc, &[remarks, unnamed], None);

        let fields = read_form_fields(&bytes).unwrap();
        assert_eq!(fields.len(), 1);

        let remarks = &fields["Remarks"];
        assert_eq!(remarks.source, FieldSource::Annotation);
        assert_eq!(remarks.page, Some(1));
        assert_eq!(remarks.field_type, FieldType::Text);
        assert_eq!(remarks.value, "none");
    }

    #[test]
    fn child_fields_get_dotted_names_and_inherit_type() {
        let mut doc = Document::with_version("1.5");
        let address_id = doc.new_object_id();
        let country_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Parent" => address_id,
            "T" => Object::string_literal("Country"),
            "V" => Object::string_literal("Nepal"),
        });
        doc.objects.insert(
            address_id,
            Object::Dictionary(dictionary! {
                "FT" => "Tx",
                "T" => Object::string_literal("Address"),
                "Kids" => vec![Object::Reference(country_id)],
            }),
        );
        let bytes = single_page(
            doc,
            &[country_id],
            Some(dictionary! { "Fields" => vec![Object::Reference(address_id)] }),
        );

        let fields = read_form_fields(&bytes).unwrap();
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["Address.Country"]);

        let country = &fields["Address.Country"];
        assert_eq!(country.field_type, FieldType::Text);
        assert_eq!(country.value, "Nepal");
        assert_eq!(country.source, FieldSource::AcroForm);
        assert_eq!(country.page, Some(1));
    }

    #[test]
    fn decodes_utf16_strings() {
        let encoded = encode_pdf_string("राम");
        let Object::String(bytes, _) = encoded else {
            panic!("expected string object");
        };
        assert_eq!(decode_pdf_string(&bytes), "राम");
        assert_eq!(decode_pdf_string(b"RAM"), "RAM");
    }
}
