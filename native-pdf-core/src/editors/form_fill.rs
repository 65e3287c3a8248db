//! Form-field value injection
//!
//! A filled field is flattened: its widget annotation is removed and the
//! value is drawn as plain text into the content stream of the page that
//! owns the widget.

use super::surgery::RawDocument;
use crate::bytes::{encode_latin1, escape_pdf_string, format_real};
use crate::error::Result;
use crate::objects::{Dictionary, IndirectObject, ObjectId, ObjectRole};
use tracing::{debug, info, warn};

/// Position used when a widget has no usable `/Rect`.
const DEFAULT_POSITION: (f64, f64) = (130.0, 150.0);
const FILL_FONT_SIZE: u32 = 12;

/// Fill `(field name, value)` pairs in order. Unknown fields are skipped.
pub fn fill_form_fields<I, K, V>(data: &[u8], fields: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut raw = RawDocument::parse(data)?;
    let mut filled = 0usize;

    for (name, value) in fields {
        let name = name.as_ref();
        let Some(widget_id) = raw.find_field_widget(name) else {
            warn!("Form field '{name}' not found, skipping");
            continue;
        };
        let widget = raw.require_object(widget_id.number())?;

        let (x, y) = widget
            .dictionary()
            .get_numbers("Rect")
            .filter(|rect| rect.len() >= 4)
            .map_or(DEFAULT_POSITION, |rect| (rect[0], rect[1]));
        let page_id = owning_page(&raw, &widget)?;

        raw.remove(widget_id.number());
        raw.drop_from_arrays(widget_id);

        let page = raw.require_object(page_id.number())?;
        let font = raw.first_font_name(&page).unwrap_or_else(|| "F1".to_string());
        let operators = format!(
            "BT /{font} {FILL_FONT_SIZE} Tf {} {} Td ({}) Tj ET",
            format_real(x + 5.0),
            format_real(y + 2.0),
            escape_pdf_string(value.as_ref())
        );
        append_to_page_content(&mut raw, page, &operators)?;

        debug!("Filled field '{name}' (widget {widget_id}) on page {page_id}");
        filled += 1;
    }

    info!("Filled {filled} form fields");
    raw.to_bytes()
}

/// Page from the widget's `/P`, else the page whose `/Annots` lists it,
/// else the first page.
fn owning_page(raw: &RawDocument, widget: &IndirectObject) -> Result<ObjectId> {
    if let Some(parent) = widget.dictionary().get_reference("P") {
        let is_page = raw
            .object(parent.number())
            .map_or(false, |page| page.role() == ObjectRole::Page);
        if is_page {
            return Ok(parent);
        }
    }

    for &page_id in raw.page_ids() {
        let Some(page) = raw.object(page_id.number()) else {
            continue;
        };
        let annots = annotation_refs(raw, page.dictionary());
        if annots.contains(&widget.id()) {
            return Ok(page_id);
        }
    }

    raw.first_page()
}

fn annotation_refs(raw: &RawDocument, page: &Dictionary) -> Vec<ObjectId> {
    let Some(value) = page.get("Annots") else {
        return Vec::new();
    };
    if value.trim_start().starts_with('[') {
        return page.get_references("Annots");
    }
    page.get_reference("Annots")
        .and_then(|id| raw.object(id.number()))
        .and_then(|array| array.inline_text().map(crate::objects::references_in))
        .unwrap_or_default()
}

/// Append `operators` to the page's last content stream. Filtered or
/// missing content gets a new stream added to `/Contents` instead.
fn append_to_page_content(raw: &mut RawDocument, mut page: IndirectObject, operators: &str) -> Result<()> {
    if let Some(target) = raw.content_refs(&page).last().copied() {
        if let Some(mut stream) = raw.object(target.number()) {
            if let Some(data) = stream.stream_data().filter(|_| !stream.dictionary().contains_key("Filter")) {
                let mut data = data.to_vec();
                if !data.is_empty() && !data.ends_with(b"\n") {
                    data.push(b'\n');
                }
                data.extend(encode_latin1(operators));
                stream.set_stream_data(data);
                raw.replace(&stream);
                return Ok(());
            }
        }
    }

    let new_stream = raw.append(|id| IndirectObject::stream(id, Dictionary::new(), encode_latin1(operators)));
    if raw.push_content(&mut page, new_stream) {
        raw.replace(&page);
    }
    Ok(())
}
