//! JPEG image embedding
//!
//! The encoded JPEG bytes are embedded unchanged as a `/DCTDecode` image
//! XObject and drawn centred on the page by a new content stream. Existing
//! page content is kept: `/Contents` grows into an array. A page without its
//! own `/MediaBox` uses the one it inherits from the page tree.

use super::jpeg::{parse_jpeg_header, JpegInfo};
use super::surgery::RawDocument;
use crate::bytes::{encode_latin1, format_real};
use crate::error::{PdfError, Result};
use crate::objects::{parse_numbers, Dictionary, IndirectObject, ObjectId};
use crate::parser::parse_dictionary;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Placement options for [`embed_image`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageOptions {
    /// Fraction of the largest size that fits the page, in `(0, 1]`.
    pub scale: f64,
    /// Zero-based index of the target page.
    pub page_index: usize,
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self {
            scale: 0.8,
            page_index: 0,
        }
    }
}

/// Where the image lands on the page, in whole points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
}

/// Uniform scale to fit the page, multiplied by `scale`, centred.
pub fn compute_placement(media_box: [f64; 4], image: &JpegInfo, scale: f64) -> Placement {
    let page_width = media_box[2] - media_box[0];
    let page_height = media_box[3] - media_box[1];
    let image_width = f64::from(image.width);
    let image_height = f64::from(image.height);

    let factor = (page_width / image_width).min(page_height / image_height) * scale;
    let width = (image_width * factor).trunc();
    let height = (image_height * factor).trunc();

    Placement {
        width,
        height,
        x: media_box[0] + ((page_width - width) / 2.0).trunc(),
        y: media_box[1] + ((page_height - height) / 2.0).trunc(),
    }
}

pub fn embed_image_file(data: &[u8], image_path: &Path, options: &ImageOptions) -> Result<Vec<u8>> {
    if !image_path.exists() {
        return Err(PdfError::ResourceNotFound(image_path.to_path_buf()));
    }
    let image = fs::read(image_path)?;
    embed_image(data, &image, options)
}

/// Embed a JPEG on the selected page.
pub fn embed_image(data: &[u8], image: &[u8], options: &ImageOptions) -> Result<Vec<u8>> {
    if !(options.scale > 0.0 && options.scale <= 1.0) {
        return Err(PdfError::InvalidArgument(format!(
            "scale must be in (0, 1], got {}",
            options.scale
        )));
    }
    let jpeg = parse_jpeg_header(image)?;

    let mut raw = RawDocument::parse(data)?;
    let page_id = raw.page_ids().get(options.page_index).copied().ok_or_else(|| {
        PdfError::InvalidArgument(format!(
            "page index {} out of range (document has {} pages)",
            options.page_index,
            raw.page_ids().len()
        ))
    })?;
    let mut page = raw.require_object(page_id.number())?;

    let media_box = raw
        .inherited_value(&page, "MediaBox")
        .as_deref()
        .and_then(parse_numbers)
        .filter(|values| values.len() == 4)
        .map(|values| [values[0], values[1], values[2], values[3]])
        .ok_or_else(|| {
            PdfError::StructuralPrecondition(format!("page {page_id} has no usable /MediaBox"))
        })?;
    let placement = compute_placement(media_box, &jpeg, options.scale);

    let mut xobject = Dictionary::new();
    xobject.set("Type", "/XObject");
    xobject.set("Subtype", "/Image");
    xobject.set("Width", jpeg.width.to_string());
    xobject.set("Height", jpeg.height.to_string());
    xobject.set("ColorSpace", format!("/{}", jpeg.color_space.pdf_name()));
    xobject.set("BitsPerComponent", jpeg.bits_per_component.to_string());
    xobject.set("Filter", "/DCTDecode");
    let image_id = raw.append(|id| IndirectObject::stream(id, xobject, image.to_vec()));

    let name = add_xobject_resource(&mut raw, &mut page, image_id)?;

    let content = format!(
        "q\n{} 0 0 {} {} {} cm\n/{name} Do\nQ",
        format_real(placement.width),
        format_real(placement.height),
        format_real(placement.x),
        format_real(placement.y)
    );
    let content_id = raw.append(|id| IndirectObject::stream(id, Dictionary::new(), encode_latin1(&content)));

    raw.push_content(&mut page, content_id);
    raw.replace(&page);

    debug!(
        "Image {}x{} drawn at {}x{}+{}+{} as /{name}",
        jpeg.width, jpeg.height, placement.width, placement.height, placement.x, placement.y
    );
    info!("Embedded image on page {page_id}");
    raw.to_bytes()
}

/// Register `image` under the first free `/ImN` name of the page resources.
fn add_xobject_resource(raw: &mut RawDocument, page: &mut IndirectObject, image: ObjectId) -> Result<String> {
    let resources = page.dictionary().get("Resources").map(str::to_string);
    match resources.as_deref().and_then(ObjectId::parse_reference) {
        Some(reference) => {
            let mut object = raw.require_object(reference.number())?;
            let name = add_to_resources(raw, object.dictionary_mut(), image)?;
            raw.replace(&object);
            Ok(name)
        }
        None => {
            let mut dict = resources
                .map(|value| parse_dictionary(&encode_latin1(&value)))
                .unwrap_or_default();
            let name = add_to_resources(raw, &mut dict, image)?;
            page.dictionary_mut().set("Resources", dict.to_pdf_string());
            Ok(name)
        }
    }
}

fn add_to_resources(raw: &mut RawDocument, resources: &mut Dictionary, image: ObjectId) -> Result<String> {
    let xobjects = resources.get("XObject").map(str::to_string);
    match xobjects.as_deref().and_then(ObjectId::parse_reference) {
        Some(reference) => {
            let mut object = raw.require_object(reference.number())?;
            let name = next_image_name(object.dictionary());
            object.dictionary_mut().set(name.clone(), image.to_string());
            raw.replace(&object);
            Ok(name)
        }
        None => {
            let mut dict = xobjects
                .map(|value| parse_dictionary(&encode_latin1(&value)))
                .unwrap_or_default();
            let name = next_image_name(&dict);
            dict.set(name.clone(), image.to_string());
            resources.set("XObject", dict.to_pdf_string());
            Ok(name)
        }
    }
}

fn next_image_name(xobjects: &Dictionary) -> String {
    (1..)
        .map(|n| format!("Im{n}"))
        .find(|name| !xobjects.contains_key(name))
        .unwrap_or_else(|| "Im1".to_string())
}
