//! Image XObject construction
//!
//! Page slices arrive as encoded image bytes. JPEG data passes straight
//! through as a DCTDecode stream; anything else is decoded and embedded as
//! raw 8-bit RGB. Placement is a plain transform-and-draw content operation.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use lopdf::{Dictionary, Object, Stream};
use pdf_paginate::{PaginateError, Result};

/// An image ready to be referenced from a page's resources.
pub(crate) struct EmbeddedImage {
    pub width: u32,
    pub height: u32,
    pub stream: Stream,
}

/// Build an image XObject stream from encoded image bytes.
pub(crate) fn build_image_xobject(bytes: &[u8]) -> Result<EmbeddedImage> {
    let format = image::guess_format(bytes)?;

    if format == ImageFormat::Jpeg {
        let (width, height) = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|err| PaginateError::Assembly(format!("image format probe: {err}")))?
            .into_dimensions()?;

        let mut stream = Stream::new(image_dict(width, height), bytes.to_vec());
        stream.dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
        // Already entropy coded; recompressing would only bloat the file.
        stream.allows_compression = false;

        return Ok(EmbeddedImage {
            width,
            height,
            stream,
        });
    }

    // Non-JPEG input: decode and embed as raw RGB8.
    let rgb = image::load_from_memory(bytes)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    let stream = Stream::new(image_dict(width, height), rgb.into_raw());

    Ok(EmbeddedImage {
        width,
        height,
        stream,
    })
}

fn image_dict(width: u32, height: u32) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(i64::from(width))),
        ("Height", Object::Integer(i64::from(height))),
        ("ColorSpace", Object::Name(b"DeviceRGB".to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
    ])
}

/// Content stream command drawing an XObject into the given rectangle.
///
/// Coordinates are PDF points with the origin at the bottom-left corner of
/// the page.
pub(crate) fn placement_command(
    name: &str,
    x_pt: f32,
    y_pt: f32,
    width_pt: f32,
    height_pt: f32,
) -> String {
    format!("q {width_pt} 0 0 {height_pt} {x_pt} {y_pt} cm /{name} Do Q\n")
}
