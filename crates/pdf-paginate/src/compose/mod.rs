//! Document composition - turning captures into paginated output
//!
//! This module orchestrates the generation paths:
//! 1. Analyze break points and hand hints to the renderer
//! 2. Capture the content at full natural height
//! 3. Plan and cut page slices, encode them, place them on pages
//! 4. For batches, scale each item to its target page count and merge

mod batch;
mod merge;
mod single;

pub use batch::{CompositionMode, compose_batch, select_mode};
pub use merge::{MergeInput, MergedDocument, merge_documents};
pub use single::paginate_single;

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgba, RgbaImage, imageops};

use crate::collab::{DocumentAssembly, RenderingEngine};
use crate::constants::mm_to_px;
use crate::content::ContentNode;
use crate::layout::breaks::BreakPlan;
use crate::layout::geometry::PageGeometry;
use crate::layout::slicer::PageSlice;
use crate::options::GenerationOptions;
use crate::progress::{GenerationHooks, ProgressEvent};
use crate::types::{PaginateError, Result};

/// Break analysis, pre-capture preparation, and the capture itself - the
/// steps every composition path runs before slicing.
async fn capture_content<R: RenderingEngine>(
    renderer: &mut R,
    content: &mut ContentNode,
    geometry: &PageGeometry,
    options: &GenerationOptions,
    hooks: &GenerationHooks,
) -> Result<RgbaImage> {
    let plan = BreakPlan::analyze(content, &options.break_rules);
    renderer.prepare(content).await?;
    renderer.apply_break_hints(content, plan.points())?;

    let boundaries = plan.suggested_boundaries(content.height, geometry.usable_height_mm);
    if !boundaries.is_empty() {
        log::debug!("resolved page boundaries ahead of capture: {boundaries:?}");
    }

    hooks.cancel.check()?;
    let height_hint = mm_to_px(content.height).round() as u32;
    let bitmap = renderer
        .capture(content, geometry.pixel_width, Some(height_hint))
        .await?;

    if bitmap.height() == 0 {
        return Err(PaginateError::EmptyContent);
    }
    Ok(bitmap)
}

/// Cut one slice out of the master bitmap onto an opaque background and
/// encode it as JPEG.
///
/// The background fill happens before the slice is drawn so transparent
/// regions of the capture never leak through as undefined bytes in the
/// non-alpha output format.
fn encode_slice(bitmap: &RgbaImage, slice: &PageSlice, options: &GenerationOptions) -> Result<Vec<u8>> {
    let [r, g, b] = options.background;
    let mut page = RgbaImage::from_pixel(
        bitmap.width(),
        slice.source_height,
        Rgba([r, g, b, 255]),
    );

    let window = imageops::crop_imm(
        bitmap,
        0,
        slice.source_offset,
        bitmap.width(),
        slice.source_height,
    )
    .to_image();
    imageops::overlay(&mut page, &window, 0, 0);

    let rgb = DynamicImage::ImageRgba8(page).to_rgb8();
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(Cursor::new(&mut bytes), options.image_quality)
        .encode_image(&rgb)?;
    Ok(bytes)
}

/// Write a slice plan into a document: one page per slice, each slice image
/// placed at the margin offset.
///
/// A failure while cutting or placing a slice does not fabricate an empty
/// page: the loop logs, stops, and the pages already written stand. Returns
/// the number of pages actually written.
fn write_pages<A: DocumentAssembly>(
    assembly: &A,
    doc: &mut A::Doc,
    bitmap: &RgbaImage,
    slices: &[PageSlice],
    geometry: &PageGeometry,
    options: &GenerationOptions,
    hooks: &GenerationHooks,
) -> Result<usize> {
    let mut pages_written = 0usize;

    for slice in slices {
        hooks.cancel.check()?;

        let result = encode_slice(bitmap, slice, options).and_then(|bytes| {
            assembly.add_page(doc)?;
            assembly.place_image(
                doc,
                &bytes,
                options.margins.left_mm,
                options.margins.top_mm,
                geometry.usable_width_mm,
                slice.dest_height_mm,
            )
        });

        match result {
            Ok(()) => {
                pages_written += 1;
                hooks.emit(ProgressEvent::PageRendered {
                    page: pages_written,
                });
            }
            Err(err) => {
                log::warn!(
                    "slice at offset {} failed after {} pages: {err}",
                    slice.source_offset,
                    pages_written
                );
                break;
            }
        }
    }

    Ok(pages_written)
}
