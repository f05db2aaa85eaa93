//! Windowed slice planning
//!
//! The one slicing algorithm shared by the single-document paginator and the
//! batch composer. Given a captured bitmap and the page geometry it produces
//! the list of source windows, one per output page. Boundaries are a pure
//! function of `(bitmap size, usable area, scale factor)`: identical inputs
//! always yield identical plans.

use crate::layout::geometry::PageGeometry;
use crate::types::{PaginateError, Result};

/// Tolerance when deciding whether content spills onto another page. A
/// micron of page length is far below layout precision but absorbs the
/// rounding noise of scale factors constructed to hit an exact page count.
const BOUNDARY_EPSILON_MM: f64 = 1e-3;

/// One rectangular window of the master bitmap mapped onto one output page.
///
/// For a given plan the windows are contiguous, non-overlapping, and their
/// `source_height` values sum exactly to the bitmap height.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice {
    /// Top edge of the window in bitmap pixels
    pub source_offset: u32,
    /// Window height in bitmap pixels
    pub source_height: u32,
    /// Height this window occupies on its page, in millimeters
    pub dest_height_mm: f32,
}

/// Plan the page windows for a captured bitmap.
///
/// `scale_factor` stretches (> 1) or compresses (< 1) the content's length on
/// the page; the single-document path passes 1.0. The content length in
/// page units is `bitmap_height * usable_width / bitmap_width * scale`; when
/// it fits the usable height the plan is a single full-bitmap window,
/// otherwise fixed-height windows of `usable_height / scale` worth of source
/// pixels are cut until the bitmap is exhausted.
pub fn slice_plan(
    bitmap_width: u32,
    bitmap_height: u32,
    geometry: &PageGeometry,
    scale_factor: f32,
) -> Result<Vec<PageSlice>> {
    if bitmap_height == 0 || bitmap_width == 0 {
        return Err(PaginateError::EmptyContent);
    }
    if !(scale_factor > 0.0) || !scale_factor.is_finite() {
        return Err(PaginateError::InvalidScale(scale_factor));
    }

    // f64 internally: boundary rounding must not wobble with the input size.
    let width = f64::from(bitmap_width);
    let height = f64::from(bitmap_height);
    let usable_w = f64::from(geometry.usable_width_mm);
    let usable_h = f64::from(geometry.usable_height_mm);
    let scale = f64::from(scale_factor);

    let mm_per_px = usable_w / width * scale;
    let content_len_mm = height * mm_per_px;

    if content_len_mm <= usable_h + BOUNDARY_EPSILON_MM {
        return Ok(vec![PageSlice {
            source_offset: 0,
            source_height: bitmap_height,
            dest_height_mm: content_len_mm as f32,
        }]);
    }

    // Source pixels consumed by one full page.
    let page_height_px = usable_h / mm_per_px;
    let pages = ((content_len_mm - BOUNDARY_EPSILON_MM) / usable_h).ceil() as u32;

    let mut slices = Vec::with_capacity(pages as usize);
    let mut previous = 0u32;
    for page in 1..=pages {
        let boundary = if page == pages {
            bitmap_height
        } else {
            ((f64::from(page) * page_height_px).round() as u32).min(bitmap_height)
        };
        if boundary <= previous {
            // Degenerate sub-pixel page; the remainder folds into the
            // neighboring windows.
            continue;
        }
        slices.push(PageSlice {
            source_offset: previous,
            source_height: boundary - previous,
            dest_height_mm: (f64::from(boundary - previous) * mm_per_px) as f32,
        });
        previous = boundary;
    }

    Ok(slices)
}

/// Page count the plan will produce without materializing it.
pub fn page_count(bitmap_width: u32, bitmap_height: u32, geometry: &PageGeometry) -> usize {
    slice_plan(bitmap_width, bitmap_height, geometry, 1.0)
        .map(|s| s.len())
        .unwrap_or(0)
}

// =============================================================================
// Tests
// =============================================================================
