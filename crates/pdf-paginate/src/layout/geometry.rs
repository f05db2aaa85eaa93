//! Page geometry calculation
//!
//! Converts (paper size, orientation, margins) into the usable content area
//! and its pixel equivalents. Computed once per generation request and
//! treated as immutable afterwards.

use crate::constants::mm_to_px;
use crate::types::{Orientation, PageMargins, PaginateError, PaperSize, Result};

/// Resolved page dimensions for one generation request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Full page width in millimeters (orientation applied)
    pub width_mm: f32,
    /// Full page height in millimeters (orientation applied)
    pub height_mm: f32,
    /// Page width minus left and right margins
    pub usable_width_mm: f32,
    /// Page height minus top and bottom margins
    pub usable_height_mm: f32,
    /// Usable width in capture pixels
    pub pixel_width: u32,
    /// Usable height in capture pixels
    pub pixel_height: u32,
}

/// Derive the page geometry for a request.
///
/// Fails with [`PaginateError::InvalidGeometry`] when the margins consume an
/// entire page dimension.
pub fn calculate_geometry(
    paper_size: PaperSize,
    orientation: Orientation,
    margins: &PageMargins,
) -> Result<PageGeometry> {
    let (width_mm, height_mm) = paper_size.dimensions_with_orientation(orientation);

    let usable_width_mm = width_mm - margins.left_mm - margins.right_mm;
    let usable_height_mm = height_mm - margins.top_mm - margins.bottom_mm;

    if usable_width_mm <= 0.0 {
        return Err(PaginateError::InvalidGeometry(format!(
            "horizontal margins ({} + {}) leave no usable width on a {}mm page",
            margins.left_mm, margins.right_mm, width_mm
        )));
    }
    if usable_height_mm <= 0.0 {
        return Err(PaginateError::InvalidGeometry(format!(
            "vertical margins ({} + {}) leave no usable height on a {}mm page",
            margins.top_mm, margins.bottom_mm, height_mm
        )));
    }

    Ok(PageGeometry {
        width_mm,
        height_mm,
        usable_width_mm,
        usable_height_mm,
        pixel_width: mm_to_px(usable_width_mm).round() as u32,
        pixel_height: mm_to_px(usable_height_mm).round() as u32,
    })
}

// =============================================================================
// Tests
// =============================================================================
