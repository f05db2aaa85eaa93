use crate::constants::{DEFAULT_BACKGROUND, DEFAULT_IMAGE_QUALITY};
use crate::layout::breaks::BreakRules;
use crate::layout::geometry::calculate_geometry;
use crate::types::*;

/// Fully-enumerated generation configuration.
///
/// Every field has a documented default; [`validate`](Self::validate) runs
/// once at the start of a request and rejects bad input before any capture
/// happens.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationOptions {
    /// Output paper size (default A4)
    pub paper_size: PaperSize,
    /// Page orientation (default portrait)
    pub orientation: Orientation,
    /// Four-sided margins (default 10mm uniform)
    pub margins: PageMargins,
    /// JPEG quality for encoded page slices, 1-100 (default 85)
    pub image_quality: u8,
    /// Opaque background drawn behind every slice (default white)
    pub background: [u8; 3],
    /// Metadata passed through to the assembly backend
    pub metadata: DocumentMetadata,
    /// Break-analysis tag lists and thresholds
    pub break_rules: BreakRules,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            orientation: Orientation::Portrait,
            margins: PageMargins::default(),
            image_quality: DEFAULT_IMAGE_QUALITY,
            background: DEFAULT_BACKGROUND,
            metadata: DocumentMetadata::default(),
            break_rules: BreakRules::default(),
        }
    }
}

impl GenerationOptions {
    /// Validate the options.
    ///
    /// Geometry problems surface as [`PaginateError::InvalidGeometry`],
    /// everything else as [`PaginateError::Config`].
    pub fn validate(&self) -> Result<()> {
        calculate_geometry(self.paper_size, self.orientation, &self.margins)?;

        if self.image_quality == 0 || self.image_quality > 100 {
            return Err(PaginateError::Config(format!(
                "image quality must be 1-100, got {}",
                self.image_quality
            )));
        }

        let m = &self.margins;
        if [m.top_mm, m.right_mm, m.bottom_mm, m.left_mm]
            .iter()
            .any(|v| *v < 0.0)
        {
            return Err(PaginateError::Config(
                "margins must not be negative".to_string(),
            ));
        }

        if self.break_rules.tolerance < 0.0 || self.break_rules.heading_gap < 0.0 {
            return Err(PaginateError::Config(
                "break thresholds must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}
