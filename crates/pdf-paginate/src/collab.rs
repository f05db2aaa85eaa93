//! Collaborator traits for rendering and document assembly.
//!
//! The engine never rasterizes content and never writes document bytes
//! itself. Rendering is delegated to a [`RenderingEngine`] that captures a
//! prepared content tree at full natural height, and output is delegated to
//! a [`DocumentAssembly`] backend that owns the document byte format. Both
//! seams are explicit so the slicing and accounting logic stays pure and
//! testable against mocks.

use image::RgbaImage;

use crate::content::ContentNode;
use crate::layout::breaks::BreakPoint;
use crate::types::{DocumentMetadata, Result};

/// External renderer that turns a content tree into a bitmap.
///
/// `capture` must render the full natural height of the content, not a
/// clipped viewport: the paginator relies on the bitmap height being the
/// content height.
pub trait RenderingEngine {
    /// Run asynchronous pre-capture work (image loads, stylesheet loads).
    async fn prepare(&mut self, content: &mut ContentNode) -> Result<()>;

    /// Inject structural break hints into the content tree so layout can
    /// honor them during capture. Hints are advisory; the renderer decides
    /// how (or whether) to express them.
    fn apply_break_hints(&mut self, content: &mut ContentNode, hints: &[BreakPoint]) -> Result<()>;

    /// Capture the content at the given pixel width and its full natural
    /// height. `natural_height_hint` is the outline's own height estimate in
    /// pixels, usable for buffer pre-sizing.
    async fn capture(
        &mut self,
        content: &ContentNode,
        pixel_width: u32,
        natural_height_hint: Option<u32>,
    ) -> Result<RgbaImage>;
}

/// External backend that assembles page images into a document byte stream
/// and supports page-level operations on previously serialized documents.
///
/// Placement coordinates are millimeters measured from the page's top-left
/// corner; backends convert to their native coordinate space.
pub trait DocumentAssembly {
    /// In-memory document handle.
    type Doc;
    /// A page extracted by [`copy_pages`](DocumentAssembly::copy_pages),
    /// self-contained so it can be appended to another document.
    type Page;

    fn create_document(&self, width_mm: f32, height_mm: f32) -> Result<Self::Doc>;

    /// Append one blank page; subsequent `place_image` calls draw on it.
    fn add_page(&self, doc: &mut Self::Doc) -> Result<()>;

    /// Draw an encoded image onto the most recently added page.
    fn place_image(
        &self,
        doc: &mut Self::Doc,
        image_bytes: &[u8],
        x_mm: f32,
        y_mm: f32,
        width_mm: f32,
        height_mm: f32,
    ) -> Result<()>;

    fn set_metadata(&self, doc: &mut Self::Doc, metadata: &DocumentMetadata) -> Result<()>;

    fn serialize(&self, doc: Self::Doc) -> Result<Vec<u8>>;

    fn load_document(&self, bytes: &[u8]) -> Result<Self::Doc>;

    fn page_count(&self, doc: &Self::Doc) -> usize;

    /// Extract the pages at `indices` (0-based) as self-contained copies.
    fn copy_pages(&self, source: &Self::Doc, indices: &[usize]) -> Result<Vec<Self::Page>>;

    /// Append previously copied pages to `target`, in order.
    fn append_pages(&self, target: &mut Self::Doc, pages: Vec<Self::Page>) -> Result<()>;
}
