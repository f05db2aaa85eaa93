//! Mock collaborators shared by the composition tests.

use image::{Rgba, RgbaImage};
use pdf_paginate::{
    BreakPoint, ContentNode, DocumentAssembly, DocumentMetadata, PaginateError, RenderingEngine,
    Result,
};

/// Renderer that fabricates a solid bitmap of the content's natural height.
///
/// The engine passes its own height estimate as the capture hint, so the
/// mock simply honors it; an optional failure index simulates a capture
/// crash for a specific item.
pub struct MockRenderer {
    pub captures: usize,
    pub fail_on: Option<usize>,
    pub hints_seen: Vec<usize>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self {
            captures: 0,
            fail_on: None,
            hints_seen: Vec::new(),
        }
    }

    pub fn failing_on(capture_index: usize) -> Self {
        Self {
            captures: 0,
            fail_on: Some(capture_index),
            hints_seen: Vec::new(),
        }
    }
}

impl RenderingEngine for MockRenderer {
    async fn prepare(&mut self, _content: &mut ContentNode) -> Result<()> {
        Ok(())
    }

    fn apply_break_hints(
        &mut self,
        _content: &mut ContentNode,
        hints: &[BreakPoint],
    ) -> Result<()> {
        self.hints_seen.push(hints.len());
        Ok(())
    }

    async fn capture(
        &mut self,
        _content: &ContentNode,
        pixel_width: u32,
        natural_height_hint: Option<u32>,
    ) -> Result<RgbaImage> {
        let index = self.captures;
        self.captures += 1;
        if self.fail_on == Some(index) {
            return Err(PaginateError::Capture("mock capture failure".to_string()));
        }
        let height = natural_height_hint.unwrap_or(0);
        Ok(RgbaImage::from_pixel(
            pixel_width,
            height,
            Rgba([40, 80, 120, 255]),
        ))
    }
}

/// Assembly backend that only keeps page accounting. Serialized documents
/// are a text stub carrying the page count, which `load_document` parses
/// back - enough for the merger to do real work against it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockAssembly;

#[derive(Debug, Default)]
pub struct MockDoc {
    pub pages: usize,
}

impl DocumentAssembly for MockAssembly {
    type Doc = MockDoc;
    type Page = ();

    fn create_document(&self, _width_mm: f32, _height_mm: f32) -> Result<MockDoc> {
        Ok(MockDoc::default())
    }

    fn add_page(&self, doc: &mut MockDoc) -> Result<()> {
        doc.pages += 1;
        Ok(())
    }

    fn place_image(
        &self,
        doc: &mut MockDoc,
        image_bytes: &[u8],
        _x_mm: f32,
        _y_mm: f32,
        _width_mm: f32,
        _height_mm: f32,
    ) -> Result<()> {
        if image_bytes.is_empty() {
            return Err(PaginateError::Assembly("empty image".to_string()));
        }
        if doc.pages == 0 {
            return Err(PaginateError::Assembly("no page to draw on".to_string()));
        }
        Ok(())
    }

    fn set_metadata(&self, _doc: &mut MockDoc, _metadata: &DocumentMetadata) -> Result<()> {
        Ok(())
    }

    fn serialize(&self, doc: MockDoc) -> Result<Vec<u8>> {
        Ok(format!("mockdoc:{}", doc.pages).into_bytes())
    }

    fn load_document(&self, bytes: &[u8]) -> Result<MockDoc> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| PaginateError::Assembly("not a mock document".to_string()))?;
        let pages = text
            .strip_prefix("mockdoc:")
            .and_then(|count| count.parse::<usize>().ok())
            .ok_or_else(|| PaginateError::Assembly("not a mock document".to_string()))?;
        Ok(MockDoc { pages })
    }

    fn page_count(&self, doc: &MockDoc) -> usize {
        doc.pages
    }

    fn copy_pages(&self, source: &MockDoc, indices: &[usize]) -> Result<Vec<()>> {
        for &index in indices {
            if index >= source.pages {
                return Err(PaginateError::Merge(format!(
                    "page index {index} out of range"
                )));
            }
        }
        Ok(vec![(); indices.len()])
    }

    fn append_pages(&self, target: &mut MockDoc, pages: Vec<()>) -> Result<()> {
        target.pages += pages.len();
        Ok(())
    }
}

/// Content outline of `height_mm` worth of paragraphs.
pub fn paragraphs(height_mm: f32) -> ContentNode {
    let mut children = Vec::new();
    let mut top = 0.0f32;
    while top < height_mm {
        let h = (height_mm - top).min(50.0);
        children.push(ContentNode::new("p", top, h));
        top += h;
    }
    ContentNode::new("body", 0.0, height_mm).with_children(children)
}
