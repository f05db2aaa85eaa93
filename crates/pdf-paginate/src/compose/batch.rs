//! Batch composition - scaling each item to its target page count

use std::time::Instant;

use crate::collab::{DocumentAssembly, RenderingEngine};
use crate::content::{ContentItem, ContentNode};
use crate::layout::geometry::{PageGeometry, calculate_geometry};
use crate::layout::slicer::slice_plan;
use crate::options::GenerationOptions;
use crate::progress::{GenerationHooks, ProgressEvent};
use crate::types::{BatchGenerationResult, BatchItemResult, PaginateError, Result};

use super::capture_content;
use super::merge::{MergeInput, merge_documents};

/// How a batch of items is composed into one output document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionMode {
    /// Each item is paginated into its own document and the documents are
    /// concatenated page by page. Every item starts on a fresh page.
    Separate,
    /// All items are concatenated into one content tree before a single
    /// capture pass, so items may share a page boundary.
    Combined,
}

/// Combined mode is only safe when every item explicitly allows sharing a
/// page; any `true`, mixed, or unset flag selects separate mode.
pub fn select_mode(items: &[ContentItem]) -> CompositionMode {
    if !items.is_empty() && items.iter().all(|i| i.force_new_page == Some(false)) {
        CompositionMode::Combined
    } else {
        CompositionMode::Separate
    }
}

/// Compose a batch of content items into one merged document.
///
/// Each item is scaled so its content occupies its requested number of
/// pages. In separate mode a capture failure skips the offending item
/// (flagged `merged: false` in the result) without aborting the batch;
/// input-validation errors always abort.
pub async fn compose_batch<R, A>(
    renderer: &mut R,
    assembly: &A,
    items: Vec<ContentItem>,
    options: &GenerationOptions,
    hooks: &GenerationHooks,
) -> Result<BatchGenerationResult>
where
    R: RenderingEngine,
    A: DocumentAssembly,
{
    let started = Instant::now();

    options.validate()?;
    let geometry = calculate_geometry(options.paper_size, options.orientation, &options.margins)?;

    if items.is_empty() {
        return Err(PaginateError::Config(
            "batch contains no content items".to_string(),
        ));
    }
    if let Some(bad) = items.iter().position(|i| i.target_page_count == 0) {
        return Err(PaginateError::Config(format!(
            "item {bad} requests a target page count of 0"
        )));
    }

    let mut result = match select_mode(&items) {
        CompositionMode::Separate => {
            compose_separate(renderer, assembly, items, &geometry, options, hooks).await?
        }
        CompositionMode::Combined => {
            compose_combined(renderer, assembly, items, &geometry, options, hooks).await?
        }
    };

    result.elapsed = started.elapsed();
    hooks.emit(ProgressEvent::Completed {
        total_pages: result.total_pages,
    });
    Ok(result)
}

// =============================================================================
// Separate Mode
// =============================================================================

struct ItemDocument {
    bytes: Vec<u8>,
    pages: usize,
    scale: f32,
}

async fn compose_separate<R, A>(
    renderer: &mut R,
    assembly: &A,
    items: Vec<ContentItem>,
    geometry: &PageGeometry,
    options: &GenerationOptions,
    hooks: &GenerationHooks,
) -> Result<BatchGenerationResult>
where
    R: RenderingEngine,
    A: DocumentAssembly,
{
    let mut inputs = Vec::with_capacity(items.len());

    for (index, item) in items.into_iter().enumerate() {
        hooks.cancel.check()?;
        hooks.emit(ProgressEvent::ItemStarted {
            index,
            title: item.title.clone(),
        });

        let title = item.title.clone();
        match paginate_item(renderer, assembly, item, geometry, options, hooks).await {
            Ok(doc) => {
                hooks.emit(ProgressEvent::ItemCompleted {
                    index,
                    pages: doc.pages,
                });
                inputs.push(MergeInput {
                    bytes: Some(doc.bytes),
                    item: BatchItemResult {
                        title,
                        start_page: 0,
                        end_page: 0,
                        page_count: doc.pages,
                        scale_factor: doc.scale,
                        merged: true,
                    },
                });
            }
            Err(err) if err.is_fatal() => return Err(err),
            Err(err) => {
                // One broken item must not sink the batch; it is recorded
                // with an explicit flag instead of a guessed page count.
                log::warn!("batch item {index} skipped: {err}");
                hooks.emit(ProgressEvent::ItemSkipped {
                    index,
                    message: err.to_string(),
                });
                inputs.push(MergeInput {
                    bytes: None,
                    item: BatchItemResult {
                        title,
                        start_page: 0,
                        end_page: 0,
                        page_count: 0,
                        scale_factor: 0.0,
                        merged: false,
                    },
                });
            }
        }
    }

    hooks.emit(ProgressEvent::MergeStarted {
        documents: inputs.len(),
    });
    let merged = merge_documents(assembly, geometry, &options.metadata, inputs)?;

    Ok(BatchGenerationResult {
        byte_size: merged.bytes.len(),
        bytes: merged.bytes,
        total_pages: merged.total_pages,
        elapsed: Default::default(),
        items: merged.items,
    })
}

/// Capture, scale, and paginate one item into its own document.
async fn paginate_item<R, A>(
    renderer: &mut R,
    assembly: &A,
    item: ContentItem,
    geometry: &PageGeometry,
    options: &GenerationOptions,
    hooks: &GenerationHooks,
) -> Result<ItemDocument>
where
    R: RenderingEngine,
    A: DocumentAssembly,
{
    let mut content = item.content;
    let bitmap = capture_content(renderer, &mut content, geometry, options, hooks).await?;

    let scale = scale_to_target(
        bitmap.width(),
        bitmap.height(),
        geometry,
        item.target_page_count,
    )?;
    let slices = slice_plan(bitmap.width(), bitmap.height(), geometry, scale)?;

    let mut doc = assembly.create_document(geometry.width_mm, geometry.height_mm)?;
    let pages = super::write_pages(assembly, &mut doc, &bitmap, &slices, geometry, options, hooks)?;

    let mut metadata = options.metadata.clone();
    if item.title.is_some() {
        metadata.title = item.title;
    }
    assembly.set_metadata(&mut doc, &metadata)?;

    Ok(ItemDocument {
        bytes: assembly.serialize(doc)?,
        pages,
        scale,
    })
}

// =============================================================================
// Combined Mode
// =============================================================================

async fn compose_combined<R, A>(
    renderer: &mut R,
    assembly: &A,
    items: Vec<ContentItem>,
    geometry: &PageGeometry,
    options: &GenerationOptions,
    hooks: &GenerationHooks,
) -> Result<BatchGenerationResult>
where
    R: RenderingEngine,
    A: DocumentAssembly,
{
    let titles: Vec<Option<String>> = items.iter().map(|i| i.title.clone()).collect();
    let targets: Vec<u32> = items.iter().map(|i| i.target_page_count).collect();
    let total_target: u32 = targets.iter().sum();

    // Stack the item trees into one document-order tree; offsets become
    // absolute within the combined content.
    let mut combined = ContentNode::new("document", 0.0, 0.0);
    let mut offset = 0.0f32;
    for item in items {
        let mut content = item.content;
        content.shift(offset - content.top);
        offset += content.height;
        combined.children.push(content);
    }
    combined.height = offset;

    // One shared capture: any failure here aborts the whole request.
    let bitmap = capture_content(renderer, &mut combined, geometry, options, hooks).await?;

    let scale = scale_to_target(bitmap.width(), bitmap.height(), geometry, total_target)?;
    let slices = slice_plan(bitmap.width(), bitmap.height(), geometry, scale)?;

    let mut doc = assembly.create_document(geometry.width_mm, geometry.height_mm)?;
    let total_pages =
        super::write_pages(assembly, &mut doc, &bitmap, &slices, geometry, options, hooks)?;
    assembly.set_metadata(&mut doc, &options.metadata)?;
    let bytes = assembly.serialize(doc)?;

    // Items share pages, so per-item ranges are estimates derived from the
    // requested counts rather than measured slice boundaries.
    let mut items_out = Vec::with_capacity(targets.len());
    let mut counter = 0usize;
    for (title, target) in titles.into_iter().zip(targets) {
        let start = (counter + 1).min(total_pages);
        let end = (counter + target as usize).min(total_pages);
        items_out.push(BatchItemResult {
            title,
            start_page: start,
            end_page: end,
            page_count: end.saturating_sub(start) + 1,
            scale_factor: scale,
            merged: true,
        });
        counter = end;
    }
    if let Some(last) = items_out.last_mut() {
        last.end_page = total_pages;
        last.page_count = total_pages.saturating_sub(last.start_page) + 1;
    }

    Ok(BatchGenerationResult {
        byte_size: bytes.len(),
        bytes,
        total_pages,
        elapsed: Default::default(),
        items: items_out,
    })
}

// =============================================================================
// Shared Steps
// =============================================================================

/// Scale factor forcing content to occupy `target_pages` pages.
fn scale_to_target(
    bitmap_width: u32,
    bitmap_height: u32,
    geometry: &PageGeometry,
    target_pages: u32,
) -> Result<f32> {
    let natural_len_mm =
        bitmap_height as f32 * geometry.usable_width_mm / bitmap_width as f32;
    let target_len_mm = geometry.usable_height_mm * target_pages as f32;
    let scale = target_len_mm / natural_len_mm;

    if !(scale > 0.0) || !scale.is_finite() {
        return Err(PaginateError::InvalidScale(scale));
    }
    Ok(scale)
}
