//! Single-document pagination

use std::time::Instant;

use crate::collab::{DocumentAssembly, RenderingEngine};
use crate::content::ContentNode;
use crate::layout::geometry::calculate_geometry;
use crate::layout::slicer::slice_plan;
use crate::options::GenerationOptions;
use crate::progress::{GenerationHooks, ProgressEvent};
use crate::types::{GenerationResult, Result};

use super::capture_content;

/// Paginate one piece of content into a document.
///
/// The content is captured once at full natural height and cut into
/// page-sized slices; content that fits the usable page height produces
/// exactly one page. Target page counts play no role on this path - only
/// batch composition scales content.
pub async fn paginate_single<R, A>(
    renderer: &mut R,
    assembly: &A,
    mut content: ContentNode,
    options: &GenerationOptions,
    hooks: &GenerationHooks,
) -> Result<GenerationResult>
where
    R: RenderingEngine,
    A: DocumentAssembly,
{
    let started = Instant::now();

    options.validate()?;
    let geometry = calculate_geometry(options.paper_size, options.orientation, &options.margins)?;

    let bitmap = capture_content(renderer, &mut content, &geometry, options, hooks).await?;
    let slices = slice_plan(bitmap.width(), bitmap.height(), &geometry, 1.0)?;

    let mut doc = assembly.create_document(geometry.width_mm, geometry.height_mm)?;
    let pages = super::write_pages(assembly, &mut doc, &bitmap, &slices, &geometry, options, hooks)?;
    assembly.set_metadata(&mut doc, &options.metadata)?;

    let bytes = assembly.serialize(doc)?;
    hooks.emit(ProgressEvent::Completed { total_pages: pages });

    Ok(GenerationResult {
        byte_size: bytes.len(),
        bytes,
        page_count: pages,
        elapsed: started.elapsed(),
    })
}
