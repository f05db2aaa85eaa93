//! Merging independently generated documents
//!
//! Each input document's pages are copied in order into one output document
//! through the assembly collaborator, and every item's page range is
//! backfilled from the running counter. A document that cannot be loaded is
//! logged and skipped; its item keeps `merged: false` and contributes no
//! pages - the page numbering of the surviving items stays exact instead of
//! drifting around a guessed count.

use crate::collab::DocumentAssembly;
use crate::layout::geometry::PageGeometry;
use crate::types::{BatchItemResult, DocumentMetadata, PaginateError, Result};

/// One serialized per-item document plus its result stub. `bytes: None`
/// marks an item that already failed upstream (e.g. its capture); the merge
/// keeps its slot in the result without attempting a load.
#[derive(Debug)]
pub struct MergeInput {
    pub bytes: Option<Vec<u8>>,
    pub item: BatchItemResult,
}

/// A merged document with finalized page accounting.
#[derive(Debug)]
pub struct MergedDocument {
    pub bytes: Vec<u8>,
    pub total_pages: usize,
    pub items: Vec<BatchItemResult>,
}

/// Concatenate the input documents page by page, in order.
pub fn merge_documents<A: DocumentAssembly>(
    assembly: &A,
    geometry: &PageGeometry,
    metadata: &DocumentMetadata,
    inputs: Vec<MergeInput>,
) -> Result<MergedDocument> {
    let mut output = assembly.create_document(geometry.width_mm, geometry.height_mm)?;
    let mut counter = 0usize;
    let mut items = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.into_iter().enumerate() {
        let mut item = input.item;

        let source = input.bytes.and_then(|bytes| {
            match assembly.load_document(&bytes) {
                Ok(doc) => Some(doc),
                Err(err) => {
                    log::warn!("document {index} failed to load during merge: {err}");
                    None
                }
            }
        });

        match source {
            Some(source) => {
                let count = assembly.page_count(&source);
                let indices: Vec<usize> = (0..count).collect();
                match assembly.copy_pages(&source, &indices) {
                    Ok(pages) => {
                        assembly.append_pages(&mut output, pages).map_err(|err| {
                            PaginateError::Merge(format!(
                                "appending pages of document {index}: {err}"
                            ))
                        })?;
                        item.start_page = counter + 1;
                        item.end_page = counter + count;
                        item.page_count = count;
                        item.merged = true;
                        counter += count;
                    }
                    Err(err) => {
                        log::warn!("document {index} pages could not be copied: {err}");
                        mark_unmerged(&mut item);
                    }
                }
            }
            None => mark_unmerged(&mut item),
        }

        items.push(item);
    }

    assembly.set_metadata(&mut output, metadata)?;
    let bytes = assembly.serialize(output)?;

    Ok(MergedDocument {
        bytes,
        total_pages: counter,
        items,
    })
}

fn mark_unmerged(item: &mut BatchItemResult) {
    item.merged = false;
    item.page_count = 0;
    item.start_page = 0;
    item.end_page = 0;
}
