//! Page extraction and transplantation
//!
//! Copying a page between documents means carrying its whole object graph:
//! the page dictionary plus everything it references (content streams,
//! resources, fonts, images), re-keyed into the target document's object
//! space. The Parent link is deliberately cut during extraction - it would
//! otherwise drag the entire source page tree along - and restored against
//! the target's page tree root on append.

use std::collections::{BTreeMap, HashSet};

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdf_paginate::{PaginateError, Result};

/// A page lifted out of a document, self-contained and ready to be appended
/// elsewhere. Object ids are still the source document's; they are remapped
/// on append.
#[derive(Debug, Clone)]
pub struct CopiedPage {
    pub(crate) dict: Dictionary,
    pub(crate) objects: BTreeMap<ObjectId, Object>,
}

/// Extract one page and the transitive closure of its references.
pub(crate) fn extract_page(doc: &Document, page_id: ObjectId) -> Result<CopiedPage> {
    let page_dict = doc
        .get_dictionary(page_id)
        .map_err(|err| PaginateError::Merge(format!("page {page_id:?}: {err}")))?;

    let mut dict = page_dict.clone();
    dict.remove(b"Parent");

    // Inheritable attributes must survive without the parent chain.
    if !dict.has(b"MediaBox") {
        if let Some(media_box) = inherited_media_box(doc, page_id) {
            dict.set("MediaBox", media_box);
        }
    }

    let mut objects = BTreeMap::new();
    let mut visited = HashSet::new();
    for (_, value) in dict.iter() {
        collect_referenced(doc, value, &mut objects, &mut visited);
    }

    Ok(CopiedPage { dict, objects })
}

/// Renumber a copied page into `target` and return its new page object id.
/// The caller is responsible for hooking the id into the page tree.
pub(crate) fn insert_page(
    target: &mut Document,
    parent_id: ObjectId,
    page: CopiedPage,
) -> ObjectId {
    let mut id_map: BTreeMap<ObjectId, ObjectId> = BTreeMap::new();
    for old_id in page.objects.keys() {
        id_map.insert(*old_id, target.new_object_id());
    }

    for (old_id, object) in &page.objects {
        let remapped = remap_object(object, &id_map);
        target.objects.insert(id_map[old_id], remapped);
    }

    let mut dict = Dictionary::new();
    for (key, value) in page.dict.iter() {
        dict.set(key.clone(), remap_object(value, &id_map));
    }
    dict.set("Parent", Object::Reference(parent_id));

    target.add_object(Object::Dictionary(dict))
}

/// Walk an object, cloning every object reachable through references.
fn collect_referenced(
    doc: &Document,
    object: &Object,
    objects: &mut BTreeMap<ObjectId, Object>,
    visited: &mut HashSet<ObjectId>,
) {
    match object {
        Object::Reference(id) => {
            if !visited.insert(*id) {
                return;
            }
            if let Ok(referenced) = doc.get_object(*id) {
                objects.insert(*id, referenced.clone());
                collect_referenced(doc, referenced, objects, visited);
            }
        }
        Object::Dictionary(dict) => {
            for (key, value) in dict.iter() {
                // Never chase Parent links out of a page subtree.
                if key == b"Parent" {
                    continue;
                }
                collect_referenced(doc, value, objects, visited);
            }
        }
        Object::Array(array) => {
            for item in array {
                collect_referenced(doc, item, objects, visited);
            }
        }
        Object::Stream(stream) => {
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                collect_referenced(doc, value, objects, visited);
            }
        }
        _ => {}
    }
}

/// Rewrite references through the old-to-new id map. Unknown references
/// (severed Parent links and the like) collapse to null rather than dangle.
fn remap_object(object: &Object, id_map: &BTreeMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(id) => match id_map.get(id) {
            Some(new_id) => Object::Reference(*new_id),
            None => Object::Null,
        },
        Object::Dictionary(dict) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                new_dict.set(key.clone(), remap_object(value, id_map));
            }
            Object::Dictionary(new_dict)
        }
        Object::Array(array) => {
            Object::Array(array.iter().map(|item| remap_object(item, id_map)).collect())
        }
        Object::Stream(stream) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                new_dict.set(key.clone(), remap_object(value, id_map));
            }
            let mut new_stream = stream.clone();
            new_stream.dict = new_dict;
            Object::Stream(new_stream)
        }
        other => other.clone(),
    }
}

/// Resolve the effective MediaBox of a page by walking up its parent chain.
pub(crate) fn inherited_media_box(doc: &Document, page_id: ObjectId) -> Option<Object> {
    let mut current = page_id;
    // Bounded walk; malformed documents can have parent cycles.
    for _ in 0..32 {
        let dict = doc.get_dictionary(current).ok()?;
        if let Ok(media_box) = dict.get(b"MediaBox") {
            return Some(media_box.clone());
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}
