//! The lopdf-backed assembly collaborator.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use pdf_paginate::{DocumentAssembly, DocumentMetadata, PaginateError, Result};

use crate::image_xobject::{build_image_xobject, placement_command};
use crate::pages::{CopiedPage, extract_page, inherited_media_box, insert_page};

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
const POINTS_PER_MM: f32 = 72.0 / 25.4;

#[inline]
fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

fn assembly_err(context: &str, err: impl std::fmt::Display) -> PaginateError {
    PaginateError::Assembly(format!("{context}: {err}"))
}

/// Document handle: a lopdf document plus the bookkeeping needed to append
/// pages and images without re-deriving the page tree on every call.
pub struct PdfDoc {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
    page_width_pt: f32,
    page_height_pt: f32,
    image_counter: usize,
}

impl PdfDoc {
    /// Rewrite the page tree root to match the tracked page list.
    fn sync_pages(&mut self) {
        let mut pages_dict = match self.doc.get_dictionary(self.pages_id) {
            Ok(existing) => existing.clone(),
            Err(_) => Dictionary::new(),
        };
        pages_dict.set("Type", Object::Name(b"Pages".to_vec()));
        pages_dict.set(
            "Kids",
            Object::Array(self.kids.iter().map(|id| Object::Reference(*id)).collect()),
        );
        pages_dict.set("Count", Object::Integer(self.kids.len() as i64));
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages_dict));
    }
}

/// Assembly backend producing PDF byte streams with lopdf.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfAssembler;

impl PdfAssembler {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentAssembly for PdfAssembler {
    type Doc = PdfDoc;
    type Page = CopiedPage;

    fn create_document(&self, width_mm: f32, height_mm: f32) -> Result<PdfDoc> {
        let mut doc = Document::with_version("1.7");

        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(Vec::new())),
                ("Count", Object::Integer(0)),
            ])),
        );

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", catalog_id);

        Ok(PdfDoc {
            doc,
            pages_id,
            kids: Vec::new(),
            page_width_pt: mm_to_pt(width_mm),
            page_height_pt: mm_to_pt(height_mm),
            image_counter: 0,
        })
    }

    fn add_page(&self, doc: &mut PdfDoc) -> Result<()> {
        let content_id = doc
            .doc
            .add_object(Stream::new(Dictionary::new(), Vec::new()));

        let page_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(doc.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(doc.page_width_pt),
                    Object::Real(doc.page_height_pt),
                ]),
            ),
            ("Resources", Object::Dictionary(Dictionary::new())),
            ("Contents", Object::Reference(content_id)),
        ]);

        let page_id = doc.doc.add_object(page_dict);
        doc.kids.push(page_id);
        doc.sync_pages();
        Ok(())
    }

    fn place_image(
        &self,
        doc: &mut PdfDoc,
        image_bytes: &[u8],
        x_mm: f32,
        y_mm: f32,
        width_mm: f32,
        height_mm: f32,
    ) -> Result<()> {
        let page_id = *doc
            .kids
            .last()
            .ok_or_else(|| PaginateError::Assembly("no page to place an image on".to_string()))?;

        let embedded = build_image_xobject(image_bytes)?;
        let xobject_id = doc.doc.add_object(Object::Stream(embedded.stream));
        let name = format!("Im{}", doc.image_counter);
        doc.image_counter += 1;

        // Engine coordinates are top-left based; PDF's origin is bottom-left.
        let width_pt = mm_to_pt(width_mm);
        let height_pt = mm_to_pt(height_mm);
        let x_pt = mm_to_pt(x_mm);
        let y_pt = doc.page_height_pt - mm_to_pt(y_mm) - height_pt;
        let ops = placement_command(&name, x_pt, y_pt, width_pt, height_pt);

        let page_dict = doc
            .doc
            .get_dictionary(page_id)
            .map_err(|err| assembly_err("page lookup", err))?
            .clone();

        // Append the draw command to the page's content stream.
        let contents_id = page_dict
            .get(b"Contents")
            .and_then(Object::as_reference)
            .map_err(|err| assembly_err("page contents", err))?;
        match doc
            .doc
            .get_object_mut(contents_id)
            .map_err(|err| assembly_err("content stream", err))?
        {
            Object::Stream(stream) => stream.content.extend_from_slice(ops.as_bytes()),
            _ => {
                return Err(PaginateError::Assembly(
                    "page contents is not a stream".to_string(),
                ));
            }
        }

        // Register the XObject in the page's resources.
        let mut resources = match page_dict.get(b"Resources") {
            Ok(Object::Dictionary(existing)) => existing.clone(),
            Ok(Object::Reference(id)) => doc
                .doc
                .get_dictionary(*id)
                .map_err(|err| assembly_err("page resources", err))?
                .clone(),
            _ => Dictionary::new(),
        };
        let mut xobjects = match resources.get(b"XObject") {
            Ok(Object::Dictionary(existing)) => existing.clone(),
            _ => Dictionary::new(),
        };
        xobjects.set(name.as_bytes(), Object::Reference(xobject_id));
        resources.set("XObject", Object::Dictionary(xobjects));

        let mut updated_page = page_dict;
        updated_page.set("Resources", Object::Dictionary(resources));
        doc.doc
            .objects
            .insert(page_id, Object::Dictionary(updated_page));

        Ok(())
    }

    fn set_metadata(&self, doc: &mut PdfDoc, metadata: &DocumentMetadata) -> Result<()> {
        let mut info = Dictionary::new();
        if let Some(title) = &metadata.title {
            info.set("Title", Object::string_literal(title.as_str()));
        }
        if let Some(author) = &metadata.author {
            info.set("Author", Object::string_literal(author.as_str()));
        }
        if let Some(subject) = &metadata.subject {
            info.set("Subject", Object::string_literal(subject.as_str()));
        }
        if !metadata.keywords.is_empty() {
            info.set(
                "Keywords",
                Object::string_literal(metadata.keywords.join("; ")),
            );
        }
        if let Some(creator) = &metadata.creator {
            info.set("Creator", Object::string_literal(creator.as_str()));
        }

        if info.is_empty() {
            return Ok(());
        }

        let info_id = doc.doc.add_object(info);
        doc.doc.trailer.set("Info", info_id);
        Ok(())
    }

    fn serialize(&self, mut doc: PdfDoc) -> Result<Vec<u8>> {
        doc.sync_pages();
        let mut bytes = Vec::new();
        doc.doc
            .save_to(&mut bytes)
            .map_err(|err| assembly_err("serialize", err))?;
        Ok(bytes)
    }

    fn load_document(&self, bytes: &[u8]) -> Result<PdfDoc> {
        let doc = Document::load_mem(bytes).map_err(|err| assembly_err("load", err))?;

        let catalog_id = doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|err| assembly_err("document catalog", err))?;
        let pages_id = doc
            .get_dictionary(catalog_id)
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|err| assembly_err("page tree root", err))?;

        let kids: Vec<ObjectId> = doc.get_pages().values().copied().collect();
        log::debug!("loaded document with {} pages", kids.len());

        // Page size from the first page's effective MediaBox; A4 otherwise.
        let (mut width_pt, mut height_pt) = (595.0, 842.0);
        if let Some(first) = kids.first() {
            if let Some(Object::Array(media_box)) = inherited_media_box(&doc, *first) {
                if media_box.len() == 4 {
                    let value = |obj: &Object| match obj {
                        Object::Integer(i) => *i as f32,
                        Object::Real(r) => *r,
                        _ => 0.0,
                    };
                    width_pt = value(&media_box[2]) - value(&media_box[0]);
                    height_pt = value(&media_box[3]) - value(&media_box[1]);
                }
            }
        }

        Ok(PdfDoc {
            doc,
            pages_id,
            kids,
            page_width_pt: width_pt,
            page_height_pt: height_pt,
            image_counter: 0,
        })
    }

    fn page_count(&self, doc: &PdfDoc) -> usize {
        doc.kids.len()
    }

    fn copy_pages(&self, source: &PdfDoc, indices: &[usize]) -> Result<Vec<CopiedPage>> {
        let mut pages = Vec::with_capacity(indices.len());
        for &index in indices {
            let page_id = *source.kids.get(index).ok_or_else(|| {
                PaginateError::Merge(format!(
                    "page index {index} out of range ({} pages)",
                    source.kids.len()
                ))
            })?;
            pages.push(extract_page(&source.doc, page_id)?);
        }
        Ok(pages)
    }

    fn append_pages(&self, target: &mut PdfDoc, pages: Vec<CopiedPage>) -> Result<()> {
        for page in pages {
            let page_id = insert_page(&mut target.doc, target.pages_id, page);
            target.kids.push(page_id);
        }
        target.sync_pages();
        Ok(())
    }
}
