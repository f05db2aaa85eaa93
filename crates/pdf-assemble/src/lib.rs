//! PDF assembly backend for the pagination engine.
//!
//! Implements [`pdf_paginate::DocumentAssembly`] on `lopdf`: documents are
//! built object by object (page tree, catalog, image XObjects, content
//! streams) and page-level merge operations work on any previously
//! serialized document. One backend covers both halves because merging
//! requires reloading serialized bytes - something a write-only generator
//! cannot do.

mod assembler;
mod image_xobject;
mod pages;

pub use assembler::{PdfAssembler, PdfDoc};
pub use pages::CopiedPage;
