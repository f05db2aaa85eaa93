//! Pagination, scaling, and batch composition for captured renders.
//!
//! This crate turns a single full-height bitmap (produced by an external
//! rendering engine) into a correctly paginated multi-page document, and
//! composes batches of content items - each scaled to a requested page
//! count - into one merged document with exact page accounting. Rendering
//! and document encoding stay behind the [`RenderingEngine`] and
//! [`DocumentAssembly`] traits; everything in here is slicing math, break
//! analysis, and page bookkeeping.

pub mod collab;
pub mod compose;
pub mod layout;

mod constants;
mod content;
mod options;
mod progress;
mod types;

pub use collab::{DocumentAssembly, RenderingEngine};
pub use compose::{
    CompositionMode, MergeInput, MergedDocument, compose_batch, merge_documents, paginate_single,
    select_mode,
};
pub use constants::{PIXELS_PER_MM, mm_to_px, px_to_mm};
pub use content::{ContentItem, ContentNode};
pub use layout::{
    BreakKind, BreakPlan, BreakPoint, BreakRules, PageGeometry, PageSlice, calculate_geometry,
    slice_plan,
};
pub use options::GenerationOptions;
pub use progress::{CancelToken, GenerationHooks, ProgressEvent, ProgressSender};
pub use types::*;
