//! Prepared content trees handed to the engine.
//!
//! A [`ContentNode`] is the minimal layout outline of rendered content: each
//! node carries its tag, its resolved vertical extent in page-length units,
//! and the break-relevant style flags. Callers build this outline from
//! whatever DOM their rendering engine uses; the break analyzer walks it
//! without knowing anything about the real document model.

/// One element in the prepared content outline.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentNode {
    /// Element name, lowercase ("table", "h2", "p", ...)
    pub tag: String,
    /// Offset of the element's top edge from the content origin
    pub top: f32,
    /// Resolved height of the element including its children
    pub height: f32,
    /// Explicit page-break directive before this element
    pub break_before: bool,
    /// Explicit page-break directive after this element
    pub break_after: bool,
    /// Computed style marks this element non-splittable
    pub keep_together: bool,
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    pub fn new(tag: impl Into<String>, top: f32, height: f32) -> Self {
        Self {
            tag: tag.into(),
            top,
            height,
            ..Self::default()
        }
    }

    /// Offset of the element's bottom edge from the content origin
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn with_children(mut self, children: Vec<ContentNode>) -> Self {
        self.children = children;
        self
    }

    pub fn with_break_before(mut self) -> Self {
        self.break_before = true;
        self
    }

    pub fn with_break_after(mut self) -> Self {
        self.break_after = true;
        self
    }

    pub fn with_keep_together(mut self) -> Self {
        self.keep_together = true;
        self
    }

    /// Shift this subtree vertically. Used when concatenating several items
    /// into one combined tree.
    pub fn shift(&mut self, delta: f32) {
        self.top += delta;
        for child in &mut self.children {
            child.shift(delta);
        }
    }

    /// Number of nodes in this subtree, root included.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(ContentNode::node_count)
            .sum::<usize>()
    }
}

/// One content item in a batch request.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub content: ContentNode,
    /// Number of output pages this item should be scaled to occupy (≥ 1)
    pub target_page_count: u32,
    pub title: Option<String>,
    /// Tri-state page-break preference: `Some(true)` forces a fresh page,
    /// `Some(false)` allows sharing, `None` leaves the decision to the batch.
    pub force_new_page: Option<bool>,
}

impl ContentItem {
    pub fn new(content: ContentNode, target_page_count: u32) -> Self {
        Self {
            content,
            target_page_count,
            title: None,
            force_new_page: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_force_new_page(mut self, force: bool) -> Self {
        self.force_new_page = Some(force);
        self
    }
}
