//! Break-point analysis
//!
//! Before capture, the content outline is walked once and every element
//! boundary is classified as a natural, forced, or avoid position. The
//! resulting plan is handed to the rendering engine as structural layout
//! hints and can resolve candidate page-break positions against the nearest
//! acceptable boundary. Resolution is advisory: once the bitmap exists,
//! slicing is fixed-height regardless of what was resolved here.

use crate::constants::{
    DEFAULT_BREAK_TOLERANCE, DEFAULT_HEADING_GAP, PRIORITY_AVOID_HEADING, PRIORITY_AVOID_STYLED,
    PRIORITY_AVOID_TAG, PRIORITY_FORCED_DIRECTIVE, PRIORITY_FORCED_TAG, PRIORITY_NATURAL,
};
use crate::content::ContentNode;

/// Classification of a content position with respect to page breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    /// An ordinary element boundary; breaking here is fine.
    Natural,
    /// A break is required here.
    Forced,
    /// Breaking here would split a non-splittable element or orphan a
    /// heading; never selected during resolution.
    Avoid,
}

/// An annotated position in the content outline.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakPoint {
    /// Depth-first index of the element this position belongs to
    pub node_index: usize,
    /// Offset from the content origin, in page-length units
    pub offset: f32,
    pub kind: BreakKind,
    pub priority: u8,
}

/// Tag lists and thresholds driving the classification.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BreakRules {
    /// Tags that force a page break before themselves
    pub break_before_tags: Vec<String>,
    /// Tags that must not be split across pages
    pub avoid_tags: Vec<String>,
    /// Tags treated as headings for orphan avoidance
    pub heading_tags: Vec<String>,
    /// A heading closer than this to its following sibling is kept with it
    pub heading_gap: f32,
    /// Window searched around a candidate position during resolution
    pub tolerance: f32,
}

impl Default for BreakRules {
    fn default() -> Self {
        Self {
            break_before_tags: Vec::new(),
            avoid_tags: ["table", "img", "image", "pre", "code", "ul", "ol", "figure"]
                .map(String::from)
                .to_vec(),
            heading_tags: ["h1", "h2", "h3", "h4", "h5", "h6"]
                .map(String::from)
                .to_vec(),
            heading_gap: DEFAULT_HEADING_GAP,
            tolerance: DEFAULT_BREAK_TOLERANCE,
        }
    }
}

impl BreakRules {
    fn is_avoid_tag(&self, tag: &str) -> bool {
        self.avoid_tags.iter().any(|t| t == tag)
    }

    fn is_heading(&self, tag: &str) -> bool {
        self.heading_tags.iter().any(|t| t == tag)
    }

    fn is_break_before_tag(&self, tag: &str) -> bool {
        self.break_before_tags.iter().any(|t| t == tag)
    }
}

/// The analyzed break points of one content tree, sorted by offset.
#[derive(Debug, Clone, Default)]
pub struct BreakPlan {
    points: Vec<BreakPoint>,
    tolerance: f32,
}

impl BreakPlan {
    /// Walk the content tree once and classify every element boundary.
    pub fn analyze(root: &ContentNode, rules: &BreakRules) -> Self {
        let mut points = Vec::new();
        let mut index = 0usize;
        // The root represents the whole document; only its subtree is
        // classified.
        walk_children(root, rules, None, &mut index, &mut points);
        points.sort_by(|a, b| a.offset.total_cmp(&b.offset));
        Self {
            points,
            tolerance: rules.tolerance,
        }
    }

    /// All annotated positions, sorted by offset. This is what gets passed
    /// to [`RenderingEngine::apply_break_hints`].
    ///
    /// [`RenderingEngine::apply_break_hints`]: crate::collab::RenderingEngine::apply_break_hints
    pub fn points(&self) -> &[BreakPoint] {
        &self.points
    }

    /// Resolve a candidate page-break position against the plan.
    ///
    /// Searches all points within the tolerance window around `candidate`,
    /// rejects avoid positions, prefers higher priority and then proximity.
    /// Falls back to the raw candidate when nothing within the window is
    /// acceptable, which may split an element (an accepted limitation).
    pub fn resolve(&self, candidate: f32) -> f32 {
        let mut best: Option<&BreakPoint> = None;

        for point in &self.points {
            if (point.offset - candidate).abs() > self.tolerance {
                continue;
            }
            if point.kind == BreakKind::Avoid {
                continue;
            }
            best = match best {
                None => Some(point),
                Some(current) => {
                    let closer = (point.offset - candidate).abs()
                        < (current.offset - candidate).abs();
                    if point.priority > current.priority
                        || (point.priority == current.priority && closer)
                    {
                        Some(point)
                    } else {
                        Some(current)
                    }
                }
            };
        }

        best.map(|p| p.offset).unwrap_or(candidate)
    }

    /// Resolved break positions for the expected page boundaries of content
    /// with the given length. Purely informational ahead of capture.
    pub fn suggested_boundaries(&self, content_length: f32, page_length: f32) -> Vec<f32> {
        if page_length <= 0.0 || content_length <= page_length {
            return Vec::new();
        }
        let pages = (content_length / page_length).ceil() as usize;
        (1..pages)
            .map(|k| self.resolve(k as f32 * page_length))
            .collect()
    }
}

/// Classify `node`'s children in document order.
///
/// `inside_avoid` carries the priority of the nearest enclosing avoid
/// element: boundaries inside such an element are themselves avoid
/// positions, while the element's own top edge stays breakable.
fn walk_children(
    node: &ContentNode,
    rules: &BreakRules,
    inside_avoid: Option<u8>,
    index: &mut usize,
    points: &mut Vec<BreakPoint>,
) {
    let mut previous_close_heading = false;

    for (i, child) in node.children.iter().enumerate() {
        *index += 1;
        let node_index = *index;

        let (kind, priority) = if child.break_before {
            (BreakKind::Forced, PRIORITY_FORCED_DIRECTIVE)
        } else if rules.is_break_before_tag(&child.tag) {
            (BreakKind::Forced, PRIORITY_FORCED_TAG)
        } else if previous_close_heading {
            (BreakKind::Avoid, PRIORITY_AVOID_HEADING)
        } else if let Some(avoid_priority) = inside_avoid {
            (BreakKind::Avoid, avoid_priority)
        } else {
            (BreakKind::Natural, PRIORITY_NATURAL)
        };

        points.push(BreakPoint {
            node_index,
            offset: child.top,
            kind,
            priority,
        });

        if child.break_after {
            points.push(BreakPoint {
                node_index,
                offset: child.bottom(),
                kind: BreakKind::Forced,
                priority: PRIORITY_FORCED_DIRECTIVE,
            });
        }

        // Boundaries inside a non-splittable element inherit its avoidance.
        let child_avoid = if child.keep_together {
            Some(PRIORITY_AVOID_STYLED)
        } else if rules.is_avoid_tag(&child.tag) {
            Some(PRIORITY_AVOID_TAG)
        } else {
            inside_avoid
        };

        walk_children(child, rules, child_avoid, index, points);

        // A heading sitting close to its following sibling must not be
        // orphaned at the bottom of a page: the sibling's top edge becomes
        // an avoid position.
        previous_close_heading = rules.is_heading(&child.tag)
            && node
                .children
                .get(i + 1)
                .is_some_and(|next| next.top - child.bottom() <= rules.heading_gap);
    }
}

// =============================================================================
// Tests
// =============================================================================
