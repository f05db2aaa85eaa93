mod common;

use common::{MockAssembly, MockRenderer, paragraphs};
use pdf_paginate::{
    CompositionMode, ContentItem, GenerationHooks, GenerationOptions, MergeInput, PaginateError,
    ProgressEvent, calculate_geometry, compose_batch, merge_documents, paginate_single,
    select_mode, BatchItemResult,
};

fn options() -> GenerationOptions {
    GenerationOptions::default()
}

fn item_stub(title: &str) -> BatchItemResult {
    BatchItemResult {
        title: Some(title.to_string()),
        start_page: 0,
        end_page: 0,
        page_count: 0,
        scale_factor: 1.0,
        merged: true,
    }
}

// =============================================================================
// Single-document pagination
// =============================================================================

#[tokio::test]
async fn short_content_yields_one_page() {
    let mut renderer = MockRenderer::new();
    let result = paginate_single(
        &mut renderer,
        &MockAssembly,
        paragraphs(200.0),
        &options(),
        &GenerationHooks::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.page_count, 1);
    assert_eq!(result.bytes, b"mockdoc:1");
    assert_eq!(result.byte_size, result.bytes.len());
}

#[tokio::test]
async fn long_content_paginates_by_ceil() {
    let mut renderer = MockRenderer::new();
    // 600mm of content on 277mm usable pages -> 3 pages.
    let result = paginate_single(
        &mut renderer,
        &MockAssembly,
        paragraphs(600.0),
        &options(),
        &GenerationHooks::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.page_count, 3);
    assert_eq!(result.bytes, b"mockdoc:3");
}

#[tokio::test]
async fn zero_height_capture_is_empty_content() {
    let mut renderer = MockRenderer::new();
    let result = paginate_single(
        &mut renderer,
        &MockAssembly,
        paragraphs(0.0),
        &options(),
        &GenerationHooks::default(),
    )
    .await;

    assert!(matches!(result, Err(PaginateError::EmptyContent)));
}

#[tokio::test]
async fn break_hints_reach_the_renderer() {
    let mut renderer = MockRenderer::new();
    paginate_single(
        &mut renderer,
        &MockAssembly,
        paragraphs(300.0),
        &options(),
        &GenerationHooks::default(),
    )
    .await
    .unwrap();

    // One hint per paragraph boundary.
    assert_eq!(renderer.hints_seen, vec![6]);
}

#[tokio::test]
async fn invalid_quality_fails_before_capture() {
    let mut renderer = MockRenderer::new();
    let mut opts = options();
    opts.image_quality = 0;

    let result = paginate_single(
        &mut renderer,
        &MockAssembly,
        paragraphs(100.0),
        &opts,
        &GenerationHooks::default(),
    )
    .await;

    assert!(matches!(result, Err(PaginateError::Config(_))));
    assert_eq!(renderer.captures, 0);
}

// =============================================================================
// Mode Selection
// =============================================================================

#[test]
fn combined_requires_unanimous_opt_in() {
    let all_false: Vec<ContentItem> = (0..3)
        .map(|_| ContentItem::new(paragraphs(100.0), 1).with_force_new_page(false))
        .collect();
    assert_eq!(select_mode(&all_false), CompositionMode::Combined);

    let mixed = vec![
        ContentItem::new(paragraphs(100.0), 1).with_force_new_page(false),
        ContentItem::new(paragraphs(100.0), 1),
    ];
    assert_eq!(select_mode(&mixed), CompositionMode::Separate);

    let forced = vec![ContentItem::new(paragraphs(100.0), 1).with_force_new_page(true)];
    assert_eq!(select_mode(&forced), CompositionMode::Separate);

    assert_eq!(select_mode(&[]), CompositionMode::Separate);
}

// =============================================================================
// Batch Composition - Separate Mode
// =============================================================================

#[tokio::test]
async fn item_scales_to_its_target_page_count() {
    let mut renderer = MockRenderer::new();
    // Natural length 400mm, target 2 pages, usable height 277mm:
    // scale = 554 / 400 = 1.385.
    let items = vec![ContentItem::new(paragraphs(400.0), 2).with_title("report")];

    let result = compose_batch(
        &mut renderer,
        &MockAssembly,
        items,
        &options(),
        &GenerationHooks::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.total_pages, 2);
    let item = &result.items[0];
    assert!(item.merged);
    assert_eq!((item.start_page, item.end_page, item.page_count), (1, 2, 2));
    assert!(
        (item.scale_factor - 1.385).abs() < 0.005,
        "scale {}",
        item.scale_factor
    );
}

#[tokio::test]
async fn compression_scales_below_one() {
    let mut renderer = MockRenderer::new();
    // 600mm of content forced onto a single page.
    let items = vec![ContentItem::new(paragraphs(600.0), 1)];

    let result = compose_batch(
        &mut renderer,
        &MockAssembly,
        items,
        &options(),
        &GenerationHooks::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.total_pages, 1);
    assert!(result.items[0].scale_factor < 1.0);
}

#[tokio::test]
async fn page_ranges_are_contiguous_across_items() {
    let mut renderer = MockRenderer::new();
    let items = vec![
        ContentItem::new(paragraphs(300.0), 2).with_title("first"),
        ContentItem::new(paragraphs(150.0), 1).with_title("second"),
        ContentItem::new(paragraphs(500.0), 3).with_title("third"),
    ];

    let result = compose_batch(
        &mut renderer,
        &MockAssembly,
        items,
        &options(),
        &GenerationHooks::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.total_pages, 6);
    assert_eq!(result.bytes, b"mockdoc:6");

    let ranges: Vec<(usize, usize)> = result
        .items
        .iter()
        .map(|i| (i.start_page, i.end_page))
        .collect();
    assert_eq!(ranges, vec![(1, 2), (3, 3), (4, 6)]);

    // Accounting invariants.
    let page_sum: usize = result.items.iter().map(|i| i.page_count).sum();
    assert_eq!(page_sum, result.total_pages);
    for pair in result.items.windows(2) {
        assert_eq!(pair[0].end_page + 1, pair[1].start_page);
    }
}

#[tokio::test]
async fn failed_capture_skips_item_without_sinking_batch() {
    let mut renderer = MockRenderer::failing_on(1);
    let items = vec![
        ContentItem::new(paragraphs(100.0), 1).with_title("ok"),
        ContentItem::new(paragraphs(100.0), 2).with_title("broken"),
        ContentItem::new(paragraphs(100.0), 1).with_title("also ok"),
    ];

    let result = compose_batch(
        &mut renderer,
        &MockAssembly,
        items,
        &options(),
        &GenerationHooks::default(),
    )
    .await
    .unwrap();

    assert_eq!(result.total_pages, 2);
    assert!(result.items[0].merged);
    assert!(!result.items[1].merged);
    assert_eq!(result.items[1].page_count, 0);
    assert_eq!(result.items[1].start_page, 0);
    assert!(result.items[2].merged);

    // Merged items stay contiguous around the hole.
    assert_eq!(
        (result.items[0].start_page, result.items[0].end_page),
        (1, 1)
    );
    assert_eq!(
        (result.items[2].start_page, result.items[2].end_page),
        (2, 2)
    );
}

#[tokio::test]
async fn zero_target_page_count_aborts_the_batch() {
    let mut renderer = MockRenderer::new();
    let items = vec![ContentItem::new(paragraphs(100.0), 0)];

    let result = compose_batch(
        &mut renderer,
        &MockAssembly,
        items,
        &options(),
        &GenerationHooks::default(),
    )
    .await;

    assert!(matches!(result, Err(PaginateError::Config(_))));
    assert_eq!(renderer.captures, 0);
}

#[tokio::test]
async fn empty_batch_is_rejected() {
    let mut renderer = MockRenderer::new();
    let result = compose_batch(
        &mut renderer,
        &MockAssembly,
        Vec::new(),
        &options(),
        &GenerationHooks::default(),
    )
    .await;

    assert!(matches!(result, Err(PaginateError::Config(_))));
}

// =============================================================================
// Batch Composition - Combined Mode
// =============================================================================

#[tokio::test]
async fn combined_mode_captures_once() {
    let mut renderer = MockRenderer::new();
    let items = vec![
        ContentItem::new(paragraphs(100.0), 1)
            .with_title("a")
            .with_force_new_page(false),
        ContentItem::new(paragraphs(200.0), 2)
            .with_title("b")
            .with_force_new_page(false),
    ];

    let result = compose_batch(
        &mut renderer,
        &MockAssembly,
        items,
        &options(),
        &GenerationHooks::default(),
    )
    .await
    .unwrap();

    assert_eq!(renderer.captures, 1);
    assert_eq!(result.total_pages, 3);

    // Ranges are estimates from the requested counts.
    assert_eq!(
        (result.items[0].start_page, result.items[0].end_page),
        (1, 1)
    );
    assert_eq!(
        (result.items[1].start_page, result.items[1].end_page),
        (2, 3)
    );
    assert!(result.items.iter().all(|i| i.merged));
}

#[tokio::test]
async fn combined_mode_capture_failure_aborts() {
    let mut renderer = MockRenderer::failing_on(0);
    let items = vec![
        ContentItem::new(paragraphs(100.0), 1).with_force_new_page(false),
        ContentItem::new(paragraphs(100.0), 1).with_force_new_page(false),
    ];

    let result = compose_batch(
        &mut renderer,
        &MockAssembly,
        items,
        &options(),
        &GenerationHooks::default(),
    )
    .await;

    assert!(matches!(result, Err(PaginateError::Capture(_))));
}

#[tokio::test]
async fn separate_mode_captures_each_item() {
    let mut renderer = MockRenderer::new();
    let items = vec![
        ContentItem::new(paragraphs(100.0), 1).with_force_new_page(true),
        ContentItem::new(paragraphs(100.0), 1).with_force_new_page(true),
        ContentItem::new(paragraphs(100.0), 1).with_force_new_page(true),
    ];

    let result = compose_batch(
        &mut renderer,
        &MockAssembly,
        items,
        &options(),
        &GenerationHooks::default(),
    )
    .await
    .unwrap();

    assert_eq!(renderer.captures, 3);
    assert_eq!(result.total_pages, 3);
}

// =============================================================================
// Cancellation & Progress
// =============================================================================

#[tokio::test]
async fn cancelled_token_stops_the_request() {
    let mut renderer = MockRenderer::new();
    let hooks = GenerationHooks::default();
    hooks.cancel.cancel();

    let result = compose_batch(
        &mut renderer,
        &MockAssembly,
        vec![ContentItem::new(paragraphs(100.0), 1)],
        &options(),
        &hooks,
    )
    .await;

    assert!(matches!(result, Err(PaginateError::Cancelled)));
    assert_eq!(renderer.captures, 0);
}

#[tokio::test]
async fn progress_events_track_the_batch() {
    let (hooks, mut rx) = GenerationHooks::with_progress();
    let mut renderer = MockRenderer::new();
    let items = vec![
        ContentItem::new(paragraphs(100.0), 1).with_title("a"),
        ContentItem::new(paragraphs(100.0), 2).with_title("b"),
    ];

    compose_batch(&mut renderer, &MockAssembly, items, &options(), &hooks)
        .await
        .unwrap();
    drop(hooks);

    let mut started = 0;
    let mut completed_items = 0;
    let mut pages_rendered = 0;
    let mut merge_started = 0;
    let mut completed = 0;
    while let Ok(event) = rx.try_recv() {
        match event {
            ProgressEvent::ItemStarted { .. } => started += 1,
            ProgressEvent::ItemCompleted { .. } => completed_items += 1,
            ProgressEvent::PageRendered { .. } => pages_rendered += 1,
            ProgressEvent::MergeStarted { documents } => {
                merge_started += 1;
                assert_eq!(documents, 2);
            }
            ProgressEvent::Completed { total_pages } => {
                completed += 1;
                assert_eq!(total_pages, 3);
            }
            ProgressEvent::ItemSkipped { .. } => panic!("nothing should be skipped"),
        }
    }

    assert_eq!(started, 2);
    assert_eq!(completed_items, 2);
    assert_eq!(pages_rendered, 3);
    assert_eq!(merge_started, 1);
    assert_eq!(completed, 1);
}

// =============================================================================
// Merger
// =============================================================================

#[test]
fn merge_backfills_page_ranges() {
    let geometry = calculate_geometry(
        options().paper_size,
        options().orientation,
        &options().margins,
    )
    .unwrap();

    let inputs = vec![
        MergeInput {
            bytes: Some(b"mockdoc:2".to_vec()),
            item: item_stub("a"),
        },
        MergeInput {
            bytes: Some(b"mockdoc:1".to_vec()),
            item: item_stub("b"),
        },
        MergeInput {
            bytes: Some(b"mockdoc:3".to_vec()),
            item: item_stub("c"),
        },
    ];

    let merged = merge_documents(
        &MockAssembly,
        &geometry,
        &options().metadata,
        inputs,
    )
    .unwrap();

    assert_eq!(merged.total_pages, 6);
    assert_eq!(merged.bytes, b"mockdoc:6");

    let ranges: Vec<(usize, usize, usize)> = merged
        .items
        .iter()
        .map(|i| (i.start_page, i.end_page, i.page_count))
        .collect();
    assert_eq!(ranges, vec![(1, 2, 2), (3, 3, 1), (4, 6, 3)]);

    let sum: usize = merged.items.iter().map(|i| i.page_count).sum();
    assert_eq!(sum, merged.total_pages);
}

#[test]
fn unreadable_document_is_flagged_not_guessed() {
    let geometry = calculate_geometry(
        options().paper_size,
        options().orientation,
        &options().margins,
    )
    .unwrap();

    let inputs = vec![
        MergeInput {
            bytes: Some(b"mockdoc:2".to_vec()),
            item: item_stub("good"),
        },
        MergeInput {
            bytes: Some(b"\xff\xfenot a document".to_vec()),
            item: item_stub("corrupt"),
        },
        MergeInput {
            bytes: Some(b"mockdoc:1".to_vec()),
            item: item_stub("also good"),
        },
    ];

    let merged = merge_documents(
        &MockAssembly,
        &geometry,
        &options().metadata,
        inputs,
    )
    .unwrap();

    assert_eq!(merged.total_pages, 3);
    assert!(!merged.items[1].merged);
    assert_eq!(merged.items[1].page_count, 0);
    assert_eq!(merged.items[0].end_page + 1, merged.items[2].start_page);
}
