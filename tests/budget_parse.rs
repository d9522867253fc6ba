mod common;

use common::budget_alloc::BudgetAlloc;
use common::fixtures::{article, TAG_STYLES};
use styled_markup::{normalize_whitespace, parse, BaseStyle, SegmentParser};

// A 200-paragraph article (~50KiB of markup) peaks well under 2MiB through
// the full pipeline. Streaming segments only needs the normalized copy plus
// one segment at a time.
const FULL_PARSE_BUDGET_BYTES: usize = 4 * 1024 * 1024;
const STREAMING_BUDGET_BYTES: usize = 512 * 1024;

#[global_allocator]
static ALLOC: BudgetAlloc = BudgetAlloc::new();

#[test]
fn parse_stays_within_heap_budget() {
    let markup = article(200);
    let base = BaseStyle::default();

    let (result, full) = ALLOC.measure(|| parse(&markup, &base, Some(TAG_STYLES)));
    assert!(!result.is_empty(), "article should produce fragments");
    assert!(
        full.peak_bytes <= FULL_PARSE_BUDGET_BYTES,
        "full parse peak {} bytes exceeds budget {} bytes",
        full.peak_bytes,
        FULL_PARSE_BUDGET_BYTES
    );
    println!(
        "full parse: input_kib={} peak_kib={} allocs={}",
        markup.len() / 1024,
        full.peak_kib(),
        full.allocations
    );
    drop(result);

    let (count, streaming) = ALLOC.measure(|| {
        let normalized = normalize_whitespace(&markup);
        let mut count = 0usize;
        SegmentParser::new().parse_with(&normalized, |_| count += 1);
        count
    });
    assert!(count > 0, "article should produce segments");
    assert!(
        streaming.peak_bytes <= STREAMING_BUDGET_BYTES,
        "streaming peak {} bytes exceeds budget {} bytes",
        streaming.peak_bytes,
        STREAMING_BUDGET_BYTES
    );
    assert!(
        streaming.peak_bytes < full.peak_bytes,
        "streaming should peak below the collected parse"
    );
    println!(
        "streaming: segments={} peak_kib={} allocs={} retained={}",
        count,
        streaming.peak_kib(),
        streaming.allocations,
        streaming.retained_bytes
    );
}
