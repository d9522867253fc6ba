//! DHAT heap profiler for styled-markup.
//!
//! Profiles allocation patterns of each pipeline stage:
//! normalize -> segments -> resolve, or all three via `full`.
//!
//! Usage:
//!   cargo run -p styled-markup-heap-profile --release -- [OPTIONS] [MARKUP_FILES...]
//!
//! Outputs dhat-<phase>.json into the output directory (default: target/memory).
//! Open in https://nnethercote.github.io/dh_view/dh_view.html

#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;

use styled_markup::{normalize_whitespace, parse, BaseStyle, SegmentParser, StyleResolver};

const TAG_STYLES: &str = r##"{"b": {"color": "#c00"}, "a": {"textDecorationLine": "none"}}"##;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Phase {
    Normalize,
    Segments,
    Resolve,
    Full,
}

impl Phase {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "normalize" => Some(Self::Normalize),
            "segments" => Some(Self::Segments),
            "resolve" => Some(Self::Resolve),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Normalize => "normalize",
            Self::Segments => "segments",
            Self::Resolve => "resolve",
            Self::Full => "full",
        }
    }
}

/// Mixed-content document used when no files are given.
fn synthetic_markup(paragraphs: usize) -> String {
    let mut markup = String::with_capacity(paragraphs * 220);
    markup.push_str("<h1>Synthetic chapter</h1>\n");
    for i in 0..paragraphs {
        markup.push_str("<p>Paragraph ");
        markup.push_str(&i.to_string());
        markup.push_str(
            " with <b>bold</b>, <i>italic</i> and a <a href=\"https://example.com/\">link</a>; \
             <bdi>\u{645}\u{631}\u{62d}\u{628}\u{627}</bdi> &amp; more.</p>\n",
        );
        if i % 8 == 0 {
            markup.push_str("<ol><li>first</li><li>second<ul><li>nested</li></ul></li></ol>\n");
        }
    }
    markup
}

fn profile_markup(markup: &str, phase: Phase) {
    let base = BaseStyle::default();
    match phase {
        Phase::Normalize => {
            let _normalized = normalize_whitespace(markup);
        }
        Phase::Segments => {
            let normalized = normalize_whitespace(markup);
            let mut count = 0usize;
            SegmentParser::new().parse_with(&normalized, |_| count += 1);
            if count == 0 {
                eprintln!("  warning: no segments produced");
            }
        }
        Phase::Resolve => {
            let segments = SegmentParser::new().parse(&normalize_whitespace(markup));
            let _result = StyleResolver::new(&base)
                .with_tag_styles(TAG_STYLES)
                .resolve(&segments);
        }
        Phase::Full => {
            let _result = parse(markup, &base, Some(TAG_STYLES));
        }
    }
}

fn usage() {
    eprintln!("Usage: heap-profile [OPTIONS] [MARKUP_FILES...]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --phase <normalize|segments|resolve|full>  Stage to profile (default: full)");
    eprintln!("  --out-dir <DIR>                            Output directory (default: target/memory)");
    eprintln!("  --iterations <N>                           Passes over each input (default: 1)");
    eprintln!();
    eprintln!("If no files are given, profiles a synthetic document.");
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut phase = Phase::Full;
    let mut out_dir = PathBuf::from("target/memory");
    let mut iterations = 1usize;
    let mut files: Vec<PathBuf> = Vec::with_capacity(8);

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--phase" | "--out-dir" | "--iterations" if i + 1 >= args.len() => {
                eprintln!("Missing value for {}", args[i]);
                usage();
                std::process::exit(1);
            }
            "--phase" => {
                i += 1;
                phase = Phase::from_str(&args[i]).unwrap_or_else(|| {
                    eprintln!("Unknown phase: {}", args[i]);
                    usage();
                    std::process::exit(1);
                });
            }
            "--out-dir" => {
                i += 1;
                out_dir = PathBuf::from(&args[i]);
            }
            "--iterations" => {
                i += 1;
                iterations = args[i].parse().unwrap_or_else(|_| {
                    eprintln!("Invalid iteration count: {}", args[i]);
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                usage();
                std::process::exit(0);
            }
            other => files.push(PathBuf::from(other)),
        }
        i += 1;
    }

    let mut inputs: Vec<(String, String)> = Vec::with_capacity(files.len().max(1));
    for file in &files {
        match std::fs::read_to_string(file) {
            Ok(markup) => inputs.push((file.display().to_string(), markup)),
            Err(e) => {
                eprintln!("Failed to read {}: {}", file.display(), e);
                std::process::exit(1);
            }
        }
    }
    if inputs.is_empty() {
        inputs.push(("<synthetic>".to_string(), synthetic_markup(400)));
    }

    std::fs::create_dir_all(&out_dir).unwrap_or_else(|e| {
        eprintln!("Failed to create output dir {}: {}", out_dir.display(), e);
        std::process::exit(1);
    });

    let phase_name = phase.name();
    let json_path = out_dir.join(format!("dhat-{phase_name}.json"));
    eprintln!(
        "heap-profile: phase={}, inputs={}, iterations={}, out={}",
        phase_name,
        inputs.len(),
        iterations,
        out_dir.display()
    );
    {
        let _profiler = dhat::Profiler::builder()
            .file_name(json_path.clone())
            .build();
        for (name, markup) in &inputs {
            eprintln!("  profiling: {} ({} bytes)", name, markup.len());
            for _ in 0..iterations {
                profile_markup(markup, phase);
            }
        }
        // _profiler drops here, writes JSON
    }
    eprintln!(
        "Done. Open {} in https://nnethercote.github.io/dh_view/dh_view.html",
        json_path.display()
    );
}
