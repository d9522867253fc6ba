//! Command-line front end for `styled-markup`.
//!
//! Reads markup from a file or stdin and prints the resolved fragments or raw
//! segments as JSON, or the plain-text and whitespace-normalized forms.
//!
//! Usage:
//!   styled-markup [OPTIONS] [INPUT]
//!   echo '<p>Hi <b>there</b></p>' | styled-markup --mode plain

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use styled_markup::{
    normalize_whitespace, parse, parse_hex_color, parse_segments, strip_to_plain_text, BaseStyle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Resolved fragments, link targets and accessibility label as JSON.
    Fragments,
    /// Scanner segments as JSON.
    Segments,
    /// Plain text with list markers and paragraph breaks.
    Plain,
    /// Markup after the whitespace pre-pass.
    Normalize,
}

#[derive(Debug, Parser)]
#[command(name = "styled-markup")]
#[command(about = "Render constrained HTML-like markup into styled text runs", version)]
struct Cli {
    /// Markup file; stdin when omitted or `-`.
    input: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Mode::Fragments)]
    mode: Mode,

    #[arg(long, default_value_t = 14.0)]
    font_size: f32,

    /// Accessibility font-size multiplier.
    #[arg(long, default_value_t = 1.0)]
    font_scale: f32,

    /// Cap for `--font-scale`; 0 disables the cap.
    #[arg(long, default_value_t = 0.0)]
    max_font_scale: f32,

    #[arg(long)]
    no_font_scaling: bool,

    #[arg(long, default_value_t = 0.0)]
    line_height: f32,

    #[arg(long, default_value = "")]
    font_weight: String,

    #[arg(long, default_value = "")]
    font_family: String,

    #[arg(long, default_value = "")]
    font_style: String,

    #[arg(long, default_value_t = 0.0)]
    letter_spacing: f32,

    /// Base color as `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa`.
    #[arg(long)]
    color: Option<String>,

    /// File with JSON-like per-tag style overrides.
    #[arg(long)]
    tag_styles: Option<PathBuf>,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: String, source: io::Error },
    #[error("failed to write output: {0}")]
    Write(#[from] io::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid color {0:?}; expected #rgb, #rgba, #rrggbb or #rrggbbaa")]
    InvalidColor(String),
}

impl Cli {
    fn base_style(&self) -> Result<BaseStyle, CliError> {
        let color = match self.color.as_deref() {
            Some(raw) => parse_hex_color(raw).ok_or_else(|| CliError::InvalidColor(raw.to_string()))?,
            None => 0,
        };
        Ok(BaseStyle {
            font_size: self.font_size,
            font_size_multiplier: self.font_scale,
            allow_font_scaling: !self.no_font_scaling,
            max_font_size_multiplier: self.max_font_scale,
            line_height: self.line_height,
            font_weight: self.font_weight.clone(),
            font_family: self.font_family.clone(),
            font_style: self.font_style.clone(),
            letter_spacing: self.letter_spacing,
            color,
        })
    }
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })
}

fn read_input(input: Option<&Path>) -> Result<String, CliError> {
    match input {
        Some(path) if path != Path::new("-") => read_file(path),
        _ => {
            let mut markup = String::new();
            io::stdin()
                .read_to_string(&mut markup)
                .map_err(|source| CliError::Read {
                    path: "<stdin>".to_string(),
                    source,
                })?;
            Ok(markup)
        }
    }
}

fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

fn render(cli: &Cli, markup: &str) -> Result<String, CliError> {
    match cli.mode {
        Mode::Normalize => Ok(normalize_whitespace(markup)),
        Mode::Plain => Ok(strip_to_plain_text(markup)),
        Mode::Segments => to_json(&parse_segments(markup), cli.pretty),
        Mode::Fragments => {
            let base = cli.base_style()?;
            let tag_styles = cli.tag_styles.as_deref().map(read_file).transpose()?;
            to_json(&parse(markup, &base, tag_styles.as_deref()), cli.pretty)
        }
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let markup = read_input(cli.input.as_deref())?;
    let output = render(cli, &markup)?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        stdout.write_all(b"\n")?;
    }
    stdout.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("styled-markup: {err}");
            ExitCode::FAILURE
        }
    }
}
