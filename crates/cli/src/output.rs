//! Terminal output for the catbundle commands.
//!
//! Every status line is a [`Mark`] followed by a message. Outcomes the
//! operator acts on (failures, warnings) go to stderr, the rest to stdout.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

/// Leading symbol of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
  Published,
  Unchanged,
  Failed,
  Warning,
  Note,
}

impl Mark {
  pub fn symbol(self) -> &'static str {
    match self {
      Mark::Published => "✓",
      Mark::Unchanged => "=",
      Mark::Failed => "✗",
      Mark::Warning => "⚠",
      Mark::Note => "•",
    }
  }

  fn to_stderr(self) -> bool {
    matches!(self, Mark::Failed | Mark::Warning)
  }
}

fn emit(mark: Mark, message: &str) {
  let stream = if mark.to_stderr() { Stream::Stderr } else { Stream::Stdout };
  let symbol = mark.symbol();
  let symbol = symbol.if_supports_color(stream, |s| match mark {
    Mark::Published => s.green().to_string(),
    Mark::Unchanged => s.dimmed().to_string(),
    Mark::Failed => s.red().to_string(),
    Mark::Warning => s.yellow().to_string(),
    Mark::Note => s.blue().to_string(),
  });

  if mark.to_stderr() {
    let message = message.if_supports_color(stream, |m| match mark {
      Mark::Failed => m.red().to_string(),
      _ => m.yellow().to_string(),
    });
    eprintln!("{symbol} {message}");
  } else {
    println!("{symbol} {message}");
  }
}

pub fn print_success(message: &str) {
  emit(Mark::Published, message);
}

pub fn print_skipped(message: &str) {
  emit(Mark::Unchanged, message);
}

pub fn print_error(message: &str) {
  emit(Mark::Failed, message);
}

pub fn print_warning(message: &str) {
  emit(Mark::Warning, message);
}

pub fn print_info(message: &str) {
  emit(Mark::Note, message);
}

/// Indented `label: value` row under a status line.
pub fn print_stat(label: &str, value: &str) {
  let label = label.if_supports_color(Stream::Stdout, |l| l.dimmed());
  println!("  {label}: {value}");
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let rendered = serde_json::to_string_pretty(value).context("Failed to render JSON output")?;
  println!("{rendered}");
  Ok(())
}

/// First twelve characters of a fingerprint.
pub fn truncate_hash(hash: &str) -> &str {
  match hash.char_indices().nth(12) {
    Some((end, _)) => &hash[..end],
    None => hash,
  }
}

/// Size in binary units with one decimal, bytes shown exactly.
pub fn format_bytes(bytes: u64) -> String {
  const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];

  if bytes < 1024 {
    return format!("{bytes} B");
  }
  let mut size = bytes as f64 / 1024.0;
  let mut unit = 0;
  while size >= 1024.0 && unit + 1 < UNITS.len() {
    size /= 1024.0;
    unit += 1;
  }
  format!("{size:.1} {}", UNITS[unit])
}

/// Elapsed time of a rebuild: milliseconds under a second, then seconds,
/// then minutes.
pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  match secs {
    0 => format!("{}ms", duration.subsec_millis()),
    1..60 => format!("{:.2}s", duration.as_secs_f64()),
    _ => format!("{}m {}s", secs / 60, secs % 60),
  }
}
