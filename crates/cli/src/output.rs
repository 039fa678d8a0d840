// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use clap::ValueEnum;
use serde::Serialize;

use crate::exit_error::ExitError;

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print captured command output as-is, closing an unterminated last line.
pub fn print_captured(text: &str) {
    if text.is_empty() {
        return;
    }
    print!("{}", text);
    if !text.ends_with('\n') {
        println!();
    }
}

/// Exit error for a failed report: the classified message, then the raw
/// diagnostic when it adds something.
pub fn failure(message: &str, raw: Option<&str>) -> ExitError {
    let raw = raw.map(str::trim).filter(|r| !r.is_empty() && *r != message);
    match raw {
        Some(raw) => ExitError::new(1, format!("{}\n\nDetails:\n    {}", message, indent(raw))),
        None => ExitError::new(1, message),
    }
}

fn indent(text: &str) -> String {
    text.lines().collect::<Vec<_>>().join("\n    ")
}

/// Format a timestamp as relative time (e.g., "5s", "2m", "1h", "3d")
pub fn format_time_ago(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    cg_core::format_elapsed(now_ms.saturating_sub(epoch_ms) / 1000)
}

/// Cut `s` to `max` characters, marking the cut with "..."
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Display log content with optional follow mode, handling text/json output.
pub async fn display_log(
    log_path: &std::path::Path,
    content: &str,
    follow: bool,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            if content.is_empty() {
                eprintln!("No log entries in {}", log_path.display());
                if !follow {
                    return Ok(());
                }
            } else {
                print_captured(content);
            }
            if follow {
                tail_file(log_path).await?;
            }
        }
        OutputFormat::Json => {
            let obj = serde_json::json!({
                "log_path": log_path.to_string_lossy(),
                "lines": content.lines().collect::<Vec<_>>(),
            });
            print_json(&obj)?;
            if follow {
                eprintln!("warning: --follow is not supported with --output json");
            }
        }
    }
    Ok(())
}

/// Tail a file, printing new lines as they appear, until ctrl-c.
pub async fn tail_file(path: &std::path::Path) -> anyhow::Result<()> {
    use notify::{Event, EventKind, RecursiveMode, Watcher};
    use std::io::{BufRead, BufReader, Seek, SeekFrom};

    let mut file = std::fs::File::open(path)
        .map_err(|_| anyhow::anyhow!("Log file not found: {}", path.display()))?;
    // The tail was already printed
    file.seek(SeekFrom::End(0))?;
    let mut reader = BufReader::new(file);

    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if matches!(event.kind, EventKind::Modify(_)) {
                let _ = tx.blocking_send(());
            }
        }
    })?;
    let watch_dir = path.parent().unwrap_or(path);
    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        let mut line = String::new();
        while reader.read_line(&mut line)? > 0 {
            print!("{}", line);
            line.clear();
        }

        tokio::select! {
            _ = rx.recv() => {}
            _ = &mut ctrl_c => break,
        }
    }

    Ok(())
}
