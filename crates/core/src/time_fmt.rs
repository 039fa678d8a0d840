// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared human-readable duration formatting.

/// Format a command duration: `"850ms"`, `"2.4s"`, `"1m5s"`, `"2h3m"`.
///
/// Sub-second durations keep millisecond precision since most probe
/// commands finish well under a second.
pub fn format_duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60_000 {
        let tenths = (ms % 1000) / 100;
        if tenths > 0 {
            format!("{}.{}s", ms / 1000, tenths)
        } else {
            format!("{}s", ms / 1000)
        }
    } else {
        format_elapsed(ms / 1000)
    }
}

/// Format whole seconds as `"5s"`, `"2m"`, `"1m5s"`, `"1h30m"`.
pub fn format_elapsed(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        let m = secs / 60;
        let s = secs % 60;
        if s > 0 {
            format!("{}m{}s", m, s)
        } else {
            format!("{}m", m)
        }
    } else {
        let h = secs / 3600;
        let m = (secs % 3600) / 60;
        if m > 0 {
            format!("{}h{}m", h, m)
        } else {
            format!("{}h", h)
        }
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
