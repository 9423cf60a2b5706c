//! Bounded-window tail reader for the configured log files.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

pub const DEFAULT_LINES: usize = 20;
pub const MAX_LINES: usize = 100;

/// Requested line count from the raw `lines` query value. Missing or
/// non-numeric input falls back to the default; oversized requests clamp.
pub fn clamp_lines(raw: Option<&str>) -> usize {
    raw.and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_LINES)
        .min(MAX_LINES)
}

/// Last `n` lines of the file in original order, newline-joined. Streams the
/// file through a rolling window so memory stays bounded by `n` lines.
pub fn tail_file(path: &Path, n: usize) -> io::Result<String> {
    let file = File::open(path)?;
    let mut window: VecDeque<String> = VecDeque::with_capacity(n + 1);
    for line in BufReader::new(file).lines() {
        window.push_back(line?);
        if window.len() > n {
            window.pop_front();
        }
    }
    Ok(window.into_iter().collect::<Vec<_>>().join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn log_with_lines(count: usize) -> NamedTempFile {
        let mut f = NamedTempFile::new().expect("tempfile");
        for i in 1..=count {
            writeln!(f, "line {i}").unwrap();
        }
        f
    }

    #[test]
    fn tail_returns_last_lines_in_order() {
        let f = log_with_lines(150);
        let out = tail_file(f.path(), 3).unwrap();
        assert_eq!(out, "line 148\nline 149\nline 150");
    }

    #[test]
    fn tail_of_short_file_returns_everything() {
        let f = log_with_lines(2);
        let out = tail_file(f.path(), 100).unwrap();
        assert_eq!(out, "line 1\nline 2");
    }

    #[test]
    fn tail_of_missing_file_is_an_error() {
        assert!(tail_file(Path::new("/nonexistent/agent.log"), 10).is_err());
    }

    #[test]
    fn line_count_defaults_and_clamps() {
        assert_eq!(clamp_lines(None), 20);
        assert_eq!(clamp_lines(Some("50")), 50);
        assert_eq!(clamp_lines(Some("500")), 100);
        assert_eq!(clamp_lines(Some("abc")), 20);
        assert_eq!(clamp_lines(Some("-3")), 20);
        assert_eq!(clamp_lines(Some("0")), 0);
    }
}
