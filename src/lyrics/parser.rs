//! LRC format parser
//!
//! Parses synchronized lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [00:12.34] Hello world
//! [00:15:00] Another line
//!
//! Only the first timestamp tag on a line is honoured; anything after it,
//! further tags included, is the line's text. Lines without a tag
//! (metadata such as `[ti:Title]`, blank lines, prose) are dropped.

use super::LyricsLine;

/// Parse an LRC document into lines sorted by timestamp.
///
/// Never fails: unparsable lines are skipped, so a document with no
/// valid tags yields an empty vector.
pub fn parse(content: &str) -> Vec<LyricsLine> {
    let mut lines = Vec::new();

    // A bare `\r` ends a line too; the empty pieces `\r\n` leaves behind carry no tag.
    for (lineno, raw) in content.split(['\r', '\n']).enumerate() {
        match parse_timed_line(raw) {
            Some(Ok((secs, text))) => lines.push(LyricsLine::new(secs, text)),
            Some(Err(field)) => {
                tracing::debug!(line = lineno + 1, field, "skipping lrc line with bad timestamp");
            }
            None => {}
        }
    }

    // Source files are not always chronological. `sort_by` is stable, so
    // lines sharing a timestamp keep their document order.
    lines.sort_by(|a, b| a.timestamp_secs.total_cmp(&b.timestamp_secs));
    lines
}

/// Find the first `[m:s.f]` / `[m:s:f]` tag in `line`.
///
/// Returns `None` when no tag shape is present, `Some(Err(field))` when a
/// tag is present but one of its numbers does not fit.
fn parse_timed_line(line: &str) -> Option<Result<(f64, &str), &'static str>> {
    for (start, _) in line.match_indices('[') {
        if let Some((tag, rest)) = split_tag(&line[start + 1..]) {
            return Some(tag.seconds().map(|secs| (secs, rest.trim())));
        }
    }
    None
}

struct Tag<'a> {
    minutes: &'a str,
    seconds: &'a str,
    fraction: &'a str,
}

impl Tag<'_> {
    /// `minutes*60 + seconds + fraction/100`. The fraction is always read as
    /// hundredths, whatever its digit count.
    fn seconds(&self) -> Result<f64, &'static str> {
        let minutes: u64 = self.minutes.parse().map_err(|_| "minutes")?;
        let seconds: u64 = self.seconds.parse().map_err(|_| "seconds")?;
        let fraction: u64 = self.fraction.parse().map_err(|_| "fraction")?;
        Ok(minutes as f64 * 60.0 + seconds as f64 + fraction as f64 / 100.0)
    }
}

/// Match `digits ':' digits ('.'|':') digits ']'` at the start of `s`
/// (just past the opening bracket) and return the tag plus the remainder.
fn split_tag(s: &str) -> Option<(Tag<'_>, &str)> {
    let (minutes, rest) = take_digits(s)?;
    let rest = rest.strip_prefix(':')?;
    let (seconds, rest) = take_digits(rest)?;
    let rest = rest.strip_prefix(['.', ':'])?;
    let (fraction, rest) = take_digits(rest)?;
    let rest = rest.strip_prefix(']')?;
    Some((
        Tag {
            minutes,
            seconds,
            fraction,
        },
        rest,
    ))
}

fn take_digits(s: &str) -> Option<(&str, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    Some(s.split_at(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn times(lines: &[LyricsLine]) -> Vec<f64> {
        lines.iter().map(|l| l.timestamp_secs).collect()
    }

    fn texts(lines: &[LyricsLine]) -> Vec<&str> {
        lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_parse_out_of_order() {
        let lines = parse("[01:02.50]second\n[00:00.00]first");
        assert_eq!(times(&lines), [0.0, 62.5]);
        assert_eq!(texts(&lines), ["first", "second"]);
    }

    #[test]
    fn test_colon_fraction_separator() {
        let lines = parse("[00:12:34]colon");
        assert_eq!(lines.len(), 1);
        assert!((lines[0].timestamp_secs - 12.34).abs() < 1e-9);
    }

    #[test]
    fn test_fraction_always_hundredths() {
        // ".500" reads as 5.00s and ".5" as 0.05s
        let lines = parse("[00:01.500]a\n[00:01.5]b");
        assert!((lines[0].timestamp_secs - 1.05).abs() < 1e-9);
        assert!((lines[1].timestamp_secs - 6.0).abs() < 1e-9);
        assert_eq!(texts(&lines), ["b", "a"]);
    }

    #[test]
    fn test_parse_lrc() {
        let lrc = r#"
[ti:Test Song]
[ar:Test Artist]
[00:12.34]  First line
not a lyric
[00:15.00]Second line
[00:20.00]
"#;
        let lines = parse(lrc);
        assert_eq!(lines.len(), 3);
        assert!((lines[0].timestamp_secs - 12.34).abs() < 1e-9);
        assert_eq!(texts(&lines), ["First line", "Second line", ""]);
    }

    #[test]
    fn test_carriage_return_line_endings() {
        let lines = parse("[00:01.00]a\r[00:02.00]b\r\n[00:03.00]c\n");
        assert_eq!(times(&lines), [1.0, 2.0, 3.0]);
        assert_eq!(texts(&lines), ["a", "b", "c"]);
    }

    #[test]
    fn test_ties_keep_document_order() {
        let lines = parse("[00:05.00]b\n[00:01.00]a\n[00:05.00]c\n[00:05.00]d");
        assert_eq!(texts(&lines), ["a", "b", "c", "d"]);
    }

    #[test]
    fn test_only_first_tag_counts() {
        let lines = parse("[00:01.00][00:02.00]chorus");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "[00:02.00]chorus");
    }

    #[test]
    fn test_overflowing_field_skips_line() {
        let lines = parse("[99999999999999999999999:00.00]huge\n[00:03.00]ok");
        assert_eq!(texts(&lines), ["ok"]);
    }

    #[test]
    fn test_unparsable_document_is_empty() {
        assert!(parse("just some words\n[xx:yy.zz]nope\n[1:2]short").is_empty());
        assert!(parse("").is_empty());
    }
}
