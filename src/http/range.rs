//! HTTP Range request parsing module
//!
//! Single-range `bytes=` parsing per RFC 7233. Multi-range requests and
//! non-byte units are ignored and answered with the full representation.

/// A byte range resolved against a concrete representation length.
/// Both bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    /// Number of bytes the range covers
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start + 1
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false // start <= end holds by construction
    }
}

/// Outcome of evaluating a Range header against a representation
#[derive(Debug)]
pub enum RangeParseResult {
    /// Satisfiable range, serve 206
    Valid(ByteRange),
    /// Syntactically valid but unsatisfiable, serve 416
    NotSatisfiable,
    /// Absent, malformed, or unsupported header: serve the full body
    None,
}

/// Parse a Range header value against the total content size.
///
/// Supported forms:
/// - `bytes=start-end`
/// - `bytes=start-` (to end of content)
/// - `bytes=-suffix` (final `suffix` bytes)
///
/// # Examples
/// ```
/// use doorman::http::range::{parse_range_header, RangeParseResult};
///
/// assert!(matches!(parse_range_header(Some("bytes=0-99"), 1000), RangeParseResult::Valid(_)));
/// assert!(matches!(parse_range_header(None, 1000), RangeParseResult::None));
/// ```
pub fn parse_range_header(range_header: Option<&str>, total_size: usize) -> RangeParseResult {
    let Some(spec) = range_header.and_then(|h| h.strip_prefix("bytes=")) else {
        return RangeParseResult::None;
    };

    // Single range only; a multi-range request gets the full body.
    if spec.contains(',') || total_size == 0 {
        return RangeParseResult::None;
    }

    let Some((start_str, end_str)) = spec.split_once('-') else {
        return RangeParseResult::None;
    };
    let (start_str, end_str) = (start_str.trim(), end_str.trim());

    if start_str.is_empty() {
        // Suffix form: "-500" means the final 500 bytes.
        let Ok(suffix) = end_str.parse::<usize>() else {
            return RangeParseResult::None;
        };
        if suffix == 0 {
            return RangeParseResult::NotSatisfiable;
        }
        return RangeParseResult::Valid(ByteRange {
            start: total_size.saturating_sub(suffix),
            end: total_size - 1,
        });
    }

    let Ok(start) = start_str.parse::<usize>() else {
        return RangeParseResult::None;
    };
    if start >= total_size {
        return RangeParseResult::NotSatisfiable;
    }

    let end = if end_str.is_empty() {
        total_size - 1
    } else {
        let Ok(end) = end_str.parse::<usize>() else {
            return RangeParseResult::None;
        };
        if end < start {
            return RangeParseResult::NotSatisfiable;
        }
        end.min(total_size - 1)
    };

    RangeParseResult::Valid(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid(header: &str, size: usize) -> ByteRange {
        match parse_range_header(Some(header), size) {
            RangeParseResult::Valid(r) => r,
            other => panic!("expected Valid, got {other:?}"),
        }
    }

    #[test]
    fn absent_header() {
        assert!(matches!(
            parse_range_header(None, 100),
            RangeParseResult::None
        ));
    }

    #[test]
    fn closed_range() {
        let r = valid("bytes=0-9", 100);
        assert_eq!((r.start, r.end), (0, 9));
        assert_eq!(r.len(), 10);
    }

    #[test]
    fn open_ended_range() {
        let r = valid("bytes=50-", 100);
        assert_eq!((r.start, r.end), (50, 99));
    }

    #[test]
    fn suffix_range() {
        let r = valid("bytes=-20", 100);
        assert_eq!((r.start, r.end), (80, 99));
    }

    #[test]
    fn oversized_suffix_covers_whole_body() {
        let r = valid("bytes=-500", 100);
        assert_eq!((r.start, r.end), (0, 99));
    }

    #[test]
    fn end_clamped_to_size() {
        let r = valid("bytes=90-200", 100);
        assert_eq!((r.start, r.end), (90, 99));
    }

    #[test]
    fn unsatisfiable_start() {
        assert!(matches!(
            parse_range_header(Some("bytes=200-"), 100),
            RangeParseResult::NotSatisfiable
        ));
    }

    #[test]
    fn inverted_bounds() {
        assert!(matches!(
            parse_range_header(Some("bytes=30-10"), 100),
            RangeParseResult::NotSatisfiable
        ));
    }

    #[test]
    fn malformed_or_unsupported() {
        assert!(matches!(
            parse_range_header(Some("bytes=a-b"), 100),
            RangeParseResult::None
        ));
        assert!(matches!(
            parse_range_header(Some("bytes=0-9,20-29"), 100),
            RangeParseResult::None
        ));
        assert!(matches!(
            parse_range_header(Some("items=0-9"), 100),
            RangeParseResult::None
        ));
    }
}
