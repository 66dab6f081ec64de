//! Text position utilities for byte offsets, line:column positions and excerpts.
//!
//! ## Coordinate Conventions
//!
//! - Lines and columns are **1-indexed** (matching editor conventions)
//! - Byte offsets are **0-indexed**
//! - Columns count bytes, matching the byte offsets used by insertion patches

/// Maximum number of bytes shown in an audit excerpt.
pub const EXCERPT_LEN: usize = 16;

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds content length, returns position at end of content.
pub fn byte_offset_to_position(content: &[u8], offset: usize) -> (u32, u32) {
    let offset = offset.min(content.len());
    let mut line = 1u32;
    let mut col = 1u32;

    for &byte in &content[..offset] {
        if byte == b'\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }

    (line, col)
}

/// Byte range `[start, end)` of the line containing `offset`, excluding the newline.
pub fn line_bounds(content: &[u8], offset: usize) -> (usize, usize) {
    let offset = offset.min(content.len());
    let start = content[..offset]
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|p| p + 1)
        .unwrap_or(0);
    let end = content[offset..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| offset + p)
        .unwrap_or(content.len());
    (start, end)
}

/// Short excerpt of the text starting at `offset`, stopping at the first newline.
///
/// At most [`EXCERPT_LEN`] bytes are taken; invalid UTF-8 is replaced lossily.
pub fn excerpt(content: &[u8], offset: usize) -> String {
    if offset >= content.len() {
        return String::new();
    }
    let tail = &content[offset..];
    let limit = tail.len().min(EXCERPT_LEN);
    let end = tail[..limit]
        .iter()
        .position(|&b| b == b'\n')
        .unwrap_or(limit);
    String::from_utf8_lossy(&tail[..end]).into_owned()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod position_tests {
        use super::*;

        #[test]
        fn offset_to_position_simple() {
            let content = b"line1\nline2\nline3\n";
            assert_eq!(byte_offset_to_position(content, 0), (1, 1));
            assert_eq!(byte_offset_to_position(content, 4), (1, 5));
            assert_eq!(byte_offset_to_position(content, 5), (1, 6)); // newline char
            assert_eq!(byte_offset_to_position(content, 6), (2, 1));
            assert_eq!(byte_offset_to_position(content, 12), (3, 1));
        }

        #[test]
        fn offset_beyond_content() {
            let content = b"short";
            assert_eq!(byte_offset_to_position(content, 100), (1, 6));
        }

        #[test]
        fn empty_content() {
            assert_eq!(byte_offset_to_position(b"", 0), (1, 1));
        }
    }

    mod line_tests {
        use super::*;

        #[test]
        fn bounds_of_middle_line() {
            let content = b"int a;\nvoid f() { g(); }\nint b;\n";
            let offset = content.iter().position(|&b| b == b'g').unwrap();
            let (start, end) = line_bounds(content, offset);
            assert_eq!(&content[start..end], b"void f() { g(); }");
        }

        #[test]
        fn bounds_of_last_line_without_newline() {
            let content = b"a\nbc";
            assert_eq!(line_bounds(content, 3), (2, 4));
        }
    }

    mod excerpt_tests {
        use super::*;

        #[test]
        fn excerpt_is_capped() {
            let content = b"a_really_long_identifier_name();";
            assert_eq!(excerpt(content, 0), "a_really_long_id");
        }

        #[test]
        fn excerpt_stops_at_newline() {
            let content = b"g();\nh();";
            assert_eq!(excerpt(content, 0), "g();");
        }

        #[test]
        fn excerpt_past_end_is_empty() {
            assert_eq!(excerpt(b"abc", 3), "");
            assert_eq!(excerpt(b"abc", 10), "");
        }
    }
}
