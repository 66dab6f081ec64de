//! Unified diff generation utilities.
//!
//! Insertions never add or remove lines, so each edited line becomes a
//! one-line hunk. Several insertions on the same line share a hunk.

use crate::patch::FilePatch;
use crate::text::{byte_offset_to_position, line_bounds};

/// Generate a unified diff for one file patch against the original content.
///
/// Edits past the end of the content are ignored; callers only diff patches
/// that applied cleanly.
pub fn generate_unified_diff(patch: &FilePatch, original: &[u8]) -> String {
    let edits: Vec<_> = patch
        .sorted_edits()
        .into_iter()
        .filter(|e| e.offset as usize <= original.len())
        .collect();
    if edits.is_empty() {
        return String::new();
    }

    let mut diff = String::new();
    diff.push_str(&format!("--- a/{}\n", patch.path));
    diff.push_str(&format!("+++ b/{}\n", patch.path));

    let mut i = 0;
    while i < edits.len() {
        let (start, end) = line_bounds(original, edits[i].offset as usize);
        let (line, _) = byte_offset_to_position(original, start);

        let mut new_line = Vec::with_capacity(end - start);
        let mut cursor = start;
        while i < edits.len() && (edits[i].offset as usize) <= end {
            let at = edits[i].offset as usize;
            new_line.extend_from_slice(&original[cursor..at]);
            new_line.extend_from_slice(edits[i].text.as_bytes());
            cursor = at;
            i += 1;
        }
        new_line.extend_from_slice(&original[cursor..end]);

        diff.push_str(&format!("@@ -{},1 +{},1 @@\n", line, line));
        diff.push_str(&format!(
            "-{}\n",
            String::from_utf8_lossy(&original[start..end])
        ));
        diff.push_str(&format!("+{}\n", String::from_utf8_lossy(&new_line)));
    }

    diff
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::InsertEdit;

    #[test]
    fn single_edit_produces_one_hunk() {
        let original = b"int a;\nvoid h() { g(); }\n";
        let mut patch = FilePatch::new("main.cpp");
        patch.add(InsertEdit::new(18, "Foo::"));

        let diff = generate_unified_diff(&patch, original);

        assert!(diff.contains("--- a/main.cpp"));
        assert!(diff.contains("+++ b/main.cpp"));
        assert!(diff.contains("@@ -2,1 +2,1 @@"));
        assert!(diff.contains("-void h() { g(); }"));
        assert!(diff.contains("+void h() { Foo::g(); }"));
    }

    #[test]
    fn edits_on_same_line_share_a_hunk() {
        let original = b"void h() { g(); T t; }\n";
        let mut patch = FilePatch::new("main.cpp");
        patch.add(InsertEdit::new(16, "Foo::"));
        patch.add(InsertEdit::new(11, "Foo::"));

        let diff = generate_unified_diff(&patch, original);

        assert_eq!(diff.matches("@@").count(), 2); // one header = two markers
        assert!(diff.contains("+void h() { Foo::g(); Foo::T t; }"));
    }

    #[test]
    fn empty_patch_produces_empty_diff() {
        let patch = FilePatch::new("main.cpp");
        assert_eq!(generate_unified_diff(&patch, b"int a;\n"), "");
    }
}
