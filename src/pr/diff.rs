use super::types::{DiffLine, LineKind};

/// Classify a single line of a GitHub file patch by its first character.
///
/// `@@` starts a hunk header; any other `+` or `-` line is a change, even
/// when the content itself begins with `++` or `--`.
pub fn classify_line(line: &str) -> LineKind {
    if line.starts_with("@@") {
        LineKind::Marker
    } else if line.starts_with('+') {
        LineKind::Added
    } else if line.starts_with('-') {
        LineKind::Removed
    } else {
        LineKind::Context
    }
}

/// Split the `patch` field of a GitHub file entry into classified lines.
///
/// GitHub omits the `diff --git` and `---`/`+++` headers from per-file
/// patches, so the text starts directly with the first hunk. Order is kept
/// exactly as received.
pub fn parse_patch(patch: &str) -> Vec<DiffLine> {
    patch
        .lines()
        .map(|line| DiffLine {
            kind: classify_line(line),
            text: line.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PATCH: &str = r#"@@ -1,5 +1,7 @@
 fn main() {
-    println!("old");
+    println!("new");
+    // Added a comment
 }
@@ -20,2 +22,2 @@ impl Foo {
-    x
+    y"#;

    #[test]
    fn test_parse_patch_preserves_order_and_kinds() {
        let lines = parse_patch(SAMPLE_PATCH);
        let kinds: Vec<LineKind> = lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Marker,
                LineKind::Context,
                LineKind::Removed,
                LineKind::Added,
                LineKind::Added,
                LineKind::Context,
                LineKind::Marker,
                LineKind::Removed,
                LineKind::Added,
            ]
        );
        assert_eq!(lines[2].text, "-    println!(\"old\");");
        assert_eq!(lines[6].text, "@@ -20,2 +22,2 @@ impl Foo {");
    }

    #[test]
    fn test_changed_lines_starting_with_doubled_prefix() {
        // removed `-- legacy` SQL comment, added `++i;`
        let lines = parse_patch("@@ -1,2 +1,2 @@\n--- legacy\n+++i;");
        let kinds: Vec<LineKind> = lines.iter().map(|l| l.kind).collect();
        assert_eq!(kinds, vec![LineKind::Marker, LineKind::Removed, LineKind::Added]);
        assert_eq!(lines[1].text, "--- legacy");
    }

    #[test]
    fn test_classify_edge_lines() {
        assert_eq!(classify_line(""), LineKind::Context);
        assert_eq!(classify_line("+"), LineKind::Added);
        assert_eq!(classify_line("-"), LineKind::Removed);
        assert_eq!(classify_line("@@"), LineKind::Marker);
        assert_eq!(classify_line("\\ No newline at end of file"), LineKind::Context);
        assert_eq!(classify_line(" +indented"), LineKind::Context);
    }

    #[test]
    fn test_parse_empty_patch() {
        assert!(parse_patch("").is_empty());
    }

    #[test]
    fn test_every_line_is_classified() {
        let lines = parse_patch(SAMPLE_PATCH);
        assert_eq!(lines.len(), SAMPLE_PATCH.lines().count());
    }
}
