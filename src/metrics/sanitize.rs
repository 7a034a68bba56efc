/// Makes an arbitrary string safe to embed inside a quoted label value.
///
/// ASCII control characters (below `0x20` and `0x7F`) are dropped, then every
/// backslash and double quote is prefixed with a backslash.
///
/// # Example
///
/// ```
/// use pv_mount_point_exporter::metrics::sanitize_label_value;
///
/// assert_eq!(sanitize_label_value("a\"b\\c\n"), r#"a\"b\\c"#);
/// ```
pub fn sanitize_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\u{0}'..='\u{1f}' | '\u{7f}' => {}
            '\\' | '"' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Reverses the escaping of [`sanitize_label_value`].
///
/// The text encoder escapes label values itself, so the registry hands it the
/// plain value to keep the exposed text equal to the sanitized one.
pub(super) fn unescape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.extend(chars.next());
        } else {
            out.push(c);
        }
    }
    out
}
