//! Final ASCII-only pass over emitted text
//!
//! Some shader compilers reject any byte outside 7-bit ASCII, even inside
//! comments. This pass drops every non-ASCII character and keeps everything
//! else (control characters included) in order. It invalidates source map
//! offsets, so it must run last.

use std::borrow::Cow;

/// Remove every character at or above U+0080.
///
/// All-ASCII input (including the empty string) is returned borrowed, with
/// no allocation.
pub fn strip_non_ascii(text: &str) -> Cow<'_, str> {
    let Some(first) = text.bytes().position(|b| !b.is_ascii()) else {
        return Cow::Borrowed(text);
    };

    let mut output = String::with_capacity(text.len());
    output.push_str(&text[..first]);
    // copy maximal ASCII runs between dropped characters
    for run in text[first..].split(|c: char| !c.is_ascii()) {
        output.push_str(run);
    }
    Cow::Owned(output)
}

/// [`strip_non_ascii`] lifted over an optional text
pub fn strip_non_ascii_opt(text: Option<&str>) -> Option<Cow<'_, str>> {
    text.map(strip_non_ascii)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_none_pass_through() {
        assert!(matches!(strip_non_ascii(""), Cow::Borrowed("")));
        assert_eq!(strip_non_ascii_opt(None), None);
    }

    #[test]
    fn ascii_input_is_borrowed_unchanged() {
        let text = "void main() {\n\tgl_FragColor = vec4(1.0);\x7f\n}\n";
        match strip_non_ascii(text) {
            Cow::Borrowed(out) => assert!(std::ptr::eq(out, text)),
            Cow::Owned(_) => panic!("ASCII input must not allocate"),
        }
    }

    #[test]
    fn drops_non_ascii_characters() {
        assert_eq!(strip_non_ascii("a\u{2550}b"), "ab");
        assert_eq!(strip_non_ascii("\u{2554}\u{2550}\u{2557}"), "");
        assert_eq!(strip_non_ascii("// caf\u{e9} \u{1f600}!\r\n"), "// caf !\r\n");
        assert_eq!(
            strip_non_ascii_opt(Some("x\u{b0}")).as_deref(),
            Some("x")
        );
    }

    #[test]
    fn keeps_control_characters() {
        assert_eq!(strip_non_ascii("\u{e9}\t\0\x7f\n"), "\t\0\x7f\n");
    }

    #[test]
    fn is_idempotent() {
        let inputs = ["", "plain", "a\u{2550}b", "\u{1f600}\u{1f600}x\u{1f600}"];
        for input in inputs {
            let once = strip_non_ascii(input).into_owned();
            let twice = strip_non_ascii(&once).into_owned();
            assert_eq!(once, twice);
        }
    }
}
