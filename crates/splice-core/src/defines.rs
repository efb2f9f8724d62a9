//! `#define` injection after the leading version directive

use std::collections::BTreeMap;

use crate::cst::Tree;
use crate::cst::ast::AstNode;
use crate::{Result, SpliceError};

/// Compile-time definitions: name to optional value, kept sorted
pub type Defines = BTreeMap<String, Option<String>>;

/// Render `#define NAME [VALUE]` lines in key order
pub fn render_defines(defines: &Defines) -> String {
    let mut block = String::new();
    for (name, value) in defines {
        block.push_str("#define ");
        block.push_str(name);
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            block.push(' ');
            block.push_str(value);
        }
        block.push('\n');
    }
    block
}

/// Check names and values, and that `tree` has somewhere to put them
pub fn validate_defines(tree: &Tree, defines: &Defines, source_name: &str) -> Result<()> {
    if defines.is_empty() {
        return Ok(());
    }
    for (name, value) in defines {
        check_define(name, value.as_deref())?;
    }
    if tree.leading_directive("version").is_none() {
        return Err(SpliceError::missing_version_directive(source_name));
    }
    Ok(())
}

/// A define name must be an identifier and its value a single line
pub fn check_define(name: &str, value: Option<&str>) -> Result<()> {
    if !is_identifier(name) {
        return Err(SpliceError::config_error(format!(
            "invalid define name '{name}'"
        )));
    }
    if value.is_some_and(|v| v.contains(['\n', '\r'])) {
        return Err(SpliceError::config_error(format!(
            "define '{name}' has a multi-line value"
        )));
    }
    Ok(())
}

/// Insert the rendered defines right after the leading `#version` line.
///
/// Empty `defines` leave the tree untouched; otherwise a missing version
/// directive is a [`SpliceError::MissingVersionDirective`].
pub fn inject_defines(tree: &Tree, defines: &Defines, source_name: &str) -> Result<Tree> {
    validate_defines(tree, defines, source_name)?;
    let Some(version) = tree.leading_directive("version") else {
        return Ok(tree.clone());
    };

    let offset = tree.end_of_line(version.syntax());
    let mut block = render_defines(defines);
    let text = tree.text();
    if !text[..usize::from(offset)].ends_with(['\n', '\r']) {
        block.insert(0, '\n');
    }

    tracing::debug!("Injecting {} defines into {}", defines.len(), source_name);
    let mut editor = tree.edit();
    editor.insert(offset, block);
    editor.commit()
}

/// Parse a `NAME` or `NAME=VALUE` command-line define
pub fn parse_define(spec: &str) -> Result<(String, Option<String>)> {
    let (name, value) = match spec.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value.trim().to_string())),
        None => (spec.trim(), None),
    };
    if !is_identifier(name) {
        return Err(SpliceError::config_error(format!(
            "invalid define '{spec}': expected NAME or NAME=VALUE"
        )));
    }
    Ok((name.to_string(), value))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cst::Schema;

    fn parse(text: &str) -> Tree {
        Tree::parse(text, Arc::new(Schema::glsl()))
    }

    fn defines(entries: &[(&str, Option<&str>)]) -> Defines {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    #[test]
    fn renders_sorted_lines() {
        let block = render_defines(&defines(&[
            ("USE_SHADOWS", None),
            ("MAX_LIGHTS", Some("8")),
            ("EMPTY", Some("")),
        ]));
        assert_eq!(block, "#define EMPTY\n#define MAX_LIGHTS 8\n#define USE_SHADOWS\n");
    }

    #[test]
    fn injects_after_version_line() {
        let tree = parse("#version 330 core\nvoid main(){}\n");
        let out = inject_defines(&tree, &defines(&[("A", Some("1"))]), "main.frag").unwrap();
        assert_eq!(out.text(), "#version 330 core\n#define A 1\nvoid main(){}\n");
    }

    #[test]
    fn version_without_newline_gets_one() {
        let tree = parse("#version 450");
        let out = inject_defines(&tree, &defines(&[("A", None)]), "main.frag").unwrap();
        assert_eq!(out.text(), "#version 450\n#define A\n");
    }

    #[test]
    fn empty_defines_are_a_no_op() {
        let tree = parse("void main(){}\n");
        let out = inject_defines(&tree, &Defines::new(), "main.frag").unwrap();
        assert_eq!(out, tree);
    }

    #[test]
    fn missing_version_is_fatal() {
        let tree = parse("void main(){}\n");
        let err = inject_defines(&tree, &defines(&[("A", None)]), "main.frag").unwrap_err();
        assert!(matches!(err, SpliceError::MissingVersionDirective { .. }));
    }

    #[test]
    fn rejects_bad_names_and_values() {
        let tree = parse("#version 450\n");
        assert!(validate_defines(&tree, &defines(&[("1BAD", None)]), "x").is_err());
        assert!(validate_defines(&tree, &defines(&[("A", Some("1\n2"))]), "x").is_err());
    }

    #[test]
    fn parses_command_line_defines() {
        assert_eq!(parse_define("FOO").unwrap(), ("FOO".to_string(), None));
        assert_eq!(
            parse_define("N = 4").unwrap(),
            ("N".to_string(), Some("4".to_string()))
        );
        assert!(parse_define("=4").is_err());
        assert!(parse_define("A-B").is_err());
    }
}
