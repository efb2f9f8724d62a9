//! Reference grammar and path normalization

use super::{Diagnostic, ResolverOptions, ResourceId};

const FORBIDDEN: &[char] = &['\\', '*', '?', '<', '>', '|', '"'];

/// Map an import reference to a resource id without touching any store
pub fn resolve_reference(
    reference: &str,
    relative_to: Option<&ResourceId>,
    options: &ResolverOptions,
) -> Result<ResourceId, Diagnostic> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(Diagnostic::empty_reference(relative_to));
    }

    let (namespace, raw_path) = if !reference.contains('/') && !reference.contains(':') {
        let path = if options.include_dir.is_empty() {
            reference.to_string()
        } else {
            format!("{}/{}", options.include_dir, reference)
        };
        (options.default_namespace.as_str(), path)
    } else if let Some((namespace, path)) = reference.split_once(':') {
        if !is_valid_namespace(namespace) {
            return Err(Diagnostic::malformed(
                reference,
                relative_to,
                format!("invalid namespace '{namespace}'"),
            ));
        }
        (namespace, path.to_string())
    } else if (reference.starts_with("./") || reference.starts_with("../"))
        && let Some(from) = relative_to
    {
        (from.namespace(), format!("{}/{}", from.dir(), reference))
    } else {
        (options.default_namespace.as_str(), reference.to_string())
    };

    let path = normalize_path(&raw_path)
        .map_err(|detail| Diagnostic::malformed(reference, relative_to, detail))?;
    Ok(ResourceId::new(namespace, path))
}

/// Collapse `.` and `..` segments against a virtual root
///
/// `..` at the root is dropped, so no input can escape it. Fails on control
/// characters, characters that are never valid in a reference, and paths
/// that normalize to nothing.
pub fn normalize_path(path: &str) -> Result<String, String> {
    if let Some(c) = path.chars().find(|c| c.is_control() || FORBIDDEN.contains(c)) {
        return Err(format!("invalid character {c:?} in path"));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err("path is empty after normalization".to_string());
    }
    Ok(segments.join("/"))
}

fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty()
        && namespace
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
