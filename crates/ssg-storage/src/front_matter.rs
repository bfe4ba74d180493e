//! Front-matter extraction.
//!
//! A front-matter block is a YAML mapping between two `---` lines at the very
//! start of a file. Detection looks at the first three bytes only, so binary
//! files pass through untouched.

use crate::file::Meta;
use crate::storage::{StorageError, StorageErrorKind};

const FENCE: &[u8] = b"---";

/// Split raw file bytes into front-matter metadata and body.
///
/// Files that do not start with `---`, are not valid UTF-8, or never close
/// the block are returned unchanged with empty metadata.
///
/// # Errors
///
/// Returns [`StorageErrorKind::InvalidFrontMatter`] if the block is not a
/// YAML mapping.
pub fn extract_front_matter(bytes: &[u8]) -> Result<(Meta, Vec<u8>), StorageError> {
    if bytes.len() <= FENCE.len() || !bytes.starts_with(FENCE) {
        return Ok((Meta::new(), bytes.to_vec()));
    }

    let Ok(text) = std::str::from_utf8(bytes) else {
        return Ok((Meta::new(), bytes.to_vec()));
    };

    let mut lines = text.split_inclusive('\n');
    let Some(opening) = lines.next() else {
        return Ok((Meta::new(), bytes.to_vec()));
    };
    if opening.trim_end() != "---" {
        return Ok((Meta::new(), bytes.to_vec()));
    }

    let yaml_start = opening.len();
    let mut offset = yaml_start;
    for line in lines {
        if line.trim_end() == "---" {
            let meta = parse_yaml(&text[yaml_start..offset])?;
            let body = &text[offset + line.len()..];
            return Ok((meta, body.as_bytes().to_vec()));
        }
        offset += line.len();
    }

    tracing::debug!("Unterminated front matter block, treating file as plain content");
    Ok((Meta::new(), bytes.to_vec()))
}

fn parse_yaml(yaml: &str) -> Result<Meta, StorageError> {
    if yaml.trim().is_empty() {
        return Ok(Meta::new());
    }

    serde_yaml::from_str::<Option<Meta>>(yaml)
        .map(Option::unwrap_or_default)
        .map_err(|e| StorageError::new(StorageErrorKind::InvalidFrontMatter).with_source(e))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_no_front_matter() {
        let (meta, body) = extract_front_matter(b"<h1>Hello</h1>").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, b"<h1>Hello</h1>");
    }

    #[test]
    fn test_short_input_passes_through() {
        let (meta, body) = extract_front_matter(b"---").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, b"---");
    }

    #[test]
    fn test_binary_input_passes_through() {
        let bytes = [b'-', b'-', b'-', 0xff, 0xfe, 0x00];
        let (meta, body) = extract_front_matter(&bytes).unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, bytes);
    }

    #[test]
    fn test_parses_mapping() {
        let input = b"---\ntitle: Page title\nnavOrder: 1.5\nnavHidden: true\n---\nBody\n";
        let (meta, body) = extract_front_matter(input).unwrap();

        assert_eq!(meta.get("title"), Some(&json!("Page title")));
        assert_eq!(meta.get("navOrder"), Some(&json!(1.5)));
        assert_eq!(meta.get("navHidden"), Some(&json!(true)));
        assert_eq!(body, b"Body\n");
    }

    #[test]
    fn test_crlf_fences() {
        let input = b"---\r\ntitle: Win\r\n---\r\nBody";
        let (meta, body) = extract_front_matter(input).unwrap();

        assert_eq!(meta.get("title"), Some(&json!("Win")));
        assert_eq!(body, b"Body");
    }

    #[test]
    fn test_empty_block() {
        let (meta, body) = extract_front_matter(b"---\n---\nBody").unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, b"Body");
    }

    #[test]
    fn test_unterminated_block_passes_through() {
        let input = b"---\ntitle: Never closed\nBody";
        let (meta, body) = extract_front_matter(input).unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, input);
    }

    #[test]
    fn test_horizontal_rule_is_not_front_matter() {
        let input = b"----\nnot yaml\n----\n";
        let (meta, body) = extract_front_matter(input).unwrap();
        assert!(meta.is_empty());
        assert_eq!(body, input);
    }

    #[test]
    fn test_non_mapping_is_error() {
        let err = extract_front_matter(b"---\n- a\n- b\n---\nBody").unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidFrontMatter);
    }
}
