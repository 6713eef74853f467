//! JSDoc tag extraction.
//!
//! oxc keeps comments out of the AST, so tags are read straight from the
//! source text: the block comment that ends immediately above a declaration
//! belongs to it.

/// Tags of the `/** ... */` block directly preceding `offset`, without the
/// leading `@`.
pub(crate) fn tags_before(source: &str, offset: usize) -> Vec<String> {
    let offset = offset.min(source.len());
    let before = source[..offset].trim_end();
    if !before.ends_with("*/") {
        return Vec::new();
    }
    let Some(start) = before.rfind("/**") else {
        return Vec::new();
    };
    let block = &before[start..];

    let mut tags = Vec::new();
    for chunk in block.split('@').skip(1) {
        let tag: String = chunk
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect();
        if !tag.is_empty() {
            tags.push(tag);
        }
    }
    tags
}

/// Occurrences of `name` as a whole identifier in `source`.
pub(crate) fn identifier_occurrences(source: &str, name: &str) -> usize {
    if name.is_empty() {
        return 0;
    }
    let bytes = source.as_bytes();
    let mut count = 0;
    let mut from = 0;

    while let Some(found) = source[from..].find(name) {
        let start = from + found;
        let end = start + name.len();
        let before_ok = start == 0 || !is_ident_byte(bytes[start - 1]);
        let after_ok = end >= bytes.len() || !is_ident_byte(bytes[end]);
        if before_ok && after_ok {
            count += 1;
        }
        from = start + name.len();
    }
    count
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_directly_above_only() {
        let source = "/** @public @deprecated since 2.0 */\nexport const x = 1;";
        let offset = source.find("export").unwrap();
        assert_eq!(tags_before(source, offset), vec!["public", "deprecated"]);
    }

    #[test]
    fn no_block_means_no_tags() {
        let source = "const a = 1;\nexport const x = 1;";
        let offset = source.find("export").unwrap();
        assert!(tags_before(source, offset).is_empty());
    }

    #[test]
    fn whole_identifier_matching() {
        let source = "const foo = 1; const foobar = foo + foo;";
        assert_eq!(identifier_occurrences(source, "foo"), 3);
        assert_eq!(identifier_occurrences(source, "foobar"), 1);
        assert_eq!(identifier_occurrences(source, "baz"), 0);
    }
}
