//! Front matter to document metadata conversion.

use serde_yaml::Value;

use crate::ast::{Inline, Meta, MetaValue};

/// Key whose scalar values are passed through to LaTeX untouched.
pub const HEADER_INCLUDES: &str = "header-includes";

const DELIMITER: &str = "---";

/// Parse a raw front matter block, `---` delimiters included.
///
/// Unparsable YAML, or YAML whose top level is not a mapping, yields empty
/// metadata; the document still compiles.
pub fn parse_front_matter(raw: &str) -> Meta {
    let mut body = raw.trim_end();
    body = body.strip_prefix(DELIMITER).unwrap_or(body);
    body = body.strip_suffix(DELIMITER).unwrap_or(body);
    if body.trim().is_empty() {
        return Meta::new();
    }

    match serde_yaml::from_str::<Value>(body) {
        Ok(value) => convert(&value),
        Err(err) => {
            tracing::warn!(error = %err, "front matter is not valid YAML; ignoring it");
            Meta::new()
        }
    }
}

/// Convert a parsed YAML document into metadata entries.
pub fn convert(value: &Value) -> Meta {
    let mut meta = Meta::new();
    match value {
        Value::Mapping(mapping) => {
            for (key, value) in mapping {
                if let Some(key) = key_string(key) {
                    let converted = convert_value(&key, value);
                    meta.insert(key, converted);
                }
            }
        }
        Value::Tagged(tagged) => return convert(&tagged.value),
        Value::Null => {}
        other => {
            tracing::warn!(kind = kind_name(other), "front matter is not a mapping; ignoring it");
        }
    }
    meta
}

/// `key` is the nearest enclosing mapping key; sequences pass it down so
/// that `header-includes` lists keep their raw LaTeX treatment.
fn convert_value(key: &str, value: &Value) -> MetaValue {
    match value {
        Value::Bool(b) => MetaValue::MetaBool(*b),
        Value::Sequence(items) => {
            MetaValue::MetaList(items.iter().map(|item| convert_value(key, item)).collect())
        }
        Value::Mapping(mapping) => MetaValue::MetaMap(
            mapping
                .iter()
                .filter_map(|(k, v)| {
                    let k = key_string(k)?;
                    let converted = convert_value(&k, v);
                    Some((k, converted))
                })
                .collect(),
        ),
        Value::Tagged(tagged) => convert_value(key, &tagged.value),
        scalar => {
            let text = scalar_string(scalar).unwrap_or_default();
            if key == HEADER_INCLUDES {
                MetaValue::MetaInlines(vec![Inline::raw_latex(text)])
            } else {
                MetaValue::MetaString(text)
            }
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some("null".to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn key_string(key: &Value) -> Option<String> {
    let key_text = scalar_string(key);
    if key_text.is_none() {
        tracing::warn!(kind = kind_name(key), "skipping front matter entry with a non-scalar key");
    }
    key_text
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn string(s: &str) -> MetaValue {
        MetaValue::MetaString(s.to_string())
    }

    #[test]
    fn scalars_become_strings_and_bools() {
        let meta = parse_front_matter("---\ntitle: Test\ndraft: true\nyear: 2024\nempty: ~\n---");
        assert_eq!(meta["title"], string("Test"));
        assert_eq!(meta["draft"], MetaValue::MetaBool(true));
        assert_eq!(meta["year"], string("2024"));
        assert_eq!(meta["empty"], string("null"));
    }

    #[test]
    fn keeps_source_key_order() {
        let meta = parse_front_matter("---\nzeta: 1\nalpha: 2\nmid: 3\n---\n");
        let keys: Vec<_> = meta.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn nested_lists_and_maps() {
        let meta = parse_front_matter(
            "---\nauthor:\n  - name: Ada\n    affiliation: Analytical\n  - Grace\n---",
        );
        let MetaValue::MetaList(authors) = &meta["author"] else {
            panic!("expected a list, got {:?}", meta["author"]);
        };
        assert_eq!(authors.len(), 2);
        let MetaValue::MetaMap(first) = &authors[0] else {
            panic!("expected a map, got {:?}", authors[0]);
        };
        assert_eq!(first["name"], string("Ada"));
        assert_eq!(first["affiliation"], string("Analytical"));
        assert_eq!(authors[1], string("Grace"));
    }

    #[test]
    fn header_includes_are_raw_latex() {
        let meta = parse_front_matter(
            "---\nheader-includes: \\usepackage{amsmath}\nother: \\x\n---",
        );
        assert_eq!(
            meta[HEADER_INCLUDES],
            MetaValue::MetaInlines(vec![Inline::raw_latex("\\usepackage{amsmath}")])
        );
        assert_eq!(meta["other"], string("\\x"));
    }

    #[test]
    fn header_includes_list_elements_are_raw_latex() {
        let meta = parse_front_matter("---\nheader-includes:\n  - \\usepackage{a}\n  - \\usepackage{b}\n---");
        assert_eq!(
            meta[HEADER_INCLUDES],
            MetaValue::MetaList(vec![
                MetaValue::MetaInlines(vec![Inline::raw_latex("\\usepackage{a}")]),
                MetaValue::MetaInlines(vec![Inline::raw_latex("\\usepackage{b}")]),
            ])
        );
    }

    #[test]
    fn non_string_keys_use_their_text() {
        let meta = parse_front_matter("---\n1: one\ntrue: yes\n---");
        assert_eq!(meta["1"], string("one"));
        assert!(meta.contains_key("true"));
    }

    #[test]
    fn malformed_or_non_mapping_yields_empty() {
        assert!(parse_front_matter("---\ntitle: [unclosed\n---").is_empty());
        assert!(parse_front_matter("---\n- a\n- b\n---").is_empty());
        assert!(parse_front_matter("---\njust a string\n---").is_empty());
        assert!(parse_front_matter("---\n---").is_empty());
        assert!(parse_front_matter("---\n\n---\n").is_empty());
    }
}
