//! TOML front end for the declarative tree.
//!
//! Adapter rules:
//! - scalar entry → attribute on the owning element
//! - table → one child element
//! - array of tables → repeated child elements, in order
//! - array of scalars → repeated leaf children carrying the scalar as text
//!
//! Key order in the document is preserved (the `toml` crate is built with
//! `preserve_order`), so child and attribute order match the source text.
//! Shapes the adapter cannot express (nested arrays, mixed arrays) are
//! reported as non-fatal reader warnings and skipped.

use crate::error::ConfigResult;
use crate::reader::ConfigElement;

/// A parsed document: the root element plus non-fatal reader warnings.
#[derive(Debug)]
pub struct ParsedDocument {
    pub root: ConfigElement,
    pub warnings: Vec<String>,
}

/// Parse configuration text into a declarative tree.
///
/// A document with a single top-level table uses that table as the root
/// element; anything else is folded under a synthetic `configuration`
/// wrapper and left for the dispatcher to judge.
pub fn parse_document(text: &str) -> ConfigResult<ParsedDocument> {
    let value: toml::Value = text.parse()?;
    let mut warnings = Vec::new();

    let root = match &value {
        toml::Value::Table(table) => {
            let mut entries = table.iter();
            match (entries.next(), entries.next()) {
                (Some((key, toml::Value::Table(inner))), None) => {
                    element_from_table(key, inner, &mut warnings)
                }
                _ => element_from_table("configuration", table, &mut warnings),
            }
        }
        _ => {
            warnings.push("document root is not a table".to_string());
            ConfigElement::new("configuration")
        }
    };

    Ok(ParsedDocument { root, warnings })
}

fn element_from_table(
    name: &str,
    table: &toml::map::Map<String, toml::Value>,
    warnings: &mut Vec<String>,
) -> ConfigElement {
    let mut elem = ConfigElement::new(name);
    for (key, value) in table {
        append_entry(&mut elem, key, value, warnings);
    }
    elem
}

fn append_entry(
    elem: &mut ConfigElement,
    key: &str,
    value: &toml::Value,
    warnings: &mut Vec<String>,
) {
    match value {
        toml::Value::Table(table) => {
            elem.push_child(element_from_table(key, table, warnings));
        }
        toml::Value::Array(items) => {
            for item in items {
                match item {
                    toml::Value::Table(table) => {
                        elem.push_child(element_from_table(key, table, warnings));
                    }
                    toml::Value::Array(_) => {
                        warnings.push(format!(
                            "'{key}': nested arrays are not representable, entry skipped"
                        ));
                    }
                    scalar => match scalar_text(scalar) {
                        Some(text) => {
                            elem.push_child(ConfigElement::new(key).with_text(text));
                        }
                        None => warnings.push(format!(
                            "'{key}': unsupported array item, entry skipped"
                        )),
                    },
                }
            }
        }
        scalar => match scalar_text(scalar) {
            Some(text) => elem.push_attribute(key, text),
            None => warnings.push(format!("'{key}': unsupported value, entry skipped")),
        },
    }
}

fn scalar_text(value: &toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s.clone()),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        toml::Value::Datetime(d) => Some(d.to_string()),
        toml::Value::Array(_) | toml::Value::Table(_) => None,
    }
}
