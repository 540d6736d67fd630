//! Minimal YAML parser for skill descriptors.
//!
//! Skill metadata files use a small, regular subset of YAML: key/value
//! scalars, nested maps, block lists (`- item`), lists of flat maps
//! (`- name: ...`), and inline flow lists (`[a, b]`).  This module parses
//! that subset directly into [`serde_json::Value`] so the descriptor structs
//! can be deserialized with plain `serde_json`, without carrying a full YAML
//! dependency for files this simple.

use serde_json::{Map, Value};

/// Parse a descriptor document into a JSON object value.
///
/// Returns a human-readable reason on malformed input; callers wrap it into
/// their own error type with file context attached.
pub fn parse_yaml(input: &str) -> Result<Value, String> {
    let lines: Vec<(usize, &str)> = input
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|line| (indent_of(line), line.trim_end()))
        .collect();

    if lines.is_empty() {
        return Ok(Value::Object(Map::new()));
    }

    let mut pos = 0;
    let root_indent = lines[0].0;
    let map = parse_map(&lines, &mut pos, root_indent)?;

    if pos < lines.len() {
        return Err(format!(
            "unexpected content after document root: `{}`",
            lines[pos].1.trim()
        ));
    }

    Ok(Value::Object(map))
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Parse consecutive `key: value` entries at exactly `indent` columns.
fn parse_map(lines: &[(usize, &str)], pos: &mut usize, indent: usize) -> Result<Map<String, Value>, String> {
    let mut map = Map::new();

    while *pos < lines.len() {
        let (line_indent, line) = lines[*pos];
        if line_indent < indent {
            break;
        }
        if line_indent > indent {
            return Err(format!("unexpected indentation: `{}`", line.trim()));
        }

        let entry = line.trim_start();
        if entry.starts_with("- ") || entry == "-" {
            // A list item where a key was expected means the caller's
            // structure is off (lists only appear as values).
            return Err(format!("unexpected list item: `{entry}`"));
        }

        let (key, rest) = split_entry(entry)?;
        *pos += 1;

        let value = if rest.is_empty() {
            parse_block_value(lines, pos, indent)?
        } else {
            parse_scalar(rest)
        };

        if map.insert(key.to_owned(), value).is_some() {
            return Err(format!("duplicate key: `{key}`"));
        }
    }

    Ok(map)
}

/// Parse the block value following a `key:` line: a nested map, a list, or
/// nothing (null).
fn parse_block_value(lines: &[(usize, &str)], pos: &mut usize, parent_indent: usize) -> Result<Value, String> {
    if *pos >= lines.len() || lines[*pos].0 <= parent_indent {
        return Ok(Value::Null);
    }

    let child_indent = lines[*pos].0;
    let first = lines[*pos].1.trim_start();

    if first.starts_with("- ") || first == "-" {
        parse_list(lines, pos, child_indent)
    } else {
        Ok(Value::Object(parse_map(lines, pos, child_indent)?))
    }
}

/// Parse consecutive `- item` entries at exactly `indent` columns.
///
/// Items are either scalars or flat maps whose first key shares the dash
/// line (`- name: wiper_ctl`).
fn parse_list(lines: &[(usize, &str)], pos: &mut usize, indent: usize) -> Result<Value, String> {
    let mut items = Vec::new();

    while *pos < lines.len() {
        let (line_indent, line) = lines[*pos];
        let entry = line.trim_start();
        if line_indent != indent || !(entry.starts_with("- ") || entry == "-") {
            break;
        }

        let rest = entry[1..].trim_start();
        *pos += 1;

        if rest.is_empty() {
            // Bare dash: the item's map starts on the following lines.
            items.push(parse_block_value(lines, pos, indent)?);
        } else if let Ok((key, value_part)) = split_entry(rest) {
            // Map item: first entry shares the dash line, the rest are
            // indented past the dash.
            let mut item = Map::new();
            let value = if value_part.is_empty() {
                parse_block_value(lines, pos, indent + 2)?
            } else {
                parse_scalar(value_part)
            };
            item.insert(key.to_owned(), value);

            if *pos < lines.len() && lines[*pos].0 > indent {
                let continuation = parse_map(lines, pos, lines[*pos].0)?;
                for (k, v) in continuation {
                    if item.insert(k.clone(), v).is_some() {
                        return Err(format!("duplicate key in list item: `{k}`"));
                    }
                }
            }

            items.push(Value::Object(item));
        } else {
            items.push(parse_scalar(rest));
        }
    }

    Ok(Value::Array(items))
}

/// Split a `key: value` entry; the value part may be empty.
fn split_entry(entry: &str) -> Result<(&str, &str), String> {
    let colon = entry
        .find(':')
        .ok_or_else(|| format!("expected `key: value`, got `{entry}`"))?;

    let key = entry[..colon].trim().trim_matches('"').trim_matches('\'');
    if key.is_empty() {
        return Err(format!("empty key in `{entry}`"));
    }

    let rest = entry[colon + 1..].trim();
    // A colon not followed by whitespace or end-of-line is part of a scalar
    // (`http://...`), not a key separator.
    if !rest.is_empty() && !entry[colon + 1..].starts_with(' ') {
        return Err(format!("expected `key: value`, got `{entry}`"));
    }

    Ok((key, rest))
}

/// Parse an inline scalar: quoted string, flow list, boolean, null, number,
/// or plain string.
fn parse_scalar(raw: &str) -> Value {
    let raw = raw.trim();

    if (raw.starts_with('"') && raw.ends_with('"') && raw.len() >= 2)
        || (raw.starts_with('\'') && raw.ends_with('\'') && raw.len() >= 2)
    {
        return Value::String(raw[1..raw.len() - 1].to_owned());
    }

    // Inline flow list: `[a, b]`, quoted or not.
    if raw.starts_with('[') && raw.ends_with(']') {
        if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
            return parsed;
        }
        let inner = raw[1..raw.len() - 1].trim();
        if inner.is_empty() {
            return Value::Array(Vec::new());
        }
        return Value::Array(inner.split(',').map(|item| parse_scalar(item.trim())).collect());
    }

    match raw {
        "true" | "yes" | "on" => return Value::Bool(true),
        "false" | "no" | "off" => return Value::Bool(false),
        "null" | "~" => return Value::Null,
        _ => {}
    }

    if let Ok(n) = raw.parse::<i64>() {
        return Value::Number(n.into());
    }
    if let Ok(n) = raw.parse::<f64>()
        && let Some(n) = serde_json::Number::from_f64(n)
    {
        return Value::Number(n);
    }

    Value::String(raw.to_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
