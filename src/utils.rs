//! Low-level stanza tokenizing helpers shared by the control-file parser (C2).
//!
//! A stanza is represented as an ordered map from (uppercased) field name to
//! its raw lines: element 0 is the text after the `Field:` colon, any further
//! elements are continuation lines (§4.2).

use std::collections::HashMap;

use crate::error::CoreError;

/// Splits a byte stream into stanzas (§4.2): a stanza is a contiguous run of
/// non-blank lines, a blank line terminates it. Lines beginning with a space
/// are continuation lines belonging to the preceding field.
pub fn split_stanzas(content: &str) -> Vec<HashMap<String, Vec<String>>> {
    let mut stanzas = Vec::new();
    let mut stanza: HashMap<String, Vec<String>> = HashMap::new();

    let mut key = String::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !stanza.is_empty() {
                stanzas.push(stanza);
            }
            stanza = HashMap::new();
            continue;
        }

        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(values) = stanza.get_mut(&key) {
                values.push(line.to_string());
            }
            continue;
        }

        match line.split_once(':') {
            Some((k, v)) => {
                key = k.trim().to_ascii_uppercase();
                stanza.insert(key.clone(), vec![v.to_string()]);
            }
            None => {
                log::debug!("[split_stanzas] invalid line, missing ':': {}", line);
                key = String::new();
            }
        }
    }

    if !stanza.is_empty() {
        stanzas.push(stanza);
    }

    stanzas
}

fn lookup<'a>(key: &str, stanza: &'a HashMap<String, Vec<String>>) -> Option<&'a Vec<String>> {
    stanza.get(&key.to_ascii_uppercase())
}

/// The first line of a required field, trimmed.
pub fn stanza_value(key: &str, stanza: &HashMap<String, Vec<String>>) -> Result<String, CoreError> {
    let values = lookup(key, stanza)
        .ok_or_else(|| CoreError::Malformed(format!("field '{}' not found", key)))?;
    Ok(values[0].trim().to_string())
}

pub fn stanza_opt_value(key: &str, stanza: &HashMap<String, Vec<String>>) -> Option<String> {
    stanza_value(key, stanza).ok()
}

/// Whitespace-separated tokens on the first line of a field.
pub fn stanza_list(key: &str, stanza: &HashMap<String, Vec<String>>) -> Result<Vec<String>, CoreError> {
    let value = stanza_value(key, stanza)?;
    Ok(value.split_whitespace().map(|v| v.to_string()).collect())
}

pub fn stanza_opt_list(key: &str, stanza: &HashMap<String, Vec<String>>) -> Option<Vec<String>> {
    match stanza_list(key, stanza) {
        Ok(list) if !list.is_empty() => Some(list),
        _ => None,
    }
}

/// All lines of a field (value line plus continuations), trimmed, joined by
/// `"\n"` - used for `Description` when rendering for a terminal (§4.2).
pub fn stanza_text(key: &str, stanza: &HashMap<String, Vec<String>>) -> Result<String, CoreError> {
    let values = lookup(key, stanza)
        .ok_or_else(|| CoreError::Malformed(format!("field '{}' not found", key)))?;
    Ok(values.iter().map(|l| l.trim()).collect::<Vec<_>>().join("\n"))
}

pub fn stanza_opt_text(key: &str, stanza: &HashMap<String, Vec<String>>) -> Option<String> {
    stanza_text(key, stanza).ok()
}

/// All raw lines of a field, trimmed; non-empty lines only when
/// `filter_empty` is set. Used for multi-line fields like `Conffiles` where
/// every line (value line included) carries one entry.
pub fn stanza_lines(
    key: &str,
    stanza: &HashMap<String, Vec<String>>,
    filter_empty: bool,
) -> Result<Vec<String>, CoreError> {
    let values = lookup(key, stanza)
        .ok_or_else(|| CoreError::Malformed(format!("field '{}' not found", key)))?;
    let lines = values.iter().map(|l| l.trim().to_string());
    Ok(if filter_empty {
        lines.filter(|l| !l.is_empty()).collect()
    } else {
        lines.collect()
    })
}
