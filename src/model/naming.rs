//! Identifier derivation from display names.

use convert_case::{Case, Casing};

/// Derive a code identifier from a display name
///
/// Words are title-cased and joined, every character that is not an ASCII
/// letter or digit becomes `_`, runs of `_` collapse and leading/trailing
/// separators are trimmed. `"Order Amount (USD)"` becomes `OrderAmount_USD`.
pub fn code_name(display_name: &str) -> String {
    let mut joined = String::with_capacity(display_name.len());
    for word in display_name.split_whitespace() {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            joined.extend(first.to_uppercase());
            joined.push_str(chars.as_str());
        }
    }

    let mut name = String::with_capacity(joined.len());
    for c in joined.chars() {
        let c = if c.is_ascii_alphanumeric() { c } else { '_' };
        if c == '_' && name.ends_with('_') {
            continue;
        }
        name.push(c);
    }

    let name = name.trim_matches('_');
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", name)
    } else {
        name.to_string()
    }
}

/// Code name with fallback when the display name yields nothing usable
pub fn code_name_or(display_name: Option<&str>, fallback: &str) -> String {
    let derived = display_name.map(code_name).unwrap_or_default();
    if derived.is_empty() {
        code_name(fallback)
    } else {
        derived
    }
}

/// Unique-identifier attributes carry an `Id` suffix
pub fn identifier_name(code_name: &str) -> String {
    if code_name.ends_with("Id") {
        code_name.to_string()
    } else {
        format!("{}Id", code_name)
    }
}

/// Type name of a global option set, taken from its org-wide logical name
///
/// Display names of global option sets are not unique, logical names are;
/// `new_color` becomes `NewColor`.
pub fn shared_type_name(logical_name: &str) -> String {
    let name = logical_name.to_case(Case::Pascal);
    match name.chars().next() {
        Some(c) if c.is_ascii_digit() => format!("_{}", name),
        _ => name,
    }
}

/// Name of the formatted-value getter for `code_name`
pub fn formatted_name(code_name: &str) -> String {
    let mut name = format!("{}_Formatted", code_name);
    while name.contains("__") {
        name = name.replace("__", "_");
    }
    name
}
