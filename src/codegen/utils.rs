//! Helpers shared by the dialect emitters.

use convert_case::{Case, Casing};

/// Convert a class name to a kebab-case file stem (`EmailMessage` -> `email-message`)
pub fn to_kebab_case(s: &str) -> String {
    s.to_case(Case::Kebab)
}

/// Escape a string for use in a double-quoted C# or TypeScript literal
pub fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Escape text placed inside an XML doc comment
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Single-line documentation text
pub fn doc_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a bound without a trailing `.0` for whole numbers
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e18 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_kebab_case("EmailMessage"), "email-message");
        assert_eq!(to_kebab_case("Account"), "account");
    }

    #[test]
    fn test_escape_string() {
        assert_eq!(escape_string("hello\nworld"), "hello\\nworld");
        assert_eq!(escape_string("say \"hello\""), "say \\\"hello\\\"");
    }

    #[test]
    fn test_escape_xml_and_doc_line() {
        assert_eq!(escape_xml("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(doc_line("two\n  lines"), "two lines");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1_000_000.0), "1000000");
        assert_eq!(format_number(-922_337_203_685_477.0), "-922337203685477");
        assert_eq!(format_number(0.5), "0.5");
    }
}
