//! Reader for `key = value` descriptor property files.
//!
//! Descriptor files are small, hand-edited, and line-oriented, so this
//! parser covers exactly that shape: comments, blank lines, one key per
//! line. Anything outside the subset lands in the map verbatim and gets
//! rejected by descriptor validation instead of being guessed at here.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

/// Reads a property file as UTF-8. Invalid UTF-8 surfaces as an I/O error.
pub fn load(path: &Path) -> io::Result<HashMap<String, String>> {
    Ok(parse(&fs::read_to_string(path)?))
}

/// Parses property lines into a map.
///
/// Lines starting with `#` or `!` and blank lines are skipped. The first
/// `=` or `:` splits key from value; both sides are trimmed. A line with no
/// separator is a key with an empty value. The last occurrence of a
/// duplicated key wins.
pub fn parse(text: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = match line.find(|c| c == '=' || c == ':') {
            Some(at) => (line[..at].trim_end(), line[at + 1..].trim_start()),
            None => (line, ""),
        };
        props.insert(key.to_string(), value.to_string());
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries(text: &str) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = parse(text).into_iter().collect();
        pairs.sort();
        pairs
    }

    fn pair(key: &str, value: &str) -> (String, String) {
        (key.to_string(), value.to_string())
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let text = "# header comment\n\n! legacy comment\nname = analysis-icu\n";
        assert_eq!(entries(text), vec![pair("name", "analysis-icu")]);
    }

    #[test]
    fn splits_on_first_separator_and_trims() {
        let text = "classname = org.example.Plugin\ndescription: has = signs and : colons\n";
        assert_eq!(
            entries(text),
            vec![
                pair("classname", "org.example.Plugin"),
                pair("description", "has = signs and : colons"),
            ]
        );
    }

    #[test]
    fn line_without_separator_is_an_empty_value() {
        assert_eq!(entries("requires.keystore\n"), vec![pair("requires.keystore", "")]);
    }

    #[test]
    fn last_duplicate_wins() {
        let text = "version = 1.0.0\nversion = 2.0.0\n";
        assert_eq!(entries(text), vec![pair("version", "2.0.0")]);
    }

    #[test]
    fn value_keeps_interior_whitespace() {
        let text = "description =   An ICU analysis plugin  \n";
        assert_eq!(entries(text), vec![pair("description", "An ICU analysis plugin")]);
    }
}
