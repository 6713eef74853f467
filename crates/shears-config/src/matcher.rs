//! Name matching for `ignoreDependencies` / `ignoreBinaries`.
//!
//! Entries are exact names unless written `/like-this/`, which compiles to a
//! regular expression anchored over the whole name.

use regex::Regex;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
enum Rule {
    Exact(String),
    Pattern(Regex),
}

/// Compiled matcher over a list of names and `/regex/` patterns.
#[derive(Debug, Clone, Default)]
pub struct NameMatcher {
    rules: Vec<Rule>,
}

impl NameMatcher {
    pub fn compile(entries: &[String]) -> Result<Self, ConfigError> {
        let mut rules = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.len() > 1 && entry.starts_with('/') && entry.ends_with('/') {
                let body = &entry[1..entry.len() - 1];
                let anchored = format!("^(?:{body})$");
                let regex = Regex::new(&anchored).map_err(|err| ConfigError::InvalidPattern {
                    pattern: entry.clone(),
                    message: err.to_string(),
                })?;
                rules.push(Rule::Pattern(regex));
            } else {
                rules.push(Rule::Exact(entry.clone()));
            }
        }
        Ok(Self { rules })
    }

    pub fn is_match(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| match rule {
            Rule::Exact(exact) => exact == name,
            Rule::Pattern(regex) => regex.is_match(name),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_names_match_whole_string() {
        let matcher = NameMatcher::compile(&["lodash".to_string()]).unwrap();
        assert!(matcher.is_match("lodash"));
        assert!(!matcher.is_match("lodash-es"));
    }

    #[test]
    fn slash_delimited_entries_are_regexes() {
        let matcher = NameMatcher::compile(&["/@types\\/.*/".to_string()]).unwrap();
        assert!(matcher.is_match("@types/node"));
        assert!(!matcher.is_match("typescript"));
    }

    #[test]
    fn bad_regex_is_a_config_error() {
        let err = NameMatcher::compile(&["/(/".to_string()]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
