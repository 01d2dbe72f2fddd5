//! Layer-name patterns of the form `kind:body`.
//!
//! `glob` bodies must match the whole label. `regex` bodies only need to
//! match starting at the first character; the rest of the label may be left
//! over. Authoring validates both kinds, evaluation compiles them once per
//! rule set and reports a bad body as an error for that evaluation.

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::{Result, VariationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    Glob,
    Regex,
}

impl PatternKind {
    pub fn tag(&self) -> &'static str {
        match self {
            PatternKind::Glob => "glob",
            PatternKind::Regex => "regex",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PatternKind::Glob => "Wildcard",
            PatternKind::Regex => "Regular expression",
        }
    }

    pub fn all() -> &'static [PatternKind] {
        &[PatternKind::Glob, PatternKind::Regex]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RulePattern {
    pub kind: PatternKind,
    pub body: String,
}

impl RulePattern {
    pub fn new(kind: PatternKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            body: body.into(),
        }
    }

    /// Authoring-time check: non-empty body that compiles for its kind.
    pub fn validate(&self) -> Result<()> {
        if self.body.is_empty() {
            return Err(self.invalid("the pattern cannot be empty"));
        }
        CompiledPattern::compile(self).map(|_| ())
    }

    fn invalid(&self, reason: impl Into<String>) -> VariationError {
        VariationError::InvalidPattern {
            pattern: self.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RulePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.tag(), self.body)
    }
}

impl FromStr for RulePattern {
    type Err = VariationError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| VariationError::InvalidPattern {
            pattern: s.to_string(),
            reason: reason.to_string(),
        };
        let (kind, body) = s
            .split_once(':')
            .ok_or_else(|| invalid("missing `glob:` or `regex:` prefix"))?;
        let kind = match kind {
            "glob" => PatternKind::Glob,
            "regex" => PatternKind::Regex,
            _ => return Err(invalid("unknown pattern kind")),
        };
        Ok(Self::new(kind, body))
    }
}

/// A pattern ready to be evaluated against labels.
#[derive(Debug, Clone)]
pub enum CompiledPattern {
    Glob(glob::Pattern),
    Regex(Regex),
}

impl CompiledPattern {
    pub fn compile(pattern: &RulePattern) -> Result<Self> {
        match pattern.kind {
            PatternKind::Glob => glob::Pattern::new(&pattern.body)
                .map(CompiledPattern::Glob)
                .map_err(|e| pattern.invalid(e.to_string())),
            PatternKind::Regex => Regex::new(&pattern.body)
                .map(CompiledPattern::Regex)
                .map_err(|e| pattern.invalid(e.to_string())),
        }
    }

    /// Parse a stored `kind:body` string and compile it.
    pub fn parse(text: &str) -> Result<Self> {
        Self::compile(&text.parse()?)
    }

    pub fn matches(&self, label: &str) -> bool {
        match self {
            CompiledPattern::Glob(pattern) => pattern.matches(label),
            // Leftmost match starts at 0 whenever any match does
            CompiledPattern::Regex(regex) => regex.find(label).is_some_and(|m| m.start() == 0),
        }
    }
}

/// One-shot evaluation of a stored pattern against a label.
#[allow(dead_code)]
pub fn matches(pattern: &str, label: &str) -> Result<bool> {
    Ok(CompiledPattern::parse(pattern)?.matches(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let pattern: RulePattern = "regex:^hair_(red|blue)".parse().unwrap();
        assert_eq!(pattern.kind, PatternKind::Regex);
        assert_eq!(pattern.body, "^hair_(red|blue)");
        assert_eq!(pattern.to_string(), "regex:^hair_(red|blue)");
    }

    #[test]
    fn test_body_may_contain_colons() {
        let pattern: RulePattern = "glob:a:b*".parse().unwrap();
        assert_eq!(pattern.body, "a:b*");
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        assert!("blob:char_*".parse::<RulePattern>().is_err());
        assert!("char_*".parse::<RulePattern>().is_err());
    }

    #[test]
    fn test_glob_is_full_match() {
        assert!(matches("glob:char_*", "char_a").unwrap());
        assert!(matches("glob:char_?", "char_b").unwrap());
        assert!(matches("glob:char_[ab]", "char_b").unwrap());
        assert!(!matches("glob:char", "char_a").unwrap());
        assert!(!matches("glob:har_a", "char_a").unwrap());
    }

    #[test]
    fn test_regex_is_prefix_match() {
        assert!(matches("regex:char", "char_a").unwrap());
        assert!(matches("regex:char_.", "char_a_shadow").unwrap());
        assert!(!matches("regex:har", "char_a").unwrap());
        assert!(matches("regex:x|char", "char_a").unwrap());
    }

    #[test]
    fn test_regex_anchor_in_body_is_harmless() {
        assert!(matches("regex:^bg$", "bg").unwrap());
        assert!(!matches("regex:^bg$", "bg2").unwrap());
    }

    #[test]
    fn test_invalid_regex_fails_evaluation() {
        let err = matches("regex:(unclosed", "anything").unwrap_err();
        assert!(matches!(err, VariationError::InvalidPattern { .. }));
    }

    #[test]
    fn test_validate() {
        assert!(RulePattern::new(PatternKind::Regex, "eyes_(open|closed)").validate().is_ok());
        assert!(RulePattern::new(PatternKind::Regex, "[").validate().is_err());
        assert!(RulePattern::new(PatternKind::Glob, "").validate().is_err());
        assert!(RulePattern::new(PatternKind::Glob, "[").validate().is_err());
    }
}
