//! Supported guest languages.
//!
//! The set is closed: every FAQ record carries exactly one of these tags and
//! chat requests are validated against it. Adding a language means adding a
//! variant here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Croatian. Default for records and requests that omit a language.
    #[default]
    Hr,
    En,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language: {0:?}")]
pub struct LanguageParseError(pub String);

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Hr => "hr",
            Language::En => "en",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Language::Hr => "Croatian",
            Language::En => "English",
        }
    }

    pub fn all() -> [Language; 2] {
        [Language::Hr, Language::En]
    }
}

impl FromStr for Language {
    type Err = LanguageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hr" => Ok(Language::Hr),
            "en" => Ok(Language::En),
            _ => Err(LanguageParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_croatian() {
        assert_eq!(Language::default(), Language::Hr);
    }

    #[test]
    fn parses_codes_loosely() {
        assert_eq!("hr".parse::<Language>(), Ok(Language::Hr));
        assert_eq!(" EN ".parse::<Language>(), Ok(Language::En));
        assert!("de".parse::<Language>().is_err());
        assert!("".parse::<Language>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_codes() {
        assert_eq!(serde_json::to_string(&Language::En).unwrap(), "\"en\"");
        let lang: Language = serde_json::from_str("\"hr\"").unwrap();
        assert_eq!(lang, Language::Hr);
        assert!(serde_json::from_str::<Language>("\"fr\"").is_err());
    }
}
