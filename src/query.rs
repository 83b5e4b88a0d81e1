use anyhow::Result;
use serde::Serialize;
use std::str::FromStr;

pub const DEFAULT_LIMIT: u32 = 5;
pub const DEFAULT_PAGE: u32 = 1;

/// News languages offered by the provider: (variant, provider code, selector label).
const LANGUAGE_TABLE: &[(Language, &str, &str)] = &[
    (Language::En, "en", "English"),
    (Language::Zh, "zh", "Chinese"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

impl Language {
    /// Provider-side language code sent as the `language` query parameter.
    pub fn code(&self) -> &'static str {
        LANGUAGE_TABLE
            .iter()
            .find(|(lang, _, _)| lang == self)
            .map(|(_, code, _)| *code)
            .unwrap_or("en")
    }

    pub fn label(&self) -> &'static str {
        LANGUAGE_TABLE
            .iter()
            .find(|(lang, _, _)| lang == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("English")
    }

    /// Resolve a selector value. Unknown labels fall back to English since the
    /// selector only ever offers the table entries.
    pub fn from_label(input: &str) -> Self {
        input.parse().unwrap_or_default()
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        LANGUAGE_TABLE
            .iter()
            .find(|(_, code, label)| {
                code.eq_ignore_ascii_case(needle) || label.eq_ignore_ascii_case(needle)
            })
            .map(|(lang, _, _)| *lang)
            .ok_or_else(|| anyhow::anyhow!("Unsupported language: '{}'", s))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Parameters for one fetch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryOptions {
    language: Language,
    limit: u32,
    page: u32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        QueryOptions {
            language: Language::En,
            limit: DEFAULT_LIMIT,
            page: DEFAULT_PAGE,
        }
    }
}

impl QueryOptions {
    pub fn new(language: Language, limit: u32, page: u32) -> Result<Self> {
        if limit < 1 {
            anyhow::bail!("limit must be at least 1, got {}", limit);
        }
        if page < 1 {
            anyhow::bail!("page must be at least 1, got {}", page);
        }
        Ok(QueryOptions {
            language,
            limit,
            page,
        })
    }

    /// Build options from the dashboard controls: a language selector value and
    /// the free-text "number of articles" field.
    pub fn from_user_input(language: &str, limit: &str) -> Self {
        QueryOptions {
            language: Language::from_label(language),
            limit: parse_limit(limit),
            page: DEFAULT_PAGE,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}

/// Non-numeric input and values below 1 resolve to the default limit;
/// integers too large for `u32` saturate.
pub fn parse_limit(input: &str) -> u32 {
    let trimmed = input.trim();
    match trimmed.parse::<i128>() {
        Ok(n) if n >= 1 => u32::try_from(n).unwrap_or(u32::MAX),
        Ok(_) => DEFAULT_LIMIT,
        // Digits beyond i128 are still a valid positive integer
        Err(_) if is_large_positive_integer(trimmed) => u32::MAX,
        Err(_) => DEFAULT_LIMIT,
    }
}

fn is_large_positive_integer(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && digits.bytes().any(|b| b != b'0')
}
