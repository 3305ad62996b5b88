//! Tokenisation and light stemming.
//!
//! Definitions and keyword phrases pass through the same pipeline, so a
//! keyword matches exactly when its token sequence occurs in the text.

use regex::Regex;
use std::sync::OnceLock;

fn camel_boundary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([\p{Ll}\p{N}])(\p{Lu})").expect("camel-case regex must compile"))
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[\p{L}\p{N}]+(?:/[\p{L}\p{N}]+)*").expect("token regex must compile")
    })
}

/// Strip plural endings: `batteries -> battery`, `sensors -> sensor`.
///
/// `-ss`, `-us` and `-is` endings are kept (`press`, `bus`, `chassis`), as
/// are words of three letters or fewer.
pub fn stem(token: &str) -> String {
    let chars = token.chars().count();
    if chars > 4
        && let Some(base) = token.strip_suffix("ies")
    {
        return format!("{base}y");
    }
    if chars > 3
        && token.ends_with('s')
        && !token.ends_with("ss")
        && !token.ends_with("us")
        && !token.ends_with("is")
    {
        return token[..token.len() - 1].to_string();
    }
    token.to_string()
}

/// Lowercased, stemmed tokens of `text` in order. Letters and digits of any
/// script count as word characters.
///
/// CamelCase words are split (`TemperatureSensor -> temperature sensor`);
/// slash compounds such as `ac/dc` stay one token.
pub fn tokenize(text: &str) -> Vec<String> {
    let spaced = camel_boundary_re().replace_all(text, "$1 $2");
    let lowered = spaced.to_lowercase();
    token_re()
        .find_iter(&lowered)
        .map(|m| stem(m.as_str()))
        .collect()
}

/// Token runs of one raw definition.
///
/// Name and documentation are kept as separate segments so a phrase never
/// matches across the boundary between them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    segments: Vec<Vec<String>>,
}

impl Tokens {
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            segments: texts
                .into_iter()
                .map(tokenize)
                .filter(|segment| !segment.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Vec<String>] {
        &self.segments
    }

    /// Whether `phrase` occurs as a contiguous run in any segment.
    pub fn contains_phrase(&self, phrase: &[String]) -> bool {
        if phrase.is_empty() {
            return false;
        }
        self.segments
            .iter()
            .any(|segment| segment.windows(phrase.len()).any(|window| window == phrase))
    }
}
