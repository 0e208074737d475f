//! Prompt intent: what an interaction was trying to do.
//!
//! Rules are tried in order and the first match wins; anything unmatched is
//! a brainstorm.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Question,
    Request,
    Meta,
    Design,
    Decision,
    #[default]
    Brainstorm,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Question => "question",
            Self::Request => "request",
            Self::Meta => "meta",
            Self::Design => "design",
            Self::Decision => "decision",
            Self::Brainstorm => "brainstorm",
        };
        f.write_str(s)
    }
}

static INTENT_RULES: LazyLock<Vec<(Regex, Intent)>> = LazyLock::new(|| {
    [
        (r"\?\s*$", Intent::Question),
        (r"^(?:can you|could you|please|help\b)", Intent::Request),
        (r"remember|memory|store|synthesi|tier|schema", Intent::Meta),
        (r"design|architect|schema|build|implement|etl|pipeline", Intent::Design),
        (r"decide|decision|choose|pick|approve|consent", Intent::Decision),
    ]
    .into_iter()
    .map(|(p, intent)| {
        let re = RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .expect("static intent regex");
        (re, intent)
    })
    .collect()
});

pub fn classify_intent(text: &str) -> Intent {
    let text = text.trim();
    INTENT_RULES
        .iter()
        .find(|(re, _)| re.is_match(text))
        .map_or(Intent::Brainstorm, |(_, intent)| *intent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_matching_rule_wins() {
        assert_eq!(classify_intent("Should the memory be tiered?"), Intent::Question);
        assert_eq!(classify_intent("Please export my history"), Intent::Request);
        assert_eq!(classify_intent("Design the schema for memory"), Intent::Meta);
        assert_eq!(classify_intent("Implement the ETL pipeline"), Intent::Design);
        assert_eq!(classify_intent("We decided on flax"), Intent::Decision);
        assert_eq!(classify_intent("Sisal rope is rough"), Intent::Brainstorm);
    }
}
