//! This module defines a [`TokenNormaliser`] trait that facilitates token normalisation.
//!
//! There are several predefined normalisers:
//!  * [`GraphemeFamilies`] - collapses phonetically merged grapheme families to one canonical form
//!  * [`StopWords`] - removes stop words, either as substrings or as whole tokens
//!  * [`crate::Stemmer`] - reduces a token to its stem
//!
//! Text-level forms of the first two are available as [`normalize`] and [`remove_stopwords`].

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::tokenise::Token;

/// Token normaliser.
///
/// Returning `None` drops the token from the stream.
pub trait TokenNormaliser: Send + Sync {
    fn normalise(&self, token: Token) -> Option<Token>;
}

/// Variant graphemes that map positionally onto a canonical series.
struct Family {
    canonical: &'static [char],
    variant: &'static [char],
}

impl Family {
    fn substitute(&self, ch: char) -> char {
        self.variant
            .iter()
            .position(|&v| v == ch)
            .map_or(ch, |i| self.canonical[i])
    }
}

/// Applied in this order.
const FAMILIES: [Family; 7] = [
    // ሀ -> ሐ
    Family {
        canonical: &['ሐ', 'ሑ', 'ሒ', 'ሓ', 'ሔ', 'ሕ', 'ሖ'],
        variant: &['ሀ', 'ሁ', 'ሂ', 'ሃ', 'ሄ', 'ህ', 'ሆ'],
    },
    // ኀ -> ሐ
    Family {
        canonical: &['ሐ', 'ሑ', 'ሒ', 'ሓ', 'ሔ', 'ሕ', 'ሖ', 'ሗ', 'ሗ'],
        variant: &['ኀ', 'ኁ', 'ኂ', 'ኃ', 'ኄ', 'ኅ', 'ኆ', 'ኇ', 'ኋ'],
    },
    // ሠ -> ሰ
    Family {
        canonical: &['ሰ', 'ሱ', 'ሲ', 'ሳ', 'ሴ', 'ስ', 'ሶ', 'ሷ'],
        variant: &['ሠ', 'ሡ', 'ሢ', 'ሣ', 'ሤ', 'ሥ', 'ሦ', 'ሧ'],
    },
    // ቐ -> ቀ
    Family {
        canonical: &[
            'ቀ', 'ቁ', 'ቂ', 'ቃ', 'ቄ', 'ቅ', 'ቆ', 'ቈ', 'ቊ', 'ቋ', 'ቌ', 'ቍ',
        ],
        variant: &[
            'ቐ', 'ቑ', 'ቒ', 'ቓ', 'ቔ', 'ቕ', 'ቖ', 'ቘ', 'ቚ', 'ቛ', 'ቜ', 'ቝ',
        ],
    },
    // ዐ -> አ
    Family {
        canonical: &['አ', 'ኡ', 'ኢ', 'ኣ', 'ኤ', 'እ', 'ኦ'],
        variant: &['ዐ', 'ዑ', 'ዒ', 'ዓ', 'ዔ', 'ዕ', 'ዖ'],
    },
    // ፀ -> ጸ
    Family {
        canonical: &['ጸ', 'ጹ', 'ጺ', 'ጻ', 'ጼ', 'ጽ', 'ጾ'],
        variant: &['ፀ', 'ፁ', 'ፂ', 'ፃ', 'ፄ', 'ፅ', 'ፆ'],
    },
    // labialised spellings
    Family {
        canonical: &['ጓ', 'ቋ'],
        variant: &['ጏ', 'ቇ'],
    },
];

/// Collapse every variant grapheme in `text` onto its canonical form.
///
/// Characters outside the families, including white space and non-Ethiopic text, are kept as is.
pub fn normalize(text: &str) -> String {
    FAMILIES.iter().fold(text.to_owned(), |text, family| {
        text.chars().map(|ch| family.substitute(ch)).collect()
    })
}

/// Grapheme family normaliser.
///
/// Converges similar sounding graphemes, see [`normalize`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GraphemeFamilies;

impl TokenNormaliser for GraphemeFamilies {
    fn normalise(&self, token: Token) -> Option<Token> {
        Some(Token {
            value: normalize(&token.value),
            offset: token.offset,
        })
    }
}

/// How stop words are matched against the text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopwordMode {
    /// Delete every occurrence of a stop word, even inside a longer token.
    #[default]
    Substring,
    /// Drop tokens that are equal to a stop word.
    WholeToken,
}

/// Remove every stop word from `text` wherever it occurs as a substring.
///
/// Stop words are removed one after another in the given order, so removing one can expose
/// another.
pub fn remove_stopwords<S>(text: &str, stop_words: &[S]) -> String
where
    S: AsRef<str>,
{
    stop_words
        .iter()
        .map(AsRef::as_ref)
        .filter(|stop_word| !stop_word.is_empty())
        .fold(text.to_owned(), |text, stop_word| {
            text.replace(stop_word, "")
        })
}

/// Stop word normaliser.
///
/// Filters out the tokens that are stop words, or strips stop words out of tokens, depending on
/// the [`StopwordMode`]. Tokens left empty are dropped.
pub enum StopWords {
    Substring(Vec<String>),
    WholeToken(HashSet<String>),
}

impl StopWords {
    pub fn new<S>(stop_words: &[S], mode: StopwordMode) -> Self
    where
        S: AsRef<str>,
    {
        let stop_words = stop_words.iter().map(|s| s.as_ref().to_owned());

        match mode {
            StopwordMode::Substring => Self::Substring(stop_words.collect()),
            StopwordMode::WholeToken => Self::WholeToken(stop_words.collect()),
        }
    }
}

impl TokenNormaliser for StopWords {
    fn normalise(&self, token: Token) -> Option<Token> {
        match self {
            StopWords::Substring(stop_words) => {
                let value = remove_stopwords(&token.value, stop_words);
                (!value.is_empty()).then(|| Token {
                    value,
                    offset: token.offset,
                })
            }
            StopWords::WholeToken(stop_words) => {
                (!stop_words.contains(&token.value)).then(|| token)
            }
        }
    }
}
