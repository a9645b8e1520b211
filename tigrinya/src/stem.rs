//! Affix-stripping stemmer with reduplication collapse.
//!
//! A word goes through five steps, each one feeding the next:
//!
//!  1. prefix/suffix pair stripping
//!  2. double reduplication collapse (`ገልጠምጠም` -> `ገልጠም`)
//!  3. prefix stripping
//!  4. suffix stripping
//!  5. single reduplication collapse (`ሰባቢሩ` -> `ሰባሩ`)
//!
//! No step leaves a word with fewer than three radicals if it had at least three. Affixes are
//! matched on the phonetic form of the word, so an affix may end in the middle of a grapheme
//! (`መ` + `ንግስቲ`, `me` + `ngsti`). If the remainder can no longer be written in graphemes the step
//! keeps its input.

use std::sync::Arc;

use tracing::warn;

use crate::{
    codec::{consonants, radical_count, GraphemeTable},
    normalise::TokenNormaliser,
    tokenise::Token,
    Config, Error, Result,
};

/// Stripping never goes below this many radicals.
pub const MIN_RADICALS: usize = 3;

const DOUBLE_REDUPLICATION_MIN_RADICALS: usize = 5;
const SINGLE_REDUPLICATION_MIN_RADICALS: usize = 4;

/// Output of every stemming step for one word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StemSteps {
    pub pairs: String,
    pub double_reduplication: String,
    pub prefixes: String,
    pub suffixes: String,
    pub single_reduplication: String,
}

impl StemSteps {
    /// The final stem.
    pub fn stem(&self) -> &str {
        &self.single_reduplication
    }
}

/// Tigrinya stemmer.
///
/// Holds the affix lists in phonetic form; the stemmer itself keeps no state between words.
pub struct Stemmer {
    config: Arc<Config>,
    pairs: Vec<(String, String)>,
    prefixes: Vec<String>,
    suffixes: Vec<String>,
}

impl Stemmer {
    /// Create a stemmer with the rules of `config`.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let table = config.graphemes();
        let transliterate_all = |affixes: &[String]| {
            affixes
                .iter()
                .map(|affix| table.transliterate(affix))
                .collect::<Result<Vec<_>>>()
        };

        let pairs = config
            .pairs()
            .iter()
            .map(|pair| {
                Ok((
                    table.transliterate(&pair.prefix)?,
                    table.transliterate(&pair.suffix)?,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        let prefixes = transliterate_all(config.prefixes())?;
        let suffixes = transliterate_all(config.suffixes())?;

        Ok(Self {
            config,
            pairs,
            prefixes,
            suffixes,
        })
    }

    fn graphemes(&self) -> &GraphemeTable {
        self.config.graphemes()
    }

    /// Stem a word.
    ///
    /// Fails only if the word contains a character outside the grapheme table. Transcription
    /// failures inside a step are absorbed by that step.
    pub fn stem(&self, word: &str) -> Result<String> {
        self.steps(word).map(|steps| steps.single_reduplication)
    }

    /// Stem a word and keep the output of every step.
    pub fn steps(&self, word: &str) -> Result<StemSteps> {
        if let Some(ch) = word.chars().find(|&ch| !self.graphemes().contains(ch)) {
            return Err(Error::InvalidGrapheme {
                ch,
                word: word.to_owned(),
            });
        }

        let pairs = self.remove_prefix_suffix_pair(word);
        let double_reduplication = self.remove_double_reduplication(&pairs);
        let prefixes = self.remove_prefix(&double_reduplication);
        let suffixes = self.remove_suffix(&prefixes);
        let single_reduplication = self.remove_single_reduplication(&suffixes);

        Ok(StemSteps {
            pairs,
            double_reduplication,
            prefixes,
            suffixes,
            single_reduplication,
        })
    }

    /// Strip prefix/suffix pairs; they usually derive nouns from verbs (`መ...ቲ`).
    pub fn remove_prefix_suffix_pair(&self, word: &str) -> String {
        self.strip_phonetic(word, "pairs", |mut stemmed| {
            for (prefix, suffix) in &self.pairs {
                if radical_count(&stemmed) <= MIN_RADICALS {
                    break;
                }
                let core = stemmed
                    .strip_prefix(prefix.as_str())
                    .and_then(|rest| rest.strip_suffix(suffix.as_str()));
                if let Some(core) = core.filter(|core| radical_count(core) >= MIN_RADICALS) {
                    stemmed = core.to_owned();
                }
            }
            stemmed
        })
    }

    /// Collapse the first two-grapheme sequence that is immediately repeated.
    pub fn remove_double_reduplication(&self, word: &str) -> String {
        if self.radicals(word) < Some(DOUBLE_REDUPLICATION_MIN_RADICALS) {
            return word.to_owned();
        }

        let graphemes = word.chars().collect::<Vec<_>>();
        match graphemes.windows(4).position(|w| w[..2] == w[2..]) {
            Some(i) => graphemes[..i + 2]
                .iter()
                .chain(&graphemes[i + 4..])
                .collect(),
            None => word.to_owned(),
        }
    }

    /// Strip prefixes in list order.
    pub fn remove_prefix(&self, word: &str) -> String {
        self.strip_phonetic(word, "prefixes", |mut stemmed| {
            for prefix in &self.prefixes {
                if radical_count(&stemmed) <= MIN_RADICALS {
                    break;
                }
                let rest = stemmed.strip_prefix(prefix.as_str());
                if let Some(rest) = rest.filter(|rest| radical_count(rest) >= MIN_RADICALS) {
                    stemmed = rest.to_owned();
                }
            }
            stemmed
        })
    }

    /// Strip suffixes in list order.
    pub fn remove_suffix(&self, word: &str) -> String {
        self.strip_phonetic(word, "suffixes", |mut stemmed| {
            for suffix in &self.suffixes {
                if radical_count(&stemmed) <= MIN_RADICALS {
                    break;
                }
                let rest = stemmed.strip_suffix(suffix.as_str());
                if let Some(rest) = rest.filter(|rest| radical_count(rest) >= MIN_RADICALS) {
                    stemmed = rest.to_owned();
                }
            }
            stemmed
        })
    }

    /// Collapse the first pair of adjacent graphemes that share a consonant.
    pub fn remove_single_reduplication(&self, word: &str) -> String {
        if self.radicals(word) < Some(SINGLE_REDUPLICATION_MIN_RADICALS) {
            return word.to_owned();
        }

        let graphemes = word.chars().collect::<Vec<_>>();
        let skeletons = graphemes
            .iter()
            .map(|&g| self.graphemes().unit(g).map(consonants))
            .collect::<Option<Vec<_>>>();
        let Some(skeletons) = skeletons else {
            return word.to_owned();
        };

        match skeletons.windows(2).position(|w| w[0] == w[1]) {
            Some(i) => graphemes[..=i]
                .iter()
                .chain(&graphemes[i + 2..])
                .collect(),
            None => word.to_owned(),
        }
    }

    fn radicals(&self, word: &str) -> Option<usize> {
        self.graphemes()
            .transliterate(word)
            .ok()
            .map(|phonetic| radical_count(&phonetic))
    }

    /// Run `strip` on the phonetic form of `word` and write the result back in graphemes.
    fn strip_phonetic<F>(&self, word: &str, step: &'static str, strip: F) -> String
    where
        F: FnOnce(String) -> String,
    {
        let phonetic = match self.graphemes().transliterate(word) {
            Ok(phonetic) => phonetic,
            Err(e) => {
                warn!(%word, step, error = %e, "cannot transliterate, keeping the word");
                return word.to_owned();
            }
        };

        let stemmed = strip(phonetic);
        match self.graphemes().transcribe(&stemmed) {
            Ok(stemmed) => stemmed,
            Err(e) => {
                warn!(%word, %stemmed, step, error = %e, "cannot transcribe, keeping the word");
                word.to_owned()
            }
        }
    }
}

impl TokenNormaliser for Stemmer {
    fn normalise(&self, token: Token) -> Option<Token> {
        match self.stem(&token.value) {
            Ok(value) => Some(Token {
                value,
                offset: token.offset,
            }),
            Err(e) => {
                warn!(token = %token.value, error = %e, "skipping a token");
                None
            }
        }
    }
}
