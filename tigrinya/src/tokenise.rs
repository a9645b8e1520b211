//! This module defines tokenising facilities to split the given text into tokens.
//!
//! Tokeniser is any type that implements [`Tokeniser`] trait. [`EthiopicTokeniser`] is the
//! tokeniser used by [`crate::Pipeline`]: it cuts attached clitics at apostrophe-like marks,
//! deletes punctuation and drops every word that is not spelled entirely with graphemes from the
//! configured table.
use std::{
    io::{self, BufRead},
    sync::Arc,
    vec,
};

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::Config;

/// Apostrophe-like marks that attach a clitic to the preceding word.
pub const CLITIC_MARKS: [char; 7] = [
    '\u{0027}', // Apostrophe.
    '\u{2018}', // Left Single Quotation Mark.
    '\u{2019}', // Right Single Quotation Mark.
    '\u{2032}', // Prime.
    '\u{02BC}', // Modifier Letter Apostrophe.
    '\u{0060}', // Grave Accent.
    '\u{00B4}', // Acute Accent.
];

/// Latin punctuation deleted before tokens are validated.
pub const PUNCTUATION: [char; 26] = [
    '\u{002E}', // Period.
    '\u{002C}', // Comma.
    '\u{0021}', // Exclamation Mark.
    '\u{003F}', // Question Mark.
    '\u{003A}', // Colon.
    '\u{003B}', // Semicolon.
    '\u{0027}', // Apostrophe.
    '\u{0022}', // Double Quotation Mark.
    '\u{201C}', // Left Double Quotation Mark.
    '\u{201D}', // Right Double Quotation Mark.
    '\u{2018}', // Left Single Quotation Mark.
    '\u{2019}', // Right Single Quotation Mark.
    '\u{2010}', // Hyphen.
    '\u{2013}', // En Dash.
    '\u{2014}', // Em Dash.
    '\u{0028}', // Left Parenthesis.
    '\u{0029}', // Right Parenthesis.
    '\u{005B}', // Left Square Bracket.
    '\u{005D}', // Right Square Bracket.
    '\u{007B}', // Left Curly Bracket.
    '\u{007D}', // Right Curly Bracket.
    '\u{2026}', // Ellipsis.
    '\u{002F}', // Slash.
    '\u{005C}', // Backslash.
    '\u{0026}', // Ampersand.
    '\u{002A}', // Asterisk.
];

/// Ethiopic word space, full stop, comma, semicolon, colon, preface colon, question mark and
/// paragraph separator.
const ETHIOPIC_SEPARATORS: (char, char) = ('\u{1361}', '\u{1368}');

/// Token specifies a parsed value and its original offset in the text.
///
/// The length of the value and its representation may differ from the original found in the text
/// due to applied normalisers.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Token {
    /// Token's string value.
    pub value: String,

    /// Byte offset of the source word in the NFC-normalised text.
    pub offset: u64,
}

impl Token {
    /// Create a new token with the given string value and an offset of zero.
    pub fn new(value: String) -> Self {
        Self { value, offset: 0 }
    }

    /// Create a new token with the given string value at the specified offset.
    pub fn with_offset_at(value: String, offset: u64) -> Self {
        Self { value, offset }
    }
}

/// Tokeniser knows how to split an incoming text in distinct tokens.
pub trait Tokeniser: Send + Sync {
    /// Read a subsequent token from the given `reader`.
    ///
    /// Reader should not be used between the calls to this function.
    ///
    /// The underlying implementation doesn't have to read data from the `reader` on every call,
    /// it may buffer the input and return subsequent tokens without performing additional reads.
    ///
    /// The returned value `Ok(None)` signifies the end of the token stream.
    fn read_token(&mut self, reader: &mut dyn BufRead) -> io::Result<Option<Token>>;
}

/// Cut every word at its first clitic mark, dropping the mark and everything after it.
///
/// Words are re-joined with single spaces. A word that starts with a mark leaves an empty slot
/// behind, which disappears on the next split.
pub fn handle_contraction(text: &str) -> String {
    text.split_whitespace()
        .map(strip_clitic)
        .collect::<Vec<_>>()
        .join(" ")
}

fn strip_clitic(word: &str) -> &str {
    word.find(&CLITIC_MARKS[..]).map_or(word, |at| &word[..at])
}

/// Tokeniser for Ethiopic-script text.
///
/// Contractions are handled before punctuation is deleted, since the apostrophe marks where the
/// clitic starts.
#[derive(Clone)]
pub struct EthiopicTokeniser {
    config: Arc<Config>,
    punctuation: Regex,
    pending: Option<vec::IntoIter<Token>>,
}

impl EthiopicTokeniser {
    pub fn new(config: Arc<Config>) -> Result<Self, regex::Error> {
        let latin = PUNCTUATION.iter().collect::<String>();
        let (first, last) = ETHIOPIC_SEPARATORS;
        let pattern = format!("[{}{}-{}]", regex::escape(&latin), first, last);

        Ok(Self {
            config,
            punctuation: Regex::new(&pattern)?,
            pending: None,
        })
    }

    /// Delete punctuation, split by white space and keep only the words made of alphabet
    /// graphemes. A word with a single foreign character is dropped whole.
    pub fn filter_text(&self, text: &str) -> Vec<String> {
        let text = self.punctuation.replace_all(text, "");

        text.split_whitespace()
            .filter(|word| self.config.graphemes().is_word(word))
            .map(str::to_owned)
            .collect()
    }

    /// Split `text` into tokens: [`handle_contraction`] followed by [`Self::filter_text`].
    ///
    /// Every token records the offset of the word it was cut from.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let text = text.nfc().collect::<String>();
        let start = text.as_ptr() as usize;

        text.split_whitespace()
            .filter_map(|word| {
                let offset = (word.as_ptr() as usize - start) as u64;
                let value = self.punctuation.replace_all(strip_clitic(word), "");

                (!value.is_empty() && self.config.graphemes().is_word(&value))
                    .then(|| Token::with_offset_at(value.into_owned(), offset))
            })
            .collect()
    }
}

impl Tokeniser for EthiopicTokeniser {
    fn read_token(&mut self, reader: &mut dyn BufRead) -> io::Result<Option<Token>> {
        // The whole input is read on the first call, clitic handling needs complete words.
        if self.pending.is_none() {
            let mut input = String::new();
            reader.read_to_string(&mut input)?;

            self.pending = Some(self.tokenize(&input).into_iter());
        }

        Ok(self.pending.as_mut().and_then(Iterator::next))
    }
}
