//! This module defines the transliteration codec between Ethiopic graphemes and their phonetic
//! Latin encoding.
//!
//! Every grapheme maps to exactly one phonetic unit. A unit is one of:
//!  * a consonant followed by a vowel symbol (`ሰ` -> `se`)
//!  * a bare consonant for the sixth order (`ስ` -> `s`)
//!  * a consonant followed by the labialisation marker `W` and an optional vowel (`ቋ` -> `qWa`)
//!  * a vowel carried by the glottal stop `'` (`ኣ` -> `'a`, `እ` -> `'`)
//!
//! A leading glottal marker `` ` `` selects an alternate consonant series (`ሠ` -> `` `se ``,
//! `ዐ` -> `` `e ``). Markers never count as radicals, see [`radical_count`].
//!
//! Working on the phonetic form lets the stemmer strip affixes by linguistic unit rather than
//! by raw syllable.

use std::{
    collections::{BTreeMap, HashMap},
    iter,
};

use crate::{Error, Result};

/// Vowel symbols of the phonetic encoding.
pub const VOWELS: [char; 6] = ['e', 'u', 'i', 'a', 'E', 'o'];

/// Marker that keeps a phonetic unit open until the following consonant or vowel arrives.
pub const GLOTTAL_MARKER: char = '`';

/// Carrier of the vowel-initial graphemes.
pub const VOWEL_CARRIER: char = '\'';

/// Labialisation marker.
pub const LABIAL_MARKER: char = 'W';

/// Vowel cluster that transcription keeps in a single unit.
const IRREGULAR_DIGRAPH: &str = "ea";

/// Returns `true` if `ch` is a vowel symbol of the phonetic encoding.
pub fn is_vowel(ch: char) -> bool {
    VOWELS.contains(&ch)
}

/// Strip vowels and markers from a phonetic string, keeping the consonant skeleton.
pub fn consonants(phonetic: &str) -> String {
    phonetic
        .chars()
        .filter(|&ch| !is_vowel(ch) && !is_marker(ch))
        .collect()
}

/// Number of radicals (consonants) in a phonetic string.
pub fn radical_count(phonetic: &str) -> usize {
    phonetic
        .chars()
        .filter(|&ch| !is_vowel(ch) && !is_marker(ch))
        .count()
}

fn is_marker(ch: char) -> bool {
    matches!(ch, GLOTTAL_MARKER | VOWEL_CARRIER | LABIAL_MARKER)
}

/// Bijective mapping between graphemes and phonetic units.
#[derive(Debug, Clone)]
pub struct GraphemeTable {
    forward: HashMap<char, String>,
    inverse: HashMap<String, char>,
    /// Every unit, longest first. Used to detect malformed input before transcription.
    units: Vec<String>,
}

impl GraphemeTable {
    /// Build a table from grapheme/unit pairs.
    ///
    /// Fails if the table is empty, if a unit is empty or not ASCII, or if two graphemes share
    /// a unit.
    pub fn new<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (char, String)>,
    {
        let mut forward = HashMap::new();
        let mut inverse = HashMap::new();

        for (grapheme, unit) in entries {
            if unit.is_empty() || !unit.is_ascii() {
                return Err(Error::Config(format!(
                    "grapheme {:?} has an invalid phonetic unit {:?}",
                    grapheme, unit
                )));
            }
            if let Some(other) = inverse.insert(unit.clone(), grapheme) {
                return Err(Error::Config(format!(
                    "graphemes {:?} and {:?} share the phonetic unit {:?}",
                    other, grapheme, unit
                )));
            }
            forward.insert(grapheme, unit);
        }

        if forward.is_empty() {
            return Err(Error::Config("grapheme table is empty".to_owned()));
        }

        let mut units = inverse.keys().cloned().collect::<Vec<_>>();
        units.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        Ok(Self {
            forward,
            inverse,
            units,
        })
    }

    /// Parse a table from a JSON object mapping graphemes to phonetic units.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, String> = serde_json::from_str(json)?;

        let entries = raw
            .into_iter()
            .map(|(key, unit)| {
                let mut chars = key.chars();
                match (chars.next(), chars.next()) {
                    (Some(grapheme), None) => Ok((grapheme, unit)),
                    _ => Err(Error::Config(format!(
                        "table key {:?} is not a single grapheme",
                        key
                    ))),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(entries)
    }

    /// Number of graphemes in the alphabet.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Returns `true` if `ch` belongs to the alphabet.
    pub fn contains(&self, ch: char) -> bool {
        self.forward.contains_key(&ch)
    }

    /// Returns `true` if every character of `word` belongs to the alphabet.
    pub fn is_word(&self, word: &str) -> bool {
        word.chars().all(|ch| self.contains(ch))
    }

    /// Phonetic unit of a single grapheme.
    pub fn unit(&self, grapheme: char) -> Option<&str> {
        self.forward.get(&grapheme).map(String::as_str)
    }

    /// The alphabet in code point order.
    pub fn graphemes(&self) -> Vec<char> {
        let mut graphemes = self.forward.keys().copied().collect::<Vec<_>>();
        graphemes.sort_unstable();
        graphemes
    }

    /// Convert a word written in Ethiopic script into its phonetic form.
    pub fn transliterate(&self, word: &str) -> Result<String> {
        word.chars()
            .map(|ch| {
                self.unit(ch).ok_or_else(|| Error::InvalidGrapheme {
                    ch,
                    word: word.to_owned(),
                })
            })
            .collect()
    }

    /// Convert a phonetic string back into graphemes.
    ///
    /// The input is scanned left to right, accumulating a unit that is closed on a vowel, or on
    /// a consonant that is neither followed by a vowel nor by the labialisation marker. Units
    /// ending in the glottal marker stay open. The `ea` cluster is never split.
    pub fn transcribe(&self, phonetic: &str) -> Result<String> {
        let remainder = self.units.iter().fold(phonetic.to_owned(), |rest, unit| {
            if rest.contains(unit.as_str()) {
                rest.replace(unit.as_str(), "")
            } else {
                rest
            }
        });
        if !remainder.is_empty() {
            return Err(Error::Transcription {
                input: phonetic.to_owned(),
                reason: format!("unrecognised remainder {:?}", remainder),
            });
        }

        let chars = phonetic.chars().collect::<Vec<_>>();
        let mut word = String::with_capacity(phonetic.len());
        let mut unit = String::new();

        for (i, &ch) in chars.iter().enumerate() {
            unit.push(ch);
            let next = chars.get(i + 1).copied();

            let is_digraph = next.map_or(false, |next| {
                unit.chars().chain(iter::once(next)).eq(IRREGULAR_DIGRAPH.chars())
            });
            if is_digraph {
                continue;
            }

            let closes = if is_vowel(ch) {
                true
            } else {
                ch != GLOTTAL_MARKER
                    && next.map_or(true, |next| !is_vowel(next) && next != LABIAL_MARKER)
            };

            if closes {
                word.push(self.grapheme(&unit, phonetic)?);
                unit.clear();
            }
        }

        if !unit.is_empty() {
            return Err(Error::Transcription {
                input: phonetic.to_owned(),
                reason: format!("dangling unit {:?}", unit),
            });
        }

        Ok(word)
    }

    fn grapheme(&self, unit: &str, phonetic: &str) -> Result<char> {
        self.inverse
            .get(unit)
            .copied()
            .ok_or_else(|| Error::Transcription {
                input: phonetic.to_owned(),
                reason: format!("no grapheme for unit {:?}", unit),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use proptest::prelude::*;

    use super::*;

    fn table() -> &'static GraphemeTable {
        static TABLE: OnceLock<GraphemeTable> = OnceLock::new();
        TABLE.get_or_init(|| GraphemeTable::from_json(include_str!("../data/graphemes.json")).unwrap())
    }

    #[test]
    fn transliterated_word_is_transcribed_back() {
        let phonetic = table().transliterate("ሰላም").unwrap();

        assert_eq!(phonetic, "selam");
        assert_eq!(table().transcribe(&phonetic).unwrap(), "ሰላም");
    }

    #[test]
    fn labialised_and_marked_units_round_trip() {
        for (word, phonetic) in [("ቋንቋ", "qWanqWa"), ("ዕድመ", "`'dme"), ("ሠናይ", "`senay")] {
            assert_eq!(table().transliterate(word).unwrap(), phonetic);
            assert_eq!(table().transcribe(phonetic).unwrap(), word);
        }
    }

    #[test]
    fn vowel_after_sixth_order_stays_separate() {
        let phonetic = table().transliterate("ምኣስ").unwrap();

        assert_eq!(phonetic, "m'as");
        assert_eq!(table().transcribe(&phonetic).unwrap(), "ምኣስ");
    }

    #[test]
    fn non_alphabet_character_fails_transliteration() {
        match table().transliterate("ሰላም!") {
            Err(Error::InvalidGrapheme { ch, word }) => {
                assert_eq!(ch, '!');
                assert_eq!(word, "ሰላም!");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn malformed_phonetic_string_fails_transcription() {
        assert!(matches!(
            table().transcribe("sela7"),
            Err(Error::Transcription { .. })
        ));
        assert!(matches!(
            table().transcribe("elam"),
            Err(Error::Transcription { .. })
        ));
        assert!(matches!(
            table().transcribe("`"),
            Err(Error::Transcription { .. })
        ));
    }

    #[test]
    fn irregular_digraph_is_kept_in_one_unit() {
        let table = GraphemeTable::new(vec![
            ('ኧ', "ea".to_owned()),
            ('አ', "e".to_owned()),
            ('ኣ', "a".to_owned()),
        ])
        .unwrap();

        assert_eq!(table.transcribe("ea").unwrap(), "ኧ");
        assert_eq!(table.transcribe("aea").unwrap(), "ኣኧ");
        assert_eq!(table.transcribe("ae").unwrap(), "ኣአ");
    }

    #[test]
    fn empty_input_maps_to_empty_output() {
        assert_eq!(table().transliterate("").unwrap(), "");
        assert_eq!(table().transcribe("").unwrap(), "");
    }

    #[test]
    fn radicals_exclude_vowels_and_markers() {
        assert_eq!(radical_count("selam"), 3);
        assert_eq!(radical_count("qWanqWa"), 3);
        assert_eq!(radical_count("`'dme"), 2);
        assert_eq!(radical_count("'a'i"), 0);
        assert_eq!(consonants("`senay"), "sny");
    }

    #[test]
    fn shared_unit_is_rejected() {
        let result = GraphemeTable::new(vec![('ሰ', "se".to_owned()), ('ሠ', "se".to_owned())]);

        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn invalid_json_tables_are_rejected() {
        assert!(matches!(GraphemeTable::from_json("{}"), Err(Error::Config(_))));
        assert!(matches!(
            GraphemeTable::from_json(r#"{"ሰላ": "sela"}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            GraphemeTable::from_json(r#"{"ሰ": ""}"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            GraphemeTable::from_json("[1, 2]"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn embedded_table_is_complete() {
        assert_eq!(table().len(), 301);
        assert!(table().contains('ሀ'));
        assert!(table().contains('ፗ'));
        assert!(!table().contains('ኧ'));
    }

    fn words() -> impl Strategy<Value = String> {
        proptest::collection::vec(proptest::sample::select(table().graphemes()), 1..8)
            .prop_map(|graphemes| graphemes.into_iter().collect())
    }

    proptest! {
        #[test]
        fn prop_transcription_inverts_transliteration(word in words()) {
            let phonetic = table().transliterate(&word).unwrap();
            prop_assert_eq!(table().transcribe(&phonetic).unwrap(), word);
        }
    }
}
