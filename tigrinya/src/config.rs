//! Read-only configuration shared by every stage of the pipeline.
//!
//! A configuration is described by a TOML manifest:
//!
//! ```toml
//! graphemes = "graphemes.json"   # JSON object: grapheme -> phonetic unit
//! prefixes = "prefixes.txt"      # one entry per line, tried in order
//! suffixes = "suffixes.txt"
//! stopwords = "stopwords.txt"
//! stopword_mode = "substring"    # or "whole_token"
//!
//! [[pairs]]
//! prefix = "መ"
//! suffix = "ቲ"
//!
//! [post_filter]                  # optional
//! min_length = 3
//! frequency_percentile = 10.0
//! ```
//!
//! Relative paths are resolved against the manifest's directory. The library ships with a default
//! configuration, see [`Config::embedded`].

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    codec::GraphemeTable,
    filter::FrequencyFilter,
    normalise::StopwordMode,
    Error, Result,
};

const EMBEDDED_MANIFEST: &str = include_str!("../data/default.toml");

const EMBEDDED_FILES: [(&str, &str); 4] = [
    ("graphemes.json", include_str!("../data/graphemes.json")),
    ("prefixes.txt", include_str!("../data/prefixes.txt")),
    ("suffixes.txt", include_str!("../data/suffixes.txt")),
    ("stopwords.txt", include_str!("../data/stopwords.txt")),
];

/// A prefix and a suffix that are only ever stripped together.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AffixPair {
    pub prefix: String,
    pub suffix: String,
}

impl AffixPair {
    pub fn new(prefix: &str, suffix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            suffix: suffix.to_owned(),
        }
    }
}

/// Ordered stemming rules and the stop word list, written in Ethiopic script.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Rules {
    pub prefixes: Vec<String>,
    pub suffixes: Vec<String>,
    pub pairs: Vec<AffixPair>,
    pub stopwords: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    graphemes: PathBuf,
    prefixes: PathBuf,
    suffixes: PathBuf,
    stopwords: PathBuf,
    #[serde(default)]
    stopword_mode: StopwordMode,
    #[serde(default)]
    pairs: Vec<AffixPair>,
    #[serde(default)]
    post_filter: Option<FrequencyFilter>,
}

/// Grapheme table, stemming rules and stop words.
///
/// Built once before any text is processed and shared behind an [`std::sync::Arc`].
#[derive(Debug, Clone)]
pub struct Config {
    graphemes: GraphemeTable,
    rules: Rules,
    stopword_mode: StopwordMode,
    post_filter: Option<FrequencyFilter>,
}

impl Config {
    /// Create a configuration from a grapheme table and rules.
    ///
    /// Fails if a stop word contains white space, or if a rule is empty or spelled with
    /// graphemes missing from the table.
    pub fn new(graphemes: GraphemeTable, rules: Rules) -> Result<Self> {
        let affixes = rules
            .prefixes
            .iter()
            .chain(&rules.suffixes)
            .chain(rules.pairs.iter().flat_map(|p| [&p.prefix, &p.suffix]));

        for affix in affixes {
            if affix.is_empty() || !graphemes.is_word(affix) {
                return Err(Error::Config(format!(
                    "affix {:?} is not spelled with table graphemes",
                    affix
                )));
            }
        }

        if let Some(stopword) = rules
            .stopwords
            .iter()
            .find(|s| s.is_empty() || s.contains(char::is_whitespace))
        {
            return Err(Error::Config(format!("invalid stop word {:?}", stopword)));
        }

        Ok(Self {
            graphemes,
            rules,
            stopword_mode: StopwordMode::default(),
            post_filter: None,
        })
    }

    /// Use the given stop word matching mode.
    pub fn with_stopword_mode(mut self, mode: StopwordMode) -> Self {
        self.stopword_mode = mode;
        self
    }

    /// Filter stems after stemming.
    pub fn with_post_filter(mut self, filter: FrequencyFilter) -> Result<Self> {
        filter.validate()?;
        self.post_filter = Some(filter);
        Ok(self)
    }

    /// Keep every stem.
    pub fn without_post_filter(mut self) -> Self {
        self.post_filter = None;
        self
    }

    /// The configuration compiled into the library.
    ///
    /// It drops stems shorter than three graphemes and stems below the 10th percentile of the term
    /// frequencies of their document.
    pub fn embedded() -> Result<Self> {
        Self::from_manifest(EMBEDDED_MANIFEST, |path| {
            EMBEDDED_FILES
                .iter()
                .find(|(name, _)| Path::new(name) == path)
                .map(|(_, contents)| (*contents).to_owned())
                .ok_or_else(|| {
                    Error::Config(format!("no embedded source {}", path.display()))
                })
        })
    }

    /// Load a configuration from a TOML manifest on disk.
    pub fn load<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let manifest = fs::read_to_string(path)?;

        debug!(path = %path.display(), "loading configuration");

        Self::from_manifest(&manifest, |source| Ok(fs::read_to_string(base.join(source))?))
    }

    fn from_manifest<F>(manifest: &str, read: F) -> Result<Self>
    where
        F: Fn(&Path) -> Result<String>,
    {
        let manifest: Manifest = toml::from_str(manifest)?;

        let graphemes = GraphemeTable::from_json(&read(&manifest.graphemes)?)?;
        let rules = Rules {
            prefixes: parse_list(&read(&manifest.prefixes)?),
            suffixes: parse_list(&read(&manifest.suffixes)?),
            pairs: manifest.pairs,
            stopwords: parse_list(&read(&manifest.stopwords)?),
        };

        let config = Self::new(graphemes, rules)?.with_stopword_mode(manifest.stopword_mode);
        match manifest.post_filter {
            Some(filter) => config.with_post_filter(filter),
            None => Ok(config),
        }
    }

    pub fn graphemes(&self) -> &GraphemeTable {
        &self.graphemes
    }

    pub fn prefixes(&self) -> &[String] {
        &self.rules.prefixes
    }

    pub fn suffixes(&self) -> &[String] {
        &self.rules.suffixes
    }

    pub fn pairs(&self) -> &[AffixPair] {
        &self.rules.pairs
    }

    pub fn stopwords(&self) -> &[String] {
        &self.rules.stopwords
    }

    pub fn stopword_mode(&self) -> StopwordMode {
        self.stopword_mode
    }

    pub fn post_filter(&self) -> Option<FrequencyFilter> {
        self.post_filter
    }
}

/// One entry per line, blank lines skipped.
fn parse_list(text: &str) -> Vec<String> {
    text.trim_start_matches('\u{feff}')
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}
