use std::{
    fs,
    io::{BufRead, BufReader},
    path::Path,
    sync::Arc,
    time::Instant,
};

use rayon::prelude::*;
use tracing::{instrument, trace};

use crate::{
    filter::FrequencyFilter,
    normalise::{self, TokenNormaliser},
    stem::StemSteps,
    tokenise::{EthiopicTokeniser, Token, Tokeniser},
    Config, Error, Result, Stemmer,
};

/// Pipeline turns raw Ethiopic text into the ordered sequence of its stems.
///
/// Text is split by the [`EthiopicTokeniser`], then every token is passed through the
/// [`normalise::TokenNormaliser`]s in a fixed order:
///
///  1. [`normalise::GraphemeFamilies`]
///  2. [`normalise::StopWords`], in the configured [`normalise::StopwordMode`]
///  3. [`Stemmer`]
///
/// Tokens dropped by a normaliser do not reach the following ones. If the configuration has a
/// [`FrequencyFilter`], it is applied to the stems of each processed text.
///
/// Every stage is a function of the token and the shared [`Config`], so a pipeline can be used
/// from several threads concurrently, see [`Pipeline::process_documents`].
pub struct Pipeline {
    config: Arc<Config>,
    tokeniser: EthiopicTokeniser,
    token_normalisers: Vec<Box<dyn TokenNormaliser>>,
    stemmer: Stemmer,
    post_filter: Option<FrequencyFilter>,
}

impl Pipeline {
    /// Create a new [`Pipeline`] over the given configuration.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let tokeniser = EthiopicTokeniser::new(Arc::clone(&config))
            .map_err(|e| Error::Config(format!("punctuation pattern: {}", e)))?;
        let stemmer = Stemmer::new(Arc::clone(&config))?;

        let token_normalisers: Vec<Box<dyn TokenNormaliser>> = vec![
            Box::new(normalise::GraphemeFamilies),
            Box::new(normalise::StopWords::new(
                config.stopwords(),
                config.stopword_mode(),
            )),
        ];

        Ok(Self {
            post_filter: config.post_filter(),
            config,
            tokeniser,
            token_normalisers,
            stemmer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stemmer(&self) -> &Stemmer {
        &self.stemmer
    }

    /// Stem the text, keeping the offset of every source word.
    pub fn process_tokens(&self, text: &str) -> Vec<Token> {
        let tokens = self
            .tokeniser
            .tokenize(text)
            .into_iter()
            .filter_map(|token| self.normalise(token))
            .collect();

        self.post_filter(tokens)
    }

    /// Stem the text.
    pub fn process(&self, text: &str) -> Vec<String> {
        values(self.process_tokens(text))
    }

    /// Run a single word through the same stages.
    ///
    /// Returns `None` if the word is dropped by the tokeniser or the stop word filter. The
    /// frequency filter is not applied.
    pub fn process_word(&self, word: &str) -> Option<String> {
        self.tokeniser
            .tokenize(word)
            .into_iter()
            .next()
            .and_then(|token| self.normalise(token))
            .map(|token| token.value)
    }

    /// Run a single word through the same stages as [`Self::process_word`], keeping the output
    /// of every stemming step.
    ///
    /// Returns `None` if the word is dropped before it reaches the stemmer.
    pub fn word_steps(&self, word: &str) -> Option<StemSteps> {
        let token = self.tokeniser.tokenize(word).into_iter().next()?;
        let token = self.pre_stem(token)?;

        self.stemmer.steps(&token.value).ok()
    }

    /// Stem the text read from `reader`.
    pub fn process_reader<R>(&self, mut reader: R) -> Result<Vec<String>>
    where
        R: BufRead,
    {
        let mut tokeniser = self.tokeniser.clone();
        let mut tokens = Vec::new();
        let mut words_count = 0;

        while let Some(token) = tokeniser.read_token(&mut reader)? {
            words_count += 1;

            if let Some(token) = self.normalise(token) {
                tokens.push(token);
            }
        }

        trace!(%words_count, stems = tokens.len(), "processed a text");

        Ok(values(self.post_filter(tokens)))
    }

    /// Stem the contents of a text file.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn process_file(&self, path: &Path) -> Result<Vec<String>> {
        let start = Instant::now();
        let reader = BufReader::new(fs::File::open(path)?);

        let stems = self.process_reader(reader)?;
        trace!(duration = ?start.elapsed(), "processed a file");

        Ok(stems)
    }

    /// Stem several documents in parallel.
    ///
    /// The result holds the stems of every document in the order the documents were given.
    pub fn process_documents<S>(&self, documents: &[S]) -> Vec<Vec<String>>
    where
        S: AsRef<str> + Sync,
    {
        documents
            .par_iter()
            .map(|document| self.process(document.as_ref()))
            .collect()
    }

    /// Normalise the given token by applying sequentially all configured normalisers.
    fn normalise(&self, token: Token) -> Option<Token> {
        self.pre_stem(token)
            .and_then(|token| self.stemmer.normalise(token))
    }

    fn pre_stem(&self, token: Token) -> Option<Token> {
        self.token_normalisers
            .iter()
            .try_fold(token, |token, norm| norm.normalise(token))
    }

    fn post_filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        match &self.post_filter {
            Some(filter) => filter.apply(tokens),
            None => tokens,
        }
    }
}

fn values(tokens: Vec<Token>) -> Vec<String> {
    tokens.into_iter().map(|token| token.value).collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::normalise::StopwordMode;

    const TEXT: &str = "ሓደ ረፍዲ ‘ክናፈስ’ ብምባል ካብ መዓስከሩ ወጸ ። ብምምሕዳር ሀገር ፡ መንግስቲ ሰባቢሩ ።";

    fn pipeline() -> Pipeline {
        Pipeline::new(Arc::new(Config::embedded().unwrap())).unwrap()
    }

    fn unfiltered() -> Pipeline {
        let config = Config::embedded().unwrap().without_post_filter();
        Pipeline::new(Arc::new(config)).unwrap()
    }

    #[test]
    fn text_is_reduced_to_stems_in_source_order() {
        assert_eq!(
            unfiltered().process(TEXT),
            vec!["ሓደ", "ረፍዲ", "ምባል", "መኣስከሩ", "ወጸ", "ሕዳር", "ሐገር", "ንግስ", "ሰባሩ"]
        );
    }

    #[test]
    fn stems_keep_source_offsets() {
        let tokens = pipeline().process_tokens("ብምምሕዳር ሀገር");

        assert_eq!(
            tokens,
            vec![
                Token::with_offset_at("ሕዳር".to_owned(), 0),
                Token::with_offset_at("ሐገር".to_owned(), 19),
            ]
        );
    }

    #[test]
    fn substring_stop_words_corrupt_containing_tokens() {
        // `ኣብ` is a stop word and is also removed from inside `ኣብያተ`.
        assert_eq!(unfiltered().process("ኣብ ኣብያተ ክርስትያን"), vec!["ያተ", "ርስትያ"]);
    }

    #[test]
    fn whole_token_stop_words_leave_containing_tokens() {
        let config = Config::embedded()
            .unwrap()
            .without_post_filter()
            .with_stopword_mode(StopwordMode::WholeToken);
        let pipeline = Pipeline::new(Arc::new(config)).unwrap();

        assert_eq!(pipeline.process("ኣብ ኣብያተ ክርስትያን"), vec!["ኣብያተ", "ርስትያ"]);
    }

    #[test]
    fn single_word_goes_through_every_stage() {
        let pipeline = pipeline();

        assert_eq!(pipeline.process_word("ሀገር").as_deref(), Some("ሐገር"));
        assert_eq!(pipeline.process_word("ሰሙን’ዚ").as_deref(), Some("ሰሙን"));
        assert_eq!(pipeline.process_word("ኣብ"), None);
        assert_eq!(pipeline.process_word("hello"), None);
    }

    #[test]
    fn documents_are_processed_in_parallel_keeping_order() {
        let pipeline = pipeline();
        let documents = vec![TEXT, "ሰላም", "", "ብምምሕዳር ሀገር"];

        let expected = documents
            .iter()
            .map(|d| pipeline.process(d))
            .collect::<Vec<_>>();

        assert_eq!(pipeline.process_documents(&documents), expected);
    }

    #[test]
    fn reader_and_file_match_in_memory_processing() {
        let pipeline = pipeline();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TEXT.as_bytes()).unwrap();

        assert_eq!(
            pipeline.process_reader(TEXT.as_bytes()).unwrap(),
            pipeline.process(TEXT)
        );
        assert_eq!(
            pipeline.process_file(file.path()).unwrap(),
            pipeline.process(TEXT)
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(matches!(
            pipeline().process_file(Path::new("/nonexistent/ሰላም.txt")),
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn default_configuration_drops_short_and_rare_stems() {
        let pipeline = pipeline();

        assert_eq!(
            pipeline.process(TEXT),
            vec!["ረፍዲ", "ምባል", "መኣስከሩ", "ሕዳር", "ሐገር", "ንግስ", "ሰባሩ"]
        );
        assert_eq!(
            pipeline.process("ሓደ ወጸ ሰላም ሰላም ብምምሕዳር"),
            vec!["ሰላም", "ሰላም", "ሕዳር"]
        );
        // frequencies 3 and 1, the 10th percentile is 1.2
        assert_eq!(
            pipeline.process("ሰላም ሰላም ሰላም ብምምሕዳር"),
            vec!["ሰላም", "ሰላም", "ሰላም"]
        );
    }

    #[test]
    fn word_steps_follow_the_stop_word_stage() {
        let pipeline = pipeline();

        let steps = pipeline.word_steps("ብምምሕዳር").unwrap();
        assert_eq!(steps.prefixes, "ሕዳር");
        assert_eq!(Some(steps.stem()), pipeline.process_word("ብምምሕዳር").as_deref());

        // `ኣብ` is removed before stemming starts.
        assert_eq!(pipeline.word_steps("ኣብያተ").unwrap().pairs, "ያተ");
        assert_eq!(pipeline.word_steps("ሀገር").unwrap().stem(), "ሐገር");
        assert_eq!(pipeline.word_steps("ኣብ"), None);
        assert_eq!(pipeline.word_steps("hello"), None);
    }

    #[test]
    fn post_filter_drops_short_stems() {
        let config = Config::embedded()
            .unwrap()
            .without_post_filter()
            .with_post_filter(FrequencyFilter::default())
            .unwrap();
        let pipeline = Pipeline::new(Arc::new(config)).unwrap();

        assert_eq!(
            pipeline.process("ወጸ ሰላም ሓደ ብምምሕዳር"),
            vec!["ሰላም", "ሕዳር"]
        );
    }
}
