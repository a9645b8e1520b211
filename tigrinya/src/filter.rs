//! Post-stemming token filter.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{tokenise::Token, Error, Result};

/// Drops stems that are too short or too rare within one document.
///
/// Surviving tokens keep their order and duplicates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FrequencyFilter {
    /// Minimum stem length in graphemes.
    #[serde(default = "default_min_length")]
    pub min_length: usize,

    /// Percentile (0-100) of the term frequencies below which stems are dropped.
    #[serde(default)]
    pub frequency_percentile: Option<f64>,
}

fn default_min_length() -> usize {
    3
}

impl Default for FrequencyFilter {
    fn default() -> Self {
        Self {
            min_length: default_min_length(),
            frequency_percentile: None,
        }
    }
}

impl FrequencyFilter {
    pub(crate) fn validate(&self) -> Result<()> {
        match self.frequency_percentile {
            Some(p) if !(0.0..=100.0).contains(&p) => Err(Error::Config(format!(
                "frequency percentile {} is outside 0..=100",
                p
            ))),
            _ => Ok(()),
        }
    }

    /// Apply the filter to the stems of one document.
    pub fn apply(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut frequencies = HashMap::<&str, usize>::new();
        for token in &tokens {
            *frequencies.entry(token.value.as_str()).or_default() += 1;
        }

        let threshold = self.frequency_percentile.map_or(0.0, |p| {
            let mut counts = frequencies.values().copied().collect::<Vec<_>>();
            percentile(&mut counts, p)
        });

        let keep = tokens
            .iter()
            .map(|token| {
                token.value.chars().count() >= self.min_length
                    && frequencies[token.value.as_str()] as f64 >= threshold
            })
            .collect::<Vec<_>>();

        tokens
            .into_iter()
            .zip(keep)
            .filter_map(|(token, keep)| keep.then(|| token))
            .collect()
    }
}

/// Percentile with linear interpolation between the closest ranks.
fn percentile(values: &mut [usize], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();

    let rank = (values.len() - 1) as f64 * p / 100.0;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;

    values[lower] as f64 + (values[upper] as f64 - values[lower] as f64) * fraction
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<Token> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Token::with_offset_at((*v).to_owned(), i as u64))
            .collect()
    }

    fn values(tokens: Vec<Token>) -> Vec<String> {
        tokens.into_iter().map(|t| t.value).collect()
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        assert_eq!(percentile(&mut [1, 2, 3, 4], 50.0), 2.5);
        assert_eq!(percentile(&mut [4, 1, 1], 10.0), 1.0);
        assert!((percentile(&mut [1, 5, 1, 3], 10.0) - 1.0).abs() < f64::EPSILON);
        assert_eq!(percentile(&mut [], 10.0), 0.0);
        assert_eq!(percentile(&mut [2, 7], 100.0), 7.0);
    }

    #[test]
    fn short_stems_are_dropped() {
        let filter = FrequencyFilter::default();

        assert_eq!(
            values(filter.apply(tokens(&["ሰላም", "ኣብ", "ሕዳር", "ጋ"]))),
            vec!["ሰላም", "ሕዳር"]
        );
    }

    #[test]
    fn rare_stems_are_dropped_keeping_order_and_duplicates() {
        let filter = FrequencyFilter {
            min_length: 1,
            frequency_percentile: Some(50.0),
        };
        let input = tokens(&["ሰላም", "ሕዳር", "ሰላም", "ጋደል", "ሰላም", "ሕዳር"]);

        // frequencies 3, 2, 1 -> median 2
        assert_eq!(
            values(filter.apply(input)),
            vec!["ሰላም", "ሕዳር", "ሰላም", "ሰላም", "ሕዳር"]
        );
    }

    #[test]
    fn out_of_range_percentile_is_rejected() {
        let filter = FrequencyFilter {
            min_length: 3,
            frequency_percentile: Some(120.0),
        };

        assert!(matches!(filter.validate(), Err(Error::Config(_))));
    }
}
