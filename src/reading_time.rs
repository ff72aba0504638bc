//! Estimates how long an article takes to read from the word count of its
//! content sections.

use crate::post::ContentSection;
use crate::richtext::as_text;
use serde::Deserialize;

pub const WORDS_PER_MINUTE: usize = 200;

/// How partial minutes are rounded.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Rounds the running total up after every section. Multi-section
    /// articles come out slightly longer than [`Rounding::Total`]; this is how
    /// the blog has always computed it.
    PerSection,

    /// Rounds the total word count up once.
    Total,
}

impl Default for Rounding {
    fn default() -> Self {
        Rounding::PerSection
    }
}

/// Returns the estimated reading time in whole minutes.
pub fn reading_time(sections: &[ContentSection], rounding: Rounding) -> u32 {
    let wpm = WORDS_PER_MINUTE as f64;
    match rounding {
        Rounding::PerSection => sections.iter().fold(0, |sum, section| {
            (sum as f64 + word_count(section) as f64 / wpm).ceil() as u32
        }),
        Rounding::Total => {
            let words: usize = sections.iter().map(word_count).sum();
            (words as f64 / wpm).ceil() as u32
        }
    }
}

fn word_count(section: &ContentSection) -> usize {
    as_text(&section.body).split_whitespace().count()
}
