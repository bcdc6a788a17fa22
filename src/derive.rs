//! Field Deriver and Genre Normalizer
//!
//! Turns raw movie rows into one [`NormalizedMovie`] per genre:
//!
//! ```text
//! 1::Toy Story (1995)::Animation|Comedy
//!     -> year = 1995 (last 5 chars, first 4 of those)
//!     -> (1, "Animation", 1995), (1, "Comedy", 1995)
//! ```
//!
//! Titles without a trailing year yield `None`, which the year predicate
//! then drops. Nothing here returns an error.

use regex::Regex;
use std::sync::LazyLock;

use crate::filter::{RowPredicate, YearFilter};
use crate::record::{MovieRecord, NormalizedMovie};

static GENRE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\|").expect("genre separator pattern is valid"));

/// Derive the release year from a title ending in `(YYYY)`.
pub fn extract_year(title: &str) -> Option<i32> {
    let chars: Vec<char> = title.chars().collect();
    if chars.len() < 5 {
        return None;
    }
    let tail: String = chars[chars.len() - 5..chars.len() - 1].iter().collect();
    tail.trim().parse::<i32>().ok()
}

/// Split a pipe-delimited genre field, keeping token order.
///
/// An empty field yields a single empty token.
pub fn split_genres(genre: &str) -> Vec<&str> {
    GENRE_SEPARATOR.split(genre).collect()
}

/// Options for movie normalization
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    pub year_filter: YearFilter,
    pub drop_empty_genres: bool,
}

/// Derive years, drop movies failing the year predicate, then expand genres.
pub fn normalize_movies(movies: &[MovieRecord], options: &NormalizeOptions) -> Vec<NormalizedMovie> {
    let drop_empty = options.drop_empty_genres;
    movies
        .iter()
        .filter_map(|m| {
            let year = extract_year(&m.movie_name);
            if !options.year_filter.keep(&year) {
                return None;
            }
            year.map(|y| (m, y))
        })
        .flat_map(move |(m, year)| {
            split_genres(&m.genre)
                .into_iter()
                .filter(move |g| !(drop_empty && g.is_empty()))
                .map(move |g| NormalizedMovie {
                    movie_id: m.movie_id,
                    genre: g.to_string(),
                    year,
                })
        })
        .collect()
}
