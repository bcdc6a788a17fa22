//! Join Engine
//!
//! Inner equi-joins built on a hash table over the build side:
//!
//! ```text
//! build side  -> HashMap<K, Vec<&B>>
//! probe side  -> for each row, emit combine(b, p) for every b under p's key
//! ```
//!
//! Multiplicity is preserved on both sides and output follows probe order,
//! so the same inputs always produce the same sequence. Rows with no partner
//! are dropped; an empty side yields an empty result.
//!
//! After each join only the columns still needed downstream are kept:
//!
//! ```text
//! users ⋈ ratings   on user_id  -> (movie_id, rating)
//!       ⋈ movies    on movie_id -> JoinedRow { genre, year, rating }
//! ```

use rayon::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;

use crate::record::{JoinedRow, NormalizedMovie, RatingRecord, UserRecord};

/// A rating that passed the user join, reduced to what the movie join needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatedMovie {
    pub movie_id: i32,
    pub rating: i32,
}

/// Controls whether the probe side is split across worker threads
#[derive(Debug, Clone, Copy)]
pub struct JoinOptions {
    pub parallel: bool,
    /// Probe sides smaller than this stay on the calling thread
    pub min_rows_per_partition: usize,
}

impl Default for JoinOptions {
    fn default() -> Self {
        JoinOptions {
            parallel: false,
            min_rows_per_partition: 4096,
        }
    }
}

fn build_index<B, K, FB>(build: &[B], build_key: FB) -> HashMap<K, Vec<&B>>
where
    K: Eq + Hash,
    FB: Fn(&B) -> K,
{
    let mut index: HashMap<K, Vec<&B>> = HashMap::with_capacity(build.len());
    for row in build {
        index.entry(build_key(row)).or_default().push(row);
    }
    index
}

/// Inner equi-join of `build` and `probe`.
pub fn hash_join<B, P, K, O, FB, FP, FC>(
    build: &[B],
    probe: &[P],
    build_key: FB,
    probe_key: FP,
    combine: FC,
) -> Vec<O>
where
    K: Eq + Hash,
    FB: Fn(&B) -> K,
    FP: Fn(&P) -> K,
    FC: Fn(&B, &P) -> O,
{
    if build.is_empty() || probe.is_empty() {
        return Vec::new();
    }
    let index = build_index(build, build_key);
    let mut out = Vec::new();
    for p in probe {
        if let Some(matches) = index.get(&probe_key(p)) {
            out.extend(matches.iter().map(|b| combine(*b, p)));
        }
    }
    out
}

/// Same as [`hash_join`] with the probe side partitioned across the current
/// rayon pool. Output order is identical to the sequential version.
pub fn par_hash_join<B, P, K, O, FB, FP, FC>(
    build: &[B],
    probe: &[P],
    build_key: FB,
    probe_key: FP,
    combine: FC,
) -> Vec<O>
where
    B: Sync,
    P: Sync,
    K: Eq + Hash + Send + Sync,
    O: Send,
    FB: Fn(&B) -> K,
    FP: Fn(&P) -> K + Sync,
    FC: Fn(&B, &P) -> O + Sync,
{
    if build.is_empty() || probe.is_empty() {
        return Vec::new();
    }
    let index = build_index(build, build_key);
    probe
        .par_iter()
        .flat_map_iter(|p| {
            index
                .get(&probe_key(p))
                .into_iter()
                .flatten()
                .map(|b| combine(*b, p))
                .collect::<Vec<_>>()
        })
        .collect()
}

fn join_with<B, P, K, O, FB, FP, FC>(
    build: &[B],
    probe: &[P],
    build_key: FB,
    probe_key: FP,
    combine: FC,
    options: &JoinOptions,
) -> Vec<O>
where
    B: Sync,
    P: Sync,
    K: Eq + Hash + Send + Sync,
    O: Send,
    FB: Fn(&B) -> K,
    FP: Fn(&P) -> K + Sync,
    FC: Fn(&B, &P) -> O + Sync,
{
    if options.parallel && probe.len() >= options.min_rows_per_partition {
        par_hash_join(build, probe, build_key, probe_key, combine)
    } else {
        hash_join(build, probe, build_key, probe_key, combine)
    }
}

/// `users ⋈ ratings` on `user_id`; user columns are dropped.
pub fn join_ratings_with_users(
    users: &[UserRecord],
    ratings: &[RatingRecord],
    options: &JoinOptions,
) -> Vec<RatedMovie> {
    join_with(
        users,
        ratings,
        |u| u.user_id,
        |r| r.user_id,
        |_, r| RatedMovie {
            movie_id: r.movie_id,
            rating: r.rating,
        },
        options,
    )
}

/// `rated ⋈ movies` on `movie_id`; movie ids are dropped.
pub fn join_with_movies(
    rated: &[RatedMovie],
    movies: &[NormalizedMovie],
    options: &JoinOptions,
) -> Vec<JoinedRow> {
    join_with(
        movies,
        rated,
        |m| m.movie_id,
        |r| r.movie_id,
        |m, r| JoinedRow {
            genre: m.genre.clone(),
            year: m.year,
            rating: r.rating,
        },
        options,
    )
}
