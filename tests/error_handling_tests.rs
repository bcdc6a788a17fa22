//! Fatal load errors vs. absorbed anomalies.

use genre_ratings::{Config, Dataset, LoadPolicy, PipelineContext, PipelineError};
use std::fs;
use std::path::Path;

fn write_all(dir: &Path, movies: &str, users: &str, ratings: &str) -> Config {
    fs::write(dir.join("movies.dat"), movies).unwrap();
    fs::write(dir.join("users.dat"), users).unwrap();
    fs::write(dir.join("ratings.dat"), ratings).unwrap();

    let mut config = Config::default();
    config.execution.parallel = false;
    config.sources.movies = dir.join("movies.dat");
    config.sources.users = dir.join("users.dat");
    config.sources.ratings = dir.join("ratings.dat");
    config
}

#[test]
fn test_each_missing_source_is_identified() {
    for dataset in Dataset::ALL {
        let dir = tempfile::tempdir().unwrap();
        let mut config = write_all(
            dir.path(),
            "1::Toy Story (1995)::Comedy\n",
            "10::M::25::1::11111\n",
            "10::1::5::0\n",
        );
        let missing = dir.path().join("nope.dat");
        match dataset {
            Dataset::Movies => config.sources.movies = missing,
            Dataset::Users => config.sources.users = missing,
            Dataset::Ratings => config.sources.ratings = missing,
        }

        let err = PipelineContext::new(config)
            .unwrap()
            .run_from_sources()
            .unwrap_err();
        assert!(
            matches!(err, PipelineError::SourceUnavailable { dataset: d, .. } if d == dataset),
            "expected SourceUnavailable for {dataset}, got {err}"
        );
        assert!(err.to_string().contains("nope.dat"));
    }
}

#[test]
fn test_strict_schema_violation_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_all(
        dir.path(),
        "1::Toy Story (1995)::Comedy\n",
        "10::M::25::1::11111\n11::F::thirty::1::11111\n",
        "10::1::5::0\n",
    );
    let err = PipelineContext::new(config)
        .unwrap()
        .run_from_sources()
        .unwrap_err();
    match err {
        PipelineError::SchemaViolation {
            dataset,
            line,
            field,
            value,
            ..
        } => {
            assert_eq!(dataset, Dataset::Users);
            assert_eq!(line, 2);
            assert_eq!(field, "age_group");
            assert_eq!(value, "thirty");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_lenient_drops_and_counts() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_all(
        dir.path(),
        "1::Toy Story (1995)::Comedy\nnot a movie\n",
        "10::M::25::1::11111\n11::F::thirty::1::11111\n",
        "10::1::5::0\n11::1::1::0\n",
    );
    config.parser.policy = LoadPolicy::Lenient;

    let report = PipelineContext::new(config)
        .unwrap()
        .run_from_sources()
        .unwrap();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(report.rows[0].avg_rating, 5.0);
    assert_eq!(report.trace.movies.rejected, 1);
    assert_eq!(report.trace.users.rejected, 1);
    assert_eq!(report.trace.rejected(), 2);
}

#[test]
fn test_empty_sources_give_empty_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_all(dir.path(), "", "", "");
    let report = PipelineContext::new(config)
        .unwrap()
        .run_from_sources()
        .unwrap();
    assert!(report.rows.is_empty());
}

#[test]
fn test_no_surviving_rows_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_all(
        dir.path(),
        "1::Old Movie (1950)::Drama\n2::No Year::Drama\n",
        "10::M::25::1::11111\n",
        "10::1::5::0\n10::2::4::0\n",
    );
    let report = PipelineContext::new(config)
        .unwrap()
        .run_from_sources()
        .unwrap();
    assert!(report.rows.is_empty());
    assert_eq!(report.trace.ratings_joined, 2);
    assert_eq!(report.trace.joined_rows, 0);
}

#[test]
fn test_latin1_movies_file_loads_under_strict_policy() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_all(dir.path(), "", "10::M::25::1::11111\n", "10::73::4::0\n");
    let mut movies = b"73::Mis".to_vec();
    movies.push(0xE9);
    movies.extend_from_slice(b"rables, Les (1995)::Drama|War\n");
    fs::write(dir.path().join("movies.dat"), movies).unwrap();

    assert_eq!(config.parser.policy, LoadPolicy::Strict);
    let report = PipelineContext::new(config)
        .unwrap()
        .run_from_sources()
        .unwrap();
    assert_eq!(report.trace.movies.parsed, 1);
    assert_eq!(report.trace.movies.rejected, 0);
    let genres: Vec<_> = report.rows.iter().map(|r| r.genre.as_str()).collect();
    assert_eq!(genres, vec!["Drama", "War"]);
    assert!(report.rows.iter().all(|r| r.year == 1995 && r.avg_rating == 4.0));
}
