//! End-to-end behavior of the repository through its public API

mod common;

use common::*;
use nrt_index::{
    FieldValue, IndexQuery, IndexRepository, JsonFieldSerializer, JsonKeyCodec, MutationRecord,
    Preset, RepositoryError, RepositorySchema, StringKeyCodec, TextSerializer, VecCollector,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use std::ops::ControlFlow;

#[test]
fn test_create_commit_query_round_trip() {
    let repo = text_repository();
    put(&repo, 7, "near real time search");
    repo.commit().unwrap();

    let hits = hits_matching(&repo, "search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, 7);
    assert!(hits[0].1 > 0.0);
}

#[test]
fn test_fruit_scenario() {
    let repo = text_repository();
    put(&repo, 1, "apple");
    put(&repo, 2, "banana");
    repo.commit().unwrap();
    assert_eq!(keys_matching(&repo, "apple"), vec![1]);

    repo.update(&1, &"cherry".to_string()).unwrap();
    repo.commit().unwrap();
    assert_eq!(keys_matching(&repo, "apple"), Vec::<u64>::new());
    assert_eq!(keys_matching(&repo, "cherry"), vec![1]);

    repo.delete(&2).unwrap();
    repo.commit().unwrap();
    assert_eq!(keys_matching(&repo, "banana"), Vec::<u64>::new());
}

#[test]
fn test_update_replaces_exactly_once() {
    let repo = text_repository();
    put(&repo, 3, "first draft");
    repo.commit().unwrap();

    repo.update(&3, &"second draft".to_string()).unwrap();
    repo.commit().unwrap();

    assert_eq!(keys_matching(&repo, "first"), Vec::<u64>::new());
    assert_eq!(keys_matching(&repo, "second"), vec![3]);
    assert_eq!(keys_matching(&repo, "draft"), vec![3]);
    assert_eq!(repo.stats().num_docs, 1);
}

#[test]
fn test_delete_of_absent_key_changes_nothing() {
    let repo = text_repository();
    put(&repo, 1, "apple");
    repo.commit().unwrap();
    let before = keys_matching(&repo, "apple");

    repo.delete(&404).unwrap();
    repo.commit().unwrap();

    assert_eq!(keys_matching(&repo, "apple"), before);
    assert_eq!(repo.stats().num_docs, 1);
}

#[test]
fn test_update_of_never_created_key_inserts() {
    let repo = text_repository();
    repo.update(&11, &"quince".to_string()).unwrap();
    repo.commit().unwrap();
    assert_eq!(keys_matching(&repo, "quince"), vec![11]);
}

#[test]
fn test_ranking_strictly_descending() {
    let repo = text_repository();
    put(&repo, 1, "fig");
    put(&repo, 2, "fig fig");
    put(&repo, 3, "fig fig fig fig");
    repo.commit().unwrap();

    let hits = hits_matching(&repo, "fig");
    let keys: Vec<u64> = hits.iter().map(|(k, _)| *k).collect();
    assert_eq!(keys, vec![3, 2, 1]);
    assert!(hits.windows(2).all(|w| w[0].1 > w[1].1));
}

#[test]
fn test_limit_caps_delivery() {
    let repo = text_repository();
    for key in 0..20 {
        put(&repo, key, "melon");
    }
    repo.commit().unwrap();

    let mut hits = VecCollector::<u64>::new();
    let outcome = repo.query(&IndexQuery::text("melon"), 5, &mut hits).unwrap();
    assert_eq!(outcome.delivered, 5);
    assert_eq!(hits.len(), 5);
}

#[test]
fn test_collector_stop_keeps_delivered_results() {
    let repo = text_repository();
    for key in 0..10 {
        put(&repo, key, "olive");
    }
    repo.commit().unwrap();

    let mut seen = Vec::new();
    let mut collector = |key: u64, _score: f32| {
        seen.push(key);
        if seen.len() == 3 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    };
    let outcome = repo
        .query(&IndexQuery::text("olive"), 10, &mut collector)
        .unwrap();

    assert!(outcome.stopped_early);
    assert_eq!(outcome.delivered, 3);
    assert_eq!(seen.len(), 3);
}

#[test]
fn test_no_match_never_calls_collector() {
    let repo = text_repository();
    put(&repo, 1, "apple");
    repo.commit().unwrap();

    let mut calls = 0;
    let mut collector = |_: u64, _: f32| {
        calls += 1;
        ControlFlow::Continue(())
    };
    repo.query(&IndexQuery::text("durian"), 10, &mut collector)
        .unwrap();
    assert_eq!(calls, 0);
}

#[test]
fn test_invalid_query_reported() {
    let repo = text_repository();
    let mut hits = VecCollector::<u64>::new();
    let err = repo
        .query(&IndexQuery::term("title", "x"), 10, &mut hits)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::InvalidQuery(_)));
}

#[test]
fn test_batch_applies_in_program_order() {
    let repo = text_repository();
    let records = vec![
        MutationRecord::Insert(1, "lemon".to_string()),
        MutationRecord::Insert(2, "lime".to_string()),
        MutationRecord::Update(1, "orange".to_string()),
        MutationRecord::Delete(2),
        MutationRecord::Update(3, "lime".to_string()),
    ];
    assert_eq!(repo.apply_batch(&records).unwrap(), 5);
    repo.commit().unwrap();

    assert_eq!(keys_matching(&repo, "lemon"), Vec::<u64>::new());
    assert_eq!(keys_matching(&repo, "orange"), vec![1]);
    assert_eq!(keys_matching(&repo, "lime"), vec![3]);
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Book {
    title: String,
    genre: String,
    year: i64,
}

fn book_repository() -> IndexRepository<String, Book> {
    let schema = RepositorySchema::builder()
        .text("title")
        .keyword("genre")
        .i64("year")
        .build()
        .unwrap();
    IndexRepository::in_ram(
        schema,
        StringKeyCodec,
        JsonFieldSerializer::all_fields(),
        test_config(Preset::Consistent),
    )
    .unwrap()
}

fn book(title: &str, genre: &str, year: i64) -> Book {
    Book {
        title: title.to_string(),
        genre: genre.to_string(),
        year,
    }
}

#[test]
fn test_structured_values_with_json_serializer() {
    let repo = book_repository();
    repo.create(&"isbn-1".to_string(), &book("Dune", "scifi", 1965))
        .unwrap();
    repo.create(&"isbn-2".to_string(), &book("Emma", "classic", 1815))
        .unwrap();
    repo.create(&"isbn-3".to_string(), &book("Dune Messiah", "scifi", 1969))
        .unwrap();
    repo.commit().unwrap();

    let mut hits = VecCollector::<String>::new();
    let query = IndexQuery::all_of(vec![
        IndexQuery::text_in(["title"], "dune"),
        IndexQuery::term("genre", "scifi"),
    ])
    .excluding(IndexQuery::term("year", FieldValue::I64(1969)));
    repo.query(&query, 10, &mut hits).unwrap();

    let keys: Vec<String> = hits.keys().cloned().collect();
    assert_eq!(keys, vec!["isbn-1".to_string()]);
}

#[test]
fn test_rejected_value_leaves_repository_usable() {
    let repo: IndexRepository<u64, String> = IndexRepository::in_ram(
        text_schema(),
        JsonKeyCodec::<u64>::new(),
        |value: &String| -> Result<nrt_index::Fields, nrt_index::SerializationError> {
            if value.is_empty() {
                return Err(nrt_index::SerializationError::new("empty value"));
            }
            Ok(vec![("body".to_string(), FieldValue::from(value.as_str()))])
        },
        test_config(Preset::Consistent),
    )
    .unwrap();

    let err = repo.create(&1, &String::new()).unwrap_err();
    assert!(matches!(err, RepositoryError::Serialization(_)));
    assert_eq!(repo.stats().pending_mutations, 0);

    repo.create(&2, &"kumquat".to_string()).unwrap();
    repo.commit().unwrap();
    let mut hits = VecCollector::<u64>::new();
    repo.query(&IndexQuery::text("kumquat"), 10, &mut hits)
        .unwrap();
    assert_eq!(hits.keys().copied().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn test_reopen_on_disk_keeps_committed_state() {
    let dir = tempfile::tempdir().unwrap();

    {
        let repo: IndexRepository<u64, String> = IndexRepository::open_in_dir(
            dir.path(),
            text_schema(),
            JsonKeyCodec::<u64>::new(),
            TextSerializer::new("body"),
            test_config(Preset::Consistent),
        )
        .unwrap();
        put(&repo, 1, "persisted");
        repo.commit().unwrap();
        put(&repo, 2, "persisted but never committed");
        repo.close().unwrap();
    }

    let reopened: IndexRepository<u64, String> = IndexRepository::open_in_dir(
        dir.path(),
        text_schema(),
        JsonKeyCodec::<u64>::new(),
        TextSerializer::new("body"),
        test_config(Preset::Consistent),
    )
    .unwrap();
    assert_eq!(keys_matching(&reopened, "persisted"), vec![1]);
}

#[test]
fn test_any_of_matches_either_branch() {
    let repo = book_repository();
    repo.create(&"isbn-1".to_string(), &book("Dune", "scifi", 1965))
        .unwrap();
    repo.create(&"isbn-2".to_string(), &book("Emma", "classic", 1815))
        .unwrap();
    repo.create(&"isbn-3".to_string(), &book("Solaris", "scifi", 1961))
        .unwrap();
    repo.commit().unwrap();

    let mut hits = VecCollector::<String>::new();
    let query = IndexQuery::any_of(vec![
        IndexQuery::text_in(["title"], "dune"),
        IndexQuery::term("genre", "classic"),
    ]);
    repo.query(&query, 10, &mut hits).unwrap();

    let mut keys: Vec<String> = hits.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, vec!["isbn-1".to_string(), "isbn-2".to_string()]);
}

#[test]
fn test_key_query_after_commit() {
    let repo = text_repository();
    put(&repo, 5, "walnut");
    put(&repo, 55, "walnut");
    repo.commit().unwrap();

    let mut hits = VecCollector::<u64>::new();
    repo.query(&repo.key_query(&55).unwrap(), 10, &mut hits)
        .unwrap();
    assert_eq!(hits.keys().copied().collect::<Vec<_>>(), vec![55]);
}

#[test]
fn test_unreadable_key_fails_query_but_keeps_delivered_hits() {
    let dir = tempfile::tempdir().unwrap();

    {
        let repo: IndexRepository<String, String> = IndexRepository::open_in_dir(
            dir.path(),
            text_schema(),
            StringKeyCodec,
            TextSerializer::new("body"),
            test_config(Preset::Consistent),
        )
        .unwrap();
        // "1" ranks first and decodes as a number; "abc" does not.
        repo.create(&"1".to_string(), &"apple apple apple".to_string())
            .unwrap();
        repo.create(&"abc".to_string(), &"apple".to_string())
            .unwrap();
        repo.commit().unwrap();
        repo.close().unwrap();
    }

    let repo: IndexRepository<u64, String> = IndexRepository::open_in_dir(
        dir.path(),
        text_schema(),
        JsonKeyCodec::<u64>::new(),
        TextSerializer::new("body"),
        test_config(Preset::Consistent),
    )
    .unwrap();

    let mut hits = VecCollector::<u64>::new();
    let err = repo
        .query(&IndexQuery::text("apple"), 10, &mut hits)
        .unwrap_err();
    assert!(matches!(err, RepositoryError::QueryExecution(_)));
    assert_eq!(hits.keys().copied().collect::<Vec<_>>(), vec![1]);

    repo.update(&2, &"banana".to_string()).unwrap();
    repo.commit().unwrap();
    assert_eq!(keys_matching(&repo, "banana"), vec![2]);
}
