//! Shared fixtures for repository integration tests

#![allow(dead_code)]

use nrt_index::{
    IndexQuery, IndexRepository, JsonKeyCodec, Preset, RepositoryConfig, RepositorySchema,
    TextSerializer, VecCollector,
};

pub type TextRepository = IndexRepository<u64, String>;

/// Single tokenized `body` field
pub fn text_schema() -> RepositorySchema {
    RepositorySchema::builder().text("body").build().unwrap()
}

/// Small single-threaded writer so tests stay light
pub fn test_config(preset: Preset) -> RepositoryConfig {
    RepositoryConfig::preset(preset)
        .writer_threads(1)
        .writer_heap_bytes(15_000_000)
}

pub fn text_repository() -> TextRepository {
    text_repository_with(Preset::Consistent)
}

pub fn text_repository_with(preset: Preset) -> TextRepository {
    IndexRepository::in_ram(
        text_schema(),
        JsonKeyCodec::<u64>::new(),
        TextSerializer::new("body"),
        test_config(preset),
    )
    .unwrap()
}

/// Keys matching `text`, best first
pub fn keys_matching(repo: &TextRepository, text: &str) -> Vec<u64> {
    hits_matching(repo, text).into_iter().map(|(k, _)| k).collect()
}

pub fn hits_matching(repo: &TextRepository, text: &str) -> Vec<(u64, f32)> {
    let mut hits = VecCollector::<u64>::new();
    repo.query(&IndexQuery::text(text), 100, &mut hits).unwrap();
    hits.into_hits()
}

pub fn put(repo: &TextRepository, key: u64, body: &str) {
    repo.create(&key, &body.to_string()).unwrap();
}
