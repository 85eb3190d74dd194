use marquee::cache::{get_json, CacheStore};
use marquee::similarity::{row_key, SimilarityManifest};
use marquee::types::{Movie, MovieId};

/// Assert that the similarity row at `index` exists and has `len` scores.
pub async fn assert_row_published(cache: &dyn CacheStore, index: usize, len: usize) {
    let row: Option<Vec<f64>> = get_json(cache, &row_key(index))
        .await
        .unwrap_or_else(|e| panic!("failed to read row {index}: {e}"));
    let row = row.unwrap_or_else(|| panic!("expected similarity row {index} to exist"));
    assert_eq!(row.len(), len, "row {index} has the wrong length");
}

/// Assert that no similarity row exists at `index`.
pub async fn assert_row_absent(cache: &dyn CacheStore, index: usize) {
    let raw = cache.get(&row_key(index)).await.expect("cache read failed");
    assert!(raw.is_none(), "expected similarity row {index} to be absent");
}

/// Assert that the published manifest describes exactly `ids`.
pub async fn assert_manifest_ids(cache: &dyn CacheStore, ids: &[MovieId]) {
    let manifest = SimilarityManifest::read(cache)
        .await
        .expect("manifest read failed")
        .expect("expected a similarity manifest");
    assert_eq!(manifest.row_count, ids.len());
    assert_eq!(manifest.movie_ids, ids);
}

pub fn ids(movies: &[Movie]) -> Vec<MovieId> {
    movies.iter().map(|m| m.id).collect()
}
