//! Tests for the in-memory vector store.

use crate::retrieval::{
    adapters::memory::InMemoryDocumentIndex,
    domain::{
        CallerIdentity, ChunkId, CollectionName, DocumentChunk, Embedding, RankedChunk,
        RetrievalQuery,
    },
    ports::{DocumentIndex, DocumentRetriever, RetrievalError},
};
use rstest::rstest;

fn collection() -> CollectionName {
    CollectionName::new("pdf_documents").expect("valid collection")
}

fn chunk_id(raw: &str) -> ChunkId {
    ChunkId::new(raw).expect("valid chunk id")
}

fn embedding(components: &[f32]) -> Embedding {
    Embedding::new(components.to_vec()).expect("valid embedding")
}

fn chunk(id: &str, components: &[f32]) -> DocumentChunk {
    DocumentChunk::new(chunk_id(id), format!("content of {id}"), embedding(components))
}

fn query(components: &[f32], limit: usize) -> RetrievalQuery {
    RetrievalQuery::new(collection(), embedding(components))
        .with_limit(limit)
        .expect("valid limit")
}

fn ids(ranked: &[RankedChunk]) -> Vec<&str> {
    ranked.iter().map(|hit| hit.chunk_id.as_str()).collect()
}

async fn seeded_index() -> InMemoryDocumentIndex {
    let index = InMemoryDocumentIndex::new();
    index
        .add_chunks(
            &collection(),
            vec![
                chunk("chunk-close", &[0.9, 0.1]),
                chunk("chunk-far", &[0.0, 1.0]),
                chunk("chunk-mid", &[0.6, 0.6]),
                chunk("chunk-secret", &[1.0, 0.0]).restricted_to(["finance"]),
            ],
        )
        .await
        .expect("chunks should be stored");
    index
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn results_are_ranked_by_similarity() {
    let index = seeded_index().await;

    let ranked = index
        .query(&query(&[1.0, 0.0], 3), &CallerIdentity::anonymous())
        .await
        .expect("query should succeed");

    assert_eq!(ids(&ranked), vec!["chunk-close", "chunk-mid", "chunk-far"]);
    assert!(ranked.windows(2).all(|pair| match pair {
        [higher, lower] => higher.score >= lower.score,
        _ => true,
    }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn restricted_chunks_are_trimmed_before_ranking() {
    let index = seeded_index().await;

    let outsider = index
        .query(&query(&[1.0, 0.0], 1), &CallerIdentity::new("intern", ["research"]))
        .await
        .expect("query should succeed");
    let insider = index
        .query(&query(&[1.0, 0.0], 1), &CallerIdentity::new("cfo", ["finance"]))
        .await
        .expect("query should succeed");

    assert_eq!(ids(&outsider), vec!["chunk-close"]);
    assert_eq!(ids(&insider), vec!["chunk-secret"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_collection_yields_no_chunks() {
    let index = InMemoryDocumentIndex::new();

    let ranked = index
        .query(&query(&[1.0, 0.0], 3), &CallerIdentity::anonymous())
        .await
        .expect("query should succeed");

    assert!(ranked.is_empty());
    assert_eq!(index.count(&collection()).await.expect("count"), 0);
    assert!(matches!(
        index.clear(&collection()).await,
        Err(RetrievalError::UnknownCollection(_))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mismatched_dimensions_are_rejected() {
    let index = seeded_index().await;

    let insert = index
        .add_chunks(&collection(), vec![chunk("chunk-3d", &[1.0, 0.0, 0.0])])
        .await;
    let lookup = index
        .query(&query(&[1.0, 0.0, 0.0], 3), &CallerIdentity::anonymous())
        .await;

    assert!(matches!(
        insert,
        Err(RetrievalError::DimensionMismatch {
            expected: 2,
            actual: 3,
            ..
        })
    ));
    assert!(matches!(
        lookup,
        Err(RetrievalError::DimensionMismatch { .. })
    ));
    assert_eq!(index.count(&collection()).await.expect("count"), 4);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn re_added_chunks_replace_the_stored_copy() {
    let index = seeded_index().await;

    index
        .add_chunks(
            &collection(),
            vec![chunk("chunk-far", &[1.0, 0.0]).with_parent(chunk_id("chunk-root"))],
        )
        .await
        .expect("chunk should be replaced");
    let ranked = index
        .query(&query(&[1.0, 0.0], 1), &CallerIdentity::anonymous())
        .await
        .expect("query should succeed");

    assert_eq!(index.count(&collection()).await.expect("count"), 4);
    assert_eq!(ids(&ranked), vec!["chunk-far"]);
    assert_eq!(
        ranked.first().and_then(|hit| hit.parent_chunk_id.clone()),
        Some(chunk_id("chunk-root"))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deletion_and_latest_follow_insertion_order() {
    let index = seeded_index().await;

    let removed = index
        .delete(&collection(), &[chunk_id("chunk-secret"), chunk_id("chunk-missing")])
        .await
        .expect("delete should succeed");
    let latest = index
        .latest(&collection())
        .await
        .expect("latest should succeed");

    assert_eq!(removed, 1);
    assert_eq!(latest.map(|found| found.id().clone()), Some(chunk_id("chunk-mid")));

    index
        .clear(&collection())
        .await
        .expect("clear should succeed");
    assert_eq!(index.count(&collection()).await.expect("count"), 0);
}
