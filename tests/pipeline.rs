//! End-to-end tests for the ingestion and query pipeline, using in-memory
//! stores, a bag-of-words embedder and scripted answer providers.

mod support;

use std::sync::Arc;
use std::time::Duration;

use docqa_core::index::memory::InMemoryVectorStore;
use docqa_core::index::VectorStore;
use docqa_core::models::{DocumentType, QueryRequest};
use docqa_core::score::{NO_INFORMATION_ANSWER, UNKNOWN_DOCUMENT_WEIGHT, KNOWN_DOCUMENT_WEIGHT};
use docqa_core::Error;

use support::*;

const CLAIMS: &str = "Claims must be filed within thirty days of the loss. \
Late claims are reviewed case by case.";
const PARKING: &str = "Visitors park in the north lot. The gate closes at ten in the evening.";

fn ask(question: &str, document_type: DocumentType) -> QueryRequest {
    QueryRequest {
        question: question.to_string(),
        document_type,
    }
}

#[tokio::test]
async fn test_query_with_nothing_indexed_returns_no_information() {
    let provider = CitingProvider::new();
    let pipeline = pipeline(provider.clone());

    let answer = pipeline
        .query(&ask("What is the grace period?", DocumentType::Unknown))
        .await
        .unwrap();

    assert_eq!(answer.answer, NO_INFORMATION_ANSWER);
    assert!(answer.matched_clauses.is_empty());
    assert_eq!(answer.confidence, 0.0);
    assert!(provider.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_upload_embed_query_cites_only_context() {
    let provider = CitingProvider::new();
    let pipeline = pipeline(provider.clone());

    let email = pipeline
        .upload("claims.eml", &email("Claims", CLAIMS), DocumentType::Unknown)
        .await
        .unwrap();
    let docx = pipeline
        .upload(
            "parking.docx",
            &docx_with_paragraphs(&[PARKING]),
            DocumentType::Unknown,
        )
        .await
        .unwrap();
    assert_eq!(email.status, "success");
    assert!(email.total_chunks >= 1);
    assert!(docx.total_chunks >= 1);

    pipeline.embed(&email.document_id, None).await.unwrap();
    pipeline.embed(&docx.document_id, None).await.unwrap();

    let answer = pipeline
        .query(&ask("When must claims be filed?", DocumentType::Unknown))
        .await
        .unwrap();

    let mut stored = Vec::new();
    for id in [&email.document_id, &docx.document_id] {
        stored.extend(pipeline.get(id).await.unwrap().chunks.into_iter().map(|c| c.text));
    }
    assert!(!answer.matched_clauses.is_empty());
    for clause in &answer.matched_clauses {
        assert!(stored.contains(clause), "clause not from context: {}", clause);
    }
    // The out-of-range citation is dropped, the rest are kept once.
    let mut unique = answer.matched_clauses.clone();
    unique.dedup();
    assert_eq!(unique.len(), answer.matched_clauses.len());

    assert!(answer.confidence > 0.0 && answer.confidence <= 1.0);
    assert_eq!(answer.score_details.document_type, DocumentType::Unknown);
    assert_eq!(answer.score_details.document_weight, UNKNOWN_DOCUMENT_WEIGHT);

    let prompts = provider.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("When must claims be filed?"));
}

#[tokio::test]
async fn test_query_only_sees_requested_document_type() {
    let pipeline = pipeline(CitingProvider::new());

    let receipt = pipeline
        .upload("claims.eml", &email("Claims", CLAIMS), DocumentType::Known)
        .await
        .unwrap();
    pipeline.embed(&receipt.document_id, None).await.unwrap();

    let unknown = pipeline
        .query(&ask("When must claims be filed?", DocumentType::Unknown))
        .await
        .unwrap();
    assert_eq!(unknown.answer, NO_INFORMATION_ANSWER);

    let known = pipeline
        .query(&ask("When must claims be filed?", DocumentType::Known))
        .await
        .unwrap();
    assert!(!known.matched_clauses.is_empty());
    assert_eq!(known.score_details.document_weight, KNOWN_DOCUMENT_WEIGHT);
}

#[tokio::test]
async fn test_unknown_documents_weigh_more_than_known() {
    let known = pipeline(CitingProvider::new());
    let unknown = pipeline(CitingProvider::new());

    for (pipeline, document_type) in [(&known, DocumentType::Known), (&unknown, DocumentType::Unknown)] {
        let receipt = pipeline
            .upload("claims.eml", &email("Claims", CLAIMS), document_type)
            .await
            .unwrap();
        pipeline.embed(&receipt.document_id, None).await.unwrap();
    }

    let question = "When must claims be filed?";
    let a = known.query(&ask(question, DocumentType::Known)).await.unwrap();
    let b = unknown.query(&ask(question, DocumentType::Unknown)).await.unwrap();
    assert!(b.score_details.score > a.score_details.score);
    assert!(b.confidence >= a.confidence);
}

#[tokio::test]
async fn test_embed_with_type_retags_document() {
    let pipeline = pipeline(CitingProvider::new());
    let receipt = pipeline
        .upload("claims.eml", &email("Claims", CLAIMS), DocumentType::Unknown)
        .await
        .unwrap();

    let embedded = pipeline
        .embed(&receipt.document_id, Some(DocumentType::Known))
        .await
        .unwrap();
    assert_eq!(embedded.message, "Embeddings generated successfully");
    assert_eq!(embedded.vectors_stored, embedded.chunks_processed);

    let detail = pipeline.get(&receipt.document_id).await.unwrap();
    assert_eq!(detail.document.document_type, DocumentType::Known);
}

#[tokio::test]
async fn test_deleted_document_is_never_cited_even_with_lagging_vectors() {
    let vectors = StickyVectorStore::new();
    let pipeline = pipeline_with(vectors.clone(), CitingProvider::new(), Duration::from_secs(5));

    let doomed = pipeline
        .upload("claims.eml", &email("Claims", CLAIMS), DocumentType::Unknown)
        .await
        .unwrap();
    let kept = pipeline
        .upload(
            "parking.docx",
            &docx_with_paragraphs(&[PARKING]),
            DocumentType::Unknown,
        )
        .await
        .unwrap();
    pipeline.embed(&doomed.document_id, None).await.unwrap();
    pipeline.embed(&kept.document_id, None).await.unwrap();
    let before = vectors.count().await.unwrap();

    // Vector deletion fails, but the delete itself succeeds.
    pipeline.delete(&doomed.document_id).await.unwrap();
    assert_eq!(vectors.count().await.unwrap(), before);

    let answer = pipeline
        .query(&ask("When must claims be filed?", DocumentType::Unknown))
        .await
        .unwrap();
    assert!(!answer.matched_clauses.is_empty());
    assert!(answer.matched_clauses.iter().any(|c| c.contains("north lot")));
    for clause in &answer.matched_clauses {
        assert!(!clause.contains("thirty days"), "deleted text cited: {}", clause);
    }

    let err = pipeline.get(&doomed.document_id).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_search_size_does_not_grow_with_unrelated_deletions() {
    let vectors = StickyVectorStore::new();
    let pipeline = pipeline_with(vectors.clone(), CitingProvider::new(), Duration::from_secs(5));

    for i in 0..4 {
        let receipt = pipeline
            .upload(
                &format!("old-{}.eml", i),
                &email("Old claims", CLAIMS),
                DocumentType::Unknown,
            )
            .await
            .unwrap();
        pipeline.embed(&receipt.document_id, None).await.unwrap();
        pipeline.delete(&receipt.document_id).await.unwrap();
    }
    let live = pipeline
        .upload("parking.eml", &email("Parking", PARKING), DocumentType::Known)
        .await
        .unwrap();
    pipeline.embed(&live.document_id, None).await.unwrap();

    let answer = pipeline
        .query(&ask("Where do visitors park?", DocumentType::Known))
        .await
        .unwrap();
    assert!(!answer.matched_clauses.is_empty());
    assert_eq!(*vectors.searches.lock().unwrap(), vec![5]);
}

#[tokio::test]
async fn test_search_widens_past_deleted_hits() {
    let vectors = StickyVectorStore::new();
    let pipeline = pipeline_with(vectors.clone(), CitingProvider::new(), Duration::from_secs(5));

    // More deleted claims chunks than top_k, all outranking the live one.
    for i in 0..6 {
        let receipt = pipeline
            .upload(&format!("old-{}.eml", i), &email("Claims", CLAIMS), DocumentType::Unknown)
            .await
            .unwrap();
        pipeline.embed(&receipt.document_id, None).await.unwrap();
        pipeline.delete(&receipt.document_id).await.unwrap();
    }
    let kept = pipeline
        .upload("parking.docx", &docx_with_paragraphs(&[PARKING]), DocumentType::Unknown)
        .await
        .unwrap();
    pipeline.embed(&kept.document_id, None).await.unwrap();

    let answer = pipeline
        .query(&ask("When must claims be filed?", DocumentType::Unknown))
        .await
        .unwrap();
    assert!(answer.matched_clauses.iter().any(|c| c.contains("north lot")));
    assert!(answer.matched_clauses.iter().all(|c| !c.contains("thirty days")));
    assert_eq!(*vectors.searches.lock().unwrap(), vec![5, 10]);
}

#[tokio::test]
async fn test_set_document_type_moves_document_between_queries() {
    let pipeline = pipeline(CitingProvider::new());
    let receipt = pipeline
        .upload("claims.eml", &email("Claims", CLAIMS), DocumentType::Unknown)
        .await
        .unwrap();
    pipeline.embed(&receipt.document_id, None).await.unwrap();

    let doc = pipeline
        .set_document_type(&receipt.document_id, DocumentType::Known)
        .await
        .unwrap();
    assert_eq!(doc.document_type, DocumentType::Known);

    let known = pipeline
        .query(&ask("When must claims be filed?", DocumentType::Known))
        .await
        .unwrap();
    assert!(known.matched_clauses.iter().any(|c| c.contains("thirty days")));
    assert_eq!(known.score_details.document_weight, KNOWN_DOCUMENT_WEIGHT);

    let unknown = pipeline
        .query(&ask("When must claims be filed?", DocumentType::Unknown))
        .await
        .unwrap();
    assert_eq!(unknown.answer, NO_INFORMATION_ANSWER);
}

#[tokio::test]
async fn test_provider_failure_is_synthesis_failed() {
    let pipeline = pipeline(Arc::new(FailingProvider));
    let receipt = pipeline
        .upload("claims.eml", &email("Claims", CLAIMS), DocumentType::Unknown)
        .await
        .unwrap();
    pipeline.embed(&receipt.document_id, None).await.unwrap();

    let err = pipeline
        .query(&ask("When must claims be filed?", DocumentType::Unknown))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SynthesisFailed(_)));
    assert_eq!(err.code(), "synthesis_failed");
}

#[tokio::test]
async fn test_provider_timeout_is_synthesis_failed() {
    let pipeline = pipeline_with(
        Arc::new(InMemoryVectorStore::new()),
        Arc::new(SlowProvider),
        Duration::from_millis(50),
    );
    let receipt = pipeline
        .upload("claims.eml", &email("Claims", CLAIMS), DocumentType::Unknown)
        .await
        .unwrap();
    pipeline.embed(&receipt.document_id, None).await.unwrap();

    let err = pipeline
        .query(&ask("When must claims be filed?", DocumentType::Unknown))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SynthesisFailed(_)));
}

#[tokio::test]
async fn test_empty_question_is_rejected() {
    let pipeline = pipeline(CitingProvider::new());
    let err = pipeline
        .query(&ask("   ", DocumentType::Unknown))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[tokio::test]
async fn test_unsupported_upload_is_rejected() {
    let pipeline = pipeline(CitingProvider::new());
    let err = pipeline
        .upload("notes.txt", b"plain text", DocumentType::Unknown)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFormat(_)));
    assert!(pipeline.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_corrupt_upload_is_rejected() {
    let pipeline = pipeline(CitingProvider::new());
    let err = pipeline
        .upload("broken.docx", b"not a zip archive", DocumentType::Unknown)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CorruptInput(_)));
}

#[tokio::test]
async fn test_empty_docx_is_stored_with_zero_chunks() {
    let pipeline = pipeline(CitingProvider::new());
    let receipt = pipeline
        .upload("blank.docx", &docx_with_paragraphs(&[]), DocumentType::Unknown)
        .await
        .unwrap();

    assert_eq!(receipt.total_chunks, 0);
    assert!(receipt.message.contains("0 chunks created"));
    let detail = pipeline.get(&receipt.document_id).await.unwrap();
    assert!(detail.chunks.is_empty());

    let embedded = pipeline.embed(&receipt.document_id, None).await.unwrap();
    assert_eq!(embedded.vectors_stored, 0);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let pipeline = pipeline(CitingProvider::new());

    assert!(matches!(
        pipeline.embed("missing", None).await.unwrap_err(),
        Error::NotFound(_)
    ));
    assert!(matches!(
        pipeline.get("missing").await.unwrap_err(),
        Error::NotFound(_)
    ));
    assert!(matches!(
        pipeline.delete("missing").await.unwrap_err(),
        Error::NotFound(_)
    ));
    assert!(matches!(
        pipeline
            .set_document_type("missing", DocumentType::Known)
            .await
            .unwrap_err(),
        Error::NotFound(_)
    ));
}

#[tokio::test]
async fn test_list_is_newest_first() {
    let pipeline = pipeline(CitingProvider::new());
    let first = pipeline
        .upload("a.eml", &email("First", CLAIMS), DocumentType::Unknown)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = pipeline
        .upload("b.eml", &email("Second", PARKING), DocumentType::Known)
        .await
        .unwrap();

    let docs = pipeline.list().await.unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].id, second.document_id);
    assert_eq!(docs[1].id, first.document_id);
}
