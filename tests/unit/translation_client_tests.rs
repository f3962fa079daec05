/*!
 * Tests for batching, response validation and per-batch retries
 */

use std::sync::Arc;
use std::time::Duration;

use srtwai::errors::{ConfigError, ProviderError, TranslationError};
use srtwai::providers::TranslationResponse;
use srtwai::providers::mock::{MockBehavior, MockProvider};
use srtwai::translation::core::token_for;
use srtwai::translation::{Batch, Batcher, OutcomeStatus, RetryPolicy, TranslationClient};
use crate::common;

fn batches(cues: u32, batch_size: usize) -> Vec<Batch> {
    Batcher::new(batch_size)
        .unwrap()
        .split(&common::sample_document(cues), &common::en_to_fr())
}

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(40),
        jitter: Duration::ZERO,
    }
}

fn client(provider: &MockProvider, max_retries: u32) -> TranslationClient {
    TranslationClient::new(Arc::new(provider.clone()), fast_policy(max_retries), Duration::from_secs(5))
}

fn response_for(batch: &Batch, text: impl Fn(u32) -> String) -> TranslationResponse {
    TranslationResponse::from_pairs(batch.cues.iter().map(|cue| (token_for(cue), text(cue.index))))
}

#[test]
fn test_batcherSplit_withFiveCues_shouldPartitionInOrder() {
    let doc = common::sample_document(5);
    let result = Batcher::new(2).unwrap().split(&doc, &common::en_to_fr());

    let sizes: Vec<usize> = result.iter().map(Batch::len).collect();
    assert_eq!(sizes, vec![2, 2, 1]);
    let ids: Vec<usize> = result.iter().map(|b| b.batch_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let rejoined: Vec<_> = result.iter().flat_map(|b| b.cues.clone()).collect();
    assert_eq!(rejoined.as_slice(), doc.cues());
    assert_eq!(result[2].index_range(), Some((5, 5)));
}

#[test]
fn test_batcherSplit_withEmptyDocument_shouldReturnNoBatches() {
    assert!(batches(0, 10).is_empty());
    assert_eq!(Batcher::new(10).unwrap().batch_count(0), 0);
    assert_eq!(Batcher::new(10).unwrap().batch_count(21), 3);
}

#[test]
fn test_batcherNew_withZeroSize_shouldFail() {
    assert_eq!(Batcher::new(0).unwrap_err(), ConfigError::InvalidBatchSize);
}

#[test]
fn test_buildRequest_withBatch_shouldLabelEveryCue() {
    let batch = &batches(4, 2)[1];
    let request = TranslationClient::build_request(batch);

    assert_eq!(request.source_language.as_deref(), Some("en"));
    assert_eq!(request.target_language, "fr");
    let tokens: Vec<&str> = request.items.iter().map(|i| i.token.as_str()).collect();
    assert_eq!(tokens, vec!["ENTRY_3", "ENTRY_4"]);
    assert_eq!(request.items[0].text, "Line 3");
}

#[test]
fn test_applyResponse_withReorderedItems_shouldMapByToken() {
    let batch = &batches(3, 3)[0];
    let mut response = response_for(batch, |i| format!("Ligne {}", i));
    response.items.reverse();

    let cues = TranslationClient::apply_response(batch, &response).unwrap();
    let texts: Vec<String> = cues.iter().map(|c| c.text()).collect();
    assert_eq!(texts, vec!["Ligne 1", "Ligne 2", "Ligne 3"]);
    for (translated, original) in cues.iter().zip(&batch.cues) {
        assert_eq!(translated.start, original.start);
        assert_eq!(translated.end, original.end);
    }
}

#[test]
fn test_applyResponse_withMissingItem_shouldFailWithCountMismatch() {
    let batch = &batches(3, 3)[0];
    let mut response = response_for(batch, |i| format!("Ligne {}", i));
    response.items.pop();

    assert_eq!(
        TranslationClient::apply_response(batch, &response),
        Err(TranslationError::CountMismatch { expected: 3, actual: 2 })
    );
}

#[test]
fn test_applyResponse_withUnknownToken_shouldFail() {
    let batch = &batches(2, 2)[0];
    let mut response = response_for(batch, |i| format!("Ligne {}", i));
    response.items[1].token = "ENTRY_9".to_string();

    assert_eq!(
        TranslationClient::apply_response(batch, &response),
        Err(TranslationError::UnknownToken("ENTRY_9".to_string()))
    );
}

#[test]
fn test_applyResponse_withDuplicateToken_shouldFail() {
    let batch = &batches(2, 2)[0];
    let mut response = response_for(batch, |i| format!("Ligne {}", i));
    response.items[1].token = "ENTRY_1".to_string();

    assert_eq!(
        TranslationClient::apply_response(batch, &response),
        Err(TranslationError::DuplicateToken("ENTRY_1".to_string()))
    );
}

#[test]
fn test_applyResponse_withBlankText_shouldFail() {
    let batch = &batches(2, 2)[0];
    let response = response_for(batch, |i| if i == 2 { " \n ".to_string() } else { "Ligne".to_string() });

    assert_eq!(
        TranslationClient::apply_response(batch, &response),
        Err(TranslationError::EmptyTranslation("ENTRY_2".to_string()))
    );
}

#[tokio::test]
async fn test_translateBatch_withWorkingProvider_shouldSucceedFirstTry() {
    let provider = MockProvider::working();
    let batch = &batches(2, 2)[0];

    let outcome = client(&provider, 3).translate_batch(batch).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts, 1);
    assert!(outcome.retry_delays.is_empty());
    let cues = outcome.translated_cues().unwrap();
    assert_eq!(cues[0].text(), "[fr] Line 1");
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_translateBatch_withTransientFailures_shouldRetryWithGrowingDelays() {
    let provider = MockProvider::fail_first(3);
    let batch = &batches(1, 1)[0];

    let outcome = client(&provider, 3).translate_batch(batch).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts, 4);
    assert_eq!(
        outcome.retry_delays,
        vec![Duration::from_millis(10), Duration::from_millis(20), Duration::from_millis(40)]
    );
    assert_eq!(provider.request_count(), 4);
}

#[tokio::test]
async fn test_translateBatch_withPersistentFailure_shouldStopAfterMaxAttempts() {
    let provider = MockProvider::failing();
    let batch = &batches(2, 2)[0];

    let outcome = client(&provider, 2).translate_batch(batch).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.attempts, 3);
    assert_eq!(provider.request_count(), 3);
    let failure = outcome.failure().unwrap();
    assert_eq!(failure.batch_id, 1);
    assert_eq!(failure.attempts, 3);
    assert!(matches!(
        failure.error,
        TranslationError::Provider(ProviderError::ApiError { status_code: 500, .. })
    ));
}

#[tokio::test]
async fn test_translateBatch_withAuthenticationError_shouldNotRetry() {
    let provider = MockProvider::unauthorized();
    let batch = &batches(1, 1)[0];

    let outcome = client(&provider, 5).translate_batch(batch).await;

    assert_eq!(outcome.attempts, 1);
    assert!(outcome.retry_delays.is_empty());
    assert_eq!(provider.request_count(), 1);
}

#[tokio::test]
async fn test_translateBatch_withDroppedItemOnce_shouldRetryAndSucceed() {
    let provider = MockProvider::new(MockBehavior::DropLastFirst { n: 1 });
    let batch = &batches(3, 3)[0];

    let outcome = client(&provider, 1).translate_batch(batch).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.attempts, 2);
}

#[tokio::test]
async fn test_translateBatch_withInvalidReplies_shouldRecordValidationError() {
    let cases = [
        (MockBehavior::DuplicateFirst, "duplicate"),
        (MockBehavior::UnknownToken, "unknown"),
        (MockBehavior::EmptyTranslation, "empty"),
        (MockBehavior::DropLast, "count"),
    ];

    for (behavior, label) in cases {
        let provider = MockProvider::new(behavior);
        let batch = &batches(2, 2)[0];
        let outcome = client(&provider, 0).translate_batch(batch).await;
        let error = &outcome.failure().unwrap_or_else(|| panic!("{} reply accepted", label)).error;

        let expected_kind = match error {
            TranslationError::DuplicateToken(_) => "duplicate",
            TranslationError::UnknownToken(_) => "unknown",
            TranslationError::EmptyTranslation(_) => "empty",
            TranslationError::CountMismatch { .. } => "count",
            other => panic!("unexpected error {:?}", other),
        };
        assert_eq!(expected_kind, label);
    }
}

#[tokio::test]
async fn test_translateBatch_withSlowProvider_shouldTimeOut() {
    let provider = MockProvider::working().with_delay(Duration::from_millis(200));
    let batch = &batches(1, 1)[0];
    let client = TranslationClient::new(Arc::new(provider), RetryPolicy::no_retry(), Duration::from_millis(20));

    let outcome = client.translate_batch(batch).await;

    match outcome.status {
        OutcomeStatus::Failed { error } => {
            assert_eq!(error.error, TranslationError::Timeout(Duration::from_millis(20)));
        }
        OutcomeStatus::Success { .. } => panic!("slow request should time out"),
    }
}

#[test]
fn test_retryPolicyDelay_withLargeRetry_shouldCapAtMax() {
    let policy = fast_policy(10);
    assert_eq!(policy.delay_for_retry(1), Duration::from_millis(10));
    assert_eq!(policy.delay_for_retry(2), Duration::from_millis(20));
    assert_eq!(policy.delay_for_retry(3), Duration::from_millis(40));
    assert_eq!(policy.delay_for_retry(9), Duration::from_millis(40));
    assert_eq!(policy.delay_for_retry(200), Duration::from_millis(40));
}

#[test]
fn test_retryPolicyBackoff_withJitter_shouldStayWithinBounds() {
    let policy = RetryPolicy {
        jitter: Duration::from_millis(5),
        ..fast_policy(3)
    };
    for _ in 0..50 {
        let delay = policy.backoff(1);
        assert!(delay >= Duration::from_millis(10));
        assert!(delay < Duration::from_millis(15));
        assert!(policy.backoff(5) <= Duration::from_millis(40));
    }
}
