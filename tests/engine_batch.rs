mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use common::{HangingBackend, StubBackend, fake_translation};
use pdf_table_translate::TranslationEngine;
use pdf_table_translate::cache::TranslationCache;
use pretty_assertions::assert_eq;

fn texts(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

#[tokio::test(start_paused = true)]
async fn each_distinct_key_is_sent_once_under_concurrency() {
    let backend = StubBackend::with_delay(Duration::from_millis(50));
    let engine = TranslationEngine::new(backend.clone()).with_max_concurrency(4);

    let input = texts(&[
        "Rated input",
        "Enclosure material",
        " Rated input ",
        "Protective earthing",
        "Rated input",
        "Enclosure material",
        "Touch current",
    ]);
    let output = engine.translate_batch(&input).await;

    assert_eq!(backend.calls(), 4);
    assert_eq!(backend.calls_for("Rated input"), 1);
    assert_eq!(engine.cache().len(), 4);
    assert_eq!(output.len(), input.len());
    assert_eq!(output[0], output[2]);
    assert_eq!(output[0], output[4]);
}

#[tokio::test(start_paused = true)]
async fn overlapping_calls_share_one_upstream_call_per_key() {
    let backend = StubBackend::with_delay(Duration::from_millis(50));
    let engine = TranslationEngine::new(backend.clone()).with_max_concurrency(4);

    let input = texts(&["Rated input", "Enclosure material"]);
    let batches = futures::future::join_all((0..6).map(|_| engine.translate_batch(&input)));
    let singles = futures::future::join_all(
        ["Rated input", " Enclosure material", "Rated input "].map(|text| engine.translate(text)),
    );
    let (batches, singles) = tokio::join!(batches, singles);

    assert_eq!(backend.calls(), 2);
    assert_eq!(backend.calls_for("Rated input"), 1);
    assert_eq!(backend.calls_for("Enclosure material"), 1);
    let expected = vec![fake_translation("Rated input"), fake_translation("Enclosure material")];
    assert!(batches.iter().all(|output| *output == expected));
    assert_eq!(
        singles,
        vec![
            fake_translation("Rated input"),
            fake_translation("Enclosure material"),
            fake_translation("Rated input"),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn batches_run_on_spawned_tasks() {
    let backend = StubBackend::with_delay(Duration::from_millis(10));
    let engine = TranslationEngine::new(backend.clone());

    let workers = ["Rated input", "Touch current"].map(|text| {
        let engine = engine.clone();
        let input = texts(&[text, "12 V"]);
        tokio::spawn(async move { engine.translate_batch(&input).await })
    });
    for (worker, text) in workers.into_iter().zip(["Rated input", "Touch current"]) {
        let output = worker.await.expect("worker should finish");
        assert_eq!(output, vec![fake_translation(text), "12 V".to_string()]);
    }
    assert_eq!(backend.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn results_stay_in_input_order() {
    let backend = StubBackend::with_delay(Duration::from_millis(20));
    let engine = TranslationEngine::new(backend).with_max_concurrency(3);

    let input = texts(&[
        "Output",
        "12 V",
        "Rated input current",
        "額定輸入電壓",
        "Mains supply",
        "Functional earthing conductor",
    ]);
    let output = engine.translate_batch(&input).await;

    let expected = vec![
        fake_translation("Output"),
        "12 V".to_string(),
        fake_translation("Rated input current"),
        "額定輸入電壓".to_string(),
        fake_translation("Mains supply"),
        fake_translation("Functional earthing conductor"),
    ];
    assert_eq!(output, expected);
}

#[tokio::test(start_paused = true)]
async fn in_flight_calls_never_exceed_the_bound() {
    let backend = StubBackend::with_delay(Duration::from_millis(30));
    let engine = TranslationEngine::new(backend.clone()).with_max_concurrency(3);

    let input = (1..=12).map(|n| format!("Component number {n}")).collect::<Vec<_>>();
    engine.translate_batch(&input).await;

    assert_eq!(backend.calls(), 12);
    assert!(backend.peak_in_flight() <= 3, "peak {}", backend.peak_in_flight());
}

#[tokio::test]
async fn ineligible_texts_are_never_sent() {
    let backend = StubBackend::new();
    let engine = TranslationEngine::new(backend.clone());

    let input = texts(&["12 V", "IEC 62368-1", "額定輸入電壓", "ab", "", "50/60 Hz"]);
    let output = engine.translate_batch(&input).await;

    assert_eq!(output, input);
    assert_eq!(backend.calls(), 0);
    assert_eq!(engine.translate("5 mm").await, "5 mm");
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn repeated_batches_are_served_from_cache() {
    let backend = StubBackend::new();
    let engine = TranslationEngine::new(backend.clone());

    let input = texts(&["Rated input", "Enclosure material"]);
    let first = engine.translate_batch(&input).await;
    let second = engine.translate_batch(&input).await;
    let single = engine.translate("Rated input").await;

    assert_eq!(first, second);
    assert_eq!(single, first[0]);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn shared_cache_spans_engines() {
    let cache = Arc::new(TranslationCache::new());
    cache.insert("Rated input", "額定輸入".to_string());

    let backend = StubBackend::new();
    let engine = TranslationEngine::new(backend.clone()).with_cache(cache);
    assert_eq!(engine.translate("  Rated input").await, "額定輸入");
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn failed_calls_keep_source_text_and_are_retried_later() {
    let backend = StubBackend::failing_on(&["Rated input"]);
    let engine = TranslationEngine::new(backend.clone());

    let input = texts(&["Rated input", "Enclosure material", "Rated input"]);
    let output = engine.translate_batch(&input).await;

    assert_eq!(output[0], "Rated input");
    assert_eq!(output[1], fake_translation("Enclosure material"));
    assert_eq!(output[2], "Rated input");
    assert_eq!(engine.cache().get("Rated input"), None);
    assert_eq!(engine.cache().slot_count(), 1);

    engine.translate_batch(&input[..1]).await;
    assert_eq!(backend.calls_for("Rated input"), 2);
}

#[tokio::test(start_paused = true)]
async fn timed_out_calls_fall_back_without_caching() {
    let engine = TranslationEngine::new(Arc::new(HangingBackend))
        .with_call_timeout(Some(Duration::from_secs(5)));

    let output = engine.translate_batch(&texts(&["Rated input"])).await;

    assert_eq!(output, texts(&["Rated input"]));
    assert!(engine.cache().is_empty());
    assert_eq!(engine.cache().slot_count(), 0);
}

#[tokio::test]
async fn final_review_only_resends_residual_fields() {
    let backend = StubBackend::new();
    let engine = TranslationEngine::new(backend.clone());

    let fields = BTreeMap::from([
        ("t0:r0:c0".to_string(), "額定輸入電壓".to_string()),
        ("t0:r0:c1".to_string(), "Rated input".to_string()),
        ("t0:r1:c0".to_string(), "230 V".to_string()),
    ]);
    let reviewed = engine.final_review(&fields).await;

    assert_eq!(backend.calls(), 1);
    assert_eq!(reviewed["t0:r0:c0"], "額定輸入電壓");
    assert_eq!(reviewed["t0:r0:c1"], fake_translation("Rated input"));
    assert_eq!(reviewed["t0:r1:c0"], "230 V");

    let again = engine.final_review(&reviewed).await;
    assert_eq!(again, reviewed);
    assert_eq!(backend.calls(), 1);
}
