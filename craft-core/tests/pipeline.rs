//! End-to-end pipeline tests — symbols in, structured results out, with a scripted model.

use std::num::NonZeroUsize;
use std::sync::Arc;

use craft_core::cache::{LruStore, MemoStore, UnboundedStore};
use craft_core::parse::{parse_combination, parse_split};
use craft_core::types::symbols_from;
use craft_core::{CraftConfig, Crafter, Element, Split, Symbol};
use craft_llm::mock::ScriptedBackend;
use craft_llm::{LlmError, ModelInvoker};

fn el(symbol: &str, emoji: &str) -> Element {
    Element::new(symbol, emoji)
}

fn sym(s: &str) -> Symbol {
    Symbol::new(s).expect("valid symbol")
}

// ---------------------------------------------------------------------------
// Reply parsing examples
// ---------------------------------------------------------------------------

#[test]
fn json_combination_reply() {
    assert_eq!(
        parse_combination(r#"{"symbol": "Steam", "emoji": "💨"}"#),
        el("Steam", "💨")
    );
}

#[test]
fn plain_text_combination_reply() {
    assert_eq!(parse_combination("Steam 💨"), el("Steam", "💨"));
}

#[test]
fn one_part_split_reply_is_padded() {
    assert_eq!(
        parse_split(r#"{"parts": [{"symbol":"Water","emoji":"💧"}]}"#),
        Split([el("Water", "💧"), el("", "")])
    );
}

#[test]
fn three_part_plain_split_reply_keeps_two() {
    assert_eq!(
        parse_split("Water 💧+Fire 🔥+Earth 🌍"),
        Split([el("Water", "💧"), el("Fire", "🔥")])
    );
}

// ---------------------------------------------------------------------------
// Dispatcher behaviour
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_add_calls_the_model_once() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_text(r#"{"symbol": "Steam", "emoji": "💨"}"#);
    let crafter = Crafter::new(ModelInvoker::new(backend.clone()));
    let symbols = symbols_from(["Water", "Fire"]).expect("valid");

    let a = crafter.add(&symbols).await;
    let b = crafter.add(&symbols).await;
    assert_eq!(a, b);
    assert_eq!(a, el("Steam", "💨"));
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn swapped_inputs_are_distinct_keys() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_text(r#"{"symbol": "Steam", "emoji": "💨"}"#);
    backend.push_text(r#"{"symbol": "Geyser", "emoji": "⛲"}"#);
    let crafter = Crafter::new(ModelInvoker::new(backend.clone()));

    let forward = crafter.add(&[sym("Water"), sym("Fire")]).await;
    let reverse = crafter.add(&[sym("Fire"), sym("Water")]).await;
    assert_eq!(forward, el("Steam", "💨"));
    assert_eq!(reverse, el("Geyser", "⛲"));
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn json_rejection_recovers_with_plain_text() {
    let backend = Arc::new(ScriptedBackend::new());
    backend.push_error(LlmError::ConstrainedOutputRejected("json_validate_failed".into()));
    backend.push_text("Water 💧 + Fire 🔥");
    let crafter = Crafter::new(ModelInvoker::new(backend.clone()));

    let split = crafter.split(&sym("Steam")).await;
    assert_eq!(split, Split([el("Water", "💧"), el("Fire", "🔥")]));

    let sent = backend.requests();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].json_mode);
    assert!(!sent[1].json_mode);
}

#[tokio::test]
async fn split_is_always_two_parts() {
    let replies = [
        "",
        "Water 💧",
        "Water 💧+Fire 🔥",
        "A 1+B 2+C 3+D 4+E 5",
        r#"{"parts": []}"#,
        r#"{"parts": [{"symbol":"A"},{"symbol":"B"},{"symbol":"C"},{"symbol":"D"},{"symbol":"E"}]}"#,
    ];
    for (i, reply) in replies.iter().enumerate() {
        let backend = Arc::new(ScriptedBackend::always(*reply));
        let crafter = Crafter::new(ModelInvoker::new(backend));
        let split = crafter.split(&sym(&format!("Thing{i}"))).await;
        let json = serde_json::to_value(&split).expect("serialize");
        assert_eq!(json.as_array().map(Vec::len), Some(2), "reply {reply:?}");
    }
}

#[tokio::test]
async fn unavailable_model_degrades_to_sentinels() {
    let crafter = Crafter::new(ModelInvoker::new(Arc::new(craft_llm::LlmClient::none())));
    assert_eq!(crafter.add(&[sym("Water"), sym("Fire")]).await, Element::empty());
    assert_eq!(crafter.split(&sym("Steam")).await, Split::empty());
    assert_eq!(crafter.cache_stats().combinations, 0);
    assert_eq!(crafter.cache_stats().splits, 0);
}

// ---------------------------------------------------------------------------
// Injected stores
// ---------------------------------------------------------------------------

#[tokio::test]
async fn prefilled_store_answers_without_model() {
    let combinations: Arc<UnboundedStore<Vec<Symbol>, Element>> = Arc::new(UnboundedStore::new());
    combinations.insert(vec![sym("Water"), sym("Fire")], el("Steam", "💨"));
    let backend = Arc::new(ScriptedBackend::new());
    let crafter = Crafter::new(ModelInvoker::new(backend.clone()))
        .with_stores(combinations.clone(), Arc::new(UnboundedStore::new()));

    assert_eq!(crafter.add(&[sym("Water"), sym("Fire")]).await, el("Steam", "💨"));
    assert_eq!(backend.call_count(), 0);
}

#[tokio::test]
async fn fresh_store_per_crafter_is_isolated() {
    let backend = Arc::new(ScriptedBackend::always(r#"{"symbol": "Steam", "emoji": "💨"}"#));
    let one = Crafter::new(ModelInvoker::new(backend.clone()));
    let two = Crafter::new(ModelInvoker::new(backend.clone()));

    one.add(&[sym("Water"), sym("Fire")]).await;
    two.add(&[sym("Water"), sym("Fire")]).await;
    assert_eq!(backend.call_count(), 2);
}

#[tokio::test]
async fn bounded_store_recomputes_evicted_keys() {
    let backend = Arc::new(ScriptedBackend::always(r#"{"parts": []}"#));
    let crafter = Crafter::new(ModelInvoker::new(backend.clone())).with_stores(
        Arc::new(UnboundedStore::new()),
        Arc::new(LruStore::new(NonZeroUsize::new(1).expect("non-zero"))),
    );

    crafter.split(&sym("Steam")).await;
    crafter.split(&sym("Mud")).await;
    crafter.split(&sym("Steam")).await;
    assert_eq!(backend.call_count(), 3);
    assert_eq!(crafter.cache_stats().splits, 1);
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

async fn race_same_key(crafter: Arc<Crafter>) {
    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let crafter = Arc::clone(&crafter);
            tokio::spawn(async move { crafter.add(&[sym("Water"), sym("Fire")]).await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.expect("task"), el("Steam", "💨"));
    }
}

#[tokio::test]
async fn single_flight_makes_one_call_for_concurrent_callers() {
    let backend = Arc::new(ScriptedBackend::always(r#"{"symbol": "Steam", "emoji": "💨"}"#));
    let crafter = Arc::new(Crafter::new(ModelInvoker::new(backend.clone())));

    race_same_key(crafter).await;
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn single_flight_holds_on_a_thread_pool() {
    let backend = Arc::new(ScriptedBackend::always(r#"{"symbol": "Steam", "emoji": "💨"}"#));
    let crafter = Arc::new(Crafter::new(ModelInvoker::new(backend.clone())));

    race_same_key(crafter).await;
    assert_eq!(backend.call_count(), 1);
}

#[tokio::test]
async fn without_single_flight_concurrent_callers_race() {
    let backend = Arc::new(ScriptedBackend::always(r#"{"symbol": "Steam", "emoji": "💨"}"#));
    let crafter = Arc::new(
        Crafter::new(ModelInvoker::new(backend.clone())).with_single_flight(false),
    );

    race_same_key(Arc::clone(&crafter)).await;
    assert!(backend.call_count() > 1);
    assert_eq!(crafter.cache_stats().combinations, 1);
}

// ---------------------------------------------------------------------------
// Configuration wiring
// ---------------------------------------------------------------------------

#[tokio::test]
async fn from_config_with_no_provider_returns_sentinels() {
    let dir = tempfile::tempdir().expect("tempdir");
    let prompts = dir.path().join("prompts.toml");
    std::fs::write(&prompts, "[prompt]\nsystem = \"JSON only.\"\n").expect("write");

    let config = CraftConfig::from_toml(&format!(
        "[llm]\nprovider = \"none\"\n\n[prompts]\nfile = {:?}\n",
        prompts.display().to_string()
    ))
    .expect("valid");
    let crafter = Crafter::from_config(&config).expect("build");
    assert_eq!(crafter.add(&[sym("Water"), sym("Fire")]).await, Element::empty());
}

#[test]
fn from_config_with_missing_prompt_file_fails() {
    let config = CraftConfig::from_toml("[prompts]\nfile = \"/nonexistent/craft/prompts.toml\"\n")
        .expect("valid");
    assert!(Crafter::from_config(&config).is_err());
}
