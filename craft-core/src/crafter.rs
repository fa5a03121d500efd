//! Memoized dispatcher — prompt → model → parse, once per distinct input.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use craft_llm::{ChatMessage, ModelInvoker};
use serde::Serialize;
use tracing::{error, info};

use crate::cache::{InFlight, MemoStore, UnboundedStore, store_for};
use crate::config::CraftConfig;
use crate::error::{CraftError, Result};
use crate::parse::{parse_combination, parse_split};
use crate::prompt::PromptSet;
use crate::types::{Element, Split, Symbol};

/// Sizes of the memo tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Remembered add results.
    pub combinations: usize,
    /// Remembered split results.
    pub splits: usize,
}

/// Answers add and split requests, asking the model at most once per distinct input.
///
/// Errors never escape [`Crafter::add`] / [`Crafter::split`]: they are logged and the empty
/// result is returned. Failed calls are not remembered, so the next identical request tries again.
pub struct Crafter {
    invoker: ModelInvoker,
    prompts: PromptSet,
    combinations: Arc<dyn MemoStore<Vec<Symbol>, Element>>,
    splits: Arc<dyn MemoStore<Symbol, Split>>,
    add_flights: InFlight<Vec<Symbol>>,
    split_flights: InFlight<Symbol>,
    single_flight: bool,
    json_mode: bool,
}

impl Crafter {
    /// Create a crafter with built-in prompts, unbounded memo tables and single-flight enabled.
    #[must_use]
    pub fn new(invoker: ModelInvoker) -> Self {
        Self {
            invoker,
            prompts: PromptSet::builtin(),
            combinations: Arc::new(UnboundedStore::new()),
            splits: Arc::new(UnboundedStore::new()),
            add_flights: InFlight::new(),
            split_flights: InFlight::new(),
            single_flight: true,
            json_mode: true,
        }
    }

    /// Build the backend, invoker, stores and prompts described by `config`.
    ///
    /// # Errors
    /// Returns an error if the prompt override file cannot be loaded.
    pub fn from_config(config: &CraftConfig) -> Result<Self> {
        let llm = &config.llm;
        let invoker = ModelInvoker::new(Arc::new(llm.build_client()))
            .with_temperature(llm.temperature)
            .with_max_tokens(llm.max_tokens)
            .with_timeout(llm.request_timeout_ms);

        let prompts = match &config.prompts.file {
            Some(path) => PromptSet::from_file(path)?,
            None => PromptSet::builtin(),
        };

        Ok(Self::new(invoker)
            .with_prompts(prompts)
            .with_stores(
                store_for(config.cache.max_entries),
                store_for(config.cache.max_entries),
            )
            .with_single_flight(config.cache.single_flight)
            .with_json_mode(llm.json_mode))
    }

    /// Use different prompt templates.
    #[must_use]
    pub fn with_prompts(mut self, prompts: PromptSet) -> Self {
        self.prompts = prompts;
        self
    }

    /// Use the given memo tables (e.g. shared, pre-filled or bounded ones).
    #[must_use]
    pub fn with_stores(
        mut self,
        combinations: Arc<dyn MemoStore<Vec<Symbol>, Element>>,
        splits: Arc<dyn MemoStore<Symbol, Split>>,
    ) -> Self {
        self.combinations = combinations;
        self.splits = splits;
        self
    }

    /// Enable or disable per-key in-flight de-duplication.
    #[must_use]
    pub fn with_single_flight(mut self, single_flight: bool) -> Self {
        self.single_flight = single_flight;
        self
    }

    /// Request JSON-object output from the model.
    #[must_use]
    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }

    /// Combine `symbols` (order matters) into one element. Never fails.
    pub async fn add(&self, symbols: &[Symbol]) -> Element {
        self.try_add(symbols).await.unwrap_or_else(|err| {
            error!(symbols = %joined(symbols), "add failed: {err}");
            Element::empty()
        })
    }

    /// Split `symbol` into two elements. Never fails.
    pub async fn split(&self, symbol: &Symbol) -> Split {
        self.try_split(symbol).await.unwrap_or_else(|err| {
            error!(%symbol, "split failed: {err}");
            Split::empty()
        })
    }

    /// [`Crafter::add`] without the empty-result fallback.
    ///
    /// # Errors
    /// Returns `CraftError::InvalidInput` for an empty list and `CraftError::Llm` when the
    /// model call fails.
    pub async fn try_add(&self, symbols: &[Symbol]) -> Result<Element> {
        if symbols.is_empty() {
            return Err(CraftError::InvalidInput("at least one symbol is required".into()));
        }
        let flights = self.single_flight.then_some(&self.add_flights);
        memoized(&*self.combinations, flights, symbols.to_vec(), || async {
            let reply = self
                .invoker
                .invoke(&self.prompts.add(symbols), self.json_mode)
                .await?;
            let parsed = parse_combination(&reply);
            info!(symbols = %joined(symbols), response = %reply, parsed = ?parsed, "add");
            Ok::<_, CraftError>(parsed)
        })
        .await
    }

    /// [`Crafter::split`] without the empty-result fallback.
    ///
    /// # Errors
    /// Returns `CraftError::Llm` when the model call fails.
    pub async fn try_split(&self, symbol: &Symbol) -> Result<Split> {
        let flights = self.single_flight.then_some(&self.split_flights);
        memoized(&*self.splits, flights, symbol.clone(), || async {
            let reply = self
                .invoker
                .invoke(&self.prompts.split(symbol), self.json_mode)
                .await?;
            let parsed = parse_split(&reply);
            info!(%symbol, response = %reply, parsed = ?parsed, "split");
            Ok::<_, CraftError>(parsed)
        })
        .await
    }

    /// Combine using caller-supplied messages. Not memoized; `symbols` is only logged.
    pub async fn add_custom(&self, messages: &[ChatMessage], symbols: &[String]) -> Element {
        let result = self.ask(messages).await.map(|reply| {
            let parsed = parse_combination(&reply);
            info!(symbols = %symbols.join("+"), response = %reply, parsed = ?parsed, "add_custom");
            parsed
        });
        result.unwrap_or_else(|err| {
            error!(symbols = %symbols.join("+"), "add_custom failed: {err}");
            Element::empty()
        })
    }

    /// Split using caller-supplied messages. Not memoized; `symbol` is only logged.
    pub async fn split_custom(&self, messages: &[ChatMessage], symbol: &Symbol) -> Split {
        let result = self.ask(messages).await.map(|reply| {
            let parsed = parse_split(&reply);
            info!(%symbol, response = %reply, parsed = ?parsed, "split_custom");
            parsed
        });
        result.unwrap_or_else(|err| {
            error!(%symbol, "split_custom failed: {err}");
            Split::empty()
        })
    }

    /// Current memo table sizes.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            combinations: self.combinations.len(),
            splits: self.splits.len(),
        }
    }

    async fn ask(&self, messages: &[ChatMessage]) -> Result<String> {
        if messages.is_empty() {
            return Err(CraftError::InvalidInput("at least one message is required".into()));
        }
        Ok(self.invoker.invoke(messages, self.json_mode).await?)
    }
}

/// Return the stored value for `key`, or compute, store and return it.
///
/// With `flights`, concurrent callers for the same key wait for the first one and then
/// read its stored result. Errors are returned without storing anything.
async fn memoized<K, V, F, Fut>(
    store: &dyn MemoStore<K, V>,
    flights: Option<&InFlight<K>>,
    key: K,
    compute: F,
) -> Result<V>
where
    K: Eq + Hash + Clone,
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V>>,
{
    if let Some(hit) = store.get(&key) {
        return Ok(hit);
    }

    let _flight = match flights {
        Some(flights) => {
            let guard = flights.acquire(&key).await;
            if let Some(hit) = store.get(&key) {
                return Ok(hit);
            }
            Some(guard)
        }
        None => None,
    };

    let value = compute().await?;
    store.insert(key, value.clone());
    Ok(value)
}

fn joined(symbols: &[Symbol]) -> String {
    symbols
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join("+")
}
