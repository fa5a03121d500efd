use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
};
use craft_core::types::{Element, Split, Symbol, symbols_from};
use craft_llm::ChatMessage;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::AppState;
use crate::error::{ApiError, ApiResult};

/// Query key carrying one symbol of an add request; repeated once per symbol.
const SYMBOLS_PARAM: &str = "symbols";

#[derive(Debug, Deserialize)]
pub struct SplitParams {
    pub symbol: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomAddRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub symbols: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomSplitRequest {
    pub messages: Vec<ChatMessage>,
    pub symbol: Option<String>,
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let stats = state.crafter.cache_stats();
    Json(json!({
        "status": "ok",
        "cached_combinations": stats.combinations,
        "cached_splits": stats.splits,
    }))
}

/// `GET /add?symbols=A&symbols=B`. Query order is kept in the prompt and the cache key.
pub async fn add(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Element>> {
    let names = pairs
        .into_iter()
        .filter(|(key, _)| key == SYMBOLS_PARAM)
        .map(|(_, value)| value);
    let symbols = symbols_from(names)?;
    debug!(count = symbols.len(), "add request");
    Ok(Json(state.crafter.add(&symbols).await))
}

/// `GET /split?symbol=S`
pub async fn split(
    State(state): State<AppState>,
    Query(params): Query<SplitParams>,
) -> ApiResult<Json<Split>> {
    let name = params
        .symbol
        .ok_or_else(|| ApiError::BadRequest("missing query parameter 'symbol'".into()))?;
    let symbol = Symbol::new(name)?;
    debug!(%symbol, "split request");
    Ok(Json(state.crafter.split(&symbol).await))
}

/// `POST /add_custom`: caller-built messages, never memoized.
pub async fn add_custom(
    State(state): State<AppState>,
    payload: Result<Json<CustomAddRequest>, JsonRejection>,
) -> ApiResult<Json<Element>> {
    let Json(body) = payload?;
    require_messages(&body.messages)?;
    Ok(Json(state.crafter.add_custom(&body.messages, &body.symbols).await))
}

/// `POST /split_custom`: caller-built messages, never memoized.
pub async fn split_custom(
    State(state): State<AppState>,
    payload: Result<Json<CustomSplitRequest>, JsonRejection>,
) -> ApiResult<Json<Split>> {
    let Json(body) = payload?;
    require_messages(&body.messages)?;
    let symbol = body
        .symbol
        .ok_or_else(|| ApiError::BadRequest("missing field 'symbol'".into()))?;
    let symbol = Symbol::new(symbol)?;
    Ok(Json(state.crafter.split_custom(&body.messages, &symbol).await))
}

fn require_messages(messages: &[ChatMessage]) -> ApiResult<()> {
    if messages.is_empty() {
        return Err(ApiError::BadRequest("at least one message is required".into()));
    }
    Ok(())
}
