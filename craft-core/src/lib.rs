//! # craft-core — Symbol Crafting Pipeline
//!
//! Two operations, both answered by a chat model:
//!
//! - **add** — combine an ordered list of symbols into one new `{symbol, emoji}`
//! - **split** — decompose one symbol into exactly two `{symbol, emoji}` parts
//!
//! Each request flows through the same stages:
//!
//! ```text
//! Symbol(s) ──► prompt ──► ModelInvoker ──► raw text ──► parse ──► Element / Split
//!                                                                      │
//!                                           MemoStore ◄────────────────┘ (identical input never re-asks)
//! ```
//!
//! Failures never reach the caller: the [`Crafter`] logs them and returns the
//! empty result instead, and does not remember them.

#![deny(clippy::unwrap_used)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod crafter;
pub mod error;
pub mod parse;
pub mod prompt;
pub mod types;

pub use config::CraftConfig;
pub use crafter::Crafter;
pub use error::CraftError;
pub use types::{Element, Split, Symbol};
