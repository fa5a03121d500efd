//! # craft-server — HTTP API for infini-craft
//!
//! | route                | answer                                   |
//! |----------------------|------------------------------------------|
//! | `GET /add`           | `{"symbol", "emoji"}` for `?symbols=A&symbols=B...` |
//! | `GET /split`         | `[{"symbol", "emoji"}, {"symbol", "emoji"}]` for `?symbol=S` |
//! | `POST /add_custom`   | like `/add`, with caller-supplied messages |
//! | `POST /split_custom` | like `/split`, with caller-supplied messages |
//! | `GET /health`        | liveness plus memo table sizes           |
//!
//! Model failures still answer 200 with the empty result; only malformed
//! client input gets a 4xx.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
