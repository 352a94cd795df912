//! Conversational front-end for the storefront API.
//!
//! Free-text input moves through a constrained pipeline:
//! 1. **Classification** (`intent`) — an ordered rule list maps the
//!    utterance to exactly one of search / add-to-cart / track-order /
//!    unknown, extracting parameters along the way.
//! 2. **Transport** (`client`) — the matched intent becomes one REST call;
//!    server errors and network failures stay distinguishable.
//! 3. **Rendering** (`session`) — the outcome becomes a bot message and the
//!    session's message log and cart count are updated.
//!
//! Each utterance is classified on its own; there is no cross-utterance
//! memory and at most one outstanding request per utterance.

pub mod client;
pub mod intent;
pub mod session;

pub use client::{CartAddReply, ClientError, HttpApi, OrderStatusReply, StorefrontApi};
pub use intent::{classify, Intent};
pub use session::{ChatMessage, ChatSession, Sender};
