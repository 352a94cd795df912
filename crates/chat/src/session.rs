use storebot_core::Product;
use tracing::debug;

use crate::client::{ClientError, StorefrontApi};
use crate::intent::{classify, Intent};

pub const GREETING: &str =
    "Hello! How can I help? You can search products, add to cart, or track an order.";
const FALLBACK_HELP: &str = "I'm not sure how to help with that. Try 'search for...', \
    'add p1 x1', or 'track order ORD-1234 for user@email.com'.";
const TRACK_USAGE: &str = "To track an order, please provide the Order ID and your email. \
    Ex: 'track ORD-1001 for alice@example.com'";
const SEARCH_APOLOGY: &str = "Oops! There was an error searching. Please try again.";
const CART_APOLOGY: &str = "Oops! Could not add to cart. Please try again.";
const TRACK_APOLOGY: &str = "Oops! There was an error checking the order. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// Append-only conversation entry. Ids are monotonic within a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: u64,
    pub sender: Sender,
    pub content: String,
}

/// One chat session: the ordered message log, the locally tracked cart item
/// count, and the typing flag held while a classification is in flight.
pub struct ChatSession<A> {
    api: A,
    messages: Vec<ChatMessage>,
    next_id: u64,
    cart_count: u64,
    typing: bool,
}

impl<A: StorefrontApi> ChatSession<A> {
    pub fn new(api: A) -> Self {
        let mut session =
            Self { api, messages: Vec::new(), next_id: 1, cart_count: 0, typing: false };
        session.push(Sender::Bot, GREETING.to_owned());
        session
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn cart_count(&self) -> u64 {
        self.cart_count
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    fn push(&mut self, sender: Sender, content: String) -> &ChatMessage {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(ChatMessage { id, sender, content });
        self.messages.last().expect("just pushed")
    }

    /// Classifies the utterance, runs exactly one intent branch, and returns
    /// the rendered bot reply. The typing flag covers the whole span from
    /// user message to terminal render.
    pub async fn handle_message(&mut self, text: &str) -> &ChatMessage {
        self.push(Sender::User, text.to_owned());
        self.typing = true;

        let intent = classify(text);
        debug!(event_name = "chat.intent_classified", intent = ?intent, "utterance classified");

        let reply = match intent {
            Intent::Search { query } => self.run_search(&query).await,
            Intent::AddToCart { product_id, qty } => self.run_add_to_cart(&product_id, qty).await,
            Intent::TrackOrder { order_id, email } => {
                self.run_track_order(&order_id, &email).await
            }
            Intent::TrackOrderUsage => TRACK_USAGE.to_owned(),
            Intent::Unknown => FALLBACK_HELP.to_owned(),
        };

        self.typing = false;
        self.push(Sender::Bot, reply)
    }

    async fn run_search(&mut self, query: &str) -> String {
        match self.api.search(query).await {
            Ok(products) if !products.is_empty() => render_product_list(query, &products),
            Ok(_) => format!("Sorry, I couldn't find any products matching \"{query}\"."),
            Err(error) => {
                debug!(event_name = "chat.search_failed", error = %error, "search failed");
                SEARCH_APOLOGY.to_owned()
            }
        }
    }

    async fn run_add_to_cart(&mut self, product_id: &str, qty: u32) -> String {
        match self.api.add_to_cart(product_id, qty).await {
            Ok(reply) => {
                self.cart_count = reply.total_items;
                format!("Added! Your cart now has {} item(s).", reply.total_items)
            }
            Err(ClientError::Api { message, .. }) => format!("Error: {message}"),
            Err(ClientError::Transport(cause)) => {
                debug!(event_name = "chat.cart_add_failed", cause = %cause, "add to cart failed");
                CART_APOLOGY.to_owned()
            }
        }
    }

    async fn run_track_order(&mut self, order_id: &str, email: &str) -> String {
        match self.api.order_status(order_id, email).await {
            Ok(reply) => {
                format!("Order {} Status: **{}**. ETA: {}.", reply.order_id, reply.status, reply.eta)
            }
            Err(ClientError::Api { message, .. }) => format!("Error: {message}"),
            Err(ClientError::Transport(cause)) => {
                debug!(event_name = "chat.order_status_failed", cause = %cause, "lookup failed");
                TRACK_APOLOGY.to_owned()
            }
        }
    }
}

fn render_product_list(query: &str, products: &[Product]) -> String {
    let mut lines = vec![format!("Here's what I found for \"{query}\":")];
    for product in products {
        lines.push(format!("- {} (${})", product.title, product.price));
    }
    lines.join("\n")
}
