pub mod chat;
pub mod config;
pub mod error;
pub mod gateway;
pub mod session;
pub mod util;

// Re-exports for convenience
pub use chat::{Role, Turn};
pub use config::{Config, OpenPolicy};
pub use error::{ChatError, ChatResult};
pub use gateway::{ConversationHandle, GeminiGateway, ModelGateway};
pub use session::{perform_exchange, ExchangeOutcome, HandleState, Session};
