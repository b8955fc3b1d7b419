pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::completion::{ChatCompletion, OpenAiCompletionClient};
pub use services::conversation::ConversationService;
