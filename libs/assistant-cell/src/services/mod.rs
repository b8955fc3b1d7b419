pub mod completion;
pub mod conversation;

pub use completion::{ChatCompletion, OpenAiCompletionClient};
pub use conversation::ConversationService;
