pub mod chat;
pub mod retrier;
pub mod telegram;
pub mod updates;

pub use chat::{ChatClient, ChatError, MessageRef};
pub use retrier::{NotificationRetrier, RetryPolicy};
pub use telegram::TelegramClient;
pub use updates::{IncomingEvent, IncomingUpdate};
