/// Update conversion and the teloxide handler tree
pub mod handlers;
/// Bot API implementation of the messaging client
pub mod telegram;

pub use handlers::{setup_handler, TelegramDispatcher};
pub use telegram::TelegramClient;
