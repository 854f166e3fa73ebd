pub mod client;
pub mod describe;
pub mod types;

pub use describe::OpenAiDescriptionClient;

pub(crate) const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";
