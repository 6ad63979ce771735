pub mod api;
pub mod types;

pub use api::GeminiClient;
pub use types::GeminiConfig;
