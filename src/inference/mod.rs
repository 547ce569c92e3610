pub mod provider;
pub mod providers;
pub mod types;

pub use provider::{GenerationError, GenerationProvider};
pub use providers::{OpenRouterProvider, ScriptedProvider};
pub use types::{GeneratedTurn, GenerationRequest};
