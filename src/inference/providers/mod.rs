mod openrouter;
mod scripted;

pub use openrouter::OpenRouterProvider;
pub use scripted::{SCRIPTED_ARTIFACT_TITLE, ScriptedProvider};
