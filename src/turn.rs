//! Single-turn routing pipeline
//!
//! A pure stage transition (`route`) drives async stage handlers
//! (`planner`, `responder`, and the weather tool) over one `ConversationState`.

mod orchestrator;
mod planner;
mod responder;
mod route;
mod state;

pub use orchestrator::{TurnError, TurnOrchestrator};
pub use state::{ConversationState, Message, Role, ToolCallRecord};
