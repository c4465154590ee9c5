//! Pure routing functions for the turn pipeline
//!
//! `Start -> Planner -> (Tool | Responder) -> End`. Nothing loops back to the
//! planner, and no stage is visited twice in one turn. A turn that arrives with
//! a routing tag already set goes straight from `Start` to its branch.

use super::state::{ConversationState, NextNode};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Planner,
    Tool,
    Responder,
    End,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::Planner => "planner",
            Stage::Tool => "tool",
            Stage::Responder => "responder",
            Stage::End => "end",
        }
    }
}

/// Case-insensitive substring match against any keyword
pub fn contains_keyword(text: &str, keywords: &[String]) -> bool {
    let lower = text.to_lowercase();
    keywords.iter().any(|k| !k.is_empty() && lower.contains(k.as_str()))
}

/// Pick the branch after the planner has run.
///
/// A tool decision always wins. Otherwise the turn text is checked against the
/// routing keywords, so a caller that skipped the planner still gets weather
/// questions answered by the tool.
pub fn route_after_planner(state: &ConversationState, route_keywords: &[String]) -> Stage {
    if state.next_node == Some(NextNode::Tool) {
        return Stage::Tool;
    }

    if contains_keyword(state.routing_text(), route_keywords) {
        return Stage::Tool;
    }

    Stage::Responder
}

/// Pure stage transition. A decision seeded before the turn skips the planner.
pub fn next_stage(stage: Stage, state: &ConversationState, route_keywords: &[String]) -> Stage {
    match stage {
        Stage::Start if state.next_node.is_some() => route_after_planner(state, route_keywords),
        Stage::Start => Stage::Planner,
        Stage::Planner => route_after_planner(state, route_keywords),
        Stage::Tool | Stage::Responder | Stage::End => Stage::End,
    }
}
