use crate::{query::QueryState, types::health_check::HealthResponse};

pub const TITLE: &str = "♟️ ChessInsight";
pub const LOADING_TEXT: &str = "Checking backend...";
pub const ERROR_TEXT: &str = "Backend error";

/// Renders the home view: the title, then exactly one status line.
pub fn render_home(state: &QueryState<HealthResponse>) -> String {
    let status_line = match state {
        QueryState::Pending => LOADING_TEXT.to_string(),
        QueryState::Error(_) => ERROR_TEXT.to_string(),
        QueryState::Success(health) => format!("Backend status: {}", health.status),
    };

    format!("{TITLE}\n{status_line}\n")
}
