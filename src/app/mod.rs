use crate::query::{DefaultOptions, QueryClient};

/// The process-wide query client. Queries never refresh just because the
/// window regained focus.
pub fn query_client() -> QueryClient {
    QueryClient::new(DefaultOptions {
        refetch_on_window_focus: false,
        ..Default::default()
    })
}
