use crate::{
    clients::api::ApiClient,
    query::{QueryClient, QueryHandle},
    types::health_check::HealthResponse,
};

pub const HEALTH_QUERY_KEY: &str = "health";

/// Backend health, cached under [`HEALTH_QUERY_KEY`].
pub fn use_health(client: &QueryClient, api: &ApiClient) -> QueryHandle<HealthResponse> {
    let api = api.clone();
    client.use_query(HEALTH_QUERY_KEY, move || {
        let api = api.clone();
        async move { api.fetch_health().await }
    })
}
