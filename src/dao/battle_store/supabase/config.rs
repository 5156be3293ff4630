use std::time::Duration;

/// Timeout applied to every REST call made against the project.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime configuration describing how to reach the Supabase REST API.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, without the `/rest/v1` suffix.
    pub base_url: String,
    /// Service-role key sent as `apikey` and bearer token.
    pub service_key: String,
    /// Timeout applied to each REST call.
    pub request_timeout: Duration,
}

impl SupabaseConfig {
    /// Construct a configuration from the project URL and the service-role key.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
