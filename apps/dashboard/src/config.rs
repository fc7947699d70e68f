/// Dashboard configuration loaded from environment variables.
///
/// All fields have defaults suitable for a local backend; override via
/// environment variables (or a `.env` file).
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Telemetry API root (default: `http://localhost:8000/api`).
    pub api_url: String,
    /// Seconds between terminal re-renders (default: `2`).
    pub render_interval_secs: u64,
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                     |
    /// |------------------------------|-----------------------------|
    /// | `VIGIL_API_URL`              | `http://localhost:8000/api` |
    /// | `VIGIL_RENDER_INTERVAL_SECS` | `2`                         |
    pub fn from_env() -> Self {
        let api_url = std::env::var("VIGIL_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api".into());

        let render_interval_secs: u64 = std::env::var("VIGIL_RENDER_INTERVAL_SECS")
            .unwrap_or_else(|_| "2".into())
            .parse()
            .expect("VIGIL_RENDER_INTERVAL_SECS must be a valid u64");

        Self {
            api_url,
            render_interval_secs,
        }
    }
}
