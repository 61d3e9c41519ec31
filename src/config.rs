/// Connection settings for the remote task store, resolved once at startup
/// and passed by reference into the client constructor.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
}

const DEFAULT_BASE_URL: &str = "http://localhost:3000";

impl Config {
    /// Reads `TAREAS_API_URL` and `TAREAS_API_PORT`. The port only applies
    /// when the URL does not already carry an explicit one.
    pub fn from_env() -> Self {
        let base_url = std::env::var("TAREAS_API_URL").ok();
        let port = std::env::var("TAREAS_API_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok());
        Config {
            base_url: resolve_base_url(base_url, port),
        }
    }

    /// CLI flag override; wins over the environment when present.
    pub fn with_override(mut self, base_url: Option<String>) -> Self {
        if let Some(url) = base_url {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        self
    }
}

fn resolve_base_url(base_url: Option<String>, port: Option<u16>) -> String {
    let url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let url = url.trim_end_matches('/').to_string();

    let authority = url.split("://").nth(1).unwrap_or(&url);
    let has_port = authority.contains(':');
    match port {
        Some(port) if !has_port => format!("{}:{}", url, port),
        _ => url,
    }
}
