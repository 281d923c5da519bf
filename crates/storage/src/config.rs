/// Object storage configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Bucket holding template derivatives (default: `templates`).
    pub bucket: String,
    /// S3 region (default: `us-east-1`).
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, LocalStack, ...).
    pub endpoint_url: Option<String>,
    /// Use path-style addressing (required by most S3-compatible services).
    pub force_path_style: bool,
    /// Prefix prepended to object paths to form public URLs.
    pub public_base_url: String,
}

impl StorageConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                           |
    /// |----------------------------|-----------------------------------|
    /// | `STORAGE_BUCKET`           | `templates`                       |
    /// | `STORAGE_REGION`           | `us-east-1`                       |
    /// | `STORAGE_ENDPOINT_URL`     | unset                             |
    /// | `STORAGE_FORCE_PATH_STYLE` | `false`                           |
    /// | `STORAGE_PUBLIC_BASE_URL`  | `http://localhost:9000/templates` |
    pub fn from_env() -> Self {
        let bucket = std::env::var("STORAGE_BUCKET").unwrap_or_else(|_| "templates".into());
        let region = std::env::var("STORAGE_REGION").unwrap_or_else(|_| "us-east-1".into());
        let endpoint_url = std::env::var("STORAGE_ENDPOINT_URL")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let force_path_style = std::env::var("STORAGE_FORCE_PATH_STYLE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        let public_base_url = std::env::var("STORAGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:9000/{bucket}"));

        Self {
            bucket,
            region,
            endpoint_url,
            force_path_style,
            public_base_url,
        }
    }
}
