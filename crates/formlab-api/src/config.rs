//! Server configuration.

use std::path::PathBuf;

use formlab_core::defaults;

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Where uploaded videos are stored as `{job_id}.{ext}`.
    pub upload_dir: PathBuf,
    /// Where results are persisted, one JSON file per job.
    pub results_dir: PathBuf,
    pub max_upload_bytes: u64,
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: defaults::SERVER_HOST.to_string(),
            port: defaults::SERVER_PORT,
            upload_dir: PathBuf::from(defaults::UPLOAD_DIR),
            results_dir: PathBuf::from(defaults::RESULTS_DIR),
            max_upload_bytes: defaults::MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            cors_origins: split_origins(defaults::CORS_ORIGINS),
        }
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl ApiConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `HOST` | `0.0.0.0` | Bind address |
    /// | `PORT` | `8000` | Bind port |
    /// | `UPLOAD_DIR` | `uploads` | Uploaded video directory |
    /// | `RESULTS_DIR` | `results` | Persisted result directory |
    /// | `MAX_UPLOAD_SIZE_MB` | `100` | Upload size limit |
    /// | `CORS_ORIGINS` | `http://localhost:3000,http://localhost:3001` | Allowed origins |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = std::env::var("PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults.port);
        let upload_dir = std::env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);
        let results_dir = std::env::var("RESULTS_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.results_dir);
        let max_upload_bytes = std::env::var("MAX_UPLOAD_SIZE_MB")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(|mb| mb * 1024 * 1024)
            .unwrap_or(defaults.max_upload_bytes);
        let cors_origins = std::env::var("CORS_ORIGINS")
            .ok()
            .map(|v| split_origins(&v))
            .filter(|origins| !origins.is_empty())
            .unwrap_or(defaults.cors_origins);

        Self {
            host,
            port,
            upload_dir,
            results_dir,
            max_upload_bytes,
            cors_origins,
        }
    }

    pub fn with_upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = dir.into();
        self
    }

    pub fn with_results_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.results_dir = dir.into();
        self
    }

    pub fn with_max_upload_bytes(mut self, bytes: u64) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Upload limit in whole megabytes, for messages.
    pub fn max_upload_mb(&self) -> u64 {
        self.max_upload_bytes / (1024 * 1024)
    }

    /// Body limit for the HTTP layer: the upload limit plus room for multipart framing.
    pub fn body_limit(&self) -> usize {
        usize::try_from(self.max_upload_bytes.saturating_add(1024 * 1024)).unwrap_or(usize::MAX)
    }
}
