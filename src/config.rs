use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub deepgram_api_key: String,
    pub deepgram_base_url: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_model: String,
    /// Optional: verification lookups are skipped entirely when absent.
    pub melissa_api_key: Option<String>,
    pub melissa_base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            database_url: std::env::var("DB_URL")
                .or_else(|_| std::env::var("DATABASE_URL"))
                .map_err(|_| {
                    anyhow::anyhow!("DB_URL or DATABASE_URL environment variable required")
                })
                .and_then(|url| {
                    if url.trim().is_empty() {
                        anyhow::bail!("DB_URL cannot be empty");
                    }
                    if !url.starts_with("postgresql://") && !url.starts_with("postgres://") {
                        anyhow::bail!("DB_URL must start with postgresql:// or postgres://");
                    }
                    Ok(url)
                })?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            deepgram_api_key: std::env::var("DEEPGRAM_API_KEY")
                .map_err(|_| anyhow::anyhow!("DEEPGRAM_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("DEEPGRAM_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            deepgram_base_url: std::env::var("DEEPGRAM_BASE_URL")
                .unwrap_or_else(|_| "https://api.deepgram.com".to_string()),
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY environment variable required"))
                .and_then(|key| {
                    if key.trim().is_empty() {
                        anyhow::bail!("OPENAI_API_KEY cannot be empty");
                    }
                    Ok(key)
                })?,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            melissa_api_key: std::env::var("MELISSA_API_KEY")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            melissa_base_url: std::env::var("MELISSA_BASE_URL")
                .unwrap_or_else(|_| "https://personator.melissadata.net".to_string()),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Database URL: {}...",
            &config.database_url[..20.min(config.database_url.len())]
        );
        tracing::debug!("Deepgram base URL: {}", config.deepgram_base_url);
        tracing::debug!("OpenAI base URL: {}", config.openai_base_url);
        tracing::debug!("OpenAI model: {}", config.openai_model);
        if config.melissa_api_key.is_some() {
            tracing::debug!("Melissa base URL: {}", config.melissa_base_url);
        } else {
            tracing::warn!("MELISSA_API_KEY not set - contact verification lookups disabled");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}
