use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "config/outlay.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    /// Bearer token; empty means anonymous.
    pub token: String,
    /// Currency assumed where none is given (imports, quick creates).
    pub default_currency: String,
    pub per_page: u32,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            token: String::new(),
            default_currency: "EUR".to_string(),
            per_page: 25,
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn api(&self) -> client::Api {
        let token = (!self.token.is_empty()).then(|| self.token.clone());
        client::Api::new(self.base_url.clone(), token)
    }
}

/// Flags available on every subcommand.
#[derive(Debug, clap::Args)]
pub struct GlobalArgs {
    /// Optional config file path (TOML).
    #[arg(long, global = true)]
    config: Option<String>,
    /// Override base URL (e.g. http://127.0.0.1:3000).
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Override the API token.
    #[arg(long, global = true)]
    token: Option<String>,
}

/// Config file, then `OUTLAY_*` environment, then flags.
pub fn load(args: &GlobalArgs) -> Result<AppConfig, config::ConfigError> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("OUTLAY"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(token) = &args.token {
        settings.token = token.clone();
    }

    Ok(settings)
}
