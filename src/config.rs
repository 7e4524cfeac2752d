use std::env;
use thiserror::Error;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    MissingVar(&'static str),
    #[error("invalid value for {0}")]
    InvalidVar(&'static str),
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub generate_url: String,
    pub embed_url: String,
    pub embed_model: String,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expire_days: i64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub gemini: GeminiConfig,
    pub jwt: JwtConfig,
    pub upload_dir: String,
    pub admin_password: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key =
            env::var("GEMINI_API_KEY").map_err(|_| ConfigError::MissingVar("GEMINI_API_KEY"))?;

        let model = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());
        let embed_model =
            env::var("GEMINI_EMBED_MODEL").unwrap_or_else(|_| "embedding-001".to_string());

        let secret = env::var("JWT_SECRET").map_err(|_| ConfigError::MissingVar("JWT_SECRET"))?;
        let expire_days = match env::var("JWT_EXPIRE_DAYS") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidVar("JWT_EXPIRE_DAYS"))?,
            Err(_) => 7,
        };

        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "data/uploads".to_string());
        let admin_password =
            env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "AdminPassword123!".to_string());

        Ok(Self {
            gemini: GeminiConfig {
                api_key,
                generate_url: format!("{}/{}:generateContent", GEMINI_API_BASE, model),
                embed_url: format!("{}/{}:embedContent", GEMINI_API_BASE, embed_model),
                embed_model,
            },
            jwt: JwtConfig {
                secret,
                expire_days,
            },
            upload_dir,
            admin_password,
        })
    }
}
