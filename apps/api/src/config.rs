use anyhow::{Context, Result};

/// Port the web wizard expects the API on.
const DEFAULT_PORT: u16 = 5000;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When unset the service keeps records in memory.
    pub database_url: Option<String>,
    /// HS256 secret shared with the service that issues login tokens.
    pub jwt_secret: String,
    pub cors_origin: String,
    /// When false, DOCX exports carry only title, contacts, summary and skills.
    pub docx_full_sections: bool,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            jwt_secret: require_env("JWT_SECRET")?,
            cors_origin: optional_env("CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            docx_full_sections: parse_flag(
                "EXPORT_DOCX_FULL_SECTIONS",
                optional_env("EXPORT_DOCX_FULL_SECTIONS").as_deref(),
                true,
            )?,
            port: parse_port(optional_env("PORT").as_deref())?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_port(raw: Option<&str>) -> Result<u16> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<u16>()
            .context("PORT must be a valid port number"),
        None => Ok(DEFAULT_PORT),
    }
}

fn parse_flag(key: &str, raw: Option<&str>, default: bool) -> Result<bool> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{key} must be a boolean, got '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag_uses_default_when_unset() {
        assert!(parse_flag("X", None, true).unwrap());
        assert!(!parse_flag("X", None, false).unwrap());
    }

    #[test]
    fn test_parse_flag_accepts_common_spellings() {
        assert!(parse_flag("X", Some("TRUE"), false).unwrap());
        assert!(parse_flag("X", Some(" on "), false).unwrap());
        assert!(!parse_flag("X", Some("0"), true).unwrap());
        assert!(!parse_flag("X", Some("no"), true).unwrap());
    }

    #[test]
    fn test_parse_flag_rejects_garbage() {
        let err = parse_flag("EXPORT_DOCX_FULL_SECTIONS", Some("maybe"), true).unwrap_err();
        assert!(err.to_string().contains("EXPORT_DOCX_FULL_SECTIONS"));
    }

    #[test]
    fn test_port_defaults_to_wizard_port() {
        assert_eq!(parse_port(None).unwrap(), 5000);
        assert_eq!(parse_port(Some(" 8080 ")).unwrap(), 8080);
        assert!(parse_port(Some("http")).is_err());
    }
}
