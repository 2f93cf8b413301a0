use anyhow::{Context, Result};

use crate::layout::policy::MM;
use crate::layout::{default_layout_policy, FontFace, FontSet, LayoutPolicy};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Application configuration loaded from environment variables.
/// Startup fails if a value is present but malformed, or if the resulting
/// layout policy is invalid.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Optional. Without it `/api/v1/sheets/generate` answers 503.
    pub anthropic_api_key: Option<String>,
    pub max_upload_bytes: usize,
    pub layout: LayoutPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let fonts = FontSet {
            header: font_var(&get, "LAYOUT_HEADER_FONT", FontFace::HelveticaBold)?,
            content: font_var(&get, "LAYOUT_CONTENT_FONT", FontFace::Helvetica)?,
            emphasis: font_var(&get, "LAYOUT_EMPHASIS_FONT", FontFace::HelveticaBold)?,
            code: font_var(&get, "LAYOUT_CODE_FONT", FontFace::Courier)?,
        };

        let mut layout = default_layout_policy(fonts);
        if let Some(margin) = get("LAYOUT_MARGIN_MM") {
            layout.page.margin = parse_mm(&margin).context("LAYOUT_MARGIN_MM must be a number")?;
        }
        if let Some(gap) = get("LAYOUT_COLUMN_GAP_MM") {
            layout.page.column_gap =
                parse_mm(&gap).context("LAYOUT_COLUMN_GAP_MM must be a number")?;
        }
        layout
            .validate()
            .context("Layout configuration is invalid")?;

        Ok(Config {
            port: get("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            anthropic_api_key: get("ANTHROPIC_API_KEY"),
            max_upload_bytes: match get("MAX_UPLOAD_BYTES") {
                Some(v) => v
                    .trim()
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
            layout,
        })
    }
}

fn font_var<G>(get: &G, key: &str, default: FontFace) -> Result<FontFace>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(name) => name
            .parse::<FontFace>()
            .with_context(|| format!("Environment variable '{key}' names an unsupported font")),
        None => Ok(default),
    }
}

fn parse_mm(value: &str) -> Result<f64> {
    let mm: f64 = value.trim().parse()?;
    Ok(mm * MM)
}
