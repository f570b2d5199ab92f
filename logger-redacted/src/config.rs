// Logger configuration
use std::env;
use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, colored when the terminal supports it
    Pretty,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggerConfig {
    pub format: LogFormat,
    /// Default level used when `RUST_LOG` is unset
    pub log_level: String,
    pub ansi: bool,
    pub with_source_location: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            log_level: "info".to_string(),
            ansi: true,
            with_source_location: false,
        }
    }
}

impl LoggerConfig {
    /// `CLARA_ENV=production` selects JSON output; `NO_COLOR` or a
    /// non-terminal stdout disables ANSI colors.
    pub fn from_env(verbose: bool) -> Self {
        let is_production = env::var("CLARA_ENV")
            .map(|value| value.eq_ignore_ascii_case("production"))
            .unwrap_or(false);
        let use_colors = env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal();

        Self {
            format: if is_production { LogFormat::Json } else { LogFormat::Pretty },
            log_level: if verbose { "debug" } else { "info" }.to_string(),
            ansi: use_colors && !is_production,
            with_source_location: verbose,
        }
    }

    /// Filter directives for `crates`, each at the configured level.
    pub fn directives(&self, crates: &[&str]) -> String {
        crates
            .iter()
            .map(|name| format!("{name}={}", self.log_level))
            .chain(["tower_http=info".to_string(), "hyper=warn".to_string(), "reqwest=warn".to_string()])
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_each_crate() {
        let config = LoggerConfig {
            log_level: "debug".to_string(),
            ..LoggerConfig::default()
        };
        let directives = config.directives(&["clara_server", "clinical_audit"]);
        assert!(directives.starts_with("clara_server=debug,clinical_audit=debug"));
        assert!(directives.contains("tower_http=info"));
    }
}
