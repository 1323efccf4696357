//! Configuration loading and management.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};
use crate::score::RollupPolicy;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Survey shape limits.
    pub limits: LimitsConfig,
    /// Weight distribution thresholds.
    pub weights: WeightsConfig,
    /// Backwards-jump policy.
    pub cycles: CyclesConfig,
    /// Score computation policy.
    pub scoring: ScoringConfig,
    /// Output configuration.
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Use this for explicit `--config` flags.
    /// Env vars with `SURVEYFLOW_` prefix override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("SURVEYFLOW_").split("__"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))?;
        Ok(config)
    }

    /// Load configuration from directory, looking for surveyflow.toml or
    /// .surveyflow/surveyflow.toml.
    ///
    /// Missing files are silently skipped (defaults are used).
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("surveyflow.toml")))
            .merge(Toml::file(dir.join(".surveyflow/surveyflow.toml")))
            .merge(Env::prefixed("SURVEYFLOW_").split("__"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))?;
        Ok(config)
    }

    /// Create default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// Survey shape limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Question count above which TOO_MANY_QUESTIONS is raised.
    pub max_questions: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_questions: 200 }
    }
}

/// Weight distribution thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsConfig {
    /// Fewer scorable questions than this skips the distribution analysis.
    pub min_scorable_questions: usize,
    /// Share of total weight (0.0-1.0) above which one question dominates.
    pub dominance_ratio: f64,
    /// max/min weight ratio above which variance is reported.
    pub variance_ratio: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            min_scorable_questions: 3,
            dominance_ratio: 0.5,
            variance_ratio: 5.0,
        }
    }
}

/// Backwards-jump policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CyclesConfig {
    /// Report backwards jumps that close a real loop as errors instead of warnings.
    pub loops_as_errors: bool,
}

/// Score computation policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// How category scores roll up into the overall score.
    pub rollup: RollupPolicy,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Default output format.
    pub format: OutputFormat,
    /// Color output.
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Markdown,
            color: true,
        }
    }
}

/// Output format.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// JSON format.
    Json,
    /// Markdown format.
    #[default]
    #[value(alias = "md")]
    Markdown,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "md" | "markdown" => Ok(Self::Markdown),
            _ => Err(format!("Unknown format: {s}. Use 'text', 'json', or 'md'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.limits.max_questions, 200);
        assert_eq!(config.weights.min_scorable_questions, 3);
        assert!(!config.cycles.loops_as_errors);
        assert_eq!(config.scoring.rollup, RollupPolicy::CategoryOnly);
    }

    #[test]
    fn test_config_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "surveyflow.toml",
                "[weights]\ndominance_ratio = 0.6\n\n[scoring]\nrollup = \"total-ratio\"",
            )?;
            let config = Config::from_file("surveyflow.toml").unwrap();
            assert_eq!(config.weights.dominance_ratio, 0.6);
            assert_eq!(config.weights.variance_ratio, 5.0);
            assert_eq!(config.scoring.rollup, RollupPolicy::TotalRatio);
            Ok(())
        });
    }

    #[test]
    fn test_config_load_default_dot_dir() {
        Jail::expect_with(|jail| {
            std::fs::create_dir(jail.directory().join(".surveyflow")).unwrap();
            jail.create_file(
                ".surveyflow/surveyflow.toml",
                "[limits]\nmax_questions = 50",
            )?;
            let config = Config::load_default(".").unwrap();
            assert_eq!(config.limits.max_questions, 50);
            Ok(())
        });
    }

    #[test]
    fn test_config_load_default_no_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load_default(".").unwrap();
            assert_eq!(config.limits.max_questions, 200);
            Ok(())
        });
    }

    #[test]
    fn test_from_file_errors_on_missing_file() {
        let result = Config::from_file("/nonexistent/path/surveyflow.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("not found"), "expected 'not found' in: {err}");
    }

    #[test]
    fn test_env_var_overrides_file_value() {
        Jail::expect_with(|jail| {
            jail.create_file("surveyflow.toml", "[cycles]\nloops_as_errors = false")?;
            jail.set_env("SURVEYFLOW_CYCLES__LOOPS_AS_ERRORS", "true");
            let config = Config::from_file("surveyflow.toml").unwrap();
            assert!(config.cycles.loops_as_errors);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_rollup_is_config_error() {
        Jail::expect_with(|jail| {
            jail.create_file("surveyflow.toml", "[scoring]\nrollup = \"median\"")?;
            let err = Config::from_file("surveyflow.toml").unwrap_err();
            assert!(err.to_string().starts_with("Configuration error"));
            Ok(())
        });
    }

    #[test]
    fn test_default_toml_parses() {
        let content = Config::default_toml();
        let parsed: Config = toml::from_str(content).unwrap();
        assert_eq!(parsed.limits.max_questions, 200);
        assert_eq!(parsed.output.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("md".parse::<OutputFormat>().unwrap(), OutputFormat::Markdown);
        assert_eq!("TXT".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
