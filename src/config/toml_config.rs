use crate::adapters::model_file::{LocalModelFile, DEFAULT_MODEL_PATH};
use crate::core::corrections::{CorrectionLayer, CorrectionRule};
use crate::core::estimator::Estimator;
use crate::core::special_cases::{SpecialCase, SpecialCaseTable};
use crate::utils::error::{ReimburseError, Result};
use crate::utils::validation::{validate_path, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional configuration file.
///
/// ```toml
/// builtin_special_cases = true
///
/// [model]
/// path = "${MODEL_DIR}/decision_tree.json"
///
/// [logging]
/// level = "debug"
///
/// [[special_cases]]
/// days = 3
/// miles = { ge = 120.0, le = 121.0 }
/// receipts = { ge = 21.0, le = 22.0 }
/// amount = 464.07
///
/// [[corrections]]
/// when = { days = 1, miles_per_day = { gt = 800.0 } }
/// adjust = { scale = 0.95 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    /// Keep the built-in special cases ahead of `special_cases`.
    #[serde(default = "default_true")]
    pub builtin_special_cases: bool,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Appended after the built-in table, in file order.
    #[serde(default)]
    pub special_cases: Vec<SpecialCase>,
    /// Replaces the built-in rules when present.
    #[serde(default)]
    pub corrections: Option<Vec<CorrectionRule>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Level for this crate's events (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: Option<String>,
}

fn default_true() -> bool {
    true
}

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            builtin_special_cases: true,
            model: ModelConfig::default(),
            logging: LoggingConfig::default(),
            special_cases: Vec::new(),
            corrections: None,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReimburseError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReimburseError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MODEL_DIR})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReimburseError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(path) = &self.model.path {
            validate_path("model.path", path)?;
        }

        if let Some(level) = &self.logging.level {
            if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(ReimburseError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("Valid levels: {}", LOG_LEVELS.join(", ")),
                });
            }
        }

        self.special_case_table().validate()?;
        self.correction_layer().validate()?;

        Ok(())
    }

    /// `override_path` (command line or environment) wins over the file.
    pub fn model_path<'a>(&'a self, override_path: Option<&'a str>) -> &'a str {
        override_path
            .or(self.model.path.as_deref())
            .unwrap_or(DEFAULT_MODEL_PATH)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.level.as_deref()
    }

    pub fn special_case_table(&self) -> SpecialCaseTable {
        let mut table = if self.builtin_special_cases {
            SpecialCaseTable::builtin()
        } else {
            SpecialCaseTable::empty()
        };
        table.extend(self.special_cases.iter().cloned());
        table
    }

    pub fn correction_layer(&self) -> CorrectionLayer {
        match &self.corrections {
            Some(rules) => CorrectionLayer::new(rules.clone()),
            None => CorrectionLayer::builtin(),
        }
    }

    /// Validates the file first; a bad override or rule is an error here,
    /// unlike a bad model file, which only switches to the fallback.
    pub fn build_estimator(&self, override_path: Option<&str>) -> Result<Estimator> {
        self.validate_config()?;
        let path = self.model_path(override_path);
        Ok(Estimator::from_source(
            &LocalModelFile::new(path),
            self.special_case_table(),
            self.correction_layer(),
        ))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::corrections::Adjustment;
    use crate::domain::model::InputTriple;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();
        assert!(config.builtin_special_cases);
        assert_eq!(config.model_path(None), DEFAULT_MODEL_PATH);
        assert_eq!(config.special_case_table().len(), 6);
        assert_eq!(config.correction_layer().len(), 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
builtin_special_cases = false

[model]
path = "models/tree.json"

[logging]
level = "debug"

[[special_cases]]
label = "case 12"
days = 3
miles = { ge = 120.0, le = 121.0 }
receipts = { ge = 21.0, le = 22.0 }
amount = 464.07

[[corrections]]
when = { days = 1, miles_per_day = { gt = 800.0 } }
adjust = { scale = 0.95 }
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.model_path(None), "models/tree.json");
        assert_eq!(config.model_path(Some("other.json")), "other.json");
        assert_eq!(config.log_level(), Some("debug"));

        let table = config.special_case_table();
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.lookup(&InputTriple::new(3, 120.5, 21.5)).map(|(_, e)| e.amount),
            Some(464.07)
        );

        let layer = config.correction_layer();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.rules()[0].adjust, Adjustment::Scale(0.95));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_extra_special_cases_follow_builtins() {
        let config = TomlConfig::from_toml_str(
            r#"
[[special_cases]]
days = 4
amount = 1.0
"#,
        )
        .unwrap();
        let table = config.special_case_table();
        assert_eq!(table.len(), 7);
        assert_eq!(table.entries()[6].days, Some(4));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("REIMBURSE_TEST_MODEL_DIR", "/opt/models");

        let config = TomlConfig::from_toml_str(
            r#"
[model]
path = "${REIMBURSE_TEST_MODEL_DIR}/tree.json"
"#,
        )
        .unwrap();
        assert_eq!(config.model_path(None), "/opt/models/tree.json");

        std::env::remove_var("REIMBURSE_TEST_MODEL_DIR");
    }

    #[test]
    fn test_config_validation() {
        let bad_level = TomlConfig::from_toml_str("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(bad_level.validate().is_err());

        let bad_amount = TomlConfig::from_toml_str(
            r#"
[[special_cases]]
days = 2
amount = -10.0
"#,
        )
        .unwrap();
        assert!(bad_amount.validate().is_err());
    }

    #[test]
    fn test_negative_override_does_not_build() {
        let config = TomlConfig::from_toml_str(
            r#"
builtin_special_cases = false

[[special_cases]]
days = 3
amount = -10.0
"#,
        )
        .unwrap();
        let err = config.build_estimator(Some("/nonexistent/tree.json")).unwrap_err();
        assert!(matches!(
            err,
            ReimburseError::InvalidConfigValueError { ref field, .. }
                if field == "special_cases[0].amount"
        ));
    }

    #[test]
    fn test_build_estimator_without_model_file() {
        let estimator = TomlConfig::default()
            .build_estimator(Some("/nonexistent/tree.json"))
            .unwrap();
        assert!(!estimator.is_tree_ready());
        let estimate = estimator.estimate(&InputTriple::new(3, 10.0, 10.0)).unwrap();
        assert!(estimate.amount >= 0.0);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(TomlConfig::from_toml_str("[model]\nfile = \"x.json\"\n").is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[model]\npath = \"from-file.json\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.model_path(None), "from-file.json");
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            TomlConfig::from_file("/nonexistent/reimburse.toml"),
            Err(ReimburseError::IoError(_))
        ));
    }
}
