//! Generator configuration, loaded from TOML.

use crate::annex::AnnexStyle;
use crate::document::RunStyle;
use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Directory holding `<letter_type>.docx` templates
    pub template_dir: PathBuf,
    /// Directory generated letters are written to
    pub output_dir: PathBuf,
    pub font_family: String,
    /// Font size in points for rewritten paragraphs and annex cells
    pub font_size: f32,
    /// Company name that marks the signature block as bold
    pub company_legal_name: String,
    /// Issue city used when the form leaves it empty
    pub default_issue_city: String,
    pub annex_heading: String,
    pub annex_table_style: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            template_dir: PathBuf::from("templates"),
            output_dir: PathBuf::from("output"),
            font_family: "Arial".to_string(),
            font_size: 11.0,
            company_legal_name: "CGE S.A.".to_string(),
            default_issue_city: "Valparaiso".to_string(),
            annex_heading: "Anexos".to_string(),
            annex_table_style: "LightGrid".to_string(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Load from `path`, or use defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config = Self::from_toml_str(&content)?;
                log::info!("Loaded configuration from {}", p.display());
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn run_style(&self) -> RunStyle {
        RunStyle::new(self.font_family.clone(), self.font_size)
    }

    pub fn annex_style(&self) -> AnnexStyle {
        AnnexStyle {
            heading: self.annex_heading.clone(),
            table_style: self.annex_table_style.clone(),
            run: self.run_style(),
        }
    }

    /// Template path for a letter type identifier.
    pub fn template_path(&self, kind_id: &str) -> PathBuf {
        self.template_dir.join(format!("{}.docx", kind_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = GeneratorConfig::from_toml_str(
            r#"
            template_dir = "/srv/cartas/templates"
            font_size = 12.5
            "#,
        )
        .unwrap();
        assert_eq!(config.template_dir, PathBuf::from("/srv/cartas/templates"));
        assert_eq!(config.run_style().size_half_points, 25);
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.font_family, "Arial");
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = GeneratorConfig::from_toml_str("font_size = \"grande\"").unwrap_err();
        assert!(matches!(err, crate::error::LetterError::Config(_)));
    }

    #[test]
    fn test_template_path() {
        let config = GeneratorConfig::default();
        assert_eq!(
            config.template_path("error_lectura"),
            PathBuf::from("templates").join("error_lectura.docx")
        );
    }

    #[test]
    fn test_load_without_path() {
        assert_eq!(GeneratorConfig::load(None).unwrap(), GeneratorConfig::default());
    }
}
