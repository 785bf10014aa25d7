//! The generation pipeline: validate, build tokens, walk the template, append
//! the annex, save.

use crate::annex::{append_annex, AnnexDataset};
use crate::builder::{build_token_table, letter_now, LetterDate};
use crate::config::GeneratorConfig;
use crate::docx::DocxPackage;
use crate::document::Document;
use crate::emphasis::EmphasisRules;
use crate::error::{LetterError, Result};
use crate::letter::{LetterForm, LetterKind};
use crate::placeholders::{leftover_spellings, missing_slots};
use crate::walker::{rewrite_document, WalkStats};
use chrono::{DateTime, FixedOffset};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Attempts at claiming a free output name before giving up.
const MAX_SAVE_ATTEMPTS: usize = 100;

/// A letter written to the output directory.
#[derive(Debug, Clone)]
pub struct GeneratedLetter {
    pub path: PathBuf,
    pub file_name: String,
    pub stats: WalkStats,
    pub annex_rows: usize,
    /// Plain text of the final document
    pub preview: String,
    /// Placeholders still present (optional fields left empty)
    pub leftover: Vec<&'static str>,
}

/// Result of checking one template against the placeholder catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateStatus {
    Missing,
    Unreadable(String),
    /// Slots of the letter kind with no spelling in the template
    Checked { missing_slots: Vec<&'static str> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateReport {
    pub kind_id: &'static str,
    pub path: PathBuf,
    pub status: TemplateStatus,
}

/// `Carta_error_lectura_GR_15624563_20250305_093000123.docx`
pub fn output_file_name(kind_id: &str, claim_number: &str, now: &DateTime<FixedOffset>) -> String {
    let claim: String = claim_number
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "Carta_{}_GR_{}_{}.docx",
        kind_id,
        claim,
        now.format("%Y%m%d_%H%M%S%3f")
    )
}

/// First path in `dir` that does not exist yet, starting from `file_name`.
fn free_path(dir: &Path, file_name: &str) -> (PathBuf, String) {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return (candidate, file_name.to_string());
    }
    let stem = file_name.trim_end_matches(".docx");
    let mut n = 2;
    loop {
        let name = format!("{}_{}.docx", stem, n);
        let path = dir.join(&name);
        if !path.exists() {
            return (path, name);
        }
        n += 1;
    }
}

/// Save under the first free name derived from `file_name`.
///
/// The name check and the save are not one step, so another writer may
/// claim the same name in between; the save then refuses to overwrite and
/// the next name is tried.
fn save_unique(package: &DocxPackage, dir: &Path, file_name: &str) -> Result<(PathBuf, String)> {
    let mut attempts = 0;
    loop {
        let (path, name) = free_path(dir, file_name);
        match package.save_atomic(&path) {
            Ok(()) => return Ok((path, name)),
            Err(LetterError::Io(e))
                if e.kind() == ErrorKind::AlreadyExists && attempts + 1 < MAX_SAVE_ATTEMPTS =>
            {
                attempts += 1;
                log::debug!("{} was taken before it could be written, retrying", name);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Read a template and list the catalog slots it does not contain.
pub fn check_template(path: &Path, kind: &LetterKind) -> Result<Vec<&'static str>> {
    let package = DocxPackage::open(path)?;
    let doc = Document::parse(&package.document_xml()?)?;
    Ok(missing_slots(kind, &doc.plain_text()))
}

pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generate a letter dated now (UTC-3).
    pub fn generate(
        &self,
        form: &LetterForm,
        annex: Option<&AnnexDataset>,
    ) -> Result<GeneratedLetter> {
        self.generate_at(form, annex, letter_now())
    }

    /// Generate a letter dated `now`.
    ///
    /// Preconditions are checked before the template is opened; the output
    /// file is only created by the final save.
    pub fn generate_at(
        &self,
        form: &LetterForm,
        annex: Option<&AnnexDataset>,
        now: DateTime<FixedOffset>,
    ) -> Result<GeneratedLetter> {
        form.validate()?;
        let template = self.config.template_path(form.kind.id());
        if !template.is_file() {
            return Err(LetterError::TemplateNotFound(template));
        }

        let mut form = form.clone();
        if form.issue_city.trim().is_empty() {
            form.issue_city = self.config.default_issue_city.clone();
        }

        let date = LetterDate::from_datetime(&now);
        let table = build_token_table(&form, &date);
        let emphasis = EmphasisRules::new(&form, &date, &self.config.company_legal_name);
        log::debug!("Token table has {} entries", table.len());

        let mut package = DocxPackage::open(&template)?;
        let mut doc = Document::parse(&package.document_xml()?)?;
        let stats = rewrite_document(&mut doc, &table, &emphasis, &self.config.run_style());
        let annex_rows = append_annex(&mut doc, annex, &self.config.annex_style());
        package.set_document_xml(doc.to_xml());

        std::fs::create_dir_all(&self.config.output_dir)?;
        let (path, file_name) = save_unique(
            &package,
            &self.config.output_dir,
            &output_file_name(form.kind.id(), &form.claim_number, &now),
        )?;
        log::info!(
            "Generated {} ({} of {} paragraphs rewritten, {} annex rows)",
            path.display(),
            stats.rewritten,
            stats.visited,
            annex_rows
        );

        let preview = doc.plain_text();
        let leftover = leftover_spellings(&form.kind, &preview);
        for placeholder in &leftover {
            log::warn!("Placeholder left in {}: {}", file_name, placeholder);
        }

        Ok(GeneratedLetter {
            path,
            file_name,
            stats,
            annex_rows,
            preview,
            leftover,
        })
    }

    /// Check every known letter type's template.
    pub fn check_templates(&self) -> Vec<TemplateReport> {
        let mut reports = Vec::new();
        for id in LetterKind::IDS {
            let Ok(kind) = LetterKind::from_id(id) else {
                continue;
            };
            let path = self.config.template_path(id);
            let status = if !path.is_file() {
                log::warn!("Template missing: {}", path.display());
                TemplateStatus::Missing
            } else {
                match check_template(&path, &kind) {
                    Ok(missing_slots) => {
                        if !missing_slots.is_empty() {
                            log::warn!(
                                "Template {} has no placeholder for: {}",
                                path.display(),
                                missing_slots.join(", ")
                            );
                        }
                        TemplateStatus::Checked { missing_slots }
                    }
                    Err(e) => TemplateStatus::Unreadable(e.to_string()),
                }
            };
            reports.push(TemplateReport {
                kind_id: id,
                path,
                status,
            });
        }
        reports
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::letter_offset;
    use chrono::TimeZone;

    #[test]
    fn test_output_file_name() {
        let now = letter_offset()
            .with_ymd_and_hms(2025, 3, 5, 9, 30, 0)
            .unwrap();
        assert_eq!(
            output_file_name("error_lectura", " 15624563 ", &now),
            "Carta_error_lectura_GR_15624563_20250305_093000000.docx"
        );
        assert_eq!(
            output_file_name("respuesta_general", "GR/12 34", &now),
            "Carta_respuesta_general_GR_GR_12_34_20250305_093000000.docx"
        );
    }

    #[test]
    fn test_free_path_appends_counter() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.docx"), b"x").unwrap();
        std::fs::write(dir.path().join("a_2.docx"), b"x").unwrap();
        let (path, name) = free_path(dir.path(), "a.docx");
        assert_eq!(name, "a_3.docx");
        assert_eq!(path, dir.path().join("a_3.docx"));
    }

    #[test]
    fn test_save_unique_keeps_earlier_letters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.docx"), b"EARLIER LETTER").unwrap();
        let package = DocxPackage::from_entries(vec![(
            crate::docx::DOCUMENT_PART.to_string(),
            b"<w:document/>".to_vec(),
        )]);

        let (path, name) = save_unique(&package, dir.path(), "a.docx").unwrap();
        assert_eq!(name, "a_2.docx");
        assert_eq!(path, dir.path().join("a_2.docx"));
        assert_eq!(std::fs::read(dir.path().join("a.docx")).unwrap(), b"EARLIER LETTER");

        let (_, name) = save_unique(&package, dir.path(), "a.docx").unwrap();
        assert_eq!(name, "a_3.docx");
    }

    #[test]
    fn test_missing_fields_checked_before_template() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            template_dir: dir.path().join("templates"),
            output_dir: dir.path().join("output"),
            ..GeneratorConfig::default()
        };
        let mut form = crate::letter::sample_form();
        form.address.clear();
        let err = Generator::new(config).generate(&form, None).unwrap_err();
        assert!(matches!(err, LetterError::MissingFields(ref f) if f == &vec!["address"]));
        assert!(!dir.path().join("output").exists());
    }

    #[test]
    fn test_missing_template_is_precondition() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            template_dir: dir.path().to_path_buf(),
            output_dir: dir.path().join("output"),
            ..GeneratorConfig::default()
        };
        let err = Generator::new(config)
            .generate(&crate::letter::sample_form(), None)
            .unwrap_err();
        assert!(matches!(err, LetterError::TemplateNotFound(_)));
        assert!(err.is_precondition());
    }
}
