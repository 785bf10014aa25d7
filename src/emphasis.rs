//! Emphasis classifier for rewritten paragraphs.
//!
//! Templates carry no marker for the letterhead block, so emphasis is decided
//! from the final text alone: a paragraph is bold when it contains one of the
//! trigger strings, unless it looks like the date line or the DGR header.
//! A paragraph that is exactly the issue city is always bold.

use crate::builder::LetterDate;
use crate::letter::LetterForm;

pub const CLIENT_NUMBER_LABEL: &str = "Número de cliente:";
pub const CLAIM_REFERENCE_LABEL: &str = "Ref.: Reclamo N°";
pub const DGR_LABEL: &str = "DGR N°";

#[derive(Debug, Clone)]
pub struct EmphasisRules {
    triggers: Vec<String>,
    issue_city: String,
    year: String,
}

impl EmphasisRules {
    pub fn new(form: &LetterForm, date: &LetterDate, company_legal_name: &str) -> Self {
        let candidates = [
            form.salutation.trim(),
            form.client_name.trim(),
            form.address.trim(),
            CLIENT_NUMBER_LABEL,
            CLAIM_REFERENCE_LABEL,
            form.zone.manager(),
            company_legal_name.trim(),
        ];
        // An empty trigger would match every paragraph
        let triggers = candidates
            .iter()
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect();
        Self {
            triggers,
            issue_city: form.issue_city.trim().to_string(),
            year: date.year.to_string(),
        }
    }

    pub fn triggers(&self) -> &[String] {
        &self.triggers
    }

    /// "Valparaiso, 5 de marzo de 2025"
    pub fn is_date_line(&self, text: &str) -> bool {
        !self.issue_city.is_empty()
            && text.contains(&format!("{},", self.issue_city))
            && text.split_whitespace().any(|w| w == "de")
            && text.contains(&self.year)
    }

    /// "DGR N° 4411/2025"
    pub fn is_dgr_line(&self, text: &str) -> bool {
        text.contains(DGR_LABEL) && text.contains(&self.year)
    }

    pub fn has_trigger(&self, text: &str) -> bool {
        self.triggers.iter().any(|t| text.contains(t.as_str()))
    }

    /// Bold flag for a rewritten paragraph.
    pub fn is_bold(&self, text: &str) -> bool {
        if !self.issue_city.is_empty() && text.trim() == self.issue_city {
            return true;
        }
        self.has_trigger(text) && !self.is_date_line(text) && !self.is_dgr_line(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::letter::sample_form;

    fn rules() -> EmphasisRules {
        let date = LetterDate {
            day: 5,
            month: 3,
            year: 2025,
        };
        EmphasisRules::new(&sample_form(), &date, "CGE S.A.")
    }

    #[test]
    fn test_manager_line_is_bold() {
        assert!(rules().is_bold("Alex Andrés González Villablanca"));
    }

    #[test]
    fn test_date_line_is_not_bold() {
        let r = rules();
        assert!(r.is_date_line("Valparaiso, 5 de marzo de 2025"));
        assert!(!r.is_bold("Valparaiso, 5 de marzo de 2025"));
        // Disqualified even when a trigger is present
        assert!(!r.is_bold("Valparaiso, 5 de marzo de 2025 Señor"));
    }

    #[test]
    fn test_dgr_line_is_not_bold() {
        let r = rules();
        assert!(!r.is_bold("DGR N° 4411/2025 Ref.: Reclamo N° 15624563"));
        assert!(r.is_bold("Ref.: Reclamo N° 15624563"));
    }

    #[test]
    fn test_standalone_city_is_bold() {
        let r = rules();
        assert!(r.is_bold("  Valparaiso "));
        assert!(!r.is_bold("Valparaiso es una ciudad"));
    }

    #[test]
    fn test_field_triggers() {
        let r = rules();
        assert!(r.is_bold("Señor"));
        assert!(r.is_bold("Eduardo López"));
        assert!(r.is_bold("Prat 725"));
        assert!(r.is_bold("Número de cliente: 6255126"));
        assert!(r.is_bold("Saluda atentamente, CGE S.A."));
        assert!(!r.is_bold("Estimado Eduardo,"));
    }

    #[test]
    fn test_empty_values_are_not_triggers() {
        let mut form = sample_form();
        form.address.clear();
        let date = LetterDate {
            day: 1,
            month: 1,
            year: 2025,
        };
        let r = EmphasisRules::new(&form, &date, "");
        assert_eq!(r.triggers().len(), 5);
        assert!(!r.is_bold("texto cualquiera"));
    }
}
