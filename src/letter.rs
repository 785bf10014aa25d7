//! Letter input: the field set collected by the form, the zone and channel
//! selectors, and the per-kind optional fields.

use crate::error::{LetterError, Result};
use std::fmt;
use std::str::FromStr;

// ─── Zone ───────────────────────────────────────────────────────────────────

/// Commercial zone. Selects the manager who signs the letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Norte,
    Centro,
    Sur,
}

impl Zone {
    pub const ALL: [Zone; 3] = [Zone::Norte, Zone::Centro, Zone::Sur];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Norte => "Norte",
            Zone::Centro => "Centro",
            Zone::Sur => "Sur",
        }
    }

    /// Commercial manager for the zone.
    pub fn manager(&self) -> &'static str {
        match self {
            Zone::Norte => "Christian Alberto Gómez Díaz",
            Zone::Centro => "Alex Andrés González Villablanca",
            Zone::Sur => "Christian Enrique Araya Silva",
        }
    }
}

impl FromStr for Zone {
    type Err = LetterError;

    fn from_str(s: &str) -> Result<Self> {
        Zone::ALL
            .into_iter()
            .find(|z| z.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| LetterError::UnknownValue {
                what: "zone",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Channel ────────────────────────────────────────────────────────────────

/// Intake channel through which the claim arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    OficinaComercial,
    WhatsApp,
    AppCge1Click,
    CallCenter,
    CorreoElectronico,
    PaginaWeb,
    PortalSec,
}

impl Channel {
    pub const ALL: [Channel; 7] = [
        Channel::OficinaComercial,
        Channel::WhatsApp,
        Channel::AppCge1Click,
        Channel::CallCenter,
        Channel::CorreoElectronico,
        Channel::PaginaWeb,
        Channel::PortalSec,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::OficinaComercial => "Oficina Comercial",
            Channel::WhatsApp => "WhatsApp",
            Channel::AppCge1Click => "App CGE 1Click",
            Channel::CallCenter => "Call Center",
            Channel::CorreoElectronico => "Correo Electrónico",
            Channel::PaginaWeb => "Página Web",
            Channel::PortalSec => "Portal SEC",
        }
    }
}

impl FromStr for Channel {
    type Err = LetterError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        Channel::ALL
            .into_iter()
            .find(|c| c.as_str().to_lowercase() == wanted)
            .ok_or_else(|| LetterError::UnknownValue {
                what: "channel",
                value: s.to_string(),
            })
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Letter kinds ───────────────────────────────────────────────────────────

/// Optional fields of the reading-error letter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadingErrorFields {
    /// "boleta" or "factura"
    pub document_kind: Option<String>,
    /// Date of the corrected bill (dd/mm/aaaa)
    pub bill_date: Option<String>,
    /// Corrected consumption in kWh, already formatted
    pub corrected_kwh: Option<String>,
    /// Bill amount, already formatted
    pub amount: Option<String>,
    /// Days between which the meter is read (e.g. "06 y 12")
    pub reading_range: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneralFields {
    pub response_body: Option<String>,
}

/// Letter type, carrying the optional fields only that type uses.
#[derive(Debug, Clone, PartialEq)]
pub enum LetterKind {
    ReadingError(ReadingErrorFields),
    General(GeneralFields),
}

impl LetterKind {
    pub const IDS: [&'static str; 2] = ["error_lectura", "respuesta_general"];

    /// Identifier used for the template file name and the output name.
    pub fn id(&self) -> &'static str {
        match self {
            LetterKind::ReadingError(_) => "error_lectura",
            LetterKind::General(_) => "respuesta_general",
        }
    }

    /// An empty variant for the given identifier.
    pub fn from_id(id: &str) -> Result<Self> {
        match id.trim() {
            "error_lectura" => Ok(LetterKind::ReadingError(ReadingErrorFields::default())),
            "respuesta_general" => Ok(LetterKind::General(GeneralFields::default())),
            other => Err(LetterError::UnknownValue {
                what: "letter type",
                value: other.to_string(),
            }),
        }
    }
}

// ─── Form ───────────────────────────────────────────────────────────────────

/// A regulator case the claim is also filed under (e.g. a SEC complaint).
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalCase {
    /// Case type, e.g. "SEC"
    pub kind: String,
    pub number: String,
}

/// Field values for one generation run.
#[derive(Debug, Clone, PartialEq)]
pub struct LetterForm {
    pub kind: LetterKind,
    /// City on the date line; the configured default is used when empty.
    pub issue_city: String,
    /// "Señor" / "Señora"
    pub salutation: String,
    pub client_name: String,
    pub address: String,
    pub commune: String,
    pub client_number: String,
    /// Internal claim number (GR)
    pub claim_number: String,
    pub zone: Zone,
    pub channel: Channel,
    pub dgr_number: Option<String>,
    pub external_case: Option<ExternalCase>,
}

impl LetterForm {
    /// Check required fields, listing every empty one in form order.
    pub fn validate(&self) -> Result<()> {
        let required: [(&'static str, &str); 6] = [
            ("salutation", &self.salutation),
            ("client name", &self.client_name),
            ("claim number", &self.claim_number),
            ("address", &self.address),
            ("commune", &self.commune),
            ("client number", &self.client_number),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(LetterError::MissingFields(missing))
        }
    }

    /// True when the salutation addresses a woman ("Señora", "Sra.", "Srta.").
    pub fn is_feminine(&self) -> bool {
        let s = self.salutation.trim().to_lowercase();
        s.starts_with("señora") || s.starts_with("señorita") || s.starts_with("sra")
            || s.starts_with("srta")
    }

    /// First whitespace-delimited token of the client name.
    pub fn first_name(&self) -> &str {
        self.client_name.split_whitespace().next().unwrap_or("")
    }
}

/// Treat `Some("")` and whitespace-only values the same as `None`.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) fn sample_form() -> LetterForm {
    LetterForm {
        kind: LetterKind::ReadingError(ReadingErrorFields::default()),
        issue_city: "Valparaiso".to_string(),
        salutation: "Señor".to_string(),
        client_name: "Eduardo López".to_string(),
        address: "Prat 725".to_string(),
        commune: "Valparaíso".to_string(),
        client_number: "6255126".to_string(),
        claim_number: "15624563".to_string(),
        zone: Zone::Centro,
        channel: Channel::CallCenter,
        dgr_number: None,
        external_case: None,
    }
}
