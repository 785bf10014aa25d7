//! Token table builder: turns a letter form into placeholder replacements.

use crate::letter::{present, LetterForm, LetterKind};
use crate::placeholders::{self, Slot};
use crate::tokens::TokenTable;
use chrono::{DateTime, Datelike, FixedOffset, Utc};

/// Month names indexed by month number; index 0 is unused.
pub const MONTHS: [&str; 13] = [
    "",
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Letters are dated in UTC-3.
pub fn letter_offset() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).expect("UTC-3 is a valid offset")
}

/// Current time in the letter timezone.
pub fn letter_now() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&letter_offset())
}

/// Calendar date printed on a letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LetterDate {
    pub day: u32,
    pub month: u32,
    pub year: i32,
}

impl LetterDate {
    pub fn from_datetime(dt: &DateTime<FixedOffset>) -> Self {
        Self {
            day: dt.day(),
            month: dt.month(),
            year: dt.year(),
        }
    }

    pub fn month_name(&self) -> &'static str {
        MONTHS.get(self.month as usize).copied().unwrap_or("")
    }

    /// "5 de marzo de 2025"
    pub fn long_form(&self) -> String {
        format!("{} de {} de {}", self.day, self.month_name(), self.year)
    }
}

// ─── Channel phrasing ───────────────────────────────────────────────────────

/// Channels taking the masculine article ("nuestro").
const MASCULINE_CHANNELS: &[&str] = &["Call Center", "Correo Electrónico"];
/// Channels taking the feminine article ("nuestra").
const FEMININE_CHANNELS: &[&str] = &["Oficina Comercial", "App CGE 1Click", "Página Web"];
/// Third-party channels, named without an article.
const EXTERNAL_CHANNELS: &[&str] = &["Portal SEC"];

/// Channel sentence ending, e.g. "nuestro Call Center." or "Portal SEC.".
pub fn channel_phrase(channel: &str) -> String {
    if channel == "WhatsApp" || EXTERNAL_CHANNELS.contains(&channel) {
        format!("{}.", channel)
    } else if FEMININE_CHANNELS.contains(&channel) {
        format!("nuestra {}.", channel)
    } else {
        if !MASCULINE_CHANNELS.contains(&channel) {
            log::debug!("Channel '{}' is not classified, using 'nuestro'", channel);
        }
        format!("nuestro {}.", channel)
    }
}

// ─── Table assembly ─────────────────────────────────────────────────────────

fn put(table: &mut TokenTable, slot: Slot, value: &str) {
    for spelling in slot.spellings {
        table.insert(*spelling, value);
    }
}

fn put_optional(table: &mut TokenTable, slot: Slot, value: &Option<String>) {
    if let Some(v) = present(value) {
        put(table, slot, v);
    }
}

/// Build the token table for one letter.
///
/// Optional fields that are empty add no entry, so their placeholders stay
/// visible in the output.
pub fn build_token_table(form: &LetterForm, date: &LetterDate) -> TokenTable {
    let mut table = TokenTable::new();

    put(&mut table, placeholders::ISSUE_CITY, form.issue_city.trim());
    put(&mut table, placeholders::FULL_DATE, &date.long_form());
    put(&mut table, placeholders::DAY, &date.day.to_string());
    put(&mut table, placeholders::MONTH, date.month_name());
    put(&mut table, placeholders::YEAR, &date.year.to_string());
    put_optional(&mut table, placeholders::DGR_NUMBER, &form.dgr_number);

    put(&mut table, placeholders::SALUTATION, form.salutation.trim());
    put(&mut table, placeholders::CLIENT_NAME, form.client_name.trim());
    put(&mut table, placeholders::ADDRESS, form.address.trim());
    put(&mut table, placeholders::COMMUNE, form.commune.trim());
    put(
        &mut table,
        placeholders::CLIENT_NUMBER,
        &format!("Número de cliente: {}", form.client_number.trim()),
    );

    let claim = form.claim_number.trim();
    put(
        &mut table,
        placeholders::CLAIM_REFERENCE,
        &format!("Ref.: Reclamo N° {}", claim),
    );
    if let Some(case) = &form.external_case {
        let kind = case.kind.trim();
        let number = case.number.trim();
        if !number.is_empty() {
            // Overrides the claim-only reference inserted above
            let composed = if kind.is_empty() {
                format!("Ref.: Reclamo N° {} (N° {})", claim, number)
            } else {
                format!("Ref.: Reclamo N° {} (Reclamo {} N° {})", claim, kind, number)
            };
            put(&mut table, placeholders::CLAIM_REFERENCE, &composed);
        }
    }

    let greeting = if form.is_feminine() { "Estimada" } else { "Estimado" };
    put(
        &mut table,
        placeholders::GREETING,
        &format!("{} {},", greeting, form.first_name()),
    );
    put(
        &mut table,
        placeholders::CHANNEL,
        &channel_phrase(form.channel.as_str()),
    );
    put(&mut table, placeholders::MANAGER, form.zone.manager());

    match &form.kind {
        LetterKind::ReadingError(fields) => {
            put_optional(&mut table, placeholders::DOCUMENT_KIND, &fields.document_kind);
            put_optional(&mut table, placeholders::BILL_DATE, &fields.bill_date);
            if let Some(kwh) = present(&fields.corrected_kwh) {
                put(
                    &mut table,
                    placeholders::CORRECTED_CONSUMPTION,
                    &format!("{} kWh", kwh),
                );
            }
            put_optional(&mut table, placeholders::AMOUNT, &fields.amount);
            put_optional(&mut table, placeholders::READING_RANGE, &fields.reading_range);
        }
        LetterKind::General(fields) => {
            put_optional(&mut table, placeholders::RESPONSE_BODY, &fields.response_body);
        }
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::letter::{sample_form, ExternalCase, ReadingErrorFields};
    use crate::tokens::substitute;
    use chrono::TimeZone;

    fn march_5() -> LetterDate {
        LetterDate {
            day: 5,
            month: 3,
            year: 2025,
        }
    }

    #[test]
    fn test_long_form_date() {
        assert_eq!(march_5().long_form(), "5 de marzo de 2025");
        assert_eq!(MONTHS[12], "diciembre");
    }

    #[test]
    fn test_date_uses_utc_minus_three() {
        // 02:00 UTC on April 1st is still March 31st in UTC-3
        let utc = Utc.with_ymd_and_hms(2025, 4, 1, 2, 0, 0).unwrap();
        let local = utc.with_timezone(&letter_offset());
        let date = LetterDate::from_datetime(&local);
        assert_eq!((date.day, date.month, date.year), (31, 3, 2025));
    }

    #[test]
    fn test_channel_phrasing() {
        assert_eq!(channel_phrase("Call Center"), "nuestro Call Center.");
        assert_eq!(channel_phrase("Correo Electrónico"), "nuestro Correo Electrónico.");
        assert_eq!(channel_phrase("Oficina Comercial"), "nuestra Oficina Comercial.");
        assert_eq!(channel_phrase("Página Web"), "nuestra Página Web.");
        assert_eq!(channel_phrase("Portal SEC"), "Portal SEC.");
        assert_eq!(channel_phrase("WhatsApp"), "WhatsApp.");
    }

    #[test]
    fn test_greeting_agrees_with_salutation() {
        let mut form = sample_form();
        let table = build_token_table(&form, &march_5());
        assert_eq!(table.get("[Estimado(a) Nombre,]"), Some("Estimado Eduardo,"));

        form.salutation = "Señora".to_string();
        form.client_name = "María José Soto".to_string();
        let table = build_token_table(&form, &march_5());
        assert_eq!(table.get("[Estimado(a) Nombre,]"), Some("Estimada María,"));
    }

    #[test]
    fn test_claim_reference_without_external_case() {
        let table = build_token_table(&sample_form(), &march_5());
        for spelling in placeholders::CLAIM_REFERENCE.spellings {
            assert_eq!(table.get(spelling), Some("Ref.: Reclamo N° 15624563"));
        }
    }

    #[test]
    fn test_claim_reference_with_external_case() {
        let mut form = sample_form();
        form.external_case = Some(ExternalCase {
            kind: "SEC".to_string(),
            number: "998877".to_string(),
        });
        let table = build_token_table(&form, &march_5());
        assert_eq!(
            table.get("Ref.: Reclamo N° 15965848"),
            Some("Ref.: Reclamo N° 15624563 (Reclamo SEC N° 998877)")
        );
    }

    #[test]
    fn test_optional_fields_leave_placeholders() {
        let table = build_token_table(&sample_form(), &march_5());
        assert_eq!(table.get("XXXXXXX"), None);
        assert_eq!(table.get("[$ XX.XXX]"), None);
        assert_eq!(substitute("Monto: [$ XX.XXX]", &table), "Monto: [$ XX.XXX]");
    }

    #[test]
    fn test_reading_error_fields() {
        let mut form = sample_form();
        form.dgr_number = Some("4411".to_string());
        form.kind = LetterKind::ReadingError(ReadingErrorFields {
            document_kind: Some("boleta".to_string()),
            bill_date: Some("10/03/2025".to_string()),
            corrected_kwh: Some("1.250".to_string()),
            amount: Some("$ 45.990".to_string()),
            reading_range: Some(String::new()),
        });
        let table = build_token_table(&form, &march_5());
        assert_eq!(table.get("XXX kWh"), Some("1.250 kWh"));
        assert_eq!(table.get("[$ XX.XXX]"), Some("$ 45.990"));
        assert_eq!(table.get("[XXXXXX y XXXXXX]"), None);
        assert_eq!(
            substitute("Ref.: Reclamo N° XXXXXXX, DGR N° XXXXXXX", &table),
            "Ref.: Reclamo N° 15624563, DGR N° 4411"
        );
    }

    #[test]
    fn test_date_line_substitution() {
        let table = build_token_table(&sample_form(), &march_5());
        assert_eq!(
            substitute("[Comuna], [día] de [mes] de [202X]", &table),
            "Valparaiso, 5 de marzo de 2025"
        );
        assert_eq!(
            table.get("[Nombre y apellido Gerente Comercial]"),
            Some("Alex Andrés González Villablanca")
        );
    }

    #[test]
    fn test_local_date_from_fixed_offset() {
        let dt = letter_offset().with_ymd_and_hms(2025, 3, 5, 9, 30, 0).unwrap();
        assert_eq!(LetterDate::from_datetime(&dt), march_5());
    }
}
