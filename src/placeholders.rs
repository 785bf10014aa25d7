//! Placeholder catalog.
//!
//! Each semantic slot of a template has one canonical name and the exhaustive
//! list of literal spellings found across the templates. Every spelling of a
//! slot receives the same replacement.

use crate::letter::LetterKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub name: &'static str,
    pub spellings: &'static [&'static str],
}

pub const ISSUE_CITY: Slot = Slot {
    name: "issue_city",
    spellings: &["[Comuna]"],
};
pub const DAY: Slot = Slot {
    name: "day",
    spellings: &["[día]"],
};
pub const MONTH: Slot = Slot {
    name: "month",
    spellings: &["[mes]"],
};
pub const YEAR: Slot = Slot {
    name: "year",
    spellings: &["[202X]"],
};
pub const FULL_DATE: Slot = Slot {
    name: "full_date",
    spellings: &["[día] de [mes] de [202X]"],
};
pub const DGR_NUMBER: Slot = Slot {
    name: "dgr_number",
    spellings: &["XXXXXXX"],
};
pub const SALUTATION: Slot = Slot {
    name: "salutation",
    spellings: &["[Señor(a)]"],
};
pub const CLIENT_NAME: Slot = Slot {
    name: "client_name",
    spellings: &["[Nombre y apellido reclamante]"],
};
pub const ADDRESS: Slot = Slot {
    name: "address",
    spellings: &["[Dirección]"],
};
pub const COMMUNE: Slot = Slot {
    name: "commune",
    spellings: &["[Comuna reclamante]"],
};
pub const CLIENT_NUMBER: Slot = Slot {
    name: "client_number",
    spellings: &["Número de cliente: 15965848", "Número de cliente:15965848"],
};
pub const CLAIM_REFERENCE: Slot = Slot {
    name: "claim_reference",
    spellings: &[
        "Ref.: Reclamo N° 15965848",
        "Ref.: Reclamo N°15965848",
        "Ref.: Reclamo Nº 15965848",
        "Ref.: Reclamo N° XXXXXXX",
    ],
};
pub const GREETING: Slot = Slot {
    name: "greeting",
    spellings: &["[Estimado(a) Nombre,]"],
};
pub const CHANNEL: Slot = Slot {
    name: "channel",
    spellings: &["[(Ej: nuestra Oficina Comercial / WhatsApp / App CGE 1Click / Call Center / Correo Electrónico / Página Web).]"],
};
pub const MANAGER: Slot = Slot {
    name: "manager",
    spellings: &["[Nombre y apellido Gerente Comercial]"],
};
pub const DOCUMENT_KIND: Slot = Slot {
    name: "document_kind",
    spellings: &["[boleta/factura]"],
};
pub const BILL_DATE: Slot = Slot {
    name: "bill_date",
    spellings: &["[día/mes/año]"],
};
pub const CORRECTED_CONSUMPTION: Slot = Slot {
    name: "corrected_consumption",
    spellings: &["XXX kWh"],
};
pub const AMOUNT: Slot = Slot {
    name: "amount",
    spellings: &["[$ XX.XXX]"],
};
pub const READING_RANGE: Slot = Slot {
    name: "reading_range",
    spellings: &["[XXXXXX y XXXXXX]"],
};
pub const RESPONSE_BODY: Slot = Slot {
    name: "response_body",
    spellings: &["[Detalle respuesta]"],
};

/// Slots every letter kind carries.
pub const COMMON: &[Slot] = &[
    ISSUE_CITY,
    FULL_DATE,
    DAY,
    MONTH,
    YEAR,
    DGR_NUMBER,
    SALUTATION,
    CLIENT_NAME,
    ADDRESS,
    COMMUNE,
    CLIENT_NUMBER,
    CLAIM_REFERENCE,
    GREETING,
    CHANNEL,
    MANAGER,
];

const READING_ERROR: &[Slot] = &[
    DOCUMENT_KIND,
    BILL_DATE,
    CORRECTED_CONSUMPTION,
    AMOUNT,
    READING_RANGE,
];

const GENERAL: &[Slot] = &[RESPONSE_BODY];

/// Slots that apply to a letter kind, common ones first.
pub fn slots_for(kind: &LetterKind) -> Vec<Slot> {
    let specific = match kind {
        LetterKind::ReadingError(_) => READING_ERROR,
        LetterKind::General(_) => GENERAL,
    };
    COMMON.iter().chain(specific).copied().collect()
}

/// Slots for which none of the spellings occurs in `text`.
///
/// A slot whose spelling is only present as part of a longer slot spelling
/// (the date pieces inside the full date) still counts as present.
pub fn missing_slots(kind: &LetterKind, text: &str) -> Vec<&'static str> {
    slots_for(kind)
        .into_iter()
        .filter(|slot| !slot.spellings.iter().any(|s| text.contains(s)))
        .map(|slot| slot.name)
        .collect()
}

/// Every catalog spelling still present in `text`, without duplicates.
pub fn leftover_spellings(kind: &LetterKind, text: &str) -> Vec<&'static str> {
    let mut found: Vec<&'static str> = Vec::new();
    for slot in slots_for(kind) {
        for spelling in slot.spellings {
            if text.contains(spelling) && !found.contains(spelling) {
                found.push(*spelling);
            }
        }
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::letter::{GeneralFields, ReadingErrorFields};

    #[test]
    fn test_spellings_are_unique() {
        let all: Vec<&str> = COMMON
            .iter()
            .chain(READING_ERROR)
            .chain(GENERAL)
            .flat_map(|s| s.spellings.iter().copied())
            .collect();
        for (i, s) in all.iter().enumerate() {
            assert!(!all[i + 1..].contains(s), "duplicate spelling {}", s);
        }
    }

    #[test]
    fn test_slots_for_kind() {
        let reading = slots_for(&LetterKind::ReadingError(ReadingErrorFields::default()));
        assert!(reading.contains(&AMOUNT));
        assert!(!reading.contains(&RESPONSE_BODY));
        let general = slots_for(&LetterKind::General(GeneralFields::default()));
        assert!(general.contains(&RESPONSE_BODY));
        assert!(general.contains(&CLAIM_REFERENCE));
    }

    #[test]
    fn test_missing_slots() {
        let kind = LetterKind::General(GeneralFields::default());
        let text = "[Comuna], [día] de [mes] de [202X]\nRef.: Reclamo Nº 15965848\n[Detalle respuesta]";
        let missing = missing_slots(&kind, text);
        assert!(missing.contains(&"client_name"));
        assert!(!missing.contains(&"claim_reference"));
        assert!(!missing.contains(&"day"));
        assert!(!missing.contains(&"response_body"));
    }

    #[test]
    fn test_leftover_spellings() {
        let kind = LetterKind::ReadingError(ReadingErrorFields::default());
        let left = leftover_spellings(&kind, "Monto [$ XX.XXX] y [$ XX.XXX], Prat 725");
        assert_eq!(left, vec!["[$ XX.XXX]"]);
    }
}
