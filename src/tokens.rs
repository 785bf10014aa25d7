//! Token table and the longest-first literal replacement engine.

use std::collections::HashMap;

/// Ordered placeholder -> replacement pairs for one generation run.
///
/// Inserting a pattern that is already present overwrites its replacement in
/// place, so a later, more specific rule wins over an earlier generic one.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. Empty patterns are ignored.
    pub fn insert(&mut self, pattern: impl Into<String>, replacement: impl Into<String>) {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return;
        }
        let replacement = replacement.into();
        match self.index.get(&pattern) {
            Some(&i) => self.entries[i].1 = replacement,
            None => {
                self.index.insert(pattern.clone(), self.entries.len());
                self.entries.push((pattern, replacement));
            }
        }
    }

    pub fn get(&self, pattern: &str) -> Option<&str> {
        self.index.get(pattern).map(|&i| self.entries[i].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, r)| (p.as_str(), r.as_str()))
    }

    /// Entries in matching order: longest pattern first, insertion order on ties.
    pub fn by_length(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self.iter().collect();
        // Stable sort keeps insertion order for equal lengths
        pairs.sort_by(|a, b| b.0.chars().count().cmp(&a.0.chars().count()));
        pairs
    }
}

/// Replace every pattern of `table` in `text`, longest pattern first.
///
/// Each pattern is a single global literal replacement over the accumulated
/// text. Replacement values are spliced in as opaque segments and are never
/// scanned by later (shorter) patterns.
pub fn substitute(text: &str, table: &TokenTable) -> String {
    // Segments: (text, is_replacement)
    let mut segments: Vec<(String, bool)> = vec![(text.to_string(), false)];

    for (pattern, replacement) in table.by_length() {
        if !segments.iter().any(|(s, done)| !done && s.contains(pattern)) {
            continue;
        }
        let mut next = Vec::with_capacity(segments.len() + 2);
        for (segment, done) in segments {
            if done || !segment.contains(pattern) {
                next.push((segment, done));
                continue;
            }
            let mut rest = segment.as_str();
            while let Some(pos) = rest.find(pattern) {
                if pos > 0 {
                    next.push((rest[..pos].to_string(), false));
                }
                next.push((replacement.to_string(), true));
                rest = &rest[pos + pattern.len()..];
            }
            if !rest.is_empty() {
                next.push((rest.to_string(), false));
            }
        }
        segments = next;
    }

    segments.into_iter().map(|(s, _)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> TokenTable {
        let mut t = TokenTable::new();
        for (p, r) in pairs {
            t.insert(*p, *r);
        }
        t
    }

    #[test]
    fn test_longest_match_precedence() {
        // Short pattern inserted first must not fragment the longer one
        let t = table(&[
            ("XXXXXXX", "DGR-99"),
            ("Ref.: Reclamo N° XXXXXXX", "Ref.: Reclamo N° 15624563"),
        ]);
        assert_eq!(
            substitute("Ref.: Reclamo N° XXXXXXX", &t),
            "Ref.: Reclamo N° 15624563"
        );
        assert_eq!(
            substitute("DGR N° XXXXXXX / Ref.: Reclamo N° XXXXXXX", &t),
            "DGR N° DGR-99 / Ref.: Reclamo N° 15624563"
        );
    }

    #[test]
    fn test_no_op_without_patterns() {
        let t = table(&[("[Dirección]", "Prat 725"), ("[mes]", "marzo")]);
        let text = "Sin marcadores en esta línea, ni [otro].";
        assert_eq!(substitute(text, &t), text);
        assert_eq!(substitute("", &t), "");
    }

    #[test]
    fn test_replacement_is_not_rescanned() {
        let t = table(&[("[Nombre]", "[mes] Pérez"), ("[mes]", "marzo")]);
        assert_eq!(substitute("[Nombre] / [mes]", &t), "[mes] Pérez / marzo");
    }

    #[test]
    fn test_self_referencing_replacement_terminates() {
        let t = table(&[("XX", "XXXX")]);
        assert_eq!(substitute("a XX b XX", &t), "a XXXX b XXXX");
    }

    #[test]
    fn test_last_write_wins_on_same_pattern() {
        let mut t = table(&[("[Ref]", "generic")]);
        t.insert("[Ref]", "specific");
        assert_eq!(t.len(), 1);
        assert_eq!(substitute("[Ref]", &t), "specific");
    }

    #[test]
    fn test_tie_keeps_insertion_order() {
        let t = table(&[("ab", "1"), ("bc", "2")]);
        // "ab" is scanned first, so "bc" no longer matches
        assert_eq!(substitute("abc", &t), "1c");
        let order: Vec<&str> = t.by_length().into_iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec!["ab", "bc"]);
    }

    #[test]
    fn test_length_counts_chars() {
        // "día" is 3 chars but 4 bytes; "[mes]" is 5 chars
        let t = table(&[("día", "x"), ("[mes]", "y")]);
        let order: Vec<&str> = t.by_length().into_iter().map(|(p, _)| p).collect();
        assert_eq!(order, vec!["[mes]", "día"]);
    }

    #[test]
    fn test_empty_pattern_ignored() {
        let t = table(&[("", "boom")]);
        assert!(t.is_empty());
        assert_eq!(substitute("abc", &t), "abc");
    }
}
