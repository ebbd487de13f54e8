// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PII anonymization.
//!
//! Replaces personally identifiable information with placeholders before a
//! message is sent to the LLM provider or persisted in an emergency log.
//!
//! Patterns are applied in a fixed order, each fully replacing all its
//! matches before the next pattern runs. The transform is pure and never
//! fails: a pattern that matches nothing simply contributes no replacements.

use std::sync::LazyLock;

use regex::Regex;

/// Ordered pattern/placeholder pairs: phone, email, national ID, street
/// address, name-after-keyword, URL, card number.
static PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        // Argentine and generic phone numbers.
        (
            Regex::new(r"(\+?54\s?)?(\d{2,4}[\s-]?)?\d{4}[\s-]?\d{4}").unwrap(),
            "[TELÉFONO]",
        ),
        // Email addresses.
        (
            Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap(),
            "[EMAIL]",
        ),
        // National ID (DNI, 7-8 digits).
        (Regex::new(r"\b\d{7,8}\b").unwrap(), "[DOCUMENTO]"),
        // Street addresses (street keyword + name + number).
        (
            Regex::new(r"(?i)(?:calle|av\.?|avenida|pasaje|pje\.?)\s+[a-záéíóúñ\s]+\s+\d+")
                .unwrap(),
            "[DIRECCIÓN]",
        ),
        // Proper names after relational keywords. The keyword is captured and
        // preserved; only the name is replaced, so downstream context stays
        // legible ("mi hermano [NOMBRE]").
        (
            Regex::new(
                r"(?P<kw>(?i:me llamo|soy|mi nombre es|mi amigo|mi amiga|mi pareja|mi novio|mi novia|mi esposo|mi esposa|mi madre|mi padre|mi hermano|mi hermana|mi hijo|mi hija|doctor|dra?\.?))\s+(?P<name>[A-ZÁÉÍÓÚÑ][a-záéíóúñ]+(?:\s+[A-ZÁÉÍÓÚÑ][a-záéíóúñ]+)?)",
            )
            .unwrap(),
            "${kw} [NOMBRE]",
        ),
        // URLs.
        (Regex::new(r"https?://[^\s]+").unwrap(), "[URL]"),
        // Card numbers (16 digits in groups of 4).
        (
            Regex::new(r"\b\d{4}[\s-]?\d{4}[\s-]?\d{4}[\s-]?\d{4}\b").unwrap(),
            "[TARJETA]",
        ),
    ]
});

/// Anonymize text by replacing PII with placeholders.
///
/// Pure and deterministic. Content that matches no pattern passes through
/// unchanged, and the transform is idempotent: placeholders contain no
/// digits, `@`, or scheme prefixes, so a second pass finds nothing new.
pub fn anonymize(text: &str) -> String {
    let mut result = text.to_string();
    for (pattern, placeholder) in PATTERNS.iter() {
        result = pattern.replace_all(&result, *placeholder).into_owned();
    }
    result
}

/// Check whether text contains PII, without modifying it.
pub fn contains_pii(text: &str) -> bool {
    PATTERNS.iter().any(|(pattern, _)| pattern.is_match(text))
}
