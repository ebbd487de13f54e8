// SPDX-FileCopyrightText: 2026 Cauce Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Crisis-risk detection for lockdown activation.
//!
//! Scans a message for two disjoint phrase sets: high-risk (explicit
//! self-harm or suicide intent and method language) and moderate-risk
//! (hopelessness and isolation language). Matching is lower-cased substring
//! containment over exact phrases. This trades false negatives from lexical
//! variation for auditable, deterministic behavior.
//!
//! The detector performs no I/O. When `should_activate_lockdown` is true the
//! caller must persist an emergency log (with the anonymized trigger message)
//! and short-circuit the normal chat flow.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// High-risk phrases: direct suicidal intent, self-harm, method language.
const HIGH_RISK_KEYWORDS: &[&str] = &[
    // Direct suicidal intent.
    "quiero morir",
    "quiero matarme",
    "me quiero matar",
    "voy a matarme",
    "voy a suicidarme",
    "me voy a suicidar",
    "pienso en suicidarme",
    "pienso en matarme",
    "no quiero vivir",
    "no quiero seguir viviendo",
    "mejor si estuviera muerto",
    "mejor si estuviera muerta",
    "estaría mejor muerto",
    "estaría mejor muerta",
    "todos estarían mejor sin mí",
    "nadie me extrañaría",
    "no vale la pena vivir",
    "la vida no tiene sentido",
    "acabar con todo",
    "acabar con mi vida",
    "terminar con todo",
    "terminar con mi vida",
    "quitarme la vida",
    "me quiero quitar la vida",
    // Self-harm.
    "cortarme",
    "hacerme daño",
    "lastimarme",
    "autolesionarme",
    "me corto",
    "me hago daño",
    "me lastimo",
    // Methods.
    "pastillas para morir",
    "sobredosis",
    "tirarme",
    "saltar",
    "ahorcarme",
    "colgarme",
];

/// Moderate-risk phrases: hopelessness and isolation language.
const MODERATE_RISK_KEYWORDS: &[&str] = &[
    "no puedo más",
    "estoy desesperado",
    "estoy desesperada",
    "no veo salida",
    "todo es inútil",
    "soy una carga",
    "nadie me entiende",
    "estoy solo",
    "estoy sola",
    "me siento vacío",
    "me siento vacía",
    "no tengo motivos",
    "para qué seguir",
    "no tiene sentido",
    "ojalá no existiera",
    "desaparecer",
    "no despertar",
];

/// Risk severity, ordered.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    None,
    Moderate,
    High,
    Critical,
}

/// Classification of a single inbound message.
///
/// Invariants: `level == None` implies `detected_keywords` is empty and
/// lockdown is false; `level >= High` implies lockdown is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskClassification {
    /// Overall severity.
    pub level: RiskLevel,
    /// Matched phrases, in scan order.
    pub detected_keywords: Vec<String>,
    /// Whether the lockdown flow must replace the normal chat flow.
    pub should_activate_lockdown: bool,
}

/// Detect the risk level of a message.
///
/// Any high-risk phrase present: `critical` with two or more distinct
/// matches, `high` with one; lockdown always triggers. Otherwise two or more
/// moderate phrases trigger lockdown at `moderate`; exactly one yields
/// `moderate` without lockdown; none yields `none`.
pub fn detect_risk(text: &str) -> RiskClassification {
    let lower = text.to_lowercase();
    let mut detected: Vec<String> = Vec::new();

    for keyword in HIGH_RISK_KEYWORDS {
        if lower.contains(keyword) {
            detected.push((*keyword).to_string());
        }
    }

    if !detected.is_empty() {
        return RiskClassification {
            level: if detected.len() >= 2 {
                RiskLevel::Critical
            } else {
                RiskLevel::High
            },
            detected_keywords: detected,
            should_activate_lockdown: true,
        };
    }

    for keyword in MODERATE_RISK_KEYWORDS {
        if lower.contains(keyword) {
            detected.push((*keyword).to_string());
        }
    }

    match detected.len() {
        0 => RiskClassification {
            level: RiskLevel::None,
            detected_keywords: Vec::new(),
            should_activate_lockdown: false,
        },
        1 => RiskClassification {
            level: RiskLevel::Moderate,
            detected_keywords: detected,
            should_activate_lockdown: false,
        },
        _ => RiskClassification {
            level: RiskLevel::Moderate,
            detected_keywords: detected,
            should_activate_lockdown: true,
        },
    }
}

/// Fast check against the high-risk set only.
pub fn has_high_risk(text: &str) -> bool {
    let lower = text.to_lowercase();
    HIGH_RISK_KEYWORDS
        .iter()
        .any(|keyword| lower.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_message_is_none() {
        let result = detect_risk("hoy tuve un buen día en el trabajo");
        assert_eq!(result.level, RiskLevel::None);
        assert!(result.detected_keywords.is_empty());
        assert!(!result.should_activate_lockdown);
    }

    #[test]
    fn single_high_risk_is_high_with_lockdown() {
        let result = detect_risk("últimamente pienso en matarme");
        assert_eq!(result.level, RiskLevel::High);
        assert_eq!(result.detected_keywords, vec!["pienso en matarme"]);
        assert!(result.should_activate_lockdown);
    }

    #[test]
    fn two_high_risk_escalate_to_critical() {
        let result = detect_risk("quiero morir, estuve pensando en una sobredosis");
        assert_eq!(result.level, RiskLevel::Critical);
        assert!(result.detected_keywords.len() >= 2);
        assert!(result.should_activate_lockdown);
    }

    #[test]
    fn appending_second_high_risk_never_lowers_level() {
        let base = detect_risk("quiero morir");
        let extended = detect_risk("quiero morir y pienso en una sobredosis");
        assert!(extended.level >= base.level);
        assert_eq!(extended.level, RiskLevel::Critical);
    }

    #[test]
    fn single_moderate_does_not_lock_down() {
        let result = detect_risk("la verdad es que no veo salida a esto");
        assert_eq!(result.level, RiskLevel::Moderate);
        assert_eq!(result.detected_keywords.len(), 1);
        assert!(!result.should_activate_lockdown);
    }

    #[test]
    fn two_moderates_lock_down_at_moderate() {
        let result = detect_risk("no veo salida, me siento vacío todo el tiempo");
        assert_eq!(result.level, RiskLevel::Moderate);
        assert_eq!(result.detected_keywords.len(), 2);
        assert!(result.should_activate_lockdown);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let result = detect_risk("NO QUIERO VIVIR");
        assert_eq!(result.level, RiskLevel::High);
    }

    #[test]
    fn high_risk_takes_precedence_over_moderates() {
        // One high-risk phrase plus moderates stays on the high-risk path.
        let result = detect_risk("no puedo más, quiero matarme");
        assert_eq!(result.level, RiskLevel::High);
        assert!(result.should_activate_lockdown);
        assert_eq!(result.detected_keywords, vec!["quiero matarme"]);
    }

    #[test]
    fn has_high_risk_ignores_moderate_phrases() {
        assert!(!has_high_risk("estoy desesperado y no veo salida"));
        assert!(has_high_risk("a veces pienso en cortarme"));
    }

    #[test]
    fn risk_level_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::High).unwrap(), "\"high\"");
        assert_eq!(RiskLevel::Critical.to_string(), "critical");
    }

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(RiskLevel::None < RiskLevel::Moderate);
        assert!(RiskLevel::Moderate < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }
}
