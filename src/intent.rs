//! Clasificación de intención: heurística por palabras clave y lectura
//! permisiva del JSON que devuelve el modelo.
//!
//! Que el modelo devuelva texto mal formado es una situación esperada, no
//! excepcional: `from_model_output` devuelve `None` y el llamador recurre a
//! `heuristic_intent`.

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::embeddings::tokenize;
use crate::models::{Confidence, IntentAnalysis, QuestionType};

const WEB_KEYWORDS: &[&str] = &[
    "latest", "recent", "news", "current", "update", "2024", "2025", "new", "breaking", "today",
    "trend", "market",
];
const INTERNAL_KEYWORDS: &[&str] = &[
    "our", "internal", "company", "project", "team", "we", "document", "file", "research",
    "compliance",
];
const TECHNICAL_KEYWORDS: &[&str] = &[
    "technical",
    "specifications",
    "architecture",
    "framework",
    "methodology",
];
const COMPARATIVE_KEYWORDS: &[&str] = &[
    "compare",
    "versus",
    "vs",
    "difference",
    "similar",
    "contrast",
    "better than",
];

/// Una palabra clave coincide con cualquier palabra que empiece por ella
/// ("trend" → "trending", "update" → "updated"); las de dos letras ("we",
/// "vs") sólo como palabra completa. Las frases de varias palabras se
/// buscan como subcadena.
fn matches_any(tokens: &[String], lowered: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|kw| {
        if kw.contains(' ') {
            lowered.contains(kw)
        } else if kw.len() <= 2 {
            tokens.iter().any(|t| t == kw)
        } else {
            tokens.iter().any(|t| t.starts_with(kw))
        }
    })
}

/// Clasificador sin red.
pub fn heuristic_intent(question: &str) -> IntentAnalysis {
    let lowered = question.to_lowercase();
    let tokens = tokenize(question);

    let mut needs_web = matches_any(&tokens, &lowered, WEB_KEYWORDS);
    let mut needs_internal = matches_any(&tokens, &lowered, INTERNAL_KEYWORDS);
    let is_technical = matches_any(&tokens, &lowered, TECHNICAL_KEYWORDS);
    let is_comparative = matches_any(&tokens, &lowered, COMPARATIVE_KEYWORDS);

    if is_comparative {
        needs_web = true;
        needs_internal = true;
    } else if !needs_web && !needs_internal {
        if is_technical {
            needs_internal = true;
        } else {
            needs_web = true;
        }
    }

    let (question_type, sections): (QuestionType, &[&str]) = if is_comparative {
        (
            QuestionType::Comparative,
            &["Comparison Matrix", "Strengths/Weaknesses", "Recommendations"],
        )
    } else if is_technical {
        (
            QuestionType::Technical,
            &["Technical Specifications", "Implementation Details", "Technical Challenges"],
        )
    } else if needs_internal && !needs_web {
        (
            QuestionType::Internal,
            &["Internal Status", "Current Projects", "Resource Allocation"],
        )
    } else {
        (
            QuestionType::Strategic,
            &["Market Analysis", "Trends", "Strategic Recommendations"],
        )
    };

    IntentAnalysis {
        needs_web,
        needs_internal,
        confidence: Confidence::High,
        reasoning: format!(
            "Web: {needs_web} (current info), Internal: {needs_internal} (org context), Type: {}",
            question_type.as_str()
        ),
        web_query: question.to_string(),
        internal_query: question.to_string(),
        question_type,
        expected_sections: sections.iter().map(|s| s.to_string()).collect(),
    }
}

/// Forma laxa del JSON del modelo: todos los campos opcionales y se aceptan
/// nombres en snake_case o camelCase.
#[derive(Debug, Default, Deserialize)]
struct RawIntent {
    #[serde(default, alias = "needsWeb")]
    needs_web: Option<bool>,
    #[serde(default, alias = "needsInternal")]
    needs_internal: Option<bool>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default, alias = "webQuery")]
    web_query: Option<String>,
    #[serde(default, alias = "internalQuery")]
    internal_query: Option<String>,
    #[serde(default, alias = "questionType")]
    question_type: Option<String>,
    #[serde(default, alias = "expectedSections")]
    expected_sections: Option<Vec<String>>,
}

/// Extrae el primer objeto `{...}` del texto (de la primera `{` a la última `}`).
pub fn extract_json_object(text: &str) -> Option<&str> {
    let re = Regex::new(r"(?s)\{.*\}").ok()?;
    re.find(text).map(|m| m.as_str())
}

/// Interpreta la respuesta del modelo. Sin ningún objeto `{...}` devuelve
/// `None` (el llamador usa la heurística). Un objeto que no se puede leer
/// equivale a uno vacío: ambas fuentes y la pregunta como consulta. Los
/// flags ausentes valen `true` y las consultas ausentes o vacías son la
/// propia pregunta.
pub fn from_model_output(text: &str, question: &str) -> Option<IntentAnalysis> {
    let object = extract_json_object(text)?;
    let raw: RawIntent = serde_json::from_str(object).unwrap_or_else(|e| {
        warn!("JSON de intención ilegible ({e}); se consultan ambas fuentes.");
        RawIntent::default()
    });

    let non_empty = |s: Option<String>| s.filter(|q| !q.trim().is_empty());

    Some(IntentAnalysis {
        needs_web: raw.needs_web.unwrap_or(true),
        needs_internal: raw.needs_internal.unwrap_or(true),
        confidence: raw
            .confidence
            .as_deref()
            .map(Confidence::parse_lenient)
            .unwrap_or_default(),
        reasoning: raw.reasoning.unwrap_or_else(|| "Default analysis".to_string()),
        web_query: non_empty(raw.web_query).unwrap_or_else(|| question.to_string()),
        internal_query: non_empty(raw.internal_query).unwrap_or_else(|| question.to_string()),
        question_type: raw
            .question_type
            .as_deref()
            .map(QuestionType::parse_lenient)
            .unwrap_or_default(),
        expected_sections: raw.expected_sections.unwrap_or_default(),
    })
}
