//! Modelos de dominio: documentos de la base de conocimiento, análisis de
//! intención, resultados de búsqueda y registros de investigación.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Metadatos de un documento (clave → valor, orden estable).
pub type Metadata = BTreeMap<String, String>;

/// Documento almacenado en la colección `knowledge_base`.
/// Inmutable una vez guardado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
}

/// Resultado de una búsqueda vectorial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    /// Similitud coseno con la consulta (mayor = mejor).
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    #[default]
    Medium,
    Low,
}

impl Confidence {
    /// Interpretación permisiva: cualquier valor desconocido es `Medium`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "high" => Self::High,
            "low" => Self::Low,
            _ => Self::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Technical,
    #[default]
    Strategic,
    Comparative,
    Regulatory,
    Trends,
    Internal,
}

impl QuestionType {
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "technical" => Self::Technical,
            "comparative" => Self::Comparative,
            "regulatory" => Self::Regulatory,
            "trends" => Self::Trends,
            "internal" => Self::Internal,
            _ => Self::Strategic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Strategic => "strategic",
            Self::Comparative => "comparative",
            Self::Regulatory => "regulatory",
            Self::Trends => "trends",
            Self::Internal => "internal",
        }
    }
}

/// Decisión sobre qué fuentes necesita una pregunta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IntentAnalysis {
    pub needs_web: bool,
    pub needs_internal: bool,
    pub confidence: Confidence,
    pub reasoning: String,
    pub web_query: String,
    pub internal_query: String,
    pub question_type: QuestionType,
    pub expected_sections: Vec<String>,
}

/// Fuentes efectivamente consultadas para una respuesta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesUsed {
    pub web: bool,
    pub internal: bool,
}

impl From<&IntentAnalysis> for SourcesUsed {
    fn from(intent: &IntentAnalysis) -> Self {
        Self {
            web: intent.needs_web,
            internal: intent.needs_internal,
        }
    }
}

/// Contrato de salida del agente.
#[derive(Debug, Clone, Serialize)]
pub struct AgentResponse {
    pub answer: String,
    pub sources_used: SourcesUsed,
    pub intent_analysis: IntentAnalysis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResearchDepth {
    Quick,
    #[default]
    Standard,
    Comprehensive,
}

impl ResearchDepth {
    /// Número de documentos internos a recuperar.
    pub fn top_k(&self) -> usize {
        match self {
            Self::Quick => 3,
            Self::Standard => 5,
            Self::Comprehensive => 8,
        }
    }
}

/// Una investigación completada, tal como queda en el historial.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRecord {
    pub research_id: String,
    pub question: String,
    pub answer: String,
    pub sources: SourcesUsed,
    pub timestamp: DateTime<Utc>,
    pub depth: ResearchDepth,
}

/// Capacidades activas del agente (para la barra de estado).
#[derive(Debug, Clone, Serialize)]
pub struct AgentInfo {
    pub has_llm_api: bool,
    pub llm_provider: String,
    pub knowledge_base_docs: usize,
    pub search_capability: String,
    pub store_backend: String,
}
