//! Historial de conversación de la sesión: registros de investigación,
//! estadísticas y exportación.

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::models::{AgentInfo, AgentResponse, ResearchDepth, ResearchRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryStats {
    pub total: usize,
    pub web: usize,
    pub internal: usize,
}

#[derive(Debug, Default)]
pub struct ConversationHistory {
    records: Vec<ResearchRecord>,
    // No se reinicia al limpiar: los ids siguen siendo únicos en la sesión.
    research_count: u64,
}

impl ConversationHistory {
    /// Registra una investigación completada y devuelve el registro creado.
    pub fn record(
        &mut self,
        question: &str,
        response: &AgentResponse,
        depth: ResearchDepth,
    ) -> ResearchRecord {
        self.research_count += 1;
        let record = ResearchRecord {
            research_id: format!("res_{:04}", self.research_count),
            question: question.to_string(),
            answer: response.answer.clone(),
            sources: response.sources_used,
            timestamp: Utc::now(),
            depth,
        };
        self.records.push(record.clone());
        record
    }

    pub fn records(&self) -> &[ResearchRecord] {
        &self.records
    }

    pub fn research_count(&self) -> u64 {
        self.research_count
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats {
            total: self.records.len(),
            web: self.records.iter().filter(|r| r.sources.web).count(),
            internal: self.records.iter().filter(|r| r.sources.internal).count(),
        }
    }

    /// Documento de exportación con el estado del sistema.
    pub fn export(&self, system_status: &AgentInfo) -> Value {
        json!({
            "export_date": Utc::now().to_rfc3339(),
            "conversations": self.records,
            "system_status": system_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::heuristic_intent;
    use crate::models::SourcesUsed;

    fn response(question: &str) -> AgentResponse {
        let intent = heuristic_intent(question);
        AgentResponse {
            answer: format!("# Report: {question}"),
            sources_used: SourcesUsed::from(&intent),
            intent_analysis: intent,
        }
    }

    #[test]
    fn records_get_sequential_ids_and_matching_sources() {
        let mut history = ConversationHistory::default();
        let q1 = "Latest AI regulations and our compliance";
        let r1 = history.record(q1, &response(q1), ResearchDepth::Standard);
        let q2 = "How do heat pumps work?";
        let r2 = history.record(q2, &response(q2), ResearchDepth::Quick);

        assert_eq!(r1.research_id, "res_0001");
        assert_eq!(r2.research_id, "res_0002");
        assert_eq!(r1.sources, SourcesUsed { web: true, internal: true });
        assert_eq!(r2.sources, SourcesUsed { web: true, internal: false });
        assert_eq!(
            history.stats(),
            HistoryStats {
                total: 2,
                web: 2,
                internal: 1
            }
        );
    }

    #[test]
    fn clear_keeps_the_counter() {
        let mut history = ConversationHistory::default();
        history.record("a", &response("a"), ResearchDepth::Standard);
        history.clear();
        assert!(history.records().is_empty());

        let next = history.record("b", &response("b"), ResearchDepth::Standard);
        assert_eq!(next.research_id, "res_0002");
        assert_eq!(history.research_count(), 2);
    }

    #[test]
    fn export_contains_conversations_and_status() {
        let mut history = ConversationHistory::default();
        history.record("a", &response("a"), ResearchDepth::Comprehensive);
        let info = AgentInfo {
            has_llm_api: false,
            llm_provider: "Heuristic".to_string(),
            knowledge_base_docs: 25,
            search_capability: "Mock Data".to_string(),
            store_backend: "memory".to_string(),
        };

        let export = history.export(&info);
        assert_eq!(export["conversations"].as_array().unwrap().len(), 1);
        assert_eq!(export["conversations"][0]["depth"], "Comprehensive");
        assert_eq!(export["system_status"]["knowledge_base_docs"], 25);
        assert!(export["export_date"].is_string());
    }
}
