//! Agente contextual: orquesta intención → recuperación → síntesis.
//!
//! Flujo por consulta:
//!   1. El modelo (o la heurística) decide si hacen falta web y/o documentos internos.
//!   2. Se consultan las fuentes necesarias, en paralelo; el orden en el
//!      prompt es siempre web primero, interno después.
//!   3. El modelo (o la plantilla) redacta el informe.
//!   4. Se empaqueta la respuesta con las fuentes usadas.
//!
//! Los adaptadores absorben sus propios fallos; sólo un almacén caído hace
//! fracasar la consulta.

use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::{AppConfig, StoreBackend};
use crate::embeddings::{Embedder, HashEmbedder};
use crate::errors::{ResearchError, StoreError};
use crate::llm::LlmManager;
use crate::models::{AgentInfo, AgentResponse, ResearchDepth, SearchHit, SourcesUsed};
use crate::vector_store::{InMemoryKnowledgeStore, KnowledgeStore, SqliteKnowledgeStore};
use crate::web_search::{self, SearchProvider};

pub const NO_INTERNAL_DOCUMENTS: &str = "No internal documents found.";

pub struct ContextualAgent {
    searcher: Arc<dyn SearchProvider>,
    store: Arc<dyn KnowledgeStore>,
    llm: LlmManager,
}

impl ContextualAgent {
    pub fn new(searcher: Arc<dyn SearchProvider>, store: Arc<dyn KnowledgeStore>, llm: LlmManager) -> Self {
        Self { searcher, store, llm }
    }

    /// Construye los tres adaptadores según la configuración.
    pub async fn from_config(cfg: &AppConfig) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(HashEmbedder::default());
        let store: Arc<dyn KnowledgeStore> = match cfg.store_backend {
            StoreBackend::Sqlite => {
                Arc::new(SqliteKnowledgeStore::open(&cfg.chroma_db_path, embedder).await?)
            }
            StoreBackend::Memory => Arc::new(InMemoryKnowledgeStore::new(embedder)),
        };
        let searcher = web_search::from_config(cfg)?;
        let llm = LlmManager::from_config(cfg);

        info!("✅ Agente contextual inicializado.");
        Ok(Self::new(searcher, store, llm))
    }

    pub fn store(&self) -> Arc<dyn KnowledgeStore> {
        self.store.clone()
    }

    /// Procesa una pregunta con la profundidad estándar.
    pub async fn process_query(&self, question: &str) -> Result<AgentResponse, ResearchError> {
        self.process_query_with_depth(question, ResearchDepth::default())
            .await
    }

    pub async fn process_query_with_depth(
        &self,
        question: &str,
        depth: ResearchDepth,
    ) -> Result<AgentResponse, ResearchError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ResearchError::EmptyQuestion);
        }
        info!("🔍 Procesando: {question}");

        // 1) Intención
        let intent = self.llm.classify_intent(question).await;

        // 2) Recuperación (independientes entre sí)
        let web_task = async {
            if intent.needs_web {
                Some(self.searcher.query(&intent.web_query).await)
            } else {
                None
            }
        };
        let internal_task = async {
            if intent.needs_internal {
                Some(self.gather_internal(&intent.internal_query, depth.top_k()).await)
            } else {
                None
            }
        };
        let (web_data, internal_data) = futures::join!(web_task, internal_task);
        let internal_data = internal_data.transpose()?;

        // 3) Síntesis
        let answer = self
            .llm
            .synthesize(
                question,
                web_data.as_deref().unwrap_or(""),
                internal_data.as_deref().unwrap_or(""),
            )
            .await;

        // 4) Resultado con trazabilidad de fuentes
        Ok(AgentResponse {
            answer,
            sources_used: SourcesUsed::from(&intent),
            intent_analysis: intent,
        })
    }

    async fn gather_internal(&self, query: &str, k: usize) -> Result<String, StoreError> {
        let hits = self.store.search(query, k).await?;
        Ok(format_internal_knowledge(&hits))
    }

    /// Capacidades activas, para el panel de estado.
    pub async fn agent_info(&self) -> Result<AgentInfo, StoreError> {
        Ok(AgentInfo {
            has_llm_api: self.llm.has_api(),
            llm_provider: self.llm.provider_label().to_string(),
            knowledge_base_docs: self.store.count().await?,
            search_capability: self.searcher.capability().to_string(),
            store_backend: self.store.backend_name().to_string(),
        })
    }
}

/// Bloque numerado con los documentos internos recuperados.
pub fn format_internal_knowledge(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return NO_INTERNAL_DOCUMENTS.to_string();
    }

    let mut text = String::from("Internal Knowledge:\n");
    for (i, hit) in hits.iter().enumerate() {
        text.push_str(&format!("{}. {}\n", i + 1, hit.content));
    }
    text
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::llm::tests::ScriptedGenerator;
    use crate::llm::TextGenerator;
    use crate::models::Metadata;
    use crate::sample_data::seed_sample_data;
    use crate::web_search::MockSearch;

    /// Almacén que siempre falla, como un disco inaccesible.
    pub(crate) struct UnavailableStore;

    #[async_trait]
    impl KnowledgeStore for UnavailableStore {
        async fn add_documents(
            &self,
            _texts: &[String],
            _metadatas: Option<&[Metadata]>,
            _ids: Option<&[String]>,
        ) -> Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<SearchHit>, StoreError> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        async fn count(&self) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("disk gone".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "unavailable"
        }
    }

    async fn seeded_store() -> Arc<dyn KnowledgeStore> {
        let store = InMemoryKnowledgeStore::new(Arc::new(HashEmbedder::default()));
        seed_sample_data(&store).await.unwrap();
        Arc::new(store)
    }

    async fn offline_agent() -> ContextualAgent {
        ContextualAgent::new(Arc::new(MockSearch), seeded_store().await, LlmManager::offline())
    }

    #[tokio::test]
    async fn regulations_and_compliance_uses_both_sources() {
        let agent = offline_agent().await;
        let response = agent
            .process_query("Latest AI regulations and our compliance")
            .await
            .unwrap();

        assert!(!response.answer.is_empty());
        assert!(response.answer.contains("# Comprehensive Research Report"));
        assert_eq!(response.sources_used, SourcesUsed { web: true, internal: true });
        assert_eq!(
            response.sources_used,
            SourcesUsed::from(&response.intent_analysis)
        );
    }

    #[tokio::test]
    async fn output_contract_has_exactly_web_and_internal_keys() {
        let agent = offline_agent().await;
        for question in ["How do heat pumps work?", "Status of our projects", "Compare vendors"] {
            let response = agent.process_query(question).await.unwrap();
            assert!(!response.answer.is_empty());

            let json = serde_json::to_value(&response).unwrap();
            let sources = json["sources_used"].as_object().unwrap();
            let mut keys: Vec<&String> = sources.keys().collect();
            keys.sort();
            assert_eq!(keys, vec!["internal", "web"]);
            assert!(json["intent_analysis"].is_object());
        }
    }

    #[tokio::test]
    async fn store_failure_is_a_research_error() {
        let agent = ContextualAgent::new(Arc::new(MockSearch), Arc::new(UnavailableStore), LlmManager::offline());
        let result = agent.process_query("Status of our internal projects").await;
        assert!(matches!(result, Err(ResearchError::Store(StoreError::Unavailable(_)))));
    }

    #[tokio::test]
    async fn web_only_question_never_touches_the_store() {
        let agent = ContextualAgent::new(Arc::new(MockSearch), Arc::new(UnavailableStore), LlmManager::offline());
        let response = agent.process_query("latest solid-state batteries").await.unwrap();
        assert_eq!(response.sources_used, SourcesUsed { web: true, internal: false });
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let agent = offline_agent().await;
        assert!(matches!(
            agent.process_query("   ").await,
            Err(ResearchError::EmptyQuestion)
        ));
    }

    #[tokio::test]
    async fn retrieved_blocks_reach_synthesis_web_first() {
        let generator = Arc::new(ScriptedGenerator::new(vec![
            Ok(r#"{"needs_web": true, "needs_internal": true,
                  "web_query": "solid-state batteries",
                  "internal_query": "Project Ares solid state battery"}"#
                .to_string()),
            Ok("# Final report".to_string()),
        ]));
        let llm = LlmManager::new(
            Some(generator.clone() as Arc<dyn TextGenerator>),
            "Scripted",
            Duration::from_secs(5),
        );
        let agent = ContextualAgent::new(Arc::new(MockSearch), seeded_store().await, llm);

        let response = agent
            .process_query_with_depth("How does Ares compare to the market?", ResearchDepth::Quick)
            .await
            .unwrap();
        assert_eq!(response.answer, "# Final report");

        let prompts = generator.prompts.lock().unwrap();
        let synthesis = &prompts[1];
        let web_at = synthesis.find("QuantumScape").unwrap();
        let internal_at = synthesis.find("Internal Knowledge:").unwrap();
        assert!(web_at < internal_at);
        assert!(synthesis.contains("\n1. Project Ares"));
        assert!(synthesis.contains("\n3. "));
        assert!(!synthesis.contains("\n4. "));
    }

    #[test]
    fn empty_hits_use_placeholder() {
        assert_eq!(format_internal_knowledge(&[]), NO_INTERNAL_DOCUMENTS);
    }

    #[tokio::test]
    async fn agent_info_reports_offline_capabilities() {
        let info = offline_agent().await.agent_info().await.unwrap();
        assert!(!info.has_llm_api);
        assert_eq!(info.knowledge_base_docs, 25);
        assert_eq!(info.search_capability, "Mock Data");
        assert_eq!(info.store_backend, "memory");
    }
}
