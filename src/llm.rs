//! Abstracción sobre Rig para el modelo de lenguaje alojado.
//!
//! `LlmManager` ofrece las dos tareas del asistente: clasificar la intención
//! de la pregunta y sintetizar el informe. Sin credencial, o si la llamada
//! falla, cada tarea cae en su camino heurístico/plantilla. No hay reintentos.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rig::client::CompletionClient as _;
use rig::completion::Prompt;
use tracing::{info, warn};

use crate::config::{AppConfig, LlmProvider};
use crate::errors::LlmError;
use crate::intent;
use crate::models::IntentAnalysis;
use crate::report;

/// Generador de texto: un prompt entra, texto sale.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Generador respaldado por un proveedor de Rig.
#[derive(Debug, Clone)]
pub struct RigGenerator {
    provider: LlmProvider,
    api_key: String,
    model: String,
}

impl RigGenerator {
    pub fn new(provider: LlmProvider, api_key: String, model: String) -> Self {
        Self {
            provider,
            api_key,
            model,
        }
    }

    async fn prompt_gemini(&self, prompt: &str) -> anyhow::Result<String> {
        use rig::providers::gemini;

        let client = gemini::Client::new(&self.api_key);
        let agent = client
            .agent(&self.model)
            .preamble(report::ANALYST_PREAMBLE)
            .build();
        Ok(agent.prompt(prompt).await?)
    }

    async fn prompt_openai(&self, prompt: &str) -> anyhow::Result<String> {
        use rig::providers::openai;

        let client = openai::Client::new(&self.api_key);
        let agent = client
            .agent(&self.model)
            .preamble(report::ANALYST_PREAMBLE)
            .build();
        Ok(agent.prompt(prompt).await?)
    }
}

#[async_trait]
impl TextGenerator for RigGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let result = match self.provider {
            LlmProvider::Gemini => self.prompt_gemini(prompt).await,
            LlmProvider::OpenAI => self.prompt_openai(prompt).await,
        };

        let text = result.map_err(|e| LlmError::Provider(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Adaptador del modelo de lenguaje.
#[derive(Clone)]
pub struct LlmManager {
    generator: Option<Arc<dyn TextGenerator>>,
    provider_label: String,
    timeout: Duration,
}

impl LlmManager {
    /// Construye el manager a partir de la configuración.
    pub fn from_config(cfg: &AppConfig) -> Self {
        match &cfg.llm_api_key {
            Some(key) => {
                info!(
                    "✅ Modelo alojado activo: {:?} ({})",
                    cfg.llm_provider, cfg.llm_chat_model
                );
                let generator = RigGenerator::new(
                    cfg.llm_provider.clone(),
                    key.clone(),
                    cfg.llm_chat_model.clone(),
                );
                Self::new(
                    Some(Arc::new(generator)),
                    format!("{:?}", cfg.llm_provider),
                    cfg.llm_timeout,
                )
            }
            None => {
                info!("🔄 Sin credencial de LLM: heurística e informe de plantilla.");
                Self::offline()
            }
        }
    }

    pub fn new(
        generator: Option<Arc<dyn TextGenerator>>,
        provider_label: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            provider_label: provider_label.into(),
            timeout,
        }
    }

    /// Sin modelo alojado.
    pub fn offline() -> Self {
        Self::new(None, "Heuristic", Duration::from_secs(60))
    }

    pub fn has_api(&self) -> bool {
        self.generator.is_some()
    }

    pub fn provider_label(&self) -> &str {
        &self.provider_label
    }

    async fn generate(&self, prompt: &str) -> Option<Result<String, LlmError>> {
        let generator = self.generator.as_ref()?;
        let result = match tokio::time::timeout(self.timeout, generator.generate(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.timeout)),
        };
        Some(result)
    }

    // ---------------------------------------------------------------------
    // INTENCIÓN
    // ---------------------------------------------------------------------

    /// Decide qué fuentes necesita la pregunta.
    pub async fn classify_intent(&self, question: &str) -> IntentAnalysis {
        match self.generate(&report::intent_prompt(question)).await {
            Some(Ok(text)) => match intent::from_model_output(&text, question) {
                Some(analysis) => return analysis,
                None => warn!("Respuesta de intención sin objeto JSON; usando heurística. Respuesta LLM: '{text}'"),
            },
            Some(Err(e)) => warn!("Error clasificando la intención: {e}; usando heurística."),
            None => {}
        }
        intent::heuristic_intent(question)
    }

    // ---------------------------------------------------------------------
    // SÍNTESIS
    // ---------------------------------------------------------------------

    /// Genera el informe final a partir de la pregunta y los datos recogidos
    /// (cadenas vacías para las fuentes no consultadas).
    pub async fn synthesize(&self, question: &str, web_data: &str, internal_data: &str) -> String {
        let date = report::today();
        let prompt = report::synthesis_prompt(question, web_data, internal_data, date);

        match self.generate(&prompt).await {
            Some(Ok(text)) => return text,
            Some(Err(e)) => warn!("Error en la síntesis: {e}; usando informe de plantilla."),
            None => {}
        }
        report::fallback_report(question, date)
    }
}
