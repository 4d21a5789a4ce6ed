//! Carga y gestión de configuración de la aplicación (almacén, búsqueda web y LLM).
//!
//! Todas las variables tienen valor por defecto: la ausencia de una credencial
//! no es un error, sólo activa el camino de respaldo del adaptador afectado.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use url::Url;

/// Valores de ejemplo que vienen en los `.env` de plantilla y que
/// tratamos como "sin credencial".
const PLACEHOLDER_KEYS: &[&str] = &[
    "your_free_serper_key_here",
    "your_free_gemini_key_here",
    "your_openai_key_here",
];

pub const DEFAULT_SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    OpenAI,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            other => Err(anyhow!("Proveedor LLM no soportado: {other}")),
        }
    }

    pub fn default_chat_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::OpenAI => "gpt-4o-mini",
        }
    }

    fn key_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenAI => "OPENAI_API_KEY",
        }
    }
}

/// Backend de la base de conocimiento interna.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Sqlite,
    Memory,
}

impl StoreBackend {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow!("Backend de almacén no soportado: {other}")),
        }
    }
}

/// Configuración completa de la aplicación.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_addr: String,
    pub open_browser: bool,

    pub store_backend: StoreBackend,
    pub chroma_db_path: PathBuf,

    pub serper_api_key: Option<String>,
    pub serper_endpoint: String,
    pub web_search_timeout: Duration,
    pub web_search_results: u32,

    pub llm_provider: LlmProvider,
    pub llm_api_key: Option<String>,
    pub llm_chat_model: String,
    pub llm_timeout: Duration,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno (usando .env si existe).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Igual que `from_env`, pero leyendo de una función arbitraria; así los
    /// tests no tocan el entorno del proceso.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

        let server_addr = var("SERVER_ADDR", "127.0.0.1:3322");
        let open_browser = parse_bool(&var("OPEN_BROWSER", "true"));

        let store_backend = StoreBackend::from_str(&var("KNOWLEDGE_STORE", "sqlite"))?;
        let chroma_db_path = PathBuf::from(var("CHROMA_DB_PATH", "./chroma_db"));

        let serper_api_key = credential(lookup("SERPER_API_KEY"));
        let serper_endpoint = var("SERPER_ENDPOINT", DEFAULT_SERPER_ENDPOINT);
        Url::parse(&serper_endpoint)
            .map_err(|e| anyhow!("SERPER_ENDPOINT no es una URL válida ({serper_endpoint}): {e}"))?;
        let web_search_timeout = Duration::from_secs(parse_positive(
            "WEB_SEARCH_TIMEOUT_SECS",
            &var("WEB_SEARCH_TIMEOUT_SECS", "10"),
        )?);
        let web_search_results: u32 =
            parse_positive("WEB_SEARCH_RESULTS", &var("WEB_SEARCH_RESULTS", "7"))?;

        let llm_provider = LlmProvider::from_str(&var("LLM_PROVIDER", "gemini"))?;
        let llm_api_key = credential(lookup(llm_provider.key_var()));
        let llm_chat_model = lookup("LLM_CHAT_MODEL")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| llm_provider.default_chat_model().to_string());
        let llm_timeout =
            Duration::from_secs(parse_positive("LLM_TIMEOUT_SECS", &var("LLM_TIMEOUT_SECS", "60"))?);

        Ok(Self {
            server_addr,
            open_browser,
            store_backend,
            chroma_db_path,
            serper_api_key,
            serper_endpoint,
            web_search_timeout,
            web_search_results,
            llm_provider,
            llm_api_key,
            llm_chat_model,
            llm_timeout,
        })
    }
}

/// Normaliza una credencial: vacía o de plantilla equivale a no tenerla.
fn credential(raw: Option<String>) -> Option<String> {
    raw.map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(&k.as_str()))
}

fn parse_bool(raw: &str) -> bool {
    !matches!(raw.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off")
}

/// Entero mayor que cero, sin truncar al tipo de destino.
fn parse_positive<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr + PartialEq + Default,
{
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::default() => Ok(value),
        _ => Err(anyhow!("{name} debe ser un entero positivo, recibido: {raw}")),
    }
}
