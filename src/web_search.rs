//! Búsqueda web (Serper) con respaldo a una base de resultados simulados.
//!
//! Ningún fallo de red llega al llamador: timeouts, errores HTTP o de
//! parseo se convierten en resultados simulados con el motivo anotado en
//! el propio texto.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::AppConfig;

const MAX_ORGANIC_RESULTS: usize = 5;
const LINK_PREVIEW_CHARS: usize = 50;
const DEFAULT_MOCK_REASON: &str = "using enhanced mock database";

/// Proveedor de búsqueda web. Siempre devuelve una sección markdown.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn query(&self, text: &str) -> String;

    /// Descripción corta para el panel de estado.
    fn capability(&self) -> &'static str;
}

/// Construye el proveedor según haya o no credencial.
pub fn from_config(cfg: &AppConfig) -> Result<Arc<dyn SearchProvider>> {
    match &cfg.serper_api_key {
        Some(key) => {
            info!("🌐 Búsqueda web: Serper API");
            Ok(Arc::new(SerperSearch::new(
                key.clone(),
                cfg.serper_endpoint.clone(),
                cfg.web_search_timeout,
                cfg.web_search_results,
            )?))
        }
        None => {
            info!("🔄 Sin SERPER_API_KEY: búsqueda web simulada");
            Ok(Arc::new(MockSearch))
        }
    }
}

// ---------------------------------------------------------------------
// SERPER
// ---------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

pub struct SerperSearch {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    num_results: u32,
}

impl SerperSearch {
    pub fn new(api_key: String, endpoint: String, timeout: Duration, num_results: u32) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("No se pudo crear el cliente HTTP: {e}"))?;
        Ok(Self {
            client,
            api_key,
            endpoint,
            num_results,
        })
    }

    async fn search(&self, text: &str) -> Result<SerperResponse, reqwest::Error> {
        let body = json!({
            "q": text,
            "num": self.num_results,
            "gl": "us",
            "hl": "en",
        });

        self.client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<SerperResponse>()
            .await
    }
}

#[async_trait]
impl SearchProvider for SerperSearch {
    async fn query(&self, text: &str) -> String {
        match self.search(text).await {
            Ok(response) => format_serper_results(&response, text),
            Err(e) if e.is_timeout() => {
                warn!("Timeout en Serper para '{text}'; usando datos simulados.");
                mock_search(text, "Request timeout - using enhanced mock data")
            }
            Err(e) => {
                warn!("Error en Serper para '{text}': {e}; usando datos simulados.");
                mock_search(text, &format!("API error: {e} - using enhanced mock data"))
            }
        }
    }

    fn capability(&self) -> &'static str {
        "Serper API"
    }
}

fn format_serper_results(results: &SerperResponse, original_query: &str) -> String {
    let mut formatted = String::from("## 🌐 Latest Web Research\n\n");

    if results.organic.is_empty() {
        formatted.push_str("No web results found. Try different keywords or check your query.\n");
        return formatted;
    }

    for item in results.organic.iter().take(MAX_ORGANIC_RESULTS) {
        formatted.push_str(&format!(
            "### 📰 {}\n",
            item.title.as_deref().unwrap_or("No title")
        ));
        formatted.push_str(&format!(
            "**Summary:** {}\n\n",
            item.snippet.as_deref().unwrap_or("No description available")
        ));
        if let Some(link) = &item.link {
            let preview: String = link.chars().take(LINK_PREVIEW_CHARS).collect();
            formatted.push_str(&format!("🔗 **Source:** [{preview}...]({link})\n"));
        }
        formatted.push_str("---\n\n");
    }

    formatted.push_str(&format!(
        "*Found {} results for '{}'*\n",
        results.organic.len(),
        original_query
    ));
    formatted
}

// ---------------------------------------------------------------------
// SIMULADA
// ---------------------------------------------------------------------

/// Búsqueda sin red: siempre responde con la base simulada.
pub struct MockSearch;

#[async_trait]
impl SearchProvider for MockSearch {
    async fn query(&self, text: &str) -> String {
        mock_search(text, DEFAULT_MOCK_REASON)
    }

    fn capability(&self) -> &'static str {
        "Mock Data"
    }
}

struct MockResult {
    title: &'static str,
    snippet: &'static str,
    source: &'static str,
}

struct MockTopic {
    topic: &'static str,
    title: &'static str,
    results: &'static [MockResult],
}

const MOCK_DATABASE: &[MockTopic] = &[
    MockTopic {
        topic: "solid-state batteries",
        title: "Solid-State Battery Breakthroughs 2024",
        results: &[
            MockResult {
                title: "QuantumScape Achieves 900 Wh/L Energy Density",
                snippet: "QuantumScape announces commercial-scale solid-state batteries achieving 900 Wh/L energy density, enabling 500+ mile EV ranges and 10-minute fast charging. Production planned for 2025.",
                source: "https://quantumscape.com/breakthrough",
            },
            MockResult {
                title: "Toyota Solid-State Production Timeline",
                snippet: "Toyota confirms 2027 launch for vehicles with solid-state batteries, claiming 750+ mile range and unprecedented safety features. Manufacturing partnership with Panasonic announced.",
                source: "https://toyota.com/innovation",
            },
            MockResult {
                title: "MIT New Electrolyte Material Research",
                snippet: "MIT researchers develop new ceramic electrolyte that enables 2000+ cycle life while maintaining high conductivity. Patent pending for the novel material composition.",
                source: "https://mit.edu/battery-research",
            },
            MockResult {
                title: "Solid-State Battery Cost Reduction Roadmap",
                snippet: "Industry analysis predicts 40% cost reduction by 2026 through improved manufacturing processes and material innovations. DOE grants $200M for domestic production.",
                source: "https://energy.gov/battery-funding",
            },
        ],
    },
    MockTopic {
        topic: "ai regulation",
        title: "Global AI Regulation Updates",
        results: &[
            MockResult {
                title: "EU AI Act Final Implementation",
                snippet: "European Parliament approves final AI Act text with strict requirements for high-risk AI systems. Compliance deadline set for 2025 with significant penalties for violations.",
                source: "https://europa.eu/ai-act",
            },
            MockResult {
                title: "US Executive Order on AI Safety",
                snippet: "White House issues comprehensive AI safety executive order requiring testing for powerful models and establishing new security standards. $1.6B allocated for AI research.",
                source: "https://whitehouse.gov/ai-order",
            },
            MockResult {
                title: "China AI Governance Framework",
                snippet: "China releases detailed AI governance rules focusing on generative AI, data security, and algorithmic transparency. Special emphasis on content management and oversight.",
                source: "https://gov.cn/ai-regulation",
            },
            MockResult {
                title: "UK AI Safety Summit Outcomes",
                snippet: "International AI Safety Summit concludes with 28 countries signing declaration on cooperative AI safety testing. New global research network established.",
                source: "https://gov.uk/ai-safety",
            },
        ],
    },
    MockTopic {
        topic: "renewable energy",
        title: "Renewable Energy Innovations 2024",
        results: &[
            MockResult {
                title: "Perovskite Solar Cells Hit 47% Efficiency",
                snippet: "New tandem perovskite-silicon solar cells achieve record 47% efficiency in lab conditions, potentially cutting solar energy costs by 60% within 3 years.",
                source: "https://solarresearch.org/breakthrough",
            },
            MockResult {
                title: "Offshore Wind Capacity Tripling Plans",
                snippet: "Global offshore wind capacity set to triple by 2030 with $300B in new investments. Major projects announced in North Sea and US East Coast.",
                source: "https://energynews.com/wind-expansion",
            },
            MockResult {
                title: "Green Hydrogen Cost Breakthrough",
                snippet: "New electrolyzer technology reduces green hydrogen production costs to $2/kg, making it competitive with fossil fuels. DOE announces $7B funding for regional hubs.",
                source: "https://hydrogen-future.com/cost-reduction",
            },
        ],
    },
    MockTopic {
        topic: "quantum computing",
        title: "Quantum Computing Advances",
        results: &[
            MockResult {
                title: "IBM Announces 1000+ Qubit Processor",
                snippet: "IBM unveils 1121-qubit Condor processor, marking milestone in quantum computing scale. Demonstrates quantum advantage in specific optimization problems.",
                source: "https://ibm.com/quantum-breakthrough",
            },
            MockResult {
                title: "Quantum Error Correction Milestone",
                snippet: "Google achieves fault-tolerant quantum computation with 99.9% gate fidelity. Breakthrough enables longer quantum calculations with reduced errors.",
                source: "https://research.google/quantum",
            },
        ],
    },
];

/// Tema con mayor número de palabras contenidas en la consulta
/// (estrictamente positivo; a igualdad gana el primero de la tabla).
fn best_topic(query: &str) -> Option<&'static MockTopic> {
    let query_lower = query.to_lowercase();
    let mut best: Option<(&MockTopic, usize)> = None;

    for topic in MOCK_DATABASE {
        let score = topic
            .topic
            .split_whitespace()
            .filter(|word| query_lower.contains(word))
            .count();
        if score > best.map_or(0, |(_, s)| s) {
            best = Some((topic, score));
        }
    }

    best.map(|(topic, _)| topic)
}

/// Resultados simulados para la consulta, con el motivo del respaldo.
pub fn mock_search(query: &str, reason: &str) -> String {
    let Some(data) = best_topic(query) else {
        return generic_mock(query, reason);
    };

    let mut formatted = format!("## 🌐 {}\n\n", data.title);
    formatted.push_str(&format!("*🔍 Mock data for '{query}' - {reason}*\n\n"));
    for result in data.results {
        formatted.push_str(&format!("### 📰 {}\n", result.title));
        formatted.push_str(&format!("**Summary:** {}\n\n", result.snippet));
        formatted.push_str(&format!("🔗 **Source:** {}\n", result.source));
        formatted.push_str("---\n\n");
    }
    formatted
}

fn generic_mock(query: &str, reason: &str) -> String {
    format!(
        "## 🌐 Web Research: {query}

**🔍 Enhanced Mock Data - {reason}**

### 📰 Industry Analysis Report
**Summary:** Recent market analysis shows significant developments and growing investment in this sector. Multiple companies are reporting breakthroughs and new product announcements.

🔗 **Source:** https://industry-news.com/analysis

### 📰 Research Institution Findings
**Summary:** Academic research continues to advance the fundamental understanding and practical applications in this field. Several patents have been filed recently.

🔗 **Source:** https://research-updates.edu/breakthroughs

### 📰 Government Policy Update
**Summary:** Regulatory frameworks are evolving to address new challenges and opportunities. Funding programs have been announced to support innovation.

🔗 **Source:** https://government.gov/policy-update

*💡 For real-time results, add a free Serper API key (100 searches/month)*"
    )
}
