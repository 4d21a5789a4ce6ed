//! Corpus fijo de ejemplo para la base de conocimiento interna.
//!
//! 25 documentos cortos (tecnología, negocio, I+D y operaciones) con sus
//! metadatos. Sólo se cargan si la colección tiene menos de
//! `SEED_THRESHOLD` documentos, para no duplicarlos en cada arranque.

use tracing::info;

use crate::errors::StoreError;
use crate::models::Metadata;
use crate::vector_store::KnowledgeStore;

pub const SEED_THRESHOLD: usize = 20;

type SampleDoc = (&'static str, &'static [(&'static str, &'static str)]);

const SAMPLE_DOCS: &[SampleDoc] = &[
    // Tecnología e IA
    (
        "Project Ares - Solid State Battery Research: Achieved 750 Wh/L energy density with 2000 cycle life at 80% capacity retention. Current manufacturing focus aims for 40% cost reduction through automated production lines.",
        &[("source", "internal"), ("type", "research"), ("project", "Ares"), ("department", "R&D"), ("domain", "battery"), ("confidence", "high")],
    ),
    (
        "AI Ethics Committee Q2 2024 Report: Recommended implementing AI transparency protocols by Q3 2024. Identified 5 key compliance areas needing updates to meet EU AI Act requirements. Budget allocation: $2.5M for compliance infrastructure.",
        &[("source", "internal"), ("type", "policy"), ("department", "AI Ethics"), ("status", "approved"), ("domain", "ai"), ("priority", "high")],
    ),
    (
        "Quantum Computing Initiative 2024: Established partnership with Quantum Research Institute. Current focus on developing 50-qubit quantum processors. Projected timeline: Prototype by Q4 2024, commercial deployment 2026.",
        &[("source", "internal"), ("type", "research"), ("project", "Quantum"), ("department", "Advanced Research"), ("domain", "quantum"), ("timeline", "2026")],
    ),
    (
        "Cloud Infrastructure Migration: Completed 80% migration to multi-cloud architecture. Achieved 40% cost reduction and 99.95% uptime. Remaining workloads scheduled for Q3 2024 migration.",
        &[("source", "internal"), ("type", "infrastructure"), ("department", "IT"), ("status", "completed"), ("domain", "cloud"), ("impact", "high")],
    ),
    (
        "Cybersecurity Framework Update: Implemented zero-trust architecture across all systems. Reduced security incidents by 65% year-over-year. Next phase: AI-powered threat detection deployment.",
        &[("source", "internal"), ("type", "security"), ("department", "Cybersecurity"), ("status", "implemented"), ("domain", "security"), ("priority", "critical")],
    ),
    (
        "Data Analytics Platform: Launched new real-time analytics platform processing 2TB daily. Customer adoption at 45% within first quarter. ROI projection: 3.2x within 18 months.",
        &[("source", "internal"), ("type", "platform"), ("department", "Data Science"), ("status", "live"), ("domain", "analytics"), ("roi", "high")],
    ),
    (
        "IoT Integration Project: Deployed 10,000 IoT sensors across manufacturing facilities. Resulted in 25% operational efficiency improvement. Expansion planned for Q1 2025.",
        &[("source", "internal"), ("type", "iot"), ("department", "Manufacturing"), ("status", "deployed"), ("domain", "iot"), ("efficiency", "25%")],
    ),
    (
        "Blockchain Supply Chain: Pilot program showing 30% reduction in supply chain disputes. Full implementation scheduled for 2025 across all logistics partners.",
        &[("source", "internal"), ("type", "blockchain"), ("department", "Supply Chain"), ("status", "pilot"), ("domain", "blockchain"), ("potential", "high")],
    ),
    // Negocio y estrategia
    (
        "Q3 2024 Financial Projections: Battery division shows 28% growth based on current research outcomes. Renewable energy projects contributed $4.7M revenue last quarter. Projected annual growth: 22%.",
        &[("source", "internal"), ("type", "financial"), ("quarter", "Q3"), ("department", "Finance"), ("domain", "finance"), ("confidence", "high")],
    ),
    (
        "Market Expansion Strategy Asia-Pacific: Entered 3 new markets with localized offerings. Current market share: 8%, target: 15% by 2025. Investment: $15M over 3 years.",
        &[("source", "internal"), ("type", "strategy"), ("region", "APAC"), ("department", "Business Development"), ("domain", "expansion"), ("investment", "$15M")],
    ),
    (
        "M&A Strategy Update: Identified 5 acquisition targets in AI and renewable energy sectors. Due diligence completed on 2 targets. Expected deal closure: Q4 2024.",
        &[("source", "internal"), ("type", "strategy"), ("department", "M&A"), ("status", "active"), ("domain", "acquisition"), ("timeline", "Q4 2024")],
    ),
    (
        "Customer Success Metrics Q2 2024: Overall satisfaction score: 94% (up from 88%). Key improvement areas: support response time (now under 2 hours), product documentation.",
        &[("source", "internal"), ("type", "metrics"), ("department", "Customer Success"), ("quarter", "Q2"), ("domain", "customer"), ("satisfaction", "94%")],
    ),
    (
        "Strategic Partnerships 2024: Formed 3 new technology partnerships. Joint development projects expected to generate $12M in additional revenue over 2 years.",
        &[("source", "internal"), ("type", "partnerships"), ("department", "Business Development"), ("status", "active"), ("domain", "partnerships"), ("revenue", "$12M")],
    ),
    (
        "Sustainability Initiative Progress: Reduced carbon footprint by 35% year-over-year. On track to meet 2025 sustainability goals. Renewable energy usage: 65% of total consumption.",
        &[("source", "internal"), ("type", "sustainability"), ("department", "Operations"), ("status", "ongoing"), ("domain", "sustainability"), ("reduction", "35%")],
    ),
    // Investigación y desarrollo
    (
        "Advanced Materials Research: Developed new graphene composite with 3x conductivity of traditional materials. Patent filed, commercial applications in battery and semiconductor industries.",
        &[("source", "internal"), ("type", "research"), ("department", "Materials Science"), ("domain", "materials"), ("innovation", "breakthrough"), ("patent", "filed")],
    ),
    (
        "Machine Learning Optimization: New algorithm reduced training time by 60% while maintaining 99% accuracy. Deployed across all AI products, resulting in 25% cost savings.",
        &[("source", "internal"), ("type", "research"), ("department", "AI Research"), ("domain", "machine learning"), ("efficiency", "60%"), ("impact", "high")],
    ),
    (
        "Renewable Energy Storage: Breakthrough in hydrogen storage technology achieving 80% efficiency. Pilot plant construction beginning Q3 2024.",
        &[("source", "internal"), ("type", "research"), ("department", "Energy"), ("domain", "renewable"), ("efficiency", "80%"), ("timeline", "Q3 2024")],
    ),
    (
        "Biotech Convergence: Exploring AI applications in personalized medicine. Initial research shows 40% improvement in treatment prediction accuracy.",
        &[("source", "internal"), ("type", "research"), ("department", "Biotech"), ("domain", "healthcare"), ("improvement", "40%"), ("application", "medicine")],
    ),
    (
        "Space Technology Division: Secured $8M contract for satellite communication technology. First prototype delivery scheduled for Q1 2025.",
        &[("source", "internal"), ("type", "research"), ("department", "Space Tech"), ("domain", "aerospace"), ("contract", "$8M"), ("timeline", "Q1 2025")],
    ),
    (
        "Autonomous Systems Research: Developed new navigation algorithm with 99.9% accuracy in complex environments. Applications in robotics, drones, and autonomous vehicles.",
        &[("source", "internal"), ("type", "research"), ("department", "Autonomous Systems"), ("domain", "robotics"), ("accuracy", "99.9%"), ("applications", "multiple")],
    ),
    // Operaciones y cumplimiento
    (
        "Manufacturing Process Innovation: New solid-state battery manufacturing technique reduced production time by 45% and material waste by 35%. Patent pending, scaling to full production.",
        &[("source", "internal"), ("type", "manufacturing"), ("department", "Production"), ("improvement", "45%"), ("domain", "operations"), ("status", "scaling")],
    ),
    (
        "Quality Assurance Framework: Implemented AI-powered quality control achieving 99.98% defect detection rate. Reduced warranty claims by 40%.",
        &[("source", "internal"), ("type", "quality"), ("department", "QA"), ("accuracy", "99.98%"), ("domain", "operations"), ("impact", "high")],
    ),
    (
        "Regulatory Compliance Status: 88% compliant with new international AI regulations. Compliance target: 95% by Q4 2024. Remaining gaps in data governance and algorithmic transparency.",
        &[("source", "internal"), ("type", "compliance"), ("department", "Legal"), ("status", "88%"), ("domain", "regulatory"), ("target", "95%")],
    ),
    (
        "Supply Chain Optimization: Reduced logistics costs by 22% through route optimization and supplier consolidation. Improved delivery times by 35%.",
        &[("source", "internal"), ("type", "operations"), ("department", "Supply Chain"), ("savings", "22%"), ("domain", "logistics"), ("improvement", "35%")],
    ),
    (
        "Talent Development Program: Launched AI skills certification program. 75% of technical staff completed advanced training. Hiring target: 200 new AI specialists in 2024.",
        &[("source", "internal"), ("type", "hr"), ("department", "Talent"), ("completion", "75%"), ("domain", "workforce"), ("hiring", "200")],
    ),
];

/// Textos y metadatos del corpus de ejemplo.
pub fn sample_documents() -> (Vec<String>, Vec<Metadata>) {
    SAMPLE_DOCS
        .iter()
        .map(|(text, meta)| {
            let metadata = meta
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Metadata>();
            (text.to_string(), metadata)
        })
        .unzip()
}

/// Carga el corpus si la colección tiene menos de `SEED_THRESHOLD`
/// documentos. Devuelve cuántos documentos se añadieron.
pub async fn seed_sample_data(store: &dyn KnowledgeStore) -> Result<usize, StoreError> {
    let current = store.count().await?;
    if current >= SEED_THRESHOLD {
        info!("ℹ️ La base de conocimiento ya contiene {current} documentos.");
        return Ok(0);
    }

    let (texts, metadatas) = sample_documents();
    let added = store.add_documents(&texts, Some(metadatas.as_slice()), None).await?;
    info!(
        "📊 Corpus de ejemplo cargado: {} documentos (tecnología, negocio, I+D, operaciones).",
        added.len()
    );
    Ok(added.len())
}
