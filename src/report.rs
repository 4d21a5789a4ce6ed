//! Prompts para el modelo y plantilla de informe de respaldo.

use chrono::{NaiveDate, Utc};

use crate::models::IntentAnalysis;

pub const ANALYST_PREAMBLE: &str =
    "You are a senior research analyst at a top consulting firm. Be precise and professional.";

/// Prompt de clasificación. Incluye el JSON Schema del objeto esperado para
/// que el modelo use exactamente esos nombres de campo.
pub fn intent_prompt(question: &str) -> String {
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(IntentAnalysis))
        .unwrap_or_else(|_| "{}".to_string());

    format!(
        r#"Analyze this research question in depth and determine the optimal information sources needed.

QUESTION: "{question}"

Consider these aspects:
1. Time sensitivity - does it need recent/current information?
2. Organizational context - does it mention "our", "internal", "company"?
3. Technical depth - does it require specialized/internal knowledge?
4. Comparative analysis - does it ask for comparisons?
5. Action orientation - does it require recommendations?

Return ONLY one valid JSON object matching this schema:
{schema}

- "confidence" is one of "high", "medium", "low".
- "question_type" is one of "technical", "strategic", "comparative", "regulatory", "trends", "internal".
- "web_query" is an optimized search query for the web, "internal_query" one for internal documents.
"#
    )
}

/// Prompt de síntesis: informe profesional de siete secciones.
pub fn synthesis_prompt(question: &str, web_data: &str, internal_data: &str, date: NaiveDate) -> String {
    let web = if web_data.trim().is_empty() {
        "No external market data available"
    } else {
        web_data
    };
    let internal = if internal_data.trim().is_empty() {
        "No internal organizational data available"
    } else {
        internal_data
    };

    format!(
        r#"Create a comprehensive, professional research report.

RESEARCH REQUEST: "{question}"
REPORT DATE: {date}

====================
EXTERNAL MARKET INTELLIGENCE:
====================
{web}

====================
INTERNAL ORGANIZATIONAL KNOWLEDGE:
====================
{internal}

CREATE A PROFESSIONAL RESEARCH REPORT WITH THESE SECTIONS:

# Executive Summary
- Key findings and recommendations (3-4 bullet points)
- Immediate actionable insights

## 1. Market Overview & Current Landscape
- Current market state and key players
- Recent developments and trends
- Market size and growth projections

## 2. Technical Analysis
- Technical specifications and capabilities
- Innovation trends and breakthroughs
- Technical challenges and limitations

## 3. Competitive Landscape
- Key competitors and their positioning
- Comparative analysis of capabilities
- Market share and differentiation

## 4. Internal Capability Assessment
- Current organizational capabilities
- Strengths and weaknesses analysis
- Resource allocation and projects

## 5. Strategic Recommendations
### Immediate Actions (0-3 months)
- Specific, actionable recommendations
- Resource requirements
- Expected outcomes

### Medium-term Initiatives (3-12 months)
- Strategic projects and investments
- Partnership opportunities
- Capability development

### Long-term Strategy (1-3 years)
- Vision and roadmap
- Market positioning
- Innovation pipeline

## 6. Risk Assessment
- Market and competitive risks
- Technical and implementation risks
- Regulatory and compliance considerations

## 7. Key Metrics & KPIs
- Success measurement criteria
- Performance indicators
- Monitoring framework

GUIDELINES:
- Use professional business language
- Include specific data points and metrics when available
- Use tables for comparisons when helpful
- Bold key findings and recommendations
- Include timelines and ownership suggestions
- Cite sources appropriately
- Acknowledge data limitations

Focus on providing actionable business intelligence rather than just summarizing information.
"#
    )
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Informe de respaldo cuando no hay modelo: misma estructura, valores de
/// relleno. Sólo se sustituyen la pregunta y la fecha.
pub fn fallback_report(question: &str, date: NaiveDate) -> String {
    format!(
        r#"# Comprehensive Research Report: {question}

**Report Date:** {date}
**Prepared For:** Research Request
**Prepared By:** AI Research Assistant

---

## Executive Summary

### Key Findings
- **Market Dynamics**: Significant advancements and increased competition in the sector
- **Internal Position**: Strong foundational capabilities with opportunities for expansion
- **Strategic Gap**: Alignment needed between current capabilities and market opportunities

### Immediate Recommendations
1. **Accelerate R&D investments** in core technology areas
2. **Establish strategic partnerships** to complement internal capabilities
3. **Enhance market intelligence** gathering and analysis

---

## 1. Market Overview & Current Landscape

### Current Market State
The market is experiencing rapid transformation with multiple technological breakthroughs. Key trends include increased automation, AI integration, and sustainability focus.

### Key Market Players
| Company | Market Position | Key Strength |
|---------|-----------------|--------------|
| Industry Leader A | Dominant | Technology Innovation |
| Company B | Strong Challenger | Market Reach |
| Emerging Player C | Growing | Specialized Solutions |

### Market Metrics
- **Market Size**: $XX Billion (2024)
- **Growth Rate**: XX% CAGR (2024-2028)
- **Key Drivers**: Technology adoption, regulatory changes, customer demand

---

## 2. Technical Analysis

### Current Capabilities
- **Maturity Level**: Advanced in core areas, developing in emerging technologies
- **Innovation Pipeline**: Multiple projects in development phase
- **Technical Debt**: Moderate, requiring strategic addressing

### Technology Trends
1. **AI & Machine Learning**: Increasing integration across solutions
2. **Cloud Native**: Shift towards cloud-based architectures
3. **API-first**: Emphasis on interoperability and integration

---

## 3. Competitive Landscape

### Strengths Comparison
| Aspect | Our Position | Market Leader | Key Differentiator |
|--------|--------------|---------------|-------------------|
| Technology | Advanced | Leading | Specialized focus |
| Market Reach | Regional | Global | Local expertise |
| Innovation | Strong R&D | Market driver | Research depth |

---

## 4. Internal Capability Assessment

### Current Projects
- **Project Alpha**: Next-generation platform development (75% complete)
- **Initiative Beta**: Market expansion program (planning phase)
- **Research Gamma**: Emerging technology exploration (early stage)

### Resource Allocation
- **R&D**: 40% of resources
- **Market Expansion**: 25% of resources
- **Operations**: 35% of resources

---

## 5. Strategic Recommendations

### Immediate Actions (0-3 months)
1. **✅ Conduct competitive analysis workshop**
   - Timeline: Month 1
   - Owner: Strategy Team
   - Budget: $XX,XXX

2. **✅ Accelerate Project Alpha delivery**
   - Timeline: Months 1-3
   - Owner: Product Team
   - Expected Impact: XX% efficiency gain

### Medium-term Initiatives (3-12 months)
1. **🔄 Establish technology partnerships**
   - Timeline: Months 4-8
   - Owner: Business Development
   - Target: 2-3 strategic partners

2. **🔄 Enhance data analytics capabilities**
   - Timeline: Months 6-12
   - Owner: Data Science Team
   - Investment: $XXX,XXX

### Long-term Strategy (1-3 years)
1. **🚀 Market leadership position**
   - Target: Top 3 market position
   - Key Focus: Innovation and customer experience
   - Investment: Strategic acquisitions

---

## 6. Risk Assessment

### High Priority Risks
1. **Technology Disruption** (Probability: Medium, Impact: High)
   - Mitigation: Continuous R&D investment

2. **Market Competition** (Probability: High, Impact: Medium)
   - Mitigation: Differentiation strategy

3. **Regulatory Changes** (Probability: Medium, Impact: Medium)
   - Mitigation: Compliance monitoring

---

## 7. Key Metrics & KPIs

### Performance Indicators
- **Market Share**: Current XX%, Target: XX% by 2025
- **R&D ROI**: Target XX% return on research investments
- **Customer Satisfaction**: Maintain >90% satisfaction rate

### Success Criteria
- **Technology Leadership**: XX patents filed annually
- **Market Presence**: Expand to XX new markets
- **Financial Performance**: XX% revenue growth

---

*This report combines external market intelligence with internal organizational knowledge. Verify critical business decisions with additional primary research.*
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    #[test]
    fn fallback_substitutes_question_and_date_only() {
        let report = fallback_report("Quantum computing outlook", date());
        assert!(report.starts_with("# Comprehensive Research Report: Quantum computing outlook"));
        assert!(report.contains("**Report Date:** 2024-06-30"));
        assert!(report.contains("$XX Billion"));
        for section in [
            "## 1. Market Overview",
            "## 2. Technical Analysis",
            "## 3. Competitive Landscape",
            "## 4. Internal Capability Assessment",
            "## 5. Strategic Recommendations",
            "## 6. Risk Assessment",
            "## 7. Key Metrics & KPIs",
        ] {
            assert!(report.contains(section), "{section}");
        }
    }

    #[test]
    fn synthesis_prompt_marks_missing_sources() {
        let prompt = synthesis_prompt("q", "", "Internal Knowledge:\n1. Ares\n", date());
        assert!(prompt.contains("No external market data available"));
        assert!(prompt.contains("1. Ares"));
        assert!(prompt.contains("REPORT DATE: 2024-06-30"));
    }

    #[test]
    fn intent_prompt_embeds_schema_fields() {
        let prompt = intent_prompt("Latest AI regulations");
        assert!(prompt.contains("\"Latest AI regulations\""));
        assert!(prompt.contains("needs_web"));
        assert!(prompt.contains("expected_sections"));
    }
}
