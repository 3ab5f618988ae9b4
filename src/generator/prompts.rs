//! 四个阶段的prompt构建函数，纯函数、无副作用

use crate::generator::schema::{PortfolioDraft, RationaleReport, ResearchReport, schema_text};
use crate::generator::types::{PlanRequest, PortfolioPlan, RationaleSet, ResearchResult, RiskLevel};
use crate::i18n::TargetLanguage;
use crate::llm::tools::web_search::SearchHit;

/// 数字格式化为美元金额，如 `$100,000.00`
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac_part)
}

fn industry_label(request: &PlanRequest) -> &str {
    request
        .industry()
        .unwrap_or("Any industry (no specific sector focus)")
}

fn risk_guideline(risk_level: RiskLevel) -> &'static str {
    match risk_level {
        RiskLevel::Low => {
            "Focus on stable, dividend-paying companies with 60-80% of the amount in large caps."
        }
        RiskLevel::Medium => {
            "Balance the portfolio with 40-60% in growth stocks and 40-60% in value stocks."
        }
        RiskLevel::High => {
            "Favour growth and emerging companies with 70-90% of the amount in growth stocks."
        }
    }
}

fn investor_profile(request: &PlanRequest) -> String {
    format!(
        "Investor Profile:\n- Risk Level: {}\n- Industry Focus: {}\n- Investment Amount: {}\n- Time Horizon: {}\n",
        request.risk_level(),
        industry_label(request),
        format_currency(request.investment_amount()),
        request.time_horizon()
    )
}

fn json_instruction(schema: &str) -> String {
    format!(
        "Respond with a single JSON object only, no prose before or after it. The object must match this JSON Schema:\n```json\n{}\n```\n",
        schema
    )
}

/// 将调研结果格式化为后续阶段的上下文
pub fn format_research_context(research: &ResearchResult) -> String {
    match research {
        ResearchResult::Companies { companies } => companies
            .iter()
            .map(|c| format!("- {}: {} (Risk: {})", c.name, c.rationale, c.risk_note))
            .collect::<Vec<_>>()
            .join("\n"),
        ResearchResult::NoExternalData { reason } => format!(
            "{} Web research was unavailable ({}). Rely on well-established, publicly traded companies you know well and mention this limitation.",
            ResearchResult::NO_EXTERNAL_DATA_MARKER,
            reason
        ),
    }
}

fn format_portfolio(portfolio: &PortfolioPlan, research: &ResearchResult) -> String {
    let mut content = String::new();
    for allocation in &portfolio.allocations {
        content.push_str(&format!(
            "- {}: {:.1}% ({})",
            allocation.company,
            allocation.percentage,
            format_currency(allocation.amount)
        ));
        if let Some(period) = &allocation.holding_period {
            content.push_str(&format!(", holding period {}", period));
        }
        if let Some(found) = research.find(&allocation.company) {
            content.push_str(&format!(", risk {}", found.risk_note));
        }
        if !allocation.justification.is_empty() {
            content.push_str(&format!("\n  Justification: {}", allocation.justification));
        }
        content.push('\n');
    }
    content.push_str(&format!(
        "Total allocated: {:.1}% ({})\n",
        portfolio.total_percentage(),
        format_currency(portfolio.total_amount())
    ));
    if !portfolio.strategy_summary.is_empty() {
        content.push_str(&format!("Strategy: {}\n", portfolio.strategy_summary));
    }
    content
}

/// 无状态的prompt构建器
pub struct PromptBuilder;

impl PromptBuilder {
    /// Research阶段的搜索查询
    pub fn search_query(request: &PlanRequest, year: i32) -> String {
        match request.industry() {
            Some(industry) => format!("best {} stocks to invest in {} top companies", industry, year),
            None => format!("best stocks to invest in {} top companies", year),
        }
    }

    /// Research阶段：从搜索结果中提取候选公司
    pub fn research(request: &PlanRequest, query: &str, hits: &[SearchHit]) -> String {
        let mut prompt = String::from(
            "You are an expert investment analyst. Analyze the web search results below and identify up to 10 companies suitable for investment.\n\n",
        );
        prompt.push_str(&investor_profile(request));

        prompt.push_str(&format!("\nSearch Results for: {}\n", query));
        for (i, hit) in hits.iter().enumerate() {
            prompt.push_str(&format!("{}. {}\n", i + 1, hit.title));
            if !hit.snippet.is_empty() {
                prompt.push_str(&format!("   {}\n", hit.snippet));
            }
            if !hit.link.is_empty() {
                prompt.push_str(&format!("   Source: {}\n", hit.link));
            }
        }

        prompt.push_str(&format!(
            "\nFor each company give its full legal name, a risk factor (Low, Medium or High) and an explanation of why it suits a {} risk investor with a {} horizon. Prefer companies with strong market position, consistent financial performance and growth potential aligned with the horizon.\n\n",
            request.risk_level(),
            request.time_horizon()
        ));
        prompt.push_str(&json_instruction(&schema_text::<ResearchReport>()));
        prompt
    }

    /// Allocate阶段：在候选公司间分配资金
    pub fn allocate(request: &PlanRequest, research: &ResearchResult) -> String {
        let mut prompt = String::from(
            "You are an expert portfolio manager. Build a portfolio allocation from the researched companies for the investor below.\n\n",
        );
        prompt.push_str(&investor_profile(request));
        prompt.push_str("\nAvailable Companies:\n");
        prompt.push_str(&format_research_context(research));

        prompt.push_str(&format!(
            "\n\nPortfolio Guidelines:\n- Select the most suitable companies, not necessarily all of them.\n- {}\n- The allocations must add up to exactly 100% of {}.\n- Give each allocation a percentage, a dollar amount, an optional holding period and a short justification.\n- Consider diversification across market caps and sectors.\n\n",
            risk_guideline(request.risk_level()),
            format_currency(request.investment_amount())
        ));
        prompt.push_str(&json_instruction(&schema_text::<PortfolioDraft>()));
        prompt
    }

    /// Rationale阶段：为组合中的每个公司给出投资理由
    pub fn rationale(
        request: &PlanRequest,
        research: &ResearchResult,
        portfolio: &PortfolioPlan,
    ) -> String {
        let mut prompt = String::from(
            "You are an expert investment advisor. Explain the investment rationale for every company in the portfolio.\n\n",
        );
        prompt.push_str(&investor_profile(request));
        prompt.push_str("\nPortfolio Plan:\n");
        prompt.push_str(&format_portfolio(portfolio, research));
        prompt.push_str("\nResearch Results:\n");
        prompt.push_str(&format_research_context(research));

        prompt.push_str(
            "\n\nFor each company cover its business and market position, why it fits this investor's risk level, why the allocation size is appropriate, the growth outlook over the time horizon and the main risks. Write in a clear, professional tone, one rationale per portfolio company.\n\n",
        );
        prompt.push_str(&json_instruction(&schema_text::<RationaleReport>()));
        prompt
    }

    /// Format阶段：生成最终的Markdown报告
    pub fn format(
        request: &PlanRequest,
        research: &ResearchResult,
        portfolio: &PortfolioPlan,
        rationale: &RationaleSet,
        language: &TargetLanguage,
    ) -> String {
        let mut prompt = String::from(
            "You are an expert financial advisor writing a professional investment plan report for a client.\n\n",
        );
        prompt.push_str(&investor_profile(request));
        prompt.push_str("\nPortfolio Plan:\n");
        prompt.push_str(&format_portfolio(portfolio, research));
        prompt.push_str("\nInvestment Rationale:\n");
        for entry in &rationale.entries {
            prompt.push_str(&format!("### {}\n{}\n\n", entry.company, entry.rationale));
        }
        prompt.push_str("Research Context:\n");
        prompt.push_str(&format_research_context(research));

        prompt.push_str(
            "\n\nWrite the report in Markdown with exactly these sections:\n\
             ## Executive Summary\n- strategy overview, allocation highlights, expected outcome over the horizon\n\
             ## Portfolio Allocation\n- a table with columns Company | Allocation | Amount | Holding Period | Risk Level\n\
             ## Detailed Investment Analysis\n- one subsection per company: business, thesis, risks, growth outlook\n\
             ## Risk Management\n- overall risk, diversification, mitigation, monitoring and rebalancing\n\n\
             Mention every portfolio company by its exact name. Return only the Markdown report.\n",
        );
        prompt.push_str(language.prompt_instruction());
        prompt.push('\n');
        prompt
    }
}
