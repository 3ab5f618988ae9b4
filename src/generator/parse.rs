//! 模型输出的防御性解析，结构不符时转换为ParseFailure

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::ParseFailure;
use crate::generator::schema::{PortfolioDraft, RationaleReport, ResearchReport};
use crate::generator::types::{
    Allocation, CompanyRationale, CompanyResearch, PortfolioPlan, RationaleSet,
};

static FENCED_JSON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json|JSON)?\s*(\{.*?\})\s*```").expect("valid fenced json regex")
});

static FENCED_MARKDOWN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```(?:markdown|md)?\s*\n(.*?)\n?```$").expect("valid fenced markdown regex")
});

/// 从模型回复中截取第一个JSON对象
pub fn extract_json_block(text: &str) -> Result<&str, ParseFailure> {
    if text.trim().is_empty() {
        return Err(ParseFailure::EmptyResponse);
    }

    if let Some(captures) = FENCED_JSON.captures(text)
        && let Some(block) = captures.get(1)
    {
        return Ok(block.as_str());
    }

    first_json_object(text).ok_or(ParseFailure::MissingJson)
}

/// 依次尝试每个 `{`，返回第一个能完整解析的JSON对象
fn first_json_object(text: &str) -> Option<&str> {
    text.char_indices()
        .filter(|(_, ch)| *ch == '{')
        .find_map(|(start, _)| {
            let candidate = &text[start..];
            let mut stream =
                serde_json::Deserializer::from_str(candidate).into_iter::<serde_json::Value>();
            match stream.next() {
                Some(Ok(serde_json::Value::Object(_))) => {
                    Some(&candidate[..stream.byte_offset()])
                }
                _ => None,
            }
        })
}

fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ParseFailure> {
    let block = extract_json_block(text)?;
    serde_json::from_str(block).map_err(|e| ParseFailure::Schema(e.to_string()))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// 解析Research阶段的候选公司列表，要求非空
pub fn parse_research(text: &str) -> Result<Vec<CompanyResearch>, ParseFailure> {
    let report: ResearchReport = parse_json(text)?;

    let companies: Vec<CompanyResearch> = report
        .companies
        .into_iter()
        .filter(|c| !c.name.trim().is_empty())
        .map(|c| CompanyResearch {
            name: c.name.trim().to_string(),
            rationale: c.explanation.trim().to_string(),
            risk_note: c.risk_factor.trim().to_string(),
        })
        .collect();

    if companies.is_empty() {
        return Err(ParseFailure::MissingField("companies".to_string()));
    }
    Ok(companies)
}

/// 解析Allocate阶段的组合方案
///
/// 比例与金额只给出其一时按投资金额补全另一个；公司名必须唯一，数值不得为负。
pub fn parse_portfolio(text: &str, investment_amount: f64) -> Result<PortfolioPlan, ParseFailure> {
    let draft: PortfolioDraft = parse_json(text)?;

    let mut seen = HashSet::new();
    let mut allocations = Vec::with_capacity(draft.allocations.len());

    for (index, entry) in draft.allocations.into_iter().enumerate() {
        let company = entry.company_name.trim().to_string();
        if company.is_empty() {
            return Err(ParseFailure::MissingField(format!(
                "allocations[{}].company_name",
                index
            )));
        }
        if !seen.insert(company.to_lowercase()) {
            return Err(ParseFailure::Schema(format!(
                "duplicate allocation for {}",
                company
            )));
        }

        let (percentage, amount) = match (entry.allocation_percentage, entry.allocation_amount) {
            (Some(p), Some(a)) => (p, a),
            (Some(p), None) => (p, p * investment_amount / 100.0),
            (None, Some(a)) => (a * 100.0 / investment_amount, a),
            (None, None) => {
                return Err(ParseFailure::MissingField(format!(
                    "allocations[{}] needs allocation_percentage or allocation_amount",
                    index
                )));
            }
        };
        if !percentage.is_finite() || !amount.is_finite() || percentage < 0.0 || amount < 0.0 {
            return Err(ParseFailure::Schema(format!(
                "allocation for {} must be a non-negative number",
                company
            )));
        }

        allocations.push(Allocation {
            company,
            percentage,
            amount,
            holding_period: non_blank(entry.holding_period),
            justification: non_blank(entry.justification).unwrap_or_default(),
        });
    }

    if allocations.is_empty() {
        return Err(ParseFailure::MissingField("allocations".to_string()));
    }

    Ok(PortfolioPlan {
        allocations,
        strategy_summary: non_blank(draft.strategy_summary).unwrap_or_default(),
    })
}

/// 解析Rationale阶段的理由集合，要求非空
pub fn parse_rationale(text: &str) -> Result<RationaleSet, ParseFailure> {
    let report: RationaleReport = parse_json(text)?;

    let entries: Vec<CompanyRationale> = report
        .rationales
        .into_iter()
        .filter(|r| !r.company_name.trim().is_empty() && !r.rationale.trim().is_empty())
        .map(|r| CompanyRationale {
            company: r.company_name.trim().to_string(),
            rationale: r.rationale.trim().to_string(),
        })
        .collect();

    if entries.is_empty() {
        return Err(ParseFailure::MissingField("rationales".to_string()));
    }
    Ok(RationaleSet { entries })
}

/// 校验Format阶段的Markdown报告，去掉包裹整篇报告的代码围栏
///
/// 报告至少要有一个标题，否则视为模型没有按要求的结构输出。
pub fn parse_report(text: &str) -> Result<String, ParseFailure> {
    let trimmed = text.trim();
    let report = match FENCED_MARKDOWN.captures(trimmed).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    };

    if report.is_empty() {
        return Err(ParseFailure::EmptyResponse);
    }

    let root = markdown::to_mdast(report, &markdown::ParseOptions::default())
        .map_err(|e| ParseFailure::InvalidMarkdown(e.to_string()))?;
    if headings(&root).is_empty() {
        return Err(ParseFailure::InvalidMarkdown(
            "report has no section headings".to_string(),
        ));
    }

    Ok(report.to_string())
}

fn headings(root: &markdown::mdast::Node) -> Vec<String> {
    root.children()
        .map(|children| {
            children
                .iter()
                .filter(|node| matches!(node, markdown::mdast::Node::Heading(_)))
                .map(|node| node.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// 列出报告中的标题文本
pub fn report_headings(report: &str) -> Vec<String> {
    markdown::to_mdast(report, &markdown::ParseOptions::default())
        .map(|root| headings(&root))
        .unwrap_or_default()
}
