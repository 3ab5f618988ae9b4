//! 各阶段期望模型返回的JSON结构

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Research阶段：候选公司
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CompanyCandidate {
    /// Full legal company name
    pub name: String,
    /// Risk factor: Low, Medium or High
    pub risk_factor: String,
    /// Why this company suits the investor profile
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ResearchReport {
    pub companies: Vec<CompanyCandidate>,
}

/// Allocate阶段：单个公司的分配，比例与金额至少给出一个
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct AllocationDraft {
    pub company_name: String,
    /// Share of the total investment, 0-100
    pub allocation_percentage: Option<f64>,
    /// Dollar amount allocated to this company
    pub allocation_amount: Option<f64>,
    /// Suggested holding period, e.g. "6-12 months"
    pub holding_period: Option<String>,
    /// Why this weight was chosen
    pub justification: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PortfolioDraft {
    pub allocations: Vec<AllocationDraft>,
    /// One paragraph describing the overall strategy
    pub strategy_summary: Option<String>,
}

/// Rationale阶段：单个公司的投资理由
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RationaleDraft {
    pub company_name: String,
    pub rationale: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RationaleReport {
    pub rationales: Vec<RationaleDraft>,
}

/// 生成类型的JSON Schema文本，用于嵌入prompt
pub fn schema_text<T: JsonSchema>() -> String {
    let schema = schemars::schema_for!(T);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}
