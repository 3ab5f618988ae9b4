use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfigError;

/// 工作流阶段，按固定顺序执行
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Research,
    Allocate,
    Rationale,
    Format,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::Research,
        Stage::Allocate,
        Stage::Rationale,
        Stage::Format,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Research => "Research",
            Stage::Allocate => "Allocate",
            Stage::Rationale => "Rationale",
            Stage::Format => "Format",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 投资者风险偏好
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "Low"),
            RiskLevel::Medium => write!(f, "Medium"),
            RiskLevel::High => write!(f, "High"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "1" => Ok(RiskLevel::Low),
            "medium" | "2" => Ok(RiskLevel::Medium),
            "high" | "3" => Ok(RiskLevel::High),
            _ => Err(ConfigError::InvalidRiskLevel(s.to_string())),
        }
    }
}

/// 用户的投资请求，构造时完成校验
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanRequest {
    risk_level: RiskLevel,
    industry: Option<String>,
    investment_amount: f64,
    time_horizon: String,
}

impl PlanRequest {
    pub fn new(
        risk_level: RiskLevel,
        industry: Option<String>,
        investment_amount: f64,
        time_horizon: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let request = Self {
            risk_level,
            industry: industry
                .map(|i| i.trim().to_string())
                .filter(|i| !i.is_empty()),
            investment_amount,
            time_horizon: time_horizon.into().trim().to_string(),
        };
        request.validate()?;
        Ok(request)
    }

    /// 以字符串形式的风险等级构造请求
    pub fn parse(
        risk_level: &str,
        industry: Option<String>,
        investment_amount: f64,
        time_horizon: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Self::new(
            risk_level.parse()?,
            industry,
            investment_amount,
            time_horizon,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.investment_amount.is_finite() || self.investment_amount <= 0.0 {
            return Err(ConfigError::InvalidAmount(self.investment_amount));
        }
        if self.time_horizon.trim().is_empty() {
            return Err(ConfigError::EmptyTimeHorizon);
        }
        Ok(())
    }

    pub fn risk_level(&self) -> RiskLevel {
        self.risk_level
    }

    pub fn industry(&self) -> Option<&str> {
        self.industry.as_deref()
    }

    pub fn investment_amount(&self) -> f64 {
        self.investment_amount
    }

    pub fn time_horizon(&self) -> &str {
        &self.time_horizon
    }
}

/// 调研得到的候选公司
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyResearch {
    pub name: String,
    pub rationale: String,
    pub risk_note: String,
}

/// 第一阶段的调研结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResearchResult {
    Companies { companies: Vec<CompanyResearch> },
    /// 搜索不可用时的降级标记
    NoExternalData { reason: String },
}

impl ResearchResult {
    pub const NO_EXTERNAL_DATA_MARKER: &'static str = "[NO EXTERNAL DATA]";

    pub fn no_external_data(reason: impl Into<String>) -> Self {
        ResearchResult::NoExternalData {
            reason: reason.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, ResearchResult::NoExternalData { .. })
    }

    pub fn companies(&self) -> &[CompanyResearch] {
        match self {
            ResearchResult::Companies { companies } => companies,
            ResearchResult::NoExternalData { .. } => &[],
        }
    }

    pub fn find(&self, name: &str) -> Option<&CompanyResearch> {
        self.companies()
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// 单个公司的资金分配
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub company: String,
    pub percentage: f64,
    pub amount: f64,
    pub holding_period: Option<String>,
    pub justification: String,
}

/// 第二阶段的投资组合方案
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioPlan {
    pub allocations: Vec<Allocation>,
    pub strategy_summary: String,
}

impl PortfolioPlan {
    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }

    pub fn get(&self, company: &str) -> Option<&Allocation> {
        self.allocations
            .iter()
            .find(|a| a.company.eq_ignore_ascii_case(company))
    }

    pub fn total_amount(&self) -> f64 {
        self.allocations.iter().map(|a| a.amount).sum()
    }

    pub fn total_percentage(&self) -> f64 {
        self.allocations.iter().map(|a| a.percentage).sum()
    }

    /// 分配总额与投资金额的相对偏差（正数表示超额分配）
    pub fn drift(&self, investment_amount: f64) -> f64 {
        (self.total_amount() - investment_amount) / investment_amount
    }
}

/// 单个公司的投资理由
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyRationale {
    pub company: String,
    pub rationale: String,
}

/// 第三阶段的投资理由集合
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RationaleSet {
    pub entries: Vec<CompanyRationale>,
}

impl RationaleSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, company: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.company.eq_ignore_ascii_case(company))
            .map(|e| e.rationale.as_str())
    }
}

/// 工作流的最终产物，返回后归调用方所有
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentPlanResult {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub request: PlanRequest,
    pub research_results: ResearchResult,
    pub portfolio_plan: PortfolioPlan,
    pub rationale: RationaleSet,
    pub investment_plan: String,
}
