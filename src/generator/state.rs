//! 工作流的累积状态，按值在阶段之间传递
//!
//! 每个阶段消费上一阶段的状态并产出下一阶段的状态，阶段顺序由类型保证。

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::generator::types::{
    InvestmentPlanResult, PlanRequest, PortfolioPlan, RationaleSet, ResearchResult,
};

/// 初始状态：仅有经过校验的请求
#[derive(Debug, Clone)]
pub struct Requested {
    pub request: PlanRequest,
}

/// Research阶段之后
#[derive(Debug, Clone)]
pub struct Researched {
    pub request: PlanRequest,
    pub research: ResearchResult,
}

/// Allocate阶段之后
#[derive(Debug, Clone)]
pub struct Allocated {
    pub request: PlanRequest,
    pub research: ResearchResult,
    pub portfolio: PortfolioPlan,
}

/// Rationale阶段之后
#[derive(Debug, Clone)]
pub struct Reasoned {
    pub request: PlanRequest,
    pub research: ResearchResult,
    pub portfolio: PortfolioPlan,
    pub rationale: RationaleSet,
}

impl Requested {
    pub fn new(request: PlanRequest) -> Self {
        Self { request }
    }

    pub fn with_research(self, research: ResearchResult) -> Researched {
        Researched {
            request: self.request,
            research,
        }
    }
}

impl Researched {
    pub fn with_portfolio(self, portfolio: PortfolioPlan) -> Allocated {
        Allocated {
            request: self.request,
            research: self.research,
            portfolio,
        }
    }
}

impl Allocated {
    pub fn with_rationale(self, rationale: RationaleSet) -> Reasoned {
        Reasoned {
            request: self.request,
            research: self.research,
            portfolio: self.portfolio,
            rationale,
        }
    }
}

impl Reasoned {
    pub fn with_report(
        self,
        run_id: Uuid,
        generated_at: DateTime<Utc>,
        investment_plan: String,
    ) -> InvestmentPlanResult {
        InvestmentPlanResult {
            run_id,
            generated_at,
            request: self.request,
            research_results: self.research,
            portfolio_plan: self.portfolio,
            rationale: self.rationale,
            investment_plan,
        }
    }
}
