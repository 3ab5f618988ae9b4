use crate::config::Config;
use crate::error::{ParseFailure, PlannerError, StageFailure};
use crate::generator::context::GeneratorContext;
use crate::generator::parse::{
    parse_portfolio, parse_rationale, parse_report, parse_research, report_headings,
};
use crate::generator::prompts::PromptBuilder;
use crate::generator::state::{Allocated, Reasoned, Requested, Researched};
use crate::generator::types::{
    InvestmentPlanResult, PlanRequest, ResearchResult, RiskLevel, Stage,
};

use chrono::{Datelike, Utc};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

/// 分配总额偏离投资金额超过该比例时记录警告
pub const ALLOCATION_DRIFT_TOLERANCE: f64 = 0.01;

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: HashMap<Stage, Instant>,
    phase_durations: Vec<(Stage, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: HashMap::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, stage: Stage) {
        self.phase_start_times.insert(stage, Instant::now());
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, stage: Stage) -> Option<Duration> {
        let start_time = self.phase_start_times.remove(&stage)?;
        let duration = start_time.elapsed();
        self.phase_durations.push((stage, duration));
        Some(duration)
    }

    /// 获取总执行时间
    pub fn total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 获取所有阶段的执行时间，按完成顺序
    pub fn phase_durations(&self) -> &[(Stage, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告，阶段按执行顺序排列
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "total {:.2}s",
            self.total_duration().as_secs_f64()
        );
        for stage in Stage::ALL {
            if let Some((_, duration)) = self.phase_durations.iter().find(|(s, _)| *s == stage) {
                report.push_str(&format!(", {} {:.2}s", stage, duration.as_secs_f64()));
            }
        }
        report
    }
}

/// 四阶段投资规划工作流
pub struct InvestmentWorkflow {
    context: GeneratorContext,
}

impl InvestmentWorkflow {
    pub fn new(context: GeneratorContext) -> Self {
        Self { context }
    }

    /// 依次执行 Research → Allocate → Rationale → Format
    ///
    /// 请求无效时在任何网络调用之前返回配置错误；任一阶段失败时立即中止并返回该阶段。
    pub async fn run(&self, request: PlanRequest) -> Result<InvestmentPlanResult, PlannerError> {
        request.validate()?;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "investment_plan",
            %run_id,
            risk_level = %request.risk_level(),
            industry = request.industry().unwrap_or("-"),
        );

        async move {
            tracing::info!(
                amount = request.investment_amount(),
                time_horizon = request.time_horizon(),
                "starting investment planning workflow"
            );
            let mut timing = TimingScope::new();

            timing.start_phase(Stage::Research);
            let researched = self.research(Requested::new(request)).await?;
            timing.end_phase(Stage::Research);

            timing.start_phase(Stage::Allocate);
            let allocated = self.allocate(researched).await?;
            timing.end_phase(Stage::Allocate);

            timing.start_phase(Stage::Rationale);
            let reasoned = self.rationale(allocated).await?;
            timing.end_phase(Stage::Rationale);

            timing.start_phase(Stage::Format);
            let report = self.format(&reasoned).await?;
            timing.end_phase(Stage::Format);

            tracing::info!(timing = %timing.generate_timing_report(), "investment plan completed");
            Ok::<_, PlannerError>(reasoned.with_report(run_id, Utc::now(), report))
        }
        .instrument(span)
        .await
    }

    /// 以原始输入执行工作流，输入无效时不发起任何调用
    pub async fn plan(
        &self,
        risk_level: RiskLevel,
        industry: Option<String>,
        investment_amount: f64,
        time_horizon: &str,
    ) -> Result<InvestmentPlanResult, PlannerError> {
        let request = PlanRequest::new(risk_level, industry, investment_amount, time_horizon)?;
        self.run(request).await
    }

    /// 调用模型，空回复视为解析失败
    async fn call_llm(&self, stage: Stage, prompt: &str) -> Result<String, StageFailure> {
        tracing::debug!(%stage, prompt_chars = prompt.len(), "calling model");
        let text = self
            .context
            .llm_client
            .generate(prompt)
            .await
            .map_err(|e| StageFailure::new(stage, e))?;

        if text.trim().is_empty() {
            return Err(StageFailure::new(stage, ParseFailure::EmptyResponse));
        }
        Ok(text)
    }

    /// Research：搜索失败或无结果时降级为无外部数据标记，不调用模型
    async fn research(&self, state: Requested) -> Result<Researched, StageFailure> {
        tracing::info!("step 1: researching companies");
        let query = PromptBuilder::search_query(&state.request, Utc::now().year());

        let hits = match self.context.search_tool.search(&query).await {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => {
                tracing::warn!(query = %query, "search returned no results, continuing without external data");
                return Ok(state.with_research(ResearchResult::no_external_data(
                    "search returned no results",
                )));
            }
            Err(failure) => {
                tracing::warn!(query = %query, error = %failure, "search failed, continuing without external data");
                return Ok(state.with_research(ResearchResult::no_external_data(
                    failure.to_string(),
                )));
            }
        };

        let prompt = PromptBuilder::research(&state.request, &query, &hits);
        let text = self.call_llm(Stage::Research, &prompt).await?;
        let companies =
            parse_research(&text).map_err(|e| StageFailure::new(Stage::Research, e))?;

        tracing::info!(companies = companies.len(), "research completed");
        Ok(state.with_research(ResearchResult::Companies { companies }))
    }

    /// Allocate：分配总额不做修正，只在偏差过大时告警
    async fn allocate(&self, state: Researched) -> Result<Allocated, StageFailure> {
        tracing::info!("step 2: building portfolio plan");
        let prompt = PromptBuilder::allocate(&state.request, &state.research);
        let text = self.call_llm(Stage::Allocate, &prompt).await?;

        let amount = state.request.investment_amount();
        let portfolio =
            parse_portfolio(&text, amount).map_err(|e| StageFailure::new(Stage::Allocate, e))?;

        let drift = portfolio.drift(amount);
        if drift.abs() > ALLOCATION_DRIFT_TOLERANCE {
            tracing::warn!(
                allocated = portfolio.total_amount(),
                requested = amount,
                drift_pct = drift * 100.0,
                "portfolio allocations do not add up to the investment amount"
            );
        }

        tracing::info!(positions = portfolio.len(), "portfolio plan created");
        Ok(state.with_portfolio(portfolio))
    }

    async fn rationale(&self, state: Allocated) -> Result<Reasoned, StageFailure> {
        tracing::info!("step 3: generating investment rationale");
        let prompt = PromptBuilder::rationale(&state.request, &state.research, &state.portfolio);
        let text = self.call_llm(Stage::Rationale, &prompt).await?;
        let rationale =
            parse_rationale(&text).map_err(|e| StageFailure::new(Stage::Rationale, e))?;

        for allocation in &state.portfolio.allocations {
            if rationale.get(&allocation.company).is_none() {
                tracing::debug!(company = %allocation.company, "no rationale returned for company");
            }
        }

        tracing::info!(entries = rationale.len(), "investment rationale generated");
        Ok(state.with_rationale(rationale))
    }

    async fn format(&self, state: &Reasoned) -> Result<String, StageFailure> {
        tracing::info!("step 4: formatting final report");
        let prompt = PromptBuilder::format(
            &state.request,
            &state.research,
            &state.portfolio,
            &state.rationale,
            &self.context.config.target_language,
        );
        let text = self.call_llm(Stage::Format, &prompt).await?;
        let report = parse_report(&text).map_err(|e| StageFailure::new(Stage::Format, e))?;

        tracing::debug!(sections = ?report_headings(&report), "report sections");
        let missing: Vec<&str> = state
            .portfolio
            .allocations
            .iter()
            .map(|a| a.company.as_str())
            .filter(|company| !report.contains(company))
            .collect();
        if !missing.is_empty() {
            tracing::warn!(?missing, "report does not mention every portfolio company");
        }

        Ok(report)
    }
}

/// 使用配置构建真实客户端并执行一次完整的工作流
pub async fn launch(
    config: &Config,
    request: PlanRequest,
) -> Result<InvestmentPlanResult, PlannerError> {
    request.validate()?;
    let context = GeneratorContext::new(config.clone())?;
    InvestmentWorkflow::new(context).run(request).await
}

/// 以原始输入创建投资计划
pub async fn create_investment_plan(
    config: &Config,
    risk_level: &str,
    industry: Option<String>,
    investment_amount: f64,
    time_horizon: &str,
) -> Result<InvestmentPlanResult, PlannerError> {
    let request = PlanRequest::parse(risk_level, industry, investment_amount, time_horizon)?;
    launch(config, request).await
}

// Include tests
#[cfg(test)]
mod tests;
