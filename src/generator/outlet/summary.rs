use crate::generator::prompts::format_currency;
use crate::generator::types::InvestmentPlanResult;

/// Summary生成模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryMode {
    /// 完整模式 - 包含请求参数、持仓明细和调研状态
    #[default]
    Full,
    /// 摘要模式 - 只包含持仓明细与合计
    Brief,
}

/// 生成终端展示用的组合摘要
pub fn render_summary(result: &InvestmentPlanResult, mode: SummaryMode) -> String {
    let mut content = String::new();

    if mode == SummaryMode::Full {
        let request = &result.request;
        content.push_str(&format!(
            "Investment Plan {} ({})\n",
            result.run_id,
            result.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        content.push_str(&format!("Risk Level: {}\n", request.risk_level()));
        content.push_str(&format!(
            "Industry: {}\n",
            request.industry().unwrap_or("Any")
        ));
        content.push_str(&format!(
            "Amount: {}\n",
            format_currency(request.investment_amount())
        ));
        content.push_str(&format!("Time Horizon: {}\n", request.time_horizon()));
        if result.research_results.is_degraded() {
            content.push_str("Research: no external data, plan relies on general market knowledge\n");
        } else {
            content.push_str(&format!(
                "Research: {} companies identified\n",
                result.research_results.companies().len()
            ));
        }
        content.push('\n');
    }

    let plan = &result.portfolio_plan;
    let name_width = plan
        .allocations
        .iter()
        .map(|a| a.company.chars().count())
        .max()
        .unwrap_or(0)
        .max("Company".len());

    content.push_str(&format!(
        "{:<width$}  {:>7}  {:>16}\n",
        "Company",
        "Share",
        "Amount",
        width = name_width
    ));
    for allocation in &plan.allocations {
        content.push_str(&format!(
            "{:<width$}  {:>6.1}%  {:>16}\n",
            allocation.company,
            allocation.percentage,
            format_currency(allocation.amount),
            width = name_width
        ));
    }
    content.push_str(&format!(
        "{:<width$}  {:>6.1}%  {:>16}\n",
        "Total",
        plan.total_percentage(),
        format_currency(plan.total_amount()),
        width = name_width
    ));

    content
}
