use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::types::InvestmentPlanResult;

pub mod summary;

pub use summary::{SummaryMode, render_summary};

/// 报告文件名
pub const REPORT_FILE: &str = "investment_plan.md";
/// 完整结果文件名
pub const RESULT_FILE: &str = "investment_plan.json";

/// 保存投资计划到输出目录，返回写入的文件
pub async fn save(result: &InvestmentPlanResult, output_dir: &Path) -> Result<Vec<PathBuf>> {
    DiskOutlet::new(output_dir).save(result).await
}

#[async_trait]
pub trait Outlet: Send + Sync {
    async fn save(&self, result: &InvestmentPlanResult) -> Result<Vec<PathBuf>>;
}

pub struct DiskOutlet {
    output_dir: PathBuf,
}

impl DiskOutlet {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl Outlet for DiskOutlet {
    async fn save(&self, result: &InvestmentPlanResult) -> Result<Vec<PathBuf>> {
        // 创建输出目录，已有文件直接覆盖
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.output_dir.display()
            )
        })?;

        let report_path = self.output_dir.join(REPORT_FILE);
        fs::write(&report_path, &result.investment_plan)
            .with_context(|| format!("Failed to write report: {}", report_path.display()))?;
        tracing::info!(path = %report_path.display(), "saved investment plan report");

        let result_path = self.output_dir.join(RESULT_FILE);
        let json = serde_json::to_string_pretty(result).context("Failed to serialize result")?;
        fs::write(&result_path, json)
            .with_context(|| format!("Failed to write result: {}", result_path.display()))?;
        tracing::info!(path = %result_path.display(), "saved full planning result");

        Ok(vec![report_path, result_path])
    }
}

#[cfg(test)]
mod tests;
