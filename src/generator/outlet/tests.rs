#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    use crate::generator::outlet::{
        DiskOutlet, Outlet, REPORT_FILE, RESULT_FILE, SummaryMode, render_summary, save,
    };
    use crate::generator::types::{
        Allocation, CompanyRationale, CompanyResearch, InvestmentPlanResult, PlanRequest,
        PortfolioPlan, RationaleSet, ResearchResult, RiskLevel,
    };

    fn sample_result(research: ResearchResult) -> InvestmentPlanResult {
        InvestmentPlanResult {
            run_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            request: PlanRequest::new(RiskLevel::High, None, 50_000.0, "3 years").unwrap(),
            research_results: research,
            portfolio_plan: PortfolioPlan {
                allocations: vec![
                    Allocation {
                        company: "Tesla, Inc.".to_string(),
                        percentage: 70.0,
                        amount: 35_000.0,
                        holding_period: None,
                        justification: String::new(),
                    },
                    Allocation {
                        company: "AMD".to_string(),
                        percentage: 30.0,
                        amount: 15_000.0,
                        holding_period: Some("2 years".to_string()),
                        justification: String::new(),
                    },
                ],
                strategy_summary: String::new(),
            },
            rationale: RationaleSet {
                entries: vec![CompanyRationale {
                    company: "AMD".to_string(),
                    rationale: "Data center growth".to_string(),
                }],
            },
            investment_plan: "# Plan\n\n## Executive Summary\nGrowth tilt.\n".to_string(),
        }
    }

    fn companies() -> ResearchResult {
        ResearchResult::Companies {
            companies: vec![CompanyResearch {
                name: "AMD".to_string(),
                rationale: "GPUs".to_string(),
                risk_note: "High".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_disk_outlet_writes_report_and_json() {
        let temp_dir = TempDir::new().unwrap();
        let output_dir = temp_dir.path().join("nested").join("out");
        let result = sample_result(companies());

        let written = DiskOutlet::new(&output_dir).save(&result).await.unwrap();

        assert_eq!(written.len(), 2);
        let report = std::fs::read_to_string(output_dir.join(REPORT_FILE)).unwrap();
        assert_eq!(report, result.investment_plan);

        let json = std::fs::read_to_string(output_dir.join(RESULT_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["run_id"], result.run_id.to_string());
        assert_eq!(value["portfolio_plan"]["allocations"][1]["company"], "AMD");
        assert_eq!(value["research_results"]["kind"], "companies");
    }

    #[tokio::test]
    async fn test_save_overwrites_existing_files() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(REPORT_FILE), "old").unwrap();

        save(&sample_result(companies()), temp_dir.path())
            .await
            .unwrap();

        let report = std::fs::read_to_string(temp_dir.path().join(REPORT_FILE)).unwrap();
        assert!(report.starts_with("# Plan"));
    }

    #[test]
    fn test_brief_summary_lists_allocations_and_total() {
        let summary = render_summary(&sample_result(companies()), SummaryMode::Brief);
        let lines: Vec<&str> = summary.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Company"));
        assert!(lines[1].contains("Tesla, Inc.") && lines[1].contains("70.0%"));
        assert!(lines[1].contains("$35,000.00"));
        assert!(lines[3].starts_with("Total") && lines[3].contains("100.0%"));
        assert!(lines[3].contains("$50,000.00"));
    }

    #[test]
    fn test_full_summary_mentions_request_and_degraded_research() {
        let result = sample_result(ResearchResult::no_external_data("timeout"));
        let summary = render_summary(&result, SummaryMode::Full);

        assert!(summary.contains("Risk Level: High"));
        assert!(summary.contains("Industry: Any"));
        assert!(summary.contains("Amount: $50,000.00"));
        assert!(summary.contains("no external data"));
        assert!(summary.contains(&result.run_id.to_string()));
    }
}
