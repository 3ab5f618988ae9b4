#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use httpmock::prelude::*;

    use crate::config::Config;
    use crate::error::{ConfigError, LlmFailure, ParseFailure, PlannerError, StageCause, ToolFailure};
    use crate::generator::context::GeneratorContext;
    use crate::generator::types::{PlanRequest, ResearchResult, RiskLevel, Stage};
    use crate::generator::workflow::{InvestmentWorkflow, TimingScope, launch};
    use crate::llm::client::{LLMClient, TextGenerator};
    use crate::llm::tools::web_search::{SearchHit, SearchTool};

    const COMPANIES: [&str; 5] = [
        "Apple Inc.",
        "Microsoft Corporation",
        "NVIDIA Corporation",
        "Alphabet Inc.",
        "Amazon.com Inc.",
    ];

    /// 按顺序返回预设回复，记录收到的prompt
    struct ScriptedLlm {
        responses: Mutex<Vec<Result<String, LlmFailure>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(responses: Vec<Result<String, LlmFailure>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        fn prompt(&self, index: usize) -> String {
            self.prompts.lock().unwrap()[index].clone()
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedLlm {
        async fn generate(&self, prompt: &str) -> Result<String, LlmFailure> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(LlmFailure::new("no scripted response left")))
        }
    }

    struct StubSearch {
        result: Result<Vec<SearchHit>, ToolFailure>,
        calls: AtomicUsize,
    }

    impl StubSearch {
        fn new(result: Result<Vec<SearchHit>, ToolFailure>) -> Arc<Self> {
            Arc::new(Self {
                result,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SearchTool for StubSearch {
        async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, ToolFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn ten_hits() -> Vec<SearchHit> {
        (1..=10)
            .map(|i| SearchHit {
                title: format!("Big tech pick #{}", i),
                link: format!("https://example.com/{}", i),
                snippet: format!("{} looks strong", COMPANIES[i % COMPANIES.len()]),
            })
            .collect()
    }

    fn research_json() -> String {
        let companies: Vec<String> = COMPANIES
            .iter()
            .map(|name| {
                format!(
                    r#"{{"name": "{}", "risk_factor": "Medium", "explanation": "Market leader"}}"#,
                    name
                )
            })
            .collect();
        format!(
            "Here is the analysis:\n```json\n{{\"companies\": [{}]}}\n```",
            companies.join(", ")
        )
    }

    fn allocation_json() -> String {
        let allocations: Vec<String> = COMPANIES
            .iter()
            .map(|name| {
                format!(
                    r#"{{"company_name": "{}", "allocation_percentage": 20.0, "allocation_amount": 20000.0, "holding_period": "12 months", "justification": "Equal weight"}}"#,
                    name
                )
            })
            .collect();
        format!(
            "{{\"allocations\": [{}], \"strategy_summary\": \"Balanced big tech basket\"}}",
            allocations.join(", ")
        )
    }

    fn rationale_json() -> String {
        let rationales: Vec<String> = COMPANIES
            .iter()
            .map(|name| {
                format!(
                    r#"{{"company_name": "{}", "rationale": "{} has durable cash flows."}}"#,
                    name, name
                )
            })
            .collect();
        format!("{{\"rationales\": [{}]}}", rationales.join(", "))
    }

    fn report_markdown() -> String {
        let mut report = String::from(
            "# Investment Plan\n\n## Executive Summary\nBalanced exposure to large technology companies.\n\n## Portfolio Allocation\n| Company | Allocation | Amount |\n|---|---|---|\n",
        );
        for name in COMPANIES {
            report.push_str(&format!("| {} | 20% | $20,000.00 |\n", name));
        }
        report.push_str("\n## Detailed Investment Analysis\n");
        for name in COMPANIES {
            report.push_str(&format!("### {}\nSolid fundamentals.\n\n", name));
        }
        report.push_str("## Risk Management\nRebalance quarterly.\n");
        report
    }

    fn happy_responses() -> Vec<Result<String, LlmFailure>> {
        vec![
            Ok(research_json()),
            Ok(allocation_json()),
            Ok(rationale_json()),
            Ok(report_markdown()),
        ]
    }

    fn big_tech_request() -> PlanRequest {
        PlanRequest::new(
            RiskLevel::Medium,
            Some("Big tech".to_string()),
            100_000.0,
            "1 year",
        )
        .unwrap()
    }

    fn workflow(llm: Arc<ScriptedLlm>, search: Arc<StubSearch>) -> InvestmentWorkflow {
        InvestmentWorkflow::new(GeneratorContext::with_clients(
            Config::default(),
            llm,
            search,
        ))
    }

    #[tokio::test]
    async fn test_full_run_produces_plan() {
        let llm = ScriptedLlm::new(happy_responses());
        let search = StubSearch::new(Ok(ten_hits()));

        let result = workflow(llm.clone(), search.clone())
            .run(big_tech_request())
            .await
            .unwrap();

        assert_eq!(search.calls(), 1);
        assert_eq!(llm.calls(), 4);
        assert_eq!(result.research_results.companies().len(), 5);
        assert_eq!(result.portfolio_plan.len(), 5);
        assert!((result.portfolio_plan.total_amount() - 100_000.0).abs() < 1e-6);
        assert_eq!(result.rationale.len(), 5);
        for name in COMPANIES {
            assert!(result.investment_plan.contains(name), "missing {}", name);
        }
        assert_eq!(result.request, big_tech_request());
    }

    #[tokio::test]
    async fn test_prompts_flow_between_stages() {
        let llm = ScriptedLlm::new(happy_responses());
        let search = StubSearch::new(Ok(ten_hits()));

        workflow(llm.clone(), search)
            .run(big_tech_request())
            .await
            .unwrap();

        assert!(llm.prompt(0).contains("10. Big tech pick #10"));
        assert!(llm.prompt(1).contains("- Apple Inc.: Market leader (Risk: Medium)"));
        assert!(llm.prompt(2).contains("Strategy: Balanced big tech basket"));
        assert!(llm.prompt(3).contains("### NVIDIA Corporation\nNVIDIA Corporation has durable cash flows."));
        assert!(llm.prompt(3).contains("## Risk Management"));
    }

    #[tokio::test]
    async fn test_search_failure_degrades_without_research_call() {
        let llm = ScriptedLlm::new(vec![
            Ok(allocation_json()),
            Ok(rationale_json()),
            Ok(report_markdown()),
        ]);
        let search = StubSearch::new(Err(ToolFailure::new("connection refused")));

        let result = workflow(llm.clone(), search.clone())
            .run(big_tech_request())
            .await
            .unwrap();

        assert_eq!(search.calls(), 1);
        assert_eq!(llm.calls(), 3);
        assert!(result.research_results.is_degraded());
        for index in 0..3 {
            assert!(
                llm.prompt(index)
                    .contains(ResearchResult::NO_EXTERNAL_DATA_MARKER),
                "prompt {} lacks marker",
                index
            );
        }
        assert!(llm.prompt(0).contains("connection refused"));
    }

    #[tokio::test]
    async fn test_empty_search_results_degrade() {
        let llm = ScriptedLlm::new(vec![
            Ok(allocation_json()),
            Ok(rationale_json()),
            Ok(report_markdown()),
        ]);
        let search = StubSearch::new(Ok(Vec::new()));

        let result = workflow(llm.clone(), search)
            .run(big_tech_request())
            .await
            .unwrap();

        assert_eq!(llm.calls(), 3);
        assert_eq!(
            result.research_results,
            ResearchResult::no_external_data("search returned no results")
        );
    }

    #[tokio::test]
    async fn test_allocate_failure_stops_workflow() {
        let llm = ScriptedLlm::new(vec![
            Ok(research_json()),
            Err(LlmFailure::with_status(503, "service unavailable")),
            Ok(rationale_json()),
            Ok(report_markdown()),
        ]);
        let search = StubSearch::new(Ok(ten_hits()));

        let err = workflow(llm.clone(), search)
            .run(big_tech_request())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Allocate));
        assert_eq!(llm.calls(), 2);
        match err {
            PlannerError::Stage(failure) => {
                assert_eq!(
                    failure.cause,
                    StageCause::Llm(LlmFailure::with_status(503, "service unavailable"))
                );
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_amount_makes_no_calls() {
        let llm = ScriptedLlm::new(happy_responses());
        let search = StubSearch::new(Ok(ten_hits()));

        let flow = workflow(llm.clone(), search.clone());
        let err = flow
            .plan(RiskLevel::Medium, None, 0.0, "1 year")
            .await
            .unwrap_err();
        assert_eq!(err, PlannerError::Config(ConfigError::InvalidAmount(0.0)));

        let err = flow
            .plan(RiskLevel::Low, None, 5_000.0, "  ")
            .await
            .unwrap_err();
        assert_eq!(err, PlannerError::Config(ConfigError::EmptyTimeHorizon));

        assert_eq!(llm.calls(), 0);
        assert_eq!(search.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_response_is_stage_failure() {
        let llm = ScriptedLlm::new(vec![Ok(research_json()), Ok("   \n".to_string())]);
        let search = StubSearch::new(Ok(ten_hits()));

        let err = workflow(llm.clone(), search)
            .run(big_tech_request())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PlannerError::Stage(crate::error::StageFailure::new(
                Stage::Allocate,
                ParseFailure::EmptyResponse
            ))
        );
    }

    #[tokio::test]
    async fn test_empty_research_list_fails_research_stage() {
        let llm = ScriptedLlm::new(vec![Ok(r#"{"companies": []}"#.to_string())]);
        let search = StubSearch::new(Ok(ten_hits()));

        let err = workflow(llm.clone(), search)
            .run(big_tech_request())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Research));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_format_failure_reports_format_stage() {
        let llm = ScriptedLlm::new(vec![
            Ok(research_json()),
            Ok(allocation_json()),
            Ok(rationale_json()),
            Ok("```markdown\n```".to_string()),
        ]);
        let search = StubSearch::new(Ok(ten_hits()));

        let err = workflow(llm.clone(), search)
            .run(big_tech_request())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Format));
        assert_eq!(llm.calls(), 4);
    }

    #[tokio::test]
    async fn test_unbalanced_allocation_is_kept() {
        let llm = ScriptedLlm::new(vec![
            Ok(research_json()),
            Ok(r#"{"allocations": [{"company_name": "Apple Inc.", "allocation_percentage": 50.0}]}"#
                .to_string()),
            Ok(rationale_json()),
            Ok(report_markdown()),
        ]);
        let search = StubSearch::new(Ok(ten_hits()));

        let result = workflow(llm, search).run(big_tech_request()).await.unwrap();

        assert_eq!(result.portfolio_plan.len(), 1);
        assert!((result.portfolio_plan.total_amount() - 50_000.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_launch_rejects_missing_secrets() {
        let err = launch(&Config::default(), big_tech_request())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PlannerError::Config(ConfigError::MissingSecret(_))
        ));
    }

    #[tokio::test]
    async fn test_prose_with_braces_around_json_is_accepted() {
        let llm = ScriptedLlm::new(vec![
            Ok(format!(
                "Sure {{see below}}:\n{}\nNote: weights {{approx}}.",
                research_json().replace("```json", "").replace("```", "")
            )),
            Ok(format!("{}\nAll figures in USD {{rounded}}.", allocation_json())),
            Ok(format!("Rationale {{draft}}: {}", rationale_json())),
            Ok(report_markdown()),
        ]);
        let search = StubSearch::new(Ok(ten_hits()));

        let result = workflow(llm, search).run(big_tech_request()).await.unwrap();

        assert_eq!(result.research_results.companies().len(), 5);
        assert_eq!(result.portfolio_plan.len(), 5);
        assert_eq!(result.rationale.len(), 5);
    }

    #[tokio::test]
    async fn test_llm_http_status_reaches_stage_failure() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(401)
                    .header("content-type", "application/json")
                    .json_body(serde_json::json!({
                        "error": {"message": "invalid api key", "type": "invalid_request_error"}
                    }));
            })
            .await;

        let mut config = Config::default();
        config.llm.api_key = "bad-key".to_string();
        config.llm.api_base_url = server.base_url();
        let llm = Arc::new(LLMClient::new(&config.llm).unwrap());
        let search = StubSearch::new(Err(ToolFailure::new("offline")));
        let flow = InvestmentWorkflow::new(GeneratorContext::with_clients(config, llm, search));

        let err = flow.run(big_tech_request()).await.unwrap_err();

        match err {
            PlannerError::Stage(failure) => {
                assert_eq!(failure.stage, Stage::Allocate);
                match failure.cause {
                    StageCause::Llm(llm_failure) => assert_eq!(llm_failure.status, Some(401)),
                    other => panic!("unexpected cause: {:?}", other),
                }
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_report_without_headings_fails_format_stage() {
        let llm = ScriptedLlm::new(vec![
            Ok(research_json()),
            Ok(allocation_json()),
            Ok(rationale_json()),
            Ok("Sorry, I cannot produce that report.".to_string()),
        ]);
        let search = StubSearch::new(Ok(ten_hits()));

        let err = workflow(llm, search)
            .run(big_tech_request())
            .await
            .unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Format));
        assert!(matches!(
            err,
            PlannerError::Stage(crate::error::StageFailure {
                cause: StageCause::Parse(ParseFailure::InvalidMarkdown(_)),
                ..
            })
        ));
    }

    #[test]
    fn test_timing_scope_records_phases() {
        let mut timing = TimingScope::new();
        timing.start_phase(Stage::Research);
        assert!(timing.end_phase(Stage::Research).is_some());
        assert!(timing.end_phase(Stage::Allocate).is_none());

        assert_eq!(timing.phase_durations().len(), 1);
        assert!(timing.generate_timing_report().contains("Research"));
    }

    #[test]
    fn test_timing_report_follows_stage_order() {
        let mut timing = TimingScope::new();
        timing.start_phase(Stage::Format);
        timing.start_phase(Stage::Research);
        timing.end_phase(Stage::Format);
        timing.end_phase(Stage::Research);

        let report = timing.generate_timing_report();
        let research = report.find("Research").unwrap();
        let format = report.find("Format").unwrap();
        assert!(research < format);
        assert!(!report.contains("Allocate"));
    }
}
