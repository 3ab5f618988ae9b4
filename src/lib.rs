pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod i18n;
pub mod llm;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{PlannerError, StageFailure};
pub use generator::types::{InvestmentPlanResult, PlanRequest, RiskLevel, Stage};
pub use generator::workflow::{InvestmentWorkflow, create_investment_plan, launch};
