//! 错误类型 - 配置错误、工具错误、模型错误与解析错误

use thiserror::Error;

use crate::generator::types::Stage;

/// 配置或请求参数无效，在任何网络调用之前抛出
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("missing required secret: {0}")]
    MissingSecret(&'static str),

    #[error("invalid risk level `{0}`, expected one of Low, Medium, High")]
    InvalidRiskLevel(String),

    #[error("investment amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    #[error("time horizon must not be empty")]
    EmptyTimeHorizon,

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// 搜索工具调用失败，由工作流吸收并降级处理
#[derive(Error, Debug, Clone, PartialEq)]
#[error("search tool failed: {message}")]
pub struct ToolFailure {
    pub message: String,
}

impl ToolFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for ToolFailure {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// 模型服务调用失败
#[derive(Error, Debug, Clone, PartialEq)]
pub struct LlmFailure {
    pub status: Option<u16>,
    pub message: String,
}

impl LlmFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for LlmFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) => write!(f, "LLM call failed (HTTP {}): {}", status, self.message),
            None => write!(f, "LLM call failed: {}", self.message),
        }
    }
}

/// 模型输出缺少必要结构
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseFailure {
    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("no JSON object found in model response")]
    MissingJson,

    #[error("model response does not match the expected schema: {0}")]
    Schema(String),

    #[error("model response is missing required content: {0}")]
    MissingField(String),

    #[error("model returned an invalid report: {0}")]
    InvalidMarkdown(String),
}

/// 阶段失败的根因
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageCause {
    #[error(transparent)]
    Llm(#[from] LlmFailure),

    #[error(transparent)]
    Parse(#[from] ParseFailure),
}

/// 某个阶段执行失败
#[derive(Error, Debug, Clone, PartialEq)]
#[error("stage {stage} failed: {cause}")]
pub struct StageFailure {
    pub stage: Stage,
    pub cause: StageCause,
}

impl StageFailure {
    pub fn new(stage: Stage, cause: impl Into<StageCause>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}

/// 工作流对调用方暴露的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Stage(#[from] StageFailure),
}

impl PlannerError {
    /// 失败的阶段（配置错误时为None）
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PlannerError::Config(_) => None,
            PlannerError::Stage(failure) => Some(failure.stage),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;
