//! LLM客户端 - 提供统一的文本生成接口

use async_trait::async_trait;
use std::time::Instant;

use crate::config::LLMConfig;
use crate::error::{ConfigError, LlmFailure};

mod providers;

use providers::{ProviderAgent, ProviderClient};

/// 固定的系统提示词
pub const SYSTEM_PREAMBLE: &str = "You are a careful financial planning assistant. Follow the requested output format exactly and never invent data you were not given unless explicitly asked to rely on general market knowledge.";

/// 文本生成接口，工作流只依赖这一抽象
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// 发送prompt并返回模型生成的文本
    async fn generate(&self, prompt: &str) -> Result<String, LlmFailure>;
}

/// LLM客户端，模型与采样参数在构造时确定
pub struct LLMClient {
    agent: ProviderAgent,
    model: String,
    trace_calls: bool,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: &LLMConfig) -> Result<Self, ConfigError> {
        let client = ProviderClient::new(config)
            .map_err(|e| ConfigError::Invalid(format!("failed to build LLM client: {}", e)))?;
        let agent = client.create_agent(SYSTEM_PREAMBLE, config);

        Ok(Self {
            agent,
            model: config.model.clone(),
            trace_calls: config.trace_calls,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for LLMClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmFailure> {
        let started = Instant::now();
        let result = self.agent.prompt(prompt).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(text) => {
                tracing::debug!(
                    model = %self.model,
                    elapsed_ms,
                    prompt_chars = prompt.len(),
                    response_chars = text.len(),
                    "llm call completed"
                );
                if self.trace_calls {
                    tracing::info!(
                        target: "llm_trace",
                        model = %self.model,
                        elapsed_ms,
                        prompt = %prompt,
                        response = %text,
                        "llm call"
                    );
                }
                Ok(text)
            }
            Err(err) => {
                let failure = to_llm_failure(&err);
                tracing::warn!(model = %self.model, elapsed_ms, error = %failure, "llm call failed");
                if self.trace_calls {
                    tracing::info!(
                        target: "llm_trace",
                        model = %self.model,
                        elapsed_ms,
                        prompt = %prompt,
                        error = %failure,
                        "llm call"
                    );
                }
                Err(failure)
            }
        }
    }
}

/// 从错误链中取出HTTP状态码：rig自身的HTTP错误优先，其次是底层的reqwest错误
fn http_status(err: &anyhow::Error) -> Option<u16> {
    err.chain().find_map(|cause| {
        if let Some(http_err) = cause.downcast_ref::<rig::http_client::Error>() {
            return match http_err {
                rig::http_client::Error::InvalidStatusCode(status)
                | rig::http_client::Error::InvalidStatusCodeWithMessage(status, _) => {
                    Some(status.as_u16())
                }
                _ => None,
            };
        }
        cause
            .downcast_ref::<reqwest::Error>()
            .and_then(|e| e.status())
            .map(|s| s.as_u16())
    })
}

/// 将provider错误转换为LlmFailure，能取到HTTP状态码时一并保留
fn to_llm_failure(err: &anyhow::Error) -> LlmFailure {
    let message = format!("{:#}", err);
    match http_status(err) {
        Some(status) => LlmFailure::with_status(status, message),
        None => LlmFailure::new(message),
    }
}
