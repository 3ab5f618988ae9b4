//! 网络搜索工具

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SearchConfig;
use crate::error::{ConfigError, ToolFailure};

/// 单条搜索结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

/// 搜索工具接口
#[async_trait]
pub trait SearchTool: Send + Sync {
    /// 执行一次搜索，按相关性顺序返回至多N条结果
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ToolFailure>;
}

/// SerpAPI响应中我们关心的部分
#[derive(Debug, Deserialize)]
struct SerpApiResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: Option<String>,
    link: Option<String>,
    snippet: Option<String>,
}

/// 基于SerpAPI的搜索工具
pub struct SerpApiSearch {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    engine: String,
    max_results: usize,
}

impl SerpApiSearch {
    pub fn new(config: &SearchConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| ConfigError::Invalid(format!("failed to build search client: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.clone(),
            engine: config.engine.clone(),
            max_results: config.max_results,
        })
    }

    fn to_hits(&self, response: SerpApiResponse) -> Vec<SearchHit> {
        response
            .organic_results
            .into_iter()
            .filter_map(|r| {
                let title = r.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;
                Some(SearchHit {
                    title,
                    link: r.link.unwrap_or_default(),
                    snippet: r.snippet.unwrap_or_default().trim().to_string(),
                })
            })
            .take(self.max_results)
            .collect()
    }
}

#[async_trait]
impl SearchTool for SerpApiSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, ToolFailure> {
        tracing::info!(query, "searching the web");

        let num = self.max_results.to_string();
        let response = self
            .http
            .get(&self.api_base_url)
            .query(&[
                ("engine", self.engine.as_str()),
                ("q", query),
                ("num", num.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ToolFailure::new(format!(
                "search provider returned HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: SerpApiResponse = serde_json::from_str(&body)
            .map_err(|e| ToolFailure::new(format!("unreadable search response: {}", e)))?;
        if let Some(error) = parsed.error {
            return Err(ToolFailure::new(error));
        }

        let hits = self.to_hits(parsed);
        tracing::debug!(hits = hits.len(), "search completed");
        Ok(hits)
    }
}
