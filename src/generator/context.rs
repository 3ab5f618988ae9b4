use std::sync::Arc;

use crate::config::Config;
use crate::error::ConfigError;
use crate::llm::client::{LLMClient, TextGenerator};
use crate::llm::tools::web_search::{SearchTool, SerpApiSearch};

/// 生成器上下文，持有只读配置与共享的外部客户端
#[derive(Clone)]
pub struct GeneratorContext {
    /// LLM调用器，用于与AI通信。
    pub llm_client: Arc<dyn TextGenerator>,
    /// 网络搜索工具
    pub search_tool: Arc<dyn SearchTool>,
    /// 配置
    pub config: Config,
}

impl GeneratorContext {
    /// 创建新的生成器上下文，配置无效时在构建任何客户端之前失败
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let llm_client = Arc::new(LLMClient::new(&config.llm)?);
        let search_tool = Arc::new(SerpApiSearch::new(&config.search)?);

        Ok(Self {
            llm_client,
            search_tool,
            config,
        })
    }

    /// 使用给定的客户端创建上下文
    pub fn with_clients(
        config: Config,
        llm_client: Arc<dyn TextGenerator>,
        search_tool: Arc<dyn SearchTool>,
    ) -> Self {
        Self {
            llm_client,
            search_tool,
            config,
        }
    }
}
