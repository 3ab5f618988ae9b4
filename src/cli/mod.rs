use crate::config::{Config, LLMProvider};
use crate::generator::types::RiskLevel;
use crate::i18n::TargetLanguage;
use anyhow::{Result, anyhow};
use clap::Parser;
use std::path::PathBuf;

pub mod interactive;

pub use interactive::{PlanInputs, parse_amount};

/// invest-planner - 由LLM驱动的个性化投资计划生成工具
#[derive(Parser, Debug)]
#[command(name = "invest-planner")]
#[command(
    about = "Builds a personalized investment plan: researches companies on the web, allocates the amount, explains each pick and writes a Markdown report."
)]
#[command(version)]
pub struct Args {
    /// 风险等级 (low, medium, high 或 1-3)
    #[arg(short, long)]
    pub risk_level: Option<RiskLevel>,

    /// 关注的行业，不指定时不限行业
    #[arg(short, long)]
    pub industry: Option<String>,

    /// 投资金额（美元），支持 `$` 与千位分隔符
    #[arg(short, long, value_parser = parse_amount)]
    pub amount: Option<f64>,

    /// 投资期限，如 "1 year"
    #[arg(short = 't', long)]
    pub horizon: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 输出路径，指定后保存报告与完整结果
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// LLM Provider (openai, nvidia, mistral, openrouter, anthropic, deepseek)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 模型标识
    #[arg(long)]
    pub model: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// SerpAPI KEY
    #[arg(long)]
    pub search_api_key: Option<String>,

    /// 保留的搜索结果数量
    #[arg(long)]
    pub search_results: Option<usize>,

    /// 目标语言 (en, zh, ja, ko, de, fr, es)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 记录每次模型调用的prompt与回复
    #[arg(long)]
    pub trace_llm: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// 以JSON格式输出日志
    #[arg(long)]
    pub log_json: bool,
}

impl Args {
    /// 命令行中给出的计划输入，缺失项稍后交互式补全
    pub fn plan_inputs(&self) -> PlanInputs {
        PlanInputs {
            risk_level: self.risk_level,
            industry: self.industry.clone(),
            investment_amount: self.amount,
            time_horizon: self.horizon.clone(),
        }
    }

    /// 将CLI参数转换为配置：默认值 < 配置文件 < 环境变量 < 命令行
    ///
    /// 配置在返回前完成校验，缺少密钥时不会进入交互式输入。
    pub fn into_config(self) -> Result<Config> {
        self.into_validated_config_with(|key| std::env::var(key).ok())
    }

    /// 同 `into_config_with`，并校验结果
    pub fn into_validated_config_with<F>(self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = self.into_config_with(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// 同 `into_config`，环境变量通过给定函数查找
    pub fn into_config_with<F>(self, lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::load(self.config.as_deref())?;
        config.apply_env_with(lookup);

        if let Some(output_path) = self.output_path {
            config.output_path = Some(output_path);
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            config.llm.provider = provider_str
                .parse::<LLMProvider>()
                .map_err(|e| anyhow!(e))?;
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if self.trace_llm {
            config.llm.trace_calls = true;
        }

        // 搜索配置
        if let Some(search_api_key) = self.search_api_key {
            config.search.api_key = search_api_key;
        }
        if let Some(search_results) = self.search_results {
            config.search.max_results = search_results;
        }

        // 目标语言配置
        if let Some(target_language_str) = self.target_language {
            config.target_language = target_language_str
                .parse::<TargetLanguage>()
                .map_err(|e| anyhow!(e))?;
        }

        // 其他配置
        config.verbose |= self.verbose;
        config.log_json |= self.log_json;

        Ok(config)
    }
}
