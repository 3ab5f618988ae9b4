use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::i18n::TargetLanguage;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "invest-planner.toml";

/// 环境变量名
pub struct EnvKeys;

impl EnvKeys {
    pub const LLM_API_KEY: &'static str = "PLANNER_LLM_API_KEY";
    pub const NVIDIA_API_KEY: &'static str = "NVIDIA_API_KEY";
    pub const SEARCH_API_KEY: &'static str = "SERPAPI_API_KEY";
    pub const LLM_TRACING: &'static str = "PLANNER_LLM_TRACING";
}

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum LLMProvider {
    /// OpenAI兼容的Chat Completions接口（默认指向NVIDIA托管服务）
    #[serde(rename = "openai")]
    #[default]
    OpenAI,
    #[serde(rename = "deepseek")]
    DeepSeek,
    #[serde(rename = "mistral")]
    Mistral,
    #[serde(rename = "openrouter")]
    OpenRouter,
    #[serde(rename = "anthropic")]
    Anthropic,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::OpenAI => write!(f, "openai"),
            LLMProvider::DeepSeek => write!(f, "deepseek"),
            LLMProvider::Mistral => write!(f, "mistral"),
            LLMProvider::OpenRouter => write!(f, "openrouter"),
            LLMProvider::Anthropic => write!(f, "anthropic"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "nvidia" => Ok(LLMProvider::OpenAI),
            "deepseek" => Ok(LLMProvider::DeepSeek),
            "mistral" => Ok(LLMProvider::Mistral),
            "openrouter" => Ok(LLMProvider::OpenRouter),
            "anthropic" => Ok(LLMProvider::Anthropic),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 报告输出目录，为空时只输出到终端
    pub output_path: Option<PathBuf>,

    /// 报告语言
    pub target_language: TargetLanguage,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 搜索服务配置
    pub search: SearchConfig,

    /// 是否启用详细日志
    pub verbose: bool,

    /// 以JSON格式输出日志
    pub log_json: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址（仅openai与deepseek使用）
    pub api_base_url: String,

    /// 模型标识
    pub model: String,

    /// 最大tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 记录每次模型调用的prompt与回复，供远程采集
    pub trace_calls: bool,
}

/// 搜索服务配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// SerpAPI KEY
    pub api_key: String,

    /// 搜索接口地址
    pub api_base_url: String,

    /// 搜索引擎
    pub engine: String,

    /// 保留的搜索结果数量
    pub max_results: usize,

    /// 超时时间（秒）
    pub timeout_seconds: u64,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// 加载配置：显式指定的文件 > 工作目录下的默认文件 > 默认值
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let default_path = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(&default_path)
        } else {
            Ok(Config::default())
        }
    }

    /// 使用进程环境变量覆盖密钥与开关
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// 使用给定的查找函数覆盖密钥与开关
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) =
            non_empty(EnvKeys::LLM_API_KEY).or_else(|| non_empty(EnvKeys::NVIDIA_API_KEY))
        {
            self.llm.api_key = key;
        }
        if let Some(key) = non_empty(EnvKeys::SEARCH_API_KEY) {
            self.search.api_key = key;
        }
        if let Some(flag) = non_empty(EnvKeys::LLM_TRACING) {
            self.llm.trace_calls = is_truthy(&flag);
        }
    }

    /// 校验配置，必须在任何网络调用之前完成
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(ConfigError::MissingSecret(EnvKeys::NVIDIA_API_KEY));
        }
        if self.search.api_key.trim().is_empty() {
            return Err(ConfigError::MissingSecret(EnvKeys::SEARCH_API_KEY));
        }
        if self.llm.model.trim().is_empty() {
            return Err(ConfigError::Invalid("llm.model must not be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "llm.max_tokens must be greater than 0".to_string(),
            ));
        }
        if !(1..=100).contains(&self.search.max_results) {
            return Err(ConfigError::Invalid(format!(
                "search.max_results must be within 1..=100, got {}",
                self.search.max_results
            )));
        }
        Ok(())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: None,
            target_language: TargetLanguage::default(),
            llm: LLMConfig::default(),
            search: SearchConfig::default(),
            verbose: false,
            log_json: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: String::new(),
            api_base_url: String::from("https://integrate.api.nvidia.com/v1"),
            model: String::from("meta/llama-3.3-70b-instruct"),
            max_tokens: 4096,
            temperature: 0.0,
            trace_calls: false,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base_url: String::from("https://serpapi.com/search.json"),
            engine: String::from("google"),
            max_results: 10,
            timeout_seconds: 30,
        }
    }
}
