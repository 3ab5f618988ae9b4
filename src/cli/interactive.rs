//! 交互式补全缺失的计划输入

use anyhow::{Result, bail};
use std::io::{BufRead, Write};

use crate::generator::prompts::format_currency;
use crate::generator::types::{PlanRequest, RiskLevel};

/// 已知的计划输入，缺失项为None
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanInputs {
    pub risk_level: Option<RiskLevel>,
    pub industry: Option<String>,
    pub investment_amount: Option<f64>,
    pub time_horizon: Option<String>,
}

impl PlanInputs {
    /// 风险、金额与期限都已给出
    pub fn is_complete(&self) -> bool {
        self.risk_level.is_some() && self.investment_amount.is_some() && self.time_horizon.is_some()
    }
}

/// 解析金额，接受 `$` 前缀与千位分隔符，要求为正数
pub fn parse_amount(value: &str) -> Result<f64, String> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    let amount: f64 = cleaned
        .parse()
        .map_err(|_| format!("`{}` is not a valid number", value.trim()))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err("amount must be a positive number".to_string());
    }
    Ok(amount)
}

/// 逐项询问缺失的输入
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// 补全输入并构造请求；命令行已给出的项不再询问
    pub fn complete(&mut self, inputs: PlanInputs) -> Result<PlanRequest> {
        let asked = !inputs.is_complete();
        if asked {
            writeln!(self.output, "Investment Planning - Interactive Mode")?;
            writeln!(self.output, "{}", "=".repeat(50))?;
        }

        let risk_level = match inputs.risk_level {
            Some(risk_level) => risk_level,
            None => self.ask_risk_level()?,
        };
        // 行业只在交互模式下询问
        let industry = match inputs.industry {
            Some(industry) => Some(industry),
            None if asked => self.ask_industry()?,
            None => None,
        };
        let investment_amount = match inputs.investment_amount {
            Some(amount) => amount,
            None => self.ask_amount()?,
        };
        let time_horizon = match inputs.time_horizon {
            Some(horizon) => horizon,
            None => self.ask_horizon()?,
        };

        let request = PlanRequest::new(risk_level, industry, investment_amount, time_horizon)?;
        if asked {
            writeln!(self.output, "{}", "=".repeat(50))?;
            writeln!(self.output, "Risk Level: {}", request.risk_level())?;
            writeln!(self.output, "Industry: {}", request.industry().unwrap_or("Any"))?;
            writeln!(
                self.output,
                "Investment Amount: {}",
                format_currency(request.investment_amount())
            )?;
            writeln!(self.output, "Time Horizon: {}", request.time_horizon())?;
            writeln!(self.output, "{}", "=".repeat(50))?;
        }
        Ok(request)
    }

    fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            bail!("input closed before all plan inputs were provided");
        }
        Ok(line.trim().to_string())
    }

    fn ask_risk_level(&mut self) -> Result<RiskLevel> {
        writeln!(self.output, "\nWhat is your risk level?")?;
        writeln!(self.output, "1. Low\n2. Medium\n3. High")?;
        loop {
            let choice = self.read_line("Enter your choice (1-3): ")?;
            match choice.as_str() {
                "1" => return Ok(RiskLevel::Low),
                "2" => return Ok(RiskLevel::Medium),
                "3" => return Ok(RiskLevel::High),
                _ => writeln!(self.output, "Invalid choice. Please enter 1, 2, or 3.")?,
            }
        }
    }

    fn ask_industry(&mut self) -> Result<Option<String>> {
        let industry =
            self.read_line("What industry are you interested in? (or press Enter for any): ")?;
        if industry.is_empty() {
            writeln!(self.output, "No specific industry selected.")?;
            Ok(None)
        } else {
            Ok(Some(industry))
        }
    }

    fn ask_amount(&mut self) -> Result<f64> {
        loop {
            let value = self.read_line("How much money do you want to invest? (e.g., 50000): $")?;
            match parse_amount(&value) {
                Ok(amount) => return Ok(amount),
                Err(message) => writeln!(self.output, "Please enter a valid amount: {}.", message)?,
            }
        }
    }

    fn ask_horizon(&mut self) -> Result<String> {
        loop {
            let horizon =
                self.read_line("How long do you want to invest for? (e.g., '1 year', '5 years'): ")?;
            if !horizon.is_empty() {
                return Ok(horizon);
            }
            writeln!(self.output, "Please enter a time horizon.")?;
        }
    }
}

/// 使用标准输入输出补全计划输入
pub fn complete_from_stdin(inputs: PlanInputs) -> Result<PlanRequest> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    Prompter::new(stdin.lock(), stdout.lock()).complete(inputs)
}
