use serde::{Deserialize, Serialize};

/// 报告目标语言
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "en")]
    #[default]
    English,
    #[serde(rename = "zh")]
    Chinese,
    #[serde(rename = "ja")]
    Japanese,
    #[serde(rename = "ko")]
    Korean,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "es")]
    Spanish,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Chinese => write!(f, "zh"),
            TargetLanguage::Japanese => write!(f, "ja"),
            TargetLanguage::Korean => write!(f, "ko"),
            TargetLanguage::German => write!(f, "de"),
            TargetLanguage::French => write!(f, "fr"),
            TargetLanguage::Spanish => write!(f, "es"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(TargetLanguage::English),
            "zh" | "chinese" | "中文" => Ok(TargetLanguage::Chinese),
            "ja" | "japanese" | "日本語" => Ok(TargetLanguage::Japanese),
            "ko" | "korean" | "한국어" => Ok(TargetLanguage::Korean),
            "de" | "german" | "deutsch" => Ok(TargetLanguage::German),
            "fr" | "french" | "français" => Ok(TargetLanguage::French),
            "es" | "spanish" | "español" => Ok(TargetLanguage::Spanish),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    /// 获取报告撰写语言的提示词指令
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::English => {
                "Write the report in English, using clear and professional language suitable for a retail investor."
            }
            TargetLanguage::Chinese => "请使用中文撰写报告，语言应准确、专业，便于普通投资者理解。公司名称保留原文。",
            TargetLanguage::Japanese => {
                "レポートは日本語で作成してください。個人投資家にも分かりやすい、正確で専門的な表現を用いてください。企業名は原文のままにしてください。"
            }
            TargetLanguage::Korean => {
                "보고서는 한국어로 작성해 주세요. 개인 투자자가 이해하기 쉬운 정확하고 전문적인 표현을 사용하고, 회사명은 원문 그대로 유지해 주세요."
            }
            TargetLanguage::German => {
                "Verfassen Sie den Bericht auf Deutsch, präzise, professionell und für Privatanleger verständlich. Firmennamen bleiben im Original."
            }
            TargetLanguage::French => {
                "Rédigez le rapport en français, de manière précise, professionnelle et compréhensible pour un investisseur particulier. Les noms de sociétés restent dans leur forme originale."
            }
            TargetLanguage::Spanish => {
                "Redacte el informe en español, con un lenguaje preciso, profesional y comprensible para un inversor minorista. Mantenga los nombres de las empresas en su forma original."
            }
        }
    }
}
