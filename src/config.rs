use std::env;

use crate::conversation::HistoryWindow;
use crate::model::GenerationParams;

const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct:free";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_HTTP_REFERER: &str = "https://github.com/ChaiyasitZ/mid-nlp";
const DEFAULT_APP_TITLE: &str = "NLP Chatbot";
const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert NLP (Natural Language Processing) assistant. You specialize in:
- Text analysis and understanding
- Language modeling and generation
- Sentiment analysis
- Named Entity Recognition (NER)
- Text classification
- Machine translation
- Question answering
- Text summarization
- Language understanding tasks

Provide helpful, accurate, and detailed responses related to NLP topics. When appropriate, suggest practical approaches, tools, or code examples.";

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub system_prompt: String,
    pub request_timeout_secs: u64,
    pub http_referer: String,
    pub app_title: String,
    pub generation: GenerationParams,
    pub history_window: HistoryWindow,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_env_with(|key| env::var(key).ok())
    }

    pub(crate) fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Self {
        let defaults = GenerationParams::default();
        let generation = GenerationParams {
            max_tokens: parse_max_tokens(get_var("MAX_TOKENS").as_deref(), defaults.max_tokens),
            temperature: parse_f64(get_var("TEMPERATURE").as_deref(), defaults.temperature),
            top_p: parse_f64(get_var("TOP_P").as_deref(), defaults.top_p),
            frequency_penalty: parse_f64(
                get_var("FREQUENCY_PENALTY").as_deref(),
                defaults.frequency_penalty,
            ),
            presence_penalty: parse_f64(
                get_var("PRESENCE_PENALTY").as_deref(),
                defaults.presence_penalty,
            ),
        };

        Self {
            api_key: non_blank(get_var(API_KEY_VAR)),
            api_url: non_blank(get_var("CHAT_API_URL"))
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            model: non_blank(get_var("CHAT_MODEL")).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            system_prompt: get_var("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            request_timeout_secs: parse_positive_u64(
                get_var("REQUEST_TIMEOUT_SECS").as_deref(),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            ),
            http_referer: non_blank(get_var("HTTP_REFERER"))
                .unwrap_or_else(|| DEFAULT_HTTP_REFERER.to_string()),
            app_title: non_blank(get_var("APP_TITLE"))
                .unwrap_or_else(|| DEFAULT_APP_TITLE.to_string()),
            generation,
            history_window: parse_history_window(get_var("HISTORY_MAX_MESSAGES").as_deref()),
        }
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive_u64(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_max_tokens(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_f64(raw: Option<&str>, default: f64) -> f64 {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
        .unwrap_or(default)
}

fn parse_history_window(raw: Option<&str>) -> HistoryWindow {
    match raw.and_then(|value| value.trim().parse::<usize>().ok()) {
        Some(limit) if limit > 0 => HistoryWindow::LastMessages(limit),
        _ => HistoryWindow::Unbounded,
    }
}
