use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;
use tracing::info;

pub const OPENROUTER_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const REFERER: &str = "https://quizpeek.app";
pub const TITLE: &str = "QuizPeek";

pub const TEMPERATURE: f64 = 0.0;
pub const MAX_TOKENS: u32 = 15000;

pub const SYSTEM_PROMPT: &str = "You are a quiz parser. Input is a cropped screenshot of a quiz. Return ONLY strict JSON. If multiple questions are visible, answer the TOPMOST one.";

pub const REASONING_SUFFIX: &str =
    " Use chain-of-thought: think step by step before outputting JSON.";

pub const USER_PROMPT: &str = r#"Extract the question and answers and decide the correct answer(s). If it's multiple-choice, return "mode":"mcq" and "answer_indices" as a list of 0-based indices (even for single answer). Do not use "answer_index" for multiple-choice questions. If it's true/false, return 'mode':'tf' and 'answer_index' as 0 for True or 1 for False. If it's fill-in, return "mode":"fitb" and "answer_text". If it's an accounting journal entry question (scenario at top, outline in middle, journal entry at bottom), return "mode":"journal" and "answer_entries" as an array of strings in format "Account D/C Amount". Focus ONLY on the journal entry part at the bottom. If negation words like NOT/EXCEPT/LEAST appear, still pick the correct answer(s). JSON schema: {"mode": "mcq|fitb|journal|tf", "question": "string", "choices": ["string"], "answer_indices": [0], "answer_index": 0, "answer_text": "string", "answer_entries": ["string"], "confidence": 0.0}. Always include a 'confidence' field as a float from 0.0 to 1.0 estimating your confidence in the answer based on your reasoning. Output ONLY JSON."#;

// ── Chat-completions body ──

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System { content: String },
    User { content: Vec<ContentPart> },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

/// Whether a model can be asked to reason before answering.
/// Vision-only models such as llava ignore or choke on the instruction.
pub fn model_supports_reasoning(model: &str) -> bool {
    static VISION_ONLY: OnceLock<Regex> = OnceLock::new();
    let re = VISION_ONLY
        .get_or_init(|| Regex::new(r"(llava|vision-only|image-only)").expect("static regex"));
    !re.is_match(&model.to_lowercase())
}

/// Build the request body for one capture.
pub fn build_chat_request(model: &str, image_data_url: &str, enable_reasoning: bool) -> ChatRequest {
    let mut system = SYSTEM_PROMPT.to_string();
    if enable_reasoning {
        if model_supports_reasoning(model) {
            system.push_str(REASONING_SUFFIX);
        } else {
            info!(model, "reasoning requested but ignored for unsupported model");
        }
    }

    ChatRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage::System { content: system },
            ChatMessage::User {
                content: vec![
                    ContentPart::Text {
                        text: USER_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: image_data_url.to_string(),
                        },
                    },
                ],
            },
        ],
        temperature: TEMPERATURE,
        max_tokens: MAX_TOKENS,
    }
}

/// Encode image bytes as a `data:` URL.
pub fn image_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// MIME type for an already-encoded screenshot, by file extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}
