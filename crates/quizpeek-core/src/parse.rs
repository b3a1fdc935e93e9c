use crate::answer::{Answer, Mode, QuizAnswer, Verdict};
use crate::errors::ParseError;
use serde_json::{Map, Value};
use tracing::{info, warn};

const FENCE: &str = "```";

/// Strip a markdown code fence from model output.
/// Handles ```json, any other language tag, bare ``` fences and fences
/// that open and close on the same line. Returns the input trimmed when
/// there is no leading fence.
pub fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    // Language tag: everything up to the first character that can't be part of one.
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+')))
        .unwrap_or(rest.len());
    let body = &rest[tag_len..];
    let body = body.strip_suffix(FENCE).unwrap_or(body);
    body.trim()
}

/// Parse raw model text into a validated answer.
///
/// Structural problems (bad JSON, unknown mode, missing or out-of-range
/// answer fields) fail with a specific `ParseError`. Cosmetic ones are
/// corrected and logged: a missing or invalid `confidence` becomes 1.0, and a
/// legacy `answer_index` under `mcq` is folded into `answer_indices`.
pub fn parse_response(text: &str) -> Result<QuizAnswer, ParseError> {
    let cleaned = strip_fences(text);
    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        let err = ParseError::Decode(e.to_string());
        warn!(reason = %err, text = truncate_for_log(cleaned, 500), "model response rejected");
        err
    })?;

    validate(&value, cleaned).inspect_err(|err| {
        warn!(reason = %err, "model response failed validation");
    })
}

fn validate(value: &Value, raw_text: &str) -> Result<QuizAnswer, ParseError> {
    let obj = value.as_object().ok_or(ParseError::NotAnObject)?;

    let mode_value = obj.get("mode").ok_or(ParseError::MissingKey("mode"))?;
    let question_value = obj.get("question").ok_or(ParseError::MissingKey("question"))?;

    let mode = mode_value
        .as_str()
        .and_then(Mode::from_wire)
        .ok_or_else(|| ParseError::InvalidMode(mode_value.to_string()))?;

    let question = question_value.as_str().ok_or(ParseError::QuestionNotText)?;
    if question.trim().is_empty() {
        return Err(ParseError::EmptyQuestion);
    }

    let answer = match mode {
        Mode::Mcq => validate_mcq(obj)?,
        Mode::TrueFalse => validate_true_false(obj)?,
        Mode::FillInBlank => Answer::FillInBlank {
            answer_text: obj
                .get("answer_text")
                .and_then(Value::as_str)
                .ok_or(ParseError::AnswerTextNotText)?
                .to_string(),
        },
        Mode::JournalEntry => Answer::JournalEntry {
            answer_entries: obj
                .get("answer_entries")
                .and_then(string_list)
                .ok_or(ParseError::AnswerEntriesNotTextList)?,
        },
    };

    Ok(QuizAnswer {
        question: question.to_string(),
        answer,
        confidence: normalize_confidence(obj.get("confidence")),
        raw_text: raw_text.to_string(),
    })
}

fn validate_mcq(obj: &Map<String, Value>) -> Result<Answer, ParseError> {
    let choices = obj
        .get("choices")
        .and_then(string_list)
        .ok_or(ParseError::ChoicesNotTextList)?;

    // A singular integer `answer_index` is the older payload shape. When
    // present it wins over `answer_indices`.
    let legacy = obj.get("answer_index").filter(|v| v.is_u64() || v.is_i64());
    let raw_indices: Vec<&Value> = match legacy {
        Some(index) => {
            info!(answer_index = %index, "folding legacy answer_index into answer_indices");
            vec![index]
        }
        None => obj
            .get("answer_indices")
            .and_then(Value::as_array)
            .ok_or(ParseError::InvalidAnswerIndices)?
            .iter()
            .collect(),
    };

    let mut answer_indices: Vec<usize> = Vec::with_capacity(raw_indices.len());
    for raw in raw_indices {
        let index = raw
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .filter(|&i| i < choices.len())
            .ok_or(ParseError::InvalidAnswerIndices)?;
        if !answer_indices.contains(&index) {
            answer_indices.push(index);
        }
    }
    if answer_indices.is_empty() {
        return Err(ParseError::InvalidAnswerIndices);
    }

    Ok(Answer::MultipleChoice {
        choices,
        answer_indices,
    })
}

fn validate_true_false(obj: &Map<String, Value>) -> Result<Answer, ParseError> {
    let answer = obj
        .get("answer_index")
        .and_then(Value::as_u64)
        .and_then(Verdict::from_index)
        .ok_or(ParseError::InvalidTfAnswerIndex)?;

    let choices = match obj.get("choices") {
        None => None,
        Some(value) => {
            let list = string_list(value).ok_or(ParseError::TfChoicesNotTwo)?;
            let [first, second]: [String; 2] =
                list.try_into().map_err(|_| ParseError::TfChoicesNotTwo)?;
            if !is_true_false_pair(&first, &second) {
                return Err(ParseError::TfChoicesInconsistent);
            }
            Some([first, second])
        }
    };

    Ok(Answer::TrueFalse { choices, answer })
}

/// Case-insensitive {"true","false"} or {"t","f"}, in either order.
fn is_true_false_pair(a: &str, b: &str) -> bool {
    let (a, b) = (a.to_lowercase(), b.to_lowercase());
    let pair = |x: &str, y: &str| (a == x && b == y) || (a == y && b == x);
    pair("true", "false") || pair("t", "f")
}

fn normalize_confidence(value: Option<&Value>) -> f64 {
    match value {
        None => {
            warn!("confidence missing from response; defaulting to 1.0");
            1.0
        }
        Some(v) => match v.as_f64() {
            Some(c) if (0.0..=1.0).contains(&c) => c,
            _ => {
                warn!(confidence = %v, "invalid confidence in response; defaulting to 1.0");
                1.0
            }
        },
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    value
        .as_array()?
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect()
}

fn truncate_for_log(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut i = max;
        while i > 0 && !s.is_char_boundary(i) {
            i -= 1;
        }
        &s[..i]
    }
}
