use crate::answer::{Answer, QuizAnswer, Verdict};
use crate::classify::FailureCategory;

/// One-line (or, for journal entries, multi-line) answer text.
pub fn answer_summary(answer: &QuizAnswer) -> String {
    match &answer.answer {
        Answer::MultipleChoice { answer_indices, .. } => {
            let mut sorted = answer_indices.clone();
            sorted.sort_unstable();
            let letters: Vec<String> = sorted.into_iter().map(choice_letter).collect();
            format!("Answer: {}", letters.join(", "))
        }
        Answer::TrueFalse { answer: v, .. } => match v {
            Verdict::True => "Answer: T".to_string(),
            Verdict::False => "Answer: F".to_string(),
        },
        Answer::FillInBlank { answer_text } => {
            if answer_text.trim().is_empty() {
                format!("Answer: {}", answer.raw_text)
            } else {
                format!("Answer: {answer_text}")
            }
        }
        Answer::JournalEntry { answer_entries } => {
            if answer_entries.is_empty() {
                "Answer: No journal entries found".to_string()
            } else {
                format!("Journal Entries:\n{}", answer_entries.join("\n"))
            }
        }
    }
}

/// A, B, ..., Z, then AA, AB, ... for very long choice lists.
fn choice_letter(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    loop {
        letters.push(char::from(b'A' + (n % 26) as u8));
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    letters.iter().rev().collect()
}

/// Whether an answer is confident enough to show.
pub fn passes_threshold(confidence: f64, threshold: f64, bypass: bool) -> bool {
    bypass || confidence >= threshold
}

pub fn status_line(elapsed_ms: u128, confidence: f64) -> String {
    format!("Inference: {elapsed_ms} ms, Confidence: {confidence:.2}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeColor {
    Amber,
    Red,
}

/// What the operator sees for a failed capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub text: &'static str,
    pub color: NoticeColor,
    /// Auth failures need the operator to fix the key; everything else is
    /// a passing status message.
    pub blocking: bool,
}

impl Notice {
    pub fn for_category(category: FailureCategory) -> Self {
        match category {
            FailureCategory::Auth => Notice {
                text: "Invalid OpenRouter API key",
                color: NoticeColor::Red,
                blocking: true,
            },
            FailureCategory::NoResponse => Notice {
                text: "No response",
                color: NoticeColor::Amber,
                blocking: false,
            },
            FailureCategory::Parse => Notice {
                text: "Parse error",
                color: NoticeColor::Red,
                blocking: false,
            },
            FailureCategory::Generic => Notice {
                text: "Error",
                color: NoticeColor::Red,
                blocking: false,
            },
        }
    }

    /// Blocking notices always surface; the rest only with
    /// `[display] show_notifications`.
    pub fn should_show(&self, show_notifications: bool) -> bool {
        self.blocking || show_notifications
    }
}
