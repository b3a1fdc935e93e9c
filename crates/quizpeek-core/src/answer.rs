use serde::{Deserialize, Serialize};

// ── Question modes ──

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Mode {
    #[serde(rename = "mcq")]
    Mcq,
    #[serde(rename = "tf")]
    TrueFalse,
    #[serde(rename = "fitb")]
    FillInBlank,
    #[serde(rename = "journal")]
    JournalEntry,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mcq => write!(f, "mcq"),
            Self::TrueFalse => write!(f, "tf"),
            Self::FillInBlank => write!(f, "fitb"),
            Self::JournalEntry => write!(f, "journal"),
        }
    }
}

impl Mode {
    /// Parse the wire name used in model payloads. Unknown names are `None`.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "mcq" => Some(Self::Mcq),
            "tf" => Some(Self::TrueFalse),
            "fitb" => Some(Self::FillInBlank),
            "journal" => Some(Self::JournalEntry),
            _ => None,
        }
    }
}

/// Answer to a true/false question. Index 0 is True, 1 is False.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    True,
    False,
}

impl Verdict {
    pub fn from_index(index: u64) -> Option<Self> {
        match index {
            0 => Some(Self::True),
            1 => Some(Self::False),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            Self::True => 0,
            Self::False => 1,
        }
    }
}

// ── Normalized answer ──

/// The mode-specific part of an answer. Each variant carries exactly the
/// fields its mode requires, so a validated answer can't mix them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode")]
pub enum Answer {
    #[serde(rename = "mcq")]
    MultipleChoice {
        choices: Vec<String>,
        /// 0-based, each `< choices.len()`, never empty.
        answer_indices: Vec<usize>,
    },
    #[serde(rename = "tf")]
    TrueFalse {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        choices: Option<[String; 2]>,
        answer: Verdict,
    },
    #[serde(rename = "fitb")]
    FillInBlank { answer_text: String },
    #[serde(rename = "journal")]
    JournalEntry {
        /// Free-form "Account D/C Amount" lines, kept as given.
        answer_entries: Vec<String>,
    },
}

impl Answer {
    pub fn mode(&self) -> Mode {
        match self {
            Self::MultipleChoice { .. } => Mode::Mcq,
            Self::TrueFalse { .. } => Mode::TrueFalse,
            Self::FillInBlank { .. } => Mode::FillInBlank,
            Self::JournalEntry { .. } => Mode::JournalEntry,
        }
    }
}

/// A validated answer for one capture. Built by `parse::parse_response`,
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizAnswer {
    pub question: String,
    #[serde(flatten)]
    pub answer: Answer,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
    /// Model text after fence stripping, for fallback display.
    pub raw_text: String,
}

impl QuizAnswer {
    pub fn mode(&self) -> Mode {
        self.answer.mode()
    }
}
