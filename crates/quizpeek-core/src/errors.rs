use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("a capture is already in flight")]
    Busy,
}

/// Why a model response could not be turned into a `QuizAnswer`.
/// The messages are logged verbatim and shown by `quizpeek parse`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    Decode(String),

    #[error("response is not a JSON object")]
    NotAnObject,

    #[error("missing key: {0}")]
    MissingKey(&'static str),

    #[error("invalid mode: {0}")]
    InvalidMode(String),

    #[error("question is not a string")]
    QuestionNotText,

    #[error("question is empty")]
    EmptyQuestion,

    #[error("choices is not a list of strings")]
    ChoicesNotTextList,

    #[error("invalid answer_indices")]
    InvalidAnswerIndices,

    #[error("invalid answer_index for tf")]
    InvalidTfAnswerIndex,

    #[error("choices must be exactly two strings for tf")]
    TfChoicesNotTwo,

    #[error("choices inconsistent with true/false mode")]
    TfChoicesInconsistent,

    #[error("answer_text is not a string")]
    AnswerTextNotText,

    #[error("answer_entries is not a list of strings")]
    AnswerEntriesNotTextList,
}
