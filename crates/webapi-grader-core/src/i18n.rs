//! Localized labels for failure reports.

/// Language used when nothing else is configured.
pub const DEFAULT_LANG: &str = "ja";

/// Fixed messages that appear in failure reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    InvalidExitCode,
    InvalidStdout,
    Expected,
    Actual,
}

impl Message {
    /// English text, also the fallback for unknown languages.
    #[must_use]
    pub const fn english(self) -> &'static str {
        match self {
            Self::InvalidExitCode => "Invalid exit code",
            Self::InvalidStdout => "Invalid stdout",
            Self::Expected => "Expected",
            Self::Actual => "Actual",
        }
    }

    const fn japanese(self) -> &'static str {
        match self {
            Self::InvalidExitCode => "終了コードが正しくありません",
            Self::InvalidStdout => "標準出力が正しくありません",
            Self::Expected => "期待値",
            Self::Actual => "実際の値",
        }
    }
}

/// Look up `message` for `lang`.
#[must_use]
pub fn text(lang: &str, message: Message) -> &'static str {
    match lang {
        "ja" => message.japanese(),
        _ => message.english(),
    }
}
