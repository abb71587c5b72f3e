use std::io;
use thiserror::Error;

/// 셸 명령 실행 중 발생하는 에러
///
/// `Display` 구현이 곧 사용자에게 보여지는 메시지입니다.
#[derive(Error, Debug)]
pub enum ShellError {
    /// 인자 개수/형식 오류
    #[error("{0}")]
    Usage(String),

    #[error("No such file or directory: {0}")]
    NotFound(String),

    /// 루트, 작업 디렉토리 상위 경로 등 삭제 금지 대상
    #[error("Refusing to remove '{0}' - system protection")]
    Protection(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShellError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// 로그/콘솔 출력용 메시지 (앞쪽 `[...] ` 접두어 제거)
    pub fn rendered(&self) -> String {
        normalize_message(&self.to_string()).to_string()
    }
}

impl From<io::Error> for ShellError {
    fn from(source: io::Error) -> Self {
        Self::io("IO error", source)
    }
}

/// `[Errno 2] No such file` 형태의 메시지에서 `[...] ` 접두어를 떼어냅니다.
pub fn normalize_message(message: &str) -> &str {
    if message.starts_with('[') {
        if let Some((_, rest)) = message.split_once("] ") {
            return rest;
        }
    }
    message
}

pub type Result<T> = std::result::Result<T, ShellError>;
