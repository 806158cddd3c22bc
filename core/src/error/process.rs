use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessErrorKind {
    Spawn,
    NonZeroExit,
    StreamIo,
}

impl ProcessErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spawn => "spawn",
            Self::NonZeroExit => "exit",
            Self::StreamIo => "stream_io",
        }
    }
}

/// A command that could not be run or did not exit with code `0`.
#[derive(Error, Debug)]
#[error("child process exec '{command}' failed ({}): code={code:?} signal={signal:?} {message}", .kind.as_str())]
pub struct ProcessError {
    pub command: String,
    pub kind: ProcessErrorKind,
    pub code: Option<i32>,
    pub signal: Option<i32>,
    pub message: String,
}

impl ProcessError {
    pub fn spawn(command: &str, err: std::io::Error) -> Self {
        Self {
            command: command.to_string(),
            kind: ProcessErrorKind::Spawn,
            code: None,
            signal: None,
            message: err.to_string(),
        }
    }

    pub fn stream(command: &str, stream: &'static str, err: std::io::Error) -> Self {
        Self {
            command: command.to_string(),
            kind: ProcessErrorKind::StreamIo,
            code: None,
            signal: None,
            message: format!("{stream}: {err}"),
        }
    }

    pub fn non_zero(command: &str, code: i32, signal: Option<i32>, stderr_tail: String) -> Self {
        Self {
            command: command.to_string(),
            kind: ProcessErrorKind::NonZeroExit,
            code: Some(code),
            signal,
            message: stderr_tail,
        }
    }

    pub fn signaled(command: &str, signal: Option<i32>, stderr_tail: String) -> Self {
        Self {
            command: command.to_string(),
            kind: ProcessErrorKind::NonZeroExit,
            code: None,
            signal,
            message: stderr_tail,
        }
    }
}
