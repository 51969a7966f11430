pub mod ast;
pub mod diagnostic;
pub mod driver;
pub mod lexer;
pub mod resolver;

pub use diagnostic::SourceDiagnostic;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    CompilationError,
    IoError,
}

impl ErrorKind {
    /// Exit status in the style of `sysexits.h`.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::CompilationError => 65,
            ErrorKind::IoError => 74,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LuoError {
    #[error(transparent)]
    Compile(#[from] SourceDiagnostic),
    #[error(transparent)]
    Io(#[from] anyhow::Error),
}

impl LuoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LuoError::Compile(_) => ErrorKind::CompilationError,
            LuoError::Io(_) => ErrorKind::IoError,
        }
    }
}
