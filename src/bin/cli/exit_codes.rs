//! Exit codes for the CLI tool.

/// Operation completed successfully.
pub const SUCCESS: i32 = 0;
/// Usage or runtime error.
pub const ERROR: i32 = 1;
/// Verification failed.
pub const VERIFY_FAILED: i32 = 2;

/// Exit code enum for structured handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success,
    Error,
    VerifyFailed,
}

impl ExitCode {
    /// Returns the numeric exit code.
    pub fn code(self) -> i32 {
        match self {
            Self::Success => SUCCESS,
            Self::Error => ERROR,
            Self::VerifyFailed => VERIFY_FAILED,
        }
    }
}
