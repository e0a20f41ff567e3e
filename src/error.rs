//! Application-level error carried up to `main`.
//!
//! Domain layers use typed errors (`LmError`, `FitError`); everything that
//! reaches the binary boundary is folded into an `AppError` with a process
//! exit code and a message that names the failing file or step.

use crate::fit::FitError;

/// Input/output problems: missing file, bad header, unparsable value, write failure.
pub const EXIT_IO: u8 = 2;
/// The input parsed but holds no usable rows.
pub const EXIT_EMPTY: u8 = 3;
/// The standard curve could not be fitted.
pub const EXIT_FIT: u8 = 4;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(EXIT_IO, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        AppError::new(EXIT_FIT, format!("Standard curve fit failed: {err}"))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_error_maps_to_fit_exit_code() {
        let err: AppError = FitError::TooFewPoints { n: 2, required: 4 }.into();
        assert_eq!(err.exit_code(), EXIT_FIT);
        assert!(err.message().starts_with("Standard curve fit failed:"));
    }
}
