//! Interactive path prompt.
//!
//! clap handles structured flags; this covers the "run `elisa` and type the
//! file paths" flow when a path flag is omitted. Paths pasted from a file
//! manager often arrive quoted, so quotes at either end are stripped.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Prompt on stdout and read one path from stdin.
pub fn prompt_for_path(prompt: &str) -> Result<PathBuf, AppError> {
    let stdin = io::stdin();
    read_path(prompt, &mut stdin.lock(), &mut io::stdout())
}

/// Prompt-and-read against arbitrary streams.
pub fn read_path(prompt: &str, input: &mut impl BufRead, output: &mut impl Write) -> Result<PathBuf, AppError> {
    write!(output, "{prompt}")
        .and_then(|_| output.flush())
        .map_err(|e| AppError::io(format!("Failed to write prompt: {e}")))?;

    let mut line = String::new();
    let bytes = input
        .read_line(&mut line)
        .map_err(|e| AppError::io(format!("Failed to read input: {e}")))?;
    if bytes == 0 {
        return Err(AppError::io("No input received. Pass the CSV path as a flag instead."));
    }

    let cleaned = clean_path_input(&line);
    if cleaned.is_empty() {
        return Err(AppError::io("Empty path."));
    }
    validate_csv_path(Path::new(cleaned))
}

/// Trim whitespace, then any leading or trailing `"` and `'` characters.
pub fn clean_path_input(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim_matches('\'')
}

/// The path must name an existing regular file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::io(format!("File not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::io(format!(
            "Expected a file, got a directory: {}",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EXIT_IO;

    #[test]
    fn quotes_and_whitespace_are_stripped() {
        assert_eq!(clean_path_input("  plate.csv \n"), "plate.csv");
        assert_eq!(clean_path_input("\"my plate.csv\"\n"), "my plate.csv");
        assert_eq!(clean_path_input("'plate.csv'"), "plate.csv");
        assert_eq!(clean_path_input("\"plate.csv"), "plate.csv");
        assert_eq!(clean_path_input("plate.csv'\n"), "plate.csv");
        assert_eq!(clean_path_input("\"'plate.csv'\""), "plate.csv");
    }

    #[test]
    fn reads_existing_path_from_input() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let line = format!("'{}'\n", file.path().display());
        let mut out = Vec::new();

        let path = read_path("ELISA data: ", &mut line.as_bytes(), &mut out).unwrap();
        assert_eq!(path, file.path());
        assert_eq!(String::from_utf8(out).unwrap(), "ELISA data: ");
    }

    #[test]
    fn missing_file_and_eof_are_input_errors() {
        let mut out = Vec::new();
        let err = read_path("> ", &mut "/nonexistent/x.csv\n".as_bytes(), &mut out).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_IO);
        assert!(err.message().contains("/nonexistent/x.csv"));

        let err = read_path("> ", &mut "".as_bytes(), &mut out).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_IO);
    }
}
