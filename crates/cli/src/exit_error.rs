// SPDX-License-Identifier: MIT

//! Carries a specific process exit code through an `anyhow::Error` chain.

use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Wrap an existing error, keeping its message but attaching `code`.
    pub fn wrap(code: i32, err: anyhow::Error) -> anyhow::Error {
        Self::new(code, err.to_string()).into()
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}
