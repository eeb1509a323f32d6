// SPDX-License-Identifier: MIT

//! Opaque session handle correlating multiple turns with one external
//! assistant CLI. Some adapters generate it (client-chosen); others read
//! it from the subprocess's first response (server-issued).

use std::fmt;

/// A session handle. Empty means "no session established yet".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionHandle(String);

impl SessionHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
