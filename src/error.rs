//! Error types.
//!
//! Rendering itself never fails; malformed markup degrades to whatever can be
//! understood. The only fallible surface is the strict tag-style reader.

extern crate alloc;

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

/// Structured error for strict reads of the per-tag style blob.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagStyleError {
    /// Stable machine-readable code.
    pub code: &'static str,
    /// Human-readable message.
    pub message: Box<str>,
    /// Byte offset into the blob where reading stopped.
    pub offset: Option<usize>,
    /// Tag whose block was being read.
    pub tag: Option<Box<str>>,
}

impl TagStyleError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into().into_boxed_str(),
            offset: None,
            tag: None,
        }
    }

    pub(crate) fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub(crate) fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into().into_boxed_str());
        self
    }
}

impl fmt::Display for TagStyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(offset) = self.offset {
            write!(f, " [offset={}]", offset)?;
        }
        if let Some(tag) = self.tag.as_deref() {
            write!(f, " [tag={}]", tag)?;
        }
        Ok(())
    }
}

impl std::error::Error for TagStyleError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_optional_context() {
        let err = TagStyleError::new("BLOB_UNEXPECTED_TOKEN", "expected ':'")
            .with_offset(7)
            .with_tag("b");
        assert_eq!(
            err.to_string(),
            "BLOB_UNEXPECTED_TOKEN: expected ':' [offset=7] [tag=b]"
        );
        let bare = TagStyleError::new("BLOB_UNEXPECTED_EOF", "blob ended early");
        assert_eq!(bare.to_string(), "BLOB_UNEXPECTED_EOF: blob ended early");
    }
}
