//! Template engine error types

use thiserror::Error;

/// Template errors
#[derive(Debug, Error)]
pub enum TemplateError {
    /// An embedded template failed to compile
    #[error("Template compilation failed: {0}")]
    CompileError(String),

    /// The page context could not be converted for tera
    #[error("Invalid template context: {0}")]
    ContextError(String),

    /// Template rendering error
    #[error("Template error: {0}")]
    RenderError(String),
}
