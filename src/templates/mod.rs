//! HTML templates
//!
//! Page templates are embedded in the binary and compiled once at startup.
//! Every page is rendered from a serializable context struct. The error
//! pages are plain HTML and are served without going through tera.

use serde::Serialize;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera};

mod error;

pub use error::TemplateError;

/// Static 404 page
pub const NOT_FOUND_PAGE: &str = include_str!("../../templates/errors/404.html");
/// Static 500 page
pub const SERVER_ERROR_PAGE: &str = include_str!("../../templates/errors/500.html");

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("news/home.html", include_str!("../../templates/news/home.html")),
    ("news/detail.html", include_str!("../../templates/news/detail.html")),
    ("news/comment_form.html", include_str!("../../templates/news/comment_form.html")),
    ("news/edit.html", include_str!("../../templates/news/edit.html")),
    ("news/delete.html", include_str!("../../templates/news/delete.html")),
    ("registration/login.html", include_str!("../../templates/registration/login.html")),
    ("registration/signup.html", include_str!("../../templates/registration/signup.html")),
    ("registration/logged_out.html", include_str!("../../templates/registration/logged_out.html")),
];

/// Compiled page templates
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Compile the embedded templates
    pub fn new() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())
            .map_err(|e| TemplateError::CompileError(error_chain(&e)))?;

        tracing::debug!("Compiled {} templates", TEMPLATES.len());
        Ok(Self { tera })
    }

    /// Render `template` from a serializable page context
    pub fn render<C: Serialize>(&self, template: &str, context: &C) -> Result<String, TemplateError> {
        let context = TeraContext::from_serialize(context)
            .map_err(|e| TemplateError::ContextError(error_chain(&e)))?;

        self.tera.render(template, &context).map_err(|e| {
            TemplateError::RenderError(format!("Failed to render '{}': {}", template, error_chain(&e)))
        })
    }

    /// Names of all compiled templates
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.tera.get_template_names()
    }
}

/// Flatten a tera error and its sources into one message
fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}
