//! Validation and rendering seams.
//!
//! The engine does not know how entry data is checked or how a module body
//! becomes output. Both steps are supplied by the caller through these
//! traits. Errors are plain messages; the engine attaches the path and id.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::Metadata;

/// Entry data submitted for validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationInput {
    /// Logical id the entry will be stored under.
    pub id: String,
    /// Candidate data (the module's declared metadata, or empty).
    pub data: Metadata,
    /// Absolute path of the source file.
    pub source_path: PathBuf,
}

/// Validation failure message.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

/// Render failure message.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Checks (and may transform) entry data before it is stored.
pub trait Validator: Send + Sync {
    /// Validated data to store for this entry.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when the data does not satisfy the schema.
    fn validate(&self, input: ValidationInput) -> Result<Metadata, ValidationError>;
}

/// Turns a module body into its stored output form.
pub trait Renderer: Send + Sync {
    /// Rendered output for `body`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError`] when the body cannot be rendered.
    fn render(&self, body: &str) -> Result<String, RenderError>;
}

/// Accepts all data unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughValidator;

impl Validator for PassthroughValidator {
    fn validate(&self, input: ValidationInput) -> Result<Metadata, ValidationError> {
        Ok(input.data)
    }
}

impl<F> Renderer for F
where
    F: Fn(&str) -> Result<String, RenderError> + Send + Sync,
{
    fn render(&self, body: &str) -> Result<String, RenderError> {
        self(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_passthrough_returns_data() {
        let data = json!({"title": "Hello"}).as_object().cloned().unwrap();
        let input = ValidationInput {
            id: "posts/hello".into(),
            data: data.clone(),
            source_path: PathBuf::from("/site/content/posts/hello.md"),
        };
        assert_eq!(PassthroughValidator.validate(input).unwrap(), data);
    }

    #[test]
    fn test_closure_renderer() {
        let upper = |body: &str| -> Result<String, RenderError> { Ok(body.to_uppercase()) };
        assert_eq!(upper.render("hi").unwrap(), "HI");
    }
}
