//! Release-note templates, rendered with Handlebars in strict mode.
//!
//! Every field the template names must exist in the record; a field that is
//! present but `null` renders empty.

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

/// Template shipped with the binary, used when no template path is given.
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/release-notes.md.hbs");

const NAME: &str = "release-notes";

/// Compiled template, ready to render any number of records.
#[derive(Debug, Clone)]
pub struct Template {
    registry: Handlebars<'static>,
}

impl Template {
    /// Compile template source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] when the source is not valid Handlebars.
    pub fn parse(source: &str) -> Result<Self> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(NAME, source)
            .map_err(template_error)?;
        Ok(Self { registry })
    }

    /// Render against a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] when a referenced field is missing or a
    /// helper fails.
    pub fn render(&self, context: &Value) -> Result<String> {
        self.registry.render(NAME, context).map_err(template_error)
    }

    /// Render against any serializable record.
    ///
    /// # Errors
    ///
    /// Same as [`Template::render`], plus serialization failures.
    pub fn render_record(&self, record: &impl Serialize) -> Result<String> {
        self.registry.render(NAME, record).map_err(template_error)
    }
}

fn template_error(err: impl std::fmt::Display) -> Error {
    Error::Template {
        message: err.to_string(),
    }
}
