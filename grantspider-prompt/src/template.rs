use std::collections::HashMap;

use grantspider_core::Value;
use regex::Regex;
use thiserror::Error;

const PLACEHOLDER: &str = r"\{\{\s*(\w+)\s*\}\}";

#[derive(Debug, Error, PartialEq)]
pub enum PromptError {
    #[error("prompt variable '{0}' was not provided")]
    MissingVariable(String),
    #[error("invalid placeholder pattern: {0}")]
    Pattern(String),
}

/// A `{{name}}` template. Rendering fails if a placeholder has no value.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Placeholder names in order of first appearance.
    pub fn variables(&self) -> Result<Vec<String>, PromptError> {
        let pattern = placeholder()?;
        let mut names: Vec<String> = Vec::new();
        for caps in pattern.captures_iter(&self.template) {
            let name = caps[1].to_string();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }

    pub fn render(&self, vars: &HashMap<String, Value>) -> Result<String, PromptError> {
        let pattern = placeholder()?;
        if let Some(missing) = pattern
            .captures_iter(&self.template)
            .map(|caps| caps[1].to_string())
            .find(|name| !vars.contains_key(name))
        {
            return Err(PromptError::MissingVariable(missing));
        }

        let rendered = pattern.replace_all(&self.template, |caps: &regex::Captures| {
            match vars.get(&caps[1]) {
                Some(Value::String(text)) => text.clone(),
                Some(value) => value.to_string(),
                None => String::new(),
            }
        });
        Ok(rendered.into_owned())
    }
}

fn placeholder() -> Result<Regex, PromptError> {
    Regex::new(PLACEHOLDER).map_err(|err| PromptError::Pattern(err.to_string()))
}
