//! Attribute schemas: which fields are declared, computed, sensitive, and
//! which force replacement when they change.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeMode {
    Required,
    Optional,
    /// Set by the control plane only.
    Computed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub name: &'static str,
    pub description: &'static str,
    pub mode: AttributeMode,
    pub requires_replace: bool,
    pub sensitive: bool,
}

impl Attribute {
    fn new(name: &'static str, description: &'static str, mode: AttributeMode) -> Self {
        Self {
            name,
            description,
            mode,
            requires_replace: false,
            sensitive: false,
        }
    }

    pub fn required(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, AttributeMode::Required)
    }

    pub fn optional(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, AttributeMode::Optional)
    }

    pub fn computed(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, AttributeMode::Computed)
    }

    pub fn replace(mut self) -> Self {
        self.requires_replace = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub attributes: Vec<Attribute>,
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn requires_replace(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(|a| a.requires_replace)
    }

    pub fn is_sensitive(&self, name: &str) -> bool {
        self.attribute(name).is_some_and(|a| a.sensitive)
    }
}
