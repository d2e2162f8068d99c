use crate::errors::BinderError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Element {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    /// `data-*` attributes keyed without the `data-` prefix.
    #[serde(default)]
    pub data: BTreeMap<String, String>,
    #[serde(default)]
    pub text: String,
}

impl Element {
    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Self::default()
        }
    }

    pub fn with_class(class: impl Into<String>) -> Self {
        Self {
            classes: vec![class.into()],
            ..Self::default()
        }
    }

    pub fn data(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let key = name.strip_prefix("data-").map(str::to_string).unwrap_or(name);
        self.data.insert(key, value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Short form used in log lines and errors, e.g. `#start-button` or `.finish-button[2]`.
    pub fn describe(&self, index: usize) -> String {
        match (&self.id, self.classes.first()) {
            (Some(id), _) => format!("#{id}"),
            (None, Some(class)) => format!(".{class}[{index}]"),
            (None, None) => format!("element[{index}]"),
        }
    }

    fn matches(&self, selector: &Selector) -> bool {
        match selector {
            Selector::Id(id) => self.id.as_deref() == Some(id.as_str()),
            Selector::Class(class) => self.classes.iter().any(|c| c == class),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    Class(String),
}

impl Selector {
    pub fn parse(raw: &str) -> Result<Self, BinderError> {
        let raw = raw.trim();
        let valid = |name: &str| {
            !name.is_empty()
                && name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };

        if let Some(id) = raw.strip_prefix('#').filter(|name| valid(*name)) {
            return Ok(Self::Id(id.to_string()));
        }
        if let Some(class) = raw.strip_prefix('.').filter(|name| valid(*name)) {
            return Ok(Self::Class(class.to_string()));
        }
        Err(BinderError::InvalidSelector(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Page {
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Page {
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn select(&self, selector: &str) -> Result<Vec<usize>, BinderError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.matches(&selector))
            .map(|(index, _)| index)
            .collect())
    }

    pub fn element(&self, index: usize) -> Option<&Element> {
        self.elements.get(index)
    }

    pub fn element_by_id(&self, id: &str) -> Option<&Element> {
        self.elements
            .iter()
            .find(|element| element.id.as_deref() == Some(id))
    }

    pub fn data(&self, index: usize, name: &str) -> Option<&str> {
        self.element(index)?.data.get(name).map(String::as_str)
    }

    /// Replaces the text of the first element carrying `id`.
    pub fn set_text_by_id(&mut self, id: &str, text: impl Into<String>) -> Result<(), BinderError> {
        let element = self
            .elements
            .iter_mut()
            .find(|element| element.id.as_deref() == Some(id))
            .ok_or_else(|| BinderError::MissingTarget(id.to_string()))?;
        element.text = text.into();
        Ok(())
    }
}
