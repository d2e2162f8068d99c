use crate::errors::BinderError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier read off a data attribute. Integer-looking values go over the
/// wire as JSON numbers, everything else as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OpaqueId {
    Number(i64),
    Text(String),
}

impl OpaqueId {
    pub fn from_attribute(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.parse::<i64>() {
            Ok(value) if value.to_string() == trimmed => Self::Number(value),
            _ => Self::Text(raw.to_string()),
        }
    }
}

impl fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartAttributes {
    pub user_id: OpaqueId,
    pub task_id: OpaqueId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishAttributes {
    pub user_id: OpaqueId,
    pub id: OpaqueId,
    pub path: String,
}

impl StartAttributes {
    pub fn read<'a>(
        element: &str,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<Self, BinderError> {
        Ok(Self {
            user_id: required_id(element, &lookup, "user-id")?,
            task_id: required_id(element, &lookup, "task-id")?,
        })
    }
}

impl FinishAttributes {
    pub fn read<'a>(
        element: &str,
        lookup: impl Fn(&str) -> Option<&'a str>,
    ) -> Result<Self, BinderError> {
        Ok(Self {
            user_id: required_id(element, &lookup, "user-id")?,
            id: required_id(element, &lookup, "id")?,
            path: required(element, &lookup, "path")?.trim().to_string(),
        })
    }
}

fn required<'a>(
    element: &str,
    lookup: &impl Fn(&str) -> Option<&'a str>,
    attribute: &'static str,
) -> Result<&'a str, BinderError> {
    match lookup(attribute) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(BinderError::missing_attribute(element, attribute)),
    }
}

fn required_id<'a>(
    element: &str,
    lookup: &impl Fn(&str) -> Option<&'a str>,
    attribute: &'static str,
) -> Result<OpaqueId, BinderError> {
    required(element, lookup, attribute).map(OpaqueId::from_attribute)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRequest {
    pub time_block: StartTimeBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTimeBlock {
    pub user_id: OpaqueId,
    pub task_id: OpaqueId,
}

impl From<StartAttributes> for StartRequest {
    fn from(attrs: StartAttributes) -> Self {
        Self {
            time_block: StartTimeBlock {
                user_id: attrs.user_id,
                task_id: attrs.task_id,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishRequest {
    id: OpaqueId,
    time_block: FinishTimeBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
struct FinishTimeBlock {
    user_id: OpaqueId,
    id: OpaqueId,
    finished: bool,
}

impl FinishRequest {
    pub fn new(user_id: OpaqueId, id: OpaqueId) -> Self {
        Self {
            time_block: FinishTimeBlock {
                user_id,
                id: id.clone(),
                finished: true,
            },
            id,
        }
    }

    pub fn id(&self) -> &OpaqueId {
        &self.id
    }

    pub fn user_id(&self) -> &OpaqueId {
        &self.time_block.user_id
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinishResponse {
    pub data: FinishedTimeBlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinishedTimeBlock {
    pub id: OpaqueId,
    pub end_time: String,
}

pub fn finish_target_id(id: &OpaqueId) -> String {
    format!("tb-{id}")
}

pub fn finish_text(end_time: &str) -> String {
    format!("\n{end_time}\n")
}
