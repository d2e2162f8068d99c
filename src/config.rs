use std::env;

pub const DEFAULT_START_SELECTOR: &str = "#start-button";
pub const DEFAULT_FINISH_SELECTOR: &str = ".finish-button";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinderConfig {
    /// POST target for start clicks; the page used to inject this as a global.
    pub time_block_path: Option<String>,
    pub start_selector: String,
    /// `None` gives the start-only page variant.
    pub finish_selector: Option<String>,
    /// Base for relative targets such as `/time_blocks/42`.
    pub base_url: Option<String>,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            time_block_path: None,
            start_selector: DEFAULT_START_SELECTOR.to_string(),
            finish_selector: Some(DEFAULT_FINISH_SELECTOR.to_string()),
            base_url: None,
        }
    }
}

impl BinderConfig {
    pub fn new(time_block_path: impl Into<String>) -> Self {
        Self {
            time_block_path: Some(time_block_path.into()),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn without_finish(mut self) -> Self {
        self.finish_selector = None;
        self
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let finish_selector = match lookup("FINISH_SELECTOR") {
            None => defaults.finish_selector,
            Some(value) => match value.trim() {
                "" | "off" | "none" => None,
                selector => Some(selector.to_string()),
            },
        };

        Self {
            time_block_path: non_empty("TIME_BLOCK_PATH"),
            start_selector: non_empty("START_SELECTOR").unwrap_or(defaults.start_selector),
            finish_selector,
            base_url: non_empty("TIME_BLOCK_BASE_URL"),
        }
    }
}
