use std::fmt::Display;

use serde::Deserialize;

pub const DEFAULT_USAGE_LIMIT_REPLY: &str =
    "You have reached the usage limit of the current plan. Ask the bot owner to upgrade the plan to keep chatting.";

pub const DEFAULT_UNKNOWN_ERROR_REPLY: &str =
    "An unknown error happened. Please reach out to the bot owner for support.";

pub const DEFAULT_ERROR_PREFIX: &str = "An error happened while creating a response: ";

/// Text that marks a provider error as an exhausted quota
const USAGE_LIMIT_NEEDLE: &str = "usage limit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UsageLimit,
    Other,
    Unknown,
}

impl FailureKind {
    pub fn classify<E: Display + ?Sized>(error: Option<&E>) -> Self {
        match error {
            None => FailureKind::Unknown,
            Some(e) if e.to_string().contains(USAGE_LIMIT_NEEDLE) => FailureKind::UsageLimit,
            Some(_) => FailureKind::Other,
        }
    }
}

/// User-facing replies sent in place of a generated answer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReplyTemplates {
    pub usage_limit: String,
    pub unknown_error: String,
    /// Prepended to the error text for every other failure
    pub error_prefix: String,
}

impl Default for ReplyTemplates {
    fn default() -> Self {
        Self {
            usage_limit: DEFAULT_USAGE_LIMIT_REPLY.to_string(),
            unknown_error: DEFAULT_UNKNOWN_ERROR_REPLY.to_string(),
            error_prefix: DEFAULT_ERROR_PREFIX.to_string(),
        }
    }
}

impl ReplyTemplates {
    pub fn format<E: Display + ?Sized>(&self, error: Option<&E>) -> String {
        match (FailureKind::classify(error), error) {
            (FailureKind::UsageLimit, _) => self.usage_limit.clone(),
            (FailureKind::Other, Some(e)) => format!("{}{}", self.error_prefix, e),
            _ => self.unknown_error.clone(),
        }
    }
}

/// [`ReplyTemplates::format`] with the default texts
pub fn format_error<E: Display + ?Sized>(error: Option<&E>) -> String {
    ReplyTemplates::default().format(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_unknown() {
        assert_eq!(format_error::<str>(None), DEFAULT_UNKNOWN_ERROR_REPLY);
    }

    #[test]
    fn test_usage_limit() {
        assert_eq!(
            format_error(Some("OpenAI usage limit exceeded: quota")),
            DEFAULT_USAGE_LIMIT_REPLY
        );
    }

    #[test]
    fn test_other_error_includes_detail() {
        assert_eq!(
            format_error(Some("connection reset")),
            "An error happened while creating a response: connection reset"
        );
    }

    #[test]
    fn test_custom_templates() {
        let templates = ReplyTemplates {
            usage_limit: "out of credits".to_string(),
            ..ReplyTemplates::default()
        };
        assert_eq!(templates.format(Some("usage limit")), "out of credits");
        assert_eq!(FailureKind::classify(Some("Usage Limit")), FailureKind::Other);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let templates: ReplyTemplates = serde_json::from_str(r#"{"unknown_error":"?"}"#).unwrap();
        assert_eq!(templates.unknown_error, "?");
        assert_eq!(templates.usage_limit, DEFAULT_USAGE_LIMIT_REPLY);
    }
}
