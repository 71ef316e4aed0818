//! Request payloads accepted by the delivery endpoints.
//!
//! Recipients are deliberately lenient. Email `to` may be a bare address,
//! an object with an `address` field, or an array mixing both; SMS `to`
//! works the same with `phone`. Array items of any other shape are skipped.
//!
//! Field names follow the camelCase wire schema (`senderName`, `isHtml`);
//! the snake_case spellings are accepted as aliases.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /v3/email`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailRequest {
    /// Sender; selects the outgoing account.
    pub from: EmailContact,
    /// Recipients, in any accepted shape.
    #[serde(default)]
    pub to: Value,
    /// Subject line.
    #[serde(default)]
    pub subject: String,
    /// Message body.
    #[serde(default)]
    pub content: Option<Content>,
}

/// An email address with an optional display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContact {
    /// The address.
    pub address: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Body of `POST /v3/sms`.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsRequest {
    /// Alphanumeric sender shown to the recipient.
    #[serde(default, rename = "senderName", alias = "sender_name")]
    pub sender_name: Option<String>,
    /// Recipients, in any accepted shape.
    #[serde(default)]
    pub to: Value,
    /// Message body.
    #[serde(default)]
    pub content: Option<Content>,
}

/// Message content: literal text or a named template.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Literal body.
    Inline {
        /// The text.
        body: String,
        /// Whether `body` is HTML (email only).
        #[serde(default, rename = "isHtml", alias = "is_html")]
        is_html: bool,
    },
    /// Template reference.
    Template {
        /// The template to render.
        template: TemplateRef,
    },
}

/// A template name and its parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateRef {
    /// Template name.
    pub name: String,
    /// Template parameters.
    #[serde(default)]
    pub data: Value,
}

impl Content {
    /// The body text and whether it is HTML.
    ///
    /// Templates are not rendered here; the delivery backend receives a
    /// description of the template reference instead.
    #[must_use]
    pub fn render(&self) -> (String, bool) {
        match self {
            Self::Inline { body, is_html } => (body.clone(), *is_html),
            Self::Template { template } => (
                format!("Template: {}, Data: {}", template.name, template.data),
                false,
            ),
        }
    }
}

/// Email recipients found in `to`.
#[must_use]
pub fn email_recipients(to: &Value) -> Vec<String> {
    recipients(to, "address")
}

/// Phone numbers found in `to`.
#[must_use]
pub fn sms_recipients(to: &Value) -> Vec<String> {
    recipients(to, "phone")
}

fn recipients(to: &Value, field: &str) -> Vec<String> {
    match to {
        Value::Array(items) => items.iter().filter_map(|v| single(v, field)).collect(),
        other => single(other, field).into_iter().collect(),
    }
}

fn single(value: &Value, field: &str) -> Option<String> {
    let text = match value {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get(field)?.as_str()?,
        _ => return None,
    };
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_should_extract_email_recipients_in_every_shape() {
        assert_eq!(email_recipients(&json!("a@example.com")), vec!["a@example.com"]);
        assert_eq!(
            email_recipients(&json!({"address": "b@example.com", "name": "B"})),
            vec!["b@example.com"]
        );
        assert_eq!(
            email_recipients(&json!([
                "a@example.com",
                {"address": "b@example.com"},
                42,
                {"phone": "+46"},
            ])),
            vec!["a@example.com", "b@example.com"]
        );
    }

    #[test]
    fn test_should_extract_sms_recipients_in_every_shape() {
        assert_eq!(sms_recipients(&json!("+46700000000")), vec!["+46700000000"]);
        assert_eq!(sms_recipients(&json!({"phone": "+46700000001"})), vec!["+46700000001"]);
        assert_eq!(
            sms_recipients(&json!(["+46700000000", {"phone": "+46700000001"}])),
            vec!["+46700000000", "+46700000001"]
        );
    }

    #[test]
    fn test_should_find_no_recipients_in_empty_values() {
        assert!(email_recipients(&Value::Null).is_empty());
        assert!(email_recipients(&json!([])).is_empty());
        assert!(email_recipients(&json!("  ")).is_empty());
        assert!(sms_recipients(&json!({"address": "a@example.com"})).is_empty());
    }

    #[test]
    fn test_should_parse_inline_and_template_content() {
        let inline: Content =
            serde_json::from_value(json!({"body": "<b>hi</b>", "is_html": true})).unwrap();
        assert_eq!(inline.render(), ("<b>hi</b>".to_owned(), true));

        let template: Content = serde_json::from_value(json!({
            "template": {"name": "welcome", "data": {"n": 1}},
        }))
        .unwrap();
        assert_eq!(
            template.render(),
            (r#"Template: welcome, Data: {"n":1}"#.to_owned(), false)
        );
    }

    #[test]
    fn test_should_parse_email_request() {
        let req: EmailRequest = serde_json::from_value(json!({
            "from": {"address": "support@example.com"},
            "to": ["a@example.com"],
            "subject": "Hello",
            "content": {"body": "Hi"},
        }))
        .unwrap();
        assert_eq!(req.from.address, "support@example.com");
        assert_eq!(req.subject, "Hello");
        assert_eq!(email_recipients(&req.to), vec!["a@example.com"]);
    }

    #[test]
    fn test_should_parse_camel_case_fields() {
        let sms: SmsRequest = serde_json::from_value(json!({
            "senderName": "Acme",
            "to": "+46700000000",
            "content": {"body": "hi"},
        }))
        .unwrap();
        assert_eq!(sms.sender_name.as_deref(), Some("Acme"));

        let content: Content =
            serde_json::from_value(json!({"body": "<b>hi</b>", "isHtml": true})).unwrap();
        assert_eq!(content.render(), ("<b>hi</b>".to_owned(), true));
    }
}
