//! Email document model.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Date of an email as received: either a formatted string or an epoch value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmailDate {
    /// Epoch seconds or milliseconds.
    Epoch(i64),
    /// RFC 3339 / RFC 2822 or any other display string.
    Text(String),
}

impl EmailDate {
    /// Epoch values above this are taken to be milliseconds.
    const MILLIS_THRESHOLD: i64 = 100_000_000_000;

    /// Best-effort conversion to a UTC timestamp.
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Epoch(value) if value.abs() >= Self::MILLIS_THRESHOLD => {
                Utc.timestamp_millis_opt(*value).single()
            }
            Self::Epoch(value) => Utc.timestamp_opt(*value, 0).single(),
            Self::Text(text) => DateTime::parse_from_rfc3339(text)
                .or_else(|_| DateTime::parse_from_rfc2822(text))
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
        }
    }
}

/// One email tracked by the pipeline.
///
/// Every field except `id` is optional so the same type doubles as a
/// partial update for [`EmailDocument::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDocument {
    /// Externally assigned identity.
    pub id: String,
    /// Account the message was fetched from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    /// Folder the message lives in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Sender display address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Recipient display address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Subject line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Plain text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Date received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<EmailDate>,
    /// Lead status, set once classification has run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    /// Set once the positive-category notification has been attempted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified_interested: Option<bool>,
}

impl EmailDocument {
    /// Create a bare document carrying only its identity.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Set the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the sender.
    #[must_use]
    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Set the folder.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Set the account.
    #[must_use]
    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Set the date.
    #[must_use]
    pub fn with_date(mut self, date: EmailDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Whether the positive-category notification has already fired.
    #[must_use]
    pub fn is_notified_interested(&self) -> bool {
        self.notified_interested.unwrap_or(false)
    }

    /// Shallow field merge: present fields in `partial` overwrite, absent
    /// fields keep their current value.
    ///
    /// `notified_interested` is sticky and cannot be cleared by a merge.
    pub fn merge(&mut self, partial: Self) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.account, partial.account);
        take(&mut self.folder, partial.folder);
        take(&mut self.from, partial.from);
        take(&mut self.to, partial.to);
        take(&mut self.subject, partial.subject);
        take(&mut self.body, partial.body);
        take(&mut self.date, partial.date);
        take(&mut self.category, partial.category);
        if partial.notified_interested == Some(true) {
            self.notified_interested = Some(true);
        } else if self.notified_interested.is_none() {
            self.notified_interested = partial.notified_interested;
        }
    }

    /// Text fed to full-text matching: subject and body separated by a space.
    #[must_use]
    pub fn search_text(&self) -> String {
        format!(
            "{} {}",
            self.subject.as_deref().unwrap_or_default(),
            self.body.as_deref().unwrap_or_default()
        )
    }
}

/// Joins subject and body the way classification expects them.
#[must_use]
pub fn classification_text(subject: Option<&str>, body: Option<&str>) -> String {
    format!(
        "{}\n\n{}",
        subject.unwrap_or_default(),
        body.unwrap_or_default()
    )
}

/// A newly discovered message, as delivered by the mail source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncomingEmail {
    /// Message identity.
    pub id: String,
    /// Account the message was fetched from.
    #[serde(default)]
    pub account: Option<String>,
    /// Folder the message was found in.
    #[serde(default)]
    pub folder: Option<String>,
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Plain text body.
    #[serde(default)]
    pub body: Option<String>,
    /// Sender.
    #[serde(default)]
    pub from: Option<String>,
    /// Recipient.
    #[serde(default)]
    pub to: Option<String>,
    /// Date received.
    #[serde(default)]
    pub date: Option<EmailDate>,
}

impl From<IncomingEmail> for EmailDocument {
    fn from(email: IncomingEmail) -> Self {
        Self {
            id: email.id,
            account: email.account,
            folder: email.folder,
            from: email.from,
            to: email.to,
            subject: email.subject,
            body: email.body,
            date: email.date,
            category: None,
            notified_interested: None,
        }
    }
}

/// Display fields supplied with a manual categorize request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DisplayFields {
    /// Subject line.
    #[serde(default)]
    pub subject: Option<String>,
    /// Plain text body.
    #[serde(default)]
    pub body: Option<String>,
    /// Sender.
    #[serde(default)]
    pub from: Option<String>,
    /// Recipient.
    #[serde(default)]
    pub to: Option<String>,
    /// Date received.
    #[serde(default)]
    pub date: Option<EmailDate>,
}

impl DisplayFields {
    /// Turn these fields into a partial document for `id`.
    #[must_use]
    pub fn into_partial(self, id: impl Into<String>) -> EmailDocument {
        EmailDocument {
            id: id.into(),
            from: self.from,
            to: self.to,
            subject: self.subject,
            body: self.body,
            date: self.date,
            ..EmailDocument::default()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_absent_fields() {
        let mut doc = EmailDocument::new("e1")
            .with_subject("Hello")
            .with_folder("work");
        doc.merge(EmailDocument::new("e1").with_body("meeting notes"));

        assert_eq!(doc.subject.as_deref(), Some("Hello"));
        assert_eq!(doc.folder.as_deref(), Some("work"));
        assert_eq!(doc.body.as_deref(), Some("meeting notes"));
    }

    #[test]
    fn test_merge_overwrites_present_fields() {
        let mut doc = EmailDocument::new("e1").with_subject("Old");
        doc.merge(EmailDocument::new("e1").with_subject("New"));
        assert_eq!(doc.subject.as_deref(), Some("New"));
    }

    #[test]
    fn test_notified_flag_is_sticky() {
        let mut doc = EmailDocument::new("e1");
        doc.notified_interested = Some(true);

        let mut reset = EmailDocument::new("e1");
        reset.notified_interested = Some(false);
        doc.merge(reset);

        assert!(doc.is_notified_interested());
    }

    #[test]
    fn test_serializes_camel_case_and_skips_absent() {
        let mut doc = EmailDocument::new("e1").with_subject("Hi");
        doc.category = Some(Category::Interested);
        doc.notified_interested = Some(true);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["notifiedInterested"], true);
        assert_eq!(json["category"], "Interested");
        assert!(json.get("body").is_none());
    }

    #[test]
    fn test_date_accepts_string_or_number() {
        let doc: EmailDocument =
            serde_json::from_str(r#"{"id":"a","date":1700000000}"#).unwrap();
        assert_eq!(doc.date, Some(EmailDate::Epoch(1_700_000_000)));

        let doc: EmailDocument =
            serde_json::from_str(r#"{"id":"b","date":"2024-01-02T03:04:05Z"}"#).unwrap();
        assert_eq!(
            doc.date,
            Some(EmailDate::Text("2024-01-02T03:04:05Z".to_string()))
        );
    }

    #[test]
    fn test_date_to_datetime() {
        let seconds = EmailDate::Epoch(1_700_000_000).to_datetime().unwrap();
        let millis = EmailDate::Epoch(1_700_000_000_000).to_datetime().unwrap();
        assert_eq!(seconds, millis);

        let rfc2822 = EmailDate::Text("Tue, 14 Nov 2023 22:13:20 +0000".into())
            .to_datetime()
            .unwrap();
        assert_eq!(rfc2822, seconds);

        assert!(EmailDate::Text("yesterday".into()).to_datetime().is_none());
    }

    #[test]
    fn test_text_joins() {
        assert_eq!(classification_text(Some("Hi"), None), "Hi\n\n");
        assert_eq!(
            classification_text(Some("Hi"), Some("there")),
            "Hi\n\nthere"
        );
        assert_eq!(EmailDocument::new("e1").with_subject("Hi").search_text(), "Hi ");
    }
}
