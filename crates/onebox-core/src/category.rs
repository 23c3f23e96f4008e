//! Lead-status categories and the normalizer for free-text classifier output.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lead status assigned to an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    /// The sender wants to move forward.
    Interested,
    /// A meeting has been scheduled.
    MeetingBooked,
    /// The sender declined.
    NotInterested,
    /// Unsolicited or junk mail.
    Spam,
    /// Auto-reply from an absent recipient.
    OutOfOffice,
    /// Classification failed or was inconclusive.
    #[default]
    Unknown,
}

impl Category {
    /// Every category, in display order.
    pub const ALL: [Self; 6] = [
        Self::Interested,
        Self::MeetingBooked,
        Self::NotInterested,
        Self::Spam,
        Self::OutOfOffice,
        Self::Unknown,
    ];

    /// Canonical label, as shown to users and stored in the index.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Interested => "Interested",
            Self::MeetingBooked => "Meeting Booked",
            Self::NotInterested => "Not Interested",
            Self::Spam => "Spam",
            Self::OutOfOffice => "Out of Office",
            Self::Unknown => "Unknown",
        }
    }

    /// Whether this is the category that triggers lead notifications.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        matches!(self, Self::Interested)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(normalize(Some(s)))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(normalize(Some(&raw)))
    }
}

/// Maps free-text classifier output onto a [`Category`].
///
/// Case-insensitive and total: absent or unrecognised input yields
/// [`Category::Unknown`]. The negative phrase is checked before the positive
/// one because `"interested"` is a substring of `"not interested"`.
#[must_use]
pub fn normalize(raw: Option<&str>) -> Category {
    let Some(raw) = raw else {
        return Category::Unknown;
    };
    let text = raw.trim().to_lowercase();
    if text.is_empty() {
        return Category::Unknown;
    }

    if text.contains("not interested") || text.contains("notinterested") {
        return Category::NotInterested;
    }
    if text.contains("interested") {
        return Category::Interested;
    }
    if text.contains("meeting") {
        return Category::MeetingBooked;
    }
    if text.contains("spam") {
        return Category::Spam;
    }
    if text.contains("out of office") || text.contains("out-of-office") || text.contains("ooo") {
        return Category::OutOfOffice;
    }

    Category::ALL
        .into_iter()
        .find(|category| category.as_str().to_lowercase() == text)
        .unwrap_or(Category::Unknown)
}
