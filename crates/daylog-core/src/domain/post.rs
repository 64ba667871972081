use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Wire format of `event_time` form values (`datetime-local` inputs).
pub const EVENT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Post entity - one journal entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-delete marker. Deleted posts are never physically removed.
    pub deleted_at: Option<DateTime<Utc>>,
    /// The moment the entry is about, chosen by the author.
    pub event_time: DateTime<Utc>,
    pub title: Option<String>,
    pub body: String,
}

impl Post {
    /// Create a new post from a validated draft.
    pub fn new(draft: &PostDraft) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
            event_time: draft.event_time,
            title: draft.title.clone(),
            body: draft.body.clone(),
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Overwrite the editable fields in place.
    pub fn apply(&mut self, draft: &PostDraft, now: DateTime<Utc>) {
        self.event_time = draft.event_time;
        self.title = draft.title.clone();
        self.body = draft.body.clone();
        self.updated_at = Some(now);
    }

    pub fn soft_delete(&mut self, now: DateTime<Utc>) {
        if self.deleted_at.is_none() {
            self.deleted_at = Some(now);
        }
    }
}

/// Validated input for creating or editing a post.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    pub event_time: DateTime<Utc>,
    pub title: Option<String>,
    pub body: String,
    pub attachment_ids: Vec<Uuid>,
}

impl PostDraft {
    /// Parse raw form values. Malformed dates or ids are rejected, never
    /// replaced by zero values.
    pub fn parse(
        event_time: &str,
        title: &str,
        body: &str,
        attachment_ids: &str,
    ) -> Result<Self, DomainError> {
        let event_time = parse_event_time(event_time)?;

        let title = title.trim();
        let title = (!title.is_empty()).then(|| title.to_string());

        let attachment_ids = attachment_ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Uuid::parse_str(s)
                    .map_err(|_| DomainError::Validation(format!("invalid attachment id '{s}'")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            event_time,
            title,
            body: body.to_string(),
            attachment_ids,
        })
    }
}

fn parse_event_time(raw: &str) -> Result<DateTime<Utc>, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(DomainError::Validation("event_time is required".to_string()));
    }

    // Some browsers submit seconds when the input has a step attribute.
    NaiveDateTime::parse_from_str(raw, EVENT_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            DomainError::Validation(format!(
                "event_time '{raw}' does not match YYYY-MM-DDThh:mm"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    #[test]
    fn test_parse_draft() {
        let id = Uuid::new_v4();
        let draft = PostDraft::parse(
            "2024-03-09T18:45",
            "  Evening walk ",
            "Saw a heron.",
            &format!(" {id}, "),
        )
        .unwrap();

        assert_eq!(draft.event_time.year(), 2024);
        assert_eq!(draft.event_time.hour(), 18);
        assert_eq!(draft.event_time.minute(), 45);
        assert_eq!(draft.title.as_deref(), Some("Evening walk"));
        assert_eq!(draft.attachment_ids, vec![id]);
    }

    #[test]
    fn test_blank_title_is_none() {
        let draft = PostDraft::parse("2024-03-09T18:45", "   ", "", "").unwrap();
        assert!(draft.title.is_none());
        assert!(draft.attachment_ids.is_empty());
    }

    #[test]
    fn test_rejects_unparseable_date() {
        for raw in ["", "yesterday", "2024-13-01T10:00", "2024-03-09"] {
            let result = PostDraft::parse(raw, "", "body", "");
            assert!(
                matches!(result, Err(DomainError::Validation(_))),
                "accepted {raw:?}"
            );
        }
    }

    #[test]
    fn test_rejects_malformed_attachment_id() {
        let result = PostDraft::parse("2024-03-09T18:45", "", "body", "not-a-uuid");
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_soft_delete_keeps_first_marker() {
        let draft = PostDraft::parse("2024-03-09T18:45", "", "body", "").unwrap();
        let mut post = Post::new(&draft);
        let first = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap();

        post.soft_delete(first);
        post.soft_delete(second);

        assert!(post.is_deleted());
        assert_eq!(post.deleted_at, Some(first));
    }
}
