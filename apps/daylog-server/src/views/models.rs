use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use daylog_core::domain::{Attachment, EVENT_TIME_FORMAT, Post};
use daylog_core::pagination::PaginationLink;
use daylog_core::ports::YearCount;
use daylog_core::services::{Listing, thumbnail_path};

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// URL under which a blob path is served.
pub fn upload_url(path: &str) -> String {
    format!("/uploads/{path}")
}

/// [`upload_url`] forcing a download.
pub fn download_url(path: &str) -> String {
    format!("/uploads/{path}?content-disposition=attachment")
}

#[derive(Debug, Serialize)]
pub struct LoginView {
    pub failed: bool,
}

#[derive(Debug, Serialize)]
pub struct AttachmentView {
    pub thumbnail_url: String,
    pub href: String,
}

impl From<&Attachment> for AttachmentView {
    fn from(attachment: &Attachment) -> Self {
        Self {
            thumbnail_url: upload_url(&thumbnail_path(&attachment.file_hash)),
            href: download_url(&attachment.file_path),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostView {
    pub id: String,
    pub title: Option<String>,
    pub body: String,
    pub event_time: String,
    pub attachments: Vec<AttachmentView>,
}

impl PostView {
    pub fn new(post: &Post, attachments: &[Attachment]) -> Self {
        Self {
            id: post.id.to_string(),
            title: post.title.clone(),
            body: post.body.clone(),
            event_time: post.event_time.format(DISPLAY_FORMAT).to_string(),
            attachments: attachments.iter().map(AttachmentView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct YearView {
    pub year: i32,
    pub count: u64,
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct IndexView {
    pub posts: Vec<PostView>,
    pub total: u64,
    pub page: u64,
    pub pages: Vec<PaginationLink>,
    pub years: Vec<YearView>,
    pub search: Option<String>,
    pub year: Option<i32>,
    /// Archive access has lapsed; old posts are hidden until the next login.
    pub reauth: bool,
}

impl IndexView {
    pub fn new(
        listing: Listing,
        pages: Vec<PaginationLink>,
        attachments: &HashMap<Uuid, Vec<Attachment>>,
    ) -> Self {
        let active_year = listing.year;
        let posts = listing
            .posts
            .iter()
            .map(|post| {
                let attached = attachments.get(&post.id).map(Vec::as_slice).unwrap_or(&[]);
                PostView::new(post, attached)
            })
            .collect();

        Self {
            posts,
            total: listing.total,
            page: listing.filter.page,
            pages,
            years: listing
                .years
                .iter()
                .map(|YearCount { year, count }| YearView {
                    year: *year,
                    count: *count,
                    active: active_year == Some(*year),
                })
                .collect(),
            search: listing.filter.search,
            year: active_year,
            reauth: listing.archive_restricted,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostFormView {
    /// Where the form posts to.
    pub action: String,
    pub editing: bool,
    pub event_time: String,
    pub title: String,
    pub body: String,
}

impl PostFormView {
    pub fn blank(now: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            action: "/new".to_string(),
            editing: false,
            event_time: now.format(EVENT_TIME_FORMAT).to_string(),
            title: String::new(),
            body: String::new(),
        }
    }

    pub fn edit(post: &Post) -> Self {
        Self {
            action: format!("/posts/{}/edit", post.id),
            editing: true,
            event_time: post.event_time.format(EVENT_TIME_FORMAT).to_string(),
            title: post.title.clone().unwrap_or_default(),
            body: post.body.clone(),
        }
    }
}
