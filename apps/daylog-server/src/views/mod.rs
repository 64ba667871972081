//! HTML rendering: embedded minijinja templates and their view models.

mod models;

pub use models::{
    AttachmentView, IndexView, LoginView, PostFormView, PostView, YearView, download_url,
    upload_url,
};

use minijinja::Environment;
use serde::Serialize;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../../templates/base.html")),
    ("login.html", include_str!("../../templates/login.html")),
    ("index.html", include_str!("../../templates/index.html")),
    ("post_form.html", include_str!("../../templates/post_form.html")),
];

/// Compiled template set. Built once at startup and shared.
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render<T: Serialize>(&self, name: &str, view: &T) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(view)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daylog_core::pagination::PaginationLink;

    #[test]
    fn test_login_renders_failure_notice() {
        let views = Views::new().unwrap();

        let ok = views.render("login.html", &LoginView { failed: false }).unwrap();
        let failed = views.render("login.html", &LoginView { failed: true }).unwrap();

        assert!(ok.contains("name=\"password\""));
        assert!(!ok.contains("Wrong password"));
        assert!(failed.contains("Wrong password"));
    }

    #[test]
    fn test_index_escapes_post_body() {
        let views = Views::new().unwrap();
        let view = IndexView {
            posts: vec![PostView {
                id: "p1".to_string(),
                title: Some("Morning".to_string()),
                body: "<script>alert(1)</script>".to_string(),
                event_time: "2024-03-01 07:30".to_string(),
                attachments: vec![AttachmentView {
                    thumbnail_url: "/uploads/ab/ab-thumb.jpg".to_string(),
                    href: "/uploads/ab/ab.png?content-disposition=attachment".to_string(),
                }],
            }],
            total: 1,
            page: 1,
            pages: vec![PaginationLink {
                ord: 1,
                params: "p=1".to_string(),
            }],
            years: vec![YearView {
                year: 2024,
                count: 1,
                active: false,
            }],
            search: None,
            year: None,
            reauth: true,
        };

        let html = views.render("index.html", &view).unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>alert"));
        assert!(html.contains("&#x2f;uploads&#x2f;ab&#x2f;ab-thumb.jpg"));
        assert!(html.contains("?p=1"));
        assert!(html.contains("data-reauth"));
    }
}
