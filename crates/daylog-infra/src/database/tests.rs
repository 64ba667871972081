use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use migration::{Migrator, MigratorTrait};
use sea_orm::{DatabaseBackend, DbConn, MockDatabase};

use daylog_core::domain::{Attachment, Device, Post, PostDraft};
use daylog_core::filter::PostQuery;
use daylog_core::ports::{
    AttachmentRepository, BaseRepository, DeviceRepository, PostRepository, YearCount,
};

use super::entity::post;
use super::{
    DatabaseConfig, SqliteAttachmentRepository, SqliteDeviceRepository, SqlitePostRepository,
    connect,
};

async fn migrated() -> DbConn {
    let db = connect(&DatabaseConfig::in_memory()).await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    db
}

fn post_repo(db: impl Into<Arc<DbConn>>) -> Arc<dyn PostRepository> {
    Arc::new(SqlitePostRepository::new(db))
}

fn post(event_time: &str, body: &str) -> Post {
    Post::new(&PostDraft::parse(event_time, "", body, "").unwrap())
}

fn query(limit: u64) -> PostQuery {
    PostQuery {
        limit,
        ..PostQuery::default()
    }
}

#[tokio::test]
async fn test_find_post_by_id() {
    let post_id = uuid::Uuid::new_v4();
    let now = Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Sqlite)
        .append_query_results(vec![vec![post::Model {
            id: post_id,
            created_at: now,
            updated_at: None,
            deleted_at: None,
            event_time: now,
            title: Some("Test Post".to_owned()),
            body: "Content".to_owned(),
        }]])
        .into_connection();

    let repo = SqlitePostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.title.as_deref(), Some("Test Post"));
    assert_eq!(post.id, post_id);
}

#[tokio::test]
async fn test_save_inserts_then_updates() {
    let repo = post_repo(migrated().await);
    let mut saved = repo.save(post("2024-02-03T10:00", "first")).await.unwrap();

    saved.body = "second".to_string();
    repo.save(saved.clone()).await.unwrap();

    let loaded = repo.find_by_id(saved.id).await.unwrap().unwrap();
    assert_eq!(loaded.body, "second");
    assert_eq!(repo.query(&query(10)).await.unwrap().total, 1);
}

#[tokio::test]
async fn test_query_orders_and_slices() {
    let repo = post_repo(migrated().await);
    for day in 1..=9 {
        repo.save(post(&format!("2024-03-0{day}T08:00"), "entry"))
            .await
            .unwrap();
    }

    let page = repo
        .query(&PostQuery {
            offset: 3,
            limit: 4,
            ..PostQuery::default()
        })
        .await
        .unwrap();

    assert_eq!(page.total, 9);
    let days: Vec<u32> = page
        .posts
        .iter()
        .map(|p| chrono::Datelike::day(&p.event_time))
        .collect();
    assert_eq!(days, vec![6, 5, 4, 3]);
}

#[tokio::test]
async fn test_query_filters() {
    let repo = post_repo(migrated().await);
    repo.save(post("2022-12-31T23:59", "Winter TEA")).await.unwrap();
    repo.save(post("2023-01-01T00:00", "new year")).await.unwrap();
    repo.save(post("2023-06-01T12:00", "green tea")).await.unwrap();
    repo.save(post("2023-07-01T12:00", "100% sure")).await.unwrap();
    let mut deleted = post("2023-08-01T12:00", "tea deleted");
    deleted.soft_delete(Utc::now());
    repo.save(deleted).await.unwrap();

    let by_year = repo
        .query(&PostQuery {
            year: Some(2023),
            ..query(10)
        })
        .await
        .unwrap();
    assert_eq!(by_year.total, 3);

    let by_search = repo
        .query(&PostQuery {
            search: Some("Tea".to_string()),
            ..query(10)
        })
        .await
        .unwrap();
    assert_eq!(by_search.total, 2);

    let wildcard = repo
        .query(&PostQuery {
            search: Some("%".to_string()),
            ..query(10)
        })
        .await
        .unwrap();
    assert_eq!(wildcard.total, 1);
    assert_eq!(wildcard.posts[0].body, "100% sure");

    let cutoff = Utc.with_ymd_and_hms(2023, 6, 1, 12, 0, 0).unwrap();
    let recent = repo
        .query(&PostQuery {
            newer_than: Some(cutoff),
            ..query(10)
        })
        .await
        .unwrap();
    assert_eq!(recent.total, 1);
    assert_eq!(recent.posts[0].body, "100% sure");
}

#[tokio::test]
async fn test_sql_agrees_with_in_memory_predicate() {
    let repo = post_repo(migrated().await);
    let mut all = Vec::new();
    for (i, when) in [
        "2021-01-01T00:00",
        "2021-12-31T23:59",
        "2022-05-05T05:05",
        "2024-02-29T10:00",
    ]
    .into_iter()
    .enumerate()
    {
        let p = post(when, if i % 2 == 0 { "Walk" } else { "read" });
        all.push(repo.save(p).await.unwrap());
    }

    let queries = [
        PostQuery {
            year: Some(2021),
            ..query(50)
        },
        PostQuery {
            search: Some("walk".to_string()),
            ..query(50)
        },
        PostQuery {
            newer_than: Some(Utc.with_ymd_and_hms(2021, 12, 31, 23, 59, 0).unwrap()),
            ..query(50)
        },
    ];

    for q in queries {
        let expected = all.iter().filter(|p| q.matches(p)).count() as u64;
        assert_eq!(repo.query(&q).await.unwrap().total, expected, "{q:?}");
    }
}

#[tokio::test]
async fn test_find_live_skips_deleted() {
    let repo = post_repo(migrated().await);
    let mut p = repo.save(post("2024-01-01T00:00", "x")).await.unwrap();
    assert!(repo.find_live(p.id).await.unwrap().is_some());

    p.soft_delete(Utc::now());
    repo.save(p.clone()).await.unwrap();

    assert!(repo.find_live(p.id).await.unwrap().is_none());
    assert!(repo.find_by_id(p.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_year_counts_cover_live_posts() {
    let repo = post_repo(migrated().await);
    repo.save(post("2021-03-01T00:00", "a")).await.unwrap();
    repo.save(post("2023-03-01T00:00", "b")).await.unwrap();
    repo.save(post("2023-04-01T00:00", "c")).await.unwrap();
    let mut gone = post("2022-01-01T00:00", "d");
    gone.soft_delete(Utc::now());
    repo.save(gone).await.unwrap();

    assert_eq!(
        repo.year_counts().await.unwrap(),
        vec![
            YearCount {
                year: 2023,
                count: 2
            },
            YearCount {
                year: 2021,
                count: 1
            },
        ]
    );
}

#[tokio::test]
async fn test_link_attachments() {
    let db = Arc::new(migrated().await);
    let posts = post_repo(db.clone());
    let attachments: Arc<dyn AttachmentRepository> =
        Arc::new(SqliteAttachmentRepository::new(db));

    let owner = posts.save(post("2024-01-01T00:00", "x")).await.unwrap();
    let a = attachments
        .save(Attachment::new("aa/aa.png", "aa"))
        .await
        .unwrap();
    let b = attachments
        .save(Attachment::new("bb/bb.png", "bb"))
        .await
        .unwrap();

    let touched = attachments
        .link_to_post(owner.id, &[a.id, uuid::Uuid::new_v4()])
        .await
        .unwrap();
    assert_eq!(touched, 1);

    let linked = attachments.find_by_post_ids(&[owner.id]).await.unwrap();
    assert_eq!(linked.len(), 1);
    assert!(linked[0].in_use);
    assert_eq!(linked[0].post_id, Some(owner.id));

    let unlinked = attachments.find_by_ids(&[b.id]).await.unwrap();
    assert!(!unlinked[0].in_use);
    assert!(attachments.find_by_ids(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_claimed_attachment_keeps_its_post() {
    let db = Arc::new(migrated().await);
    let posts = post_repo(db.clone());
    let attachments: Arc<dyn AttachmentRepository> =
        Arc::new(SqliteAttachmentRepository::new(db));

    let first = posts.save(post("2024-01-01T00:00", "first")).await.unwrap();
    let second = posts.save(post("2024-01-02T00:00", "second")).await.unwrap();
    let a = attachments
        .save(Attachment::new("aa/aa.png", "aa"))
        .await
        .unwrap();

    assert_eq!(attachments.link_to_post(first.id, &[a.id]).await.unwrap(), 1);
    assert_eq!(attachments.link_to_post(second.id, &[a.id]).await.unwrap(), 0);

    let stored = attachments.find_by_id(a.id).await.unwrap().unwrap();
    assert_eq!(stored.post_id, Some(first.id));
}

#[tokio::test]
async fn test_offset_beyond_sqlite_range_is_empty() {
    let repo = post_repo(migrated().await);
    repo.save(post("2024-01-01T00:00", "only")).await.unwrap();

    for offset in [i64::MAX as u64, i64::MAX as u64 + 1, u64::MAX] {
        let page = repo
            .query(&PostQuery {
                offset,
                limit: 10,
                ..PostQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1, "{offset}");
        assert!(page.posts.is_empty(), "{offset}");
    }
}

#[tokio::test]
async fn test_delete_expired_devices() {
    let repo: Arc<dyn DeviceRepository> = Arc::new(SqliteDeviceRepository::new(migrated().await));
    let now = Utc::now();
    let old = repo
        .save(Device::new("old", now - Duration::days(70)))
        .await
        .unwrap();
    let fresh = repo.save(Device::new("fresh", now)).await.unwrap();

    let purged = repo
        .delete_created_until(now - Duration::days(62))
        .await
        .unwrap();

    assert_eq!(purged, 1);
    assert!(repo.find_by_id(old.id).await.unwrap().is_none());
    assert!(repo.find_by_id(fresh.id).await.unwrap().is_some());
}
