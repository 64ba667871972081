//! Post lifecycle: create, edit, soft-delete, and attachment lookup.

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::{Attachment, Post, PostDraft};
use crate::error::DomainError;
use crate::ports::{AttachmentRepository, Clock, PostRepository};

pub struct Journal {
    posts: Arc<dyn PostRepository>,
    attachments: Arc<dyn AttachmentRepository>,
    clock: Arc<dyn Clock>,
}

impl Journal {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        attachments: Arc<dyn AttachmentRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            posts,
            attachments,
            clock,
        }
    }

    /// Fetch a live post. Soft-deleted posts are reported as not found.
    pub async fn get(&self, id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_live(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: "post",
                id,
            })
    }

    /// Save a new post and claim the attachments it references.
    ///
    /// Every referenced attachment must exist and be unclaimed, otherwise
    /// nothing is written.
    pub async fn create(&self, draft: PostDraft) -> Result<Post, DomainError> {
        let claims = self.claimable(&draft.attachment_ids).await?;

        let mut post = Post::new(&draft);
        post.created_at = self.clock.now();
        let post = self.posts.save(post).await?;

        if !claims.is_empty() {
            let linked = self.attachments.link_to_post(post.id, &claims).await?;
            if linked < claims.len() as u64 {
                tracing::warn!(
                    post_id = %post.id,
                    linked,
                    requested = claims.len(),
                    "Attachments claimed concurrently"
                );
            } else {
                tracing::debug!(post_id = %post.id, linked, "Attachments linked");
            }
        }

        tracing::info!(post_id = %post.id, "Post created");
        Ok(post)
    }

    /// Overwrite `event_time`, `title` and `body` in place.
    pub async fn update(&self, id: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        let mut post = self.get(id).await?;
        post.apply(&draft, self.clock.now());
        let post = self.posts.save(post).await?;

        tracing::info!(post_id = %post.id, "Post updated");
        Ok(post)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut post = self.get(id).await?;
        post.soft_delete(self.clock.now());
        self.posts.save(post).await?;

        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    /// Deduplicated ids, after checking each names an unclaimed attachment.
    async fn claimable(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, DomainError> {
        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(id) {
                unique.push(*id);
            }
        }
        if unique.is_empty() {
            return Ok(unique);
        }

        let found = self.attachments.find_by_ids(&unique).await?;
        for id in &unique {
            match found.iter().find(|a| a.id == *id) {
                None => {
                    return Err(DomainError::NotFound {
                        entity_type: "attachment",
                        id: *id,
                    });
                }
                Some(attachment) if attachment.in_use => {
                    return Err(DomainError::Validation(format!(
                        "attachment {id} already belongs to a post"
                    )));
                }
                Some(_) => {}
            }
        }
        Ok(unique)
    }

    /// Attachments of the given posts, grouped by post id.
    pub async fn attachments_for(
        &self,
        posts: &[Post],
    ) -> Result<HashMap<Uuid, Vec<Attachment>>, DomainError> {
        if posts.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<Uuid> = posts.iter().map(|p| p.id).collect();
        let mut grouped: HashMap<Uuid, Vec<Attachment>> = HashMap::new();
        for attachment in self.attachments.find_by_post_ids(&ids).await? {
            if let Some(post_id) = attachment.post_id {
                grouped.entry(post_id).or_default().push(attachment);
            }
        }
        Ok(grouped)
    }
}
