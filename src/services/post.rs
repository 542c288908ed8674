//! Post service
//!
//! Posts, their comments and likes. Any authenticated user may read;
//! only the author may change or delete a post or comment. Liking and
//! commenting notify the post's author.

use crate::db::repositories::{CommentRepository, LikeRepository, PostRepository};
use crate::models::{
    Comment, CommentInput, Like, ListParams, NotificationTarget, PagedResult, Post, PostInput,
    PostQuery, UpdatePostInput, User,
};
use crate::services::notification::{NotificationError, NotificationService};
use anyhow::Context;
use std::sync::Arc;

pub const LIKE_VERB: &str = "liked your post";
pub const COMMENT_VERB: &str = "commented on your post";

/// Error types for post operations
#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("{0}")]
    Validation(String),

    #[error("Post not found")]
    PostNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    /// The caller is not the author
    #[error("{0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<NotificationError> for PostError {
    fn from(err: NotificationError) -> Self {
        match err {
            NotificationError::Internal(e) => PostError::Internal(e),
            other => PostError::Internal(anyhow::anyhow!(other)),
        }
    }
}

/// Post service
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    likes: Arc<dyn LikeRepository>,
    notifications: Arc<NotificationService>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        likes: Arc<dyn LikeRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            posts,
            comments,
            likes,
            notifications,
        }
    }

    /// The caller's own posts
    pub async fn list_own(&self, user: &User, query: &PostQuery) -> Result<PagedResult<Post>, PostError> {
        Ok(self
            .posts
            .list_by_author(user.id, query)
            .await
            .context("Failed to list posts")?)
    }

    /// Posts by everyone the caller follows, newest first
    pub async fn feed(&self, user: &User, params: &ListParams) -> Result<PagedResult<Post>, PostError> {
        Ok(self
            .posts
            .feed(user.id, params)
            .await
            .context("Failed to load feed")?)
    }

    pub async fn create(&self, user: &User, input: PostInput) -> Result<Post, PostError> {
        input.validate().map_err(PostError::Validation)?;

        let post = self
            .posts
            .create(user.id, &input)
            .await
            .context("Failed to create post")?;

        tracing::info!(post_id = post.id, author_id = user.id, "Post created");
        Ok(post)
    }

    pub async fn get(&self, id: i64) -> Result<Post, PostError> {
        self.posts
            .get_by_id(id)
            .await
            .context("Failed to get post")?
            .ok_or(PostError::PostNotFound)
    }

    pub async fn update(&self, user: &User, id: i64, input: UpdatePostInput) -> Result<Post, PostError> {
        let mut post = self.get_owned(user, id).await?;
        input.validate().map_err(PostError::Validation)?;

        if let Some(title) = input.title {
            post.title = title;
        }
        if let Some(content) = input.content {
            post.content = content;
        }

        Ok(self.posts.update(&post).await.context("Failed to update post")?)
    }

    pub async fn delete(&self, user: &User, id: i64) -> Result<(), PostError> {
        let post = self.get_owned(user, id).await?;
        self.posts
            .delete(post.id)
            .await
            .context("Failed to delete post")?;
        tracing::info!(post_id = post.id, "Post deleted");
        Ok(())
    }

    /// A post as seen by its author. Anyone else is refused.
    pub async fn get_owned(&self, user: &User, id: i64) -> Result<Post, PostError> {
        let post = self.get(id).await?;
        if !user.owns(post.author_id) {
            return Err(PostError::Forbidden("You do not own this post".to_string()));
        }
        Ok(post)
    }

    pub async fn list_comments(
        &self,
        post_id: i64,
        query: &PostQuery,
    ) -> Result<PagedResult<Comment>, PostError> {
        let post = self.get(post_id).await?;
        Ok(self
            .comments
            .list_by_post(post.id, query)
            .await
            .context("Failed to list comments")?)
    }

    /// Comment on a post and notify its author
    pub async fn create_comment(
        &self,
        user: &User,
        post_id: i64,
        input: CommentInput,
    ) -> Result<Comment, PostError> {
        input.validate().map_err(PostError::Validation)?;
        let post = self.get(post_id).await?;

        let comment = self
            .comments
            .create(post.id, user.id, &input.content)
            .await
            .context("Failed to create comment")?;

        self.notifications
            .notify(
                post.author_id,
                user.id,
                COMMENT_VERB,
                Some(NotificationTarget::post(post.id)),
            )
            .await?;

        Ok(comment)
    }

    /// A comment, which must belong to the given post
    async fn find_comment(&self, post_id: i64, id: i64) -> Result<Comment, PostError> {
        self.comments
            .get_by_id(id)
            .await
            .context("Failed to get comment")?
            .filter(|c| c.post_id == post_id)
            .ok_or(PostError::CommentNotFound)
    }

    pub async fn update_comment(
        &self,
        user: &User,
        post_id: i64,
        id: i64,
        input: CommentInput,
    ) -> Result<Comment, PostError> {
        let mut comment = self.get_owned_comment(user, post_id, id).await?;
        input.validate().map_err(PostError::Validation)?;
        comment.content = input.content;

        Ok(self
            .comments
            .update(&comment)
            .await
            .context("Failed to update comment")?)
    }

    pub async fn delete_comment(&self, user: &User, post_id: i64, id: i64) -> Result<(), PostError> {
        let comment = self.get_owned_comment(user, post_id, id).await?;
        self.comments
            .delete(comment.id)
            .await
            .context("Failed to delete comment")?;
        Ok(())
    }

    pub async fn get_owned_comment(
        &self,
        user: &User,
        post_id: i64,
        id: i64,
    ) -> Result<Comment, PostError> {
        let comment = self.find_comment(post_id, id).await?;
        if !user.owns(comment.author_id) {
            return Err(PostError::Forbidden("You do not own this comment".to_string()));
        }
        Ok(comment)
    }

    /// Like a post. A second like by the same user is rejected.
    pub async fn like(&self, user: &User, post_id: i64) -> Result<Like, PostError> {
        let post = self.get(post_id).await?;

        let like = self
            .likes
            .create(post.id, user.id)
            .await
            .context("Failed to like post")?
            .ok_or_else(|| PostError::Validation("You have already liked this post".to_string()))?;

        tracing::info!(post_id = post.id, user_id = user.id, "Post liked");
        self.notifications
            .notify(
                post.author_id,
                user.id,
                LIKE_VERB,
                Some(NotificationTarget::post(post.id)),
            )
            .await?;

        Ok(like)
    }

    pub async fn unlike(&self, user: &User, post_id: i64) -> Result<(), PostError> {
        let post = self.get(post_id).await?;

        let removed = self
            .likes
            .delete(post.id, user.id)
            .await
            .context("Failed to unlike post")?;
        if !removed {
            return Err(PostError::Validation("You have not liked this post".to_string()));
        }

        tracing::info!(post_id = post.id, user_id = user.id, "Post unliked");
        Ok(())
    }
}
