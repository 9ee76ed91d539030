//! Feed assembly for the public pages.
//!
//! Builds the template context for every post listing: the front page, a
//! group's page, an author profile, the follow feed, and the post detail
//! view. All listings are newest-first and paginated at the configured
//! page size.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::pagination::{Page, PageNumber, PageRequest};
use crate::application::repos::{
    CommentsRepo, FeedScope, FollowsRepo, GroupsRepo, PostsRepo, RepoError, UsersRepo,
};
use crate::domain::entities::{CommentRecord, PostRecord};
use crate::presentation::views::{
    CommentView, FollowContext, GroupContext, IndexContext, PagerView, PostCard,
    PostDetailContext, ProfileContext, format_timestamp,
};

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("unknown group")]
    UnknownGroup,
    #[error("unknown author")]
    UnknownAuthor,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct FeedService {
    posts: Arc<dyn PostsRepo>,
    groups: Arc<dyn GroupsRepo>,
    users: Arc<dyn UsersRepo>,
    comments: Arc<dyn CommentsRepo>,
    follows: Arc<dyn FollowsRepo>,
    page_size: u32,
}

impl FeedService {
    pub fn new(
        posts: Arc<dyn PostsRepo>,
        groups: Arc<dyn GroupsRepo>,
        users: Arc<dyn UsersRepo>,
        comments: Arc<dyn CommentsRepo>,
        follows: Arc<dyn FollowsRepo>,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            groups,
            users,
            comments,
            follows,
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    fn request(&self, number: PageNumber) -> PageRequest {
        PageRequest::new(number, self.page_size)
    }

    pub async fn index_page(&self, number: PageNumber) -> Result<IndexContext, FeedError> {
        let page = self
            .posts
            .list_posts(FeedScope::All, self.request(number))
            .await?;

        Ok(IndexContext {
            pager: build_pager(&page, "/"),
            posts: page.items.iter().map(record_to_card).collect(),
        })
    }

    pub async fn group_page(
        &self,
        slug: &str,
        number: PageNumber,
    ) -> Result<GroupContext, FeedError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or(FeedError::UnknownGroup)?;

        let page = self
            .posts
            .list_posts(FeedScope::Group(group.id), self.request(number))
            .await?;

        Ok(GroupContext {
            title: group.title,
            slug: group.slug.clone(),
            description: group.description,
            pager: build_pager(&page, &format!("/group/{}", group.slug)),
            posts: page.items.iter().map(record_to_card).collect(),
        })
    }

    pub async fn profile_page(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        number: PageNumber,
    ) -> Result<ProfileContext, FeedError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(FeedError::UnknownAuthor)?;

        let page = self
            .posts
            .list_posts(FeedScope::Author(author.id), self.request(number))
            .await?;
        let follower_count = self.follows.count_followers(author.id).await?;

        let is_self = viewer == Some(author.id);
        let is_following = match viewer {
            Some(viewer_id) if !is_self => {
                self.follows.follow_exists(viewer_id, author.id).await?
            }
            _ => false,
        };

        Ok(ProfileContext {
            username: author.username.clone(),
            display_name: author.display_name,
            joined: format_timestamp(author.joined_at),
            post_count: page.total_items,
            follower_count,
            is_following,
            is_self,
            pager: build_pager(&page, &format!("/profile/{}", author.username)),
            posts: page.items.iter().map(record_to_card).collect(),
        })
    }

    pub async fn follow_page(
        &self,
        viewer: Uuid,
        number: PageNumber,
    ) -> Result<FollowContext, FeedError> {
        let page = self
            .posts
            .list_posts(FeedScope::FollowedBy(viewer), self.request(number))
            .await?;

        Ok(FollowContext {
            pager: build_pager(&page, "/follow"),
            posts: page.items.iter().map(record_to_card).collect(),
        })
    }

    /// Detail context for one post, or `None` when the id is unknown.
    pub async fn post_detail(&self, id: Uuid) -> Result<Option<PostDetailContext>, FeedError> {
        let Some(post) = self.posts.find_post(id).await? else {
            return Ok(None);
        };

        let author_post_count = self
            .posts
            .count_posts(FeedScope::Author(post.author_id))
            .await?;
        let comments = self.comments.list_for_post(post.id).await?;

        Ok(Some(build_detail_context(
            &post,
            author_post_count,
            &comments,
        )))
    }
}

fn record_to_card(record: &PostRecord) -> PostCard {
    PostCard {
        id: record.id.to_string(),
        detail_href: format!("/posts/{}", record.id),
        text: record.text.clone(),
        author_username: record.author_username.clone(),
        author_href: format!("/profile/{}", record.author_username),
        group_title: record.group_title.clone(),
        group_href: record
            .group_slug
            .as_ref()
            .map(|slug| format!("/group/{slug}")),
        image_href: record
            .image_path
            .as_ref()
            .map(|path| format!("/uploads/{path}")),
        published: format_timestamp(record.created_at),
    }
}

fn build_detail_context(
    post: &PostRecord,
    author_post_count: u64,
    comments: &[CommentRecord],
) -> PostDetailContext {
    PostDetailContext {
        id: post.id.to_string(),
        title: post.title_preview(),
        text: post.text.clone(),
        author_username: post.author_username.clone(),
        author_href: format!("/profile/{}", post.author_username),
        author_post_count,
        group_title: post.group_title.clone(),
        group_href: post
            .group_slug
            .as_ref()
            .map(|slug| format!("/group/{slug}")),
        image_href: post
            .image_path
            .as_ref()
            .map(|path| format!("/uploads/{path}")),
        published: format_timestamp(post.created_at),
        comments: comments.iter().map(comment_to_view).collect(),
        comment_error: None,
    }
}

fn comment_to_view(comment: &CommentRecord) -> CommentView {
    CommentView {
        author_username: comment.author_username.clone(),
        author_href: format!("/profile/{}", comment.author_username),
        text: comment.text.clone(),
        published: format_timestamp(comment.created_at),
    }
}

fn build_pager(page: &Page<PostRecord>, base_path: &str) -> PagerView {
    PagerView {
        number: page.number,
        total_pages: page.total_pages(),
        total_items: page.total_items,
        has_previous: page.has_previous(),
        has_next: page.has_next(),
        previous_href: format!("{base_path}?page={}", page.number.saturating_sub(1).max(1)),
        next_href: format!("{base_path}?page={}", page.number.saturating_add(1)),
    }
}
