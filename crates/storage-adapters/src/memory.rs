//! In-process store with the same observable behaviour as the Postgres schema:
//! unique keys, foreign keys with cascading deletes, vote counters and
//! ordering. Backs service tests, HTTP tests and local demos.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use domains::{
    Comment, CommentId, CommentRepository, CommentTransaction, CommentUpdate, CommentView,
    CommentVote, CounterDelta, NewComment, NewPost, NewTopic, Post, PostId, PostRepository,
    PostUpdate, PostView, PostVote, RepoError, RepoResult, Topic, TopicId, TopicRepository,
    TopicUpdate, User, UserId, UserRepository, VoteDirection,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct State {
    users: BTreeMap<UserId, User>,
    topics: BTreeMap<TopicId, Topic>,
    posts: BTreeMap<PostId, Post>,
    comments: BTreeMap<CommentId, Comment>,
    post_votes: BTreeMap<(PostId, UserId), PostVote>,
    comment_votes: BTreeMap<(CommentId, UserId), CommentVote>,
    sequences: Sequences,
    clock: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    user: i64,
    topic: i64,
    post: i64,
    comment: i64,
}

fn next(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

fn unique(constraint: &str) -> RepoError {
    RepoError::UniqueViolation {
        constraint: Some(constraint.to_string()),
    }
}

fn foreign_key(constraint: &str) -> RepoError {
    RepoError::ForeignKeyViolation {
        constraint: Some(constraint.to_string()),
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl State {
    /// Strictly increasing timestamps at microsecond resolution, like `TIMESTAMPTZ`.
    fn now(&mut self) -> DateTime<Utc> {
        let wall = Utc::now().trunc_subsecs(6);
        let now = match self.clock {
            Some(last) if wall <= last => last + Duration::microseconds(1),
            _ => wall,
        };
        self.clock = Some(now);
        now
    }

    fn require_user(&self, user_id: UserId, constraint: &str) -> RepoResult<()> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(foreign_key(constraint))
        }
    }

    fn username(&self, user_id: UserId) -> RepoResult<String> {
        self.users
            .get(&user_id)
            .map(|user| user.name.clone())
            .ok_or_else(|| RepoError::Corrupt(format!("author {user_id} has no user row")))
    }

    fn post_view(&self, post: &Post, viewer: UserId) -> RepoResult<PostView> {
        Ok(PostView {
            post_id: post.post_id,
            topic_id: post.topic_id,
            user_id: post.user_id,
            username: self.username(post.user_id)?,
            title: post.title.clone(),
            description: post.description.clone(),
            likes: post.likes,
            dislikes: post.dislikes,
            user_vote: self
                .post_votes
                .get(&(post.post_id, viewer))
                .map(|vote| vote.vote),
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }

    fn comment_view(&self, comment: &Comment, viewer: UserId) -> RepoResult<CommentView> {
        Ok(CommentView {
            comment_id: comment.comment_id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            username: self.username(comment.user_id)?,
            description: comment.description.clone(),
            likes: comment.likes,
            dislikes: comment.dislikes,
            user_vote: self
                .comment_votes
                .get(&(comment.comment_id, viewer))
                .map(|vote| vote.vote),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        })
    }

    /// Posts ordered by last activity, newest first.
    fn post_views<'a>(
        &self,
        posts: impl Iterator<Item = &'a Post>,
        viewer: UserId,
    ) -> RepoResult<Vec<PostView>> {
        let mut posts: Vec<&Post> = posts.collect();
        posts.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then(b.post_id.cmp(&a.post_id))
        });
        posts
            .into_iter()
            .map(|post| self.post_view(post, viewer))
            .collect()
    }

    fn topic_title_taken(&self, title: &str, except: Option<TopicId>) -> bool {
        self.topics
            .values()
            .any(|t| t.title == title && Some(t.topic_id) != except)
    }

    fn post_title_taken(&self, topic_id: TopicId, title: &str, except: Option<PostId>) -> bool {
        self.posts.values().any(|p| {
            p.topic_id == topic_id && p.title == title && Some(p.post_id) != except
        })
    }

    fn remove_comments(&mut self, doomed: &[CommentId]) {
        for comment_id in doomed {
            self.comments.remove(comment_id);
        }
        self.comment_votes
            .retain(|(comment_id, _), _| !doomed.contains(comment_id));
    }

    fn remove_posts(&mut self, doomed: &[PostId]) {
        let comments: Vec<CommentId> = self
            .comments
            .values()
            .filter(|c| doomed.contains(&c.post_id))
            .map(|c| c.comment_id)
            .collect();
        self.remove_comments(&comments);
        for post_id in doomed {
            self.posts.remove(post_id);
        }
        self.post_votes
            .retain(|(post_id, _), _| !doomed.contains(post_id));
    }

    fn insert_comment(&mut self, new_comment: &NewComment) -> RepoResult<Comment> {
        if !self.posts.contains_key(&new_comment.post_id) {
            return Err(foreign_key("comments_post_id_fkey"));
        }
        self.require_user(new_comment.user_id, "comments_user_id_fkey")?;
        let now = self.now();
        let comment = Comment {
            comment_id: next(&mut self.sequences.comment),
            post_id: new_comment.post_id,
            user_id: new_comment.user_id,
            description: new_comment.description.clone(),
            likes: 0,
            dislikes: 0,
            created_at: now,
            updated_at: now,
        };
        self.comments.insert(comment.comment_id, comment.clone());
        Ok(comment)
    }

    fn update_comment(&mut self, update: &CommentUpdate) -> Option<Comment> {
        let now = self.now();
        let comment = self
            .comments
            .get_mut(&update.comment_id)
            .filter(|c| c.user_id == update.user_id)?;
        comment.description = update.description.clone();
        comment.updated_at = now;
        Some(comment.clone())
    }

    fn touch_post(&mut self, post_id: PostId) -> u64 {
        let now = self.now();
        match self.posts.get_mut(&post_id) {
            Some(post) => {
                post.updated_at = now;
                1
            }
            None => 0,
        }
    }
}

/// Applies a counter delta, rejecting it the way the `CHECK (likes >= 0)`
/// constraints would.
fn apply_delta(
    delta: CounterDelta,
    likes: &mut i64,
    dislikes: &mut i64,
    constraint: &str,
) -> RepoResult<()> {
    let (mut new_likes, mut new_dislikes) = (*likes, *dislikes);
    delta.apply(&mut new_likes, &mut new_dislikes);
    if new_likes < 0 || new_dislikes < 0 {
        return Err(RepoError::CheckViolation {
            constraint: Some(constraint.to_string()),
        });
    }
    *likes = new_likes;
    *dislikes = new_dislikes;
    Ok(())
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_user_by_id(&self, user_id: UserId) -> RepoResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_name(&self, name: &str) -> RepoResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.name == name).cloned())
    }

    async fn create_user(&self, name: &str) -> RepoResult<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.name == name) {
            return Err(unique("users_name_key"));
        }
        let created_at = state.now();
        let user = User {
            user_id: next(&mut state.sequences.user),
            name: name.to_string(),
            created_at,
        };
        state.users.insert(user.user_id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl TopicRepository for MemoryStore {
    async fn list_topics(&self) -> RepoResult<Vec<Topic>> {
        let state = self.state.lock().await;
        Ok(state.topics.values().rev().cloned().collect())
    }

    async fn find_topic_by_id(&self, topic_id: TopicId) -> RepoResult<Option<Topic>> {
        Ok(self.state.lock().await.topics.get(&topic_id).cloned())
    }

    async fn create_topic(&self, topic: &NewTopic) -> RepoResult<Topic> {
        let mut state = self.state.lock().await;
        state.require_user(topic.user_id, "topics_user_id_fkey")?;
        if state.topic_title_taken(&topic.title, None) {
            return Err(unique("topics_title_key"));
        }
        let now = state.now();
        let topic = Topic {
            topic_id: next(&mut state.sequences.topic),
            user_id: topic.user_id,
            title: topic.title.clone(),
            created_at: now,
            updated_at: now,
        };
        state.topics.insert(topic.topic_id, topic.clone());
        Ok(topic)
    }

    async fn update_topic(&self, update: &TopicUpdate) -> RepoResult<Option<Topic>> {
        let mut state = self.state.lock().await;
        let owned = state
            .topics
            .get(&update.topic_id)
            .is_some_and(|t| t.user_id == update.user_id);
        if !owned {
            return Ok(None);
        }
        if state.topic_title_taken(&update.title, Some(update.topic_id)) {
            return Err(unique("topics_title_key"));
        }
        let now = state.now();
        Ok(state.topics.get_mut(&update.topic_id).map(|topic| {
            topic.title = update.title.clone();
            topic.updated_at = now;
            topic.clone()
        }))
    }

    async fn delete_topic(&self, topic_id: TopicId, user_id: UserId) -> RepoResult<u64> {
        let mut state = self.state.lock().await;
        let owned = state
            .topics
            .get(&topic_id)
            .is_some_and(|t| t.user_id == user_id);
        if !owned {
            return Ok(0);
        }
        let posts: Vec<PostId> = state
            .posts
            .values()
            .filter(|p| p.topic_id == topic_id)
            .map(|p| p.post_id)
            .collect();
        state.remove_posts(&posts);
        state.topics.remove(&topic_id);
        Ok(1)
    }

    async fn search_topics(&self, query: &str) -> RepoResult<Vec<Topic>> {
        let state = self.state.lock().await;
        Ok(state
            .topics
            .values()
            .rev()
            .filter(|t| contains_ignore_case(&t.title, query))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn find_posts_by_topic(
        &self,
        topic_id: TopicId,
        viewer: UserId,
    ) -> RepoResult<Vec<PostView>> {
        let state = self.state.lock().await;
        state.post_views(
            state.posts.values().filter(|p| p.topic_id == topic_id),
            viewer,
        )
    }

    async fn find_post_by_id(
        &self,
        topic_id: TopicId,
        post_id: PostId,
        viewer: UserId,
    ) -> RepoResult<Option<PostView>> {
        let state = self.state.lock().await;
        state
            .posts
            .get(&post_id)
            .filter(|p| p.topic_id == topic_id)
            .map(|post| state.post_view(post, viewer))
            .transpose()
    }

    async fn create_post(&self, post: &NewPost) -> RepoResult<Post> {
        let mut state = self.state.lock().await;
        if !state.topics.contains_key(&post.topic_id) {
            return Err(foreign_key("posts_topic_id_fkey"));
        }
        state.require_user(post.user_id, "posts_user_id_fkey")?;
        if state.post_title_taken(post.topic_id, &post.title, None) {
            return Err(unique("posts_topic_id_title_key"));
        }
        let now = state.now();
        let post = Post {
            post_id: next(&mut state.sequences.post),
            topic_id: post.topic_id,
            user_id: post.user_id,
            title: post.title.clone(),
            description: post.description.clone(),
            likes: 0,
            dislikes: 0,
            created_at: now,
            updated_at: now,
        };
        state.posts.insert(post.post_id, post.clone());
        Ok(post)
    }

    async fn update_post(&self, update: &PostUpdate) -> RepoResult<Option<Post>> {
        let mut state = self.state.lock().await;
        let topic_id = match state.posts.get(&update.post_id) {
            Some(post) if post.user_id == update.user_id => post.topic_id,
            _ => return Ok(None),
        };
        if state.post_title_taken(topic_id, &update.title, Some(update.post_id)) {
            return Err(unique("posts_topic_id_title_key"));
        }
        let now = state.now();
        Ok(state.posts.get_mut(&update.post_id).map(|post| {
            post.title = update.title.clone();
            post.description = update.description.clone();
            post.updated_at = now;
            post.clone()
        }))
    }

    async fn delete_post(&self, post_id: PostId, user_id: UserId) -> RepoResult<u64> {
        let mut state = self.state.lock().await;
        let owned = state
            .posts
            .get(&post_id)
            .is_some_and(|p| p.user_id == user_id);
        if !owned {
            return Ok(0);
        }
        state.remove_posts(&[post_id]);
        Ok(1)
    }

    async fn search_posts(
        &self,
        topic_id: TopicId,
        query: &str,
        viewer: UserId,
    ) -> RepoResult<Vec<PostView>> {
        let state = self.state.lock().await;
        state.post_views(
            state.posts.values().filter(|p| {
                p.topic_id == topic_id
                    && (contains_ignore_case(&p.title, query)
                        || contains_ignore_case(&p.description, query))
            }),
            viewer,
        )
    }

    async fn cast_post_vote(
        &self,
        post_id: PostId,
        user_id: UserId,
        direction: VoteDirection,
    ) -> RepoResult<Option<PostVote>> {
        let mut state = self.state.lock().await;
        if !state.posts.contains_key(&post_id) {
            return Ok(None);
        }
        state.require_user(user_id, "post_votes_user_id_fkey")?;
        let now = state.now();
        let previous = state.post_votes.get(&(post_id, user_id)).map(|v| v.vote);
        let delta = CounterDelta::transition(previous, Some(direction));
        if let Some(post) = state.posts.get_mut(&post_id) {
            apply_delta(delta, &mut post.likes, &mut post.dislikes, "posts_likes_check")?;
        }
        let vote = state
            .post_votes
            .entry((post_id, user_id))
            .and_modify(|vote| {
                vote.vote = direction;
                vote.updated_at = now;
            })
            .or_insert_with(|| PostVote {
                post_id,
                user_id,
                vote: direction,
                created_at: now,
                updated_at: now,
            });
        Ok(Some(vote.clone()))
    }

    async fn remove_post_vote(&self, post_id: PostId, user_id: UserId) -> RepoResult<u64> {
        let mut state = self.state.lock().await;
        let Some(previous) = state.post_votes.get(&(post_id, user_id)).map(|v| v.vote) else {
            return Ok(0);
        };
        let delta = CounterDelta::transition(Some(previous), None);
        if let Some(post) = state.posts.get_mut(&post_id) {
            apply_delta(delta, &mut post.likes, &mut post.dislikes, "posts_likes_check")?;
        }
        state.post_votes.remove(&(post_id, user_id));
        Ok(1)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn find_comments_by_post(
        &self,
        post_id: PostId,
        viewer: UserId,
    ) -> RepoResult<Vec<CommentView>> {
        let state = self.state.lock().await;
        let mut comments: Vec<&Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .collect();
        comments.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.comment_id.cmp(&b.comment_id))
        });
        comments
            .into_iter()
            .map(|comment| state.comment_view(comment, viewer))
            .collect()
    }

    async fn begin(&self) -> RepoResult<Box<dyn CommentTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn delete_comment(&self, comment_id: CommentId, user_id: UserId) -> RepoResult<u64> {
        let mut state = self.state.lock().await;
        let owned = state
            .comments
            .get(&comment_id)
            .is_some_and(|c| c.user_id == user_id);
        if !owned {
            return Ok(0);
        }
        state.remove_comments(&[comment_id]);
        Ok(1)
    }

    async fn cast_comment_vote(
        &self,
        comment_id: CommentId,
        user_id: UserId,
        direction: VoteDirection,
    ) -> RepoResult<Option<CommentVote>> {
        let mut state = self.state.lock().await;
        if !state.comments.contains_key(&comment_id) {
            return Ok(None);
        }
        state.require_user(user_id, "comment_votes_user_id_fkey")?;
        let now = state.now();
        let previous = state
            .comment_votes
            .get(&(comment_id, user_id))
            .map(|v| v.vote);
        let delta = CounterDelta::transition(previous, Some(direction));
        if let Some(comment) = state.comments.get_mut(&comment_id) {
            apply_delta(
                delta,
                &mut comment.likes,
                &mut comment.dislikes,
                "comments_likes_check",
            )?;
        }
        let vote = state
            .comment_votes
            .entry((comment_id, user_id))
            .and_modify(|vote| {
                vote.vote = direction;
                vote.updated_at = now;
            })
            .or_insert_with(|| CommentVote {
                comment_id,
                user_id,
                vote: direction,
                created_at: now,
                updated_at: now,
            });
        Ok(Some(vote.clone()))
    }

    async fn remove_comment_vote(
        &self,
        comment_id: CommentId,
        user_id: UserId,
    ) -> RepoResult<u64> {
        let mut state = self.state.lock().await;
        let Some(previous) = state
            .comment_votes
            .get(&(comment_id, user_id))
            .map(|v| v.vote)
        else {
            return Ok(0);
        };
        let delta = CounterDelta::transition(Some(previous), None);
        if let Some(comment) = state.comments.get_mut(&comment_id) {
            apply_delta(
                delta,
                &mut comment.likes,
                &mut comment.dislikes,
                "comments_likes_check",
            )?;
        }
        state.comment_votes.remove(&(comment_id, user_id));
        Ok(1)
    }
}

/// Holds the store lock for its whole life and writes to a private copy of
/// the state. `commit` publishes the copy; rollback or drop discards it.
struct MemoryTransaction {
    guard: OwnedMutexGuard<State>,
    working: State,
}

#[async_trait]
impl CommentTransaction for MemoryTransaction {
    async fn insert_comment(&mut self, comment: &NewComment) -> RepoResult<Comment> {
        self.working.insert_comment(comment)
    }

    async fn update_comment(&mut self, update: &CommentUpdate) -> RepoResult<Option<Comment>> {
        Ok(self.working.update_comment(update))
    }

    async fn touch_post(&mut self, post_id: PostId) -> RepoResult<u64> {
        Ok(self.working.touch_post(post_id))
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        Ok(())
    }
}
