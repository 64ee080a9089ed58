use std::sync::Arc;

use domains::{
    AuthenticatedUser, Comment, CommentId, CommentRepository, CommentTransaction, CommentUpdate,
    CommentView, CommentVote, DomainError, FailedStep, NewComment, PostId, PostRepository,
    Resource, Result, TopicId, VoteDirection,
};
use tracing::{debug, info, warn};

use crate::write_error;

/// Comments and their votes. Every comment write also marks the parent post
/// as recently active, and both land in one transaction.
#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    /// Comments on a post, oldest first.
    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn find_comments_by_post(
        &self,
        caller: &AuthenticatedUser,
        topic_id: TopicId,
        post_id: PostId,
    ) -> Result<Vec<CommentView>> {
        if self
            .posts
            .find_post_by_id(topic_id, post_id, caller.user_id)
            .await?
            .is_none()
        {
            return Err(DomainError::NotFound(Resource::Post));
        }
        Ok(self
            .comments
            .find_comments_by_post(post_id, caller.user_id)
            .await?)
    }

    #[tracing::instrument(skip(self, description), fields(user_id = caller.user_id))]
    pub async fn create_comment(
        &self,
        caller: &AuthenticatedUser,
        post_id: PostId,
        description: &str,
    ) -> Result<Comment> {
        let new_comment = NewComment {
            post_id,
            user_id: caller.user_id,
            description: description.to_string(),
        };
        let mut tx = self.comments.begin().await?;
        let outcome = insert_and_touch(tx.as_mut(), &new_comment).await;
        let comment = finish(tx, outcome).await?;
        info!(comment_id = comment.comment_id, post_id, "comment created");
        Ok(comment)
    }

    /// Rewrites a comment the caller owns and touches the post it belongs to.
    #[tracing::instrument(skip(self, description), fields(user_id = caller.user_id))]
    pub async fn update_comment(
        &self,
        caller: &AuthenticatedUser,
        comment_id: CommentId,
        description: &str,
    ) -> Result<Comment> {
        let update = CommentUpdate {
            comment_id,
            user_id: caller.user_id,
            description: description.to_string(),
        };
        let mut tx = self.comments.begin().await?;
        let outcome = update_and_touch(tx.as_mut(), &update).await;
        finish(tx, outcome).await
    }

    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn delete_comment(
        &self,
        caller: &AuthenticatedUser,
        comment_id: CommentId,
    ) -> Result<()> {
        let rows = self
            .comments
            .delete_comment(comment_id, caller.user_id)
            .await?;
        if rows == 0 {
            return Err(DomainError::NotFound(Resource::Comment));
        }
        info!(comment_id, "comment deleted");
        Ok(())
    }

    pub async fn like_comment(
        &self,
        caller: &AuthenticatedUser,
        comment_id: CommentId,
    ) -> Result<CommentVote> {
        self.cast_vote(caller, comment_id, VoteDirection::Like).await
    }

    pub async fn dislike_comment(
        &self,
        caller: &AuthenticatedUser,
        comment_id: CommentId,
    ) -> Result<CommentVote> {
        self.cast_vote(caller, comment_id, VoteDirection::Dislike)
            .await
    }

    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    pub async fn remove_comment_vote(
        &self,
        caller: &AuthenticatedUser,
        comment_id: CommentId,
    ) -> Result<()> {
        let rows = self
            .comments
            .remove_comment_vote(comment_id, caller.user_id)
            .await?;
        if rows == 0 {
            return Err(DomainError::NotFound(Resource::Vote));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(user_id = caller.user_id))]
    async fn cast_vote(
        &self,
        caller: &AuthenticatedUser,
        comment_id: CommentId,
        direction: VoteDirection,
    ) -> Result<CommentVote> {
        let vote = self
            .comments
            .cast_comment_vote(comment_id, caller.user_id, direction)
            .await
            .map_err(|err| write_error(err, None, Some(Resource::Comment)))?
            .ok_or(DomainError::NotFound(Resource::Comment))?;
        debug!(?vote.vote, "comment vote stored");
        Ok(vote)
    }
}

async fn insert_and_touch(
    tx: &mut dyn CommentTransaction,
    new_comment: &NewComment,
) -> Result<Comment> {
    let comment = tx
        .insert_comment(new_comment)
        .await
        .map_err(|err| write_error(err, None, Some(Resource::Post)))?;
    touch_post(tx, comment.post_id).await?;
    Ok(comment)
}

async fn update_and_touch(
    tx: &mut dyn CommentTransaction,
    update: &CommentUpdate,
) -> Result<Comment> {
    let comment = tx
        .update_comment(update)
        .await?
        .ok_or(DomainError::NotFound(Resource::Comment))?;
    touch_post(tx, comment.post_id).await?;
    Ok(comment)
}

/// A failed or missed touch fails the whole write.
async fn touch_post(tx: &mut dyn CommentTransaction, post_id: PostId) -> Result<()> {
    match tx.touch_post(post_id).await {
        Ok(0) => {
            warn!(post_id, "post status touch matched no rows");
            Err(DomainError::DependencyFailure(FailedStep::PostStatusTouch))
        }
        Ok(_) => Ok(()),
        Err(err) => {
            warn!(post_id, error = %err, "post status touch failed");
            Err(DomainError::DependencyFailure(FailedStep::PostStatusTouch))
        }
    }
}

/// Commits on success, rolls back otherwise. A failed rollback is logged and
/// the original error is returned.
async fn finish<T>(tx: Box<dyn CommentTransaction>, outcome: Result<T>) -> Result<T> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!(error = %rollback_err, "rollback failed");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use domains::{
        MockCommentRepository, MockPostRepository, NewPost, NewTopic, PostView, RepoError,
        RepoResult, TopicRepository, UserRepository,
    };
    use std::sync::Mutex;
    use storage_adapters::memory::MemoryStore;

    const ALICE: AuthenticatedUser = AuthenticatedUser { user_id: 1 };

    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
    struct TxLog {
        inserted: bool,
        touched: bool,
        committed: bool,
        rolled_back: bool,
    }

    /// A transaction whose touch outcome is scripted.
    struct ScriptedTx {
        log: Arc<Mutex<TxLog>>,
        touch: fn() -> RepoResult<u64>,
    }

    #[async_trait]
    impl CommentTransaction for ScriptedTx {
        async fn insert_comment(&mut self, comment: &NewComment) -> RepoResult<Comment> {
            self.log.lock().unwrap().inserted = true;
            let now = Utc::now();
            Ok(Comment {
                comment_id: 10,
                post_id: comment.post_id,
                user_id: comment.user_id,
                description: comment.description.clone(),
                likes: 0,
                dislikes: 0,
                created_at: now,
                updated_at: now,
            })
        }

        async fn update_comment(&mut self, _update: &CommentUpdate) -> RepoResult<Option<Comment>> {
            Ok(None)
        }

        async fn touch_post(&mut self, _post_id: PostId) -> RepoResult<u64> {
            self.log.lock().unwrap().touched = true;
            (self.touch)()
        }

        async fn commit(self: Box<Self>) -> RepoResult<()> {
            self.log.lock().unwrap().committed = true;
            Ok(())
        }

        async fn rollback(self: Box<Self>) -> RepoResult<()> {
            self.log.lock().unwrap().rolled_back = true;
            Ok(())
        }
    }

    fn scripted_service(touch: fn() -> RepoResult<u64>) -> (CommentService, Arc<Mutex<TxLog>>) {
        let log = Arc::new(Mutex::new(TxLog::default()));
        let tx_log = log.clone();
        let mut comments = MockCommentRepository::new();
        comments.expect_begin().times(1).returning(move || {
            Ok(Box::new(ScriptedTx {
                log: tx_log.clone(),
                touch,
            }) as Box<dyn CommentTransaction>)
        });
        let service = CommentService::new(Arc::new(comments), Arc::new(MockPostRepository::new()));
        (service, log)
    }

    #[tokio::test]
    async fn failed_touch_rolls_back_the_insert() {
        let (service, log) = scripted_service(|| Err(RepoError::backend("deadlock detected")));

        let err = service.create_comment(&ALICE, 5, "hi").await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::DependencyFailure(FailedStep::PostStatusTouch)
        ));
        assert_eq!(err.to_string(), "post not updated");

        let log = *log.lock().unwrap();
        assert!(log.inserted && log.touched);
        assert!(log.rolled_back);
        assert!(!log.committed);
    }

    #[tokio::test]
    async fn touch_matching_no_rows_rolls_back() {
        let (service, log) = scripted_service(|| Ok(0));

        let err = service.create_comment(&ALICE, 5, "hi").await.unwrap_err();
        assert!(matches!(err, DomainError::DependencyFailure(_)));
        assert!(log.lock().unwrap().rolled_back);
    }

    #[tokio::test]
    async fn successful_touch_commits() {
        let (service, log) = scripted_service(|| Ok(1));

        let comment = service.create_comment(&ALICE, 5, "hi").await.unwrap();
        assert_eq!(comment.post_id, 5);
        let log = *log.lock().unwrap();
        assert!(log.committed);
        assert!(!log.rolled_back);
    }

    #[tokio::test]
    async fn updating_someone_elses_comment_skips_the_touch() {
        let (service, log) = scripted_service(|| Ok(1));

        let err = service.update_comment(&ALICE, 10, "edit").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Comment)));
        let log = *log.lock().unwrap();
        assert!(!log.touched);
        assert!(log.rolled_back);
    }

    #[tokio::test]
    async fn listing_comments_of_a_missing_post_is_not_found() {
        let mut posts = MockPostRepository::new();
        posts
            .expect_find_post_by_id()
            .returning(|_, _, _| Ok(None::<PostView>));
        let mut comments = MockCommentRepository::new();
        comments.expect_find_comments_by_post().never();

        let service = CommentService::new(Arc::new(comments), Arc::new(posts));
        let err = service
            .find_comments_by_post(&ALICE, 1, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Post)));
    }

    struct Fixture {
        store: MemoryStore,
        service: CommentService,
        alice: AuthenticatedUser,
        bob: AuthenticatedUser,
        topic_id: TopicId,
        post_id: PostId,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let alice = store.create_user("alice").await.unwrap();
        let bob = store.create_user("bob").await.unwrap();
        let topic = store
            .create_topic(&NewTopic {
                user_id: alice.user_id,
                title: "Rust".to_string(),
            })
            .await
            .unwrap();
        let post = domains::PostRepository::create_post(
            &store,
            &NewPost {
                topic_id: topic.topic_id,
                user_id: alice.user_id,
                title: "Hello".to_string(),
                description: "First".to_string(),
            },
        )
        .await
        .unwrap();
        let shared = Arc::new(store.clone());
        Fixture {
            store,
            service: CommentService::new(shared.clone(), shared),
            alice: AuthenticatedUser::new(alice.user_id),
            bob: AuthenticatedUser::new(bob.user_id),
            topic_id: topic.topic_id,
            post_id: post.post_id,
        }
    }

    async fn post_updated_at(f: &Fixture) -> chrono::DateTime<Utc> {
        domains::PostRepository::find_post_by_id(&f.store, f.topic_id, f.post_id, f.alice.user_id)
            .await
            .unwrap()
            .unwrap()
            .updated_at
    }

    #[tokio::test]
    async fn creating_a_comment_touches_the_post() {
        let f = fixture().await;
        let before = post_updated_at(&f).await;

        let comment = f
            .service
            .create_comment(&f.bob, f.post_id, "Nice post")
            .await
            .unwrap();
        assert_eq!(comment.post_id, f.post_id);
        assert!(post_updated_at(&f).await > before);

        let listed = f
            .service
            .find_comments_by_post(&f.alice, f.topic_id, f.post_id)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].username, "bob");
    }

    #[tokio::test]
    async fn caller_without_a_user_row_is_user_not_found() {
        let f = fixture().await;
        let ghost = AuthenticatedUser::new(999);

        let err = f
            .service
            .create_comment(&ghost, f.post_id, "who am I")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::User)));

        let comments = f
            .service
            .find_comments_by_post(&f.alice, f.topic_id, f.post_id)
            .await
            .unwrap();
        assert!(comments.is_empty());
    }

    #[tokio::test]
    async fn comment_on_missing_post_is_post_not_found() {
        let f = fixture().await;
        let err = f
            .service
            .create_comment(&f.bob, f.post_id + 100, "hello?")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Post)));
    }

    #[tokio::test]
    async fn update_is_owner_scoped_and_touches_the_post() {
        let f = fixture().await;
        let comment = f
            .service
            .create_comment(&f.bob, f.post_id, "Nice post")
            .await
            .unwrap();
        let before = post_updated_at(&f).await;

        let err = f
            .service
            .update_comment(&f.alice, comment.comment_id, "hijack")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Comment)));
        assert_eq!(post_updated_at(&f).await, before);

        let updated = f
            .service
            .update_comment(&f.bob, comment.comment_id, "Great post")
            .await
            .unwrap();
        assert_eq!(updated.description, "Great post");
        assert!(post_updated_at(&f).await > before);
    }

    #[tokio::test]
    async fn comments_are_listed_oldest_first() {
        let f = fixture().await;
        let first = f.service.create_comment(&f.bob, f.post_id, "one").await.unwrap();
        let second = f.service.create_comment(&f.alice, f.post_id, "two").await.unwrap();

        let listed = f
            .service
            .find_comments_by_post(&f.bob, f.topic_id, f.post_id)
            .await
            .unwrap();
        let ids: Vec<_> = listed.iter().map(|c| c.comment_id).collect();
        assert_eq!(ids, vec![first.comment_id, second.comment_id]);
    }

    #[tokio::test]
    async fn delete_and_votes_follow_ownership_and_transitions() {
        let f = fixture().await;
        let comment = f
            .service
            .create_comment(&f.bob, f.post_id, "Nice post")
            .await
            .unwrap();

        f.service.dislike_comment(&f.alice, comment.comment_id).await.unwrap();
        f.service.like_comment(&f.alice, comment.comment_id).await.unwrap();
        let listed = f
            .service
            .find_comments_by_post(&f.alice, f.topic_id, f.post_id)
            .await
            .unwrap();
        assert_eq!((listed[0].likes, listed[0].dislikes), (1, 0));
        assert_eq!(listed[0].user_vote, Some(VoteDirection::Like));

        f.service
            .remove_comment_vote(&f.alice, comment.comment_id)
            .await
            .unwrap();
        let err = f
            .service
            .remove_comment_vote(&f.alice, comment.comment_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Vote)));

        let err = f
            .service
            .delete_comment(&f.alice, comment.comment_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Comment)));
        f.service
            .delete_comment(&f.bob, comment.comment_id)
            .await
            .unwrap();

        let err = f
            .service
            .like_comment(&f.alice, comment.comment_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(Resource::Comment)));
    }
}
