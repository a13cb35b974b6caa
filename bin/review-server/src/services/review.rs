//! Review orchestrator: starts and continues code-review conversations.
//!
//! Every successful turn appends exactly one CLIENT message (the human
//! prompt) followed by one ASSISTANT message (the model reply).  Unknown
//! model or review references are rejected before anything is written or
//! the model is called.  A failed or empty model reply is recorded as
//! [`FALLBACK_REPLY`] rather than failing the turn.

use std::sync::Arc;

use tracing::{info, warn};

use crate::entities::{
    MessageRole, MessageStore, ModelStore, NewMessage, NewReview, Review, ReviewMessage, ReviewStore, Session,
    UserStore,
};
use crate::error::ServerError;
use crate::gateway::{ChatMessage, ChatRequest, ModelGateway, SamplingOptions};
use crate::services::conversation;
use crate::services::turns::TurnLocks;

/// Title given to every new review.
pub const DEFAULT_REVIEW_TITLE: &str = "New Review";

/// ASSISTANT body recorded when the model produced nothing usable.
pub const FALLBACK_REPLY: &str = "Error formatting code";

/// Reviews are sampled deterministically.
pub const REVIEW_TEMPERATURE: f32 = 0.0;

pub struct ReviewOrchestrator<S> {
    store: Arc<S>,
    gateway: Arc<dyn ModelGateway>,
    turns: Option<Arc<TurnLocks>>,
}

impl<S> ReviewOrchestrator<S>
where
    S: UserStore + ModelStore + ReviewStore + MessageStore,
{
    pub fn new(store: Arc<S>, gateway: Arc<dyn ModelGateway>) -> Self {
        Self { store, gateway, turns: None }
    }

    /// Serialize follow-up turns per review through `locks`.
    pub fn with_turn_locks(mut self, locks: Arc<TurnLocks>) -> Self {
        self.turns = Some(locks);
        self
    }

    /// Open a new review of `code` and record the model's first answer.
    ///
    /// Returns the new review's id.  The review and its messages are separate
    /// writes; a failure in between can leave a review without messages.
    pub async fn start_review(
        &self,
        model: &str,
        system_prompt: &str,
        code: &str,
        acting: &Session,
    ) -> Result<i64, ServerError> {
        self.require_model(model).await?;

        let reply = self.ask(model, conversation::opening_exchange(system_prompt, code)).await;

        let owner = self.store.find_user_by_username(&acting.username).await?;
        if owner.is_none() {
            warn!(username = %acting.username, "acting user not found; review will have no owner");
        }

        let review = self
            .store
            .create_review(NewReview {
                user_id: owner.map(|u| u.id),
                code: code.to_owned(),
                title: DEFAULT_REVIEW_TITLE.to_owned(),
            })
            .await?;

        self.record_turn(review.id, system_prompt, reply).await?;
        info!(review_id = review.id, model, "review started");
        Ok(review.id)
    }

    /// Ask a follow-up question on an existing review.
    ///
    /// The model sees the original code again, with the previous non-SYSTEM
    /// messages and `new_prompt` layered into the system message.
    pub async fn continue_review(&self, review_id: i64, model: &str, new_prompt: &str) -> Result<(), ServerError> {
        let review = self
            .store
            .get_review(review_id)
            .await?
            .ok_or(ServerError::ReviewNotFound(review_id))?;
        self.require_model(model).await?;

        let _turn = match &self.turns {
            Some(locks) => Some(locks.acquire(review_id).await),
            None => None,
        };

        let history = self.store.list_messages(review_id).await?;
        let exchange = conversation::follow_up_exchange(&history, &review.code, new_prompt);
        let reply = self.ask(model, exchange).await;

        self.record_turn(review_id, new_prompt, reply).await?;
        info!(review_id, model, prior_messages = history.len(), "review continued");
        Ok(())
    }

    /// All messages of a review, in store order, plus the review itself when
    /// it exists.
    pub async fn list_messages(&self, review_id: i64) -> Result<(Vec<ReviewMessage>, Option<Review>), ServerError> {
        let review = self.store.get_review(review_id).await?;
        let messages = self.store.list_messages(review_id).await?;
        Ok((messages, review))
    }

    async fn require_model(&self, model: &str) -> Result<(), ServerError> {
        match self.store.find_model(model).await? {
            Some(_) => Ok(()),
            None => Err(ServerError::ModelNotFound(model.to_owned())),
        }
    }

    async fn ask(&self, model: &str, messages: Vec<ChatMessage>) -> String {
        let request = ChatRequest {
            model: model.to_owned(),
            messages,
            options: SamplingOptions { temperature: REVIEW_TEMPERATURE },
        };

        match self.gateway.chat(request).await {
            Ok(Some(content)) if !content.is_empty() => content,
            Ok(_) => {
                warn!(model, "model returned no content; recording fallback reply");
                FALLBACK_REPLY.to_owned()
            }
            Err(e) => {
                warn!(model, error = %e, "model call failed; recording fallback reply");
                FALLBACK_REPLY.to_owned()
            }
        }
    }

    async fn record_turn(&self, review_id: i64, prompt: &str, reply: String) -> Result<(), ServerError> {
        self.store
            .append_message(NewMessage {
                review_id,
                role: MessageRole::Client,
                body: prompt.to_owned(),
            })
            .await?;
        self.store
            .append_message(NewMessage {
                review_id,
                role: MessageRole::Assistant,
                body: reply,
            })
            .await?;
        Ok(())
    }
}

/// Parse a review id taken from a path or body.
pub fn parse_review_id(raw: &str) -> Result<i64, ServerError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ServerError::BadRequest("Review ID is required".into()));
    }
    raw.parse()
        .map_err(|_| ServerError::BadRequest(format!("invalid review id: {raw}")))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::{memory_store, NewUser, SqliteStore, UserRole};
    use crate::gateway::testing::RecordingGateway;
    use crate::gateway::ChatRole;
    use chrono::{Duration, Utc};
    use tracing_test::traced_test;

    struct Harness {
        store: Arc<SqliteStore>,
        gateway: Arc<RecordingGateway>,
        reviews: ReviewOrchestrator<SqliteStore>,
        alice: Session,
    }

    async fn harness(gateway: RecordingGateway) -> Harness {
        let store = Arc::new(memory_store().await);
        store
            .create_user(NewUser {
                username: "alice".into(),
                password_hash: "$argon2id$stub".into(),
                role: UserRole::User,
            })
            .await
            .unwrap();
        store.upsert_model(None, "Model one", "m1").await.unwrap();

        let gateway = Arc::new(gateway);
        let reviews = ReviewOrchestrator::new(Arc::clone(&store), gateway.clone() as Arc<dyn ModelGateway>)
            .with_turn_locks(Arc::new(TurnLocks::new()));
        let alice = Session {
            token: "t".into(),
            username: "alice".into(),
            role: UserRole::User,
            expires_at: Utc::now() + Duration::hours(1),
        };
        Harness { store, gateway, reviews, alice }
    }

    async fn sorted_messages(store: &SqliteStore, review_id: i64) -> Vec<ReviewMessage> {
        let mut msgs = store.list_messages(review_id).await.unwrap();
        msgs.sort_by(ReviewMessage::chronological);
        msgs
    }

    async fn review_count(store: &SqliteStore) -> i64 {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews")
            .fetch_one(store.pool())
            .await
            .unwrap();
        n
    }

    #[tokio::test]
    async fn start_review_records_prompt_and_reply() {
        let h = harness(RecordingGateway::new().reply("int x; // formatted")).await;

        let id = h.reviews.start_review("m1", "format this", "int x;", &h.alice).await.unwrap();

        let review = h.store.get_review(id).await.unwrap().unwrap();
        assert_eq!(review.code, "int x;");
        assert_eq!(review.title, DEFAULT_REVIEW_TITLE);
        assert!(review.user_id.is_some());

        let msgs = sorted_messages(&h.store, id).await;
        assert_eq!(msgs.len(), 2);
        assert_eq!((msgs[0].role, msgs[0].body.as_str()), (MessageRole::Client, "format this"));
        assert_eq!((msgs[1].role, msgs[1].body.as_str()), (MessageRole::Assistant, "int x; // formatted"));
    }

    #[tokio::test]
    async fn start_review_sends_prompt_as_system_and_code_as_user() {
        let h = harness(RecordingGateway::new()).await;
        h.reviews.start_review("m1", "format this", "int x;", &h.alice).await.unwrap();

        let requests = h.gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "m1");
        assert_eq!(requests[0].options.temperature, 0.0);
        assert_eq!(
            requests[0].messages,
            vec![ChatMessage::system("format this"), ChatMessage::user("int x;")]
        );
    }

    #[tokio::test]
    async fn start_review_with_unknown_model_writes_nothing() {
        let h = harness(RecordingGateway::new()).await;
        let err = h.reviews.start_review("nope", "p", "code", &h.alice).await.unwrap_err();

        assert!(matches!(err, ServerError::ModelNotFound(m) if m == "nope"));
        assert_eq!(review_count(&h.store).await, 0);
        assert!(h.gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn start_review_tolerates_unknown_acting_user() {
        let h = harness(RecordingGateway::new()).await;
        let ghost = Session { username: "ghost".into(), ..h.alice.clone() };

        let id = h.reviews.start_review("m1", "p", "code", &ghost).await.unwrap();
        assert_eq!(h.store.get_review(id).await.unwrap().unwrap().user_id, None);
    }

    #[tokio::test]
    #[traced_test]
    async fn empty_or_failed_replies_become_fallback() {
        let h = harness(RecordingGateway::new().reply_empty().fail("connection refused").reply("")).await;

        for _ in 0..3 {
            let id = h.reviews.start_review("m1", "p", "code", &h.alice).await.unwrap();
            let msgs = sorted_messages(&h.store, id).await;
            assert_eq!(msgs[1].role, MessageRole::Assistant);
            assert_eq!(msgs[1].body, FALLBACK_REPLY);
        }
        assert!(logs_contain("model call failed"));
        assert!(logs_contain("model returned no content"));
    }

    #[tokio::test]
    async fn continue_review_appends_one_turn() {
        let h = harness(RecordingGateway::new().reply("formatted").reply("commented")).await;
        let id = h.reviews.start_review("m1", "format this", "int x;", &h.alice).await.unwrap();

        h.reviews.continue_review(id, "m1", "now add comments").await.unwrap();

        let msgs = sorted_messages(&h.store, id).await;
        assert_eq!(msgs.len(), 4);
        assert_eq!(msgs[2].role, MessageRole::Client);
        assert_eq!(msgs[2].body, "now add comments");
        assert_eq!(msgs[3].role, MessageRole::Assistant);
        assert_eq!(msgs[3].body, "commented");
    }

    #[tokio::test]
    async fn failed_or_empty_follow_up_replies_become_fallback() {
        let h = harness(RecordingGateway::new().reply("x").fail("model unloaded").reply_empty()).await;
        let id = h.reviews.start_review("m1", "format this", "int x;", &h.alice).await.unwrap();

        h.reviews.continue_review(id, "m1", "now add comments").await.unwrap();
        h.reviews.continue_review(id, "m1", "and tests").await.unwrap();

        let msgs = sorted_messages(&h.store, id).await;
        assert_eq!(msgs.len(), 6);
        assert_eq!((msgs[2].role, msgs[2].body.as_str()), (MessageRole::Client, "now add comments"));
        assert_eq!((msgs[3].role, msgs[3].body.as_str()), (MessageRole::Assistant, FALLBACK_REPLY));
        assert_eq!((msgs[4].role, msgs[4].body.as_str()), (MessageRole::Client, "and tests"));
        assert_eq!((msgs[5].role, msgs[5].body.as_str()), (MessageRole::Assistant, FALLBACK_REPLY));
    }

    #[tokio::test]
    async fn continue_review_replays_history_without_system_messages() {
        let h = harness(RecordingGateway::new().reply("formatted")).await;
        let id = h.reviews.start_review("m1", "format this", "int x;", &h.alice).await.unwrap();
        h.store
            .append_message(NewMessage {
                review_id: id,
                role: MessageRole::System,
                body: "hidden framing".into(),
            })
            .await
            .unwrap();

        h.reviews.continue_review(id, "m1", "now add comments").await.unwrap();

        let request = h.gateway.requests().pop().unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(
            request.messages[0].content,
            conversation::follow_up_instructions(
                "<CLIENT> format this </CLIENT>\n<ASSISTANT> formatted </ASSISTANT>",
                "now add comments",
            )
        );
        assert!(!request.messages[0].content.contains("hidden framing"));
        assert_eq!(request.messages[1], ChatMessage::user("int x;"));
    }

    #[tokio::test]
    async fn continue_unknown_review_never_calls_model() {
        let h = harness(RecordingGateway::new()).await;
        let err = h.reviews.continue_review(404, "m1", "hello").await.unwrap_err();

        assert!(matches!(err, ServerError::ReviewNotFound(404)));
        assert!(h.gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn continue_with_unknown_model_writes_nothing() {
        let h = harness(RecordingGateway::new()).await;
        let id = h.reviews.start_review("m1", "p", "code", &h.alice).await.unwrap();

        let err = h.reviews.continue_review(id, "nope", "hello").await.unwrap_err();
        assert!(matches!(err, ServerError::ModelNotFound(_)));
        assert_eq!(h.store.list_messages(id).await.unwrap().len(), 2);
        assert_eq!(h.gateway.requests().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_follow_ups_keep_turns_contiguous() {
        let h = harness(RecordingGateway::new()).await;
        let id = h.reviews.start_review("m1", "p", "code", &h.alice).await.unwrap();

        let reviews = Arc::new(h.reviews);
        let mut tasks = Vec::new();
        for i in 0..4 {
            let reviews = Arc::clone(&reviews);
            tasks.push(tokio::spawn(async move {
                reviews.continue_review(id, "m1", &format!("turn {i}")).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let msgs = sorted_messages(&h.store, id).await;
        assert_eq!(msgs.len(), 10);
        for pair in msgs.chunks(2) {
            assert_eq!(pair[0].role, MessageRole::Client);
            assert_eq!(pair[1].role, MessageRole::Assistant);
        }
    }

    #[tokio::test]
    async fn list_messages_is_stable_between_reads() {
        let h = harness(RecordingGateway::new()).await;
        let id = h.reviews.start_review("m1", "p", "code", &h.alice).await.unwrap();

        let (mut first, review) = h.reviews.list_messages(id).await.unwrap();
        let (mut second, _) = h.reviews.list_messages(id).await.unwrap();
        first.sort_by(ReviewMessage::chronological);
        second.sort_by(ReviewMessage::chronological);
        assert_eq!(first, second);
        assert_eq!(review.map(|r| r.id), Some(id));

        let (msgs, missing) = h.reviews.list_messages(id + 100).await.unwrap();
        assert!(msgs.is_empty());
        assert!(missing.is_none());
    }

    #[test]
    fn review_ids_must_be_integers() {
        assert_eq!(parse_review_id(" 12 ").unwrap(), 12);
        assert!(matches!(parse_review_id(""), Err(ServerError::BadRequest(_))));
        assert!(matches!(parse_review_id("abc"), Err(ServerError::BadRequest(_))));
    }
}
