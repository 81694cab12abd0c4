//! Streaming generation sessions.
//!
//! A session is one end-to-end generation: prepare the prompt (persisting
//! the triggering user turn first), stream tokens from the resolved
//! provider, and on clean completion persist the assistant turn and a usage
//! row. Cancellation between fragments persists nothing.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures_util::{Stream, StreamExt};
use reverie_types::chat::TurnRole;
use reverie_types::error::ChatError;
use reverie_types::llm::{GenerationRequest, Message, StreamChunk};
use reverie_types::settings::GenerationSettings;
use reverie_types::usage::UsageRecord;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::chat::composer::compose;
use crate::chat::settings::load_generation_settings;
use crate::llm::ResolvedProvider;
use crate::repository::{
    CharacterRepository, ConversationRepository, LorebookRepository, MemoryRepository,
    SettingsRepository, UsageRepository,
};

/// One event on a session's outbound stream.
///
/// Every stream ends with exactly one terminal event (`Done` or `Error`),
/// except cancellation, which ends the stream with no terminal event at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Token(String),
    Done,
    Error(String),
}

/// Everything needed to run one generation, assembled before any provider
/// traffic. Composition failures surface here, not mid-stream.
#[derive(Debug, Clone)]
pub struct PreparedGeneration {
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub messages: Vec<Message>,
    pub settings: GenerationSettings,
}

/// Orchestrates the prompt-assembly and streaming-completion pipeline.
///
/// Generic over the repository traits so reverie-core never depends on
/// reverie-infra. Held in an `Arc` by the API layer; `stream_generation`
/// clones that handle into the stream it returns.
pub struct ChatEngine<Co, Ch, Me, Lo, Se, Us> {
    conversations: Co,
    characters: Ch,
    memories: Me,
    lorebooks: Lo,
    settings: Se,
    usage: Us,
}

impl<Co, Ch, Me, Lo, Se, Us> ChatEngine<Co, Ch, Me, Lo, Se, Us>
where
    Co: ConversationRepository,
    Ch: CharacterRepository,
    Me: MemoryRepository,
    Lo: LorebookRepository,
    Se: SettingsRepository,
    Us: UsageRepository,
{
    pub fn new(
        conversations: Co,
        characters: Ch,
        memories: Me,
        lorebooks: Lo,
        settings: Se,
        usage: Us,
    ) -> Self {
        Self {
            conversations,
            characters,
            memories,
            lorebooks,
            settings,
            usage,
        }
    }

    pub fn conversations(&self) -> &Co {
        &self.conversations
    }

    pub fn characters(&self) -> &Ch {
        &self.characters
    }

    pub fn memories(&self) -> &Me {
        &self.memories
    }

    pub fn lorebooks(&self) -> &Lo {
        &self.lorebooks
    }

    pub fn settings(&self) -> &Se {
        &self.settings
    }

    pub fn usage(&self) -> &Us {
        &self.usage
    }

    /// Prepare a generation for a new user message.
    ///
    /// The user turn is persisted before anything else, so it survives even
    /// if the generation is cancelled or fails.
    pub async fn begin_send(
        &self,
        conversation_id: &Uuid,
        text: &str,
    ) -> Result<PreparedGeneration, ChatError> {
        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;
        self.conversations
            .append_turn(conversation_id, TurnRole::User, text)
            .await?;
        self.conversations.touch(conversation_id).await?;
        self.prepare(conversation_id, conversation.user_id).await
    }

    /// Prepare a regeneration of the last assistant reply.
    ///
    /// Deletes at most one assistant turn created after the most recent user
    /// turn, then composes as if that user turn had just arrived.
    pub async fn begin_regenerate(
        &self,
        conversation_id: &Uuid,
    ) -> Result<PreparedGeneration, ChatError> {
        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or(ChatError::ConversationNotFound)?;
        let user_turn = self
            .conversations
            .last_user_turn(conversation_id)
            .await?
            .ok_or(ChatError::NothingToRegenerate)?;
        if let Some(stale) = self
            .conversations
            .last_assistant_turn_after(conversation_id, user_turn.created_at)
            .await?
        {
            self.conversations.delete_turn(&stale.id).await?;
        }
        self.prepare(conversation_id, conversation.user_id).await
    }

    async fn prepare(
        &self,
        conversation_id: &Uuid,
        user_id: Uuid,
    ) -> Result<PreparedGeneration, ChatError> {
        let settings = load_generation_settings(&self.settings).await?;
        let messages = compose(
            &self.conversations,
            &self.characters,
            &self.memories,
            &self.lorebooks,
            conversation_id,
            &settings,
        )
        .await?;
        Ok(PreparedGeneration {
            conversation_id: *conversation_id,
            user_id,
            messages,
            settings,
        })
    }

    /// Run a prepared generation against a resolved provider.
    ///
    /// Pull-based: each fragment is appended to the accumulator and yielded
    /// before the next is requested, with cancellation checked in between.
    /// Clean completion persists the concatenated assistant turn, touches
    /// the conversation, and records one usage row with wall-clock latency.
    /// Cancellation ends the stream silently with nothing persisted.
    pub fn stream_generation(
        self: Arc<Self>,
        prepared: PreparedGeneration,
        resolved: ResolvedProvider,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Stream<Item = SessionEvent> + Send>>
    where
        Co: 'static,
        Ch: 'static,
        Me: 'static,
        Lo: 'static,
        Se: 'static,
        Us: 'static,
    {
        let engine = self;
        Box::pin(async_stream::stream! {
            let started = Instant::now();
            let request = GenerationRequest {
                model: resolved.model.clone(),
                messages: prepared.messages,
                sampling: prepared.settings.sampling.clone(),
            };
            let mut chunks = resolved.provider.generate(request);
            let mut accumulated = String::new();
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        debug!(
                            conversation_id = %prepared.conversation_id,
                            fragments_discarded = accumulated.len(),
                            "generation cancelled"
                        );
                        return;
                    }
                    chunk = chunks.next() => match chunk {
                        Some(Ok(StreamChunk::Token { text })) => {
                            accumulated.push_str(&text);
                            yield SessionEvent::Token(text);
                        }
                        Some(Ok(StreamChunk::Done)) | None => {
                            match engine
                                .finish(
                                    &prepared.conversation_id,
                                    prepared.user_id,
                                    &accumulated,
                                    resolved.provider_name(),
                                    &resolved.model,
                                    started.elapsed().as_millis() as u64,
                                )
                                .await
                            {
                                Ok(()) => yield SessionEvent::Done,
                                Err(err) => {
                                    warn!(
                                        conversation_id = %prepared.conversation_id,
                                        error = %err,
                                        "failed to persist completed generation"
                                    );
                                    yield SessionEvent::Error(err.to_string());
                                }
                            }
                            return;
                        }
                        Some(Err(err)) => {
                            debug!(
                                conversation_id = %prepared.conversation_id,
                                error = %err,
                                "provider stream failed"
                            );
                            yield SessionEvent::Error(err.to_string());
                            return;
                        }
                    }
                }
            }
        })
    }

    async fn finish(
        &self,
        conversation_id: &Uuid,
        user_id: Uuid,
        content: &str,
        provider: &str,
        model: &str,
        latency_ms: u64,
    ) -> Result<(), ChatError> {
        self.conversations
            .append_turn(conversation_id, TurnRole::Assistant, content)
            .await?;
        self.conversations.touch(conversation_id).await?;
        self.usage
            .record(&UsageRecord {
                id: Uuid::now_v7(),
                user_id,
                provider: provider.to_string(),
                model: model.to_string(),
                latency_ms,
                created_at: Utc::now(),
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use reverie_types::error::RepositoryError;
    use reverie_types::llm::ProviderError;

    use crate::chat::composer::tests::{
        test_character, test_conversation, FakeCharacters, FakeConversations, FakeLorebooks,
        FakeMemories,
    };
    use crate::llm::ChatProvider;

    use super::*;

    struct FakeSettings;

    impl SettingsRepository for FakeSettings {
        async fn get(&self, _key: &str) -> Result<Option<String>, RepositoryError> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn all(&self) -> Result<Vec<(String, String)>, RepositoryError> {
            Ok(Vec::new())
        }
    }

    struct FakeUsage {
        records: Mutex<Vec<UsageRecord>>,
    }

    impl FakeUsage {
        fn new() -> Self {
            Self {
                records: Mutex::new(Vec::new()),
            }
        }
    }

    impl UsageRepository for FakeUsage {
        async fn record(&self, record: &UsageRecord) -> Result<(), RepositoryError> {
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn list_recent(&self, limit: u32) -> Result<Vec<UsageRecord>, RepositoryError> {
            let records = self.records.lock().unwrap();
            Ok(records.iter().rev().take(limit as usize).cloned().collect())
        }
    }

    /// Replays a scripted list of chunk results.
    struct ScriptedProvider {
        chunks: Vec<Result<StreamChunk, &'static str>>,
    }

    impl ScriptedProvider {
        fn tokens(tokens: &[&str]) -> Self {
            let mut chunks: Vec<Result<StreamChunk, &'static str>> = tokens
                .iter()
                .map(|t| {
                    Ok(StreamChunk::Token {
                        text: t.to_string(),
                    })
                })
                .collect();
            chunks.push(Ok(StreamChunk::Done));
            Self { chunks }
        }

        fn http_401() -> Self {
            Self {
                chunks: vec![Err("unauthorized")],
            }
        }
    }

    impl ChatProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Pin<Box<dyn Stream<Item = Result<StreamChunk, ProviderError>> + Send + 'static>>
        {
            let chunks: Vec<Result<StreamChunk, ProviderError>> = self
                .chunks
                .iter()
                .map(|c| match c {
                    Ok(chunk) => Ok(chunk.clone()),
                    Err(body) => Err(ProviderError::Http {
                        status: 401,
                        body: body.to_string(),
                    }),
                })
                .collect();
            Box::pin(futures_util::stream::iter(chunks))
        }
    }

    type TestEngine = ChatEngine<
        FakeConversations,
        FakeCharacters,
        FakeMemories,
        FakeLorebooks,
        FakeSettings,
        FakeUsage,
    >;

    fn engine_with_conversation() -> (Arc<TestEngine>, Uuid) {
        let character = test_character(Vec::new());
        let conversation = test_conversation(character.id);
        let conversation_id = conversation.id;
        let engine = Arc::new(ChatEngine::new(
            FakeConversations::seed(conversation),
            FakeCharacters::seed(character),
            FakeMemories::new(),
            FakeLorebooks::new(),
            FakeSettings,
            FakeUsage::new(),
        ));
        (engine, conversation_id)
    }

    fn resolved(provider: ScriptedProvider) -> ResolvedProvider {
        ResolvedProvider {
            provider: Arc::new(provider),
            model: "test-model".to_string(),
        }
    }

    async fn collect(stream: Pin<Box<dyn Stream<Item = SessionEvent> + Send>>) -> Vec<SessionEvent> {
        stream.collect().await
    }

    #[tokio::test]
    async fn begin_send_persists_user_turn_first() {
        let (engine, conversation_id) = engine_with_conversation();
        let prepared = engine
            .begin_send(&conversation_id, "hello there")
            .await
            .unwrap();
        let turns = engine
            .conversations()
            .list_turns(&conversation_id)
            .await
            .unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(turns[0].content, "hello there");
        // The just-persisted turn replays as the final message.
        assert_eq!(prepared.messages.last().unwrap().content, "hello there");
    }

    #[tokio::test]
    async fn begin_send_unknown_conversation_fails() {
        let (engine, _) = engine_with_conversation();
        let err = engine
            .begin_send(&Uuid::now_v7(), "hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ConversationNotFound));
    }

    #[tokio::test]
    async fn clean_completion_persists_exact_concatenation() {
        let (engine, conversation_id) = engine_with_conversation();
        let prepared = engine.begin_send(&conversation_id, "say hi").await.unwrap();

        let events = collect(engine.clone().stream_generation(
            prepared,
            resolved(ScriptedProvider::tokens(&["Hel", "lo ", "there"])),
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(
            events,
            vec![
                SessionEvent::Token("Hel".to_string()),
                SessionEvent::Token("lo ".to_string()),
                SessionEvent::Token("there".to_string()),
                SessionEvent::Done,
            ]
        );
        let turns = engine
            .conversations()
            .list_turns(&conversation_id)
            .await
            .unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].role, TurnRole::Assistant);
        assert_eq!(turns[1].content, "Hello there");

        let usage = engine.usage().list_recent(10).await.unwrap();
        assert_eq!(usage.len(), 1);
        assert_eq!(usage[0].provider, "scripted");
        assert_eq!(usage[0].model, "test-model");
    }

    #[tokio::test]
    async fn provider_failure_yields_single_error_and_persists_nothing() {
        // Scenario: provider rejects with HTTP 401.
        let (engine, conversation_id) = engine_with_conversation();
        let prepared = engine.begin_send(&conversation_id, "say hi").await.unwrap();

        let events = collect(engine.clone().stream_generation(
            prepared,
            resolved(ScriptedProvider::http_401()),
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], SessionEvent::Error(msg) if msg.contains("401")));
        // Only the user turn survives; no usage row.
        let turns = engine
            .conversations()
            .list_turns(&conversation_id)
            .await
            .unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TurnRole::User);
        assert!(engine.usage().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancellation_persists_nothing_and_ends_silently() {
        let (engine, conversation_id) = engine_with_conversation();
        let prepared = engine.begin_send(&conversation_id, "say hi").await.unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let events = collect(engine.clone().stream_generation(
            prepared,
            resolved(ScriptedProvider::tokens(&["never", "seen"])),
            cancel,
        ))
        .await;

        assert!(events.is_empty());
        let turns = engine
            .conversations()
            .list_turns(&conversation_id)
            .await
            .unwrap();
        assert_eq!(turns.len(), 1);
        assert!(engine.usage().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_completion_is_still_persisted() {
        let (engine, conversation_id) = engine_with_conversation();
        let prepared = engine.begin_send(&conversation_id, "say hi").await.unwrap();

        let events = collect(engine.clone().stream_generation(
            prepared,
            resolved(ScriptedProvider::tokens(&[])),
            CancellationToken::new(),
        ))
        .await;

        assert_eq!(events, vec![SessionEvent::Done]);
        let turns = engine
            .conversations()
            .list_turns(&conversation_id)
            .await
            .unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].content, "");
    }

    #[tokio::test]
    async fn regenerate_deletes_at_most_one_assistant_turn() {
        let (engine, conversation_id) = engine_with_conversation();
        engine
            .conversations()
            .append_turn(&conversation_id, TurnRole::User, "tell me a story")
            .await
            .unwrap();
        engine
            .conversations()
            .append_turn(&conversation_id, TurnRole::Assistant, "Once upon a time")
            .await
            .unwrap();

        let prepared = engine.begin_regenerate(&conversation_id).await.unwrap();
        let turns = engine
            .conversations()
            .list_turns(&conversation_id)
            .await
            .unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TurnRole::User);
        assert_eq!(prepared.messages.last().unwrap().content, "tell me a story");
    }

    #[tokio::test]
    async fn regenerate_without_reply_deletes_nothing() {
        let (engine, conversation_id) = engine_with_conversation();
        engine
            .conversations()
            .append_turn(&conversation_id, TurnRole::User, "hello?")
            .await
            .unwrap();

        engine.begin_regenerate(&conversation_id).await.unwrap();
        let turns = engine
            .conversations()
            .list_turns(&conversation_id)
            .await
            .unwrap();
        assert_eq!(turns.len(), 1);
    }

    #[tokio::test]
    async fn regenerate_with_no_user_turn_fails() {
        let (engine, conversation_id) = engine_with_conversation();
        let err = engine.begin_regenerate(&conversation_id).await.unwrap_err();
        assert!(matches!(err, ChatError::NothingToRegenerate));
    }
}
