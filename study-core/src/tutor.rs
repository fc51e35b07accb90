//! Per-topic tutoring chat.

use std::sync::Arc;

use study_models::Message;
use tracing::info;

use crate::curriculum::{CurriculumLookup, TopicKey};
use crate::error::Result;
use crate::generation::{load_curriculum, topic_context};
use crate::model::ModelClient;
use crate::prompts;
use crate::store::ContentStore;

pub const TUTOR_MAX_TOKENS: u32 = 1024;

/// Answers questions about one topic, keeping the transcript in the content
/// store.
pub struct Tutor {
    model: ModelClient,
    content: Arc<dyn ContentStore>,
    curricula: Arc<dyn CurriculumLookup>,
}

impl Tutor {
    pub fn new(
        model: ModelClient,
        content: Arc<dyn ContentStore>,
        curricula: Arc<dyn CurriculumLookup>,
    ) -> Self {
        Self {
            model,
            content,
            curricula,
        }
    }

    /// Send `message` and return the reply with the updated transcript.
    ///
    /// The user turn is recorded before the model is called, so it stays in
    /// the transcript when the call fails.
    pub async fn chat(
        &self,
        key: &TopicKey,
        message: &str,
        highlighted_context: Option<&str>,
    ) -> Result<(String, Vec<Message>)> {
        let curriculum = load_curriculum(self.curricula.as_ref(), key)?;
        let ctx = topic_context(&curriculum, key)?;

        let lesson = self.content.get_lesson(key)?;
        let system = prompts::tutor(
            &ctx,
            lesson.as_ref().map(|l| l.summary.as_str()),
            highlighted_context.filter(|h| !h.trim().is_empty()),
        );

        let transcript = self
            .content
            .append_chat_message(key, Message::user(message))?;
        info!(topic = %key, turns = transcript.len(), "tutor question");

        let response = self
            .model
            .invoke(Some(&system), transcript, TUTOR_MAX_TOKENS)
            .await?;
        let history = self
            .content
            .append_chat_message(key, Message::assistant(response.clone()))?;
        Ok((response, history))
    }

    pub fn history(&self, key: &TopicKey) -> Result<Vec<Message>> {
        Ok(self.content.chat_history(key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures as content_fixtures;
    use crate::curriculum::fixtures;
    use crate::error::StudyError;
    use crate::generation::test_support::StaticCurricula;
    use crate::store::FileContentStore;
    use crate::testing::ScriptedProvider;
    use study_models::Role;
    use tempfile::{TempDir, tempdir};

    fn tutor(dir: &TempDir, provider: Arc<ScriptedProvider>) -> (Tutor, Arc<FileContentStore>) {
        let content = Arc::new(FileContentStore::new(dir.path()));
        let tutor = Tutor::new(
            ModelClient::new(provider, "test-model"),
            content.clone(),
            Arc::new(StaticCurricula::with("abc", fixtures::algorithms())),
        );
        (tutor, content)
    }

    #[tokio::test]
    async fn chat_records_both_turns() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(["Halve the range each step."]));
        let (tutor, _) = tutor(&dir, provider.clone());
        let key = TopicKey::new("abc", 0, 0);

        let (response, history) = tutor.chat(&key, "How does it work?", None).await.unwrap();

        assert_eq!(response, "Halve the range each step.");
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(tutor.history(&key).unwrap(), history);

        let request = &provider.requests()[0];
        assert_eq!(request.max_tokens, Some(TUTOR_MAX_TOKENS));
        assert!(request.system.as_deref().unwrap().contains("Binary Search"));
    }

    #[tokio::test]
    async fn full_transcript_is_sent_on_follow_up() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(["first", "second"]));
        let (tutor, _) = tutor(&dir, provider.clone());
        let key = TopicKey::new("abc", 0, 0);

        tutor.chat(&key, "q1", None).await.unwrap();
        let (_, history) = tutor.chat(&key, "q2", None).await.unwrap();

        assert_eq!(history.len(), 4);
        let sent = &provider.requests()[1].messages;
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].content, "q2");
    }

    #[tokio::test]
    async fn system_prompt_uses_lesson_summary_and_highlight() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(["ok"]));
        let (tutor, content) = tutor(&dir, provider.clone());
        let key = TopicKey::new("abc", 0, 0);
        content.put_lesson(&key, &content_fixtures::lesson()).unwrap();

        tutor
            .chat(&key, "What does this mean?", Some("sorted input"))
            .await
            .unwrap();

        let system = provider.requests()[0].system.clone().unwrap();
        assert!(system.contains("Use it on sorted data."));
        assert!(system.contains("\"sorted input\""));
    }

    #[tokio::test]
    async fn model_failure_keeps_user_turn() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::failing("overloaded"));
        let (tutor, _) = tutor(&dir, provider);
        let key = TopicKey::new("abc", 0, 0);

        let err = tutor.chat(&key, "Hello?", None).await.unwrap_err();
        assert!(matches!(err, StudyError::ModelUnavailable(_)));

        let history = tutor.history(&key).unwrap();
        assert_eq!(history, vec![Message::user("Hello?")]);
    }

    #[tokio::test]
    async fn unknown_topic_is_rejected_without_recording() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(["unused"]));
        let (tutor, _) = tutor(&dir, provider.clone());

        let err = tutor
            .chat(&TopicKey::new("abc", 4, 0), "Hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::TopicOutOfRange { .. }));

        let err = tutor
            .chat(&TopicKey::new("nope", 0, 0), "Hi", None)
            .await
            .unwrap_err();
        assert!(matches!(err, StudyError::NotFound(_)));
        assert_eq!(provider.call_count(), 0);
    }
}
