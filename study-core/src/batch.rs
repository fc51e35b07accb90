//! Bulk generation of every missing lesson and quiz for a curriculum.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Semaphore, mpsc};
use tracing::{info, warn};

use crate::curriculum::TopicKey;
use crate::error::Result;
use crate::generation::{GenerationOrchestrator, load_curriculum};

/// Concurrent model calls allowed during preparation.
pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Lesson,
    Quiz,
}

/// One unit of work: a lesson or quiz for one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareItem {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub topic_name: String,
    pub cluster_index: usize,
    pub topic_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrepareError {
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub topic_name: String,
    pub error: String,
}

/// Progress reported while preparing, serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrepareEvent {
    Start {
        total: usize,
    },
    BatchStart {
        batch_size: usize,
        /// Tasks finished before this batch.
        current: usize,
        total: usize,
        items: Vec<PrepareItem>,
    },
    BatchComplete {
        completed: usize,
        total: usize,
        generated_count: usize,
    },
    Complete {
        generated_count: usize,
        errors: Vec<PrepareError>,
    },
}

/// Final tally of a preparation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareOutcome {
    pub total: usize,
    pub generated_count: usize,
    pub errors: Vec<PrepareError>,
}

/// Fills the content cache for whole curricula.
///
/// Batches are processed one after another. Within a batch every task runs
/// concurrently, gated by a semaphore shared by all runs on this preparer.
pub struct BatchPreparer {
    orchestrator: Arc<GenerationOrchestrator>,
    semaphore: Arc<Semaphore>,
    batch_size: usize,
}

impl BatchPreparer {
    pub fn new(orchestrator: Arc<GenerationOrchestrator>) -> Self {
        Self::with_concurrency(orchestrator, DEFAULT_CONCURRENCY)
    }

    pub fn with_concurrency(orchestrator: Arc<GenerationOrchestrator>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            orchestrator,
            semaphore: Arc::new(Semaphore::new(concurrency)),
            batch_size: concurrency,
        }
    }

    /// Every missing artifact of the curriculum, in curriculum order.
    ///
    /// Fails with `NotFound` for an unknown curriculum.
    pub fn plan(&self, curriculum_id: &str) -> Result<Vec<PrepareItem>> {
        let key = TopicKey::new(curriculum_id, 0, 0);
        let curriculum = load_curriculum(self.orchestrator.curricula().as_ref(), &key)?;
        let content = self.orchestrator.content();

        let mut items = Vec::new();
        for (c, t, topic) in curriculum.topics() {
            let key = TopicKey::new(curriculum_id, c, t);
            let item = |kind| PrepareItem {
                kind,
                topic_name: topic.name.clone(),
                cluster_index: c,
                topic_index: t,
            };
            if content.get_lesson(&key)?.is_none() {
                items.push(item(ContentKind::Lesson));
            }
            if content.count_quiz_versions(&key)? == 0 {
                items.push(item(ContentKind::Quiz));
            }
        }
        Ok(items)
    }

    /// Plan and run, streaming events to `events`.
    ///
    /// An unknown curriculum fails before any event is sent. A dropped
    /// receiver does not stop the run.
    pub async fn prepare(
        &self,
        curriculum_id: &str,
        events: mpsc::Sender<PrepareEvent>,
    ) -> Result<PrepareOutcome> {
        let items = self.plan(curriculum_id)?;
        Ok(self.run(curriculum_id, items, &events).await)
    }

    /// Generate `items` batch by batch. Per-task failures are collected.
    pub async fn run(
        &self,
        curriculum_id: &str,
        items: Vec<PrepareItem>,
        events: &mpsc::Sender<PrepareEvent>,
    ) -> PrepareOutcome {
        let total = items.len();
        info!(curriculum_id, total, "preparing content");
        emit(events, PrepareEvent::Start { total }).await;

        let mut outcome = PrepareOutcome {
            total,
            ..Default::default()
        };
        let mut completed = 0;

        for batch in items.chunks(self.batch_size) {
            emit(
                events,
                PrepareEvent::BatchStart {
                    batch_size: batch.len(),
                    current: completed,
                    total,
                    items: batch.to_vec(),
                },
            )
            .await;

            let handles: Vec<_> = batch
                .iter()
                .map(|item| {
                    let item = item.clone();
                    let handle = tokio::spawn(generate(
                        self.orchestrator.clone(),
                        self.semaphore.clone(),
                        TopicKey::new(curriculum_id, item.cluster_index, item.topic_index),
                        item.kind,
                    ));
                    (item, handle)
                })
                .collect();

            for (item, handle) in handles {
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(format!("task failed: {}", e)),
                };
                match result {
                    Ok(()) => outcome.generated_count += 1,
                    Err(error) => {
                        warn!(
                            curriculum_id,
                            topic = %item.topic_name,
                            kind = ?item.kind,
                            error = %error,
                            "preparation task failed"
                        );
                        outcome.errors.push(PrepareError {
                            kind: item.kind,
                            topic_name: item.topic_name,
                            error,
                        });
                    }
                }
                completed += 1;
            }

            emit(
                events,
                PrepareEvent::BatchComplete {
                    completed,
                    total,
                    generated_count: outcome.generated_count,
                },
            )
            .await;
        }

        info!(
            curriculum_id,
            generated = outcome.generated_count,
            failed = outcome.errors.len(),
            "content preparation finished"
        );
        emit(
            events,
            PrepareEvent::Complete {
                generated_count: outcome.generated_count,
                errors: outcome.errors.clone(),
            },
        )
        .await;
        outcome
    }
}

async fn generate(
    orchestrator: Arc<GenerationOrchestrator>,
    semaphore: Arc<Semaphore>,
    key: TopicKey,
    kind: ContentKind,
) -> std::result::Result<(), String> {
    let _permit = semaphore
        .acquire_owned()
        .await
        .map_err(|e| e.to_string())?;
    let result = match kind {
        ContentKind::Lesson => orchestrator.generate_lesson(&key).await.map(|_| ()),
        ContentKind::Quiz => orchestrator.generate_quiz(&key, false).await.map(|_| ()),
    };
    result.map_err(|e| e.to_string())
}

async fn emit(events: &mpsc::Sender<PrepareEvent>, event: PrepareEvent) {
    // Receiver gone means nobody is listening; keep going.
    let _ = events.send(event).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::fixtures as content_fixtures;
    use crate::curriculum::fixtures;
    use crate::error::StudyError;
    use crate::generation::test_support::{StaticCurricula, lesson_json, quiz_json};
    use crate::model::ModelClient;
    use crate::store::{ContentStore, FileContentStore};
    use crate::testing::ScriptedProvider;
    use std::time::Duration;
    use study_models::ChatRequest;
    use tempfile::{TempDir, tempdir};

    fn reply_for(request: &ChatRequest) -> std::result::Result<String, String> {
        let prompt = &request.messages[0].content;
        if prompt.starts_with("Create a complete lesson") {
            Ok(lesson_json("Topic"))
        } else {
            Ok(quiz_json("Topic"))
        }
    }

    fn setup(
        dir: &TempDir,
        provider: ScriptedProvider,
    ) -> (BatchPreparer, Arc<FileContentStore>, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let content = Arc::new(FileContentStore::new(dir.path()));
        let orchestrator = GenerationOrchestrator::new(
            ModelClient::new(provider.clone(), "test-model"),
            content.clone(),
            Arc::new(StaticCurricula::with("abc", fixtures::algorithms())),
        );
        (BatchPreparer::new(Arc::new(orchestrator)), content, provider)
    }

    /// Cache everything except the artifacts of topic 0-1.
    fn fill_all_but_sorting(content: &FileContentStore) {
        for (c, t) in [(0, 0), (1, 0)] {
            let key = TopicKey::new("abc", c, t);
            content.put_lesson(&key, &content_fixtures::lesson()).unwrap();
            content.put_quiz(&key, &content_fixtures::quiz()).unwrap();
        }
    }

    async fn collect(mut rx: mpsc::Receiver<PrepareEvent>) -> Vec<PrepareEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[test]
    fn event_serializes_with_type_tag() {
        let event = PrepareEvent::BatchStart {
            batch_size: 1,
            current: 0,
            total: 1,
            items: vec![PrepareItem {
                kind: ContentKind::Quiz,
                topic_name: "Graphs".into(),
                cluster_index: 1,
                topic_index: 0,
            }],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "batch_start");
        assert_eq!(json["items"][0]["type"], "quiz");
        assert_eq!(json["items"][0]["topic_name"], "Graphs");
    }

    #[test]
    fn plan_lists_missing_artifacts_in_order() {
        let dir = tempdir().unwrap();
        let (preparer, content, _) = setup(&dir, ScriptedProvider::new(Vec::<String>::new()));
        content
            .put_lesson(&TopicKey::new("abc", 0, 0), &content_fixtures::lesson())
            .unwrap();

        let plan: Vec<_> = preparer
            .plan("abc")
            .unwrap()
            .into_iter()
            .map(|i| (i.kind, i.cluster_index, i.topic_index))
            .collect();
        assert_eq!(
            plan,
            vec![
                (ContentKind::Quiz, 0, 0),
                (ContentKind::Lesson, 0, 1),
                (ContentKind::Quiz, 0, 1),
                (ContentKind::Lesson, 1, 0),
                (ContentKind::Quiz, 1, 0),
            ]
        );
    }

    #[tokio::test]
    async fn unknown_curriculum_fails_before_any_event() {
        let dir = tempdir().unwrap();
        let (preparer, _, _) = setup(&dir, ScriptedProvider::new(Vec::<String>::new()));
        let (tx, rx) = mpsc::channel(16);

        let err = preparer.prepare("missing", tx).await.unwrap_err();
        assert!(matches!(err, StudyError::NotFound(_)));
        assert!(collect(rx).await.is_empty());
    }

    #[tokio::test]
    async fn nothing_missing_reports_start_and_complete() {
        let dir = tempdir().unwrap();
        let (preparer, content, provider) =
            setup(&dir, ScriptedProvider::new(Vec::<String>::new()));
        fill_all_but_sorting(&content);
        let key = TopicKey::new("abc", 0, 1);
        content.put_lesson(&key, &content_fixtures::lesson()).unwrap();
        content.put_quiz(&key, &content_fixtures::quiz()).unwrap();

        let (tx, rx) = mpsc::channel(16);
        let outcome = preparer.prepare("abc", tx).await.unwrap();

        assert_eq!(outcome.total, 0);
        assert_eq!(
            collect(rx).await,
            vec![
                PrepareEvent::Start { total: 0 },
                PrepareEvent::Complete {
                    generated_count: 0,
                    errors: vec![]
                },
            ]
        );
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn one_topic_missing_both_generates_a_single_batch() {
        let dir = tempdir().unwrap();
        let (preparer, content, provider) = setup(&dir, ScriptedProvider::from_fn(reply_for));
        fill_all_but_sorting(&content);

        let (tx, rx) = mpsc::channel(16);
        let outcome = preparer.prepare("abc", tx).await.unwrap();
        let events = collect(rx).await;

        assert_eq!(events.len(), 4);
        assert_eq!(events[0], PrepareEvent::Start { total: 2 });
        match &events[1] {
            PrepareEvent::BatchStart {
                batch_size,
                current,
                items,
                ..
            } => {
                assert_eq!(*batch_size, 2);
                assert_eq!(*current, 0);
                assert_eq!(items[0].kind, ContentKind::Lesson);
                assert_eq!(items[1].kind, ContentKind::Quiz);
                assert_eq!(items[0].topic_name, "Sorting");
            }
            other => panic!("expected batch_start, got {:?}", other),
        }
        assert_eq!(
            events[2],
            PrepareEvent::BatchComplete {
                completed: 2,
                total: 2,
                generated_count: 2
            }
        );
        assert_eq!(
            events[3],
            PrepareEvent::Complete {
                generated_count: 2,
                errors: vec![]
            }
        );

        assert_eq!(outcome.generated_count, 2);
        assert_eq!(provider.call_count(), 2);
        let key = TopicKey::new("abc", 0, 1);
        assert!(content.get_lesson(&key).unwrap().is_some());
        assert_eq!(content.count_quiz_versions(&key).unwrap(), 1);
    }

    #[tokio::test]
    async fn failed_task_is_reported_without_aborting_the_batch() {
        let dir = tempdir().unwrap();
        let provider = ScriptedProvider::from_fn(|request| {
            if request.messages[0].content.starts_with("Create a quiz") {
                Err("quota exceeded".to_string())
            } else {
                reply_for(request)
            }
        });
        let (preparer, content, _) = setup(&dir, provider);
        fill_all_but_sorting(&content);

        let (tx, _rx) = mpsc::channel(16);
        let outcome = preparer.prepare("abc", tx).await.unwrap();

        assert_eq!(outcome.generated_count, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].kind, ContentKind::Quiz);
        assert_eq!(outcome.errors[0].topic_name, "Sorting");
        assert!(outcome.errors[0].error.contains("quota exceeded"));
    }

    #[tokio::test]
    async fn concurrency_stays_within_the_limit() {
        let dir = tempdir().unwrap();
        let (preparer, _, provider) = setup(
            &dir,
            ScriptedProvider::from_fn(reply_for).with_delay(Duration::from_millis(20)),
        );

        let (tx, rx) = mpsc::channel(64);
        let outcome = preparer.prepare("abc", tx).await.unwrap();
        let events = collect(rx).await;

        assert_eq!(outcome.total, 6);
        assert_eq!(outcome.generated_count, 6);
        assert!(provider.max_in_flight() <= DEFAULT_CONCURRENCY);

        let batch_sizes: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PrepareEvent::BatchStart {
                    batch_size,
                    current,
                    ..
                } => Some((*batch_size, *current)),
                _ => None,
            })
            .collect();
        assert_eq!(batch_sizes, vec![(4, 0), (2, 4)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn overlapping_runs_share_one_limit() {
        let dir = tempdir().unwrap();
        let provider = Arc::new(
            ScriptedProvider::from_fn(reply_for).with_delay(Duration::from_millis(50)),
        );
        let mut curricula = StaticCurricula::default();
        curricula.0.insert("aaa".into(), fixtures::algorithms());
        curricula.0.insert("bbb".into(), fixtures::algorithms());
        let orchestrator = GenerationOrchestrator::new(
            ModelClient::new(provider.clone(), "test-model"),
            Arc::new(FileContentStore::new(dir.path())),
            Arc::new(curricula),
        );
        let preparer = BatchPreparer::new(Arc::new(orchestrator));

        let (tx_a, _rx_a) = mpsc::channel(64);
        let (tx_b, _rx_b) = mpsc::channel(64);
        let (a, b) = tokio::join!(preparer.prepare("aaa", tx_a), preparer.prepare("bbb", tx_b));

        assert_eq!(a.unwrap().generated_count, 6);
        assert_eq!(b.unwrap().generated_count, 6);
        assert_eq!(provider.call_count(), 12);
        // Each run alone fills a batch of four, so together they would reach
        // eight without a shared limit.
        assert!(provider.max_in_flight() <= DEFAULT_CONCURRENCY);
    }

    #[tokio::test]
    async fn dropped_receiver_does_not_stop_preparation() {
        let dir = tempdir().unwrap();
        let (preparer, content, _) = setup(&dir, ScriptedProvider::from_fn(reply_for));
        fill_all_but_sorting(&content);

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let outcome = preparer.prepare("abc", tx).await.unwrap();

        assert_eq!(outcome.generated_count, 2);
        assert!(
            content
                .get_lesson(&TopicKey::new("abc", 0, 1))
                .unwrap()
                .is_some()
        );
    }
}
