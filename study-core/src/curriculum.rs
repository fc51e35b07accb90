//! Curriculum structure, learning progress, and the lookup seams the engine
//! depends on.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;

/// A single topic within a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Learning order within the cluster (1 = first).
    #[serde(default)]
    pub order: u32,
    /// Names of topics that should be learned first.
    #[serde(default)]
    pub prerequisites: Vec<String>,
}

/// A group of related topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Learning order among clusters (1 = first).
    #[serde(default)]
    pub order: u32,
    #[serde(default)]
    pub topics: Vec<Topic>,
}

/// A parsed curriculum. Immutable once stored, so positional indices into
/// `clusters` and `topics` are stable for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Curriculum {
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

/// Everything a prompt needs to know about one topic.
#[derive(Debug, Clone, Copy)]
pub struct TopicContext<'a> {
    pub subject: &'a str,
    pub cluster: &'a Cluster,
    pub topic: &'a Topic,
}

impl Curriculum {
    /// Resolve a topic by position. `None` when either index is out of range.
    pub fn topic(&self, cluster_index: usize, topic_index: usize) -> Option<TopicContext<'_>> {
        let cluster = self.clusters.get(cluster_index)?;
        let topic = cluster.topics.get(topic_index)?;
        Some(TopicContext {
            subject: &self.subject,
            cluster,
            topic,
        })
    }

    /// Total number of topics across all clusters.
    pub fn total_topics(&self) -> usize {
        self.clusters.iter().map(|c| c.topics.len()).sum()
    }

    /// Every `(cluster_index, topic_index, topic)` in curriculum order.
    pub fn topics(&self) -> impl Iterator<Item = (usize, usize, &Topic)> {
        self.clusters.iter().enumerate().flat_map(|(c, cluster)| {
            cluster
                .topics
                .iter()
                .enumerate()
                .map(move |(t, topic)| (c, t, topic))
        })
    }
}

/// Identity of one learnable unit: curriculum, cluster index, topic index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicKey {
    pub curriculum_id: String,
    pub cluster_index: usize,
    pub topic_index: usize,
}

impl TopicKey {
    pub fn new(curriculum_id: impl Into<String>, cluster_index: usize, topic_index: usize) -> Self {
        Self {
            curriculum_id: curriculum_id.into(),
            cluster_index,
            topic_index,
        }
    }

    /// The `"{cluster}-{topic}"` form used in file names and progress maps.
    pub fn slug(&self) -> String {
        format!("{}-{}", self.cluster_index, self.topic_index)
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}-{}",
            self.curriculum_id, self.cluster_index, self.topic_index
        )
    }
}

/// A stored curriculum with its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumRecord {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub curriculum: Curriculum,
}

/// Listing entry for a stored curriculum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumSummary {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub subject: String,
    pub description: String,
    pub cluster_count: usize,
    pub topic_count: usize,
    pub completed_topics: usize,
}

/// Progress on a single topic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicProgress {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub quiz_score: Option<u32>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Learning progress for a curriculum, keyed by [`TopicKey::slug`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningProgress {
    pub curriculum_id: String,
    #[serde(default)]
    pub topics: BTreeMap<String, TopicProgress>,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl LearningProgress {
    pub fn new(curriculum_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            curriculum_id: curriculum_id.into(),
            topics: BTreeMap::new(),
            started_at: now,
            last_activity: now,
        }
    }

    pub fn completed_topics(&self) -> usize {
        self.topics.values().filter(|t| t.completed).count()
    }
}

/// Read access to stored curricula.
pub trait CurriculumLookup: Send + Sync {
    fn get_curriculum(&self, id: &str) -> Result<Option<Curriculum>, StoreError>;
}

/// Records topic completion.
pub trait ProgressTracker: Send + Sync {
    fn mark_topic_completed(&self, key: &TopicKey, score: u32) -> Result<(), StoreError>;
}
