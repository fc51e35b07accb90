//! Generated learning artifacts: lessons, quizzes and assessments.

use serde::{Deserialize, Serialize};

/// Passing threshold (percent) given to every generated quiz.
pub const DEFAULT_PASSING_SCORE: u32 = 80;

/// Estimated reading time used when the model omits one.
pub const DEFAULT_LESSON_MINUTES: u32 = 15;

fn default_lesson_minutes() -> u32 {
    DEFAULT_LESSON_MINUTES
}

fn default_passing_score() -> u32 {
    DEFAULT_PASSING_SCORE
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonSection {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// A generated lesson. One per topic, never edited after it is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub topic_name: String,
    pub introduction: String,
    pub sections: Vec<LessonSection>,
    pub summary: String,
    #[serde(default = "default_lesson_minutes")]
    pub estimated_time_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn correct_option(&self) -> &str {
        self.options
            .get(self.correct_index)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// One immutable version of a topic's quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub topic_name: String,
    pub questions: Vec<QuizQuestion>,
    #[serde(default = "default_passing_score")]
    pub passing_score: u32,
}

/// Feedback on a single answered question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFeedback {
    /// 1-based question number.
    pub question_num: usize,
    pub is_correct: bool,
    pub student_choice: String,
    pub correct_answer: String,
    #[serde(default)]
    pub analysis: String,
    #[serde(default)]
    pub explanation: String,
}

/// Overall qualitative feedback on a quiz attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSummary {
    #[serde(default)]
    pub misconceptions: Vec<String>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    #[serde(default)]
    pub encouragement: String,
    #[serde(default)]
    pub recommendation: String,
}

/// A graded quiz attempt.
///
/// Score, counts and `passed` always come from deterministic grading;
/// `fallback_mode` is set when the qualitative text is templated rather than
/// model-written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    pub score: u32,
    pub correct_count: usize,
    pub total_questions: usize,
    pub passed: bool,
    #[serde(default)]
    pub question_feedback: Vec<QuestionFeedback>,
    #[serde(default)]
    pub summary: AssessmentSummary,
    #[serde(default)]
    pub fallback_mode: bool,
    #[serde(default)]
    pub quiz_version: u32,
}
