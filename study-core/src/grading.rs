//! Quiz grading with optional model-written feedback.
//!
//! Scoring is always deterministic. The model only contributes qualitative
//! text, and any failure there degrades to templated feedback:
//!
//! ```text
//! Received -> Scored -> {AiEnriched | Fallback} -> Persisted
//! ```

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::content::{Assessment, AssessmentSummary, QuestionFeedback, Quiz};
use crate::curriculum::{CurriculumLookup, ProgressTracker, TopicContext, TopicKey};
use crate::error::{Result, StudyError};
use crate::generation::{load_curriculum, topic_context};
use crate::model::ModelClient;
use crate::parse::parse_json;
use crate::prompts;
use crate::store::ContentStore;

pub const ASSESSMENT_MAX_TOKENS: u32 = 3000;

const NO_ANSWER: &str = "No answer";

/// Failure text that points at exhausted credit or throttling.
const QUOTA_MARKERS: &[&str] = &[
    "quota",
    "billing",
    "credit",
    "rate limit",
    "rate_limit",
    "429",
    "insufficient",
];

/// Deterministic result of comparing answers to a quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scored {
    pub score: u32,
    pub correct_count: usize,
    pub total_questions: usize,
    pub passed: bool,
    pub feedback: Vec<QuestionFeedback>,
}

/// Score `answers` against `quiz`.
///
/// Missing and out-of-range answers are incorrect. An empty quiz scores 0.
pub fn score_answers(quiz: &Quiz, answers: &[i64]) -> Scored {
    let feedback: Vec<QuestionFeedback> = quiz
        .questions
        .iter()
        .enumerate()
        .map(|(i, question)| {
            let chosen = answers
                .get(i)
                .and_then(|&a| usize::try_from(a).ok())
                .and_then(|a| question.options.get(a).map(|text| (a, text)));
            let is_correct = matches!(chosen, Some((a, _)) if a == question.correct_index);
            QuestionFeedback {
                question_num: i + 1,
                is_correct,
                student_choice: chosen
                    .map(|(_, text)| text.clone())
                    .unwrap_or_else(|| NO_ANSWER.to_string()),
                correct_answer: question.correct_option().to_string(),
                analysis: String::new(),
                explanation: question.explanation.clone(),
            }
        })
        .collect();

    let total_questions = quiz.questions.len();
    let correct_count = feedback.iter().filter(|f| f.is_correct).count();
    let score = if total_questions == 0 {
        0
    } else {
        (100.0 * correct_count as f64 / total_questions as f64).round() as u32
    };

    Scored {
        score,
        correct_count,
        total_questions,
        passed: score >= quiz.passing_score,
        feedback,
    }
}

fn is_quota_error(message: &str) -> bool {
    let message = message.to_lowercase();
    QUOTA_MARKERS.iter().any(|m| message.contains(m))
}

/// Templated feedback used when model feedback is disabled or failed.
fn fallback_assessment(
    scored: Scored,
    topic_name: &str,
    quota_exhausted: bool,
) -> Assessment {
    let question_feedback = scored
        .feedback
        .into_iter()
        .map(|mut f| {
            f.analysis = if f.is_correct {
                "Great job!".to_string()
            } else {
                format!("The correct answer was: {}", f.correct_answer)
            };
            f
        })
        .collect();

    let encouragement = if quota_exhausted {
        "Detailed AI feedback is unavailable right now (usage quota or rate limit reached), so this assessment shows your score with the stored explanations.".to_string()
    } else if scored.passed {
        format!("Well done! You have a solid grasp of {}.", topic_name)
    } else {
        "Keep going! Review the explanations below and give it another try.".to_string()
    };
    let recommendation = if scored.passed {
        "Move on to the next topic.".to_string()
    } else {
        format!("Review the lesson on {} and retake the quiz.", topic_name)
    };
    let focus_areas = if scored.passed {
        Vec::new()
    } else {
        vec![topic_name.to_string()]
    };

    Assessment {
        score: scored.score,
        correct_count: scored.correct_count,
        total_questions: scored.total_questions,
        passed: scored.passed,
        question_feedback,
        summary: AssessmentSummary {
            misconceptions: Vec::new(),
            focus_areas,
            encouragement,
            recommendation,
        },
        fallback_mode: true,
        quiz_version: 0,
    }
}

#[derive(Debug, Deserialize)]
struct AiQuestionFeedback {
    question_num: usize,
    #[serde(default)]
    analysis: String,
    #[serde(default)]
    explanation: String,
}

#[derive(Debug, Deserialize)]
struct AiAssessment {
    #[serde(default)]
    question_feedback: Vec<AiQuestionFeedback>,
    summary: AssessmentSummary,
}

/// Overlay model text onto deterministic feedback, matched by question number.
fn merge_ai_feedback(scored: Scored, ai: AiAssessment) -> Assessment {
    let question_feedback = scored
        .feedback
        .into_iter()
        .map(|mut f| {
            if let Some(extra) = ai
                .question_feedback
                .iter()
                .find(|a| a.question_num == f.question_num)
            {
                if !extra.analysis.is_empty() {
                    f.analysis = extra.analysis.clone();
                }
                if !extra.explanation.is_empty() {
                    f.explanation = extra.explanation.clone();
                }
            }
            f
        })
        .collect();

    Assessment {
        score: scored.score,
        correct_count: scored.correct_count,
        total_questions: scored.total_questions,
        passed: scored.passed,
        question_feedback,
        summary: ai.summary,
        fallback_mode: false,
        quiz_version: 0,
    }
}

/// Grades submissions, stores the assessment and records completion.
pub struct AssessmentGrader {
    model: ModelClient,
    content: Arc<dyn ContentStore>,
    curricula: Arc<dyn CurriculumLookup>,
    progress: Arc<dyn ProgressTracker>,
}

impl AssessmentGrader {
    pub fn new(
        model: ModelClient,
        content: Arc<dyn ContentStore>,
        curricula: Arc<dyn CurriculumLookup>,
        progress: Arc<dyn ProgressTracker>,
    ) -> Self {
        Self {
            model,
            content,
            curricula,
            progress,
        }
    }

    /// Grade against the latest quiz version of `key`.
    pub async fn submit(
        &self,
        key: &TopicKey,
        answers: &[i64],
        use_ai_grading: bool,
    ) -> Result<Assessment> {
        let (quiz, version) = self
            .content
            .get_quiz(key, None)?
            .ok_or_else(|| StudyError::NotFound(format!("quiz for {}", key)))?;
        self.grade(key, &quiz, version, answers, use_ai_grading)
            .await
    }

    /// Grade `answers` against a specific quiz version.
    ///
    /// Always yields a complete assessment when the model is unavailable.
    pub async fn grade(
        &self,
        key: &TopicKey,
        quiz: &Quiz,
        quiz_version: u32,
        answers: &[i64],
        use_ai_grading: bool,
    ) -> Result<Assessment> {
        let curriculum = load_curriculum(self.curricula.as_ref(), key)?;
        let ctx = topic_context(&curriculum, key)?;

        let scored = score_answers(quiz, answers);
        info!(topic = %key, quiz_version, score = scored.score, "quiz scored");

        let mut assessment = if use_ai_grading {
            match self.ai_feedback(&ctx, quiz, &scored).await {
                Ok(ai) => merge_ai_feedback(scored, ai),
                Err(e) => {
                    let message = e.to_string();
                    warn!(topic = %key, error = %message, "AI grading failed, using fallback feedback");
                    fallback_assessment(scored, &ctx.topic.name, is_quota_error(&message))
                }
            }
        } else {
            fallback_assessment(scored, &ctx.topic.name, false)
        };
        assessment.quiz_version = quiz_version;

        self.content.save_assessment(key, quiz_version, &assessment)?;
        if assessment.passed {
            self.progress.mark_topic_completed(key, assessment.score)?;
        }
        Ok(assessment)
    }

    async fn ai_feedback(
        &self,
        ctx: &TopicContext<'_>,
        quiz: &Quiz,
        scored: &Scored,
    ) -> Result<AiAssessment> {
        let results: Vec<_> = quiz
            .questions
            .iter()
            .zip(&scored.feedback)
            .map(|(question, f)| {
                json!({
                    "question_num": f.question_num,
                    "question": question.question,
                    "options": question.options,
                    "student_answer": f.student_choice,
                    "correct_answer": f.correct_answer,
                    "is_correct": f.is_correct,
                })
            })
            .collect();
        let results_json = serde_json::to_string_pretty(&results)
            .map_err(|e| StudyError::GenerationParse(e.to_string()))?;

        let prompt = prompts::assessment(
            ctx,
            scored.score,
            scored.correct_count,
            scored.total_questions,
            &results_json,
        );
        let reply = self.model.generate(&prompt, ASSESSMENT_MAX_TOKENS).await?;
        parse_json(&reply)
    }
}
