//! Prompt text sent to the model.

use crate::curriculum::TopicContext;

pub const CURRICULUM_SYSTEM_PROMPT: &str = r#"You are an expert curriculum designer. Turn a raw list of things someone wants to learn into a structured learning curriculum.

For the given topics:
1. Identify the overarching subject
2. Group related topics into clusters
3. Order clusters from foundational to advanced
4. Within each cluster, order topics so prerequisites come first
5. Write a short description for the subject, each cluster and each topic

Your response must be valid JSON with exactly this structure:
{
  "subject": "The main subject name",
  "description": "What this curriculum covers",
  "clusters": [
    {
      "name": "Cluster Name",
      "description": "What this cluster covers",
      "order": 1,
      "topics": [
        {
          "name": "Topic Name",
          "description": "What this topic covers",
          "order": 1,
          "prerequisites": ["Names of topics that appear earlier in the curriculum"]
        }
      ]
    }
  ]
}

Rules:
- "order" starts at 1 for the first cluster, and at 1 for the first topic within each cluster
- Prerequisites only reference topics that appear earlier
- Keep descriptions concise and helpful
- Only group concepts that truly belong together

Respond ONLY with the JSON object."#;

pub fn curriculum_request(raw_text: &str) -> String {
    format!(
        "Please organize the following topics into a structured learning curriculum:\n\n{}",
        raw_text
    )
}

pub fn lesson(ctx: &TopicContext<'_>) -> String {
    let prerequisites = if ctx.topic.prerequisites.is_empty() {
        "None".to_string()
    } else {
        ctx.topic.prerequisites.join(", ")
    };

    format!(
        r#"Create a complete lesson for the following topic:

Subject: {subject}
Cluster: {cluster}
Topic: {topic}
Topic Description: {description}
Prerequisites: {prerequisites}

Structure the lesson as follows:

1. **The problem first** - open with an engaging introduction that explains:
   - Which PROBLEM or difficulty this concept exists to solve
   - What people struggled with before it existed
   - Why it matters in practice

2. **The core idea** - break the concept into 3-4 digestible sections that:
   - Explain it clearly with concrete examples
   - Use analogies to make abstract ideas tangible
   - End with key points that capture the essentials

3. **Why it is elegant** - help the learner appreciate:
   - Why this solution works so well
   - How it resolves the original problem
   - What makes it better than the naive approach

4. **Practical application** - close with a summary of:
   - How to recognize when to apply the concept
   - Common use cases and patterns

Respond with JSON in exactly this format:
{{
    "topic_name": "{topic}",
    "introduction": "An engaging introduction that sets up the problem...",
    "sections": [
        {{
            "title": "Section Title",
            "content": "Explanation with examples and analogies...",
            "key_points": ["Point 1", "Point 2", "Point 3"]
        }}
    ],
    "summary": "When and how to apply this knowledge...",
    "estimated_time_minutes": 15
}}

Respond ONLY with the JSON, no additional text."#,
        subject = ctx.subject,
        cluster = ctx.cluster.name,
        topic = ctx.topic.name,
        description = ctx.topic.description,
        prerequisites = prerequisites,
    )
}

/// Quiz prompt. `existing_versions > 0` asks for fresh questions.
pub fn quiz(ctx: &TopicContext<'_>, existing_versions: u32) -> String {
    let variation = if existing_versions > 0 {
        format!(
            "\n\nIMPORTANT: This is quiz attempt #{}. Create DIFFERENT questions than previous quizzes to test the concept from new angles.",
            existing_versions + 1
        )
    } else {
        String::new()
    };

    format!(
        r#"Create a quiz to assess understanding of this topic:

Subject: {subject}
Topic: {topic}
Description: {description}{variation}

Write exactly 5 multiple-choice questions, each with 4 options, that:
1. Test conceptual understanding rather than memorization
2. Ask WHY and WHEN to use the concept, not only what it is
3. Range from basic comprehension to application
4. Use plausible distractors drawn from common misconceptions

Respond with JSON in exactly this format:
{{
    "topic_name": "{topic}",
    "questions": [
        {{
            "question": "The question text?",
            "options": ["Option A", "Option B", "Option C", "Option D"],
            "correct_index": 0,
            "explanation": "Why the correct answer is correct..."
        }}
    ]
}}

Respond ONLY with the JSON, no additional text."#,
        subject = ctx.subject,
        topic = ctx.topic.name,
        description = ctx.topic.description,
        variation = variation,
    )
}

pub fn assessment(
    ctx: &TopicContext<'_>,
    score: u32,
    correct_count: usize,
    total: usize,
    results_json: &str,
) -> String {
    format!(
        r#"You are an expert educational assessor. Analyze this student's quiz performance and give detailed, helpful feedback.

Topic: {topic}
Subject: {subject}
Score: {score}% ({correct_count}/{total} correct)

Quiz Results:
{results_json}

For each INCORRECT answer explain:
1. Why the student most likely chose it (the underlying misconception)
2. Why it is wrong
3. Why the correct answer is right

Then summarize:
1. The student's key misconceptions or knowledge gaps
2. Specific areas to focus on
3. Encouragement and next steps

Respond with JSON:
{{
    "question_feedback": [
        {{
            "question_num": 1,
            "is_correct": true,
            "student_choice": "Their answer",
            "correct_answer": "The right answer",
            "analysis": "For incorrect answers: why they likely chose this. For correct ones: what understanding it shows",
            "explanation": "Explanation of the concept"
        }}
    ],
    "summary": {{
        "misconceptions": ["Identified misconceptions"],
        "focus_areas": ["Specific topics to review"],
        "encouragement": "A personal, encouraging message",
        "recommendation": "What to do next"
    }}
}}

Respond ONLY with the JSON."#,
        topic = ctx.topic.name,
        subject = ctx.subject,
    )
}

/// System prompt for the topic tutor.
pub fn tutor(
    ctx: &TopicContext<'_>,
    lesson_summary: Option<&str>,
    highlighted_context: Option<&str>,
) -> String {
    let mut prompt = format!(
        "You are a patient, encouraging tutor helping a student learn {subject}.\n\n\
         The current topic is \"{topic}\": {description}\n\n\
         Answer the student's questions about this topic. Explain with concrete examples and \
         analogies, check understanding with short follow-up questions, and keep answers focused \
         and concise. If the student asks about something unrelated, gently steer back to the topic.",
        subject = ctx.subject,
        topic = ctx.topic.name,
        description = ctx.topic.description,
    );

    if let Some(summary) = lesson_summary {
        prompt.push_str(&format!("\n\nLesson summary the student has read:\n{}", summary));
    }
    if let Some(highlighted) = highlighted_context {
        prompt.push_str(&format!(
            "\n\nThe student highlighted this passage and is asking about it:\n\"{}\"",
            highlighted
        ));
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::fixtures;

    #[test]
    fn lesson_prompt_names_topic_and_prerequisites() {
        let mut curriculum = fixtures::algorithms();
        curriculum.clusters[0].topics[1].prerequisites = vec!["Binary Search".into()];
        let ctx = curriculum.topic(0, 1).unwrap();

        let prompt = lesson(&ctx);
        assert!(prompt.contains("Topic: Sorting"));
        assert!(prompt.contains("Cluster: Foundations"));
        assert!(prompt.contains("Prerequisites: Binary Search"));
        assert!(prompt.contains(r#""topic_name": "Sorting""#));
    }

    #[test]
    fn lesson_prompt_without_prerequisites_says_none() {
        let curriculum = fixtures::algorithms();
        let prompt = lesson(&curriculum.topic(0, 0).unwrap());
        assert!(prompt.contains("Prerequisites: None"));
    }

    #[test]
    fn quiz_prompt_asks_for_variation_on_retake() {
        let curriculum = fixtures::algorithms();
        let ctx = curriculum.topic(0, 0).unwrap();

        assert!(!quiz(&ctx, 0).contains("quiz attempt"));
        let retake = quiz(&ctx, 2);
        assert!(retake.contains("This is quiz attempt #3"));
        assert!(retake.contains("DIFFERENT questions"));
    }

    #[test]
    fn tutor_prompt_includes_optional_context() {
        let curriculum = fixtures::algorithms();
        let ctx = curriculum.topic(1, 0).unwrap();

        let plain = tutor(&ctx, None, None);
        assert!(plain.contains("\"Graphs\""));
        assert!(!plain.contains("highlighted"));

        let rich = tutor(&ctx, Some("Graphs model relations"), Some("adjacency list"));
        assert!(rich.contains("Graphs model relations"));
        assert!(rich.contains("\"adjacency list\""));
    }
}
