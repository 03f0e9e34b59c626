use std::sync::Arc;

use log::{ debug, info, warn };
use serde::Deserialize;

use crate::errors::CvResult;
use crate::implementations::prompt::fill;
use crate::models::clarification::{ ClarificationAnswer, ClarificationQuestion };
use crate::traits::llm_client::LlmClient;

const AMBIGUITY_TEMPLATE: &str =
    r#"Analyze the requirement below and decide whether it is ambiguous or insufficient for generating code.

A requirement is ambiguous if:
- essential technical details are missing (data types, formats, behaviour)
- several interpretations are possible
- edge cases or error handling are not specified

Requirement:
"""{{requirement}}"""

Answer only "YES" or "NO"."#;

const QUESTIONS_TEMPLATE: &str =
    r#"You are a requirements analyst. Write up to {{max}} clarification questions a developer would need answered to write correct code for the requirement below.

Classify each question as [Required|Desirable] and give a short reason for it.

Requirement:
"""{{requirement}}"""

Response format (JSON):
{
    "questions": [
        {
            "question": "question text",
            "priority": "Required or Desirable",
            "reason": "short reason"
        }
    ]
}"#;

const ANSWER_TEMPLATE: &str =
    r#"Given the requirement below, give a short and direct answer to the following question.

Original requirement:
"""{{requirement}}"""

Question: {{question}}

Answer concisely (1-2 sentences):"#;

const REFINE_TEMPLATE: &str =
    r#"Using the original requirement and the answers below, write a refined, complete and precise requirement.

Original requirement:
"""{{requirement}}"""

Questions and answers:
"""
{{pairs}}
"""

Refined requirement:"#;

/// Source of answers to clarification questions other than the model itself
pub trait AnswerSource: Send + Sync {
    fn answer(&self, question: &ClarificationQuestion) -> CvResult<String>;
}

#[derive(Debug, Deserialize)]
struct QuestionList {
    #[serde(default)]
    questions: Vec<ClarificationQuestion>,
}

/// True when the answer contains a YES (or SIM) token
fn is_affirmative(response: &str) -> bool {
    response
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| {
            let token = token.to_uppercase();
            token == "YES" || token == "SIM"
        })
}

/// Parse questions from a model response, truncated to `max`.
///
/// The JSON object between the first `{` and the last `}` is tried first;
/// otherwise `Q:` / `Priority:` / `Reason:` lines are read.
pub fn parse_questions(response: &str, max: usize) -> Vec<ClarificationQuestion> {
    let json = match (response.find('{'), response.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            serde_json::from_str::<QuestionList>(&response[start..=end]).ok()
        }
        _ => None,
    };

    let mut questions = match json {
        Some(list) => list.questions,
        None => {
            debug!("Question response is not JSON, parsing lines");
            parse_question_lines(response)
        }
    };

    questions.retain(|q| !q.question.trim().is_empty());
    questions.truncate(max);
    questions
}

fn parse_question_lines(response: &str) -> Vec<ClarificationQuestion> {
    let mut questions = Vec::new();
    let mut current: Option<ClarificationQuestion> = None;

    let value_of = |line: &str| {
        line.split_once(':')
            .map(|(_, value)| value.trim().to_string())
            .unwrap_or_default()
    };

    for line in response.lines().map(str::trim) {
        if line.starts_with("Q:") || line.starts_with("Question") {
            if let Some(question) = current.take() {
                questions.push(question);
            }
            current = Some(ClarificationQuestion::new(value_of(line)));
        } else if line.starts_with("Priority") {
            if let Some(question) = current.as_mut() {
                question.priority = value_of(line);
            }
        } else if line.starts_with("Reason") {
            if let Some(question) = current.as_mut() {
                question.reason = value_of(line);
            }
        }
    }

    if let Some(question) = current {
        questions.push(question);
    }
    questions
}

/// Asks, answers and folds clarification questions into a requirement
pub struct Clarifier {
    client: Arc<dyn LlmClient>,
    max_questions: usize,
}

impl Clarifier {
    pub fn new(client: Arc<dyn LlmClient>, max_questions: usize) -> Self {
        Self { client, max_questions }
    }

    pub async fn detect_ambiguity(&self, requirement: &str) -> CvResult<bool> {
        debug!("Detecting ambiguity for requirement");
        let prompt = fill(AMBIGUITY_TEMPLATE, &[("requirement", requirement)]);
        let response = self.client.generate(&prompt).await?;
        Ok(is_affirmative(&response))
    }

    pub async fn generate_questions(&self, requirement: &str) -> CvResult<Vec<ClarificationQuestion>> {
        debug!("Generating clarification questions (max={})", self.max_questions);
        let max = self.max_questions.to_string();
        let prompt = fill(QUESTIONS_TEMPLATE, &[
            ("requirement", requirement),
            ("max", &max),
        ]);
        let response = self.client.generate(&prompt).await?;
        let questions = parse_questions(&response, self.max_questions);
        if questions.is_empty() {
            warn!("No clarification questions could be parsed from the response");
        }
        Ok(questions)
    }

    /// Answer every question with the model, one call per question
    pub async fn simulate_answers(
        &self,
        requirement: &str,
        questions: &[ClarificationQuestion]
    ) -> CvResult<Vec<ClarificationAnswer>> {
        let mut answers = Vec::with_capacity(questions.len());
        for question in questions {
            debug!("Simulating answer for question: {}", question.question);
            let prompt = fill(ANSWER_TEMPLATE, &[
                ("requirement", requirement),
                ("question", &question.question),
            ]);
            let answer = self.client.generate(&prompt).await?;
            answers.push(ClarificationAnswer {
                question: question.question.clone(),
                answer: answer.trim().to_string(),
            });
        }
        Ok(answers)
    }

    /// Collect answers from an external source such as the terminal
    pub fn collect_answers(
        &self,
        questions: &[ClarificationQuestion],
        source: &dyn AnswerSource
    ) -> CvResult<Vec<ClarificationAnswer>> {
        questions
            .iter()
            .map(|question| {
                Ok(ClarificationAnswer {
                    question: question.question.clone(),
                    answer: source.answer(question)?,
                })
            })
            .collect()
    }

    /// Fold the answers into a refined requirement. Without answers, or when
    /// the model returns nothing, the original text is kept.
    pub async fn refine_requirement(
        &self,
        original: &str,
        answers: &[ClarificationAnswer]
    ) -> CvResult<String> {
        let pairs: Vec<String> = answers
            .iter()
            .filter(|a| !a.answer.trim().is_empty())
            .map(|a| format!("Q: {}\nA: {}", a.question, a.answer))
            .collect();

        if pairs.is_empty() {
            return Ok(original.to_string());
        }

        debug!("Refining requirement using {} Q/A pairs", pairs.len());
        let prompt = fill(REFINE_TEMPLATE, &[
            ("requirement", original),
            ("pairs", &pairs.join("\n")),
        ]);
        let refined = self.client.generate(&prompt).await?;
        let refined = refined.trim();
        if refined.is_empty() {
            warn!("Refinement returned an empty requirement, keeping the original");
            return Ok(original.to_string());
        }
        info!("Requirement refined ({} characters)", refined.len());
        Ok(refined.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementations::llm_client::MockLlmClient;

    #[test]
    fn affirmative_answers() {
        assert!(is_affirmative("YES"));
        assert!(is_affirmative("Sim."));
        assert!(is_affirmative("yes, it is"));
        assert!(!is_affirmative("NO"));
        assert!(!is_affirmative("Yesterday it was fine"));
    }

    #[test]
    fn json_questions_are_truncated() {
        let response = r#"Here you go:
{"questions": [
  {"question": "Q1?", "priority": "Required", "reason": "r1"},
  {"question": "Q2?"},
  {"question": "Q3?", "priority": "Desirable", "reason": "r3"}
]}"#;
        let questions = parse_questions(response, 2);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].priority, "Required");
        assert_eq!(questions[1].priority, "Desirable");
        assert_eq!(questions[1].reason, "");
    }

    #[test]
    fn line_format_is_a_fallback() {
        let response = "Q: Which encoding?\nPriority: Required\nReason: bytes vs text\n\nQ: Max size?\n";
        let questions = parse_questions(response, 7);
        assert_eq!(questions.len(), 2);
        assert_eq!(questions[0].question, "Which encoding?");
        assert_eq!(questions[0].priority, "Required");
        assert_eq!(questions[0].reason, "bytes vs text");
        assert_eq!(questions[1].priority, "Desirable");
    }

    #[tokio::test]
    async fn refine_without_answers_keeps_original() {
        let client = Arc::new(MockLlmClient::new());
        let clarifier = Clarifier::new(client.clone(), 7);
        let refined = clarifier.refine_requirement("sum a list", &[]).await.unwrap();
        assert_eq!(refined, "sum a list");
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn simulated_answers_follow_question_order() {
        let client = Arc::new(MockLlmClient::with_replies([" ints ", " 1000 "]));
        let clarifier = Clarifier::new(client, 7);
        let questions = vec![ClarificationQuestion::new("Type?"), ClarificationQuestion::new("Size?")];
        let answers = clarifier.simulate_answers("sum a list", &questions).await.unwrap();
        assert_eq!(answers[0].answer, "ints");
        assert_eq!(answers[1].question, "Size?");
        assert_eq!(answers[1].answer, "1000");
    }
}
