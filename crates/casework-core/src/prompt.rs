//! Prompt templates for agent replies and case assessment.
//!
//! Templates use `{{name}}` placeholders filled by [`render_template`] in a
//! single pass, so substituted text is never itself re-expanded.

use std::collections::HashMap;

use casework_types::case::{Agent, Case};
use casework_types::chat::{ChatMessage, MessageKind};

/// Persona system prompt used when generating an agent reply.
pub const CHAT_RESPONSE_PROMPT: &str = "You are {{agentName}}, {{agentPosition}}.

Your role: {{agentPrompt}}

Case Context:
Title: {{caseTitle}}
Description: {{caseDescription}}
Story: {{caseStory}}

Previous conversation:
{{conversationHistory}}

Instructions:
- Stay in character as {{agentName}}
- Provide helpful, contextual responses based on the case study
- Be professional and supportive
- Draw from the case context when relevant
- Maintain continuity with the previous conversation";

/// Rubric assessment prompt. The model must answer with the JSON block shown.
pub const CASE_ASSESSMENT_PROMPT: &str = r#"You are an expert educational assessor conducting a comprehensive case study evaluation.

CASE CONTEXT:
Title: {{caseTitle}}
Description: {{caseDescription}}
Story: {{caseStory}}

LEARNING OUTCOMES & CRITERIA:
{{criteriaOutcomes}}

CONVERSATION HISTORY:
{{conversationHistory}}

{{finalReflectionSection}}

ASSESSMENT FRAMEWORK:
Following evidence-based rubric development principles, conduct a holistic assessment that includes:

1. ANALYTICAL RUBRIC EVALUATION:
   - Assess each learning outcome/criteria systematically
   - Use descriptors ranging from exemplary (90-100%) to inadequate (0-20%)
   - Consider: understanding, application, analysis, synthesis, evaluation

2. COMPREHENSIVE FEEDBACK ANALYSIS:
   • BAD POINTS/AREAS FOR IMPROVEMENT: Identify specific weaknesses, misconceptions, or missed opportunities
   • REACHED GOALS/STRENGTHS: Highlight demonstrated competencies and successful applications
   • GROWTH POINTS: Suggest specific areas for development and next steps
   • OVERALL PERFORMANCE: Holistic view of student's engagement and learning

3. EVIDENCE-BASED SCORING:
   - Analyze student responses against learning objectives
   - Consider depth of understanding, critical thinking, and practical application
   - Weight different aspects based on case complexity and learning goals

Provide your assessment in this EXACT JSON format:
{
  "assessment_percentage": <number between 0-100>,
  "detailed_feedback": {
    "strengths": ["<strength 1>", "<strength 2>", ...],
    "areas_for_improvement": ["<improvement 1>", "<improvement 2>", ...],
    "growth_points": ["<growth point 1>", "<growth point 2>", ...],
    "reached_goals": ["<goal 1>", "<goal 2>", ...],
    "overall_performance": "<comprehensive performance summary>"
  },
  "criteria_analysis": {
    "<criteria_name>": {
      "score_percentage": <0-100>,
      "feedback": "<specific feedback for this criteria>"
    }
  },
  "recommendations": ["<recommendation 1>", "<recommendation 2>", ...],
  "assessment_rationale": "<explanation of how the percentage was determined>"
}

Be thorough, fair, and constructive in your assessment. The percentage should reflect genuine learning achievement against the established criteria."#;

/// Rendered when a case has no rubric.
pub const DEFAULT_CRITERIA: &str = "General case study competencies";

const DEFAULT_AGENT_POSITION: &str = "an AI assistant";
const DEFAULT_AGENT_PROMPT: &str = "Help the user with their case study.";

/// Substitute `{{key}}` placeholders.
///
/// Unknown placeholders are left untouched. Values are inserted verbatim and
/// not scanned again.
pub fn render_template(template: &str, vars: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = &after[..end];
                match vars.get(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(key);
                        out.push_str("}}");
                    }
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Transcript for the assessor: `Student:` / `<agent>:` lines separated by a blank line.
pub fn assessment_transcript(messages: &[ChatMessage], agent_name: &str) -> String {
    messages
        .iter()
        .map(|m| match m.kind {
            MessageKind::User => format!("Student: {}", m.text),
            MessageKind::Agent => format!("{agent_name}: {}", m.text),
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Transcript for the persona: `User:` / `Agent:` lines, one per message.
pub fn conversation_transcript(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| match m.kind {
            MessageKind::User => format!("User: {}", m.text),
            MessageKind::Agent => format!("Agent: {}", m.text),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pretty-printed rubric, or [`DEFAULT_CRITERIA`] when the case has none.
pub fn criteria_section(criteria: Option<&serde_json::Value>) -> String {
    match criteria {
        Some(value) if !value.is_null() => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        _ => DEFAULT_CRITERIA.to_string(),
    }
}

/// The reflection block, or an empty string when there is nothing to show.
pub fn final_reflection_section(reflection: Option<&str>) -> String {
    match reflection {
        Some(text) if !text.trim().is_empty() => {
            format!("STUDENT'S FINAL REFLECTION:\n{text}\n")
        }
        _ => String::new(),
    }
}

fn case_vars(case: &Case) -> HashMap<&'static str, String> {
    HashMap::from([
        ("caseTitle", case.title.clone().unwrap_or_default()),
        ("caseDescription", case.description.clone().unwrap_or_default()),
        ("caseStory", case.story.clone().unwrap_or_default()),
    ])
}

/// Render the persona system prompt for an agent reply.
pub fn chat_system_prompt(agent: &Agent, case: &Case, history: &[ChatMessage]) -> String {
    let mut vars = case_vars(case);
    vars.insert("agentName", agent.name.clone());
    vars.insert(
        "agentPosition",
        non_empty(agent.position.as_deref()).unwrap_or(DEFAULT_AGENT_POSITION).to_string(),
    );
    vars.insert(
        "agentPrompt",
        non_empty(agent.prompt.as_deref()).unwrap_or(DEFAULT_AGENT_PROMPT).to_string(),
    );
    vars.insert("conversationHistory", conversation_transcript(history));
    render_template(CHAT_RESPONSE_PROMPT, &vars)
}

/// Render the assessment prompt for a chat.
pub fn assessment_prompt(
    case: &Case,
    agent_name: &str,
    messages: &[ChatMessage],
    final_reflection: Option<&str>,
) -> String {
    let mut vars = case_vars(case);
    vars.insert("criteriaOutcomes", criteria_section(case.criteria_outcomes.as_ref()));
    vars.insert("conversationHistory", assessment_transcript(messages, agent_name));
    vars.insert("finalReflectionSection", final_reflection_section(final_reflection));
    render_template(CASE_ASSESSMENT_PROMPT, &vars)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
