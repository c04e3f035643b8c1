//! Prompt templates for comic generation

use crate::concept::MathConcept;
use crate::options::{DetailLevel, GenerationOptions};

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// The directive every user prompt must carry
    pub fn panel_directive(panel_count: u8) -> String {
        match panel_count {
            1 => "exactly 1 panel".to_string(),
            n => format!("exactly {} panels", n),
        }
    }

    /// System prompt for comic script generation
    pub fn comic_system(options: &GenerationOptions) -> String {
        let vocabulary = match options.detail_level {
            DetailLevel::Simple => "Use short sentences and everyday words.",
            DetailLevel::Standard => "Use clear language and introduce terms with a short explanation.",
            DetailLevel::Detailed => "Use precise mathematical vocabulary and notation where helpful.",
        };
        let narration = if options.include_narration {
            "Give every panel a one-sentence narration caption."
        } else {
            "Do not write narration; set \"narration\" to null."
        };

        format!(
            r#"You are an author of educational math comics for {audience}.
Your task is to explain one mathematical idea through a short comic with recurring characters.
Each panel must show a concrete scene that an illustrator can draw in a {style} style.
{vocabulary}
{narration}
Write all dialogue and narration in the language "{language}". Write image descriptions in English.

Respond with a single JSON object and nothing else:
{{
  "title": "string",
  "panels": [
    {{
      "image_description": "what the illustrator should draw",
      "dialogue": ["Character: line", "..."],
      "narration": "string or null"
    }}
  ]
}}"#,
            audience = options.age_group.audience(),
            style = options.style,
            vocabulary = vocabulary,
            narration = narration,
            language = options.language,
        )
    }

    /// User prompt for comic script generation
    pub fn comic_user(concept: &MathConcept, options: &GenerationOptions) -> String {
        let mut prompt = format!(
            "Create a math comic about: {}\n\nKey ideas: {}\n",
            concept.topic(),
            concept.keywords().join(", ")
        );

        if let Some(level) = concept.difficulty_hint() {
            prompt.push_str(&format!("Difficulty: {}\n", level));
        }

        prompt.push_str(&format!(
            "\nThe comic must have {}. Build the explanation step by step, and end with a panel that checks understanding.",
            Self::panel_directive(options.panel_count)
        ));

        prompt
    }

    /// System prompt for the prompt-optimization pass
    pub fn optimizer_system() -> &'static str {
        r#"You are an editor who improves prompts for an educational comic writer.
Rewrite the prompt you are given so it is clearer and more concrete, without changing its topic,
its audience or the number of panels it asks for. Keep every sentence that states the number of panels.
Reply with the rewritten prompt only."#
    }

    /// User prompt for the prompt-optimization pass
    pub fn optimizer_user(user_prompt: &str) -> String {
        format!("Prompt to improve:\n\n{}", user_prompt)
    }

    /// Prompt sent to the image generator for one panel
    pub fn panel_image(description: &str, options: &GenerationOptions, panel_number: usize) -> String {
        format!(
            "Comic panel {} for {}. {} Style: {}. No text or speech bubbles in the image.",
            panel_number,
            options.age_group.audience(),
            description.trim(),
            options.style.image_cue()
        )
    }
}
