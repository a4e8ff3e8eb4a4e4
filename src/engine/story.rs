// Story and correction generation: fixed prompts, strict JSON parsing, and
// the fallback values that keep the game playable when the model misbehaves.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::parse;
use crate::llm::{ChatBackend, GenerationOptions};

/// A news story as shown to the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub content: String,
}

/// A "correction" that subverts the gist of its seed story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub correction: String,
}

/// Why a generation step fell back to a canned value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// The chat backend call itself failed.
    Backend,
    /// The reply arrived but was not the requested JSON.
    Unparsable,
}

/// Where a generated value came from. The HTTP layer serializes only the
/// value, so model output and fallback look identical to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Model,
    Fallback(FallbackReason),
}

/// A generation result that remembers its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generated<T> {
    pub value: T,
    pub origin: Origin,
}

impl<T> Generated<T> {
    fn model(value: T) -> Self {
        Self {
            value,
            origin: Origin::Model,
        }
    }

    fn fallback(value: T, reason: FallbackReason) -> Self {
        Self {
            value,
            origin: Origin::Fallback(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.origin, Origin::Fallback(_))
    }
}

// ── Fallback values ───────────────────────────────────────────────────

pub const FALLBACK_STORY_TITLE: &str = "Corruption in Mayor's Office";

const FALLBACK_STORY_CONTENT: &str = "A local community center faced budget cuts, affecting after-school programs for children. The mayor's office claimed the cuts were necessary due to declining tax revenue, but critics pointed out that the mayor had recently approved a $2 million renovation of his own office suite. The community center director, who had been vocal about the cuts, was fired shortly after speaking to the local newspaper about the impact on children.";

const UNPARSED_TITLE: &str = "Generated Story";
const UNPARSED_CONTENT: &str = "A story was generated but could not be parsed properly.";

/// The story served when generation fails, also the game's default opening.
pub fn fallback_story() -> Story {
    Story {
        title: FALLBACK_STORY_TITLE.to_string(),
        content: FALLBACK_STORY_CONTENT.to_string(),
    }
}

/// The correction served when generation fails or the reply is unparsable.
pub fn fallback_correction() -> Correction {
    Correction {
        original: "the story".to_string(),
        correction: "the $2 million that reportedly went towards the mayor's office renovation was actually a series of donations to a nearby hospital.".to_string(),
    }
}

// ── Prompts ───────────────────────────────────────────────────────────

const STORY_SYSTEM_PROMPT: &str = r#"You are an educational game content generator specializing in politically charged news stories.
Create detailed, specific stories with complex political implications that include:
- Specific names, relationships, and connections between people
- Financial details, donations, and quid-pro-quo arrangements
- Multiple layers of political intrigue and corruption
- Specific consequences and investigations
- Realistic but dramatic political scenarios

Each story should be engaging and show how information can be interpreted differently."#;

const STORY_USER_PROMPT: &str = r#"Generate a detailed news story with juicy political/corporate details including:
1. A catchy title
2. A story (3-4 sentences) with specific names, relationships, financial details, and political connections

Format the response as a JSON object with keys: title, content

No need to make it realistic. Do not discuss possible interpretations, just give the facts. The story should be rich with details but let the reader interpret its meaning themselves."#;

const CORRECTION_SYSTEM_PROMPT: &str = r#"You are an AI that generates corrections to news stories for an educational game about misinformation.

Your task is to create a correction that:
1. Is directly related to the specific story content
2. Introduces politically-charged details that could change interpretation
3. Focuses on details like race, education, criminal history, political affiliation, financial background, or connections
4. Is realistic but dramatic enough to be engaging
5. Each correction must SUBVERT THE GIST of the previous story or correction in a plausible way, so the overall message is changed or reversed in some way.
Return a JSON object with:
- "original": a brief description of what was "originally reported"
- "correction": the "corrected" version with new details. Each new correction should subvert or reverse the main message of the previous version with new juicy facts. Make the correction 1 short sentence long, and it shouldn't explain political rhetoric."#;

/// The seed's title and content are embedded verbatim so the correction is
/// textually grounded in specific facts rather than a paraphrase.
fn correction_user_prompt(seed: &Story) -> String {
    format!(
        "Generate a correction for this story, adding new details and/or changing specific details to subvert the gist of the story:\n\nTitle: {}\nContent: {}\n\nIf this is already a correction, subvert the gist of the previous correction. Make the correction 1 sentence long.",
        seed.title, seed.content
    )
}

// ── Generators ────────────────────────────────────────────────────────

/// Produces the opening story of a game. Never fails outward.
#[derive(Clone)]
pub struct StoryGenerator {
    backend: Arc<dyn ChatBackend>,
    options: GenerationOptions,
}

impl StoryGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>, options: GenerationOptions) -> Self {
        Self { backend, options }
    }

    pub async fn new_story(&self) -> Generated<Story> {
        let raw = match self
            .backend
            .complete(STORY_SYSTEM_PROMPT, STORY_USER_PROMPT, &self.options)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("story generation failed, serving fallback: {e}");
                return Generated::fallback(fallback_story(), FallbackReason::Backend);
            }
        };

        match serde_json::from_str::<Story>(&raw) {
            Ok(story) => Generated::model(story),
            Err(_) => {
                tracing::warn!("story reply was not valid JSON, recovering line by line");
                let partial = parse::recover_story(&raw);
                Generated::fallback(
                    Story {
                        title: partial.title.unwrap_or_else(|| UNPARSED_TITLE.to_string()),
                        content: partial
                            .content
                            .unwrap_or_else(|| UNPARSED_CONTENT.to_string()),
                    },
                    FallbackReason::Unparsable,
                )
            }
        }
    }
}

/// Produces a correction that subverts the gist of a seed story. Never
/// fails outward.
#[derive(Clone)]
pub struct CorrectionGenerator {
    backend: Arc<dyn ChatBackend>,
    options: GenerationOptions,
}

impl CorrectionGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>, options: GenerationOptions) -> Self {
        Self { backend, options }
    }

    pub async fn new_correction(&self, seed: &Story) -> Generated<Correction> {
        let user_prompt = correction_user_prompt(seed);
        let raw = match self
            .backend
            .complete(CORRECTION_SYSTEM_PROMPT, &user_prompt, &self.options)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("correction generation failed, serving fallback: {e}");
                return Generated::fallback(fallback_correction(), FallbackReason::Backend);
            }
        };

        match serde_json::from_str::<Correction>(&raw) {
            Ok(correction) => Generated::model(correction),
            Err(_) => {
                tracing::warn!("correction reply was not valid JSON, serving fallback");
                Generated::fallback(fallback_correction(), FallbackReason::Unparsable)
            }
        }
    }
}
