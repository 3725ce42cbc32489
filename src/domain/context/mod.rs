//! Live candidate context - resume text and STAR stories

use serde::{Deserialize, Serialize};

/// Resume text shorter than this (after trimming) does not count as context
pub const MIN_RESUME_CHARS: usize = 20;

/// A STAR-format story from the candidate's story bank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StarStory {
    pub title: String,
    pub situation: String,
    pub task: String,
    pub action: String,
    pub result: String,
}

impl StarStory {
    fn to_block(&self) -> String {
        format!(
            "STORY: {}\nSITUATION: {}\nTASK: {}\nACTION: {}\nRESULT: {}",
            self.title, self.situation, self.task, self.action, self.result
        )
    }
}

/// Resume and stories as they are right now
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveContext {
    #[serde(default)]
    pub resume_text: String,
    #[serde(default)]
    pub stories: Vec<StarStory>,
}

impl LiveContext {
    pub fn new(resume_text: impl Into<String>, stories: Vec<StarStory>) -> Self {
        Self {
            resume_text: resume_text.into(),
            stories,
        }
    }

    /// Stories flattened into the text block sent with generation requests
    pub fn stories_text(&self) -> String {
        self.stories
            .iter()
            .map(StarStory::to_block)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn fingerprint(&self) -> ContextFingerprint {
        ContextFingerprint::new(self.resume_text.trim().chars().count(), self.stories.len())
    }
}

/// The parts of the live context that decide `hasContext`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContextFingerprint {
    resume_chars: usize,
    stories: usize,
}

impl ContextFingerprint {
    pub fn new(resume_chars: usize, stories: usize) -> Self {
        Self {
            resume_chars,
            stories,
        }
    }

    /// Fingerprint of the context a request was built from
    pub fn of_texts(resume_text: &str, stories_text: &str) -> Self {
        let stories = if stories_text.trim().is_empty() { 0 } else { 1 };
        Self::new(resume_text.trim().chars().count(), stories)
    }

    pub fn has_context(&self) -> bool {
        self.resume_chars > MIN_RESUME_CHARS || self.stories > 0
    }
}
