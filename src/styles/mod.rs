pub mod korean;
pub mod newyork;
pub mod purikura;

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

use crate::color::BackgroundColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostProcess {
    None,
    PurikuraBoost,
    FadedMonochrome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoothStyle {
    Japanese,
    Korean,
    NewYork,
}

/// Everything a session needs to know about one booth look.
#[derive(Debug, Clone, Copy)]
pub struct StyleProfile {
    pub key: &'static str,
    pub name: &'static str,
    pub system_instruction: &'static str,
    pub prompt_master: &'static str,
    pub prompt_match: &'static str,
    pub chat_prompt: &'static str,
    pub background_color: BackgroundColor,
    pub enforce_background: bool,
    /// Only repaint the outer band, leaving light clothing and text alone.
    pub edge_aware_background: bool,
    pub background_threshold: u8,
    pub post_process: PostProcess,
}

const JAPANESE_PROFILE: StyleProfile = StyleProfile {
    key: "japanese",
    name: "Japanese Purikura",
    system_instruction: purikura::PURIKURA_SYSTEM_INSTRUCTION,
    prompt_master: purikura::PURIKURA_PROMPT,
    prompt_match: purikura::PURIKURA_MATCH_PROMPT,
    chat_prompt: purikura::PURIKURA_CHAT_PROMPT,
    background_color: purikura::PURIKURA_BACKGROUND_COLOR,
    enforce_background: true,
    edge_aware_background: false,
    background_threshold: 235,
    post_process: PostProcess::PurikuraBoost,
};

const KOREAN_PROFILE: StyleProfile = StyleProfile {
    key: "korean",
    name: "Korean Life Four Cuts",
    system_instruction: korean::KOREAN_SYSTEM_INSTRUCTION,
    prompt_master: korean::KOREAN_PROMPT,
    prompt_match: korean::KOREAN_MATCH_PROMPT,
    chat_prompt: "",
    background_color: korean::KOREAN_BACKGROUND_COLOR,
    enforce_background: false,
    edge_aware_background: false,
    background_threshold: 230,
    post_process: PostProcess::None,
};

const NEWYORK_PROFILE: StyleProfile = StyleProfile {
    key: "newyork",
    name: "New York Vintage",
    system_instruction: newyork::NEWYORK_SYSTEM_INSTRUCTION,
    prompt_master: newyork::NEWYORK_PROMPT,
    prompt_match: newyork::NEWYORK_MATCH_PROMPT,
    chat_prompt: "",
    background_color: newyork::NEWYORK_BACKGROUND_COLOR,
    enforce_background: false,
    edge_aware_background: false,
    background_threshold: 230,
    post_process: PostProcess::FadedMonochrome,
};

impl BoothStyle {
    pub const ALL: [BoothStyle; 3] = [BoothStyle::Japanese, BoothStyle::Korean, BoothStyle::NewYork];

    pub fn profile(self) -> &'static StyleProfile {
        match self {
            BoothStyle::Japanese => &JAPANESE_PROFILE,
            BoothStyle::Korean => &KOREAN_PROFILE,
            BoothStyle::NewYork => &NEWYORK_PROFILE,
        }
    }

    pub fn key(self) -> &'static str {
        self.profile().key
    }
}

impl fmt::Display for BoothStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for BoothStyle {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "japanese" | "purikura" => Ok(BoothStyle::Japanese),
            "korean" => Ok(BoothStyle::Korean),
            "newyork" | "new-york" | "ny" => Ok(BoothStyle::NewYork),
            other => {
                let valid = BoothStyle::ALL
                    .iter()
                    .map(|style| style.key())
                    .collect::<Vec<_>>()
                    .join(", ");
                Err(anyhow!("Unknown style '{other}'. Valid styles: {valid}"))
            }
        }
    }
}

/// Drops the single-reference image order so a chained request lists images once.
fn without_image_order(prompt: &str) -> String {
    prompt
        .split("\n\n")
        .filter(|section| !section.trim_start().starts_with("IMAGE ORDER"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

impl StyleProfile {
    /// Prompt for a target matched against every earlier output.
    pub fn chained_prompt(&self, reference_count: usize) -> String {
        let base = if self.chat_prompt.trim().is_empty() {
            self.prompt_match
        } else {
            self.chat_prompt
        };

        let mut prompt = without_image_order(base);
        prompt.push_str("\n\nIMAGE ORDER FOR THIS REQUEST:");
        for index in 1..=reference_count {
            prompt.push_str(&format!(
                "\n- Image {index}: REFERENCE (processed photo {index})"
            ));
        }
        prompt.push_str(&format!(
            "\n- Image {}: TARGET (photo {} to transform)",
            reference_count + 1,
            reference_count + 1
        ));
        prompt
    }
}
