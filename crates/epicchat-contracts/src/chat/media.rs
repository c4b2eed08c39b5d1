use std::fmt;

use serde::{Deserialize, Serialize};

pub const GENERIC_ACKNOWLEDGEMENT: &str =
    "I'm working on your request. This will take just a moment...";
pub const GENERIC_COMPLETION: &str = "I've completed your request. What do you think?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Audio,
    Video,
    Code,
    Chart,
}

/// Explicit generation phrases, scanned in table order. The first media type
/// with a matching phrase wins.
pub(crate) const MEDIA_REQUEST_PHRASES: &[(MediaType, &[&str])] = &[
    (
        MediaType::Image,
        &["generate image", "create image", "make an image"],
    ),
    (
        MediaType::Audio,
        &["generate audio", "create audio", "make audio"],
    ),
    (
        MediaType::Video,
        &["generate video", "create video", "make a video"],
    ),
    (
        MediaType::Code,
        &["generate code", "write code", "create code"],
    ),
    (
        MediaType::Chart,
        &["generate chart", "create chart", "make a chart"],
    ),
];

impl MediaType {
    pub const ALL: [MediaType; 5] = [
        MediaType::Image,
        MediaType::Audio,
        MediaType::Video,
        MediaType::Code,
        MediaType::Chart,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Audio => "audio",
            MediaType::Video => "video",
            MediaType::Code => "code",
            MediaType::Chart => "chart",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|media_type| media_type.as_str() == normalized)
    }

    /// Sent as soon as a generation request is recognized.
    pub fn acknowledgement(self) -> &'static str {
        match self {
            MediaType::Image => {
                "I'm generating an image based on your description. This will take just a moment..."
            }
            MediaType::Audio => {
                "I'm creating an audio clip based on your request. This will take just a moment..."
            }
            MediaType::Video => {
                "I'm producing a video based on your description. This might take a little longer..."
            }
            MediaType::Code => {
                "I'm writing code based on your requirements. This will take just a moment..."
            }
            MediaType::Chart => {
                "I'm creating a chart based on your specifications. This will take just a moment..."
            }
        }
    }

    /// Sent alongside the finished artifact.
    pub fn completion(self) -> &'static str {
        match self {
            MediaType::Image => {
                "I've generated an image based on your description. What do you think?"
            }
            MediaType::Audio => {
                "I've created an audio clip based on your request. What do you think?"
            }
            MediaType::Video => {
                "I've produced a video based on your description. What do you think?"
            }
            MediaType::Code => {
                "I've written code based on your requirements. Let me know if you need any adjustments."
            }
            MediaType::Chart => {
                "I've created a chart based on your specifications. What do you think?"
            }
        }
    }

    pub fn suggestion(self) -> String {
        let noun = match self {
            MediaType::Image => "an image",
            MediaType::Audio => "an audio clip",
            MediaType::Video => "a video",
            MediaType::Code => "code",
            MediaType::Chart => "a chart",
        };
        format!("I'll help you generate {noun}. Please describe what you want in detail.")
    }

    pub fn regeneration_notice(self) -> String {
        format!("I'll regenerate the {self} with some variations.")
    }

    pub fn regeneration_completion(self) -> String {
        format!("I've regenerated the {self}. Is this more what you had in mind?")
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
