use epicchat_contracts::chat::{extract_keywords, MediaType, GENERIC_COMPLETION};

const JAVASCRIPT_SAMPLE: &str = include_str!("../resources/code_samples/javascript.js");
const PYTHON_SAMPLE: &str = include_str!("../resources/code_samples/python.py");
const HTML_SAMPLE: &str = include_str!("../resources/code_samples/card.html");
const DEFAULT_CODE_SAMPLE: &str = include_str!("../resources/code_samples/analysis.js");

const IMAGE_ENDPOINT: &str = "https://source.unsplash.com/random/800x600";
const AUDIO_PLACEHOLDER_URL: &str = "https://www.soundhelix.com/examples/mp3/SoundHelix-Song-1.mp3";
const VIDEO_PLACEHOLDER_URL: &str =
    "https://sample-videos.com/video123/mp4/720/big_buck_bunny_720p_1mb.mp4";
const CHART_PLACEHOLDER_URL: &str = "https://quickchart.io/chart?c={type:%27bar%27,data:{labels:[%27January%27,%27February%27,%27March%27,%27April%27,%27May%27],datasets:[{label:%27Users%27,data:[50,60,70,180,190]}]}}";

/// Produces the artifact for a media request. Swappable so a session can be
/// driven with deterministic or recorded content.
pub trait MediaSynthesizer: Send {
    fn name(&self) -> &str;
    fn synthesize(&self, media_type: MediaType, prompt: &str) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderMedia;

impl MediaSynthesizer for PlaceholderMedia {
    fn name(&self) -> &str {
        "placeholder"
    }

    fn synthesize(&self, media_type: MediaType, prompt: &str) -> String {
        synthesize_media(media_type, prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaArtifact {
    pub media_type: Option<MediaType>,
    pub content: String,
    pub completion: String,
}

pub fn synthesize_media(media_type: MediaType, prompt: &str) -> String {
    match media_type {
        MediaType::Image => format!("{IMAGE_ENDPOINT}?{}", extract_keywords(prompt).join(",")),
        MediaType::Audio => AUDIO_PLACEHOLDER_URL.to_string(),
        MediaType::Video => VIDEO_PLACEHOLDER_URL.to_string(),
        MediaType::Code => code_sample(prompt).to_string(),
        MediaType::Chart => CHART_PLACEHOLDER_URL.to_string(),
    }
}

/// Unrecognized media types yield an empty artifact with the generic
/// completion message.
pub fn synthesize_artifact(
    synthesizer: &dyn MediaSynthesizer,
    media_type: Option<MediaType>,
    prompt: &str,
) -> MediaArtifact {
    match media_type {
        Some(media_type) => MediaArtifact {
            media_type: Some(media_type),
            content: synthesizer.synthesize(media_type, prompt),
            completion: media_type.completion().to_string(),
        },
        None => MediaArtifact {
            media_type: None,
            content: String::new(),
            completion: GENERIC_COMPLETION.to_string(),
        },
    }
}

/// Placeholder artifact for a media type given by name.
pub fn synthesize_named(type_name: &str, prompt: &str) -> MediaArtifact {
    synthesize_artifact(&PlaceholderMedia, MediaType::parse(type_name), prompt)
}

fn code_sample(prompt: &str) -> &'static str {
    let lower = prompt.to_lowercase();
    if lower.contains("javascript") || lower.contains("js") {
        JAVASCRIPT_SAMPLE
    } else if lower.contains("python") {
        PYTHON_SAMPLE
    } else if lower.contains("html") || lower.contains("css") {
        HTML_SAMPLE
    } else {
        DEFAULT_CODE_SAMPLE
    }
}

#[cfg(test)]
mod tests {
    use epicchat_contracts::chat::{MediaType, GENERIC_COMPLETION};

    use super::{
        synthesize_artifact, synthesize_media, synthesize_named, PlaceholderMedia,
        DEFAULT_CODE_SAMPLE, HTML_SAMPLE, JAVASCRIPT_SAMPLE, PYTHON_SAMPLE,
    };

    #[test]
    fn image_url_embeds_prompt_keywords() {
        assert_eq!(
            synthesize_media(
                MediaType::Image,
                "Please create image of a red fox and blue sky"
            ),
            "https://source.unsplash.com/random/800x600?red,fox,blue,sky"
        );
    }

    #[test]
    fn code_sample_follows_language_hints() {
        assert_eq!(
            synthesize_media(MediaType::Code, "write python code for sorting"),
            PYTHON_SAMPLE
        );
        assert_eq!(synthesize_media(MediaType::Code, "hello"), DEFAULT_CODE_SAMPLE);
        assert_eq!(
            synthesize_media(MediaType::Code, "some JS please"),
            JAVASCRIPT_SAMPLE
        );
        assert_eq!(synthesize_media(MediaType::Code, "a css card"), HTML_SAMPLE);
        assert!(PYTHON_SAMPLE.starts_with("# Python function based on your request"));
        assert!(DEFAULT_CODE_SAMPLE.contains("function analyzeData(data)"));
    }

    #[test]
    fn code_samples_keep_their_exact_text() {
        for sample in [JAVASCRIPT_SAMPLE, PYTHON_SAMPLE, HTML_SAMPLE, DEFAULT_CODE_SAMPLE] {
            assert!(!sample.ends_with('\n'));
        }
        assert!(HTML_SAMPLE.contains("        /* Modern CSS Reset */\n"));
        assert!(HTML_SAMPLE.contains("        /* Responsive adjustments */\n"));
        assert!(HTML_SAMPLE.contains("}\n        \n        body {"));
        assert!(PYTHON_SAMPLE.contains("    \"\"\"\n    Process a list of data items.\n    \n"));
        assert!(JAVASCRIPT_SAMPLE.contains("  }\n  \n  // Process the data"));
        assert!(DEFAULT_CODE_SAMPLE.ends_with("console.log(analysis);"));
    }

    #[test]
    fn audio_video_chart_ignore_the_prompt() {
        for media_type in [MediaType::Audio, MediaType::Video, MediaType::Chart] {
            assert_eq!(
                synthesize_media(media_type, "one"),
                synthesize_media(media_type, "two")
            );
        }
        assert!(synthesize_media(MediaType::Audio, "").ends_with(".mp3"));
        assert!(
            synthesize_media(MediaType::Chart, "").starts_with("https://quickchart.io/chart?c=")
        );
    }

    #[test]
    fn unknown_type_degrades_to_empty_artifact() {
        let artifact = synthesize_named("hologram", "a spinning cube");
        assert_eq!(artifact.media_type, None);
        assert!(artifact.content.is_empty());
        assert_eq!(artifact.completion, GENERIC_COMPLETION);

        let known = synthesize_artifact(&PlaceholderMedia, MediaType::parse("Video"), "waves");
        assert_eq!(known.media_type, Some(MediaType::Video));
        assert!(known.content.ends_with(".mp4"));
    }
}
