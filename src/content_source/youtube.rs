//! YouTube source implementation.
//!
//! Metadata comes from `yt-dlp --dump-json`; the same JSON lists the caption
//! tracks, and the chosen track is downloaded in its `json3` rendition.

use super::{format_timestamp, ContentKind, ContentSource, RetrievedContent};
use crate::config::RetrievalSettings;
use crate::error::{Result, SiftError};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// YouTube transcript source.
pub struct YoutubeSource {
    video_id_regex: Regex,
    client: reqwest::Client,
    preferred_language: String,
    include_timestamps: bool,
    description_chars: usize,
}

impl YoutubeSource {
    pub fn new(client: reqwest::Client, settings: &RetrievalSettings) -> Self {
        // Matches YouTube URL formats from the start of the input, and bare video IDs
        let video_id_regex = Regex::new(
            r"(?x)
            ^(?:
                (?:https?://)?
                (?:www\.|m\.)?
                (?:
                    youtube\.com/(?:watch\?(?:[^&]*&)*v=|embed/|v/|shorts/|live/)
                    |
                    youtu\.be/
                )
                ([a-zA-Z0-9_-]{11})
                (?:[^a-zA-Z0-9_-]|$)
            )
            |
            # Bare video ID (11 characters)
            ^([a-zA-Z0-9_-]{11})$
        ",
        )
        .expect("Invalid regex");

        Self {
            video_id_regex,
            client,
            preferred_language: settings.preferred_language.clone(),
            include_timestamps: settings.include_timestamps,
            description_chars: settings.description_chars,
        }
    }

    /// Extract video ID from a YouTube URL or bare ID.
    pub fn extract_video_id(&self, input: &str) -> Option<String> {
        let caps = self.video_id_regex.captures(input.trim())?;

        caps.get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().to_string())
    }

    /// Fetch the full yt-dlp info JSON for a video.
    async fn fetch_info(&self, video_id: &str) -> Result<Value> {
        let url = format!("https://www.youtube.com/watch?v={}", video_id);

        let output = tokio::process::Command::new("yt-dlp")
            .args(["--dump-json", "--no-download", "--no-warnings", &url])
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SiftError::ToolNotFound("yt-dlp".to_string())
                } else {
                    SiftError::Fetch(format!("Failed to run yt-dlp: {}", e))
                }
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SiftError::Fetch(format!(
                "Video {} not found or unavailable: {}",
                video_id,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| SiftError::Fetch(format!("Failed to parse yt-dlp output: {}", e)))
    }

    /// Download a caption track and flatten it to text.
    async fn fetch_transcript(&self, video_id: &str, track: &CaptionTrack) -> Result<String> {
        let unavailable = |reason: String| {
            SiftError::TranscriptUnavailable(format!(
                "Could not download transcript for video {}: {}",
                video_id, reason
            ))
        };

        let response = self
            .client
            .get(&track.url)
            .send()
            .await
            .map_err(|e| unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(unavailable(format!("HTTP {}", response.status())));
        }

        let body = response.text().await.map_err(|e| unavailable(e.to_string()))?;
        let transcript = parse_json3_transcript(&body, self.include_timestamps)
            .map_err(|e| unavailable(format!("malformed caption data: {}", e)))?;

        if transcript.trim().is_empty() {
            return Err(SiftError::TranscriptUnavailable(format!(
                "Transcript for video {} is empty",
                video_id
            )));
        }

        Ok(transcript)
    }
}

#[async_trait]
impl ContentSource for YoutubeSource {
    fn kind(&self) -> ContentKind {
        ContentKind::YouTube
    }

    fn can_handle(&self, input: &str) -> bool {
        self.extract_video_id(input).is_some()
    }

    async fn fetch(&self, input: &str) -> Result<RetrievedContent> {
        let video_id = self.extract_video_id(input).ok_or_else(|| {
            SiftError::UnsupportedSource(format!("Invalid YouTube video ID or URL: {}", input))
        })?;

        info!("Fetching metadata for video {}", video_id);
        let info = self.fetch_info(&video_id).await?;
        let metadata = VideoMetadata::from_ytdlp_json(&info);

        let track = select_caption_track(&info, &self.preferred_language).ok_or_else(|| {
            SiftError::TranscriptUnavailable(format!("No transcript found for video {}", video_id))
        })?;
        debug!(
            "Using {} caption track '{}'",
            if track.automatic { "automatic" } else { "manual" },
            track.language
        );

        let transcript = self.fetch_transcript(&video_id, &track).await?;

        Ok(RetrievedContent {
            kind: ContentKind::YouTube,
            url: format!("https://www.youtube.com/watch?v={}", video_id),
            title: Some(metadata.title.clone()),
            text: transcript,
            metadata: metadata.to_fields(self.description_chars),
            truncated: false,
        })
    }
}

/// Video metadata extracted from yt-dlp.
#[derive(Debug, Clone, Default)]
pub struct VideoMetadata {
    pub title: String,
    pub uploader: Option<String>,
    pub description: Option<String>,
    pub duration_seconds: Option<u64>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub upload_date: Option<String>,
    pub tags: Vec<String>,
}

impl VideoMetadata {
    /// Parse the fields we care about from yt-dlp's info JSON.
    pub fn from_ytdlp_json(json: &Value) -> Self {
        let upload_date = json["upload_date"].as_str().map(|date_str| {
            // yt-dlp returns date as YYYYMMDD
            chrono::NaiveDate::parse_from_str(date_str, "%Y%m%d")
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|_| date_str.to_string())
        });

        Self {
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            uploader: json["uploader"]
                .as_str()
                .or_else(|| json["channel"].as_str())
                .map(|s| s.to_string()),
            description: json["description"]
                .as_str()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.to_string()),
            duration_seconds: json["duration"].as_f64().map(|d| d as u64),
            view_count: json["view_count"].as_u64(),
            like_count: json["like_count"].as_u64(),
            upload_date,
            tags: json["tags"]
                .as_array()
                .map(|tags| {
                    tags.iter()
                        .filter_map(|t| t.as_str())
                        .take(10)
                        .map(|t| t.to_string())
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// Flatten into display-ordered metadata fields.
    pub fn to_fields(&self, description_chars: usize) -> Vec<(String, String)> {
        let mut fields = vec![("title".to_string(), self.title.clone())];

        if let Some(uploader) = &self.uploader {
            fields.push(("uploader".to_string(), uploader.clone()));
        }
        if let Some(duration) = self.duration_seconds {
            fields.push(("duration_seconds".to_string(), duration.to_string()));
        }
        if let Some(views) = self.view_count {
            fields.push(("view_count".to_string(), group_thousands(views)));
        }
        if let Some(likes) = self.like_count {
            fields.push(("like_count".to_string(), group_thousands(likes)));
        }
        if let Some(date) = &self.upload_date {
            fields.push(("upload_date".to_string(), date.clone()));
        }
        if !self.tags.is_empty() {
            fields.push(("tags".to_string(), self.tags.join(", ")));
        }
        if let Some(description) = &self.description {
            let (kept, cut) = crate::llm::truncate_chars(description, description_chars);
            let value = if cut {
                format!("{}...", kept)
            } else {
                kept.to_string()
            };
            fields.push(("description".to_string(), value));
        }

        fields
    }
}

/// Format an integer with comma thousands separators.
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// A caption track listed by yt-dlp.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub language: String,
    pub url: String,
    pub automatic: bool,
}

/// Pick the best caption track.
///
/// Order: manual in the preferred language, automatic in the preferred
/// language, any manual track, the original-language automatic track, any
/// automatic track.
pub fn select_caption_track(info: &Value, preferred_language: &str) -> Option<CaptionTrack> {
    let manual = info.get("subtitles").and_then(Value::as_object);
    let automatic = info.get("automatic_captions").and_then(Value::as_object);

    let prefix = format!("{}-", preferred_language);
    let exact = |lang: &str| lang == preferred_language;
    let regional = |lang: &str| lang.starts_with(&prefix);
    let original = |lang: &str| lang.ends_with("-orig");
    let any = |_: &str| true;

    find_track(manual, false, &exact)
        .or_else(|| find_track(manual, false, &regional))
        .or_else(|| find_track(automatic, true, &exact))
        .or_else(|| find_track(automatic, true, &regional))
        .or_else(|| find_track(manual, false, &any))
        .or_else(|| find_track(automatic, true, &original))
        .or_else(|| find_track(automatic, true, &any))
}

fn find_track(
    tracks: Option<&serde_json::Map<String, Value>>,
    automatic: bool,
    matches: &dyn Fn(&str) -> bool,
) -> Option<CaptionTrack> {
    tracks?
        .iter()
        .filter(|(lang, _)| lang.as_str() != "live_chat" && matches(lang.as_str()))
        .find_map(|(lang, formats)| {
            let url = formats
                .as_array()?
                .iter()
                .find(|f| f["ext"].as_str() == Some("json3"))?["url"]
                .as_str()?;
            Some(CaptionTrack {
                language: lang.clone(),
                url: url.to_string(),
                automatic,
            })
        })
}

#[derive(Debug, Deserialize)]
struct Json3Transcript {
    #[serde(default)]
    events: Vec<Json3Event>,
}

#[derive(Debug, Deserialize)]
struct Json3Event {
    #[serde(rename = "tStartMs", default)]
    start_ms: f64,
    #[serde(default)]
    segs: Vec<Json3Segment>,
}

#[derive(Debug, Deserialize)]
struct Json3Segment {
    #[serde(default)]
    utf8: String,
}

/// Flatten a `json3` caption document into one line per caption event.
pub fn parse_json3_transcript(body: &str, include_timestamps: bool) -> Result<String> {
    let transcript: Json3Transcript = serde_json::from_str(body)?;

    let lines: Vec<String> = transcript
        .events
        .iter()
        .filter_map(|event| {
            let text: String = event.segs.iter().map(|s| s.utf8.as_str()).collect();
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            if text.is_empty() {
                return None;
            }
            Some(if include_timestamps {
                format!("[{}] {}", format_timestamp(event.start_ms / 1000.0), text)
            } else {
                text
            })
        })
        .collect();

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn source() -> YoutubeSource {
        YoutubeSource::new(reqwest::Client::new(), &RetrievalSettings::default())
    }

    #[test]
    fn test_extract_video_id() {
        let source = source();

        assert_eq!(
            source.extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtu.be/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://www.youtube.com/shorts/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            source.extract_video_id("https://www.youtube.com/watch?feature=share&v=aircAruvnKk"),
            Some("aircAruvnKk".to_string())
        );
        assert_eq!(
            source.extract_video_id("dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );

        assert_eq!(source.extract_video_id("not-a-video-id"), None);
        assert_eq!(source.extract_video_id("https://youtube.com/@somechannel"), None);
        assert_eq!(source.extract_video_id(""), None);

        // YouTube paths on other hosts are ordinary web pages.
        assert_eq!(source.extract_video_id("https://notyoutube.com/watch?v=abcdefghijk"), None);
        assert_eq!(
            source.extract_video_id(
                "https://web.archive.org/web/2020/https://www.youtube.com/watch?v=dQw4w9WgXcQ"
            ),
            None
        );
        assert_eq!(source.extract_video_id("https://youtu.be/dQw4w9WgXcQextra"), None);
        assert_eq!(
            source.extract_video_id("https://youtu.be/dQw4w9WgXcQ?t=42"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_can_handle() {
        let source = source();

        assert!(source.can_handle("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!source.can_handle("https://en.wikipedia.org/wiki/Rust"));
        assert!(!source.can_handle("https://youtube.com/playlist?list=PLtest"));
    }

    fn info_with_tracks() -> Value {
        json!({
            "title": "But what is a neural network?",
            "uploader": "3Blue1Brown",
            "description": "An introduction to neural networks.",
            "duration": 1122.0,
            "view_count": 19876543,
            "like_count": 412000,
            "upload_date": "20171005",
            "tags": ["neural networks", "deep learning"],
            "subtitles": {
                "live_chat": [{"ext": "json", "url": "https://example.com/chat"}],
                "fr": [{"ext": "json3", "url": "https://example.com/fr.json3"}]
            },
            "automatic_captions": {
                "de": [{"ext": "json3", "url": "https://example.com/de.json3"}],
                "en": [
                    {"ext": "srv1", "url": "https://example.com/en.srv1"},
                    {"ext": "json3", "url": "https://example.com/en.json3"}
                ]
            }
        })
    }

    #[test]
    fn test_select_preferred_language_before_other_manual() {
        let track = select_caption_track(&info_with_tracks(), "en").unwrap();
        assert_eq!(track.language, "en");
        assert!(track.automatic);
        assert_eq!(track.url, "https://example.com/en.json3");
    }

    #[test]
    fn test_select_manual_regional_track() {
        let info = json!({
            "subtitles": {"en-GB": [{"ext": "json3", "url": "https://example.com/en-gb"}]},
            "automatic_captions": {"en": [{"ext": "json3", "url": "https://example.com/auto"}]}
        });
        let track = select_caption_track(&info, "en").unwrap();
        assert_eq!(track.language, "en-GB");
        assert!(!track.automatic);
    }

    #[test]
    fn test_select_falls_back_to_original_auto_track() {
        let info = json!({
            "automatic_captions": {
                "ab": [{"ext": "json3", "url": "https://example.com/ab"}],
                "es-orig": [{"ext": "json3", "url": "https://example.com/es-orig"}]
            }
        });
        let track = select_caption_track(&info, "en").unwrap();
        assert_eq!(track.language, "es-orig");
    }

    #[test]
    fn test_no_tracks() {
        assert!(select_caption_track(&json!({"title": "x"}), "en").is_none());
        let only_chat = json!({"subtitles": {"live_chat": [{"ext": "json3", "url": "u"}]}});
        assert!(select_caption_track(&only_chat, "en").is_none());
    }

    #[test]
    fn test_metadata_fields() {
        let metadata = VideoMetadata::from_ytdlp_json(&info_with_tracks());
        assert_eq!(metadata.upload_date.as_deref(), Some("2017-10-05"));

        let fields = metadata.to_fields(10);
        let get = |k: &str| fields.iter().find(|(key, _)| key == k).map(|(_, v)| v.as_str());
        assert_eq!(get("title"), Some("But what is a neural network?"));
        assert_eq!(get("view_count"), Some("19,876,543"));
        assert_eq!(get("duration_seconds"), Some("1122"));
        assert_eq!(get("tags"), Some("neural networks, deep learning"));
        assert_eq!(get("description"), Some("An introdu..."));
    }

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_parse_json3_transcript() {
        let body = r#"{
            "events": [
                {"tStartMs": 0, "dDurationMs": 1000},
                {"tStartMs": 1500, "segs": [{"utf8": "hello "}, {"utf8": "world"}]},
                {"tStartMs": 65000, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 75000, "segs": [{"utf8": "second\nline"}]}
            ]
        }"#;

        let with_ts = parse_json3_transcript(body, true).unwrap();
        assert_eq!(with_ts, "[00:01] hello world\n[01:15] second line");

        let plain = parse_json3_transcript(body, false).unwrap();
        assert_eq!(plain, "hello world\nsecond line");
    }

    #[test]
    fn test_parse_json3_rejects_garbage() {
        assert!(parse_json3_transcript("<html>", true).is_err());
    }

    #[tokio::test]
    async fn test_fetch_transcript_missing_track_is_unavailable() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/captions"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let track = CaptionTrack {
            language: "en".to_string(),
            url: format!("{}/captions", server.uri()),
            automatic: true,
        };
        let err = source().fetch_transcript("dQw4w9WgXcQ", &track).await.unwrap_err();
        assert!(matches!(err, SiftError::TranscriptUnavailable(_)));
    }

    #[tokio::test]
    async fn test_fetch_transcript_success() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/captions"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"events": [{"tStartMs": 2000, "segs": [{"utf8": "Neurons hold numbers"}]}]}"#,
            ))
            .mount(&server)
            .await;

        let track = CaptionTrack {
            language: "en".to_string(),
            url: format!("{}/captions", server.uri()),
            automatic: true,
        };
        let text = source().fetch_transcript("aircAruvnKk", &track).await.unwrap();
        assert_eq!(text, "[00:02] Neurons hold numbers");
    }
}
