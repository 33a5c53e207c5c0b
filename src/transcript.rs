//! Caption-track fetching for video URLs.
//!
//! The watch page embeds a `"captionTracks"` JSON array; the first
//! track's `baseUrl` serves a timedtext XML document of `<text start
//! dur>` elements. That track is flattened into a `[mm:ss] line` blob
//! for the summariser.

use crate::extract::ExtractError;
use crate::scraper;
use serde::Deserialize;

/// One timed caption line.
#[derive(Debug, Clone, PartialEq)]
struct Segment {
    start: f64,
    text: String,
}

/// Caption track descriptor as embedded in the watch page.
#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
}

/// Fetch the transcript for a video URL and serialise it to a single
/// text blob.
pub async fn fetch_transcript(url: &str) -> Result<String, ExtractError> {
    let client = scraper::create_client()?;

    let page = client.get(url).send().await?.text().await?;
    let track_url = first_caption_track(&page).ok_or(ExtractError::TranscriptUnavailable)?;

    let xml = client
        .get(&track_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    let segments = parse_timedtext(&xml)?;
    if segments.is_empty() {
        return Err(ExtractError::TranscriptUnavailable);
    }
    Ok(render(&segments))
}

/// Locate the `"captionTracks"` array in the watch page and return the
/// first track's URL. `None` when the video exposes no captions.
fn first_caption_track(page: &str) -> Option<String> {
    let marker = "\"captionTracks\":";
    let at = page.find(marker)? + marker.len();
    let rest = &page[at..];
    let skipped = rest.len() - rest.trim_start().len();

    let array = json_array_at(page, at + skipped)?;
    let tracks: Vec<CaptionTrack> = serde_json::from_str(array).ok()?;
    tracks.into_iter().next().map(|track| track.base_url)
}

/// Return the balanced JSON array starting at byte `start` (which must
/// point at `[`), honouring strings and nesting.
fn json_array_at(source: &str, start: usize) -> Option<&str> {
    let bytes = source.as_bytes();
    if bytes.get(start) != Some(&b'[') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if *byte == b'\\' {
                escaped = true;
            } else if *byte == b'"' {
                in_string = false;
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' => depth += 1,
            b']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&source[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse timedtext XML into ordered segments.
fn parse_timedtext(xml: &str) -> Result<Vec<Segment>, ExtractError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut segments = Vec::new();
    let mut current_start: Option<f64> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"text" => {
                let start = e
                    .try_get_attribute("start")
                    .map_err(|e| ExtractError::MalformedTranscript(e.to_string()))?
                    .and_then(|attr| String::from_utf8_lossy(&attr.value).parse::<f64>().ok())
                    .unwrap_or(0.0);
                current_start = Some(start);
            }
            Ok(Event::Text(e)) => {
                if let Some(start) = current_start {
                    let raw = e
                        .xml_content()
                        .map_err(|e| ExtractError::MalformedTranscript(e.to_string()))?;
                    let text = decode_double_escapes(&raw);
                    if !text.is_empty() {
                        segments.push(Segment { start, text });
                    }
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"text" => {
                current_start = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::MalformedTranscript(e.to_string())),
            Ok(_) => {}
        }
        buf.clear();
    }

    Ok(segments)
}

/// Caption text arrives double-encoded (`&amp;#39;` for an apostrophe),
/// so run one more unescape pass over the already-unescaped text.
fn decode_double_escapes(text: &str) -> String {
    match quick_xml::escape::unescape(text) {
        Ok(decoded) => decoded.trim().to_string(),
        Err(_) => text.trim().to_string(),
    }
}

/// Flatten segments into the blob handed to the summariser.
fn render(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|segment| format!("[{}] {}", timestamp(segment.start), segment.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Seconds to `mm:ss`, rolling into `h:mm:ss` past an hour.
fn timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WATCH_PAGE: &str = r#"<html><script>var ytInitialPlayerResponse = {"captions":{"playerCaptionsTracklistRenderer":{"captionTracks":[{"baseUrl":"https:\/\/www.youtube.com\/api\/timedtext?v=abc&lang=en","name":{"simpleText":"English"},"languageCode":"en"},{"baseUrl":"https:\/\/www.youtube.com\/api\/timedtext?v=abc&lang=sv","languageCode":"sv"}]}}};</script></html>"#;

    #[test]
    fn finds_first_caption_track_and_unescapes_url() {
        let url = first_caption_track(WATCH_PAGE).unwrap();
        assert_eq!(url, "https://www.youtube.com/api/timedtext?v=abc&lang=en");
    }

    #[test]
    fn page_without_captions_yields_none() {
        assert!(first_caption_track("<html><body>no player data</body></html>").is_none());
    }

    #[test]
    fn json_array_extraction_handles_nesting_and_strings() {
        let source = r#"x: [1, [2, 3], "a ] tricky \" string"] trailing"#;
        let array = json_array_at(source, 3).unwrap();
        assert_eq!(array, r#"[1, [2, 3], "a ] tricky \" string"]"#);
    }

    #[test]
    fn parses_timedtext_segments() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript>
  <text start="1.3" dur="2.1">first line</text>
  <text start="4.0" dur="3.5">it&amp;#39;s the second</text>
</transcript>"#;
        let segments = parse_timedtext(xml).unwrap();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].start, 1.3);
        assert_eq!(segments[0].text, "first line");
        assert_eq!(segments[1].text, "it's the second");
    }

    #[test]
    fn empty_transcript_has_no_segments() {
        let segments = parse_timedtext("<transcript></transcript>").unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn renders_timestamped_lines() {
        let segments = vec![
            Segment {
                start: 5.4,
                text: "intro".to_string(),
            },
            Segment {
                start: 3725.0,
                text: "late".to_string(),
            },
        ];
        assert_eq!(render(&segments), "[00:05] intro\n[1:02:05] late");
    }
}
