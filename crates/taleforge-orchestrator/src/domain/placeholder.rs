//! Placeholder frames: the chain-external, infallible visual generator.
//!
//! Frames are rendered locally as SVG data URLs. Colors are derived from a
//! SHA-256 digest of each scene's excerpt so the same story always yields the
//! same frames.

use std::fmt::Write as _;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};
use taleforge_core::request::GenerationRequest;

const WIDTH: u32 = 640;
const HEIGHT: u32 = 360;
const OVERLAY_CHARS: usize = 80;

/// Renders one frame per requested scene (at least one).
#[must_use]
pub fn render(story_text: &str, request: &GenerationRequest) -> Vec<String> {
    let count = usize::try_from(request.num_scenes.max(1)).unwrap_or(1);
    scene_excerpts(story_text, count)
        .iter()
        .enumerate()
        .map(|(index, excerpt)| {
            let overlay = request.include_text_overlay.then_some(excerpt.as_str());
            let svg = render_svg(index, excerpt, overlay);
            format!("data:image/svg+xml;base64,{}", STANDARD.encode(svg))
        })
        .collect()
}

/// Splits `text` into `count` runs of roughly equal word count.
fn scene_excerpts(text: &str, count: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let size = words.len().div_ceil(count).max(1);
    (0..count)
        .map(|i| {
            words
                .iter()
                .skip(i * size)
                .take(size)
                .copied()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn render_svg(index: usize, excerpt: &str, overlay: Option<&str>) -> String {
    let digest = Sha256::new()
        .chain_update(index.to_le_bytes())
        .chain_update(excerpt.as_bytes())
        .finalize();
    let background = hex_color(&digest[0..3]);
    let accent = hex_color(&digest[3..6]);
    let cx = u32::from(digest[6]) * WIDTH / 255;
    let cy = u32::from(digest[7]) * HEIGHT / 255;
    let r = 40 + u32::from(digest[8]) / 2;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" viewBox=\"0 0 {WIDTH} {HEIGHT}\">\
         <rect width=\"{WIDTH}\" height=\"{HEIGHT}\" fill=\"{background}\"/>\
         <circle cx=\"{cx}\" cy=\"{cy}\" r=\"{r}\" fill=\"{accent}\" fill-opacity=\"0.6\"/>\
         <text x=\"24\" y=\"40\" font-family=\"sans-serif\" font-size=\"22\" fill=\"#ffffff\">Scene {}</text>",
        index + 1
    );
    if let Some(text) = overlay.filter(|t| !t.is_empty()) {
        let _ = write!(
            svg,
            "<text x=\"24\" y=\"{}\" font-family=\"sans-serif\" font-size=\"16\" fill=\"#ffffff\">{}</text>",
            HEIGHT - 24,
            escape_xml(&truncate(text, OVERLAY_CHARS))
        );
    }
    svg.push_str("</svg>");
    svg
}

fn hex_color(bytes: &[u8]) -> String {
    bytes.iter().fold(String::from("#"), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_owned();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(frame: &str) -> String {
        let payload = frame
            .strip_prefix("data:image/svg+xml;base64,")
            .expect("svg data url");
        String::from_utf8(STANDARD.decode(payload).unwrap()).unwrap()
    }

    #[test]
    fn test_renders_one_frame_per_scene() {
        let mut request = GenerationRequest::new("a fox");
        request.num_scenes = 3;

        let frames = render("The fox ran. The fox hid. The fox slept.", &request);

        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| f.starts_with("data:image/svg+xml;base64,")));
    }

    #[test]
    fn test_never_empty_even_for_empty_story() {
        let mut request = GenerationRequest::new("a fox");
        request.num_scenes = 0;

        let frames = render("", &request);

        assert_eq!(frames.len(), 1);
        assert!(decode(&frames[0]).contains("Scene 1"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let request = GenerationRequest::new("a fox");
        let text = "Once upon a time a fox found a lantern.";
        assert_eq!(render(text, &request), render(text, &request));
    }

    #[test]
    fn test_overlay_is_escaped_and_optional() {
        let mut request = GenerationRequest::new("a fox");
        request.num_scenes = 1;
        let text = "Tom & <Jerry>";

        let plain = decode(&render(text, &request)[0]);
        assert!(!plain.contains("Tom"));

        request.include_text_overlay = true;
        let overlaid = decode(&render(text, &request)[0]);
        assert!(overlaid.contains("Tom &amp; &lt;Jerry&gt;"));
    }

    #[test]
    fn test_scene_excerpts_split_words_evenly() {
        let excerpts = scene_excerpts("one two three four five", 2);
        assert_eq!(excerpts, vec!["one two three", "four five"]);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("ééééé", 3), "ééé…");
        assert_eq!(truncate("short", 10), "short");
    }
}
