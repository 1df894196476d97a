//! Rendering phrase sequences back into caption documents

use std::fmt::Write;

use super::{Phrase, SubtitleFormat};

/// Render phrases in the requested format
pub fn render(phrases: &[Phrase], format: SubtitleFormat) -> String {
    match format {
        SubtitleFormat::Vtt => render_vtt(phrases),
        SubtitleFormat::Srt => render_srt(phrases),
        SubtitleFormat::Text => render_text(phrases),
    }
}

/// MIME type served for a format
pub fn content_type(format: SubtitleFormat) -> &'static str {
    match format {
        SubtitleFormat::Vtt => "text/vtt; charset=utf-8",
        SubtitleFormat::Srt => "application/x-subrip; charset=utf-8",
        SubtitleFormat::Text => "text/plain; charset=utf-8",
    }
}

pub fn render_vtt(phrases: &[Phrase]) -> String {
    let mut out = String::from("WEBVTT\n\n");
    for phrase in phrases {
        let _ = write!(
            out,
            "{} --> {}\n{}\n\n",
            format_timestamp(phrase.start_sec, '.'),
            format_timestamp(phrase.end_sec, '.'),
            phrase.text
        );
    }
    out
}

/// SRT cues are numbered from 1
pub fn render_srt(phrases: &[Phrase]) -> String {
    let mut out = String::new();
    for (index, phrase) in phrases.iter().enumerate() {
        let _ = write!(
            out,
            "{}\n{} --> {}\n{}\n\n",
            index + 1,
            format_timestamp(phrase.start_sec, ','),
            format_timestamp(phrase.end_sec, ','),
            phrase.text
        );
    }
    out
}

pub fn render_text(phrases: &[Phrase]) -> String {
    phrases
        .iter()
        .map(|phrase| phrase.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format seconds as `HH:MM:SS<sep>mmm`
fn format_timestamp(seconds: f64, separator: char) -> String {
    let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;

    format!("{:02}:{:02}:{:02}{}{:03}", hours, minutes, secs, separator, millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subtitles::vtt::parse_vtt;

    fn phrases() -> Vec<Phrase> {
        vec![
            Phrase::new(0, 0.115, 2.423, "Hello world"),
            Phrase::new(1, 3661.5, 3662.0, "An hour in"),
        ]
    }

    #[test]
    fn test_timestamp_formatting() {
        assert_eq!(format_timestamp(3661.0, ','), "01:01:01,000");
        assert_eq!(format_timestamp(1.5, '.'), "00:00:01.500");
        assert_eq!(format_timestamp(0.0, '.'), "00:00:00.000");
        assert_eq!(format_timestamp(-4.0, '.'), "00:00:00.000");
    }

    #[test]
    fn test_srt_output() {
        let srt = render_srt(&phrases());
        assert!(srt.starts_with("1\n00:00:00,115 --> 00:00:02,423\nHello world\n\n"));
        assert!(srt.contains("2\n01:01:01,500 --> 01:01:02,000\nAn hour in\n"));
    }

    #[test]
    fn test_vtt_output_parses_back() {
        let vtt = render(&phrases(), SubtitleFormat::Vtt);
        assert!(vtt.starts_with("WEBVTT\n\n"));
        assert_eq!(parse_vtt(&vtt), phrases());
    }

    #[test]
    fn test_text_output() {
        assert_eq!(render_text(&phrases()), "Hello world\nAn hour in");
        assert_eq!(content_type(SubtitleFormat::Text), "text/plain; charset=utf-8");
    }
}
