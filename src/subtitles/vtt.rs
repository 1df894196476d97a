//! WebVTT cue parsing
//!
//! Only the cue timing lines and their text are read. Headers, notes,
//! styling blocks and cue identifiers are skipped because they never follow
//! a timing line directly. Malformed input never fails the parse: anything
//! that does not look like a cue is ignored.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Phrase;

/// `00:00:00.115 --> 00:00:02.423`, optionally followed by cue settings
static TIMING_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{2}):(\d{2}):(\d{2}\.\d{3})\s*-->\s*(\d{2}):(\d{2}):(\d{2}\.\d{3})")
        .expect("timing line pattern is valid")
});

/// A line that starts with a timestamp ends the text of the previous cue
static LEADING_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{2}\.\d{3}").expect("timestamp pattern is valid"));

static MARKUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<[^>]*>").expect("markup pattern is valid"));

/// Parse a WebVTT document into phrases.
///
/// Text lines of a cue are joined with single spaces and stripped of
/// `<...>` markup. Cues whose text is empty after stripping, or whose end
/// lies before their start, are dropped. Phrase ids count up from zero over
/// the kept cues only.
pub fn parse_vtt(content: &str) -> Vec<Phrase> {
    let lines: Vec<&str> = content.lines().map(str::trim).collect();
    let mut phrases = Vec::new();
    let mut next_id = 0u32;
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = TIMING_LINE.captures(lines[i]) else {
            i += 1;
            continue;
        };

        let start_sec = to_seconds(&caps[1], &caps[2], &caps[3]);
        let end_sec = to_seconds(&caps[4], &caps[5], &caps[6]);

        let mut text_lines = Vec::new();
        let mut j = i + 1;
        while j < lines.len() {
            let line = lines[j];
            if line.is_empty() || LEADING_TIMESTAMP.is_match(line) {
                break;
            }
            text_lines.push(line);
            j += 1;
        }

        let joined = text_lines.join(" ");
        let text = MARKUP.replace_all(&joined, "");
        let text = text.trim();

        if let (Some(start_sec), Some(end_sec)) = (start_sec, end_sec) {
            if !text.is_empty() && end_sec >= start_sec {
                phrases.push(Phrase::new(next_id, start_sec, end_sec, text));
                next_id += 1;
            }
        }

        i = j;
    }

    phrases
}

fn to_seconds(hours: &str, minutes: &str, seconds: &str) -> Option<f64> {
    let hours: f64 = hours.parse().ok()?;
    let minutes: f64 = minutes.parse().ok()?;
    let seconds: f64 = seconds.parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "WEBVTT\n\
Kind: captions\n\
Language: nl\n\
\n\
00:00:00.115 --> 00:00:02.423 align:start position:0%\n\
Goedemorgen <c>allemaal</c>\n\
\n\
00:00:02.423 --> 00:00:05.000\n\
vandaag gaan we\n\
samen koken\n\
\n\
01:02:03.500 --> 01:02:04.000\n\
<i>laatste zin</i>\n";

    #[test]
    fn test_single_cue() {
        let phrases = parse_vtt("00:00:00.115 --> 00:00:02.423\nHello <i>world</i>\n\n");

        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0], Phrase::new(0, 0.115, 2.423, "Hello world"));
    }

    #[test]
    fn test_multiple_cues_with_header() {
        let phrases = parse_vtt(SAMPLE);

        assert_eq!(phrases.len(), 3);
        assert_eq!(phrases[0].text, "Goedemorgen allemaal");
        assert_eq!(phrases[1].text, "vandaag gaan we samen koken");
        assert_eq!(phrases[1].start_sec, 2.423);
        assert_eq!(phrases[1].end_sec, 5.0);
        assert_eq!(phrases[2].text, "laatste zin");
        assert!((phrases[2].start_sec - 3723.5).abs() < 1e-9);
        assert!((phrases[2].end_sec - 3724.0).abs() < 1e-9);

        let ids: Vec<u32> = phrases.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_markup_only_cue_is_dropped() {
        let doc = "00:00:01.000 --> 00:00:02.000\n<c>\n</c>\n\n\
00:00:02.000 --> 00:00:03.000\nkept\n";
        let phrases = parse_vtt(doc);

        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].id, 0);
        assert_eq!(phrases[0].text, "kept");
    }

    #[test]
    fn test_cue_without_text_is_dropped() {
        let doc = "00:00:01.000 --> 00:00:02.000\n\n00:00:03.000 --> 00:00:04.000\nnext\n";
        let phrases = parse_vtt(doc);

        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].text, "next");
        assert_eq!(phrases[0].start_sec, 3.0);
    }

    #[test]
    fn test_next_timestamp_ends_cue_text() {
        // Auto-generated tracks often omit the blank line between cues
        let doc = "00:00:01.000 --> 00:00:02.000\nfirst\n00:00:02.000 --> 00:00:03.000\nsecond\n";
        let phrases = parse_vtt(doc);

        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[0].text, "first");
        assert_eq!(phrases[1].text, "second");
    }

    #[test]
    fn test_inverted_cue_is_dropped() {
        let doc = "00:00:05.000 --> 00:00:04.000\nbackwards\n\n00:00:06.000 --> 00:00:07.000\nforwards\n";
        let phrases = parse_vtt(doc);

        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].text, "forwards");
        assert!(phrases.iter().all(|p| p.end_sec >= p.start_sec));
    }

    #[test]
    fn test_malformed_input_is_skipped() {
        assert!(parse_vtt("").is_empty());
        assert!(parse_vtt("WEBVTT\n\nnot a cue\n0:00:01.000 --> 0:00:02.000\nshort hours\n").is_empty());
        assert!(parse_vtt("00:00:01,000 --> 00:00:02,000\nsrt style commas\n").is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let doc = "WEBVTT\r\n\r\n00:00:01.000 --> 00:00:02.500\r\nwindows line\r\n\r\n";
        let phrases = parse_vtt(doc);

        assert_eq!(phrases.len(), 1);
        assert_eq!(phrases[0].text, "windows line");
        assert_eq!(phrases[0].end_sec, 2.5);
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse_vtt(SAMPLE), parse_vtt(SAMPLE));
    }
}
