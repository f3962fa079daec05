/*!
 * Tests for subtitle processing functionality
 */

use srtwai::errors::{ConsistencyError, ParseError};
use srtwai::subtitle_processor::{Cue, SrtCodec, SubtitleDocument, Timestamp};
use crate::common;

fn cue(index: u32, start_ms: u64, end_ms: u64, text: &str) -> Cue {
    Cue::new(
        index,
        Timestamp::from_millis(start_ms),
        Timestamp::from_millis(end_ms),
        vec![text.to_string()],
    )
}

/// Test timestamp parsing and formatting
#[test]
fn test_timestampParsing_withValidTimestamp_shouldParseAndFormat() {
    let ts = "01:23:45,678";
    let parsed = Timestamp::parse(ts).unwrap();
    assert_eq!(parsed.as_millis(), 5_025_678);
    assert_eq!(parsed.to_string(), ts);
}

#[test]
fn test_timestampParsing_withMalformedTimestamp_shouldReturnNone() {
    assert!(Timestamp::parse("1:23:45,678").is_none());
    assert!(Timestamp::parse("01:23:45.678").is_none());
    assert!(Timestamp::parse("01:23:60,000").is_none());
}

#[test]
fn test_parse_withValidSrt_shouldReadAllCues() {
    let doc = SrtCodec::parse(&common::sample_srt(3)).unwrap();

    assert_eq!(doc.len(), 3);
    let first = &doc.cues()[0];
    assert_eq!(first.index, 1);
    assert_eq!(first.start.to_string(), "00:00:01,000");
    assert_eq!(first.end.to_string(), "00:00:03,000");
    assert_eq!(first.text(), "Line 1");
    assert_eq!(doc.cues()[2].start.as_millis(), 7_000);
}

#[test]
fn test_parse_withMultilineText_shouldKeepLines() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nFirst line\nSecond line\n";
    let doc = SrtCodec::parse(srt).unwrap();
    assert_eq!(doc.cues()[0].lines, vec!["First line", "Second line"]);
    assert_eq!(doc.cues()[0].text(), "First line\nSecond line");
}

#[test]
fn test_parse_withCrlfLineEndings_shouldMatchLf() {
    let lf = common::sample_srt(2);
    let crlf = lf.replace('\n', "\r\n");
    assert_eq!(SrtCodec::parse(&crlf).unwrap(), SrtCodec::parse(&lf).unwrap());
}

#[test]
fn test_parse_withNonSequentialNumbers_shouldIndexByPosition() {
    let srt = "7\n00:00:01,000 --> 00:00:02,000\nA\n\n3\n00:00:03,000 --> 00:00:04,000\nB\n";
    let doc = SrtCodec::parse(srt).unwrap();
    let indices: Vec<u32> = doc.cues().iter().map(|c| c.index).collect();
    assert_eq!(indices, vec![1, 2]);
}

#[test]
fn test_parse_withExtraBlankLines_shouldIgnoreThem() {
    let srt = "\n\n1\n00:00:01,000 --> 00:00:02,000\nA\n\n\n\n2\n00:00:03,000 --> 00:00:04,000\nB\n\n\n";
    assert_eq!(SrtCodec::parse(srt).unwrap().len(), 2);
}

#[test]
fn test_parse_withTimingSettings_shouldIgnoreTrailingText() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000 X1:40 X2:600\nA\n";
    let doc = SrtCodec::parse(srt).unwrap();
    assert_eq!(doc.cues()[0].end.as_millis(), 2_000);
}

#[test]
fn test_parse_withEmptyInput_shouldReturnEmptyDocument() {
    let doc = SrtCodec::parse("").unwrap();
    assert!(doc.is_empty());
    assert_eq!(SrtCodec::serialize(&doc), "");

    assert!(SrtCodec::parse("\n  \n").unwrap().is_empty());
}

#[test]
fn test_parse_withInvalidSequenceNumber_shouldReportLine() {
    let srt = "abc\n00:00:01,000 --> 00:00:02,000\nHi\n";
    assert_eq!(
        SrtCodec::parse(srt),
        Err(ParseError::InvalidSequenceNumber {
            line: 1,
            found: "abc".to_string()
        })
    );
}

#[test]
fn test_parse_withInvalidTimestamp_shouldReportLine() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\nOk\n\n2\n00:00:03 --> 00:00:04\nBad\n";
    assert_eq!(
        SrtCodec::parse(srt),
        Err(ParseError::InvalidTimestamp {
            line: 6,
            found: "00:00:03 --> 00:00:04".to_string()
        })
    );
}

#[test]
fn test_parse_withOverflowingHours_shouldFailWithInvalidTimestamp() {
    let timing = "99999999999999999:00:00,000 --> 99999999999999999:00:01,000";
    let srt = format!("1\n{}\nHi\n", timing);
    assert_eq!(
        SrtCodec::parse(&srt),
        Err(ParseError::InvalidTimestamp {
            line: 2,
            found: timing.to_string()
        })
    );
}

#[test]
fn test_parse_withOutOfRangeFields_shouldFailWithInvalidTimestamp() {
    for timing in ["00:61:00,000 --> 00:62:00,000", "00:00:75,000 --> 00:00:76,000"] {
        let srt = format!("1\n{}\nHi\n", timing);
        assert!(
            matches!(SrtCodec::parse(&srt), Err(ParseError::InvalidTimestamp { line: 2, .. })),
            "{} accepted",
            timing
        );
    }
}

#[test]
fn test_timestampFromParts_withHugeHours_shouldSaturate() {
    assert_eq!(Timestamp::from_parts(u64::MAX, 0, 0, 0), Timestamp::from_millis(u64::MAX));
    assert_eq!(Timestamp::parse("5124095576030431:00:00,000"), None);
}

#[test]
fn test_parse_withMissingText_shouldFailWithEmptyText() {
    let srt = "1\n00:00:01,000 --> 00:00:02,000\n\n2\n00:00:03,000 --> 00:00:04,000\nB\n";
    assert_eq!(SrtCodec::parse(srt), Err(ParseError::EmptyText { index: 1 }));
}

#[test]
fn test_parse_withInvertedTimes_shouldFail() {
    let srt = "1\n00:00:05,000 --> 00:00:02,000\nBackwards\n";
    assert_eq!(SrtCodec::parse(srt), Err(ParseError::InvertedTimeRange { index: 1 }));
}

#[test]
fn test_parseBytes_withBomAndLatin1_shouldDecode() {
    let mut bom = vec![0xEF, 0xBB, 0xBF];
    bom.extend_from_slice(common::sample_srt(1).as_bytes());
    assert_eq!(SrtCodec::parse_bytes(&bom).unwrap().len(), 1);

    let mut latin1 = b"1\n00:00:01,000 --> 00:00:02,000\nCaf".to_vec();
    latin1.push(0xE9);
    latin1.push(b'\n');
    let doc = SrtCodec::parse_bytes(&latin1).unwrap();
    assert_eq!(doc.cues()[0].text(), "Caf\u{e9}");
}

#[test]
fn test_parseBytes_withUndecodableBytes_shouldFailWithEncoding() {
    let bytes = [b'1', b'\n', 0x8D, 0x90];
    assert_eq!(SrtCodec::parse_bytes(&bytes), Err(ParseError::Encoding));
}

#[test]
fn test_serialize_withParsedSample_shouldReproduceInput() {
    let srt = common::sample_srt(4);
    let doc = SrtCodec::parse(&srt).unwrap();
    assert_eq!(SrtCodec::serialize(&doc), srt);
    assert_eq!(doc.to_string(), srt);
}

#[test]
fn test_serialize_withGappedNumbers_shouldRenumberFromOne() {
    let srt = "10\n00:00:01,000 --> 00:00:02,000\nA\n\n20\n00:00:03,000 --> 00:00:04,000\nB\n";
    let output = SrtCodec::serialize(&SrtCodec::parse(srt).unwrap());
    assert!(output.starts_with("1\n00:00:01,000"));
    assert!(output.contains("\n\n2\n00:00:03,000"));
    assert!(output.ends_with("B\n"));
}

#[test]
fn test_cueWithText_withNewText_shouldKeepTiming() {
    let original = cue(4, 1_000, 2_000, "Hello");
    let translated = original.with_text("  Bonjour \n\n tout le monde ");

    assert_eq!(translated.index, 4);
    assert_eq!(translated.start, original.start);
    assert_eq!(translated.end, original.end);
    assert_eq!(translated.lines, vec!["Bonjour", "tout le monde"]);
}

#[test]
fn test_documentFromCues_withDecreasingIndices_shouldFail() {
    let result = SubtitleDocument::from_cues(vec![cue(2, 0, 1, "a"), cue(1, 2, 3, "b")]);
    assert_eq!(
        result,
        Err(ConsistencyError::OrderMismatch {
            position: 2,
            expected: 3,
            found: 1
        })
    );
}

#[test]
fn test_documentFromCues_withEmptyText_shouldFail() {
    let empty = Cue::new(1, Timestamp::from_millis(0), Timestamp::from_millis(1), Vec::new());
    assert_eq!(SubtitleDocument::from_cues(vec![empty]), Err(ConsistencyError::InvalidCue(1)));
}

#[test]
fn test_documentGet_withKnownIndex_shouldFindCue() {
    let doc = common::sample_document(5);
    assert_eq!(doc.get(3).map(|c| c.text()), Some("Line 3".to_string()));
    assert!(doc.get(6).is_none());
}

#[test]
fn test_readAndWriteFile_withTempDir_shouldPersistDocument() -> anyhow::Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "movie.en.srt")?;

    let doc = SrtCodec::read_file(&input)?;
    let output = temp_dir.path().join("copy.srt");
    SrtCodec::write_file(&output, &doc)?;

    assert_eq!(SrtCodec::read_file(&output)?, doc);
    Ok(())
}
