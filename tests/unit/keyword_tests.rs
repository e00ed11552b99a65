/*!
 * Tests for overlay keyword selection
 */

use capforge::keyword::pick_keyword;

#[test]
fn test_pickKeyword_withTiedLengths_shouldPickFirst() {
    assert_eq!(pick_keyword("the quick brown fox jumps"), "quick");
}

#[test]
fn test_pickKeyword_withPunctuation_shouldTrimEdgesAndLowercase() {
    assert_eq!(pick_keyword("Wait... \"Amazing!\" right?"), "amazing");
}

#[test]
fn test_pickKeyword_withDigitsOrInnerPunctuation_shouldSkipToken() {
    assert_eq!(pick_keyword("2024 don't stop"), "stop");
    assert_eq!(pick_keyword("covid19 won"), "won");
}

#[test]
fn test_pickKeyword_withStopwordsInAnyCase_shouldSkipThem() {
    assert_eq!(pick_keyword("THESE Those cats"), "cats");
}

#[test]
fn test_pickKeyword_withNonAsciiLetters_shouldAccept() {
    assert_eq!(pick_keyword("très café"), "très");
}
