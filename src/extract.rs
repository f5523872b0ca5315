// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Regex-based field normalization for Aadhaar card OCR text
//!
//! Every extractor takes the raw OCR text for one semantic region and returns
//! the cleanest extractable value, or an empty string when no pattern matches.
//! OCR output is noisy (misread characters, broken lines, stray punctuation),
//! so each field has a narrow pattern tuned to the printed card layout rather
//! than a general NLP model. Callers must treat empty strings as a normal
//! outcome, not an error.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// 4-4-4 digit groups with optional single spaces, as a standalone token.
    static ref AADHAAR_NUMBER: Regex =
        Regex::new(r"\b\d{4}\s?\d{4}\s?\d{4}\b").unwrap();

    /// Chains of title-cased words ("Ravi Shankar", "Priya").
    static ref TITLE_CASED_WORDS: Regex =
        Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").unwrap();

    /// "Government of India" header words that must never count as a name.
    static ref HEADER_WORDS: Regex = Regex::new(r"\b(?:Government|India)\b").unwrap();

    /// "S/O", "S.O", "D/O" etc. relation label, punctuation and case loose.
    static ref RELATION_LABEL: Regex =
        Regex::new(r"(?i)(?:S.?O|D.?O)[:\s]*").unwrap();

    /// Space-separated alphabetic words right after a relation label.
    static ref RELATION_NAME: Regex =
        Regex::new(r"^[A-Za-z]+(?: [A-Za-z]+)*").unwrap();

    /// Strict DD/MM/YYYY date token.
    static ref DATE_OF_BIRTH: Regex =
        Regex::new(r"\b\d{2}/\d{2}/\d{4}\b").unwrap();

    /// Standalone 4-digit token, the YOB fallback.
    static ref YEAR_OF_BIRTH: Regex = Regex::new(r"\b\d{4}\b").unwrap();

    /// "Address:" label up to and including the first 6-digit postal code,
    /// allowed to span line breaks.
    static ref ADDRESS: Regex =
        Regex::new(r"Address:\s*((?s:.)*?\d{6})").unwrap();
}

/// Extracts the Aadhaar number, stripping the embedded group spaces.
///
/// Only the first 4-4-4 digit run is used; later occurrences are ignored.
pub fn extract_aadhaar_number(input: &str) -> String {
    AADHAAR_NUMBER
        .find(input)
        .map(|m| m.as_str().replace(' ', ""))
        .unwrap_or_default()
}

/// Extracts the card holder's name.
///
/// Header words ("Government", "India") are scrubbed first so that a clean
/// title-cased run adjoining the header still matches; the first remaining
/// candidate wins. Fully upper-case OCR noise never matches the pattern;
/// that robustness gap is inherited from the heuristic.
pub fn extract_name(input: &str) -> String {
    let scrubbed = HEADER_WORDS.replace_all(input, "");
    TITLE_CASED_WORDS
        .find(&scrubbed)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Extracts the father's (or guardian's) name following an S/O or D/O label.
///
/// Unlike [`extract_name`], the LAST label occurrence that is actually
/// followed by a name wins: the relation line is printed near the bottom of
/// the back side, after any stray header text that also matches. Label hits
/// with no name after them (OCR noise like a bare "So 99") are skipped
/// rather than blanking the result.
pub fn extract_fathers_name(input: &str) -> String {
    RELATION_LABEL
        .find_iter(input)
        .filter_map(|label| RELATION_NAME.find(&input[label.end()..]))
        .last()
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Extracts a strict DD/MM/YYYY date of birth.
pub fn extract_date_of_birth(input: &str) -> String {
    DATE_OF_BIRTH
        .find(input)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Extracts a standalone 4-digit year of birth.
///
/// Fallback for cards that only print a year; use when
/// [`extract_date_of_birth`] yields nothing.
pub fn extract_year_of_birth(input: &str) -> String {
    YEAR_OF_BIRTH
        .find(input)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Extracts the gender marker.
///
/// "Female" is checked before "Male" ("Female" contains "male", so the order
/// matters); anything else resolves to "Other".
pub fn extract_gender(input: &str) -> String {
    if input.contains("Female") || input.contains("FEMALE") {
        return "Female".to_string();
    }
    if input.contains("Male") || input.contains("MALE") {
        return "Male".to_string();
    }
    "Other".to_string()
}

/// Extracts the address block following the literal "Address:" label.
///
/// Captures everything (including line breaks) up to and including the first
/// 6-digit postal code; without an anchored postal code there is no match.
pub fn extract_address(input: &str) -> String {
    ADDRESS
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}
