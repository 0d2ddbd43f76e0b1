//! Skill, email and phone extraction over the text of a CV.
//!
//! Two independent passes feed the skill set:
//! 1. recognizer entities labelled as skills, normalized to `Capitalized` form
//! 2. forced tokens for technologies found by case-insensitive substring checks
//!
//! `.Net` and `Dotnet` both land in the set when both spellings occur; no canonical
//! skill naming has been agreed, so they are left distinct.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::errors::AppError;
use crate::recognizer::EntityRecognizer;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid email regex")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:\+\d{1,2}\s*)?(?:\b\d{1,3}[\s.-]*)?(?:\(\d{3}\)|\b\d{3})[\s.-]*\d{3}[\s.-]*\d{4}\b",
    )
    .expect("valid phone regex")
});

/// (substring looked for in the lower-cased text, token added to the skill set)
const FORCED_SKILLS: &[(&str, &str)] = &[("dotnet", "Dotnet"), (".net", ".Net"), ("java", "Java")];

/// Everything extracted from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub skills: BTreeSet<String>,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
}

/// Wire shape of a successful extraction.
#[derive(Debug, Serialize)]
pub struct SkillsResponse {
    pub skills: Vec<String>,
    pub emails: String,
    pub phones: String,
}

impl From<ScanReport> for SkillsResponse {
    fn from(report: ScanReport) -> Self {
        Self {
            skills: report.skills.into_iter().collect(),
            emails: report.emails.join(", "),
            phones: report.phones.join(", "),
        }
    }
}

/// Runs the recognizer, forced-inclusion and regex passes over `text`.
pub async fn scan(text: &str, recognizer: &dyn EntityRecognizer) -> Result<ScanReport, AppError> {
    let mut skills = BTreeSet::new();

    for entity in recognizer.recognize(text).await? {
        debug!(
            label = %entity.label,
            start = entity.start,
            end = entity.end,
            "Recognized {:?}",
            entity.text
        );
        if entity.is_skill() {
            skills.insert(normalize_skill(&entity.text));
        }
    }

    skills.extend(forced_skills(text));

    Ok(ScanReport {
        skills,
        emails: find_emails(text),
        phones: find_phones(text),
    })
}

/// Lower-cases, then upper-cases the first character: "JAVA" → "Java", ".NET" → ".net".
pub fn normalize_skill(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn forced_skills(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    FORCED_SKILLS
        .iter()
        .filter(|(needle, _)| lower.contains(needle))
        .map(|(_, skill)| skill.to_string())
        .collect()
}

pub fn find_emails(text: &str) -> Vec<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn find_phones(text: &str) -> Vec<String> {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
