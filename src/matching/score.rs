//! Pure skill-overlap scoring. No I/O and no clock; everything here is a
//! function of its arguments, which keeps the contract unit-testable.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result of scoring one student skill set against one job's required
/// skills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchBreakdown {
    /// Covered job skills, in the job's listed order and original
    /// casing (trimmed).
    pub matched_skills: Vec<String>,
    /// 0–100, two decimals, rounded half-away-from-zero.
    pub match_percentage: f64,
    pub total_job_skills: u32,
    pub student_matching_skills_count: u32,
}

impl MatchBreakdown {
    fn empty() -> Self {
        Self {
            matched_skills: Vec::new(),
            match_percentage: 0.0,
            total_job_skills: 0,
            student_matching_skills_count: 0,
        }
    }
}

/// Lowercased, trimmed comparison form. Used only for membership tests,
/// never surfaced in results.
fn normalize(skill: &str) -> String {
    skill.trim().to_lowercase()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Score a student's skills against a job's required skills.
///
/// A job skill counts as matched when its normalized form is a member of
/// the student's normalized skill set: whole-token membership, not
/// substring. Duplicate job skills (by normalized form) collapse to
/// their first occurrence, and blank tokens are ignored entirely, so
/// `total_job_skills` is the size of the job's skill *set*.
///
/// A job with no required skills yields the zero breakdown; that is a
/// defined result, not an error.
pub fn compute_match(student_skills: &[String], job_skills: &[String]) -> MatchBreakdown {
    if job_skills.is_empty() {
        return MatchBreakdown::empty();
    }

    let student_set: HashSet<String> = student_skills
        .iter()
        .map(|s| normalize(s))
        .filter(|s| !s.is_empty())
        .collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut matched_skills: Vec<String> = Vec::new();
    let mut total: u32 = 0;

    for skill in job_skills {
        let normalized = normalize(skill);
        if normalized.is_empty() || !seen.insert(normalized.clone()) {
            continue;
        }
        total += 1;
        if student_set.contains(&normalized) {
            matched_skills.push(skill.trim().to_string());
        }
    }

    let matching_count = u32::try_from(matched_skills.len()).unwrap_or(u32::MAX);
    let match_percentage = if total == 0 {
        0.0
    } else {
        round2(f64::from(matching_count) / f64::from(total) * 100.0)
    };

    MatchBreakdown {
        matched_skills,
        match_percentage,
        total_job_skills: total,
        student_matching_skills_count: matching_count,
    }
}
