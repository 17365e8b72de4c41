use super::score::compute_match;
use crate::error::MatchError;
use crate::model::{Job, SkillMatchRecord, UserProfile};
use crate::store::PlatformStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

/// One scored job inside a batch recomputation, enriched with the job
/// fields callers display alongside the score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMatch {
    pub job_id: String,
    pub job_title: String,
    pub company: String,
    pub location: Option<String>,
    pub matched_skills: Vec<String>,
    pub match_percentage: f64,
    pub total_job_skills: u32,
    pub student_matching_skills_count: u32,
}

/// Outcome of recomputing every active job for one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchReport {
    pub student_id: String,
    pub student_skills: Vec<String>,
    pub total_jobs: u32,
    pub matches: Vec<JobMatch>,
}

/// A single (student, job) score. `calculated` marks a result computed
/// from current profiles because no stored record existed yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairMatch {
    #[serde(flatten)]
    pub record: SkillMatchRecord,
    pub calculated: bool,
}

/// Persisting skill-match service. Scoring itself is pure
/// ([`compute_match`]); the engine adds lookup, batch iteration, and the
/// upsert side effect.
pub struct MatchEngine {
    store: Arc<dyn PlatformStore>,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn PlatformStore>) -> Self {
        Self { store }
    }

    async fn student(&self, student_id: &str) -> Result<UserProfile, MatchError> {
        self.store
            .find_user(student_id)
            .await?
            .ok_or_else(|| MatchError::StudentNotFound(student_id.to_string()))
    }

    /// Score the student against every active job and upsert one record
    /// per job.
    ///
    /// Each job's upsert is independent: a failed write logs a warning
    /// and the batch moves on, so a partial run leaves consistent
    /// per-pair records and a rerun completes the rest. The report is
    /// sorted by percentage descending; ties keep job iteration order.
    pub async fn recompute_for_student(
        &self,
        student_id: &str,
    ) -> Result<MatchReport, MatchError> {
        let student = self.student(student_id).await?;
        if student.skills.iter().all(|s| s.trim().is_empty()) {
            return Err(MatchError::NoSkillsListed(student_id.to_string()));
        }

        let jobs = self.store.active_jobs().await?;
        let mut matches = Vec::with_capacity(jobs.len());

        for job in &jobs {
            let breakdown = compute_match(&student.skills, &job.skills);
            let record = SkillMatchRecord {
                student_id: student.id.clone(),
                job_id: job.id.clone(),
                matched_skills: breakdown.matched_skills.clone(),
                match_percentage: breakdown.match_percentage,
                total_job_skills: breakdown.total_job_skills,
                student_matching_skills_count: breakdown.student_matching_skills_count,
                updated_at: Utc::now(),
            };
            if let Err(err) = self.store.upsert_match(&record).await {
                tracing::warn!(job_id = %job.id, "skipping match record write: {err}");
            }
            matches.push(job_match(job, record));
        }

        // Stable sort: equal scores keep the jobs' iteration order.
        matches.sort_by(|a, b| {
            b.match_percentage
                .partial_cmp(&a.match_percentage)
                .unwrap_or(Ordering::Equal)
        });

        Ok(MatchReport {
            student_id: student.id,
            student_skills: student.skills,
            total_jobs: u32::try_from(jobs.len()).unwrap_or(u32::MAX),
            matches,
        })
    }

    /// Stored records for a student at or above `min_match`, best first.
    pub async fn matches_for_student(
        &self,
        student_id: &str,
        min_match: f64,
    ) -> Result<Vec<SkillMatchRecord>, MatchError> {
        Ok(self
            .store
            .matches_for_student(student_id, min_match)
            .await?)
    }

    /// Stored candidate records for a job, best first.
    pub async fn candidates_for_job(
        &self,
        job_id: &str,
        min_match: f64,
    ) -> Result<Vec<SkillMatchRecord>, MatchError> {
        if self.store.find_job(job_id).await?.is_none() {
            return Err(MatchError::JobNotFound(job_id.to_string()));
        }
        Ok(self.store.matches_for_job(job_id, min_match).await?)
    }

    /// The stored record for a pair, or a fresh on-the-fly score from
    /// current profiles when none has been persisted. The fresh score is
    /// not written back.
    pub async fn match_for_pair(
        &self,
        student_id: &str,
        job_id: &str,
    ) -> Result<PairMatch, MatchError> {
        if let Some(record) = self.store.find_match(student_id, job_id).await? {
            return Ok(PairMatch {
                record,
                calculated: false,
            });
        }

        let student = self.student(student_id).await?;
        let job = self
            .store
            .find_job(job_id)
            .await?
            .ok_or_else(|| MatchError::JobNotFound(job_id.to_string()))?;

        let breakdown = compute_match(&student.skills, &job.skills);
        Ok(PairMatch {
            record: SkillMatchRecord {
                student_id: student.id,
                job_id: job.id,
                matched_skills: breakdown.matched_skills,
                match_percentage: breakdown.match_percentage,
                total_job_skills: breakdown.total_job_skills,
                student_matching_skills_count: breakdown.student_matching_skills_count,
                updated_at: Utc::now(),
            },
            calculated: true,
        })
    }
}

fn job_match(job: &Job, record: SkillMatchRecord) -> JobMatch {
    JobMatch {
        job_id: record.job_id,
        job_title: job.title.clone(),
        company: job.company.clone(),
        location: job.location.clone(),
        matched_skills: record.matched_skills,
        match_percentage: record.match_percentage,
        total_job_skills: record.total_job_skills,
        student_matching_skills_count: record.student_matching_skills_count,
    }
}
