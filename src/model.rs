//! Core platform entities shared across the matching, mentorship, and
//! search services. Persistence shape lives in `store`; these are the
//! domain-facing types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Roles and actors ─────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Student,
    Alumni,
    Employer,
    Admin,
}

/// The authenticated caller of an operation. Authentication itself is
/// handled upstream; the core only sees the resolved identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }
}

// ── People and companies ─────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub university: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

// ── Jobs and skill matches ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Persisted skill-match row. One row per (student, job) pair, ever;
/// recomputation overwrites in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMatchRecord {
    pub student_id: String,
    pub job_id: String,
    /// Job skills the student covers, in the job's listed order and
    /// original casing.
    pub matched_skills: Vec<String>,
    /// `matching_count / total_job_skills * 100`, two decimals.
    pub match_percentage: f64,
    pub total_job_skills: u32,
    pub student_matching_skills_count: u32,
    pub updated_at: DateTime<Utc>,
}

// ── Mentorship ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub id: String,
    /// Owning mentor (alumni). Ownership checks compare against this.
    pub mentor_id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub topics: Vec<String>,
    /// Maximum simultaneously-active enrollments. Always ≥ 1.
    pub capacity: u32,
    #[serde(default)]
    pub cost: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Completed,
    Withdrawn,
}

/// First-class enrollment row referencing its program by id. History is
/// retained: rows transition status but are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: String,
    pub program_id: String,
    pub student_id: String,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A program as presented to a viewer: the raw record plus derived
/// occupancy figures and the viewer's own enrollment flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramView {
    #[serde(flatten)]
    pub program: Program,
    pub active_enrollments: u32,
    pub is_full: bool,
    pub available_slots: u32,
    pub is_enrolled: bool,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContentKind {
    File,
    Link,
    Text,
    Assignment,
}

/// Program attachment. The payload lives in external storage; the core
/// keeps only the opaque reference and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramContent {
    pub id: String,
    pub program_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: ContentKind,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    pub posted_by: String,
    pub created_at: DateTime<Utc>,
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
