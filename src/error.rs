use crate::model::EnrollmentStatus;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `CampusLink`.
///
/// Each domain service defines its own error enum. Handlers match on these
/// to pick a response status; the binary edge continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum PlatformError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Skill matching ──────────────────────────────────────────────────
    #[error("matching: {0}")]
    Match(#[from] MatchError),

    // ── Mentorship / enrollment ─────────────────────────────────────────
    #[error("mentorship: {0}")]
    Mentorship(#[from] MentorshipError),

    // ── Federated search ────────────────────────────────────────────────
    #[error("search: {0}")]
    Search(#[from] SearchError),

    // ── Persistence ─────────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Skill matching errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("student {0} not found")]
    StudentNotFound(String),

    #[error("job {0} not found")]
    JobNotFound(String),

    /// The student exists but their profile lists no skills. Distinct
    /// from a job with no required skills, which scores 0 without error.
    #[error("student {0} has no skills listed in profile")]
    NoSkillsListed(String),

    #[error("store: {0}")]
    Store(#[from] StoreError),
}

// ─── Mentorship errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MentorshipError {
    #[error("mentorship program {0} not found")]
    ProgramNotFound(String),

    #[error("mentorship program {0} is not active")]
    ProgramInactive(String),

    #[error("student is already enrolled in this program")]
    AlreadyEnrolledInProgram,

    /// The one-program-at-a-time rule: an active enrollment anywhere in
    /// the system blocks enrolling elsewhere.
    #[error("student already has an active enrollment in another program")]
    AlreadyEnrolledElsewhere,

    #[error("mentorship program {0} is full")]
    ProgramFull(String),

    #[error("student {student_id} has no enrollment in program {program_id}")]
    NotEnrolled {
        program_id: String,
        student_id: String,
    },

    #[error("invalid enrollment transition: {from} -> {to}")]
    InvalidTransition {
        from: EnrollmentStatus,
        to: EnrollmentStatus,
    },

    #[error("actor is not permitted to perform this operation")]
    NotPermitted,

    #[error("invalid program: {0}")]
    InvalidProgram(String),

    #[error("invalid content: {0}")]
    InvalidContent(String),

    #[error("store: {0}")]
    Store(#[from] StoreError),
}

// ─── Search errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search query is required")]
    EmptyQuery,
}

// ─── Store errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err.to_string())
    }
}
