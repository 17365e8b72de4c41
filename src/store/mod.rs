//! Repository seams between the domain services and persistence.
//!
//! One trait per entity family, consumed as `Arc<dyn Trait>` so tests can
//! substitute fixtures. The SQLite implementation backs all of them; the
//! traits spell out which operations must be atomic, because the enroll
//! and upsert guarantees live at this boundary, not above it.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::{MentorshipError, StoreError};
use crate::model::{
    CompanyProfile, Enrollment, EnrollmentStatus, Job, Program, ProgramContent, Role,
    SkillMatchRecord, UserProfile,
};
use async_trait::async_trait;

// ── Users ────────────────────────────────────────────────────────

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<UserProfile>, StoreError>;

    async fn upsert_user(&self, user: &UserProfile) -> Result<(), StoreError>;

    /// Case-insensitive substring match over name, email, bio, position,
    /// and university for active users of the given role.
    async fn search_users(
        &self,
        role: Role,
        query: &str,
        limit: u32,
    ) -> Result<Vec<UserProfile>, StoreError>;
}

// ── Companies ────────────────────────────────────────────────────

#[async_trait]
pub trait CompanyStore: Send + Sync {
    async fn upsert_company(&self, company: &CompanyProfile) -> Result<(), StoreError>;

    /// Case-insensitive substring match over name, description, and
    /// industry for active companies.
    async fn search_companies(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<CompanyProfile>, StoreError>;
}

// ── Jobs ─────────────────────────────────────────────────────────

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_job(&self, id: &str) -> Result<Option<Job>, StoreError>;

    async fn upsert_job(&self, job: &Job) -> Result<(), StoreError>;

    /// Active postings in stable creation order.
    async fn active_jobs(&self) -> Result<Vec<Job>, StoreError>;
}

// ── Skill matches ────────────────────────────────────────────────

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Insert-or-overwrite keyed by (`student_id`, `job_id`). Atomic:
    /// concurrent recomputation of the same pair never yields two rows,
    /// and the later write's values win.
    async fn upsert_match(&self, record: &SkillMatchRecord) -> Result<(), StoreError>;

    async fn find_match(
        &self,
        student_id: &str,
        job_id: &str,
    ) -> Result<Option<SkillMatchRecord>, StoreError>;

    /// Records at or above `min_percentage`, descending by percentage.
    async fn matches_for_student(
        &self,
        student_id: &str,
        min_percentage: f64,
    ) -> Result<Vec<SkillMatchRecord>, StoreError>;

    async fn matches_for_job(
        &self,
        job_id: &str,
        min_percentage: f64,
    ) -> Result<Vec<SkillMatchRecord>, StoreError>;
}

// ── Programs and enrollments ─────────────────────────────────────

/// Listing filter. `owner_id` narrows to one mentor's programs;
/// `active_only = false` is reserved for admin visibility.
#[derive(Debug, Clone, Default)]
pub struct ProgramFilter {
    pub owner_id: Option<String>,
    pub active_only: bool,
    pub search: Option<String>,
    pub topic: Option<String>,
    pub max_cost: Option<f64>,
    pub page: u32,
    pub limit: u32,
}

#[async_trait]
pub trait ProgramStore: Send + Sync {
    async fn insert_program(&self, program: &Program) -> Result<(), StoreError>;

    async fn update_program(&self, program: &Program) -> Result<(), StoreError>;

    async fn find_program(&self, id: &str) -> Result<Option<Program>, StoreError>;

    async fn list_programs(&self, filter: &ProgramFilter) -> Result<Vec<Program>, StoreError>;

    async fn count_programs(&self, filter: &ProgramFilter) -> Result<u64, StoreError>;

    /// The guarded check-then-insert. In one serialized transaction:
    /// reject if the student already holds an active enrollment (here or
    /// anywhere else), reject if active count ≥ capacity, otherwise
    /// insert the active row. A partial unique index on
    /// (`student_id` WHERE status = 'active') backstops the global rule.
    async fn enroll(
        &self,
        program: &Program,
        student_id: &str,
    ) -> Result<Enrollment, MentorshipError>;

    /// Transition the student's enrollment in this program. Only
    /// active → completed | withdrawn is legal; the freed slot is
    /// visible to subsequent `enroll` calls immediately.
    async fn set_enrollment_status(
        &self,
        program_id: &str,
        student_id: &str,
        new_status: EnrollmentStatus,
    ) -> Result<Enrollment, MentorshipError>;

    async fn enrollments_for_program(
        &self,
        program_id: &str,
    ) -> Result<Vec<Enrollment>, StoreError>;

    /// The student's single active enrollment, if any.
    async fn active_enrollment(
        &self,
        student_id: &str,
    ) -> Result<Option<Enrollment>, StoreError>;

    async fn insert_content(&self, content: &ProgramContent) -> Result<(), StoreError>;

    async fn content_for_program(
        &self,
        program_id: &str,
        kind: Option<crate::model::ContentKind>,
    ) -> Result<Vec<ProgramContent>, StoreError>;
}

/// Everything the platform persists, behind one object-safe bound so the
/// services can share a single handle.
pub trait PlatformStore:
    UserStore + CompanyStore + JobStore + MatchStore + ProgramStore
{
}

impl<T> PlatformStore for T where
    T: UserStore + CompanyStore + JobStore + MatchStore + ProgramStore
{
}
