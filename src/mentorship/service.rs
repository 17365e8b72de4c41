use crate::error::MentorshipError;
use crate::model::{
    new_id, Actor, ContentKind, Enrollment, EnrollmentStatus, Program, ProgramContent,
    ProgramView, Role,
};
use crate::store::{PlatformStore, ProgramFilter};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fields a mentor supplies when opening a program.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default)]
    pub cost: f64,
}

fn default_capacity() -> u32 {
    1
}

/// Partial update applied by the owning mentor; `None` leaves a field
/// untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub topics: Option<Vec<String>>,
    pub capacity: Option<u32>,
    pub cost: Option<f64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramListing {
    pub count: u32,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
    pub programs: Vec<ProgramView>,
}

/// Attachment reference supplied by a poster. The payload itself lives
/// in external storage; only the reference is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentDraft {
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
}

/// Mentorship program service. Enrollment's check-then-act paths are
/// delegated to the store's serialized transactions; everything the
/// service validates up front (existence, activity, ownership) reads
/// committed state.
pub struct MentorshipService {
    store: Arc<dyn PlatformStore>,
}

impl MentorshipService {
    pub fn new(store: Arc<dyn PlatformStore>) -> Self {
        Self { store }
    }

    async fn program(&self, program_id: &str) -> Result<Program, MentorshipError> {
        self.store
            .find_program(program_id)
            .await?
            .ok_or_else(|| MentorshipError::ProgramNotFound(program_id.to_string()))
    }

    async fn view_for(
        &self,
        program: Program,
        viewer_id: &str,
    ) -> Result<ProgramView, MentorshipError> {
        let enrollments = self.store.enrollments_for_program(&program.id).await?;
        Ok(build_view(program, &enrollments, viewer_id))
    }

    // ── Programs ─────────────────────────────────────────────────

    pub async fn create_program(
        &self,
        owner: &Actor,
        draft: ProgramDraft,
    ) -> Result<Program, MentorshipError> {
        if draft.title.trim().is_empty() || draft.description.trim().is_empty() {
            return Err(MentorshipError::InvalidProgram(
                "title and description are required".into(),
            ));
        }
        if draft.capacity < 1 {
            return Err(MentorshipError::InvalidProgram(
                "capacity must be at least 1".into(),
            ));
        }

        let program = Program {
            id: new_id(),
            mentor_id: owner.id.clone(),
            title: draft.title,
            description: draft.description,
            topics: draft.topics,
            capacity: draft.capacity,
            cost: draft.cost,
            is_active: true,
            created_at: Utc::now(),
        };
        self.store.insert_program(&program).await?;
        tracing::info!(program_id = %program.id, mentor_id = %program.mentor_id, "mentorship program created");
        Ok(program)
    }

    pub async fn update_program(
        &self,
        actor: &Actor,
        program_id: &str,
        patch: ProgramPatch,
    ) -> Result<Program, MentorshipError> {
        let mut program = self.program(program_id).await?;
        if program.mentor_id != actor.id {
            return Err(MentorshipError::NotPermitted);
        }

        if let Some(title) = patch.title {
            if title.trim().is_empty() {
                return Err(MentorshipError::InvalidProgram("title cannot be empty".into()));
            }
            program.title = title;
        }
        if let Some(description) = patch.description {
            if description.trim().is_empty() {
                return Err(MentorshipError::InvalidProgram(
                    "description cannot be empty".into(),
                ));
            }
            program.description = description;
        }
        if let Some(topics) = patch.topics {
            program.topics = topics;
        }
        if let Some(capacity) = patch.capacity {
            if capacity < 1 {
                return Err(MentorshipError::InvalidProgram(
                    "capacity must be at least 1".into(),
                ));
            }
            program.capacity = capacity;
        }
        if let Some(cost) = patch.cost {
            program.cost = cost;
        }
        if let Some(is_active) = patch.is_active {
            program.is_active = is_active;
        }

        self.store.update_program(&program).await?;
        Ok(program)
    }

    /// Program details, restricted to the owner, an enrolled student, or
    /// an admin.
    pub async fn program_details(
        &self,
        actor: &Actor,
        program_id: &str,
    ) -> Result<ProgramView, MentorshipError> {
        let program = self.program(program_id).await?;
        let enrollments = self.store.enrollments_for_program(&program.id).await?;

        let is_owner = program.mentor_id == actor.id;
        let is_enrolled = enrollments
            .iter()
            .any(|e| e.student_id == actor.id && e.status == EnrollmentStatus::Active);
        if !is_owner && !is_enrolled && actor.role != Role::Admin {
            return Err(MentorshipError::NotPermitted);
        }

        Ok(build_view(program, &enrollments, &actor.id))
    }

    /// Paged listing with the viewer's enrollment flag and occupancy
    /// figures on each entry.
    pub async fn list_programs(
        &self,
        viewer: &Actor,
        filter: ProgramFilter,
    ) -> Result<ProgramListing, MentorshipError> {
        let limit = filter.limit.max(1);
        let page = filter.page.max(1);
        let filter = ProgramFilter {
            limit,
            page,
            ..filter
        };

        let total = self.store.count_programs(&filter).await?;
        let programs = self.store.list_programs(&filter).await?;

        let mut views = Vec::with_capacity(programs.len());
        for program in programs {
            views.push(self.view_for(program, &viewer.id).await?);
        }

        Ok(ProgramListing {
            count: u32::try_from(views.len()).unwrap_or(u32::MAX),
            total,
            page,
            pages: u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX),
            programs: views,
        })
    }

    // ── Enrollment state machine ─────────────────────────────────

    /// Enroll a student, upholding both invariants: per-program capacity
    /// and at most one active enrollment per student system-wide.
    ///
    /// Failure order: unknown program, inactive program, already in this
    /// program, already active elsewhere, program full. The conflict
    /// checks and the insert run in one serialized store transaction, so
    /// concurrent calls cannot both pass.
    pub async fn enroll(
        &self,
        student_id: &str,
        program_id: &str,
    ) -> Result<ProgramView, MentorshipError> {
        let program = self.program(program_id).await?;
        if !program.is_active {
            return Err(MentorshipError::ProgramInactive(program_id.to_string()));
        }

        let enrollment = self.store.enroll(&program, student_id).await?;
        tracing::info!(
            program_id = %program.id,
            student_id = %enrollment.student_id,
            "student enrolled"
        );
        self.view_for(program, student_id).await
    }

    /// Transition an enrollment out of `active`. Only the program owner
    /// or the student themself may do this; the freed global slot is
    /// immediately available to a following `enroll`.
    pub async fn set_status(
        &self,
        actor: &Actor,
        program_id: &str,
        student_id: &str,
        new_status: EnrollmentStatus,
    ) -> Result<Enrollment, MentorshipError> {
        let program = self.program(program_id).await?;
        if actor.id != program.mentor_id && actor.id != student_id {
            return Err(MentorshipError::NotPermitted);
        }

        let enrollment = self
            .store
            .set_enrollment_status(program_id, student_id, new_status)
            .await?;
        tracing::info!(
            program_id = %program_id,
            student_id = %student_id,
            status = %new_status,
            "enrollment status updated"
        );
        Ok(enrollment)
    }

    /// The student's single active program, if any.
    pub async fn enrolled_program(
        &self,
        student_id: &str,
    ) -> Result<Option<ProgramView>, MentorshipError> {
        let Some(enrollment) = self.store.active_enrollment(student_id).await? else {
            return Ok(None);
        };
        let program = self.program(&enrollment.program_id).await?;
        Ok(Some(self.view_for(program, student_id).await?))
    }

    // ── Derived queries ──────────────────────────────────────────

    pub async fn active_enrollment_count(
        &self,
        program_id: &str,
    ) -> Result<u32, MentorshipError> {
        let enrollments = self.store.enrollments_for_program(program_id).await?;
        Ok(count_active(&enrollments))
    }

    pub async fn is_full(&self, program_id: &str) -> Result<bool, MentorshipError> {
        let program = self.program(program_id).await?;
        Ok(self.active_enrollment_count(&program.id).await? >= program.capacity)
    }

    pub async fn is_enrolled(
        &self,
        program_id: &str,
        student_id: &str,
    ) -> Result<bool, MentorshipError> {
        let enrollments = self.store.enrollments_for_program(program_id).await?;
        Ok(enrollments
            .iter()
            .any(|e| e.student_id == student_id && e.status == EnrollmentStatus::Active))
    }

    // ── Content attachments ──────────────────────────────────────

    async fn check_content_access(
        &self,
        actor: &Actor,
        program: &Program,
    ) -> Result<(), MentorshipError> {
        if program.mentor_id == actor.id {
            return Ok(());
        }
        if self.is_enrolled(&program.id, &actor.id).await? {
            return Ok(());
        }
        Err(MentorshipError::NotPermitted)
    }

    pub async fn add_content(
        &self,
        actor: &Actor,
        program_id: &str,
        draft: ContentDraft,
    ) -> Result<ProgramContent, MentorshipError> {
        if draft.title.trim().is_empty() {
            return Err(MentorshipError::InvalidContent("title is required".into()));
        }
        let program = self.program(program_id).await?;
        self.check_content_access(actor, &program).await?;

        let content = ProgramContent {
            id: new_id(),
            program_id: program.id,
            title: draft.title,
            description: draft.description,
            kind: draft.kind,
            content_url: draft.content_url,
            file_name: draft.file_name,
            file_size: draft.file_size,
            posted_by: actor.id.clone(),
            created_at: Utc::now(),
        };
        self.store.insert_content(&content).await?;
        Ok(content)
    }

    pub async fn list_content(
        &self,
        actor: &Actor,
        program_id: &str,
        kind: Option<ContentKind>,
    ) -> Result<Vec<ProgramContent>, MentorshipError> {
        let program = self.program(program_id).await?;
        self.check_content_access(actor, &program).await?;
        Ok(self.store.content_for_program(&program.id, kind).await?)
    }
}

fn count_active(enrollments: &[Enrollment]) -> u32 {
    u32::try_from(
        enrollments
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Active)
            .count(),
    )
    .unwrap_or(u32::MAX)
}

fn build_view(program: Program, enrollments: &[Enrollment], viewer_id: &str) -> ProgramView {
    let active = count_active(enrollments);
    let is_enrolled = enrollments
        .iter()
        .any(|e| e.student_id == viewer_id && e.status == EnrollmentStatus::Active);
    ProgramView {
        is_full: active >= program.capacity,
        available_slots: program.capacity.saturating_sub(active),
        active_enrollments: active,
        is_enrolled,
        program,
    }
}
