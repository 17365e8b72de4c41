use super::ProgramFilter;
use super::{CompanyStore, JobStore, MatchStore, ProgramStore, UserStore};
use crate::error::{MentorshipError, StoreError};
use crate::model::{
    new_id, CompanyProfile, ContentKind, Enrollment, EnrollmentStatus, Job, Program,
    ProgramContent, Role, SkillMatchRecord, UserProfile,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// SQLite-backed platform store.
///
/// One connection behind a mutex; the mutex plus `BEGIN IMMEDIATE`
/// transactions serialize every check-then-act path, so the enrollment
/// guarantees hold without any further coordination. The partial unique
/// index on active enrollments backstops the one-program-at-a-time rule
/// at the schema level.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn new(workspace_dir: &Path) -> Result<Self, StoreError> {
        let db_path = workspace_dir.join("campuslink.db");
        Self::open(&db_path)
    }

    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Sqlite(format!("create {}: {e}", parent.display())))?;
        }

        let conn = Connection::open(db_path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: db_path.to_path_buf(),
        })
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// A panic while holding the lock poisons it; surface that as a
    /// store failure instead of panicking every later caller.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Sqlite(format!("connection lock: {e}")))
    }

    fn init_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(
            "-- People (students, alumni, employers)
            CREATE TABLE IF NOT EXISTS user_profiles (
                id          TEXT PRIMARY KEY,
                role        TEXT NOT NULL,
                first_name  TEXT NOT NULL,
                last_name   TEXT NOT NULL,
                email       TEXT NOT NULL,
                bio         TEXT,
                position    TEXT,
                university  TEXT,
                location    TEXT,
                skills      TEXT NOT NULL DEFAULT '[]',
                is_active   INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_role ON user_profiles(role);

            CREATE TABLE IF NOT EXISTS company_profiles (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT,
                industry    TEXT,
                location    TEXT,
                size        TEXT,
                is_active   INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS jobs (
                id          TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                company     TEXT NOT NULL,
                location    TEXT,
                skills      TEXT NOT NULL DEFAULT '[]',
                is_active   INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_jobs_active ON jobs(is_active);

            -- One row per (student, job); recomputation overwrites
            CREATE TABLE IF NOT EXISTS skill_matches (
                student_id                    TEXT NOT NULL,
                job_id                        TEXT NOT NULL,
                matched_skills                TEXT NOT NULL DEFAULT '[]',
                match_percentage              REAL NOT NULL,
                total_job_skills              INTEGER NOT NULL,
                student_matching_skills_count INTEGER NOT NULL,
                updated_at                    TEXT NOT NULL,
                PRIMARY KEY (student_id, job_id)
            );
            CREATE INDEX IF NOT EXISTS idx_matches_job ON skill_matches(job_id);

            CREATE TABLE IF NOT EXISTS programs (
                id          TEXT PRIMARY KEY,
                mentor_id   TEXT NOT NULL,
                title       TEXT NOT NULL,
                description TEXT NOT NULL,
                topics      TEXT NOT NULL DEFAULT '[]',
                capacity    INTEGER NOT NULL CHECK (capacity >= 1),
                cost        REAL NOT NULL DEFAULT 0,
                is_active   INTEGER NOT NULL DEFAULT 1,
                created_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_programs_mentor ON programs(mentor_id);

            -- Enrollment history; rows transition status, never deleted
            CREATE TABLE IF NOT EXISTS enrollments (
                id          TEXT PRIMARY KEY,
                program_id  TEXT NOT NULL REFERENCES programs(id),
                student_id  TEXT NOT NULL,
                status      TEXT NOT NULL,
                enrolled_at TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_enrollments_program ON enrollments(program_id);

            -- One active enrollment per student, system-wide
            CREATE UNIQUE INDEX IF NOT EXISTS idx_enrollments_one_active
                ON enrollments(student_id) WHERE status = 'active';

            -- Attachment references; payloads live in external storage
            CREATE TABLE IF NOT EXISTS program_content (
                id          TEXT PRIMARY KEY,
                program_id  TEXT NOT NULL REFERENCES programs(id),
                title       TEXT NOT NULL,
                description TEXT,
                kind        TEXT NOT NULL,
                content_url TEXT,
                file_name   TEXT,
                file_size   INTEGER,
                posted_by   TEXT NOT NULL,
                created_at  TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_content_program ON program_content(program_id);",
        )?;
        Ok(())
    }
}

// ── Row conversion helpers ───────────────────────────────────────

fn corrupt(
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(corrupt)
}

fn parse_strings(raw: &str) -> Result<Vec<String>, rusqlite::Error> {
    serde_json::from_str(raw).map_err(corrupt)
}

fn encode_strings(values: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(values).map_err(|e| StoreError::Corrupt(e.to_string()))
}

/// LIKE pattern matching `query` as a literal substring; `%`, `_`, and
/// the escape character itself are escaped, paired with `ESCAPE '\'`.
fn like_substring(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    for ch in query.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("%{escaped}%")
}

fn row_to_user(row: &rusqlite::Row<'_>) -> Result<UserProfile, rusqlite::Error> {
    Ok(UserProfile {
        id: row.get(0)?,
        role: row.get::<_, String>(1)?.parse::<Role>().map_err(corrupt)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        bio: row.get(5)?,
        position: row.get(6)?,
        university: row.get(7)?,
        location: row.get(8)?,
        skills: parse_strings(&row.get::<_, String>(9)?)?,
        is_active: row.get(10)?,
        created_at: parse_timestamp(&row.get::<_, String>(11)?)?,
    })
}

const USER_COLUMNS: &str = "id, role, first_name, last_name, email, bio, position, university, \
                            location, skills, is_active, created_at";

fn row_to_company(row: &rusqlite::Row<'_>) -> Result<CompanyProfile, rusqlite::Error> {
    Ok(CompanyProfile {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        industry: row.get(3)?,
        location: row.get(4)?,
        size: row.get(5)?,
        is_active: row.get(6)?,
        created_at: parse_timestamp(&row.get::<_, String>(7)?)?,
    })
}

fn row_to_job(row: &rusqlite::Row<'_>) -> Result<Job, rusqlite::Error> {
    Ok(Job {
        id: row.get(0)?,
        title: row.get(1)?,
        company: row.get(2)?,
        location: row.get(3)?,
        skills: parse_strings(&row.get::<_, String>(4)?)?,
        is_active: row.get(5)?,
        created_at: parse_timestamp(&row.get::<_, String>(6)?)?,
    })
}

fn row_to_match(row: &rusqlite::Row<'_>) -> Result<SkillMatchRecord, rusqlite::Error> {
    Ok(SkillMatchRecord {
        student_id: row.get(0)?,
        job_id: row.get(1)?,
        matched_skills: parse_strings(&row.get::<_, String>(2)?)?,
        match_percentage: row.get(3)?,
        total_job_skills: row.get(4)?,
        student_matching_skills_count: row.get(5)?,
        updated_at: parse_timestamp(&row.get::<_, String>(6)?)?,
    })
}

fn row_to_program(row: &rusqlite::Row<'_>) -> Result<Program, rusqlite::Error> {
    Ok(Program {
        id: row.get(0)?,
        mentor_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        topics: parse_strings(&row.get::<_, String>(4)?)?,
        capacity: row.get(5)?,
        cost: row.get(6)?,
        is_active: row.get(7)?,
        created_at: parse_timestamp(&row.get::<_, String>(8)?)?,
    })
}

const PROGRAM_COLUMNS: &str =
    "id, mentor_id, title, description, topics, capacity, cost, is_active, created_at";

fn row_to_enrollment(row: &rusqlite::Row<'_>) -> Result<Enrollment, rusqlite::Error> {
    Ok(Enrollment {
        id: row.get(0)?,
        program_id: row.get(1)?,
        student_id: row.get(2)?,
        status: row
            .get::<_, String>(3)?
            .parse::<EnrollmentStatus>()
            .map_err(corrupt)?,
        enrolled_at: parse_timestamp(&row.get::<_, String>(4)?)?,
        updated_at: parse_timestamp(&row.get::<_, String>(5)?)?,
    })
}

const ENROLLMENT_COLUMNS: &str = "id, program_id, student_id, status, enrolled_at, updated_at";

fn row_to_content(row: &rusqlite::Row<'_>) -> Result<ProgramContent, rusqlite::Error> {
    Ok(ProgramContent {
        id: row.get(0)?,
        program_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        kind: row
            .get::<_, String>(4)?
            .parse::<ContentKind>()
            .map_err(corrupt)?,
        content_url: row.get(5)?,
        file_name: row.get(6)?,
        file_size: row.get::<_, Option<i64>>(7)?.map(|n| n.unsigned_abs()),
        posted_by: row.get(8)?,
        created_at: parse_timestamp(&row.get::<_, String>(9)?)?,
    })
}

/// Shared WHERE-clause assembly for `list_programs` / `count_programs`.
fn program_filter_sql(filter: &ProgramFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut args: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if filter.active_only {
        clauses.push("is_active = 1".into());
    }
    if let Some(owner) = &filter.owner_id {
        args.push(Box::new(owner.clone()));
        clauses.push(format!("mentor_id = ?{}", args.len()));
    }
    if let Some(search) = &filter.search {
        args.push(Box::new(like_substring(search)));
        let n = args.len();
        clauses.push(format!(
            "(title LIKE ?{n} ESCAPE '\\' OR description LIKE ?{n} ESCAPE '\\')"
        ));
    }
    if let Some(topic) = &filter.topic {
        args.push(Box::new(like_substring(topic)));
        clauses.push(format!("topics LIKE ?{} ESCAPE '\\'", args.len()));
    }
    if let Some(max_cost) = filter.max_cost {
        args.push(Box::new(max_cost));
        clauses.push(format!("cost <= ?{}", args.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };
    (where_sql, args)
}

// ── UserStore ────────────────────────────────────────────────────

#[async_trait]
impl UserStore for SqliteStore {
    async fn find_user(&self, id: &str) -> Result<Option<UserProfile>, StoreError> {
        let conn = self.lock_conn()?;
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM user_profiles WHERE id = ?1"),
                params![id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    async fn upsert_user(&self, user: &UserProfile) -> Result<(), StoreError> {
        let skills = encode_strings(&user.skills)?;
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO user_profiles (id, role, first_name, last_name, email, bio, position,
                                        university, location, skills, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(id) DO UPDATE SET
                role = excluded.role,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                email = excluded.email,
                bio = excluded.bio,
                position = excluded.position,
                university = excluded.university,
                location = excluded.location,
                skills = excluded.skills,
                is_active = excluded.is_active",
            params![
                user.id,
                user.role.to_string(),
                user.first_name,
                user.last_name,
                user.email,
                user.bio,
                user.position,
                user.university,
                user.location,
                skills,
                user.is_active,
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn search_users(
        &self,
        role: Role,
        query: &str,
        limit: u32,
    ) -> Result<Vec<UserProfile>, StoreError> {
        let pattern = like_substring(query);
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user_profiles
             WHERE role = ?1 AND is_active = 1
               AND (first_name LIKE ?2 ESCAPE '\\'
                 OR last_name  LIKE ?2 ESCAPE '\\'
                 OR email      LIKE ?2 ESCAPE '\\'
                 OR bio        LIKE ?2 ESCAPE '\\'
                 OR position   LIKE ?2 ESCAPE '\\'
                 OR university LIKE ?2 ESCAPE '\\')
             ORDER BY created_at DESC
             LIMIT ?3"
        ))?;
        let users = stmt
            .query_map(params![role.to_string(), pattern, limit], row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }
}

// ── CompanyStore ─────────────────────────────────────────────────

#[async_trait]
impl CompanyStore for SqliteStore {
    async fn upsert_company(&self, company: &CompanyProfile) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO company_profiles (id, name, description, industry, location, size,
                                           is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                industry = excluded.industry,
                location = excluded.location,
                size = excluded.size,
                is_active = excluded.is_active",
            params![
                company.id,
                company.name,
                company.description,
                company.industry,
                company.location,
                company.size,
                company.is_active,
                company.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn search_companies(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<CompanyProfile>, StoreError> {
        let pattern = like_substring(query);
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, description, industry, location, size, is_active, created_at
             FROM company_profiles
             WHERE is_active = 1
               AND (name        LIKE ?1 ESCAPE '\\'
                 OR description LIKE ?1 ESCAPE '\\'
                 OR industry    LIKE ?1 ESCAPE '\\')
             ORDER BY created_at DESC
             LIMIT ?2",
        )?;
        let companies = stmt
            .query_map(params![pattern, limit], row_to_company)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(companies)
    }
}

// ── JobStore ─────────────────────────────────────────────────────

#[async_trait]
impl JobStore for SqliteStore {
    async fn find_job(&self, id: &str) -> Result<Option<Job>, StoreError> {
        let conn = self.lock_conn()?;
        let job = conn
            .query_row(
                "SELECT id, title, company, location, skills, is_active, created_at
                 FROM jobs WHERE id = ?1",
                params![id],
                row_to_job,
            )
            .optional()?;
        Ok(job)
    }

    async fn upsert_job(&self, job: &Job) -> Result<(), StoreError> {
        let skills = encode_strings(&job.skills)?;
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO jobs (id, title, company, location, skills, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                company = excluded.company,
                location = excluded.location,
                skills = excluded.skills,
                is_active = excluded.is_active",
            params![
                job.id,
                job.title,
                job.company,
                job.location,
                skills,
                job.is_active,
                job.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn active_jobs(&self) -> Result<Vec<Job>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, company, location, skills, is_active, created_at
             FROM jobs WHERE is_active = 1
             ORDER BY created_at ASC, id ASC",
        )?;
        let jobs = stmt
            .query_map([], row_to_job)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(jobs)
    }
}

// ── MatchStore ───────────────────────────────────────────────────

#[async_trait]
impl MatchStore for SqliteStore {
    async fn upsert_match(&self, record: &SkillMatchRecord) -> Result<(), StoreError> {
        let matched = encode_strings(&record.matched_skills)?;
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO skill_matches (student_id, job_id, matched_skills, match_percentage,
                                        total_job_skills, student_matching_skills_count,
                                        updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(student_id, job_id) DO UPDATE SET
                matched_skills = excluded.matched_skills,
                match_percentage = excluded.match_percentage,
                total_job_skills = excluded.total_job_skills,
                student_matching_skills_count = excluded.student_matching_skills_count,
                updated_at = excluded.updated_at",
            params![
                record.student_id,
                record.job_id,
                matched,
                record.match_percentage,
                record.total_job_skills,
                record.student_matching_skills_count,
                record.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn find_match(
        &self,
        student_id: &str,
        job_id: &str,
    ) -> Result<Option<SkillMatchRecord>, StoreError> {
        let conn = self.lock_conn()?;
        let record = conn
            .query_row(
                "SELECT student_id, job_id, matched_skills, match_percentage, total_job_skills,
                        student_matching_skills_count, updated_at
                 FROM skill_matches WHERE student_id = ?1 AND job_id = ?2",
                params![student_id, job_id],
                row_to_match,
            )
            .optional()?;
        Ok(record)
    }

    async fn matches_for_student(
        &self,
        student_id: &str,
        min_percentage: f64,
    ) -> Result<Vec<SkillMatchRecord>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT student_id, job_id, matched_skills, match_percentage, total_job_skills,
                    student_matching_skills_count, updated_at
             FROM skill_matches
             WHERE student_id = ?1 AND match_percentage >= ?2
             ORDER BY match_percentage DESC",
        )?;
        let records = stmt
            .query_map(params![student_id, min_percentage], row_to_match)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    async fn matches_for_job(
        &self,
        job_id: &str,
        min_percentage: f64,
    ) -> Result<Vec<SkillMatchRecord>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(
            "SELECT student_id, job_id, matched_skills, match_percentage, total_job_skills,
                    student_matching_skills_count, updated_at
             FROM skill_matches
             WHERE job_id = ?1 AND match_percentage >= ?2
             ORDER BY match_percentage DESC",
        )?;
        let records = stmt
            .query_map(params![job_id, min_percentage], row_to_match)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

// ── ProgramStore ─────────────────────────────────────────────────

#[async_trait]
impl ProgramStore for SqliteStore {
    async fn insert_program(&self, program: &Program) -> Result<(), StoreError> {
        let topics = encode_strings(&program.topics)?;
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO programs (id, mentor_id, title, description, topics, capacity, cost,
                                   is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                program.id,
                program.mentor_id,
                program.title,
                program.description,
                topics,
                program.capacity,
                program.cost,
                program.is_active,
                program.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn update_program(&self, program: &Program) -> Result<(), StoreError> {
        let topics = encode_strings(&program.topics)?;
        let conn = self.lock_conn()?;
        conn.execute(
            "UPDATE programs SET
                title = ?2, description = ?3, topics = ?4, capacity = ?5,
                cost = ?6, is_active = ?7
             WHERE id = ?1",
            params![
                program.id,
                program.title,
                program.description,
                topics,
                program.capacity,
                program.cost,
                program.is_active,
            ],
        )?;
        Ok(())
    }

    async fn find_program(&self, id: &str) -> Result<Option<Program>, StoreError> {
        let conn = self.lock_conn()?;
        let program = conn
            .query_row(
                &format!("SELECT {PROGRAM_COLUMNS} FROM programs WHERE id = ?1"),
                params![id],
                row_to_program,
            )
            .optional()?;
        Ok(program)
    }

    async fn list_programs(&self, filter: &ProgramFilter) -> Result<Vec<Program>, StoreError> {
        let (where_sql, mut args) = program_filter_sql(filter);
        // Page and limit are caller-supplied; widen before multiplying.
        let limit = i64::from(filter.limit.max(1));
        let offset = i64::from(filter.page.saturating_sub(1)).saturating_mul(limit);
        args.push(Box::new(limit));
        let limit_idx = args.len();
        args.push(Box::new(offset));
        let offset_idx = args.len();

        let refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|arg| &**arg).collect();
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM programs{where_sql}
             ORDER BY created_at DESC
             LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        ))?;
        let programs = stmt
            .query_map(refs.as_slice(), row_to_program)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(programs)
    }

    async fn count_programs(&self, filter: &ProgramFilter) -> Result<u64, StoreError> {
        let (where_sql, args) = program_filter_sql(filter);
        let refs: Vec<&dyn rusqlite::ToSql> = args.iter().map(|arg| &**arg).collect();
        let conn = self.lock_conn()?;
        let count: u64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM programs{where_sql}"),
            refs.as_slice(),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    async fn enroll(
        &self,
        program: &Program,
        student_id: &str,
    ) -> Result<Enrollment, MentorshipError> {
        let mut conn = self.lock_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;

        // In-program before elsewhere: the caller's own duplicate enroll
        // reads as the more specific conflict.
        let existing: Option<String> = tx
            .query_row(
                "SELECT program_id FROM enrollments
                 WHERE student_id = ?1 AND status = 'active'",
                params![student_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(StoreError::from)?;
        if let Some(enrolled_program) = existing {
            return Err(if enrolled_program == program.id {
                MentorshipError::AlreadyEnrolledInProgram
            } else {
                MentorshipError::AlreadyEnrolledElsewhere
            });
        }

        let active_count: u32 = tx
            .query_row(
                "SELECT COUNT(*) FROM enrollments
                 WHERE program_id = ?1 AND status = 'active'",
                params![program.id],
                |row| row.get(0),
            )
            .map_err(StoreError::from)?;
        if active_count >= program.capacity {
            return Err(MentorshipError::ProgramFull(program.id.clone()));
        }

        let now = Utc::now();
        let enrollment = Enrollment {
            id: new_id(),
            program_id: program.id.clone(),
            student_id: student_id.to_string(),
            status: EnrollmentStatus::Active,
            enrolled_at: now,
            updated_at: now,
        };
        tx.execute(
            &format!(
                "INSERT INTO enrollments ({ENROLLMENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
            ),
            params![
                enrollment.id,
                enrollment.program_id,
                enrollment.student_id,
                enrollment.status.to_string(),
                enrollment.enrolled_at.to_rfc3339(),
                enrollment.updated_at.to_rfc3339(),
            ],
        )
        .map_err(|err| match err {
            // Unique-index backstop for the one-active rule.
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                MentorshipError::AlreadyEnrolledElsewhere
            }
            other => StoreError::from(other).into(),
        })?;
        tx.commit().map_err(StoreError::from)?;
        Ok(enrollment)
    }

    async fn set_enrollment_status(
        &self,
        program_id: &str,
        student_id: &str,
        new_status: EnrollmentStatus,
    ) -> Result<Enrollment, MentorshipError> {
        let mut conn = self.lock_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;

        // The active row is unique per student; fall back to the latest
        // historical row purely to name the rejected transition.
        let current = tx
            .query_row(
                &format!(
                    "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
                     WHERE program_id = ?1 AND student_id = ?2
                     ORDER BY CASE status WHEN 'active' THEN 0 ELSE 1 END, enrolled_at DESC
                     LIMIT 1"
                ),
                params![program_id, student_id],
                row_to_enrollment,
            )
            .optional()
            .map_err(StoreError::from)?;

        let Some(mut enrollment) = current else {
            return Err(MentorshipError::NotEnrolled {
                program_id: program_id.to_string(),
                student_id: student_id.to_string(),
            });
        };

        if enrollment.status != EnrollmentStatus::Active
            || new_status == EnrollmentStatus::Active
        {
            return Err(MentorshipError::InvalidTransition {
                from: enrollment.status,
                to: new_status,
            });
        }

        let now = Utc::now();
        tx.execute(
            "UPDATE enrollments SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![enrollment.id, new_status.to_string(), now.to_rfc3339()],
        )
        .map_err(StoreError::from)?;
        tx.commit().map_err(StoreError::from)?;

        enrollment.status = new_status;
        enrollment.updated_at = now;
        Ok(enrollment)
    }

    async fn enrollments_for_program(
        &self,
        program_id: &str,
    ) -> Result<Vec<Enrollment>, StoreError> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
             WHERE program_id = ?1
             ORDER BY enrolled_at ASC"
        ))?;
        let enrollments = stmt
            .query_map(params![program_id], row_to_enrollment)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(enrollments)
    }

    async fn active_enrollment(
        &self,
        student_id: &str,
    ) -> Result<Option<Enrollment>, StoreError> {
        let conn = self.lock_conn()?;
        let enrollment = conn
            .query_row(
                &format!(
                    "SELECT {ENROLLMENT_COLUMNS} FROM enrollments
                     WHERE student_id = ?1 AND status = 'active'"
                ),
                params![student_id],
                row_to_enrollment,
            )
            .optional()?;
        Ok(enrollment)
    }

    async fn insert_content(&self, content: &ProgramContent) -> Result<(), StoreError> {
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO program_content (id, program_id, title, description, kind, content_url,
                                          file_name, file_size, posted_by, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                content.id,
                content.program_id,
                content.title,
                content.description,
                content.kind.to_string(),
                content.content_url,
                content.file_name,
                content.file_size.map(|n| i64::try_from(n).unwrap_or(i64::MAX)),
                content.posted_by,
                content.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    async fn content_for_program(
        &self,
        program_id: &str,
        kind: Option<ContentKind>,
    ) -> Result<Vec<ProgramContent>, StoreError> {
        let conn = self.lock_conn()?;
        let sql = "SELECT id, program_id, title, description, kind, content_url, file_name,
                          file_size, posted_by, created_at
                   FROM program_content
                   WHERE program_id = ?1 AND (?2 IS NULL OR kind = ?2)
                   ORDER BY created_at DESC";
        let mut stmt = conn.prepare(sql)?;
        let content = stmt
            .query_map(
                params![program_id, kind.map(|k| k.to_string())],
                row_to_content,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(content)
    }
}
