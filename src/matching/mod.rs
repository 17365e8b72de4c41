//! Skill-based job matching: the pure overlap scoring plus the engine
//! that persists per-(student, job) match records.

mod engine;
mod score;

pub use engine::{JobMatch, MatchEngine, MatchReport, PairMatch};
pub use score::{compute_match, MatchBreakdown};
