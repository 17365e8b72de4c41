//! Mentorship programs: creation, listing, the enrollment state machine
//! with its capacity and one-program-at-a-time guarantees, and content
//! attachment references.

mod service;

pub use service::{
    ContentDraft, MentorshipService, ProgramDraft, ProgramListing, ProgramPatch,
};
