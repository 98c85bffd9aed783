//! Shared model and classification logic for the vagas collector and API.

pub mod classify;
pub mod model;
pub mod normalize;
pub mod query;
pub mod relevance;
pub mod rules;
pub mod salary;
pub mod skills;
pub mod store;
pub mod terms;

pub use classify::Classifier;
pub use model::{
    Classification, FetchedPage, FunctionalArea, JobRecord, Proficiency, RawPosting, SalaryRange,
    SeniorityLevel, Skill, SkillCategory, WorkModel,
};
pub use normalize::{normalize, quality_score};
pub use query::{JobQuery, MAX_RESULTS, search};
pub use relevance::{RelevanceFilter, Verdict};
pub use store::SupabaseSettings;
