use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Coarse career stage of a posting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeniorityLevel {
    Intern,
    Junior,
    Mid,
    Senior,
    Manager,
    Director,
    Executive,
}

impl SeniorityLevel {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Intern => "intern",
            Self::Junior => "junior",
            Self::Mid => "mid",
            Self::Senior => "senior",
            Self::Manager => "manager",
            Self::Director => "director",
            Self::Executive => "executive",
        }
    }

    /// Label used by Brazilian job boards (`?level=Pleno` keeps working).
    pub fn label_pt(&self) -> &'static str {
        match self {
            Self::Intern => "Estágio",
            Self::Junior => "Júnior",
            Self::Mid => "Pleno",
            Self::Senior => "Sênior",
            Self::Manager => "Gerente",
            Self::Director => "Diretor",
            Self::Executive => "Executivo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionalArea {
    Technology,
    Sales,
    Marketing,
    Finance,
    Hr,
    Product,
    Legal,
    Operations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkModel {
    Remote,
    Hybrid,
    Onsite,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Language,
    Framework,
    Database,
    Cloud,
    Devops,
    Data,
    Soft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Proficiency {
    Basic,
    Intermediate,
    Advanced,
    Expert,
    Unspecified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    pub category: SkillCategory,
    pub proficiency: Proficiency,
    /// 1.0 required, 0.5 preferred, 0.75 when the text does not say.
    pub weight: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryRange {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub currency: String,
    pub disclosed: bool,
}

impl SalaryRange {
    pub fn undisclosed() -> Self {
        Self {
            min: None,
            max: None,
            currency: "BRL".to_string(),
            disclosed: false,
        }
    }
}

/// A search result that passed the relevance filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPosting {
    pub title: String,
    pub url: String,
    pub snippet: String,
    pub published_at: Option<DateTime<Utc>>,
    pub geo_hint: Option<String>,
    pub source: String,
}

/// Detail page text, or the sentinel left behind when every attempt failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedPage {
    pub url: String,
    pub text: String,
    pub fetched: bool,
    pub attempts: u32,
}

impl FetchedPage {
    pub const UNAVAILABLE_TEXT: &'static str = "could not fetch";

    pub fn unavailable(url: &str, attempts: u32) -> Self {
        Self {
            url: url.to_string(),
            text: Self::UNAVAILABLE_TEXT.to_string(),
            fetched: false,
            attempts,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub seniority: SeniorityLevel,
    pub area: FunctionalArea,
    pub work_model: WorkModel,
    pub salary: SalaryRange,
    pub skills: Vec<Skill>,
}

/// The persisted record shape consumed by the front end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: Uuid,
    pub external_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub level: SeniorityLevel,
    pub area: FunctionalArea,
    pub work_model: WorkModel,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_currency: String,
    pub salary_disclosed: bool,
    #[serde(default)]
    pub skills: Vec<Skill>,
    pub description: String,
    pub url: String,
    pub source: String,
    pub date_posted: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub quality_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}
