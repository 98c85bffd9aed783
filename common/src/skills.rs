//! Skill vocabulary and extraction.

use std::sync::LazyLock;

use crate::model::{Proficiency, Skill, SkillCategory};
use crate::terms::{TermSet, fold};

/// Bytes on either side of a skill mention searched for qualifiers.
pub const QUALIFIER_WINDOW: usize = 80;

pub const WEIGHT_REQUIRED: f32 = 1.0;
pub const WEIGHT_PREFERRED: f32 = 0.5;
pub const WEIGHT_UNSTATED: f32 = 0.75;

struct SkillDef {
    name: &'static str,
    category: SkillCategory,
    aliases: TermSet,
}

static VOCABULARY: LazyLock<Vec<SkillDef>> = LazyLock::new(|| {
    use SkillCategory::*;
    let defs: &[(&str, SkillCategory, &[&str])] = &[
        ("Python", Language, &["python"]),
        ("Java", Language, &["java"]),
        ("JavaScript", Language, &["javascript", "js"]),
        ("TypeScript", Language, &["typescript", "ts"]),
        ("Go", Language, &["golang"]),
        ("Rust", Language, &["rust"]),
        ("C#", Language, &["c#", ".net", "dotnet"]),
        ("C++", Language, &["c++"]),
        ("PHP", Language, &["php"]),
        ("Ruby", Language, &["ruby"]),
        ("Kotlin", Language, &["kotlin"]),
        ("Swift", Language, &["swift"]),
        ("SQL", Language, &["sql"]),
        ("React", Framework, &["react", "react.js", "reactjs"]),
        ("Angular", Framework, &["angular"]),
        ("Vue", Framework, &["vue", "vue.js", "vuejs"]),
        ("Node.js", Framework, &["node.js", "nodejs", "node"]),
        ("Django", Framework, &["django"]),
        ("Spring", Framework, &["spring", "spring boot"]),
        ("Flutter", Framework, &["flutter"]),
        ("PostgreSQL", Database, &["postgresql", "postgres"]),
        ("MySQL", Database, &["mysql"]),
        ("MongoDB", Database, &["mongodb", "mongo"]),
        ("Redis", Database, &["redis"]),
        ("AWS", Cloud, &["aws", "amazon web services"]),
        ("Azure", Cloud, &["azure"]),
        ("GCP", Cloud, &["gcp", "google cloud"]),
        ("Docker", Devops, &["docker"]),
        ("Kubernetes", Devops, &["kubernetes", "k8s"]),
        ("Terraform", Devops, &["terraform"]),
        ("Git", Devops, &["git"]),
        ("CI/CD", Devops, &["ci/cd", "github actions", "jenkins"]),
        ("Power BI", Data, &["power bi", "powerbi"]),
        ("Excel", Data, &["excel"]),
        ("Spark", Data, &["spark", "pyspark"]),
        ("Machine Learning", Data, &["machine learning", "aprendizado de maquina"]),
        ("Inglês", Soft, &["ingles", "english"]),
        ("Comunicação", Soft, &["comunicacao", "communication"]),
        ("Liderança", Soft, &["lideranca", "leadership"]),
    ];
    defs.iter()
        .map(|(name, category, aliases)| SkillDef {
            name: *name,
            category: *category,
            aliases: TermSet::new(aliases.iter()),
        })
        .collect()
});

static EXPERT: LazyLock<TermSet> =
    LazyLock::new(|| TermSet::new(["expert", "especialista", "dominio", "profundo", "profundos"]));
static ADVANCED: LazyLock<TermSet> =
    LazyLock::new(|| TermSet::new(["avancado", "avancados", "advanced", "solido", "solida", "solidos", "solidas", "strong", "fluente", "fluent"]));
static INTERMEDIATE: LazyLock<TermSet> =
    LazyLock::new(|| TermSet::new(["intermediario", "intermediate", "bom conhecimento", "bons conhecimentos"]));
static BASIC: LazyLock<TermSet> =
    LazyLock::new(|| TermSet::new(["basico", "basic", "nocoes", "nocao", "familiaridade", "familiarity"]));

static REQUIRED: LazyLock<TermSet> = LazyLock::new(|| {
    TermSet::new([
        "obrigatorio", "obrigatoria", "requisito", "requisitos", "required", "must", "necessario",
        "imprescindivel", "essencial",
    ])
});
static PREFERRED: LazyLock<TermSet> = LazyLock::new(|| {
    TermSet::new([
        "desejavel", "desejaveis", "diferencial", "diferenciais", "preferred", "nice to have", "plus", "bonus",
    ])
});

/// Text around `at`, clipped to char boundaries.
fn window(folded: &str, at: usize) -> (&str, usize) {
    let mut start = at.saturating_sub(QUALIFIER_WINDOW);
    while !folded.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (at + QUALIFIER_WINDOW).min(folded.len());
    while !folded.is_char_boundary(end) {
        end += 1;
    }
    (&folded[start..end], at - start)
}

/// Nearest qualifier wins; ties go to the earlier entry.
fn nearest<T: Copy>(text: &str, at: usize, options: &[(&TermSet, T)]) -> Option<T> {
    options
        .iter()
        .filter_map(|(terms, value)| terms.nearest(text, at).map(|d| (d, *value)))
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, value)| value)
}

fn proficiency_near(text: &str, at: usize) -> Proficiency {
    nearest(
        text,
        at,
        &[
            (&*EXPERT, Proficiency::Expert),
            (&*ADVANCED, Proficiency::Advanced),
            (&*INTERMEDIATE, Proficiency::Intermediate),
            (&*BASIC, Proficiency::Basic),
        ],
    )
    .unwrap_or(Proficiency::Unspecified)
}

fn weight_near(text: &str, at: usize) -> f32 {
    nearest(
        text,
        at,
        &[(&*REQUIRED, WEIGHT_REQUIRED), (&*PREFERRED, WEIGHT_PREFERRED)],
    )
    .unwrap_or(WEIGHT_UNSTATED)
}

/// Skills from the vocabulary that appear in the text, in vocabulary order.
pub fn extract_skills(text: &str) -> Vec<Skill> {
    let folded = fold(text);
    VOCABULARY
        .iter()
        .filter_map(|def| {
            let at = def.aliases.first_position(&folded)?;
            let (context, offset) = window(&folded, at);
            Some(Skill {
                name: def.name.to_string(),
                category: def.category,
                proficiency: proficiency_near(context, offset),
                weight: weight_near(context, offset),
            })
        })
        .collect()
}
