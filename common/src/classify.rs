use crate::model::{Classification, FunctionalArea, SalaryRange, SeniorityLevel, WorkModel};
use crate::rules::{RuleTable, area_table, seniority_table, work_model_table};
use crate::salary::extract_salary;
use crate::skills::extract_skills;

/// Derives structured fields from a posting's title and page text.
///
/// Classification is a pure lookup over the rule tables and the salary and
/// skill extractors, so running it twice over the same text gives the same
/// fields.
#[derive(Debug, Clone)]
pub struct Classifier {
    seniority: RuleTable<SeniorityLevel>,
    area: RuleTable<FunctionalArea>,
    work_model: RuleTable<WorkModel>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            seniority: seniority_table(),
            area: area_table(),
            work_model: work_model_table(),
        }
    }
}

impl Classifier {
    pub fn rules_version(&self) -> u32 {
        self.seniority.version
    }

    pub fn classify(&self, title: &str, text: &str) -> Classification {
        let full = format!("{title}\n{text}");
        Classification {
            seniority: self.seniority.classify(title, text),
            area: self.area.classify(title, text),
            work_model: self.work_model.classify(title, text),
            salary: extract_salary(&full).unwrap_or_else(SalaryRange::undisclosed),
            skills: extract_skills(&full),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "Sobre a vaga: atuação híbrida em São Paulo.\n\
        Requisitos: Python avançado, experiência com AWS e Docker.\n\
        Diferenciais: Kubernetes.\n\
        Salário: R$ 9.000 - R$ 12.000 + VR";

    #[test]
    fn test_classify_full_listing() {
        let classifier = Classifier::default();
        let result = classifier.classify("Engenheiro de Software Sênior", LISTING);
        assert_eq!(result.seniority, SeniorityLevel::Senior);
        assert_eq!(result.area, FunctionalArea::Technology);
        assert_eq!(result.work_model, WorkModel::Hybrid);
        assert_eq!(result.salary.min, Some(9000));
        assert_eq!(result.salary.max, Some(12000));
        let names: Vec<_> = result.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Python", "AWS", "Docker", "Kubernetes"]);
    }

    #[test]
    fn test_classify_defaults_on_empty_text() {
        let result = Classifier::default().classify("Oportunidade", "");
        assert_eq!(result.seniority, SeniorityLevel::Mid);
        assert_eq!(result.area, FunctionalArea::Operations);
        assert_eq!(result.work_model, WorkModel::Unknown);
        assert!(!result.salary.disclosed);
        assert!(result.skills.is_empty());
    }

    #[test]
    fn test_classify_is_idempotent() {
        let classifier = Classifier::default();
        let first = classifier.classify("Desenvolvedor Backend Pleno", LISTING);
        let second = classifier.classify("Desenvolvedor Backend Pleno", LISTING);
        assert_eq!(first, second);
    }
}
