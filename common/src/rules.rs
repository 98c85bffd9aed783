//! Ordered keyword rule tables for the classifier.
//!
//! Every table is a list of `{terms, result}` rules evaluated top to bottom;
//! the first rule with a matching term wins. Bump [`RULES_VERSION`] whenever
//! a table changes so stored records can be traced to the rules that
//! produced them.

use crate::model::{FunctionalArea, SeniorityLevel, WorkModel};
use crate::terms::{TermSet, fold};

pub const RULES_VERSION: u32 = 3;

#[derive(Debug, Clone)]
pub struct Rule<T> {
    pub terms: TermSet,
    pub result: T,
}

#[derive(Debug, Clone)]
pub struct RuleTable<T> {
    pub version: u32,
    pub rules: Vec<Rule<T>>,
    pub default: T,
}

impl<T: Copy> RuleTable<T> {
    pub fn new(default: T, rules: &[(&[&str], T)]) -> Self {
        Self {
            version: RULES_VERSION,
            rules: rules
                .iter()
                .map(|(terms, result)| Rule {
                    terms: TermSet::new(terms.iter()),
                    result: *result,
                })
                .collect(),
            default,
        }
    }

    /// First matching rule over the folded text, if any.
    pub fn lookup(&self, folded: &str) -> Option<T> {
        self.rules
            .iter()
            .find(|rule| rule.terms.matches_any(folded))
            .map(|rule| rule.result)
    }

    /// Looks at the title first and falls back to the body.
    pub fn classify(&self, title: &str, body: &str) -> T {
        self.lookup(&fold(title))
            .or_else(|| self.lookup(&fold(body)))
            .unwrap_or(self.default)
    }
}

pub fn seniority_table() -> RuleTable<SeniorityLevel> {
    use SeniorityLevel::*;
    RuleTable::new(
        Mid,
        &[
            (
                &["estagio", "estagiario", "estagiaria", "intern", "internship", "trainee"],
                Intern,
            ),
            (
                &["ceo", "cto", "cfo", "coo", "cio", "c-level", "vp", "vice-presidente", "vice president", "chief"],
                Executive,
            ),
            (&["diretor", "diretora", "director", "head of", "head de"], Director),
            (
                &["gerente", "manager", "coordenador", "coordenadora", "supervisor", "supervisora"],
                Manager,
            ),
            (
                &["senior", "sr", "especialista", "lead", "lider tecnico", "tech lead", "staff", "principal"],
                Senior,
            ),
            (&["junior", "jr", "entry level", "assistente", "auxiliar"], Junior),
            (&["pleno", "pl", "mid-level", "mid level", "analista"], Mid),
        ],
    )
}

pub fn area_table() -> RuleTable<FunctionalArea> {
    use FunctionalArea::*;
    RuleTable::new(
        Operations,
        &[
            (&["juridico", "advogado", "advogada", "legal counsel", "compliance", "paralegal"], Legal),
            (
                &["rh", "recursos humanos", "recrutador", "recrutadora", "talent acquisition", "people", "gente e gestao", "departamento pessoal"],
                Hr,
            ),
            (
                &["financeiro", "financas", "contabil", "contador", "contadora", "controller", "fiscal", "tesouraria", "finance", "accounting"],
                Finance,
            ),
            (
                &["vendas", "vendedor", "vendedora", "comercial", "sales", "account executive", "sdr", "bdr", "inside sales"],
                Sales,
            ),
            (
                &["marketing", "growth", "seo", "social media", "conteudo", "copywriter", "branding"],
                Marketing,
            ),
            (
                &["product manager", "product owner", "gerente de produto", "produto", "po", "ux", "ui/ux", "product designer"],
                Product,
            ),
            (
                &["desenvolvedor", "desenvolvedora", "developer", "programador", "programadora", "engenheiro de software", "software", "backend", "back-end", "frontend", "front-end", "full stack", "fullstack", "devops", "sre", "dados", "data engineer", "data scientist", "data analyst", "ti", "qa", "cloud", "mobile"],
                Technology,
            ),
            (
                &["operacoes", "operations", "logistica", "supply chain", "atendimento", "suporte", "facilities"],
                Operations,
            ),
        ],
    )
}

pub fn work_model_table() -> RuleTable<WorkModel> {
    use WorkModel::*;
    RuleTable::new(
        Unknown,
        &[
            (&["hibrido", "hibrida", "hybrid"], Hybrid),
            (
                &["remoto", "remota", "remote", "home office", "anywhere", "teletrabalho", "100% remoto"],
                Remote,
            ),
            (&["presencial", "on-site", "onsite", "no escritorio", "in-office"], Onsite),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_wins_over_body() {
        let table = seniority_table();
        assert_eq!(
            table.classify("Desenvolvedor Júnior", "Reporta ao gerente sênior"),
            SeniorityLevel::Junior
        );
    }

    #[test]
    fn test_body_used_when_title_silent() {
        let table = work_model_table();
        assert_eq!(
            table.classify("Engenheiro de Dados", "Modelo de trabalho: híbrido em SP"),
            WorkModel::Hybrid
        );
    }

    #[test]
    fn test_default_when_nothing_matches() {
        assert_eq!(seniority_table().classify("Vaga", ""), SeniorityLevel::Mid);
        assert_eq!(work_model_table().classify("Vaga", ""), WorkModel::Unknown);
    }

    #[test]
    fn test_rule_order_decides_ties() {
        // manager is listed before senior
        assert_eq!(
            seniority_table().classify("Senior Engineering Manager", ""),
            SeniorityLevel::Manager
        );
        assert_eq!(
            area_table().classify("Product Manager", ""),
            FunctionalArea::Product
        );
    }

    #[test]
    fn test_tables_carry_version() {
        assert_eq!(area_table().version, RULES_VERSION);
    }
}
