//! Sales-flow glue: field scraping, coverage lookup, and prompt assembly.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::prompt::SYSTEM_PROMPT;
use crate::store::{ChatTurn, ClientRecord};

/// Reply used when the completion service fails.
pub const COMPLETION_FALLBACK_TEXT: &str = "Não consegui processar sua solicitação.";

static CITY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(teresina|guadalupe)\b").unwrap());
static NEIGHBORHOOD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)bairro\s+([\wÀ-ÿ]+)").unwrap());
static ZONE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)zona\s+(urbana|rural)").unwrap());
static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:me\s+chamo|meu\s+nome\s+é|nome:\s*)\s*([A-Za-zÀ-ÿ ]{2,50})").unwrap());
static CPF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{11})\b").unwrap());
static PLAN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:plano|quero|contratar)\s*[:\s]\s*(100|200|300|500|básico|intermediário|premium)").unwrap()
});

/// Phrases in a generated reply that signal the registration wrapped up.
const REGISTRATION_INDICATORS: &[&str] = &[
    "encaminhando sua solicitação",
    "entrará em contato em breve",
    "agendar a instalação",
    "obrigado pela confiança",
    "agradecemos pela preferência",
    "cadastro concluído",
];

/// Fields scraped from one inbound message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadInfo {
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub zone: Option<String>,
    pub name: Option<String>,
    pub cpf: Option<String>,
    pub plan: Option<String>,
}

pub fn extract_lead(text: &str) -> LeadInfo {
    let capture = |re: &Regex| {
        re.captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    };

    LeadInfo {
        city: capture(&CITY_RE).map(|city| city.to_lowercase()),
        neighborhood: capture(&NEIGHBORHOOD_RE).map(|n| n.to_lowercase()),
        zone: capture(&ZONE_RE).map(|zone| zone.to_lowercase()),
        name: capture(&NAME_RE),
        cpf: capture(&CPF_RE),
        plan: capture(&PLAN_RE).map(|plan| canonical_plan(&plan)),
    }
}

fn canonical_plan(mention: &str) -> String {
    match mention.to_lowercase().as_str() {
        "100" | "básico" => "100MB".into(),
        "200" | "intermediário" => "200MB".into(),
        "300" | "premium" => "300MB".into(),
        "500" => "500MB".into(),
        other => other.to_string(),
    }
}

/// Fills the scraped fields into the record without clobbering what the
/// store already knows.
pub fn apply_lead(record: &mut ClientRecord, lead: &LeadInfo) {
    if record.city.is_none() {
        record.city = lead.city.clone();
    }
    if record.neighborhood.is_none() {
        record.neighborhood = lead.neighborhood.clone();
    }
    if record.name.is_none() {
        record.name = lead.name.clone();
    }
    if record.cpf.is_none() {
        record.cpf = lead.cpf.clone();
    }
    if record.chosen_plan.is_none() {
        record.chosen_plan = lead.plan.clone();
    }
}

/// Coverage verdict for a region. `covered: None` means more information is
/// needed before answering (Teresina without a neighborhood).
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub covered: Option<bool>,
    pub plans: Vec<(&'static str, &'static str)>,
}

const PLAN_TABLE: &[(&str, &str)] = &[
    ("100MB", "R$ 99,90"),
    ("200MB", "R$ 129,90"),
    ("300MB", "R$ 149,90"),
    ("500MB", "R$ 199,90"),
];

pub fn check_coverage(city: &str, neighborhood: Option<&str>, zone: Option<&str>) -> Coverage {
    let city = city.to_lowercase();
    match city.as_str() {
        "teresina" => {
            if neighborhood.is_none() {
                return Coverage {
                    covered: None,
                    plans: Vec::new(),
                };
            }
        }
        "guadalupe" => {
            if zone == Some("rural") {
                return Coverage {
                    covered: Some(false),
                    plans: Vec::new(),
                };
            }
        }
        _ => {
            return Coverage {
                covered: Some(false),
                plans: Vec::new(),
            };
        }
    }
    Coverage {
        covered: Some(true),
        plans: PLAN_TABLE.to_vec(),
    }
}

/// Assembles the turn sequence for the completion service: persona plus
/// caller context, persisted history, then the current message.
pub fn build_turns(
    record: &ClientRecord,
    coverage: Option<&Coverage>,
    history: &[ChatTurn],
    user_text: &str,
) -> Vec<ChatTurn> {
    let mut system = String::from(SYSTEM_PROMPT);

    if let Some(city) = &record.city {
        system.push_str(&format!("\n\nO cliente está interessado na cidade: {city}"));
        if let Some(neighborhood) = &record.neighborhood {
            system.push_str(&format!("\nBairro informado: {neighborhood}"));
        }
    }
    if let Some(coverage) = coverage {
        match coverage.covered {
            Some(true) => {
                system.push_str("\nESTA REGIÃO POSSUI COBERTURA!");
                if !coverage.plans.is_empty() {
                    system.push_str("\nPlanos disponíveis para esta região:");
                    for (plan, price) in &coverage.plans {
                        system.push_str(&format!("\n- {plan}: {price}"));
                    }
                }
            }
            Some(false) => system.push_str("\nESTA REGIÃO NÃO POSSUI COBERTURA!"),
            None => system.push_str("\nPergunte o bairro antes de confirmar a cobertura."),
        }
    }

    let mut turns = Vec::with_capacity(history.len() + 2);
    turns.push(ChatTurn::system(system));
    turns.extend(history.iter().cloned());
    turns.push(ChatTurn::user(user_text));
    turns
}

/// Whether a generated reply signals the registration is done.
pub fn registration_indicated(reply: &str) -> bool {
    let reply = reply.to_lowercase();
    REGISTRATION_INDICATORS
        .iter()
        .any(|indicator| reply.contains(indicator))
}

/// Whether the record carries everything installation scheduling needs.
pub fn record_complete(record: &ClientRecord) -> bool {
    record.name.is_some()
        && record.cpf.is_some()
        && record.city.is_some()
        && record.neighborhood.is_some()
        && record.chosen_plan.is_some()
}
