//! Design pattern advisor
//!
//! Flags code shapes that a well-known pattern would simplify, plus the one
//! pattern that is usually misapplied (Singleton).

use super::solid::{literal_dispatch, switch_statements};
use super::source::{functions, is_offset_suppressed, mask_non_code};
use super::{violation, with_example, Rule, RuleInput};
use crate::models::{Severity, Violation};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub const RULES: &[Rule] = &[
    Rule {
        id: "StrategyOpportunity",
        name: "Strategy",
        weight: 30,
        cross_file: false,
        check: check_strategy,
    },
    Rule {
        id: "FactoryOpportunity",
        name: "Factory",
        weight: 25,
        cross_file: false,
        check: check_factory,
    },
    Rule {
        id: "SingletonMisuse",
        name: "Singleton",
        weight: 25,
        cross_file: false,
        check: check_singleton,
    },
    Rule {
        id: "ObserverOpportunity",
        name: "Observer",
        weight: 20,
        cross_file: false,
        check: check_observer,
    },
];

/// Branches selecting behaviour before a strategy pays off
const STRATEGY_BRANCHES: usize = 3;
/// Distinct concrete types built by one conditional function
const FACTORY_PRODUCTS: usize = 3;

pub fn check_strategy(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut hits = switch_statements(input.content, input.language, STRATEGY_BRANCHES);
    hits.extend(literal_dispatch(input.content, STRATEGY_BRANCHES));
    hits.sort_by_key(|(_, _, line)| *line);

    hits.into_iter()
        .map(|(subject, arms, line)| {
            with_example(
                violation(
                    Severity::Low,
                    "Strategy",
                    input.at(line),
                    format!("Behaviour selected by {} branches on '{}'", arms, subject),
                    "Extract each branch into a strategy object and select it by key.",
                ),
                "if kind == 'a': price = base * 0.9\nelif kind == 'b': price = base * 0.8",
                "class PricingStrategy(Protocol):\n    def price(self, base: float) -> float: ...\nSTRATEGIES[kind].price(base)",
            )
        })
        .collect()
}

fn construction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:\bnew\s+|\breturn\s+|=\s*)([A-Z]\w*)\s*\(").expect("valid regex")
    })
}

fn conditional_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:if|elif|case|switch|match)\b").expect("valid regex"))
}

pub fn check_factory(input: &RuleInput<'_>) -> Vec<Violation> {
    let code = mask_non_code(input.content, input.language);
    let lines: Vec<&str> = code.lines().collect();
    let mut out = Vec::new();

    for func in functions(input.content, input.language) {
        let body = lines
            .get(func.line_start..func.line_end)
            .map(|ls| ls.join("\n"))
            .unwrap_or_default();
        if !conditional_re().is_match(&body) {
            continue;
        }
        let products: BTreeSet<&str> = construction_re()
            .captures_iter(&body)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
            .filter(|name| {
                !matches!(
                    *name,
                    "Error" | "Exception" | "Date" | "Map" | "Set" | "Promise"
                )
            })
            .collect();
        if products.len() < FACTORY_PRODUCTS {
            continue;
        }
        out.push(violation(
            Severity::Low,
            "Factory",
            input.at(func.line_start),
            format!(
                "'{}' chooses between {} concrete types: {}",
                func.name,
                products.len(),
                products.iter().copied().collect::<Vec<_>>().join(", ")
            ),
            "Move the creation logic into a factory so callers depend on the common abstraction.",
        ));
    }
    out
}

fn singleton_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)(?:\b(?:static\s+)?\w*\s*getInstance\s*\(|\bstatic\s+(?:readonly\s+|private\s+)*(?:\w+\s+)?_?instance\b|^\s*_instance\s*(?::[^=]+)?=\s*None\b)",
        )
        .expect("valid regex")
    })
}

pub fn check_singleton(input: &RuleInput<'_>) -> Vec<Violation> {
    let code = mask_non_code(input.content, input.language);
    // The declaration is enough; one finding per file
    singleton_re()
        .find_iter(&code)
        .map(|m| m.start() + (m.as_str().len() - m.as_str().trim_start().len()))
        .find(|&offset| !is_offset_suppressed(input.content, offset))
        .map(|offset| {
            violation(
                Severity::Medium,
                "Singleton",
                input.at_offset(offset),
                "Singleton introduces hidden global state and hard-wires its clients",
                "Create one instance at the composition root and inject it where needed.",
            )
        })
        .into_iter()
        .collect()
}

fn polling_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bsetInterval\s*\(|\bwhile\s*\(?\s*(?:true|True|1)\s*\)?\s*[:{]")
            .expect("valid regex")
    })
}

fn sleep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:time\.sleep|Thread\.sleep|sleep|setTimeout|Task\.Delay|asyncio\.sleep)\s*\(",
        )
        .expect("valid regex")
    })
}

pub fn check_observer(input: &RuleInput<'_>) -> Vec<Violation> {
    let code = mask_non_code(input.content, input.language);
    let lines: Vec<&str> = code.lines().collect();
    let mut out = Vec::new();
    for m in polling_re().find_iter(&code) {
        let line = super::source::line_of(&code, m.start());
        let is_interval = m.as_str().starts_with("setInterval");
        let block_end = super::source::block_end(&lines, line, input.language);
        let body = lines.get(line - 1..block_end).map(|ls| ls.join("\n")).unwrap_or_default();
        if !is_interval && !sleep_re().is_match(&body) {
            continue;
        }
        if is_offset_suppressed(input.content, m.start()) {
            continue;
        }
        out.push(violation(
            Severity::Low,
            "Observer",
            input.at(line),
            "State is polled on a timer instead of pushed on change",
            "Let the subject notify registered observers when its state changes.",
        ));
    }
    out
}
