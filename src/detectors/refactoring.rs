//! Refactoring suggestions (Fowler's catalog)

use super::solid::{literal_dispatch, switch_statements};
use super::source::{class_blocks, functions, mask_non_code, FunctionSig};
use super::{violation, with_example, Rule, RuleInput};
use crate::models::{Severity, Violation};
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

pub const RULES: &[Rule] = &[
    Rule {
        id: "ExtractMethod",
        name: "Extract Method",
        weight: 25,
        cross_file: false,
        check: check_extract_method,
    },
    Rule {
        id: "ExtractClass",
        name: "Extract Class",
        weight: 25,
        cross_file: false,
        check: check_extract_class,
    },
    Rule {
        id: "ReplaceConditional",
        name: "Replace Conditional with Polymorphism",
        weight: 20,
        cross_file: false,
        check: check_replace_conditional,
    },
    Rule {
        id: "IntroduceParameterObject",
        name: "Introduce Parameter Object",
        weight: 15,
        cross_file: false,
        check: check_parameter_object,
    },
    Rule {
        id: "RemoveDuplication",
        name: "Remove Duplication",
        weight: 15,
        cross_file: false,
        check: check_duplication,
    },
];

const LONG_METHOD_LINES: usize = 30;
const MAX_NESTING: usize = 4;
const LARGE_CLASS_LINES: usize = 300;
const MAX_FIELDS: usize = 10;
const MAX_PARAMS: usize = 4;
/// Shared parameters that make two signatures a data clump
const CLUMP_SIZE: usize = 3;
/// Window of consecutive lines compared for duplication
const DUPLICATE_WINDOW: usize = 3;

fn nesting_depth(lines: &[&str]) -> usize {
    let indents: Vec<usize> = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| {
            let ws = &l[..l.len() - l.trim_start().len()];
            ws.chars().map(|c| if c == '\t' { 4 } else { 1 }).sum()
        })
        .collect();
    let Some(&base) = indents.first() else {
        return 0;
    };
    let unit = indents
        .iter()
        .filter(|&&i| i > base)
        .map(|&i| i - base)
        .min()
        .unwrap_or(4)
        .max(1);
    // Statements directly in the body sit at level 1
    indents
        .iter()
        .map(|&i| i.saturating_sub(base) / unit)
        .max()
        .unwrap_or(0)
        .saturating_sub(1)
}

pub fn check_extract_method(input: &RuleInput<'_>) -> Vec<Violation> {
    let code = mask_non_code(input.content, input.language);
    let lines: Vec<&str> = code.lines().collect();
    let mut out = Vec::new();

    for func in functions(input.content, input.language) {
        let body = lines.get(func.line_start - 1..func.line_end).unwrap_or(&[]);
        let depth = nesting_depth(body);
        if func.lines() > LONG_METHOD_LINES {
            out.push(with_example(
                violation(
                    Severity::Medium,
                    "ExtractMethod",
                    input.at(func.line_start),
                    format!("'{}' is {} lines long", func.name, func.lines()),
                    "Extract each commented or blank-line-separated step into a named method.",
                ),
                "def process_order(...):\n    # Calculate total\n    ...\n    # Apply discount\n    ...",
                "def process_order(...):\n    total = self._calculate_total(items)\n    total = self._apply_discount(total, order_type)",
            ));
        } else if depth > MAX_NESTING {
            out.push(violation(
                Severity::Low,
                "ExtractMethod",
                input.at(func.line_start),
                format!("'{}' nests {} levels deep", func.name, depth),
                "Extract the inner blocks into methods or use guard clauses.",
            ));
        }
    }
    out
}

fn field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:self|this)\.(\w+)\s*=[^=]").expect("valid regex"))
}

pub fn check_extract_class(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut out = Vec::new();
    for class in class_blocks(input.content, input.language) {
        let fields: BTreeSet<&str> = field_re()
            .captures_iter(&class.body)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
            .collect();
        if class.lines() > LARGE_CLASS_LINES {
            out.push(violation(
                Severity::Medium,
                "ExtractClass",
                input.at(&class.name),
                format!("Class '{}' spans {} lines", class.name, class.lines()),
                "Find fields and methods that are used together and move them into a new class.",
            ));
        } else if fields.len() > MAX_FIELDS {
            out.push(violation(
                Severity::Low,
                "ExtractClass",
                input.at(&class.name),
                format!("Class '{}' holds {} fields", class.name, fields.len()),
                "Group fields that change together into their own class.",
            ));
        }
    }
    out
}

fn type_test_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bisinstance\s*\(|\binstanceof\s+[A-Z]|\btypeof\s+\w+\s*===")
            .expect("valid regex")
    })
}

pub fn check_replace_conditional(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut hits = switch_statements(input.content, input.language, 3);
    hits.extend(literal_dispatch(input.content, 3));
    hits.sort_by_key(|(_, _, line)| *line);
    let mut out: Vec<Violation> = hits
        .into_iter()
        .map(|(subject, arms, line)| {
            violation(
                Severity::Medium,
                "ReplaceConditional",
                input.at(line),
                format!(
                    "Conditional with {} branches on '{}' selects type-specific behaviour",
                    arms, subject
                ),
                "Replace the conditional with a polymorphic method on one subclass per branch.",
            )
        })
        .collect();

    let code = mask_non_code(input.content, input.language);
    let lines: Vec<&str> = code.lines().collect();
    for func in functions(input.content, input.language) {
        let body = lines
            .get(func.line_start - 1..func.line_end)
            .map(|ls| ls.join("\n"))
            .unwrap_or_default();
        let type_tests = type_test_re().find_iter(&body).count();
        if type_tests >= 2 {
            out.push(violation(
                Severity::Medium,
                "ReplaceConditional",
                input.at(func.line_start),
                format!("'{}' branches on runtime types {} times", func.name, type_tests),
                "Move each type-specific branch into a method on that type.",
            ));
        }
    }
    out
}

fn param_name(param: &str) -> String {
    let p = param.split('=').next().unwrap_or(param).trim();
    // `name: Type` (Python, TS) or `Type name` (Java, C#)
    let name = match p.split_once(':') {
        Some((name, _)) => name.trim(),
        None => p.rsplit(char::is_whitespace).next().unwrap_or(p),
    };
    name.trim_start_matches(['*', '&', '?']).trim_end_matches('?').to_string()
}

pub fn check_parameter_object(input: &RuleInput<'_>) -> Vec<Violation> {
    let funcs: Vec<FunctionSig> = functions(input.content, input.language);
    let mut out = Vec::new();

    for func in &funcs {
        if func.params.len() > MAX_PARAMS {
            out.push(with_example(
                violation(
                    Severity::Low,
                    "IntroduceParameterObject",
                    input.at(func.line_start),
                    format!("'{}' takes {} parameters", func.name, func.params.len()),
                    "Bundle parameters that travel together into one object.",
                ),
                "process_order(order_type, customer_name, email, items, discount_code)",
                "process_order(OrderRequest(order_type, customer, items, discount_code))",
            ));
        }
    }

    // Data clumps: the same group of parameters repeated across signatures
    let names: Vec<BTreeSet<String>> = funcs
        .iter()
        .map(|f| f.params.iter().map(|p| param_name(p)).collect())
        .collect();
    let mut reported = vec![false; funcs.len()];
    for i in 0..funcs.len() {
        for j in (i + 1)..funcs.len() {
            if reported[j] || funcs[j].params.len() > MAX_PARAMS {
                continue;
            }
            let shared: Vec<&String> = names[i].intersection(&names[j]).collect();
            if shared.len() < CLUMP_SIZE {
                continue;
            }
            reported[j] = true;
            out.push(violation(
                Severity::Low,
                "IntroduceParameterObject",
                input.at(funcs[j].line_start),
                format!(
                    "'{}' and '{}' share the parameters {}",
                    funcs[i].name,
                    funcs[j].name,
                    shared.iter().map(|s| s.as_str()).collect::<Vec<_>>().join(", ")
                ),
                "Introduce a parameter object for the repeated group.",
            ));
        }
    }
    out
}

fn is_trivial(line: &str) -> bool {
    line.len() < 10
        || line.chars().all(|c| "{}()[];,".contains(c) || c.is_whitespace())
        || matches!(line, "else:" | "} else {" | "return" | "pass" | "try:" | "finally:")
}

pub fn check_duplication(input: &RuleInput<'_>) -> Vec<Violation> {
    let code = mask_non_code(input.content, input.language);
    let lines: Vec<(usize, &str)> = code
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .collect();

    let mut first_seen: HashMap<Vec<&str>, usize> = HashMap::new();
    let mut out = Vec::new();
    let mut skip_until = 0;
    for window in lines.windows(DUPLICATE_WINDOW) {
        let start = window[0].0;
        if window.iter().any(|(_, l)| is_trivial(l)) {
            continue;
        }
        let key: Vec<&str> = window.iter().map(|(_, l)| *l).collect();
        match first_seen.get(&key) {
            Some(&first) if start > skip_until => {
                // One finding per duplicated run, not per overlapping window
                skip_until = window[DUPLICATE_WINDOW - 1].0;
                out.push(violation(
                    Severity::Medium,
                    "RemoveDuplication",
                    input.at(start),
                    format!("Lines {}-{} repeat the block at line {}", start, skip_until, first),
                    "Extract the repeated block into a shared function.",
                ));
            }
            Some(_) => {
                skip_until = window[DUPLICATE_WINDOW - 1].0;
            }
            None => {
                first_seen.insert(key, start);
            }
        }
    }
    out
}
