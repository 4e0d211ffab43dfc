//! Clean Code rules: naming, functions, error handling, comments, formatting
//!
//! Violations carry the heuristic tag (`N4`, `F2`, `C4`, ...) as their
//! principle; the knowledge-base entry is the rule's own.

use super::source::{functions, is_offset_suppressed, line_of, mask_non_code};
use super::{violation, with_example, Rule, RuleInput};
use crate::models::{Severity, Violation};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

pub const RULES: &[Rule] = &[
    Rule {
        id: "Naming",
        name: "Meaningful Names",
        weight: 25,
        cross_file: false,
        check: check_naming,
    },
    Rule {
        id: "Functions",
        name: "Small Functions",
        weight: 25,
        cross_file: false,
        check: check_functions,
    },
    Rule {
        id: "ErrorHandling",
        name: "Error Handling",
        weight: 20,
        cross_file: false,
        check: check_error_handling,
    },
    Rule {
        id: "Comments",
        name: "Comments",
        weight: 15,
        cross_file: false,
        check: check_comments,
    },
    Rule {
        id: "Formatting",
        name: "Formatting",
        weight: 15,
        cross_file: false,
        check: check_formatting,
    },
];

const MAX_PARAMS: usize = 3;
const MAX_FUNCTION_LINES: usize = 40;
const MAX_LINE_LENGTH: usize = 120;
const MAX_FILE_LINES: usize = 500;

/// Literals that read fine without a name
const ALLOWED_NUMBERS: &[&str] = &["0", "1", "2", "0.0", "1.0", "10", "100"];

fn single_letter_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)(?:\b(?:let|const|var|val)\s+|^[ \t]*)([A-Za-z])\s*(?::\s*\w+\s*)?=[^=>]")
            .expect("valid regex")
    })
}

fn hungarian_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)(?:\b(?:let|const|var)\s+|^[ \t]*)((?:str|int|bln|arr|obj|sz|lst|dict|fn)(?:[A-Z]\w*|_\w+))\s*(?::\s*\w+\s*)?=[^=]",
        )
        .expect("valid regex")
    })
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[^\w.\[$])(\d+(?:\.\d+)?)\b").expect("valid regex"))
}

fn constant_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:export\s+)?(?:(?:public|private|static|final|readonly|const|pub)\s+)*(?:[\w<>]+\s+)?[A-Z][A-Z0-9_]*\s*(?::[^=]+)?=",
        )
        .expect("valid regex")
    })
}

const LOOP_VARS: &[&str] = &["i", "j", "k", "x", "y", "z", "_", "e", "n"];

pub fn check_naming(input: &RuleInput<'_>) -> Vec<Violation> {
    let code = mask_non_code(input.content, input.language);
    let mut out = Vec::new();

    for cap in single_letter_re().captures_iter(&code) {
        let Some(name) = cap.get(1) else { continue };
        if LOOP_VARS.contains(&name.as_str()) || is_offset_suppressed(input.content, name.start()) {
            continue;
        }
        out.push(violation(
            Severity::Low,
            "N1",
            input.at_offset(name.start()),
            format!("Variable '{}' has a single-letter name", name.as_str()),
            "Choose a name that reveals what the value means.",
        ));
    }

    for cap in hungarian_re().captures_iter(&code) {
        let Some(name) = cap.get(1) else { continue };
        if is_offset_suppressed(input.content, name.start()) {
            continue;
        }
        out.push(violation(
            Severity::Low,
            "N6",
            input.at_offset(name.start()),
            format!("Variable '{}' encodes its type in its name", name.as_str()),
            "Drop the type prefix; the type system already carries it.",
        ));
    }

    let mut offset = 0;
    for (idx, line) in code.lines().enumerate() {
        let line_start = offset;
        offset += line.len() + 1;
        let trimmed = line.trim_start();
        if constant_decl_re().is_match(line)
            || trimmed.starts_with("import ")
            || trimmed.starts_with("from ")
            || trimmed.starts_with("#include")
        {
            continue;
        }
        let numbers: Vec<&str> = number_re()
            .captures_iter(line)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
            .filter(|n| !ALLOWED_NUMBERS.contains(n))
            .collect();
        if numbers.is_empty() || is_offset_suppressed(input.content, line_start) {
            continue;
        }
        out.push(with_example(
            violation(
                Severity::Low,
                "N4",
                input.at(idx + 1),
                format!("Magic number {} without a named constant", numbers.join(", ")),
                "Replace the literal with a constant whose name explains its meaning.",
            ),
            "if weight > 50:\n    return 25.99",
            "HEAVY_PARCEL_KG = 50\nHEAVY_SHIPPING_RATE = 25.99\nif weight > HEAVY_PARCEL_KG:\n    return HEAVY_SHIPPING_RATE",
        ));
    }
    out
}

fn is_flag_param(param: &str) -> bool {
    let p = param.trim();
    p.contains(": bool")
        || p.contains(":bool")
        || p.starts_with("bool ")
        || p.starts_with("boolean ")
        || p.ends_with("=True")
        || p.ends_with("= True")
        || p.ends_with("=False")
        || p.ends_with("= False")
        || p.ends_with("= true")
        || p.ends_with("= false")
}

pub fn check_functions(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut out = Vec::new();
    for func in functions(input.content, input.language) {
        if func.params.len() > MAX_PARAMS {
            out.push(with_example(
                violation(
                    Severity::Medium,
                    "F2",
                    input.at(func.line_start),
                    format!(
                        "Function '{}' takes {} parameters (more than {})",
                        func.name,
                        func.params.len(),
                        MAX_PARAMS
                    ),
                    "Group related parameters into an object or split the function.",
                ),
                "def process_order(self, order_type, customer_name, email, items, discount_code):",
                "def process_order(self, order: OrderRequest):",
            ));
        }
        if let Some(flag) = func.params.iter().find(|p| is_flag_param(p)) {
            out.push(violation(
                Severity::Low,
                "F3",
                input.at(func.line_start),
                format!("Function '{}' takes the flag argument '{}'", func.name, flag),
                "A boolean argument means the function does two things; split it in two.",
            ));
        }
        if func.lines() > MAX_FUNCTION_LINES {
            out.push(violation(
                Severity::Medium,
                "F1",
                input.at(func.line_start),
                format!("Function '{}' spans {} lines", func.name, func.lines()),
                "Functions should do one thing. Extract the steps into well-named helpers.",
            ));
        }
    }
    out
}

fn empty_catch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bcatch\s*(?:\([^)]*\))?\s*\{\s*\}|\bexcept\b[^:\n]*:\s*pass\b")
            .expect("valid regex")
    })
}

fn bare_except_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^[ \t]*except\s*:").expect("valid regex"))
}

fn log_and_swallow_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bcatch\s*\([^)]*\)\s*\{\s*console\.(?:log|error|warn)\s*\([^)]*\)\s*;?\s*\}")
            .expect("valid regex")
    })
}

pub fn check_error_handling(input: &RuleInput<'_>) -> Vec<Violation> {
    let code = mask_non_code(input.content, input.language);
    let mut out = Vec::new();
    let mut critical_lines = BTreeSet::new();

    for m in empty_catch_re().find_iter(&code) {
        if is_offset_suppressed(input.content, m.start()) {
            continue;
        }
        critical_lines.insert(line_of(&code, m.start()));
        out.push(with_example(
            violation(
                Severity::Critical,
                "E1",
                input.at_offset(m.start()),
                "Empty error handler silently swallows the failure",
                "Handle the error, rethrow it with context, or let it propagate.",
            ),
            "try {\n  save(order);\n} catch (e) {}",
            "try {\n  save(order);\n} catch (e) {\n  throw new OrderSaveError(order.id, e);\n}",
        ));
    }

    for m in bare_except_re().find_iter(&code) {
        let line = line_of(&code, m.end());
        if critical_lines.contains(&line) || is_offset_suppressed(input.content, m.end()) {
            continue;
        }
        out.push(violation(
            Severity::High,
            "E2",
            input.at(line),
            "Bare 'except:' also catches KeyboardInterrupt and SystemExit",
            "Catch the specific exceptions this block can handle.",
        ));
    }

    for m in log_and_swallow_re().find_iter(&code) {
        if is_offset_suppressed(input.content, m.start()) {
            continue;
        }
        out.push(violation(
            Severity::Medium,
            "E3",
            input.at_offset(m.start()),
            "Error is logged and then dropped; callers never learn about the failure",
            "Rethrow after logging or return an explicit failure value.",
        ));
    }
    out
}

fn todo_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:#|//|/\*|\*)\s*(TODO|FIXME|HACK|XXX)\b").expect("valid regex")
    })
}

fn commented_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\s*(?:#|//)\s*(?:def\s+\w+\s*\(|class\s+\w+|function\s+\w+|return\b|if\s*\(|for\s*\(|while\s*\(|(?:var|let|const)\s+\w+|import\s+[\w{]|[\w.\[\]]+\s*=[^=]|[\w.]+\(.*\)\s*;?\s*$)",
        )
        .expect("valid regex")
    })
}

pub fn check_comments(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut in_block = false;
    let lines: Vec<&str> = input.content.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        let prev = idx.checked_sub(1).and_then(|p| lines.get(p)).copied();
        if super::is_line_suppressed(line, prev) {
            in_block = false;
            continue;
        }
        if let Some(cap) = todo_re().captures(line) {
            let marker = cap.get(1).map(|m| m.as_str()).unwrap_or("TODO");
            out.push(violation(
                Severity::Low,
                "C1",
                input.at(idx + 1),
                format!("{} comment left in the code", marker),
                "Track the work in an issue tracker and remove the marker.",
            ));
        }
        if commented_code_re().is_match(line) {
            // One finding per contiguous block of commented-out lines
            if !in_block {
                out.push(with_example(
                    violation(
                        Severity::Low,
                        "C4",
                        input.at(idx + 1),
                        "Commented-out code",
                        "Delete it; version control remembers the old code.",
                    ),
                    "# def old_process_order(self, order):\n#     return order.calculate()",
                    "",
                ));
            }
            in_block = true;
        } else if !line.trim_start().starts_with('#') && !line.trim_start().starts_with("//") {
            in_block = false;
        }
    }
    out
}

pub fn check_formatting(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut out = Vec::new();
    let lines: Vec<&str> = input.content.lines().collect();

    for (idx, line) in lines.iter().enumerate() {
        let width = line.chars().count();
        if width <= MAX_LINE_LENGTH {
            continue;
        }
        let prev = idx.checked_sub(1).and_then(|p| lines.get(p)).copied();
        if super::is_line_suppressed(line, prev) {
            continue;
        }
        out.push(violation(
            Severity::Low,
            "G1",
            input.at(idx + 1),
            format!("Line is {} characters long (limit {})", width, MAX_LINE_LENGTH),
            "Break the line so it reads without horizontal scrolling.",
        ));
    }

    if lines.len() > MAX_FILE_LINES {
        out.push(violation(
            Severity::Medium,
            "G2",
            input.at("file"),
            format!("File has {} lines (limit {})", lines.len(), MAX_FILE_LINES),
            "Split the file along its responsibilities.",
        ));
    }

    let tab_indented = lines.iter().any(|l| l.starts_with('\t'));
    let space_indented = lines.iter().any(|l| l.starts_with("  "));
    if tab_indented && space_indented {
        out.push(violation(
            Severity::Low,
            "G3",
            input.at("file"),
            "Indentation mixes tabs and spaces",
            "Pick one indentation style and apply it with a formatter.",
        ));
    }
    out
}
