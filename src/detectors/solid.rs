//! SOLID principle rules
//!
//! SRP 25, OCP 20, LSP 20, ISP 15, DIP 20.

use super::source::{block_end, class_blocks, functions, line_of, Language};
use super::{violation, with_example, Rule, RuleInput};
use crate::models::{Severity, Violation};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const RULES: &[Rule] = &[
    Rule {
        id: "SRP",
        name: "Single Responsibility",
        weight: 25,
        cross_file: false,
        check: check_srp,
    },
    Rule {
        id: "OCP",
        name: "Open/Closed",
        weight: 20,
        cross_file: false,
        check: check_ocp,
    },
    Rule {
        id: "LSP",
        name: "Liskov Substitution",
        weight: 20,
        cross_file: false,
        check: check_lsp,
    },
    Rule {
        id: "ISP",
        name: "Interface Segregation",
        weight: 15,
        cross_file: false,
        check: check_isp,
    },
    Rule {
        id: "DIP",
        name: "Dependency Inversion",
        weight: 20,
        cross_file: false,
        check: check_dip,
    },
];

/// Method count above which a class is flagged even with a single concern
const MAX_METHODS_PER_CLASS: usize = 15;
/// Distinct concerns in one class that count as mixed responsibilities
const MIXED_CONCERNS: usize = 3;
/// Interface members above which an interface is considered fat
const MAX_INTERFACE_MEMBERS: usize = 7;
/// Literal comparisons on one variable that count as a type switch
const TYPE_SWITCH_BRANCHES: usize = 3;

fn concern_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (
                "persistence",
                r"(?i)\b(?:cursor|execute|commit|sqlite3|INSERT\s+INTO|SELECT\s+.+\s+FROM|repository|\.save\(|findOne|prisma|knex|sequelize)\b",
            ),
            (
                "notification",
                r"(?i)(?:smtp|sendmail|send_?email|nodemailer|notify|sms)",
            ),
            (
                "presentation",
                r"(?:json\.dumps|JSON\.stringify|render\w*\(|to_?html|format_\w+\(|toString\(\)|console\.table|csv)",
            ),
            (
                "network",
                r"(?:fetch\(|axios|requests\.(?:get|post|put|delete)|HttpClient|urllib|http\.request)",
            ),
            (
                "file I/O",
                r"(?:\bopen\(|fs\.\w+|readFile|writeFile|File\.(?:Read|Write|open))",
            ),
        ]
        .into_iter()
        .map(|(name, re)| (name, Regex::new(re).expect("valid regex")))
        .collect()
    })
}

pub fn check_srp(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut out = Vec::new();
    for class in class_blocks(input.content, input.language) {
        let concerns: Vec<&str> = concern_patterns()
            .iter()
            .filter(|(_, re)| re.is_match(&class.body))
            .map(|(name, _)| *name)
            .collect();
        let methods = functions(&class.body, input.language).len();

        if concerns.len() >= MIXED_CONCERNS {
            out.push(with_example(
                violation(
                    Severity::High,
                    "SRP",
                    input.at(&class.name),
                    format!(
                        "Class '{}' mixes {} responsibilities: {}",
                        class.name,
                        concerns.len(),
                        concerns.join(", ")
                    ),
                    "Split the class so each resulting class has one reason to change; \
                     move persistence, notification and presentation into collaborators.",
                ),
                "class OrderService { save() {...} sendEmail() {...} format() {...} }",
                "class OrderService { constructor(repo, notifier, formatter) {...} }",
            ));
        } else if methods > MAX_METHODS_PER_CLASS {
            out.push(violation(
                Severity::Medium,
                "SRP",
                input.at(&class.name),
                format!(
                    "Class '{}' declares {} methods (more than {})",
                    class.name, methods, MAX_METHODS_PER_CLASS
                ),
                "Group related methods and extract them into focused classes.",
            ));
        }
    }
    out
}

fn type_compare_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"\b(?:if|elif|else\s+if)\s*\(?\s*([\w.]+)\s*===?\s*['"]"#)
            .expect("valid regex")
    })
}

fn switch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?:switch|match)\s*\(?\s*([\w.]+)\s*\)?\s*\{").expect("valid regex")
    })
}

fn case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*(?:case\s+[^:]+:|[\w.:]+\s*=>)").expect("valid regex"))
}

/// Variables compared against string literals in an if/elif chain at least
/// `min` times, with the line of the first comparison.
pub(crate) fn literal_dispatch(content: &str, min: usize) -> Vec<(String, usize, usize)> {
    let mut by_var: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for cap in type_compare_re().captures_iter(content) {
        let (Some(whole), Some(var)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let entry = by_var
            .entry(var.as_str().to_string())
            .or_insert((0, line_of(content, whole.start())));
        entry.0 += 1;
    }
    let mut hits: Vec<(String, usize, usize)> = by_var
        .into_iter()
        .filter(|(_, (count, _))| *count >= min)
        .map(|(var, (count, line))| (var, count, line))
        .collect();
    hits.sort_by_key(|(_, _, line)| *line);
    hits
}

/// `switch`/`match` statements with at least `min` arms: (subject, arms, line)
pub(crate) fn switch_statements(
    content: &str,
    language: Language,
    min: usize,
) -> Vec<(String, usize, usize)> {
    let lines: Vec<&str> = content.lines().collect();
    switch_re()
        .captures_iter(content)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let subject = cap.get(1)?.as_str().to_string();
            let start = line_of(content, whole.start());
            let end = block_end(&lines, start, language);
            let body = lines.get(start..end).map(|ls| ls.join("\n")).unwrap_or_default();
            let arms = case_re().find_iter(&body).count();
            (arms >= min).then_some((subject, arms, start))
        })
        .collect()
}

pub fn check_ocp(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut out = Vec::new();
    let switches = switch_statements(input.content, input.language, TYPE_SWITCH_BRANCHES);
    for (subject, arms, line) in switches {
        out.push(violation(
            Severity::Medium,
            "OCP",
            input.at(line),
            format!(
                "switch on '{}' with {} cases must be edited for every new variant",
                subject, arms
            ),
            "Replace the switch with polymorphism or a registry of strategies keyed by variant.",
        ));
    }
    for (var, count, line) in literal_dispatch(input.content, TYPE_SWITCH_BRANCHES) {
        out.push(with_example(
            violation(
                Severity::Medium,
                "OCP",
                input.at(line),
                format!(
                    "Conditional chain compares '{}' against {} literals; adding a variant means modifying this code",
                    var, count
                ),
                "Introduce a polymorphic type (or a lookup table) per variant so new variants are added, not edited in.",
            ),
            "if order_type == 'premium': ...\nelif order_type == 'regular': ...",
            "DISCOUNTS = {'premium': PremiumDiscount(), 'regular': RegularDiscount()}\nDISCOUNTS[order_type].apply(total)",
        ));
    }
    out
}

fn not_implemented_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)(?:raise\s+NotImplementedError|throw\s+new\s+(?:NotImplementedException|NotSupportedException|UnsupportedOperationException)|throw\s+new\s+Error\(\s*['`][^'`]*not\s+(?:implemented|supported))",
        )
        .expect("valid regex")
    })
}

fn type_check_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bisinstance\s*\(|\binstanceof\s+[A-Z]|\bis\s+[A-Z]\w+\s*\)")
            .expect("valid regex")
    })
}

pub fn check_lsp(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut out = Vec::new();
    for class in class_blocks(input.content, input.language) {
        let Some(base) = class.base.as_deref() else {
            continue;
        };
        if matches!(base, "ABC" | "Protocol" | "Exception" | "Error") {
            continue;
        }
        if not_implemented_re().is_match(&class.body) {
            out.push(violation(
                Severity::High,
                "LSP",
                input.at(&class.name),
                format!(
                    "'{}' extends '{}' but refuses part of its contract by throwing 'not implemented'",
                    class.name, base
                ),
                "Subtypes must honour the base contract. Narrow the base type or split the hierarchy.",
            ));
        }
    }
    for m in type_check_re().find_iter(input.content) {
        if super::source::is_offset_suppressed(input.content, m.start()) {
            continue;
        }
        out.push(violation(
            Severity::Medium,
            "LSP",
            input.at_offset(m.start()),
            "Runtime type check branches on the concrete type instead of relying on substitutability",
            "Move the type-specific behaviour into the types themselves and call it polymorphically.",
        ));
    }
    out
}

fn interface_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:export\s+)?(?:public\s+)?interface\s+([A-Za-z_]\w*)[^{\n]*\{")
            .expect("valid regex")
    })
}

fn interface_member_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s+[\w?]+\s*(?:\(|:|<)[^\n]*;?\s*$").expect("valid regex"))
}

pub fn check_isp(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut out = Vec::new();
    let lines: Vec<&str> = input.content.lines().collect();

    for cap in interface_re().captures_iter(input.content) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let start = line_of(input.content, whole.end().saturating_sub(1));
        let end = block_end(&lines, start, Language::TypeScript);
        let members = lines
            .get(start..end.saturating_sub(1))
            .unwrap_or(&[])
            .iter()
            .filter(|l| interface_member_re().is_match(l))
            .count();
        if members > MAX_INTERFACE_MEMBERS {
            out.push(violation(
                Severity::Medium,
                "ISP",
                input.at(name.as_str()),
                format!(
                    "Interface '{}' declares {} members; clients are forced to depend on methods they do not use",
                    name.as_str(),
                    members
                ),
                "Split the interface into role interfaces that each serve one kind of client.",
            ));
        }
    }

    if input.language == Language::Python {
        for class in class_blocks(input.content, input.language) {
            let abstract_methods = class.body.matches("@abstractmethod").count();
            if abstract_methods > MAX_INTERFACE_MEMBERS {
                out.push(violation(
                    Severity::Medium,
                    "ISP",
                    input.at(&class.name),
                    format!(
                        "Abstract class '{}' requires {} abstract methods from every implementer",
                        class.name, abstract_methods
                    ),
                    "Split the abstract base into smaller protocols.",
                ));
            }
        }
    }
    out
}

fn concrete_new_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\bnew\s+([A-Z]\w*(?:Repository|Service|Client|Connection|Database|Db|DB|Gateway|Api|API|Mailer|Store|Dao|DAO|Provider))\s*\(",
        )
        .expect("valid regex")
    })
}

fn infra_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(sqlite3\.connect|psycopg2\.connect|pymysql\.connect|mysql\.connector\.connect|MongoClient|redis\.Redis|requests\.Session|smtplib\.SMTP|boto3\.client)\s*\(",
        )
        .expect("valid regex")
    })
}

fn py_concrete_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"self\.\w+\s*=\s*([A-Z]\w*(?:Repository|Service|Client|Connection|Database|Gateway|Api|Mailer|Store|Dao))\s*\(",
        )
        .expect("valid regex")
    })
}

pub fn check_dip(input: &RuleInput<'_>) -> Vec<Violation> {
    let mut out = Vec::new();
    let mut seen_lines = std::collections::BTreeSet::new();
    let hits = concrete_new_re()
        .captures_iter(input.content)
        .chain(infra_call_re().captures_iter(input.content))
        .chain(py_concrete_re().captures_iter(input.content));
    let mut hits: Vec<(usize, String)> = hits
        .filter_map(|cap| Some((cap.get(0)?.start(), cap.get(1)?.as_str().to_string())))
        .collect();
    hits.sort();

    for (offset, target) in hits {
        let line = line_of(input.content, offset);
        if !seen_lines.insert(line) || super::source::is_offset_suppressed(input.content, offset) {
            continue;
        }
        out.push(with_example(
            violation(
                Severity::High,
                "DIP",
                input.at(line),
                format!("High-level code constructs the concrete dependency '{}' directly", target),
                "Depend on an abstraction and receive the implementation through the constructor.",
            ),
            "def __init__(self):\n    self.db = sqlite3.connect('orders.db')",
            "def __init__(self, repository: OrderRepository):\n    self.repository = repository",
        ));
    }
    out
}
