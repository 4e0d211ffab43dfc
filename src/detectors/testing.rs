//! Test quality rules (F.I.R.S.T)
//!
//! Fast, Independent, Repeatable, Self-validating and Timely. The first four
//! look at test files only; Timely looks at production files and asks
//! whether any file in the run tests them.

use super::source::{
    block_end, file_stem, is_offset_suppressed, line_of, mask_non_code, Language,
};
use super::{violation, with_example, Rule, RuleInput};
use crate::models::{Severity, Violation};
use regex::Regex;
use std::sync::OnceLock;

pub const RULES: &[Rule] = &[
    Rule {
        id: "Fast",
        name: "Fast",
        weight: 20,
        cross_file: false,
        check: check_fast,
    },
    Rule {
        id: "Independent",
        name: "Independent",
        weight: 20,
        cross_file: false,
        check: check_independent,
    },
    Rule {
        id: "Repeatable",
        name: "Repeatable",
        weight: 20,
        cross_file: false,
        check: check_repeatable,
    },
    Rule {
        id: "SelfValidating",
        name: "Self-Validating",
        weight: 20,
        cross_file: false,
        check: check_self_validating,
    },
    Rule {
        id: "Timely",
        name: "Timely",
        weight: 20,
        cross_file: false,
        check: check_timely,
    },
];

fn sleep_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:time\.sleep|Thread\.sleep|asyncio\.sleep|Task\.Delay|setTimeout|sleep)\s*\(",
        )
        .expect("valid regex")
    })
}

/// Matches in masked code, skipping suppressed lines of the original
fn matches_in_code<'a>(
    content: &'a str,
    code: &'a str,
    re: &'a Regex,
) -> impl Iterator<Item = regex::Match<'a>> + 'a {
    re.find_iter(code)
        .filter(move |m| !is_offset_suppressed(content, m.start()))
}

pub fn check_fast(input: &RuleInput<'_>) -> Vec<Violation> {
    if !input.is_test() {
        return Vec::new();
    }
    let code = mask_non_code(input.content, input.language);
    matches_in_code(input.content, &code, sleep_re())
        .map(|m| {
            with_example(
                violation(
                    Severity::Medium,
                    "Fast",
                    input.at_offset(m.start()),
                    "Test waits on the wall clock",
                    "Inject a clock or await the condition instead of sleeping.",
                ),
                "time.sleep(2)\nassert job.done",
                "clock.advance(seconds=2)\nassert job.done",
            )
        })
        .collect()
}

fn shared_state_re(language: Language) -> &'static Regex {
    static PY: OnceLock<Regex> = OnceLock::new();
    static JS: OnceLock<Regex> = OnceLock::new();
    if language.is_indented() {
        PY.get_or_init(|| {
            Regex::new(r"(?m)^(?:[a-z_]\w*\s*=\s*(?:\[|\{|dict\(|list\(|set\()|[ \t]+global\s+\w+)")
                .expect("valid regex")
        })
    } else {
        JS.get_or_init(|| {
            Regex::new(
                r"(?m)^(?:let|var)\s+\w+|^[ \t]*(?:(?:public|private|protected)\s+)?static\s+(?:[A-Z][\w<>]*|int|long|double|boolean)\s+\w+\s*=",
            )
            .expect("valid regex")
        })
    }
}

pub fn check_independent(input: &RuleInput<'_>) -> Vec<Violation> {
    if !input.is_test() {
        return Vec::new();
    }
    let code = mask_non_code(input.content, input.language);
    matches_in_code(input.content, &code, shared_state_re(input.language))
        .map(|m| {
            violation(
                Severity::Medium,
                "Independent",
                input.at_offset(m.start() + (m.as_str().len() - m.as_str().trim_start().len())),
                format!("Tests share mutable state ('{}')", m.as_str().trim()),
                "Build fresh state in each test or in a per-test fixture.",
            )
        })
        .collect()
}

fn nondeterminism_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:Math\.random\s*\(|random\.\w+\s*\(|Date\.now\s*\(|new\s+Date\s*\(\s*\)|datetime\.(?:now|utcnow|today)\s*\(|time\.time\s*\(|System\.currentTimeMillis\s*\(|DateTime\.Now\b|uuid\w*\s*\(|fetch\s*\(|requests\.(?:get|post|put|delete)\s*\(|axios\.\w+\s*\(|urlopen\s*\()",
        )
        .expect("valid regex")
    })
}

pub fn check_repeatable(input: &RuleInput<'_>) -> Vec<Violation> {
    if !input.is_test() {
        return Vec::new();
    }
    let code = mask_non_code(input.content, input.language);
    matches_in_code(input.content, &code, nondeterminism_re())
        .map(|m| {
            let call = m.as_str().trim_end_matches('(').trim();
            violation(
                Severity::Medium,
                "Repeatable",
                input.at_offset(m.start()),
                format!("Test depends on '{}', which changes between runs", call),
                "Seed randomness, freeze time, and stub the network so every run sees the same inputs.",
            )
        })
        .collect()
}

fn test_case_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)^[ \t]*(?:(?:async\s+)?def\s+(test\w*)\s*\(|(?:it|test)\s*\(\s*['"`]([^'"`]*)['"`]|@Test\b[\s\S]*?\bvoid\s+(\w+)\s*\(|func\s+(Test\w+)\s*\()"#,
        )
        .expect("valid regex")
    })
}

fn assertion_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:assert\w*|expect\s*\(|should\b|verify\w*\s*\(|Assert\.\w+|assertThat|pytest\.raises|t\.(?:Error|Errorf|Fatal|Fatalf|Fail)\b)",
        )
        .expect("valid regex")
    })
}

fn print_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:print\s*\(|console\.log\s*\(|System\.out\.print\w*\s*\(|Console\.Write\w*\s*\(|fmt\.Print\w*\s*\()",
        )
        .expect("valid regex")
    })
}

pub fn check_self_validating(input: &RuleInput<'_>) -> Vec<Violation> {
    if !input.is_test() {
        return Vec::new();
    }
    // Test names live inside string literals for JS, so match on the raw text
    let code = mask_non_code(input.content, input.language);
    let lines: Vec<&str> = code.lines().collect();
    let mut out = Vec::new();

    for cap in test_case_re().captures_iter(input.content) {
        let Some(whole) = cap.get(0) else { continue };
        let name = (1..=4)
            .find_map(|i| cap.get(i))
            .map(|m| m.as_str())
            .unwrap_or("test");
        let header = whole.end().saturating_sub(1);
        let start = line_of(input.content, header);
        let end = block_end(&lines, start, input.language);
        let body = lines.get(start - 1..end).map(|ls| ls.join("\n")).unwrap_or_default();
        if assertion_re().is_match(&body) || is_offset_suppressed(input.content, header) {
            continue;
        }
        out.push(violation(
            Severity::High,
            "SelfValidating",
            input.at(start),
            format!("Test '{}' has no assertion; it passes whatever the code does", name),
            "Assert on the observable outcome so the test can fail.",
        ));
    }

    for m in matches_in_code(input.content, &code, print_re()) {
        out.push(violation(
            Severity::Low,
            "SelfValidating",
            input.at_offset(m.start()),
            "Test prints output for a human to check",
            "Replace the print with an assertion.",
        ));
    }
    out
}

pub fn check_timely(input: &RuleInput<'_>) -> Vec<Violation> {
    if input.is_test() || input.language == Language::Unknown {
        return Vec::new();
    }
    let stem = file_stem(input.path);
    if stem.is_empty() || matches!(stem.as_str(), "index" | "main" | "__init__" | "mod" | "lib") {
        return Vec::new();
    }
    let compact = stem.replace(['_', '-'], "");
    let tested = input
        .all_files
        .iter()
        .filter(|f| super::is_test_file(f))
        .any(|f| {
            let test_stem = file_stem(f).replace(['_', '-'], "");
            test_stem.contains(&compact)
        });
    if tested {
        return Vec::new();
    }
    vec![violation(
        Severity::Low,
        "Timely",
        input.at("file"),
        format!("No test file in this run covers '{}'", stem),
        "Write tests alongside the code, before it settles.",
    )]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with(
        check: fn(&RuleInput<'_>) -> Vec<Violation>,
        path: &str,
        content: &str,
        files: &[&str],
    ) -> Vec<Violation> {
        let files: Vec<String> = files.iter().map(|f| f.to_string()).collect();
        check(&RuleInput::new(path, content, &files))
    }

    fn run(
        check: fn(&RuleInput<'_>) -> Vec<Violation>,
        path: &str,
        content: &str,
    ) -> Vec<Violation> {
        run_with(check, path, content, &[path])
    }

    #[test]
    fn test_sleep_in_test_is_slow() {
        let content = "def test_job():\n    time.sleep(2)\n    assert done()\n";
        let v = run(check_fast, "tests/test_job.py", content);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].location, "tests/test_job.py:2");

        assert!(
            run(check_fast, "src/job.py", content).is_empty(),
            "production code is not checked"
        );
    }

    #[test]
    fn test_shared_state() {
        let py = "cache = {}\n\ndef test_a():\n    cache['a'] = 1\n    assert cache\n";
        let v = run(check_independent, "test_cache.py", py);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].location, "test_cache.py:1");

        let js =
            "let counter = 0;\nconst LIMIT = 3;\ntest('inc', () => { counter++; expect(counter).toBe(1); });\n";
        let v = run(check_independent, "counter.test.js", js);
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_nondeterministic_inputs() {
        let content =
            "it('stamps', () => {\n  const now = Date.now();\n  expect(stamp(now)).toBeTruthy();\n});\n";
        let v = run(check_repeatable, "stamp.test.ts", content);
        assert_eq!(v.len(), 1);
        assert!(v[0].description.contains("Date.now"));
    }

    #[test]
    fn test_missing_assertion() {
        let content = r#"def test_checks_something():
    result = compute()
    print(result)

def test_real():
    assert compute() == 3
"#;
        let v = run(check_self_validating, "tests/test_compute.py", content);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].severity, Severity::High);
        assert_eq!(v[0].location, "tests/test_compute.py:1");
        assert!(v[0].description.contains("test_checks_something"));
        assert_eq!(v[1].severity, Severity::Low);
        assert_eq!(v[1].location, "tests/test_compute.py:3");
    }

    #[test]
    fn test_js_test_without_expect() {
        let content =
            "describe('cart', () => {\n  it('adds', () => {\n    cart.add(1);\n  });\n});\n";
        let v = run(check_self_validating, "cart.spec.ts", content);
        assert_eq!(v.len(), 1);
        assert!(v[0].description.contains("'adds'"));
        assert_eq!(v[0].location, "cart.spec.ts:2");
    }

    #[test]
    fn test_timely() {
        let files = ["src/order_service.py", "tests/test_order_service.py", "src/invoice.py"];
        assert!(run_with(check_timely, "src/order_service.py", "", &files).is_empty());
        let v = run_with(check_timely, "src/invoice.py", "", &files);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].location, "src/invoice.py:file");
        assert!(run_with(check_timely, "README.md", "", &files).is_empty());
    }
}
