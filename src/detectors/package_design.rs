//! Package principles (Robert C. Martin)
//!
//! All rules here are cross-file: they read the [`ProjectIndex`] built from
//! every input file. A package is a directory.
//!
//! [`ProjectIndex`]: super::ProjectIndex

use super::{package_of, violation, Rule, RuleInput};
use crate::models::{Severity, Violation};

pub const RULES: &[Rule] = &[
    Rule {
        id: "ADP",
        name: "Acyclic Dependencies",
        weight: 30,
        cross_file: true,
        check: check_adp,
    },
    Rule {
        id: "SDP",
        name: "Stable Dependencies",
        weight: 25,
        cross_file: true,
        check: check_sdp,
    },
    Rule {
        id: "SAP",
        name: "Stable Abstractions",
        weight: 20,
        cross_file: true,
        check: check_sap,
    },
    Rule {
        id: "CCP",
        name: "Common Closure",
        weight: 25,
        cross_file: true,
        check: check_ccp,
    },
];

/// Distance from the main sequence beyond which a package is flagged
const MAX_MAIN_SEQUENCE_DISTANCE: f64 = 0.7;
/// Internal packages one file may import before its changes stop being local
const MAX_PACKAGE_FAN_OUT: usize = 4;

pub fn check_adp(input: &RuleInput<'_>) -> Vec<Violation> {
    let Some(project) = input.project else {
        return Vec::new();
    };
    let pkg = package_of(input.path);
    project
        .imports_of(input.path)
        .filter(|target| project.closes_cycle(&pkg, target))
        .map(|target| {
            violation(
                Severity::High,
                "ADP",
                input.at(target),
                format!(
                    "Package '{}' depends on '{}', which depends back on '{}'",
                    pkg, target, pkg
                ),
                "Break the cycle: invert one dependency with an interface or move the shared code into a new package.",
            )
        })
        .collect()
}

pub fn check_sdp(input: &RuleInput<'_>) -> Vec<Violation> {
    let Some(project) = input.project else {
        return Vec::new();
    };
    let pkg = package_of(input.path);
    let Some(own) = project.metrics(&pkg) else {
        return Vec::new();
    };
    let own_instability = own.instability();
    project
        .imports_of(input.path)
        .filter_map(|target| {
            let instability = project.metrics(target)?.instability();
            (instability > own_instability + f64::EPSILON).then_some((target, instability))
        })
        .map(|(target, instability)| {
            violation(
                Severity::Medium,
                "SDP",
                input.at(target),
                format!(
                    "'{}' (I={:.2}) depends on the less stable '{}' (I={:.2})",
                    pkg, own_instability, target, instability
                ),
                "Depend in the direction of stability; extract an abstraction the volatile package can implement.",
            )
        })
        .collect()
}

pub fn check_sap(input: &RuleInput<'_>) -> Vec<Violation> {
    let Some(project) = input.project else {
        return Vec::new();
    };
    // Package-level finding, reported once on the package's first file
    if !project.is_first_file_of_package(input.path) {
        return Vec::new();
    }
    let pkg = package_of(input.path);
    let Some(m) = project.metrics(&pkg) else {
        return Vec::new();
    };
    if m.total_types == 0 || m.ca + m.ce == 0 || m.distance() <= MAX_MAIN_SEQUENCE_DISTANCE {
        return Vec::new();
    }
    let zone = if m.abstractness() < 0.5 {
        "zone of pain: stable and concrete"
    } else {
        "zone of uselessness: abstract and unused"
    };
    vec![violation(
        Severity::Low,
        "SAP",
        input.at("package"),
        format!(
            "Package '{}' is far from the main sequence (A={:.2}, I={:.2}, D={:.2}; {})",
            pkg,
            m.abstractness(),
            m.instability(),
            m.distance(),
            zone
        ),
        "Stable packages should be abstract; add interfaces to stable packages or make abstract ones depended upon.",
    )]
}

pub fn check_ccp(input: &RuleInput<'_>) -> Vec<Violation> {
    let Some(project) = input.project else {
        return Vec::new();
    };
    let targets: Vec<&String> = project.imports_of(input.path).collect();
    if targets.len() <= MAX_PACKAGE_FAN_OUT {
        return Vec::new();
    }
    vec![violation(
        Severity::Medium,
        "CCP",
        input.at("imports"),
        format!(
            "File depends on {} internal packages ({}); a change here spreads across the codebase",
            targets.len(),
            targets.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
        ),
        "Keep classes that change together in the same package.",
    )]
}

#[cfg(test)]
mod tests {
    use super::super::ProjectIndex;
    use super::*;

    fn run(
        check: fn(&RuleInput<'_>) -> Vec<Violation>,
        files: &[(&str, &str)],
        path: &str,
    ) -> Vec<Violation> {
        let index = ProjectIndex::build(files.iter().copied());
        let all: Vec<String> = files.iter().map(|(p, _)| p.to_string()).collect();
        let content = files
            .iter()
            .find(|(p, _)| *p == path)
            .map(|(_, c)| *c)
            .unwrap_or("");
        check(&RuleInput::new(path, content, &all).with_project(&index))
    }

    const CYCLE: &[(&str, &str)] = &[
        ("src/a/x.ts", "import { y } from '../b/y';\nexport class X {}\n"),
        ("src/b/y.ts", "import { x } from '../a/x';\nexport class Y {}\n"),
    ];

    #[test]
    fn test_cycle_detected_from_both_sides() {
        let v = run(check_adp, CYCLE, "src/a/x.ts");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].severity, Severity::High);
        assert_eq!(v[0].location, "src/a/x.ts:src/b");
        assert_eq!(run(check_adp, CYCLE, "src/b/y.ts").len(), 1);
    }

    #[test]
    fn test_acyclic_is_clean() {
        let files = &[
            ("src/a/x.ts", "import { y } from '../b/y';\n"),
            ("src/b/y.ts", "export class Y {}\n"),
        ];
        assert!(run(check_adp, files, "src/a/x.ts").is_empty());
    }

    #[test]
    fn test_depending_on_less_stable_package() {
        // core: Ca=2, Ce=1 (I=0.33); util: Ca=1, Ce=2 (I=0.67)
        let files = &[
            ("app/core/c.py", "from app.util.u import helper\nclass C:\n    pass\n"),
            ("app/web/w.py", "from app.core.c import C\n"),
            ("app/cli/m.py", "from app.core.c import C\n"),
            ("app/util/u.py", "from app.lib.l import thing\nfrom app.net.n import sock\n"),
            ("app/lib/l.py", ""),
            ("app/net/n.py", ""),
        ];
        let v = run(check_sdp, files, "app/core/c.py");
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].location, "app/core/c.py:app/util");
        assert!(run(check_sdp, files, "app/web/w.py").is_empty());
    }

    #[test]
    fn test_concrete_stable_package_in_zone_of_pain() {
        let files = &[
            ("src/model/a.ts", "export class A {}\n"),
            ("src/model/b.ts", "export class B {}\n"),
            ("src/ui/v.ts", "import { A } from '../model/a';\n"),
        ];
        let v = run(check_sap, files, "src/model/a.ts");
        assert_eq!(v.len(), 1);
        assert!(v[0].description.contains("zone of pain"));
        assert!(run(check_sap, files, "src/model/b.ts").is_empty(), "reported once per package");
    }

    #[test]
    fn test_wide_fan_out() {
        let files = &[
            (
                "src/app/main.ts",
                "import a from '../a/a';\nimport b from '../b/b';\nimport c from '../c/c';\nimport d from '../d/d';\nimport e from '../e/e';\n",
            ),
            ("src/a/a.ts", ""),
            ("src/b/b.ts", ""),
            ("src/c/c.ts", ""),
            ("src/d/d.ts", ""),
            ("src/e/e.ts", ""),
        ];
        let v = run(check_ccp, files, "src/app/main.ts");
        assert_eq!(v.len(), 1);
        assert!(v[0].description.starts_with("File depends on 5 internal packages"));
    }

    #[test]
    fn test_no_project_index_means_no_findings() {
        let files = vec!["src/a/x.ts".to_string()];
        let input = RuleInput::new("src/a/x.ts", CYCLE[0].1, &files);
        for rule in RULES {
            assert!(rule.run(&input).is_empty());
        }
    }
}
