//! Rule detectors
//!
//! Every rule is a named pure function from one file's text to a list of
//! violations. Agents own an ordered table of rules plus their weights.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Agent (ordered &[Rule])                                      │
//! │   for file in files:          (file-input order)             │
//! │     for rule in rules:        (declaration order)            │
//! │       rule.check(RuleInput) -> Vec<Violation>                │
//! └──────────────────────────────────────────────────────────────┘
//!                     │
//!     ┌───────────────┼──────────────────────────┐
//!     ▼               ▼                          ▼
//! per-file text   file list (all_files)   ProjectIndex (cross-file
//!                                          imports, cross_file rules)
//! ```
//!
//! Rules never read files themselves and never keep state between calls,
//! so any number of them may run at once.

pub mod architecture;
pub mod clean_code;
pub mod package_design;
pub mod patterns;
pub mod refactoring;
pub mod solid;
pub mod source;
pub mod testing;

use crate::models::{ExampleCode, Severity, Violation};
use regex::Regex;
use source::Language;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::OnceLock;

pub use source::{is_line_suppressed, is_test_file};

/// Signature shared by every rule body
pub type CheckFn = fn(&RuleInput<'_>) -> Vec<Violation>;

/// One registered rule
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    /// Principle tag put on violations and used as the knowledge-base key
    pub id: &'static str,
    pub name: &'static str,
    /// Contribution to the agent's compliance score when the rule stays silent
    pub weight: u8,
    /// Needs the [`ProjectIndex`] built from every input file
    pub cross_file: bool,
    pub check: CheckFn,
}

impl Rule {
    pub fn run(&self, input: &RuleInput<'_>) -> Vec<Violation> {
        (self.check)(input)
    }
}

/// Everything a rule may look at for one file
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub path: &'a str,
    pub content: &'a str,
    pub language: Language,
    /// Every file in the current run, in input order
    pub all_files: &'a [String],
    pub project: Option<&'a ProjectIndex>,
}

impl<'a> RuleInput<'a> {
    pub fn new(path: &'a str, content: &'a str, all_files: &'a [String]) -> Self {
        Self {
            path,
            content,
            language: Language::from_path(std::path::Path::new(path)),
            all_files,
            project: None,
        }
    }

    pub fn with_project(mut self, project: &'a ProjectIndex) -> Self {
        self.project = Some(project);
        self
    }

    /// `path:qualifier`
    pub fn at(&self, qualifier: impl std::fmt::Display) -> String {
        format!("{}:{}", self.path, qualifier)
    }

    /// `path:<line>` for a byte offset into the content
    pub fn at_offset(&self, offset: usize) -> String {
        self.at(source::line_of(self.content, offset))
    }

    pub fn is_test(&self) -> bool {
        is_test_file(self.path)
    }
}

/// Build a violation tagged with `principle`
pub fn violation(
    severity: Severity,
    principle: &str,
    location: String,
    description: impl Into<String>,
    recommendation: impl Into<String>,
) -> Violation {
    Violation {
        severity,
        principle: principle.to_string(),
        location,
        description: description.into(),
        recommendation: recommendation.into(),
        documentation_reference: String::new(),
        example_code: None,
    }
}

/// Attach an illustrative before/after snippet
pub fn with_example(mut v: Violation, before: &str, after: &str) -> Violation {
    v.example_code = Some(ExampleCode {
        before: before.to_string(),
        after: after.to_string(),
    });
    v
}

// ---------------------------------------------------------------------------
// Cross-file project index
// ---------------------------------------------------------------------------

fn js_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?m)(?:^\s*(?:import|export)\s[^'"\n]*?from\s*['"]([^'"]+)['"]|^\s*import\s+['"]([^'"]+)['"]|require\(\s*['"]([^'"]+)['"]\s*\))"#,
        )
        .expect("valid regex")
    })
}

fn py_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:from\s+(\.*)([\w.]*)\s+import|import\s+([\w.]+))")
            .expect("valid regex")
    })
}

fn dotted_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:import\s+(?:static\s+)?|using\s+(?:static\s+)?)([\w.]+)(?:\.\*)?\s*;",
        )
        .expect("valid regex")
    })
}

fn abstract_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:export\s+)?(?:public\s+)?(?:interface\s+\w+|abstract\s+class\s+\w+|trait\s+\w+|class\s+\w+\s*\([^)]*\b(?:ABC|Protocol)\b[^)]*\))",
        )
        .expect("valid regex")
    })
}

fn any_type_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^\s*(?:export\s+)?(?:pub\s+)?(?:public\s+)?(?:abstract\s+)?(?:class|interface|trait|struct)\s+\w+",
        )
        .expect("valid regex")
    })
}

/// Raw import specifiers found in `content`
pub fn import_specifiers(content: &str, language: Language) -> Vec<String> {
    match language {
        Language::Python => py_import_re()
            .captures_iter(content)
            .filter_map(|cap| {
                if let Some(dots) = cap.get(1) {
                    let module = cap.get(2).map(|m| m.as_str()).unwrap_or("");
                    Some(format!("{}{}", dots.as_str(), module))
                } else {
                    cap.get(3).map(|m| m.as_str().to_string())
                }
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Language::Java | Language::CSharp => dotted_import_re()
            .captures_iter(content)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
            .collect(),
        _ => js_import_re()
            .captures_iter(content)
            .filter_map(|cap| {
                cap.get(1)
                    .or_else(|| cap.get(2))
                    .or_else(|| cap.get(3))
                    .map(|m| m.as_str().to_string())
            })
            .collect(),
    }
}

/// Directory portion of a `/`-separated path
pub fn package_of(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    match normalized.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => ".".to_string(),
    }
}

/// Join and normalize `.`/`..` segments
fn join_normalized(base: &str, rel: &str) -> String {
    let mut parts: Vec<&str> = if base == "." {
        Vec::new()
    } else {
        base.split('/').collect()
    };
    for seg in rel.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                if parts.last().map(|p| *p != "..").unwrap_or(false) {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            s => parts.push(s),
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// Per-package metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PackageMetrics {
    /// Efferent coupling: internal packages this one depends on
    pub ce: usize,
    /// Afferent coupling: internal packages depending on this one
    pub ca: usize,
    pub abstract_types: usize,
    pub total_types: usize,
}

impl PackageMetrics {
    /// I = Ce / (Ca + Ce), 0 for an isolated package
    pub fn instability(&self) -> f64 {
        let total = self.ca + self.ce;
        if total == 0 {
            0.0
        } else {
            self.ce as f64 / total as f64
        }
    }

    /// A = abstract types / all types
    pub fn abstractness(&self) -> f64 {
        if self.total_types == 0 {
            0.0
        } else {
            self.abstract_types as f64 / self.total_types as f64
        }
    }

    /// Distance from the main sequence, |A + I - 1|
    pub fn distance(&self) -> f64 {
        (self.abstractness() + self.instability() - 1.0).abs()
    }
}

/// Import graph over every file of a run, grouped by package (directory)
#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    /// file -> internal packages it imports (excluding its own)
    file_imports: HashMap<String, BTreeSet<String>>,
    /// package -> packages it depends on
    edges: BTreeMap<String, BTreeSet<String>>,
    metrics: BTreeMap<String, PackageMetrics>,
    /// package -> first file of that package in input order
    first_file: HashMap<String, String>,
}

impl ProjectIndex {
    /// Build from `(path, content)` pairs in input order.
    pub fn build<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let files: Vec<(&str, &str)> = files.into_iter().collect();
        let mut index = ProjectIndex::default();

        for (path, content) in &files {
            let pkg = package_of(path);
            index
                .first_file
                .entry(pkg.clone())
                .or_insert_with(|| path.to_string());
            let m = index.metrics.entry(pkg).or_default();
            m.abstract_types += abstract_type_re().find_iter(content).count();
            m.total_types += any_type_re().find_iter(content).count();
        }
        let known: Vec<String> = index.metrics.keys().cloned().collect();

        for (path, content) in &files {
            let pkg = package_of(path);
            let language = Language::from_path(std::path::Path::new(path));
            let targets: BTreeSet<String> = import_specifiers(content, language)
                .iter()
                .filter_map(|spec| resolve_package(&pkg, spec, language, &known))
                .filter(|target| *target != pkg)
                .collect();
            index
                .edges
                .entry(pkg)
                .or_default()
                .extend(targets.iter().cloned());
            index.file_imports.insert(path.to_string(), targets);
        }

        let mut afferent: HashMap<String, usize> = HashMap::new();
        for targets in index.edges.values() {
            for t in targets {
                *afferent.entry(t.clone()).or_default() += 1;
            }
        }
        for (pkg, m) in index.metrics.iter_mut() {
            m.ce = index.edges.get(pkg).map(|e| e.len()).unwrap_or(0);
            m.ca = afferent.get(pkg).copied().unwrap_or(0);
        }
        index
    }

    /// Internal packages imported by `file`
    pub fn imports_of(&self, file: &str) -> impl Iterator<Item = &String> {
        self.file_imports.get(file).into_iter().flatten()
    }

    pub fn metrics(&self, package: &str) -> Option<&PackageMetrics> {
        self.metrics.get(package)
    }

    pub fn packages(&self) -> impl Iterator<Item = &String> {
        self.metrics.keys()
    }

    /// Whether `package` is the first package seen for `file`
    pub fn is_first_file_of_package(&self, file: &str) -> bool {
        self.first_file
            .get(&package_of(file))
            .map(|f| f == file)
            .unwrap_or(false)
    }

    /// Whether `to` can reach `from` again (i.e. the edge `from -> to` closes a cycle)
    pub fn closes_cycle(&self, from: &str, to: &str) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([to]);
        while let Some(pkg) = queue.pop_front() {
            if pkg == from {
                return true;
            }
            if !seen.insert(pkg) {
                continue;
            }
            if let Some(next) = self.edges.get(pkg) {
                queue.extend(next.iter().map(|s| s.as_str()));
            }
        }
        false
    }
}

/// Map an import specifier to a known internal package, if any
fn resolve_package(
    from_pkg: &str,
    spec: &str,
    language: Language,
    known: &[String],
) -> Option<String> {
    let candidate = match language {
        Language::Python if spec.starts_with('.') => {
            let dots = spec.chars().take_while(|c| *c == '.').count();
            let mut base = from_pkg.to_string();
            for _ in 1..dots {
                base = package_of(&base);
            }
            let module = spec[dots..].replace('.', "/");
            let target = if module.is_empty() {
                base
            } else {
                join_normalized(&base, &module)
            };
            // `from . import x` names a package; `from .mod import x` names a module
            return if known.contains(&target) {
                Some(target)
            } else {
                let pkg = package_of(&target);
                known.contains(&pkg).then_some(pkg)
            };
        }
        Language::Python | Language::Java | Language::CSharp => spec.replace('.', "/"),
        _ if spec.starts_with('.') => {
            let target = join_normalized(from_pkg, spec);
            // `./dir` may name a directory module (index file) or a file
            return if known.contains(&target) {
                Some(target)
            } else {
                let pkg = package_of(&target);
                known.contains(&pkg).then_some(pkg)
            };
        }
        _ => return None,
    };

    // Dotted names: match a known package by suffix, as module or as member
    let module_pkg = package_of(&candidate);
    let found = [candidate.as_str(), module_pkg.as_str()]
        .into_iter()
        .filter(|c| !c.is_empty() && *c != ".")
        .find_map(|c| {
            known
                .iter()
                .find(|k| k.as_str() == c || k.ends_with(&format!("/{}", c)))
                .cloned()
        });
    found
}
