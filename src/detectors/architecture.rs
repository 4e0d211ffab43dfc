//! Clean Architecture rules
//!
//! Layers are inferred from directory names. Files outside any recognised
//! layer are ignored by every rule here.

use super::source::Language;
use super::{import_specifiers, violation, with_example, Rule, RuleInput};
use crate::models::{Severity, Violation};
use regex::Regex;
use std::sync::OnceLock;

pub const RULES: &[Rule] = &[
    Rule {
        id: "DependencyRule",
        name: "Dependency Rule",
        weight: 35,
        cross_file: false,
        check: check_dependency_rule,
    },
    Rule {
        id: "FrameworkIndependence",
        name: "Framework Independence",
        weight: 25,
        cross_file: false,
        check: check_framework_independence,
    },
    Rule {
        id: "BoundaryCrossing",
        name: "Boundary Crossing",
        weight: 20,
        cross_file: false,
        check: check_boundary_crossing,
    },
    Rule {
        id: "EntityPurity",
        name: "Entity Purity",
        weight: 20,
        cross_file: false,
        check: check_entity_purity,
    },
];

/// Concentric layers, innermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Domain,
    Application,
    Adapters,
    Infrastructure,
}

impl Layer {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment.to_lowercase().as_str() {
            "domain" | "entities" | "entity" | "core" | "model" | "models" => Some(Layer::Domain),
            "application" | "usecases" | "use-cases" | "use_cases" | "usecase" | "services"
            | "service" => Some(Layer::Application),
            "controllers" | "controller" | "adapters" | "adapter" | "presenters" | "presenter"
            | "api" | "routes" | "handlers" | "web" | "ui" => Some(Layer::Adapters),
            "infrastructure" | "infra" | "db" | "database" | "persistence" | "repositories"
            | "frameworks" | "external" | "drivers" => Some(Layer::Infrastructure),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Layer::Domain => "domain",
            Layer::Application => "application",
            Layer::Adapters => "interface adapters",
            Layer::Infrastructure => "infrastructure",
        }
    }
}

/// Outermost layer named by any segment of a path or module specifier
pub fn layer_of(spec: &str) -> Option<Layer> {
    spec.split(|c| c == '/' || c == '\\' || c == '.')
        .filter_map(Layer::from_segment)
        .max()
}

/// Layer of a file: the directory segments only, never the file name
fn file_layer(path: &str) -> Option<Layer> {
    let normalized = path.replace('\\', "/");
    let dir = normalized.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    dir.split('/').filter_map(Layer::from_segment).max()
}

pub fn check_dependency_rule(input: &RuleInput<'_>) -> Vec<Violation> {
    let Some(layer) = file_layer(input.path) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for spec in import_specifiers(input.content, input.language) {
        let Some(target) = layer_of(&spec) else {
            continue;
        };
        if target <= layer {
            continue;
        }
        let offset = input.content.find(spec.as_str()).unwrap_or(0);
        if super::source::is_offset_suppressed(input.content, offset) {
            continue;
        }
        out.push(with_example(
            violation(
                Severity::High,
                "DependencyRule",
                input.at_offset(offset),
                format!(
                    "{} layer imports '{}' from the outer {} layer",
                    capitalize(layer.name()),
                    spec,
                    target.name()
                ),
                "Source dependencies must point inward. Declare an interface in the inner layer \
                 and implement it in the outer one.",
            ),
            "import { PostgresOrderRepo } from '../infrastructure/postgres';",
            "import { OrderRepository } from './ports';  // implemented in infrastructure",
        ));
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

const FRAMEWORKS: &[&str] = &[
    "express",
    "@nestjs",
    "react",
    "next",
    "vue",
    "@angular",
    "koa",
    "fastify",
    "typeorm",
    "mongoose",
    "sequelize",
    "@prisma",
    "prisma",
    "axios",
    "django",
    "flask",
    "fastapi",
    "sqlalchemy",
    "pydantic",
    "requests",
    "org.springframework",
    "javax.persistence",
    "jakarta.persistence",
    "Microsoft.EntityFrameworkCore",
    "Microsoft.AspNetCore",
];

fn framework_of(spec: &str) -> Option<&'static str> {
    FRAMEWORKS.iter().copied().find(|fw| {
        spec == *fw
            || spec.starts_with(&format!("{}/", fw))
            || spec.starts_with(&format!("{}.", fw))
    })
}

pub fn check_framework_independence(input: &RuleInput<'_>) -> Vec<Violation> {
    let Some(layer) = file_layer(input.path) else {
        return Vec::new();
    };
    if layer > Layer::Application {
        return Vec::new();
    }
    let mut out = Vec::new();
    for spec in import_specifiers(input.content, input.language) {
        let Some(framework) = framework_of(&spec) else {
            continue;
        };
        let offset = input.content.find(spec.as_str()).unwrap_or(0);
        if super::source::is_offset_suppressed(input.content, offset) {
            continue;
        }
        out.push(violation(
            Severity::High,
            "FrameworkIndependence",
            input.at_offset(offset),
            format!("{} layer depends on the framework '{}'", capitalize(layer.name()), framework),
            "Keep frameworks at the edges; wrap them behind interfaces owned by the inner layers.",
        ));
    }
    out
}

fn sql_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?i)(?:['"`]\s*(?:SELECT\s+[\w*,\s]+\s+FROM|INSERT\s+INTO|UPDATE\s+\w+\s+SET|DELETE\s+FROM)\b|\.execute\s*\(|\.query\s*\(\s*['"`]|sqlite3\.connect|createConnection\s*\()"#,
        )
        .expect("valid regex")
    })
}

fn http_in_core_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\bres\.(?:status|send|json)\s*\(|\bHttpResponse\s*\(|\bResponseEntity\b|\bjsonify\s*\(",
        )
        .expect("valid regex")
    })
}

pub fn check_boundary_crossing(input: &RuleInput<'_>) -> Vec<Violation> {
    let Some(layer) = file_layer(input.path) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    match layer {
        Layer::Adapters => {
            for m in sql_re().find_iter(input.content) {
                if super::source::is_offset_suppressed(input.content, m.start()) {
                    continue;
                }
                out.push(violation(
                    Severity::Medium,
                    "BoundaryCrossing",
                    input.at_offset(m.start()),
                    "Interface adapter talks to the database directly, skipping the use-case layer",
                    "Route data access through a use case and a repository interface.",
                ));
            }
        }
        Layer::Domain | Layer::Application => {
            for m in http_in_core_re().find_iter(input.content) {
                if super::source::is_offset_suppressed(input.content, m.start()) {
                    continue;
                }
                out.push(violation(
                    Severity::Medium,
                    "BoundaryCrossing",
                    input.at_offset(m.start()),
                    format!("{} code builds HTTP responses", capitalize(layer.name())),
                    "Return plain data and let a presenter or controller translate it to HTTP.",
                ));
            }
        }
        Layer::Infrastructure => {}
    }
    out
}

fn impure_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"\b(?:fetch\s*\(|axios\.|fs\.\w+|open\s*\(|console\.log\s*\(|print\s*\(|requests\.\w+\s*\(|sqlite3\.|process\.env|os\.environ|System\.out\.println|Console\.WriteLine|File\.\w+\s*\()",
        )
        .expect("valid regex")
    })
}

fn orm_annotation_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*@(?:Entity|Table|Column|PrimaryGeneratedColumn|Document|Schema)\b")
            .expect("valid regex")
    })
}

pub fn check_entity_purity(input: &RuleInput<'_>) -> Vec<Violation> {
    if file_layer(input.path) != Some(Layer::Domain) {
        return Vec::new();
    }
    let mut out = Vec::new();
    for m in impure_re().find_iter(input.content) {
        if super::source::is_offset_suppressed(input.content, m.start()) {
            continue;
        }
        out.push(violation(
            Severity::Medium,
            "EntityPurity",
            input.at_offset(m.start()),
            format!("Entity performs I/O ('{}')", m.as_str().trim_end_matches('(').trim()),
            "Entities hold business rules only. Move I/O to a use case or gateway.",
        ));
    }
    if input.language != Language::Python {
        if let Some(m) = orm_annotation_re().find(input.content) {
            out.push(violation(
                Severity::Low,
                "EntityPurity",
                input.at_offset(m.start() + m.as_str().find('@').unwrap_or(0)),
                "Entity is annotated for an ORM, coupling business rules to persistence",
                "Map persistence models separately from domain entities.",
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(
        check: fn(&RuleInput<'_>) -> Vec<Violation>,
        path: &str,
        content: &str,
    ) -> Vec<Violation> {
        let files = vec![path.to_string()];
        check(&RuleInput::new(path, content, &files))
    }

    #[test]
    fn test_layer_inference() {
        assert_eq!(file_layer("src/domain/order.ts"), Some(Layer::Domain));
        assert_eq!(file_layer("src/infrastructure/db/repo.ts"), Some(Layer::Infrastructure));
        assert_eq!(file_layer("src/order.ts"), None);
        assert_eq!(file_layer("models.py"), None);
        assert_eq!(layer_of("../infrastructure/db"), Some(Layer::Infrastructure));
        assert_eq!(layer_of("app.domain.order"), Some(Layer::Domain));
    }

    #[test]
    fn test_inner_layer_importing_outer_layer() {
        let content =
            "import { Repo } from '../infrastructure/repo';\nimport { Money } from './money';\n";
        let v = run(check_dependency_rule, "src/domain/order.ts", content);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].severity, Severity::High);
        assert_eq!(v[0].location, "src/domain/order.ts:1");
        assert!(v[0].description.contains("infrastructure"));
    }

    #[test]
    fn test_outer_layer_importing_inner_is_fine() {
        let content = "from app.domain.order import Order\n";
        assert!(run(check_dependency_rule, "app/infra/repo.py", content).is_empty());
    }

    #[test]
    fn test_framework_in_domain() {
        let content = "import express from 'express';\nimport { z } from './z';\n";
        let v = run(check_framework_independence, "src/domain/order.ts", content);
        assert_eq!(v.len(), 1);
        assert!(v[0].description.contains("express"));

        assert!(run(check_framework_independence, "src/api/server.ts", content).is_empty());
    }

    #[test]
    fn test_sql_in_controller() {
        let content = "export function list(req, res) {\n  db.query('SELECT * FROM orders');\n}\n";
        let v = run(check_boundary_crossing, "src/controllers/orders.ts", content);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].location, "src/controllers/orders.ts:2");
    }

    #[test]
    fn test_entity_io() {
        let content = "class Order:\n    def save(self):\n        print('saving')\n";
        let v = run(check_entity_purity, "app/domain/order.py", content);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].location, "app/domain/order.py:3");

        let clean = "class Order:\n    def total(self):\n        return sum(self.lines)\n";
        assert!(run(check_entity_purity, "app/domain/order.py", clean).is_empty());
    }

    #[test]
    fn test_unlayered_files_are_skipped() {
        let content = "import express from 'express';\nconsole.log('x');\n";
        for check in RULES.iter().map(|r| r.check) {
            assert!(run(check, "src/index.ts", content).is_empty());
        }
    }
}
