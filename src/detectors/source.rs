//! Lightweight structural scanning over raw source text.
//!
//! No parsing happens here: classes and functions are located with regexes
//! and their extent is estimated by brace depth (C-like languages) or
//! indentation (Python). Good enough for heuristics, nothing more.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Source language, derived from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Java,
    CSharp,
    Go,
    Rust,
    Unknown,
}

impl Language {
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "py" | "pyi" => Language::Python,
            "ts" | "tsx" => Language::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "java" => Language::Java,
            "cs" => Language::CSharp,
            "go" => Language::Go,
            "rs" => Language::Rust,
            _ => Language::Unknown,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        Self::from_extension(path.extension().and_then(|e| e.to_str()).unwrap_or(""))
    }

    /// Blocks delimited by indentation instead of braces
    pub fn is_indented(&self) -> bool {
        matches!(self, Language::Python)
    }
}

/// A class (or struct/interface body) located in the text
#[derive(Debug, Clone)]
pub struct ClassBlock {
    pub name: String,
    /// 1-indexed
    pub line_start: usize,
    pub line_end: usize,
    /// Parent named in `extends X` / `class A(X)` / `: X`
    pub base: Option<String>,
    pub body: String,
}

impl ClassBlock {
    pub fn lines(&self) -> usize {
        self.line_end + 1 - self.line_start
    }
}

/// A function or method header located in the text
#[derive(Debug, Clone)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<String>,
    /// 1-indexed
    pub line_start: usize,
    pub line_end: usize,
}

impl FunctionSig {
    pub fn lines(&self) -> usize {
        self.line_end + 1 - self.line_start
    }
}

fn class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*(?:export\s+)?(?:default\s+)?(?:public\s+|private\s+|internal\s+|protected\s+)?(?:abstract\s+|sealed\s+|static\s+|final\s+)*class[ \t]+([A-Za-z_]\w*)(?:[ \t]*\([ \t]*([A-Za-z_][\w.]*)|[ \t]+extends[ \t]+([A-Za-z_][\w.]*)|[ \t]*:[ \t]*([A-Za-z_][\w.]*))?",
        )
        .expect("valid regex")
    })
}

fn function_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?m)^[ \t]*(?:(?:export|public|private|protected|static|async|override|virtual|final|abstract|pub|def|function|fn|func)[ \t]+)*(?:([\w<>\[\]?.]+)[ \t]+)?([A-Za-z_]\w*)[ \t]*\(([^()]*)\)\s*(?:->\s*[^:{]+|:\s*[\w<>\[\], |.]+)?\s*(?:\{|:\s*$|throws\s+[\w, ]+\s*\{)",
        )
        .expect("valid regex")
    })
}

const NOT_FUNCTIONS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "elif", "else", "with", "except", "match",
    "foreach", "using", "lock", "typeof", "sizeof", "new", "class", "when",
];

/// 1-indexed line number of a byte offset
pub fn line_of(content: &str, offset: usize) -> usize {
    content[..offset.min(content.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

/// Last line (1-indexed) of the block opened on `start` (1-indexed).
pub fn block_end(lines: &[&str], start: usize, language: Language) -> usize {
    if start == 0 || start > lines.len() {
        return start;
    }
    if language.is_indented() {
        let base = indent_of(lines[start - 1]);
        let mut end = start;
        for (i, line) in lines.iter().enumerate().skip(start) {
            if line.trim().is_empty() {
                continue;
            }
            if indent_of(line) <= base {
                break;
            }
            end = i + 1;
        }
        return end;
    }

    let mut depth: i64 = 0;
    let mut opened = false;
    for (i, line) in lines.iter().enumerate().skip(start - 1) {
        for c in line.chars() {
            match c {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => depth -= 1,
                _ => {}
            }
        }
        if opened && depth <= 0 {
            return i + 1;
        }
    }
    lines.len()
}

/// Locate class blocks in `content`.
pub fn class_blocks(content: &str, language: Language) -> Vec<ClassBlock> {
    let lines: Vec<&str> = content.lines().collect();
    class_re()
        .captures_iter(content)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let name = cap.get(1)?.as_str().to_string();
            let base = cap
                .get(2)
                .or_else(|| cap.get(3))
                .or_else(|| cap.get(4))
                .map(|m| m.as_str().to_string())
                .filter(|b| b != "object");
            let line_start = line_of(content, whole.start());
            let line_end = block_end(&lines, line_start, language).max(line_start);
            let body = lines
                .get(line_start - 1..line_end)
                .map(|ls| ls.join("\n"))
                .unwrap_or_default();
            Some(ClassBlock {
                name,
                line_start,
                line_end,
                base,
                body,
            })
        })
        .collect()
}

/// Locate function and method headers in `content`.
pub fn functions(content: &str, language: Language) -> Vec<FunctionSig> {
    let lines: Vec<&str> = content.lines().collect();
    function_re()
        .captures_iter(content)
        .filter_map(|cap| {
            let name = cap.get(2)?.as_str();
            let return_type = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            if NOT_FUNCTIONS.contains(&name) || NOT_FUNCTIONS.contains(&return_type) {
                return None;
            }
            let header = cap.get(0)?;
            let line_start = line_of(content, header.start() + indent_of(header.as_str()));
            let params = split_params(cap.get(3).map(|m| m.as_str()).unwrap_or(""));
            let line_end = block_end(&lines, line_start, language).max(line_start);
            Some(FunctionSig {
                name: name.to_string(),
                params,
                line_start,
                line_end,
            })
        })
        .collect()
}

/// Split a parameter list, dropping receivers (`self`, `cls`, `&self`, `this`).
pub fn split_params(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .filter(|p| {
            let name = p.trim_start_matches('&').trim_start_matches("mut ");
            !matches!(name, "self" | "cls" | "this") && !p.starts_with("self:")
        })
        .map(String::from)
        .collect()
}

/// Test files by naming convention or directory. Fixture data is not a test.
pub fn is_test_file(path: &str) -> bool {
    let lower = path.replace('\\', "/").to_lowercase();
    if lower.contains("fixtures/") {
        return false;
    }
    let file = lower.rsplit('/').next().unwrap_or(&lower);
    file.starts_with("test_")
        || file.contains("_test.")
        || file.contains(".test.")
        || file.contains(".spec.")
        || file.ends_with("tests.cs")
        || file.ends_with("test.java")
        || lower.contains("/tests/")
        || lower.contains("/__tests__/")
        || lower.starts_with("tests/")
        || lower.starts_with("test/")
        || lower.contains("/test/")
}

/// Whether a line is opted out via `solidscan: ignore` on it or on the
/// comment line directly above it.
pub fn is_line_suppressed(line: &str, prev_line: Option<&str>) -> bool {
    const MARKERS: [&str; 2] = ["solidscan: ignore", "solidscan:ignore"];
    let line_lower = line.to_lowercase();
    if MARKERS.iter().any(|m| line_lower.contains(m)) {
        return true;
    }
    if let Some(prev) = prev_line {
        let prev_lower = prev.trim().to_lowercase();
        let is_comment = prev_lower.starts_with('#')
            || prev_lower.starts_with("//")
            || prev_lower.starts_with("/*");
        if is_comment && MARKERS.iter().any(|m| prev_lower.contains(m)) {
            return true;
        }
    }
    false
}

/// Whether the line holding byte `offset` is suppressed
pub fn is_offset_suppressed(content: &str, offset: usize) -> bool {
    let line_no = line_of(content, offset);
    let mut lines = content.lines().skip(line_no.saturating_sub(2));
    let (prev, line) = if line_no >= 2 {
        (lines.next(), lines.next())
    } else {
        (None, lines.next())
    };
    line.map(|l| is_line_suppressed(l, prev)).unwrap_or(false)
}

/// Blank out comments and the contents of string literals, keeping byte
/// offsets and newlines intact. Quote characters themselves are kept.
pub fn mask_non_code(content: &str, language: Language) -> String {
    let bytes = content.as_bytes();
    let hash_comments = language.is_indented();
    let mut out = bytes.to_vec();
    let blank = |out: &mut Vec<u8>, from: usize, to: usize| {
        for b in &mut out[from..to] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    };

    let mut i = 0;
    while i < bytes.len() {
        let rest = &bytes[i..];
        if (hash_comments && rest[0] == b'#') || (!hash_comments && rest.starts_with(b"//")) {
            let end = rest.iter().position(|&b| b == b'\n').map_or(bytes.len(), |e| i + e);
            blank(&mut out, i, end);
            i = end;
        } else if !hash_comments && rest.starts_with(b"/*") {
            let end = find_bytes(&rest[2..], b"*/").map_or(bytes.len(), |e| i + 2 + e + 2);
            blank(&mut out, i, end);
            i = end;
        } else if hash_comments && (rest.starts_with(b"\"\"\"") || rest.starts_with(b"'''")) {
            let quote = &rest[..3];
            let close = find_bytes(&rest[3..], quote).map_or(bytes.len(), |e| i + 3 + e);
            blank(&mut out, i + 3, close);
            i = (close + 3).min(bytes.len());
        } else if matches!(rest[0], b'"' | b'\'' | b'`') {
            let quote = rest[0];
            let mut j = i + 1;
            while j < bytes.len() && bytes[j] != quote && (quote == b'`' || bytes[j] != b'\n') {
                j += if bytes[j] == b'\\' { 2 } else { 1 };
            }
            let close = j.min(bytes.len());
            blank(&mut out, i + 1, close);
            i = close + 1;
        } else {
            i += 1;
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Stem of a file name without any extensions (`order.service.ts` -> `order`)
pub fn file_stem(path: &str) -> String {
    let file = path.replace('\\', "/");
    let file = file.rsplit('/').next().unwrap_or("");
    file.split('.').next().unwrap_or("").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS: &str = r#"import { Db } from "./db";

export class OrderService extends BaseService {
  constructor(private db: Db) {
    super();
  }

  process(order: Order, user: User, flag: boolean) {
    if (flag) {
      return 1;
    }
    return 2;
  }
}

class Other {}
"#;

    const PY: &str = r#"class OrderService(Base):
    def __init__(self):
        self.db = None

    def process(self, a, b, c, d):
        total = 0
        return total

def helper(x):
    return x
"#;

    #[test]
    fn test_class_blocks_typescript() {
        let classes = class_blocks(TS, Language::TypeScript);
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0].name, "OrderService");
        assert_eq!(classes[0].base.as_deref(), Some("BaseService"));
        assert_eq!(classes[0].line_start, 3);
        assert_eq!(classes[0].line_end, 14);
        assert_eq!(classes[1].name, "Other");
        assert_eq!(classes[1].lines(), 1);
    }

    #[test]
    fn test_class_blocks_python() {
        let classes = class_blocks(PY, Language::Python);
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].base.as_deref(), Some("Base"));
        assert_eq!(classes[0].line_end, 7);
    }

    #[test]
    fn test_functions_typescript() {
        let fns = functions(TS, Language::TypeScript);
        let process = fns.iter().find(|f| f.name == "process").expect("process found");
        assert_eq!(process.params.len(), 3);
        assert_eq!(process.line_start, 8);
        assert_eq!(process.line_end, 13);
        assert!(fns.iter().all(|f| f.name != "if"));
    }

    #[test]
    fn test_functions_python_drop_self() {
        let fns = functions(PY, Language::Python);
        let process = fns.iter().find(|f| f.name == "process").expect("process found");
        assert_eq!(process.params, vec!["a", "b", "c", "d"]);
        assert_eq!(process.lines(), 3);
        assert!(fns.iter().any(|f| f.name == "helper"));
    }

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file("src/order.test.ts"));
        assert!(is_test_file("tests/test_order.py"));
        assert!(is_test_file("pkg/order_test.go"));
        assert!(is_test_file("src/OrderServiceTest.java"));
        assert!(!is_test_file("src/order.ts"));
        assert!(!is_test_file("src/contest.py"));
        assert!(!is_test_file("tests/fixtures/bad_order_service.py"));
    }

    #[test]
    fn test_line_suppression() {
        assert!(is_line_suppressed("catch (e) {} // solidscan: ignore", None));
        assert!(is_line_suppressed("x = 1", Some("# solidscan:ignore")));
        assert!(!is_line_suppressed("x = 1", Some("y = 2 # solidscan: ignore")));
        let content = "a\n// solidscan: ignore\ncatch (e) {}\n";
        let offset = content.find("catch").unwrap();
        assert!(is_offset_suppressed(content, offset));
        assert!(!is_offset_suppressed(content, 0));
    }

    #[test]
    fn test_mask_non_code() {
        let py = "x = 5  # 42\ns = \"7\"\n\"\"\"doc 9\"\"\"\n";
        let masked = mask_non_code(py, Language::Python);
        assert_eq!(masked.len(), py.len());
        assert!(masked.contains("x = 5"));
        assert!(!masked.contains("42"));
        assert!(!masked.contains('7'));
        assert!(!masked.contains('9'));

        let ts = "let a = 3; // 4\n/* 5\n6 */ const b = 'x';\n";
        let masked = mask_non_code(ts, Language::TypeScript);
        assert_eq!(masked.lines().count(), 3);
        assert!(masked.contains("let a = 3;"));
        assert!(masked.contains("const b = ' ';"));
        assert!(!masked.contains('4') && !masked.contains('5') && !masked.contains('6'));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("src/order.service.ts"), "order");
        assert_eq!(file_stem("Order.py"), "order");
    }
}
