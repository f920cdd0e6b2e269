//! Lightweight JS/TS top-level statement scanner
//!
//! The propagation engine only needs three facts about a source file:
//! which top-level statement encloses a given line, what kind of statement
//! it is, and the first identifier it declares. A full parser is not needed
//! for that; a brace/string/comment-aware scan is enough and keeps the
//! engine independent of any language service.

use std::str::CharIndices;

/// Kind of a top-level statement.
///
/// The first five kinds are structural/control-flow constructs, not semantic
/// declarations: expanding references from them would mark unrelated projects
/// affected merely because a module was re-wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
  Import,
  Export,
  ModuleDecl,
  ExpressionStmt,
  If,
  Variable,
  Function,
  Class,
  Interface,
  TypeAlias,
  Enum,
  Other,
}

impl StatementKind {
  /// Kinds that are never expanded into the reference closure
  pub fn is_ignorable(self) -> bool {
    matches!(
      self,
      StatementKind::Import
        | StatementKind::Export
        | StatementKind::ModuleDecl
        | StatementKind::ExpressionStmt
        | StatementKind::If
    )
  }
}

/// A top-level statement with its (inclusive, 1-based) line span.
#[derive(Debug, Clone)]
pub struct Statement {
  pub kind: StatementKind,
  pub start_line: u32,
  pub end_line: u32,
  pub identifier: Option<String>,
}

/// Find the statement enclosing `line`, if any.
///
/// Lines between statements (blank, comments) and lines past end of file
/// have no enclosing statement; the engine skips them silently.
pub fn statement_at(statements: &[Statement], line: u32) -> Option<&Statement> {
  statements.iter().find(|s| s.start_line <= line && line <= s.end_line)
}

/// Head-of-statement capture used for classification and identifier lookup
const HEAD_CAPACITY: usize = 240;

struct Builder {
  start_line: u32,
  head: String,
}

/// Scan source text into top-level statements.
pub fn scan(source: &str) -> Vec<Statement> {
  Scanner::new(source).run()
}

struct Scanner<'a> {
  source: &'a str,
  chars: CharIndices<'a>,
  line: u32,
  depth: i32,
  statements: Vec<Statement>,
  current: Option<Builder>,
}

impl<'a> Scanner<'a> {
  fn new(source: &'a str) -> Self {
    Self {
      source,
      chars: source.char_indices(),
      line: 1,
      depth: 0,
      statements: Vec::new(),
      current: None,
    }
  }

  fn run(mut self) -> Vec<Statement> {
    while let Some((idx, ch)) = self.chars.next() {
      match ch {
        '\n' => self.line += 1,

        '/' if self.peek_char(idx) == Some('/') => self.skip_line_comment(),
        '/' if self.peek_char(idx) == Some('*') => self.skip_block_comment(),

        '\'' | '"' => {
          self.push_head(ch);
          self.skip_string(ch);
        }
        '`' => {
          self.push_head(ch);
          self.skip_template();
        }

        '{' | '(' | '[' => {
          self.begin_if_needed();
          self.push_head(ch);
          self.depth += 1;
        }

        '}' | ')' | ']' => {
          self.depth = (self.depth - 1).max(0);
          self.push_head(ch);
          // A top-level `}` ends block-formed statements (function, class,
          // if, ...). Brace pairs inside expression-formed statements
          // (import clauses, object literals) run on to the `;`. A
          // continuation clause (else/catch/finally/do-while) keeps the
          // statement open.
          if self.depth == 0
            && ch == '}'
            && self.current.as_ref().is_some_and(|b| is_block_formed(&b.head))
            && !self.continuation_follows(idx)
          {
            self.finish(self.line);
          }
        }

        ';' if self.depth == 0 => self.finish(self.line),

        c if c.is_whitespace() => self.push_head(' '),

        c => {
          self.begin_if_needed();
          self.push_head(c);
        }
      }
    }

    let last_line = self.line;
    self.finish(last_line);
    self.statements
  }

  fn begin_if_needed(&mut self) {
    if self.current.is_none() && self.depth == 0 {
      self.current = Some(Builder {
        start_line: self.line,
        head: String::new(),
      });
    }
  }

  fn push_head(&mut self, ch: char) {
    if let Some(b) = self.current.as_mut()
      && b.head.len() < HEAD_CAPACITY
    {
      b.head.push(ch);
    }
  }

  fn finish(&mut self, end_line: u32) {
    if let Some(b) = self.current.take() {
      if b.head.trim().is_empty() {
        return;
      }
      let kind = classify(&b.head);
      let identifier = first_identifier(&b.head);
      self.statements.push(Statement {
        kind,
        start_line: b.start_line,
        end_line,
        identifier,
      });
    }
  }

  fn peek_char(&self, idx: usize) -> Option<char> {
    self.source[idx..].chars().nth(1)
  }

  /// Does a continuation clause follow this closing brace?
  fn continuation_follows(&self, idx: usize) -> bool {
    let rest = self.source[idx + 1..].trim_start();
    rest.starts_with("else") || rest.starts_with("catch") || rest.starts_with("finally") || rest.starts_with("while")
  }

  fn skip_line_comment(&mut self) {
    for (_, ch) in self.chars.by_ref() {
      if ch == '\n' {
        self.line += 1;
        break;
      }
    }
  }

  fn skip_block_comment(&mut self) {
    let mut prev = '\0';
    for (_, ch) in self.chars.by_ref() {
      if ch == '\n' {
        self.line += 1;
      }
      if prev == '*' && ch == '/' {
        break;
      }
      prev = ch;
    }
  }

  fn skip_string(&mut self, delim: char) {
    let mut escaped = false;
    for (_, ch) in self.chars.by_ref() {
      if ch == '\n' {
        // Unterminated single-line string; bail at the line break
        self.line += 1;
        break;
      }
      if escaped {
        escaped = false;
      } else if ch == '\\' {
        escaped = true;
      } else if ch == delim {
        break;
      }
    }
  }

  fn skip_template(&mut self) {
    let mut escaped = false;
    for (_, ch) in self.chars.by_ref() {
      if ch == '\n' {
        self.line += 1;
      }
      if escaped {
        escaped = false;
      } else if ch == '\\' {
        escaped = true;
      } else if ch == '`' {
        break;
      }
    }
  }
}

/// Is this statement terminated by its top-level `}` (rather than by `;`)?
fn is_block_formed(head: &str) -> bool {
  let mut words = head.split_whitespace().map(|w| w.trim_start_matches('@'));
  let mut word = words.next().unwrap_or("");
  for modifier in ["export", "default", "declare", "abstract", "async"] {
    if word == modifier {
      word = words.next().unwrap_or("");
    }
  }
  matches!(
    word,
    "function" | "class" | "interface" | "enum" | "module" | "namespace" | "global" | "if" | "for" | "while" | "do"
      | "switch" | "try"
  )
}

/// Classify a statement from its leading tokens.
fn classify(head: &str) -> StatementKind {
  let words: Vec<&str> = head.split_whitespace().collect();
  classify_words(&words)
}

fn classify_words(words: &[&str]) -> StatementKind {
  let first = words.first().copied().unwrap_or("");
  let first = first.trim_start_matches('@'); // decorators attach to the declaration

  match first {
    "import" => StatementKind::Import,
    // `export` on a declaration is a modifier, and the declaration must
    // still feed the reference closure. Only the re-export forms
    // (`export { .. }`, `export * from`, `export type { .. }`) are
    // statements of their own kind.
    "export" => match words.get(1).copied().unwrap_or("") {
      w if w.starts_with('{') || w.starts_with('*') => StatementKind::Export,
      "type" if words.get(2).copied().unwrap_or("").starts_with('{') => StatementKind::Export,
      "default" => classify_words(&words[2..]),
      _ => classify_words(&words[1..]),
    },
    "declare" => match words.get(1).copied().unwrap_or("") {
      "module" | "namespace" | "global" => StatementKind::ModuleDecl,
      "const" | "let" | "var" => StatementKind::Variable,
      "function" => StatementKind::Function,
      "class" => StatementKind::Class,
      _ => StatementKind::Other,
    },
    "module" | "namespace" => StatementKind::ModuleDecl,
    "if" => StatementKind::If,
    "const" | "let" | "var" => StatementKind::Variable,
    "function" => StatementKind::Function,
    "async" => match words.get(1).copied().unwrap_or("") {
      "function" => StatementKind::Function,
      _ => StatementKind::ExpressionStmt,
    },
    "class" => StatementKind::Class,
    "abstract" => match words.get(1).copied().unwrap_or("") {
      "class" => StatementKind::Class,
      _ => StatementKind::Other,
    },
    "interface" => StatementKind::Interface,
    "type" => StatementKind::TypeAlias,
    "enum" => StatementKind::Enum,
    "for" | "while" | "do" | "switch" | "try" | "return" | "throw" | "with" | "debugger" => StatementKind::Other,
    _ => StatementKind::ExpressionStmt,
  }
}

const KEYWORDS: &[&str] = &[
  "import", "export", "default", "from", "as", "const", "let", "var", "function", "class", "interface", "type",
  "enum", "declare", "module", "namespace", "global", "abstract", "async", "await", "new", "return", "if", "else",
  "for", "while", "do", "switch", "case", "try", "catch", "finally", "throw", "typeof", "instanceof", "in", "of",
  "void", "delete", "yield", "static", "public", "private", "protected", "readonly", "extends", "implements",
  "require", "true", "false", "null", "undefined", "this", "super",
];

/// First identifier appearing in the statement head (declaration name).
///
/// `import foo from './x'` → foo, `const a = 1` → a,
/// `import './side-effect'` → None.
pub fn first_identifier(head: &str) -> Option<String> {
  let mut chars = head.char_indices().peekable();

  while let Some((start, ch)) = chars.next() {
    if ch.is_alphabetic() || ch == '_' || ch == '$' {
      let mut end = start + ch.len_utf8();
      while let Some(&(idx, c)) = chars.peek() {
        if c.is_alphanumeric() || c == '_' || c == '$' {
          end = idx + c.len_utf8();
          chars.next();
        } else {
          break;
        }
      }
      let word = &head[start..end];
      if !KEYWORDS.contains(&word) {
        return Some(word.to_string());
      }
    }
  }

  None
}
