//! Import declarations of Go source files
//!
//! Only the file header is tokenized: the `package` clause followed by any
//! number of `import` declarations. Scanning stops at the first other
//! top-level token, so the rest of the file is never looked at.

use std::path::Path;
use tokio::fs;
use vendr_errors::{Error, ResolveError};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Str(String),
    Punct(char),
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.chars.next();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.peek() {
                        Some('/') => {
                            for c in self.chars.by_ref() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.chars.next();
                            self.chars.next();
                            let mut prev = '\0';
                            for c in self.chars.by_ref() {
                                if prev == '*' && c == '/' {
                                    break;
                                }
                                prev = c;
                            }
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn string(&mut self, quote: char) -> String {
        let mut out = String::new();
        while let Some(c) = self.chars.next() {
            match c {
                '\\' if quote == '"' => {
                    if let Some(escaped) = self.chars.next() {
                        out.push(escaped);
                    }
                }
                c if c == quote => break,
                c => out.push(c),
            }
        }
        out
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.skip_trivia();
        let c = self.chars.next()?;
        let token = match c {
            '"' | '`' => Token::Str(self.string(c)),
            c if c.is_alphanumeric() || c == '_' => {
                let mut ident = String::from(c);
                while let Some(&n) = self.chars.peek() {
                    if n.is_alphanumeric() || n == '_' {
                        ident.push(n);
                        self.chars.next();
                    } else {
                        break;
                    }
                }
                Token::Ident(ident)
            }
            other => Token::Punct(other),
        };
        Some(token)
    }
}

/// Import paths declared by one Go source file, in source order
///
/// Single, grouped, aliased (`name "path"`), dot and blank imports are all
/// recognised. A file whose header does not start with a `package` clause
/// yields no imports.
#[must_use]
pub fn parse_imports(src: &str) -> Vec<String> {
    let mut tokens = Lexer::new(src.trim_start_matches('\u{feff}')).peekable();
    let mut imports = Vec::new();

    match tokens.next() {
        Some(Token::Ident(kw)) if kw == "package" => {}
        _ => return imports,
    }
    tokens.next();

    loop {
        match tokens.next() {
            Some(Token::Punct(';')) => {}
            Some(Token::Ident(kw)) if kw == "import" => {
                if tokens.peek() == Some(&Token::Punct('(')) {
                    tokens.next();
                    loop {
                        match tokens.next() {
                            Some(Token::Str(path)) => imports.push(path),
                            Some(Token::Punct(')')) | None => break,
                            // alias, `.`, `_` and `;`
                            Some(_) => {}
                        }
                    }
                } else {
                    for token in tokens.by_ref() {
                        if let Token::Str(path) = token {
                            imports.push(path);
                            break;
                        }
                    }
                }
            }
            _ => break,
        }
    }

    imports
}

/// Whether a file takes part in a normal build of its directory
#[must_use]
pub fn is_build_file(name: &str) -> bool {
    name.ends_with(".go")
        && !name.ends_with("_test.go")
        && !name.starts_with('.')
        && !name.starts_with('_')
}

/// Imports of every build file in the package directory `dir`
///
/// Each path is listed once, in the order first seen. File order is
/// alphabetical so results do not depend on directory iteration order.
///
/// # Errors
///
/// Returns `ResolveError::ReadFailed` if the directory or a file in it
/// cannot be read.
pub async fn package_imports(package: &str, dir: &Path) -> Result<Vec<String>, Error> {
    let read_failed = |e: std::io::Error| ResolveError::ReadFailed {
        package: package.to_string(),
        message: e.to_string(),
    };

    let mut files = Vec::new();
    let mut entries = fs::read_dir(dir).await.map_err(read_failed)?;
    while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_build_file(&name) && entry.file_type().await.map_err(read_failed)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();

    let mut imports: Vec<String> = Vec::new();
    for file in files {
        let src = fs::read_to_string(&file).await.map_err(read_failed)?;
        for path in parse_imports(&src) {
            if !imports.contains(&path) {
                imports.push(path);
            }
        }
    }
    Ok(imports)
}
