//! Page file parser.
//!
//! A page file is a sequence of attribute blocks. Each block starts with a
//! header line and runs until the next header or the end of the file:
//!
//! ```text
//! :title: Home
//! :order[int]: 3
//! :tags[list]:
//! rust
//! static sites
//! :content:
//! <p>Any number of lines.</p>
//! <p>Nothing is special here except a line starting a new header.</p>
//! ```
//!
//! Header names are lowercase letters, `-` and `_`. The optional bracketed
//! type casts the trimmed block value:
//!
//! | Type | Result |
//! |------|--------|
//! | *(none)* | trimmed string |
//! | `list` | one item per non-empty line, each trimmed |
//! | `int` | signed integer, anything else is a [`ReadError::InvalidInt`] |
//!
//! Text before the first header is ignored. When a name repeats, the later
//! block wins.

use crate::attributes::{AttributeRecord, Value};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^:(?P<name>[a-z_-]+)(?:\[(?P<kind>[a-z]+)\])?:\s*(?P<value>.*)$")
        .expect("header pattern is valid")
});

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path}:{line}: non-numeric value for `:{name}[int]:`: {value:?}")]
    InvalidInt {
        path: PathBuf,
        line: usize,
        name: String,
        value: String,
    },
    #[error("{path}:{line}: unknown type `{kind}` in `:{name}[{kind}]:` (expected `list` or `int`)")]
    UnknownType {
        path: PathBuf,
        line: usize,
        name: String,
        kind: String,
    },
}

/// Declared type of an attribute block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Text,
    List,
    Int,
}

/// A block being accumulated: header metadata plus raw lines.
struct Block {
    name: String,
    kind: BlockKind,
    line: usize,
    raw: String,
}

/// Reads one page file into an [`AttributeRecord`].
pub struct ContentReader<'a> {
    path: &'a Path,
}

impl<'a> ContentReader<'a> {
    pub fn new(path: &'a Path) -> Self {
        Self { path }
    }

    pub fn read(&self) -> Result<AttributeRecord, ReadError> {
        let source = fs::read_to_string(self.path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                ReadError::NotFound(self.path.to_path_buf())
            } else {
                ReadError::Io {
                    path: self.path.to_path_buf(),
                    source: e,
                }
            }
        })?;
        parse_str(&source, self.path)
    }
}

/// Read and parse the page file at `path`.
pub fn read_file(path: &Path) -> Result<AttributeRecord, ReadError> {
    ContentReader::new(path).read()
}

/// Parse page-file text. `origin` is only used in error messages.
pub fn parse_str(source: &str, origin: &Path) -> Result<AttributeRecord, ReadError> {
    let mut record = AttributeRecord::new();
    let mut current: Option<Block> = None;

    for (idx, line) in source.lines().enumerate() {
        let line_no = idx + 1;
        if let Some(caps) = HEADER_RE.captures(line) {
            if let Some(block) = current.take() {
                commit(&mut record, block, origin)?;
            }
            let name = caps["name"].to_string();
            let kind = match caps.name("kind").map(|m| m.as_str()) {
                None => BlockKind::Text,
                Some("list") => BlockKind::List,
                Some("int") => BlockKind::Int,
                Some(other) => {
                    return Err(ReadError::UnknownType {
                        path: origin.to_path_buf(),
                        line: line_no,
                        name,
                        kind: other.to_string(),
                    });
                }
            };
            current = Some(Block {
                name,
                kind,
                line: line_no,
                raw: caps["value"].to_string(),
            });
        } else if let Some(block) = current.as_mut() {
            block.raw.push('\n');
            block.raw.push_str(line);
        }
    }

    if let Some(block) = current {
        commit(&mut record, block, origin)?;
    }
    Ok(record)
}

fn commit(record: &mut AttributeRecord, block: Block, origin: &Path) -> Result<(), ReadError> {
    let value = cast(&block, origin)?;
    record.set(&block.name, value);
    Ok(())
}

fn cast(block: &Block, origin: &Path) -> Result<Value, ReadError> {
    let trimmed = block.raw.trim();
    match block.kind {
        BlockKind::Text => Ok(Value::Str(trimmed.to_string())),
        BlockKind::List => Ok(Value::List(
            trimmed
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect(),
        )),
        BlockKind::Int => trimmed
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ReadError::InvalidInt {
                path: origin.to_path_buf(),
                line: block.line,
                name: block.name.clone(),
                value: trimmed.to_string(),
            }),
    }
}
