//! Auxiliary metadata.
//!
//! The metadata file sits next to the section dumps and uses a small INI dialect:
//!
//! ```text
//! [aux]
//! arch = x86_64
//!
//! [entry_points]
//! 0 = 0x1005,main
//!
//! [exit_points]
//! 0 = 0x1040,puts
//!
//! [relocations]
//! 0 = 0x2008
//!
//! [functions]
//! 0 = 0x1005
//! ```
//!
//! Keys inside the list groups are labels or indices and carry no meaning. Everything is
//! validated here so the address space only ever sees typed values.

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::symbol::Symbol;
use crate::utils::parse_hex;

/// File extension of the metadata file within a dump directory.
pub const METADATA_EXTENSION: &str = "ini";

/// Preferred metadata file name when a directory holds several `.ini` files.
pub const METADATA_FILE_NAME: &str = "aux.ini";

/// Typed contents of a metadata file. Every group is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    pub arch: Option<String>,
    pub entry_points: Vec<Symbol>,
    pub exit_points: Vec<Symbol>,
    pub relocations: Vec<u64>,
    pub functions: Vec<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Group {
    Aux,
    EntryPoints,
    ExitPoints,
    Relocations,
    Functions,
    Unknown,
}

impl Group {
    fn from_name(name: &str) -> Self {
        match name {
            "aux" => Group::Aux,
            "entry_points" => Group::EntryPoints,
            "exit_points" => Group::ExitPoints,
            "relocations" => Group::Relocations,
            "functions" => Group::Functions,
            _ => Group::Unknown,
        }
    }
}

struct Parser<'a> {
    group_name: &'a str,
    group: Option<Group>,
    line: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::MetadataParseError {
            group: self.group_name.to_string(),
            line: self.line,
            message: message.into(),
        }
    }

    fn address(&self, value: &str) -> Result<u64> {
        parse_hex(value).ok_or_else(|| self.error(format!("invalid address {value:?}")))
    }

    fn symbol(&self, value: &str) -> Result<Symbol> {
        let (address, name) = value
            .split_once(',')
            .ok_or_else(|| self.error(format!("expected \"<address>,<name>\", got {value:?}")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(self.error(format!("missing name in {value:?}")));
        }
        Ok(Symbol {
            address: self.address(address.trim())?,
            name: name.to_string(),
        })
    }
}

/// Cuts a value at the first `;` or `#` that follows whitespace.
fn strip_inline_comment(value: &str) -> &str {
    let mut previous = ' ';
    for (idx, c) in value.char_indices() {
        if (c == ';' || c == '#') && idx > 0 && previous.is_whitespace() {
            return &value[..idx];
        }
        previous = c;
    }
    value
}

impl Metadata {
    /// Parses metadata text. Keys are case-insensitive, group names are not.
    pub fn parse(text: &str) -> Result<Self> {
        let mut metadata = Metadata::default();
        let mut parser = Parser {
            group_name: "",
            group: None,
            line: 0,
        };

        for (idx, raw) in text.lines().enumerate() {
            parser.line = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[') {
                let name = header
                    .strip_suffix(']')
                    .ok_or_else(|| parser.error(format!("unterminated group header {line:?}")))?
                    .trim();
                let group = Group::from_name(name);
                if group == Group::Unknown {
                    tracing::warn!("Ignoring unknown metadata group [{}]", name);
                }
                parser.group_name = name;
                parser.group = Some(group);
                continue;
            }

            let delimiter = line
                .find(|c: char| c == '=' || c == ':')
                .ok_or_else(|| parser.error(format!("expected key = value, got {line:?}")))?;
            let key = line[..delimiter].trim().to_ascii_lowercase();
            let value = strip_inline_comment(&line[delimiter + 1..]).trim();

            let Some(group) = parser.group else {
                return Err(parser.error(format!("{key:?} appears before any group header")));
            };

            match group {
                Group::Aux if key == "arch" => {
                    if value.is_empty() {
                        return Err(parser.error("empty arch"));
                    }
                    metadata.arch = Some(value.to_string());
                }
                Group::Aux => tracing::warn!("Ignoring unknown aux key {}", key),
                Group::EntryPoints => metadata.entry_points.push(parser.symbol(value)?),
                Group::ExitPoints => metadata.exit_points.push(parser.symbol(value)?),
                Group::Relocations => metadata.relocations.push(parser.address(value)?),
                Group::Functions => metadata.functions.push(parser.address(value)?),
                Group::Unknown => {}
            }
        }

        Ok(metadata)
    }
}

impl FromStr for Metadata {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
