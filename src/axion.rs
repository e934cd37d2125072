//! The axion: the symbol sequence an L-System rewrites generation by generation.
//!
//! An axion is stored as text. Each element is a single symbol character,
//! optionally followed by a parenthesised parameter (`+(137)`). Parameters are
//! opaque to the grammar and are only read by the turtle interpreter.

use crate::error::TreeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use symbios::{SymbiosState, SymbolTable};

/// An L-System symbol sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Axion(String);

/// One symbol of an [`Axion`] together with its parameter, if any.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AxionElement<'a> {
    pub symbol: char,
    /// Text between the parentheses following the symbol.
    pub parameter: Option<&'a str>,
    /// The element exactly as written, parameter included.
    pub text: &'a str,
}

impl Axion {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the elements left to right.
    pub fn elements(&self) -> Elements<'_> {
        Elements { rest: &self.0 }
    }

    /// Number of elements (not characters) in the axion.
    pub fn element_count(&self) -> usize {
        self.elements().count()
    }

    /// Number of elements carrying `symbol`.
    pub fn count(&self, symbol: char) -> usize {
        self.elements().filter(|e| e.symbol == symbol).count()
    }

    pub fn first_symbol(&self) -> Option<char> {
        self.elements().next().map(|e| e.symbol)
    }

    /// Checks that every `]` closes an earlier `[` and that no `[` is left open.
    pub fn branch_balance(&self) -> Result<(), TreeError> {
        let mut depth = 0usize;
        for (index, element) in self.elements().enumerate() {
            match element.symbol {
                '[' => depth += 1,
                ']' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or(TreeError::UnbalancedPop { index })?;
                }
                _ => {}
            }
        }
        if depth == 0 {
            Ok(())
        } else {
            Err(TreeError::UnclosedBranch { open: depth })
        }
    }

    /// Compiles the axion into a [`SymbiosState`] for the turtle interpreter.
    ///
    /// Every symbol must already be interned in `table`. A parameter becomes the
    /// module's first numeric parameter.
    pub fn to_state(&self, table: &SymbolTable) -> Result<SymbiosState, TreeError> {
        let mut state = SymbiosState::new();
        let mut buf = [0u8; 4];

        for element in self.elements() {
            let key: &str = element.symbol.encode_utf8(&mut buf);
            let id = table.resolve_id(key).ok_or(TreeError::UnmappedSymbol {
                symbol: element.symbol,
            })?;

            let pushed = match element.parameter {
                Some(raw) => {
                    let value: f32 = raw.trim().parse().map_err(|_| {
                        TreeError::InvalidParameter {
                            symbol: element.symbol,
                            parameter: raw.to_string(),
                        }
                    })?;
                    state.push(id, 0.0, &[value.into()])
                }
                None => state.push(id, 0.0, &[]),
            };
            pushed.map_err(|e| TreeError::Symbios(format!("{e:?}")))?;
        }

        Ok(state)
    }
}

impl fmt::Display for Axion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Axion {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Axion {
    fn from(text: String) -> Self {
        Self(text)
    }
}

/// Iterator over the [`AxionElement`]s of an [`Axion`].
#[derive(Clone, Debug)]
pub struct Elements<'a> {
    rest: &'a str,
}

impl<'a> Iterator for Elements<'a> {
    type Item = AxionElement<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let symbol = self.rest.chars().next()?;
        let mut end = symbol.len_utf8();
        let mut parameter = None;

        if self.rest[end..].starts_with('(') {
            let open = end + 1;
            // An unterminated parameter swallows the rest of the axion; the
            // interpreter rejects it as a non-numeric parameter.
            match self.rest[open..].find(')') {
                Some(len) => {
                    parameter = Some(&self.rest[open..open + len]);
                    end = open + len + 1;
                }
                None => {
                    parameter = Some(&self.rest[open..]);
                    end = self.rest.len();
                }
            }
        }

        let text = &self.rest[..end];
        self.rest = &self.rest[end..];
        Some(AxionElement {
            symbol,
            parameter,
            text,
        })
    }
}
