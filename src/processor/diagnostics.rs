use std::fmt;

use serde::Serialize;

/// What went wrong with a single field or record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// The asset entry was not a mapping and was dropped.
    SkippedRecord,
    /// Field absent or null; the default was used.
    MissingField,
    /// Field present with a shape that is neither a number nor a peg map.
    MalformedField,
    /// Non-numeric entries found inside a peg map and left out of the sum.
    IgnoredPegEntries { keys: Vec<String> },
    /// Negative supply clamped to zero.
    NegativeSupply { value: f64 },
    /// A chain entry that is not a mapping; its snapshots default to zero.
    MalformedChainEntry,
    /// Asset supply disagrees with the sum of its chain supplies.
    SupplyMismatch { asset: f64, chains: f64 },
}

/// A data-quality finding tied to where it was observed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// Position of the offending entry in its list: the asset entry for
    /// listing responses, the series point for balance history.
    pub index: usize,
    pub asset_id: Option<String>,
    pub chain: Option<String>,
    pub field: Option<String>,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "asset #{} ({})",
            self.index,
            self.asset_id.as_deref().unwrap_or("?")
        )?;
        if let Some(chain) = &self.chain {
            write!(f, " chain {}", chain)?;
        }
        if let Some(field) = &self.field {
            write!(f, " field {}", field)?;
        }
        write!(f, ": {:?}", self.kind)
    }
}

/// Collected diagnostics for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.items.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Number of diagnostics matching a predicate on the kind.
    pub fn count_where(&self, pred: impl Fn(&DiagnosticKind) -> bool) -> usize {
        self.items.iter().filter(|d| pred(&d.kind)).count()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

/// Location context shared by every diagnostic raised for one asset entry.
#[derive(Debug, Clone)]
pub(crate) struct Scope<'a> {
    pub index: usize,
    pub asset_id: Option<&'a str>,
    pub chain: Option<&'a str>,
}

impl<'a> Scope<'a> {
    pub fn asset(index: usize, asset_id: Option<&'a str>) -> Self {
        Self {
            index,
            asset_id,
            chain: None,
        }
    }

    pub fn with_chain(&self, chain: &'a str) -> Self {
        Self {
            chain: Some(chain),
            ..self.clone()
        }
    }

    pub fn report(&self, field: Option<&str>, kind: DiagnosticKind) -> Diagnostic {
        Diagnostic {
            index: self.index,
            asset_id: self.asset_id.map(str::to_string),
            chain: self.chain.map(str::to_string),
            field: field.map(str::to_string),
            kind,
        }
    }
}
