//! # Key Iteration Engine
//!
//! Produces the row key dictionaries of one table: every primary key,
//! foreign key and primary-foreign key, one dictionary per synthetic row.
//!
//! The table's keys split into three disjoint label sets, each enumerated by
//! its own labeled sequencer:
//!
//! - primary-foreign keys (primary keys that are also foreign keys)
//! - pure foreign keys (foreign keys that are not primary keys)
//! - pure primary keys (primary keys that are not foreign keys)
//!
//! The i-th row is the union of the i-th item of each stream. Iteration ends
//! when any bounded stream runs out; with no bounds anywhere it never ends
//! and the caller must impose a limit.
//!
//! With a key domain, each foreign stream draws its values from the keys
//! shared by all its owners, which keeps every generated foreign key inside
//! `[max(min), min(max)]` of the owners' ranges and guarantees it resolves
//! to an existing row. Rows whose primary-key tuple the domain already holds
//! for the table itself are skipped, so a table can be generated again after
//! its own rows were recorded.

use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

use crate::error::{KeyweaveError, Result};
use crate::keys::coproduct::{build_coproduct, Coproduct};
use crate::keys::domain::KeyDomain;
use crate::schema::{KeySelection, SchemaGraph, Table};
use crate::sequence::{Bounds, Labeled, Sequencer, DEFAULT_START};

/// One row's keys: column name → value, in the table's column order.
pub type RowKey = IndexMap<String, i64>;

/// Caller-facing knobs for [`iterate_rows`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterOptions {
    pub sequencer: Sequencer,
    /// First value when no key domain is supplied (default 1).
    pub start: Option<i64>,
    /// Last value when no key domain is supplied (default unbounded).
    pub stop: Option<i64>,
    /// How many consecutive rows share each pure-foreign combination.
    pub repeat: usize,
    /// Stop after this many rows.
    pub limit: Option<usize>,
}

impl Default for IterOptions {
    fn default() -> Self {
        Self {
            sequencer: Sequencer::default(),
            start: None,
            stop: None,
            repeat: 1,
            limit: None,
        }
    }
}

impl IterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequencer(mut self, sequencer: Sequencer) -> Self {
        self.sequencer = sequencer;
        self
    }

    pub fn bounds(mut self, start: Option<i64>, stop: Option<i64>) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }

    pub fn repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn has_explicit_bounds(&self) -> bool {
        self.start.is_some() || self.stop.is_some()
    }
}

/// The three disjoint key streams of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    PrimaryForeign,
    PureForeign,
    PurePrimary,
}

impl StreamKind {
    /// Slot of this stream in [`RowKeys`].
    fn index(self) -> usize {
        match self {
            StreamKind::PrimaryForeign => 0,
            StreamKind::PureForeign => 1,
            StreamKind::PurePrimary => 2,
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamKind::PrimaryForeign => write!(f, "primary-foreign"),
            StreamKind::PureForeign => write!(f, "pure-foreign"),
            StreamKind::PurePrimary => write!(f, "pure-primary"),
        }
    }
}

/// How one stream was set up: its labels and the value range it covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPlan {
    pub kind: StreamKind,
    pub labels: Vec<String>,
    /// Range of generated values; `None` for a stream with no labels.
    pub bounds: Option<Bounds>,
    /// Number of distinct values available per coordinate, when drawn from
    /// a key domain.
    pub domain_size: Option<usize>,
}

struct KeyStream {
    plan: StreamPlan,
    sequence: Option<Labeled>,
    /// Rank → key lookup when values come from a key domain.
    values: Option<Vec<i64>>,
    repeat: usize,
    pending: Option<(RowKey, usize)>,
}

impl KeyStream {
    fn empty(kind: StreamKind) -> Self {
        Self {
            plan: StreamPlan {
                kind,
                labels: Vec::new(),
                bounds: None,
                domain_size: None,
            },
            sequence: None,
            values: None,
            repeat: 1,
            pending: None,
        }
    }

    /// Values come straight from the sequencer over `bounds`.
    fn direct(
        kind: StreamKind,
        labels: Vec<String>,
        sequencer: Sequencer,
        bounds: Bounds,
    ) -> Result<Self> {
        if labels.is_empty() {
            return Ok(Self::empty(kind));
        }
        let sequence = sequencer.labeled(labels.as_slice(), bounds)?;
        Ok(Self {
            plan: StreamPlan {
                kind,
                labels,
                bounds: Some(bounds),
                domain_size: None,
            },
            sequence: Some(sequence),
            values: None,
            repeat: 1,
            pending: None,
        })
    }

    /// The sequencer enumerates ranks into `values`, so every coordinate is
    /// a key present in all owner domains.
    fn from_values(
        kind: StreamKind,
        labels: Vec<String>,
        sequencer: Sequencer,
        range: (i64, i64),
        values: Vec<i64>,
    ) -> Result<Self> {
        let last_rank = i64::try_from(values.len()).unwrap_or(i64::MAX) - 1;
        let ranks = Bounds::new(Some(0), Some(last_rank))?;
        let sequence = sequencer.labeled(labels.as_slice(), ranks)?;
        Ok(Self {
            plan: StreamPlan {
                kind,
                labels,
                bounds: Some(Bounds::new(Some(range.0), Some(range.1))?),
                domain_size: Some(values.len()),
            },
            sequence: Some(sequence),
            values: Some(values),
            repeat: 1,
            pending: None,
        })
    }

    fn with_repeat(mut self, repeat: usize) -> Self {
        self.repeat = repeat;
        self
    }

    fn lookup(&self, mut row: RowKey) -> Option<RowKey> {
        if let Some(values) = &self.values {
            for value in row.values_mut() {
                *value = *values.get(usize::try_from(*value).ok()?)?;
            }
        }
        Some(row)
    }
}

impl Iterator for KeyStream {
    type Item = RowKey;

    fn next(&mut self) -> Option<RowKey> {
        let Some(sequence) = self.sequence.as_mut() else {
            // No labels: contributes nothing to the row and never runs out.
            return Some(RowKey::new());
        };
        if let Some((row, remaining)) = self.pending.as_mut() {
            if *remaining > 0 {
                *remaining -= 1;
                return Some(row.clone());
            }
        }
        let raw = sequence.next()?;
        let row = self.lookup(raw)?;
        if self.repeat > 1 {
            self.pending = Some((row.clone(), self.repeat - 1));
        }
        Some(row)
    }
}

/// Lazy stream of row key dictionaries for one table.
///
/// Owns everything it needs, so it can be moved to another thread; two
/// streams never share state.
pub struct RowKeys {
    table: String,
    columns: IndexSet<String>,
    /// Indexed by [`StreamKind::index`].
    streams: [KeyStream; 3],
    primary_keys: Vec<String>,
    /// Primary-key tuples already present in the key domain.
    existing: HashSet<Vec<i64>>,
    limit: Option<usize>,
    yielded: usize,
}

impl RowKeys {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn plan(&self, kind: StreamKind) -> &StreamPlan {
        &self.streams[kind.index()].plan
    }

    pub fn plans(&self) -> impl Iterator<Item = &StreamPlan> {
        self.streams.iter().map(|s| &s.plan)
    }

    fn merged_row(&mut self) -> Option<RowKey> {
        let mut row = RowKey::new();
        for stream in &mut self.streams {
            row.extend(stream.next()?);
        }
        Some(row)
    }

    fn is_existing(&self, row: &RowKey) -> bool {
        if self.existing.is_empty() {
            return false;
        }
        let key: Option<Vec<i64>> = self
            .primary_keys
            .iter()
            .map(|column| row.get(column.as_str()).copied())
            .collect();
        key.is_some_and(|key| self.existing.contains(&key))
    }
}

impl Iterator for RowKeys {
    type Item = RowKey;

    fn next(&mut self) -> Option<RowKey> {
        if self.limit.is_some_and(|limit| self.yielded >= limit) {
            return None;
        }
        let mut row = self.merged_row()?;
        while self.is_existing(&row) {
            row = self.merged_row()?;
        }
        let columns = &self.columns;
        row.sort_by(|a, _, b, _| {
            columns
                .get_index_of(a.as_str())
                .cmp(&columns.get_index_of(b.as_str()))
        });
        self.yielded += 1;
        Some(row)
    }
}

/// Plan and start the row key stream for `table`.
///
/// Every error is raised here, before any row is produced: unknown tables,
/// ambiguous bounds (explicit `start`/`stop` together with a key domain),
/// invalid bounds or repeat counts, owners missing from the key domain and
/// owners whose domains share no values.
pub fn iterate_rows(
    graph: &SchemaGraph,
    table: &str,
    domain: Option<&KeyDomain>,
    options: &IterOptions,
) -> Result<RowKeys> {
    let table_def = graph.table(table)?;
    if domain.is_some() && options.has_explicit_bounds() {
        return Err(KeyweaveError::AmbiguousBounds {
            table: table.to_string(),
        });
    }
    if options.repeat == 0 {
        return Err(KeyweaveError::InvalidRepeat {
            repeat: options.repeat,
        });
    }
    let explicit = Bounds::new(options.start, options.stop)?;

    let primary_foreign = build_coproduct(graph, table, KeySelection::OnlyPrimary, domain)?;
    let pure_foreign = build_coproduct(graph, table, KeySelection::ExcludePrimary, domain)?;

    let streams = [
        foreign_stream(
            StreamKind::PrimaryForeign,
            &primary_foreign,
            options.sequencer,
            explicit,
        )?,
        foreign_stream(
            StreamKind::PureForeign,
            &pure_foreign,
            options.sequencer,
            explicit,
        )?
        .with_repeat(options.repeat),
        primary_stream(table_def, domain, options.sequencer, explicit)?,
    ];

    let existing = domain
        .map(|domain| existing_primary_keys(table_def, domain))
        .unwrap_or_default();

    for stream in &streams {
        debug!(
            table = table,
            stream = %stream.plan.kind,
            labels = ?stream.plan.labels,
            bounds = ?stream.plan.bounds,
            domain_size = ?stream.plan.domain_size,
            "planned key stream"
        );
    }
    if !existing.is_empty() {
        debug!(
            table = table,
            existing = existing.len(),
            "skipping primary keys already in the key domain"
        );
    }

    Ok(RowKeys {
        table: table.to_string(),
        columns: table_def.columns().clone(),
        streams,
        primary_keys: table_def.primary_keys().iter().cloned().collect(),
        existing,
        limit: options.limit,
        yielded: 0,
    })
}

fn foreign_stream(
    kind: StreamKind,
    coproduct: &Coproduct<'_>,
    sequencer: Sequencer,
    explicit: Bounds,
) -> Result<KeyStream> {
    let labels: Vec<String> = coproduct.labels().into_iter().map(String::from).collect();
    if labels.is_empty() {
        return Ok(KeyStream::empty(kind));
    }
    if coproduct.is_deferred() {
        return KeyStream::direct(kind, labels, sequencer, explicit);
    }

    let empty = || KeyweaveError::EmptyDomain {
        table: coproduct.table().to_string(),
        columns: labels.join(", "),
    };
    let range = coproduct.shared_range().ok_or_else(empty)?;
    let values = coproduct.shared_values().unwrap_or_default();
    if values.is_empty() {
        return Err(empty());
    }
    KeyStream::from_values(kind, labels, sequencer, range, values)
}

fn primary_stream(
    table: &Table,
    domain: Option<&KeyDomain>,
    sequencer: Sequencer,
    explicit: Bounds,
) -> Result<KeyStream> {
    let labels: Vec<String> = table
        .pure_primary_keys()
        .into_iter()
        .map(String::from)
        .collect();

    let bounds = match domain {
        None => explicit,
        Some(domain) => {
            // Continue after the table's own existing keys, if it has any.
            let existing = labels
                .iter()
                .filter_map(|column| domain.column(table.name(), column))
                .flat_map(|values| values.iter().copied())
                .max();
            let start = existing.map_or(DEFAULT_START, |max| max.saturating_add(1));
            Bounds::new(Some(start), None)?
        }
    };
    KeyStream::direct(StreamKind::PurePrimary, labels, sequencer, bounds)
}

/// Primary-key tuples the domain records for `table` itself, row by row.
///
/// Empty unless every primary-key column of the table has an entry.
fn existing_primary_keys(table: &Table, domain: &KeyDomain) -> HashSet<Vec<i64>> {
    let columns: Option<Vec<&[i64]>> = table
        .primary_keys()
        .iter()
        .map(|column| domain.column(table.name(), column))
        .collect();
    let Some(columns) = columns else {
        return HashSet::new();
    };
    let rows = columns.iter().map(|values| values.len()).min().unwrap_or(0);
    (0..rows)
        .map(|i| columns.iter().map(|values| values[i]).collect())
        .collect()
}
