//! # Foreign-Key Coproduct
//!
//! For one table and one [`KeySelection`], maps each selected foreign-key
//! column to the values it may take. With a key domain those are the owner
//! column's known keys. Without one, the column gets a deferred marker naming
//! its owner, which the caller resolves once the owner's keys exist.

use indexmap::IndexMap;

use crate::error::{KeyweaveError, Result};
use crate::keys::domain::KeyDomain;
use crate::schema::{ForeignKeyRef, KeySelection, SchemaGraph};

/// Value domain of one foreign-key column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnDomain<'d> {
    /// Keys already known to exist in the owner column.
    Known(&'d [i64]),
    /// The owner's keys do not exist yet.
    Deferred(ForeignKeyRef),
}

impl ColumnDomain<'_> {
    pub fn is_deferred(&self) -> bool {
        matches!(self, ColumnDomain::Deferred(_))
    }
}

/// Foreign-key column → value domain, for one table and selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coproduct<'d> {
    table: String,
    mode: KeySelection,
    owners: IndexMap<String, ForeignKeyRef>,
    columns: IndexMap<String, ColumnDomain<'d>>,
}

/// Build the coproduct of `table`'s foreign keys selected by `mode`.
///
/// With a key domain, every selected owner column must be present in it;
/// a missing owner fails immediately with `MissingDomain`.
pub fn build_coproduct<'d>(
    graph: &SchemaGraph,
    table: &str,
    mode: KeySelection,
    domain: Option<&'d KeyDomain>,
) -> Result<Coproduct<'d>> {
    let table_def = graph.table(table)?;
    let owners: IndexMap<String, ForeignKeyRef> = table_def
        .foreign_keys(mode)
        .into_iter()
        .map(|(column, owner)| (column.to_string(), owner.clone()))
        .collect();

    let columns = match domain {
        Some(domain) => resolve_owners(table, &owners, domain)?,
        None => owners
            .iter()
            .map(|(column, owner)| (column.clone(), ColumnDomain::Deferred(owner.clone())))
            .collect(),
    };

    Ok(Coproduct {
        table: table.to_string(),
        mode,
        owners,
        columns,
    })
}

fn resolve_owners<'d>(
    table: &str,
    owners: &IndexMap<String, ForeignKeyRef>,
    domain: &'d KeyDomain,
) -> Result<IndexMap<String, ColumnDomain<'d>>> {
    owners
        .iter()
        .map(|(column, owner)| {
            let values = domain.column(&owner.table, &owner.column).ok_or_else(|| {
                KeyweaveError::MissingDomain {
                    table: table.to_string(),
                    column: column.clone(),
                    owner_table: owner.table.clone(),
                    owner_column: owner.column.clone(),
                }
            })?;
            Ok((column.clone(), ColumnDomain::Known(values)))
        })
        .collect()
}

impl<'d> Coproduct<'d> {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn mode(&self) -> KeySelection {
        self.mode
    }

    /// Foreign-key column names, in declaration order.
    pub fn labels(&self) -> Vec<&str> {
        self.columns.keys().map(String::as_str).collect()
    }

    pub fn get(&self, column: &str) -> Option<&ColumnDomain<'d>> {
        self.columns.get(column)
    }

    pub fn owner(&self, column: &str) -> Option<&ForeignKeyRef> {
        self.owners.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnDomain<'d>)> {
        self.columns.iter().map(|(c, d)| (c.as_str(), d))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// True when any column still waits for its owner's keys.
    pub fn is_deferred(&self) -> bool {
        self.columns.values().any(ColumnDomain::is_deferred)
    }

    /// Replace every domain with the owner's keys from `domain`.
    pub fn resolve<'e>(&self, domain: &'e KeyDomain) -> Result<Coproduct<'e>>
    where
        'd: 'e,
    {
        Ok(Coproduct {
            table: self.table.clone(),
            mode: self.mode,
            owners: self.owners.clone(),
            columns: resolve_owners(&self.table, &self.owners, domain)?,
        })
    }

    /// `(max of minimums, min of maximums)` over the known domains: the
    /// range every selected foreign key can take at once.
    ///
    /// `None` when the coproduct is empty or deferred, or when some domain
    /// has no values.
    pub fn shared_range(&self) -> Option<(i64, i64)> {
        if self.is_empty() {
            return None;
        }
        let mut start = i64::MIN;
        let mut stop = i64::MAX;
        for domain in self.columns.values() {
            let ColumnDomain::Known(values) = domain else {
                return None;
            };
            start = start.max(*values.iter().min()?);
            stop = stop.min(*values.iter().max()?);
        }
        Some((start, stop))
    }

    /// Sorted keys present in every known domain, restricted to
    /// [`Coproduct::shared_range`].
    ///
    /// A value drawn from here resolves in every owner at once.
    pub fn shared_values(&self) -> Option<Vec<i64>> {
        let (start, stop) = self.shared_range()?;
        let mut domains = self.columns.values().filter_map(|d| match d {
            ColumnDomain::Known(values) => Some(*values),
            ColumnDomain::Deferred(_) => None,
        });
        let first = domains.next()?;
        let others: Vec<std::collections::HashSet<i64>> =
            domains.map(|values| values.iter().copied().collect()).collect();

        let mut shared: Vec<i64> = first
            .iter()
            .copied()
            .filter(|v| (start..=stop).contains(v))
            .filter(|v| others.iter().all(|set| set.contains(v)))
            .collect();
        shared.sort_unstable();
        shared.dedup();
        Some(shared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::TableSpec;

    fn graph() -> SchemaGraph {
        SchemaGraph::new([
            TableSpec::new("a").primary_key("id"),
            TableSpec::new("b")
                .primary_foreign_key("id_a", "a", "id")
                .primary_foreign_key("id_c", "c", "id")
                .foreign_key("id_a_again", "a", "id"),
            TableSpec::new("c").primary_key("id"),
        ])
        .unwrap()
    }

    #[test]
    fn test_known_domains() {
        let graph = graph();
        let domain = KeyDomain::new().with("a", "id", 1..=4).with("c", "id", 2..=6);
        let coproduct =
            build_coproduct(&graph, "b", KeySelection::OnlyPrimary, Some(&domain)).unwrap();

        assert_eq!(coproduct.labels(), vec!["id_a", "id_c"]);
        assert_eq!(
            coproduct.get("id_a"),
            Some(&ColumnDomain::Known(&[1, 2, 3, 4][..]))
        );
        assert!(!coproduct.is_deferred());
        assert_eq!(coproduct.shared_range(), Some((2, 4)));
        assert_eq!(coproduct.shared_values(), Some(vec![2, 3, 4]));
    }

    #[test]
    fn test_deferred_without_domain() {
        let graph = graph();
        let coproduct = build_coproduct(&graph, "b", KeySelection::All, None).unwrap();

        assert_eq!(coproduct.len(), 3);
        assert!(coproduct.is_deferred());
        assert_eq!(
            coproduct.get("id_c"),
            Some(&ColumnDomain::Deferred(ForeignKeyRef::new("c", "id")))
        );
        assert_eq!(coproduct.shared_range(), None);
    }

    #[test]
    fn test_exclude_primary() {
        let graph = graph();
        let coproduct = build_coproduct(&graph, "b", KeySelection::ExcludePrimary, None).unwrap();
        assert_eq!(coproduct.labels(), vec!["id_a_again"]);
        assert_eq!(coproduct.owner("id_a_again"), Some(&ForeignKeyRef::new("a", "id")));
    }

    #[test]
    fn test_missing_owner_in_domain() {
        let graph = graph();
        let domain = KeyDomain::new().with("a", "id", 1..=4);
        let err =
            build_coproduct(&graph, "b", KeySelection::OnlyPrimary, Some(&domain)).unwrap_err();

        assert_eq!(
            err,
            KeyweaveError::MissingDomain {
                table: "b".to_string(),
                column: "id_c".to_string(),
                owner_table: "c".to_string(),
                owner_column: "id".to_string(),
            }
        );
        assert!(err.is_domain_consistency());
    }

    #[test]
    fn test_resolve_deferred() {
        let graph = graph();
        let deferred = build_coproduct(&graph, "b", KeySelection::OnlyPrimary, None).unwrap();

        let partial = KeyDomain::new().with("a", "id", 1..=2);
        assert!(deferred.resolve(&partial).is_err());

        let full = partial.with("c", "id", vec![7, 8]);
        let resolved = deferred.resolve(&full).unwrap();
        assert!(!resolved.is_deferred());
        assert_eq!(resolved.get("id_c"), Some(&ColumnDomain::Known(&[7, 8][..])));
        assert_eq!(resolved.shared_values(), Some(vec![]));
    }

    #[test]
    fn test_sparse_domains_intersect() {
        let graph = graph();
        let domain = KeyDomain::new()
            .with("a", "id", vec![5, 1, 3, 9, 3])
            .with("c", "id", vec![3, 4, 5, 6, 7]);
        let coproduct =
            build_coproduct(&graph, "b", KeySelection::OnlyPrimary, Some(&domain)).unwrap();
        assert_eq!(coproduct.shared_range(), Some((3, 7)));
        assert_eq!(coproduct.shared_values(), Some(vec![3, 5]));
    }

    #[test]
    fn test_table_without_foreign_keys() {
        let graph = graph();
        let coproduct = build_coproduct(&graph, "a", KeySelection::All, None).unwrap();
        assert!(coproduct.is_empty());
        assert_eq!(coproduct.shared_values(), None);
    }

    #[test]
    fn test_unknown_table() {
        let graph = graph();
        assert!(matches!(
            build_coproduct(&graph, "zzz", KeySelection::All, None),
            Err(KeyweaveError::UnknownTable { .. })
        ));
    }
}
