use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use crate::error::{KeyweaveError, Result};
use crate::schema::graph::SchemaGraph;
use crate::schema::types::KeySelection;

/// Directed view of the schema graph: one node per table, one edge per
/// foreign key, pointing from the dependent table to its owner.
///
/// The key iteration engine never needs this. It helps callers decide in
/// which order to materialize key domains, and tells them which tables sit
/// on a cycle and therefore need a domain supplied up front.
pub struct DependencyGraph {
    pub graph: DiGraph<String, String>,
    pub node_indices: HashMap<String, NodeIndex>,
}

impl DependencyGraph {
    pub fn from_schema(schema: &SchemaGraph) -> Self {
        let mut graph = DiGraph::new();
        let mut node_indices = HashMap::new();

        for table in schema.tables() {
            let idx = graph.add_node(table.name().to_string());
            node_indices.insert(table.name().to_string(), idx);
        }

        for table in schema.tables() {
            for (column, owner) in table.foreign_keys(KeySelection::All) {
                // Owners are validated by SchemaGraph, so both lookups succeed.
                if let (Some(&from), Some(&to)) = (
                    node_indices.get(table.name()),
                    node_indices.get(&owner.table),
                ) {
                    graph.add_edge(from, to, column.to_string());
                }
            }
        }

        Self {
            graph,
            node_indices,
        }
    }

    pub fn table_name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub fn node_index(&self, table_name: &str) -> Option<NodeIndex> {
        self.node_indices.get(table_name).copied()
    }

    /// Tables whose foreign keys point at `table_name`.
    pub fn dependents(&self, table_name: &str) -> Vec<&str> {
        let Some(idx) = self.node_index(table_name) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .edges_directed(idx, petgraph::Direction::Incoming)
            .map(|edge| self.table_name(edge.source()))
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    /// Groups of tables that reference each other, directly or through a
    /// chain of foreign keys. Self-referencing tables form their own group.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || self.graph.find_edge(scc[0], scc[0]).is_some()
            })
            .map(|scc| {
                let mut names: Vec<String> = scc
                    .iter()
                    .map(|&idx| self.table_name(idx).to_string())
                    .collect();
                names.sort();
                names
            })
            .collect()
    }

    /// Tables ordered so that every owner precedes its dependents.
    ///
    /// Fails with `CircularDependency` when the foreign keys form a cycle;
    /// such schemas need every owner's key domain supplied up front.
    pub fn owner_first_order(&self) -> Result<Vec<String>> {
        if let Some(cycle) = self.cycles().into_iter().next() {
            return Err(KeyweaveError::CircularDependency {
                tables: cycle.join(", "),
            });
        }
        // Edges point dependent -> owner, so toposort lists dependents first.
        let sorted = toposort(&self.graph, None).map_err(|cycle| {
            KeyweaveError::CircularDependency {
                tables: self.table_name(cycle.node_id()).to_string(),
            }
        })?;
        Ok(sorted
            .iter()
            .rev()
            .map(|&idx| self.table_name(idx).to_string())
            .collect())
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl SchemaGraph {
    /// Build the foreign-key dependency view of this graph.
    pub fn dependencies(&self) -> DependencyGraph {
        DependencyGraph::from_schema(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::TableSpec;

    fn chain() -> SchemaGraph {
        SchemaGraph::new([
            TableSpec::new("order_items")
                .primary_key("id")
                .foreign_key("order_id", "orders", "id"),
            TableSpec::new("orders")
                .primary_key("id")
                .foreign_key("user_id", "users", "id"),
            TableSpec::new("users").primary_key("id"),
        ])
        .unwrap()
    }

    #[test]
    fn test_build_graph() {
        let deps = chain().dependencies();
        assert_eq!(deps.table_count(), 3);
        assert_eq!(deps.edge_count(), 2);
        assert_eq!(deps.dependents("users"), vec!["orders"]);
        assert!(deps.dependents("order_items").is_empty());
    }

    #[test]
    fn test_owner_first_order() {
        let order = chain().dependencies().owner_first_order().unwrap();
        let pos = |name: &str| order.iter().position(|t| t == name).unwrap();
        assert!(pos("users") < pos("orders"));
        assert!(pos("orders") < pos("order_items"));
    }

    #[test]
    fn test_cycle_detected() {
        let graph = SchemaGraph::new([
            TableSpec::new("a")
                .primary_key("id")
                .foreign_key("id_parent", "b", "id"),
            TableSpec::new("b")
                .primary_key("id")
                .foreign_key("id_parent", "a", "id"),
            TableSpec::new("c").primary_key("id"),
        ])
        .unwrap();
        let deps = graph.dependencies();

        assert_eq!(deps.cycles(), vec![vec!["a".to_string(), "b".to_string()]]);
        assert!(matches!(
            deps.owner_first_order(),
            Err(KeyweaveError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let graph = SchemaGraph::new([TableSpec::new("categories")
            .primary_key("id")
            .foreign_key("parent_id", "categories", "id")])
        .unwrap();
        assert_eq!(
            graph.dependencies().cycles(),
            vec![vec!["categories".to_string()]]
        );
    }
}
