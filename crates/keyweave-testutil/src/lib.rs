use indexmap::IndexMap;
use keyweave_core::keys::KeyDomain;
use keyweave_core::schema::{KeySelection, SchemaGraph, TableSpec};

/// Four tables whose foreign keys form the cycle a → d → c → b → a.
pub fn cycle_schema() -> SchemaGraph {
    SchemaGraph::new([
        TableSpec::new("a").primary_key("id").foreign_key("id_parent", "d", "id"),
        TableSpec::new("b").primary_key("id").foreign_key("id_parent", "a", "id"),
        TableSpec::new("c").primary_key("id").foreign_key("id_parent", "b", "id"),
        TableSpec::new("d").primary_key("id").foreign_key("id_parent", "c", "id"),
    ])
    .expect("cycle schema is valid")
}

/// Five tables, each holding a primary-foreign key to every other one.
/// `e` also references itself.
pub fn connected_schema() -> SchemaGraph {
    let names = ["a", "b", "c", "d", "e"];
    let specs = names.iter().map(|&name| {
        let mut spec = TableSpec::new(name).primary_key("id");
        for &other in &names {
            if other != name || name == "e" {
                spec = spec.primary_foreign_key(format!("id_{}", other), other, "id");
            }
        }
        spec
    });
    SchemaGraph::new(specs).expect("connected schema is valid")
}

/// `b` is a link table between `a` and `c`; both of its keys are
/// primary-foreign.
pub fn many_many_schema() -> SchemaGraph {
    SchemaGraph::new([
        TableSpec::new("a").primary_key("id"),
        TableSpec::new("b")
            .primary_foreign_key("id_a", "a", "id")
            .primary_foreign_key("id_c", "c", "id"),
        TableSpec::new("c").primary_key("id"),
    ])
    .expect("many-many schema is valid")
}

/// `link` joins four owner tables with one primary-foreign key each.
pub fn four_way_link_schema() -> SchemaGraph {
    SchemaGraph::new([
        TableSpec::new("owner_a").primary_key("id"),
        TableSpec::new("owner_b").primary_key("id"),
        TableSpec::new("owner_c").primary_key("id"),
        TableSpec::new("owner_d").primary_key("id"),
        TableSpec::new("link")
            .primary_foreign_key("a", "owner_a", "id")
            .primary_foreign_key("b", "owner_b", "id")
            .primary_foreign_key("c", "owner_c", "id")
            .primary_foreign_key("d", "owner_d", "id"),
    ])
    .expect("four-way link schema is valid")
}

/// Users, their orders and the order items, with a non-key column on each.
pub fn ecommerce_schema() -> SchemaGraph {
    SchemaGraph::new([
        TableSpec::new("users").primary_key("id").column("email"),
        TableSpec::new("orders")
            .primary_key("id")
            .foreign_key("user_id", "users", "id")
            .column("total"),
        TableSpec::new("order_items")
            .primary_foreign_key("order_id", "orders", "id")
            .primary_key("line")
            .column("quantity"),
    ])
    .expect("ecommerce schema is valid")
}

/// Every pure primary-key column of every table holds `1..=size`.
///
/// Primary-foreign columns are left out, so link tables start with no rows.
pub fn contiguous_domain(graph: &SchemaGraph, size: i64) -> KeyDomain {
    let mut domain = KeyDomain::new();
    for table in graph.tables() {
        for column in table.pure_primary_keys() {
            domain.insert(table.name(), column, 1..=size);
        }
    }
    domain
}

/// Panic unless every foreign key in `rows` names a value that `domain`
/// holds for its owner column.
pub fn assert_references_resolve(
    graph: &SchemaGraph,
    table: &str,
    domain: &KeyDomain,
    rows: &[IndexMap<String, i64>],
) {
    let table_def = graph.table(table).expect("table exists");
    for (column, owner) in table_def.foreign_keys(KeySelection::All) {
        let known = domain
            .column(&owner.table, &owner.column)
            .unwrap_or_else(|| panic!("no domain for {}", owner));
        for (i, row) in rows.iter().enumerate() {
            let value = row[column];
            assert!(
                known.contains(&value),
                "{}.{} = {} in row {} does not reference an existing {}",
                table,
                column,
                value,
                i,
                owner
            );
        }
    }
}

/// Panic if two rows share the same primary-key tuple.
pub fn assert_unique_primary_keys(graph: &SchemaGraph, table: &str, rows: &[IndexMap<String, i64>]) {
    let table_def = graph.table(table).expect("table exists");
    let mut seen = std::collections::HashSet::new();
    for row in rows {
        let key: Vec<i64> = table_def.primary_keys().iter().map(|c| row[c.as_str()]).collect();
        assert!(seen.insert(key.clone()), "duplicate primary key {:?} in {}", key, table);
    }
}
