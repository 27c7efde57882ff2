use serde::Serialize;

use super::{person_key, relation_rows, RawTable, RelationRow};

const BIDIRECTIONAL_FLAG: &str = "bi";
const UNCERTAIN_FLAG: &str = "?";

/// Modifiers parsed from the comma-separated `Extra` column.
/// Unrecognized tokens are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RelationFlags {
    /// Drawn as an undirected edge.
    pub bidirectional: bool,
    /// Drawn dashed.
    pub uncertain: bool,
}

impl RelationFlags {
    pub fn parse(extra: &str) -> Self {
        let mut flags = Self::default();
        for token in extra.split(',').map(str::trim) {
            match token {
                BIDIRECTIONAL_FLAG => flags.bidirectional = true,
                UNCERTAIN_FLAG => flags.uncertain = true,
                _ => {}
            }
        }
        flags
    }
}

/// One line of the relations sheet. `actor` and `target` are lookup keys and
/// need not exist in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub actor: String,
    pub label: String,
    pub target: String,
    pub flags: RelationFlags,
}

impl Relation {
    pub fn from_row(row: RelationRow) -> Self {
        Self {
            actor: person_key(&row.actor),
            label: row.relation,
            target: person_key(&row.target),
            flags: RelationFlags::parse(&row.extra),
        }
    }
}

/// Build the relation sequence from a raw relations sheet, in sheet order.
pub fn relations_from_table(table: &RawTable) -> Vec<Relation> {
    relation_rows(table)
        .into_iter()
        .map(Relation::from_row)
        .collect()
}
