use thiserror::Error;

use super::{RawRow, RawTable};

pub const CHARACTERS_TABLE: &str = "characters";
pub const RELATIONS_TABLE: &str = "relations";

/// A single input row failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("{table} sheet line {line}: missing required field `{field}`")]
    MissingField {
        table: &'static str,
        /// Spreadsheet line number (the header is line 1).
        line: usize,
        field: &'static str,
    },
}

/// A validated row of the character sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CharacterRow {
    pub name: String,
    pub description: String,
    pub race: String,
    pub locations: String,
    pub appeared: String,
    pub keywords: String,
}

impl CharacterRow {
    pub fn from_raw(index: usize, row: &RawRow) -> Result<Self, RowError> {
        Ok(Self {
            name: required(row, "Name", CHARACTERS_TABLE, index)?,
            description: optional(row, "Description"),
            race: optional(row, "Race"),
            locations: optional(row, "Locations"),
            appeared: optional(row, "Appeared"),
            keywords: optional(row, "Keywords"),
        })
    }
}

/// A validated row of the relations sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationRow {
    pub actor: String,
    pub relation: String,
    pub target: String,
    pub extra: String,
}

impl RelationRow {
    pub fn from_raw(index: usize, row: &RawRow) -> Result<Self, RowError> {
        Ok(Self {
            actor: required(row, "Actor", RELATIONS_TABLE, index)?,
            relation: optional(row, "Relation"),
            target: required(row, "Target", RELATIONS_TABLE, index)?,
            extra: optional(row, "Extra"),
        })
    }
}

/// Validate every row of the character sheet, skipping the malformed ones.
pub fn character_rows(table: &RawTable) -> Vec<CharacterRow> {
    collect_valid(table, CharacterRow::from_raw)
}

/// Validate every row of the relations sheet, skipping the malformed ones.
pub fn relation_rows(table: &RawTable) -> Vec<RelationRow> {
    collect_valid(table, RelationRow::from_raw)
}

fn collect_valid<T>(table: &RawTable, parse: fn(usize, &RawRow) -> Result<T, RowError>) -> Vec<T> {
    table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| match parse(i, row) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Skipping malformed row: {}", e);
                None
            }
        })
        .collect()
}

fn required(
    row: &RawRow,
    field: &'static str,
    table: &'static str,
    index: usize,
) -> Result<String, RowError> {
    match row.get(field).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(RowError::MissingField {
            table,
            line: index + 2,
            field,
        }),
    }
}

fn optional(row: &RawRow, field: &str) -> String {
    row.get(field).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn character_without_name_is_rejected() {
        let err = CharacterRow::from_raw(3, &raw(&[("Description", "nobody")])).unwrap_err();
        assert_eq!(
            err,
            RowError::MissingField {
                table: CHARACTERS_TABLE,
                line: 5,
                field: "Name"
            }
        );
    }

    #[test]
    fn blank_name_counts_as_missing() {
        assert!(CharacterRow::from_raw(0, &raw(&[("Name", "   ")])).is_err());
    }

    #[test]
    fn optional_character_columns_default_to_empty() {
        let row = CharacterRow::from_raw(0, &raw(&[("Name", "Grak")])).unwrap();
        assert_eq!(row.name, "Grak");
        assert!(row.keywords.is_empty());
        assert!(row.race.is_empty());
    }

    #[test]
    fn relation_requires_actor_and_target() {
        assert!(RelationRow::from_raw(0, &raw(&[("Actor", "grak"), ("Relation", "hates")])).is_err());
        assert!(RelationRow::from_raw(0, &raw(&[("Target", "elira")])).is_err());
    }

    #[test]
    fn malformed_rows_are_skipped_not_fatal() {
        let table = RawTable::new(vec![
            raw(&[("Name", "Grak")]),
            raw(&[("Name", "")]),
            raw(&[("Name", "Elira")]),
        ]);
        let rows = character_rows(&table);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].name, "Elira");
    }
}
