//! HTML table of all characters.
//!
//! Free-text cells are inserted verbatim: sheet authors may embed markup in
//! descriptions and the sheet is a trusted source. Only the name cell wrapper
//! is generated here.

use crate::models::{Person, PersonRegistry};

pub const ROSTER_TABLE_ID: &str = "persons_table";
pub const ROSTER_TABLE_CLASSES: &str = "personstable display";

const COLUMNS: [(&str, u8); 5] = [
    ("Name", 15),
    ("Race", 10),
    ("Locations", 10),
    ("Appeared", 10),
    ("Description", 55),
];

/// Persons sorted by display name (ordinal, case-sensitive, stable).
pub fn roster_order(persons: &PersonRegistry) -> Vec<&Person> {
    let mut sorted: Vec<&Person> = persons.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));
    sorted
}

/// Render the roster as a complete `<table>` fragment.
pub fn render_roster(persons: &PersonRegistry) -> String {
    let mut output = format!(
        "<table class=\"{}\" id=\"{}\">\n",
        ROSTER_TABLE_CLASSES, ROSTER_TABLE_ID
    );

    output.push_str("<colgroup>");
    for (_, width) in COLUMNS {
        output.push_str(&format!("<col style='width: {}% !important;'>", width));
    }
    output.push_str("</colgroup>\n");

    output.push_str("<thead>\n<tr>");
    for (title, _) in COLUMNS {
        output.push_str(&format!("<th>{}</th>", title));
    }
    output.push_str("</tr>\n</thead>\n<tbody>\n");

    for person in roster_order(persons) {
        output.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_name(person),
            person.race,
            html_locations(person),
            person.appeared,
            person.description
        ));
    }

    output.push_str("</tbody>\n</table>");
    output
}

/// Name cell: struck through when dead, bold for living player characters.
pub fn html_name(person: &Person) -> String {
    if !person.alive {
        format!("<del>{}</del>", person.name)
    } else if person.is_player {
        format!("<b>{}</b>", person.name)
    } else {
        person.name.clone()
    }
}

pub fn html_locations(person: &Person) -> String {
    person
        .locations
        .iter()
        .map(|l| capitalize(l))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
