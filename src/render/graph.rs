//! DOT rendering of the relationship network.

use std::collections::HashSet;

use crate::models::{Person, PersonRegistry, Relation};

const NODE_DEFAULTS: &str =
    "node [style=filled,shape=box,color=\"#009879\",fillcolor=\"#8DE2D1\",fontcolor=black]";
const EDGE_DEFAULTS: &str = "edge [color=black]";

const DIRECTED: &str = "->";
const UNDIRECTED: &str = "--";

/// Render the relation sequence as a graph-description document.
///
/// Nodes are emitted once, right before the first edge that mentions them,
/// so node order follows first appearance in the relations sheet.
///
/// Example output:
/// ```text
/// digraph G{
/// node [style=filled,shape=box,color="#009879",fillcolor="#8DE2D1",fontcolor=black]
/// edge [color=black]
/// "grak" [title="A big orc",label="Grak"]
/// "elira" [title="",label="Elira"]
/// "grak" -- "elira" [label="hates",style=dashed]
/// }
/// ```
pub fn render_graph(relations: &[Relation], persons: &PersonRegistry) -> String {
    let mut output = String::from("digraph G{\n");
    output.push_str(NODE_DEFAULTS);
    output.push('\n');
    output.push_str(EDGE_DEFAULTS);
    output.push('\n');

    let mut emitted: HashSet<&str> = HashSet::new();
    for relation in relations {
        for key in [relation.actor.as_str(), relation.target.as_str()] {
            if emitted.insert(key) {
                render_node(&mut output, key, &persons.resolve(key));
            }
        }
        render_edge(&mut output, relation);
    }

    output.push('}');
    output
}

/// Description with all quote characters removed, safe for a quoted attribute.
pub fn node_title(person: &Person) -> String {
    person
        .description
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect()
}

fn render_node(output: &mut String, key: &str, person: &Person) {
    output.push_str(&format!(
        "{} [title={},label={}]\n",
        quoted(key),
        quoted(&node_title(person)),
        quoted(&person.name)
    ));
}

fn render_edge(output: &mut String, relation: &Relation) {
    let arrow = if relation.flags.bidirectional {
        UNDIRECTED
    } else {
        DIRECTED
    };
    let style = if relation.flags.uncertain {
        ",style=dashed"
    } else {
        ""
    };
    output.push_str(&format!(
        "{} {} {} [label={}{}]\n",
        quoted(&relation.actor),
        arrow,
        quoted(&relation.target),
        quoted(&relation.label),
        style
    ));
}

/// DOT quoted string. Backslashes are escaped first so a trailing `\`
/// cannot swallow the closing quote.
fn quoted(text: &str) -> String {
    format!(
        "\"{}\"",
        text.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CharacterRow, RelationFlags};

    fn person(name: &str, description: &str) -> CharacterRow {
        CharacterRow {
            name: name.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    fn relation(actor: &str, label: &str, target: &str, extra: &str) -> Relation {
        Relation {
            actor: actor.to_string(),
            label: label.to_string(),
            target: target.to_string(),
            flags: RelationFlags::parse(extra),
        }
    }

    fn edge_lines(doc: &str) -> Vec<&str> {
        doc.lines().filter(|l| l.contains(" -> ") || l.contains(" -- ")).collect()
    }

    #[test]
    fn empty_relations_yield_header_only_document() {
        let doc = render_graph(&[], &PersonRegistry::new());
        assert_eq!(doc, format!("digraph G{{\n{}\n{}\n}}", NODE_DEFAULTS, EDGE_DEFAULTS));
    }

    #[test]
    fn bidirectional_uncertain_edge_matches_exactly() {
        let persons = PersonRegistry::from_rows(vec![person("Grak", ""), person("Elira", "")]);
        let doc = render_graph(&[relation("grak", "hates", "elira", "bi,?")], &persons);
        assert_eq!(
            edge_lines(&doc),
            vec![r#""grak" -- "elira" [label="hates",style=dashed]"#]
        );
    }

    #[test]
    fn arrow_and_dash_are_independent() {
        let persons = PersonRegistry::new();
        let relations = vec![
            relation("a", "x", "b", ""),
            relation("a", "x", "b", "bi"),
            relation("a", "x", "b", "?"),
            relation("a", "x", "b", "?,bi"),
        ];
        let doc = render_graph(&relations, &persons);
        assert_eq!(
            edge_lines(&doc),
            vec![
                r#""a" -> "b" [label="x"]"#,
                r#""a" -- "b" [label="x"]"#,
                r#""a" -> "b" [label="x",style=dashed]"#,
                r#""a" -- "b" [label="x",style=dashed]"#,
            ]
        );
    }

    #[test]
    fn nodes_are_emitted_once_in_first_appearance_order() {
        let persons = PersonRegistry::new();
        let relations = vec![
            relation("b", "knows", "a", ""),
            relation("a", "knows", "c", ""),
            relation("c", "knows", "b", ""),
        ];
        let doc = render_graph(&relations, &persons);
        let nodes: Vec<&str> = doc.lines().filter(|l| l.contains("[title=")).collect();
        assert_eq!(
            nodes,
            vec![
                r#""b" [title="",label="b"]"#,
                r#""a" [title="",label="a"]"#,
                r#""c" [title="",label="c"]"#,
            ]
        );
        // node "c" is introduced right before the edge that first mentions it
        let lines: Vec<&str> = doc.lines().collect();
        let c_node = lines.iter().position(|l| l.starts_with("\"c\" [title")).unwrap();
        let a_c_edge = lines.iter().position(|l| l.starts_with("\"a\" -> \"c\"")).unwrap();
        assert_eq!(c_node + 1, a_c_edge);
    }

    #[test]
    fn node_title_strips_quotes_and_label_keeps_display_name() {
        let persons = PersonRegistry::from_rows(vec![person("Grak", "A \"big\" orc's axe")]);
        let doc = render_graph(&[relation("grak", "owns", "grak", "")], &persons);
        assert!(doc.contains(r#""grak" [title="A big orcs axe",label="Grak"]"#));
        assert_eq!(doc.matches("[title=").count(), 1);
    }

    #[test]
    fn unknown_persons_still_get_nodes_and_edges() {
        let persons = PersonRegistry::from_rows(vec![person("Grak", "orc")]);
        let doc = render_graph(&[relation("grak", "fears", "shadow", "")], &persons);
        assert!(doc.contains(r#""shadow" [title="",label="shadow"]"#));
        assert!(doc.contains(r#""grak" -> "shadow" [label="fears"]"#));
    }

    #[test]
    fn quotes_in_labels_are_escaped() {
        let doc = render_graph(&[relation("a", "calls him \"boss\"", "b", "")], &PersonRegistry::new());
        assert!(doc.contains(r#"[label="calls him \"boss\""]"#));
    }

    #[test]
    fn trailing_backslashes_do_not_break_quoting() {
        let persons = PersonRegistry::from_rows(vec![
            person("Grak", "Carries a dagger \\"),
            person("Bob", ""),
        ]);
        let doc = render_graph(&[relation("grak", "owes C:\\", "bob", "")], &persons);
        assert!(doc.contains(r#""grak" [title="Carries a dagger \\",label="Grak"]"#));
        assert!(doc.contains(r#""grak" -> "bob" [label="owes C:\\"]"#));

        // every quote that is not escaped opens or closes a string
        for line in doc.lines() {
            let mut open = false;
            let mut chars = line.chars();
            while let Some(c) = chars.next() {
                match c {
                    '\\' if open => {
                        chars.next();
                    }
                    '"' => open = !open,
                    _ => {}
                }
            }
            assert!(!open, "unbalanced quoting in line: {}", line);
        }
    }
}
