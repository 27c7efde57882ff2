//! The single HTML page: graph, roster and reload status.

use chrono::Local;
use handlebars::Handlebars;
use serde::Serialize;

use crate::store::Snapshot;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.hbs");
const TIMESTAMP_FORMAT: &str = "%b %d %Y %H:%M:%S";

#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    pub character_sheet: Option<String>,
    pub relations_sheet: Option<String>,
}

#[derive(Serialize)]
struct PageContext<'a> {
    dotgraph: String,
    persons_table: String,
    not_reloaded_since: String,
    n_persons: usize,
    n_connections: usize,
    character_sheet_link: Option<&'a str>,
    relations_sheet_link: Option<&'a str>,
    vis_js_url: &'a str,
    notice: Option<&'a str>,
}

pub struct PageRenderer {
    registry: Handlebars<'static>,
    links: PageLinks,
    vis_js_url: String,
}

impl PageRenderer {
    pub fn new(links: PageLinks, vis_js_url: impl Into<String>) -> anyhow::Result<Self> {
        let mut registry = Handlebars::new();
        registry.register_template_string("index", INDEX_TEMPLATE)?;
        Ok(Self {
            registry,
            links,
            vis_js_url: vis_js_url.into(),
        })
    }

    /// Render the page for `snapshot`, optionally with a notice banner.
    pub fn render(
        &self,
        snapshot: &Snapshot,
        notice: Option<&str>,
    ) -> Result<String, handlebars::RenderError> {
        let context = PageContext {
            dotgraph: snapshot.graph_document(),
            persons_table: snapshot.roster_html(),
            not_reloaded_since: snapshot
                .last_reload()
                .with_timezone(&Local)
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            n_persons: snapshot.person_count(),
            n_connections: snapshot.connection_count(),
            character_sheet_link: self.links.character_sheet.as_deref(),
            relations_sheet_link: self.links.relations_sheet.as_deref(),
            vis_js_url: &self.vis_js_url,
            notice,
        };
        self.registry.render("index", &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn renderer() -> PageRenderer {
        PageRenderer::new(
            PageLinks {
                character_sheet: Some("https://example.com/chars".to_string()),
                relations_sheet: None,
            },
            "/static/vis.js",
        )
        .unwrap()
    }

    #[test]
    fn empty_snapshot_renders_counts_and_links() {
        let html = renderer().render(&Snapshot::empty(Utc::now()), None).unwrap();
        assert!(html.contains("0 characters, 0 connections."));
        assert!(html.contains("href=\"https://example.com/chars\""));
        assert!(!html.contains("Relations sheet"));
        assert!(!html.contains("class=\"notice\""));
        assert!(html.contains("id=\"persons_table\""));
    }

    #[test]
    fn graph_document_is_html_escaped_in_page() {
        let html = renderer().render(&Snapshot::empty(Utc::now()), None).unwrap();
        assert!(html.contains("&quot;#009879&quot;"));
        assert!(!html.contains("color=\"#009879\""));
    }

    #[test]
    fn notice_is_escaped() {
        let html = renderer()
            .render(&Snapshot::empty(Utc::now()), Some("Reload failed: <timeout>"))
            .unwrap();
        assert!(html.contains("Reload failed: &lt;timeout&gt;"));
    }
}
