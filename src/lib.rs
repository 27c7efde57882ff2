//! Character roster and relationship graph for a pen & paper campaign.
//!
//! Two sheets (characters and relations) are fetched from a [`source`],
//! turned into a [`store::Snapshot`], and rendered as a DOT graph and an HTML
//! roster table served by [`api`].

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod render;
pub mod source;
pub mod store;
