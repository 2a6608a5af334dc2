//! Dashboard module registry.
//!
//! Every dashboard panel is a module with a short id (used in the query
//! string), a title and the derived view it renders.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filter::NetworkOptions;
use crate::types::{Label, Model, RelType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DashboardModule {
    #[serde(rename = "cn")]
    CodesNetwork,
    #[serde(rename = "un")]
    ParticipantsNetwork,
    #[serde(rename = "ct")]
    CodesTable,
    #[serde(rename = "pt")]
    PostsTable,
    #[serde(rename = "ut")]
    ParticipantsTable,
}

/// What a module renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModuleView {
    Network(NetworkOptions),
    Table(Model),
}

impl DashboardModule {
    pub const ALL: [DashboardModule; 5] = [
        DashboardModule::CodesNetwork,
        DashboardModule::ParticipantsNetwork,
        DashboardModule::CodesTable,
        DashboardModule::PostsTable,
        DashboardModule::ParticipantsTable,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            DashboardModule::CodesNetwork => "cn",
            DashboardModule::ParticipantsNetwork => "un",
            DashboardModule::CodesTable => "ct",
            DashboardModule::PostsTable => "pt",
            DashboardModule::ParticipantsTable => "ut",
        }
    }

    pub fn from_id(id: &str) -> Option<DashboardModule> {
        Self::ALL.into_iter().find(|m| m.id() == id)
    }

    pub fn title(&self) -> &'static str {
        match self {
            DashboardModule::CodesNetwork => "Codes network",
            DashboardModule::ParticipantsNetwork => "Participants network",
            DashboardModule::CodesTable => "Codes table",
            DashboardModule::PostsTable => "Posts table",
            DashboardModule::ParticipantsTable => "Participants table",
        }
    }

    pub fn view(&self) -> ModuleView {
        match self {
            DashboardModule::CodesNetwork => {
                ModuleView::Network(NetworkOptions::new([Label::Code], [RelType::Cooccurs]))
            }
            DashboardModule::ParticipantsNetwork => {
                ModuleView::Network(NetworkOptions::new([Label::User], [RelType::TalkedOrQuoted]))
            }
            DashboardModule::CodesTable => ModuleView::Table(Model::Code),
            DashboardModule::PostsTable => ModuleView::Table(Model::Post),
            DashboardModule::ParticipantsTable => ModuleView::Table(Model::User),
        }
    }
}

impl fmt::Display for DashboardModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for module in DashboardModule::ALL {
            assert_eq!(DashboardModule::from_id(module.id()), Some(module));
            assert_eq!(
                serde_json::to_value(module).unwrap(),
                serde_json::json!(module.id())
            );
        }
        assert_eq!(DashboardModule::from_id("xx"), None);
    }

    #[test]
    fn codes_network_shows_cooccurrences() {
        match DashboardModule::CodesNetwork.view() {
            ModuleView::Network(options) => {
                assert_eq!(options.node_labels, vec![Label::Code]);
                assert_eq!(options.edge_types, vec![RelType::Cooccurs]);
            }
            other => panic!("expected a network view, got {:?}", other),
        }
        assert_eq!(DashboardModule::CodesTable.view(), ModuleView::Table(Model::Code));
    }
}
