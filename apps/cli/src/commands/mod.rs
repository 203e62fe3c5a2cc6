//! Command implementations for the Ada CLI.

pub mod catalog;
pub mod config;
pub mod nodes;
pub mod plan;
pub mod restore;
pub mod run;
pub mod shell;

use ada_core::{AdaConfig, Catalog};
use ada_orchestrator::AdaNode;
use anyhow::Context;
use std::path::PathBuf;

/// Where configuration and catalog come from.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub config: Option<PathBuf>,
    pub catalog: Option<PathBuf>,
}

impl Sources {
    pub fn load_config(&self) -> anyhow::Result<AdaConfig> {
        AdaConfig::load_or_default(self.config.as_deref()).context("Failed to load configuration")
    }

    pub fn load_catalog(&self) -> anyhow::Result<Catalog> {
        match &self.catalog {
            Some(path) => Catalog::load(path)
                .with_context(|| format!("Failed to load catalog {}", path.display())),
            None => Ok(Catalog::builtin()),
        }
    }

    pub fn build_node(&self) -> anyhow::Result<AdaNode> {
        let config = self.load_config()?;
        let catalog = self.load_catalog()?;
        AdaNode::new(config, catalog).context("Failed to start Ada node")
    }
}
