use anyhow::{Context, Result};
use log::*;
use r2d2::Pool;

use infra::persistence::DocumentConnectionManager;

pub mod config;
pub mod http;
pub mod menu;
pub mod services;

#[cfg(test)]
mod test;

pub use crate::menu::{Catalog, Ingredients};

/// The assembled service: one pool, shared by the dish catalog and the
/// ingredient store.
#[derive(Clone)]
pub struct FoodMenu {
    db: Pool<DocumentConnectionManager>,
}

impl FoodMenu {
    pub fn new(config: &config::Config) -> Result<Self> {
        let db = config.postgres.build()?;

        debug!("Init schema");
        db.get()?.setup().context("setup persistence")?;

        Ok(FoodMenu { db })
    }

    pub fn catalog(&self) -> Catalog<DocumentConnectionManager> {
        Catalog::new(self.db.clone())
    }

    pub fn ingredients(&self) -> Ingredients<DocumentConnectionManager> {
        Ingredients::new(self.db.clone())
    }
}
