use anyhow::Result;
use log::*;
use r2d2::{self, Pool};

use infra::ids::{Id, IdGen};
use infra::persistence::Storage;

use crate::services::{Commandable, Queryable, Request};

use super::models::Ingredient;
use super::views::IngredientView;
use super::CatalogError;

/// Pass-through store for ingredient records. Dishes only ever
/// reference these by id; dish-side bookkeeping lives in the catalog.
#[derive(Debug)]
pub struct Ingredients<M: r2d2::ManageConnection> {
    db: Pool<M>,
    idgen: IdGen,
}

#[derive(Debug, Clone)]
pub struct AddIngredient {
    pub name: String,
}

#[derive(Debug, Clone, Copy)]
pub struct ListIngredients;

impl Request for AddIngredient {
    type Resp = IngredientView;
}

impl Request for ListIngredients {
    type Resp = Vec<IngredientView>;
}

const PANTRY: &[&str] = &["Cheese", "Tomato", "Basil"];

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Ingredients<M> {
    pub fn new(db: Pool<M>) -> Self {
        Ingredients {
            db,
            idgen: IdGen::new(),
        }
    }

    /// Seed the well-known pantry. Ids are hashed from the name, so
    /// running setup twice finds the same records.
    pub fn setup(&self) -> Result<()> {
        let mut docs = self.db.get()?;
        for name in PANTRY {
            let id = Id::hashed(name);
            if docs.load::<Ingredient>(&id)?.is_none() {
                let mut ingredient = Ingredient::new(id, name);
                docs.save(&mut ingredient)?;
                debug!("Seeded {}: {:?}", id, ingredient);
            }
        }
        Ok(())
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static>
    Commandable<AddIngredient> for Ingredients<M>
{
    fn execute(&self, req: AddIngredient) -> Result<IngredientView> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::Validation("ingredient name is required".to_string()).into());
        }

        let mut ingredient = Ingredient::new(self.idgen.generate(), &name);
        self.db.get()?.save(&mut ingredient)?;
        info!("Added ingredient {}: {}", ingredient.id(), ingredient.name);
        Ok(IngredientView::from(&ingredient))
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static>
    Queryable<ListIngredients> for Ingredients<M>
{
    fn query(&self, _: ListIngredients) -> Result<Vec<IngredientView>> {
        let mut docs = self.db.get()?;
        let ingredients = docs.list::<Ingredient>()?;
        Ok(ingredients.iter().map(IngredientView::from).collect())
    }
}

impl<M: r2d2::ManageConnection> Clone for Ingredients<M> {
    fn clone(&self) -> Self {
        Ingredients {
            db: self.db.clone(),
            idgen: self.idgen.clone(),
        }
    }
}
