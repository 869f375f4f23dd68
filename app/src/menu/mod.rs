use anyhow::{anyhow, Result};
use err_derive::Error;
use log::*;
use r2d2::{self, Pool};

use infra::ids::{Id, IdGen};
use infra::persistence::Storage;

use crate::services::{Commandable, Queryable, Request};

mod associations;
mod ingredients;
mod models;
mod views;

pub use self::ingredients::{AddIngredient, Ingredients, ListIngredients};
pub use self::models::{Association, Dish, Ingredient};
pub use self::views::{DishView, IngredientView, NewDishInput, PatchInput};

/// Domain outcomes a caller can act on. Anything else that comes out
/// of an operation is a server fault.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error(display = "{}", _0)]
    Validation(String),
    #[error(display = "unknown ingredient: {}", _0)]
    UnknownIngredient(Id<Ingredient>),
    #[error(display = "dish not found: {}", _0)]
    NotFound(Id<Dish>),
}

/// CRUD over dish aggregates, one request type per operation.
#[derive(Debug)]
pub struct Catalog<M: r2d2::ManageConnection> {
    db: Pool<M>,
    idgen: IdGen,
}

#[derive(Debug, Clone, Copy)]
pub struct ListDishes;

#[derive(Debug, Clone, Copy)]
pub struct GetDish(pub Id<Dish>);

#[derive(Debug, Clone)]
pub struct CreateDish(pub NewDishInput);

#[derive(Debug, Clone)]
pub struct UpdateDish(pub Id<Dish>, pub PatchInput);

#[derive(Debug, Clone, Copy)]
pub struct DeleteDish(pub Id<Dish>);

impl Request for ListDishes {
    type Resp = Vec<DishView>;
}
impl Request for GetDish {
    type Resp = DishView;
}
impl Request for CreateDish {
    type Resp = DishView;
}
impl Request for UpdateDish {
    type Resp = DishView;
}
impl Request for DeleteDish {
    type Resp = ();
}

/// Resolve a dish's associations to `{id, name}` pairs, in association
/// order. A missing ingredient here means the store lost referential
/// integrity, which is a fault, not caller error.
fn present<D: Storage>(docs: &mut D, dish: &Dish) -> Result<DishView> {
    let mut ingredients = Vec::with_capacity(dish.ingredients.len());
    for association in &dish.ingredients {
        let ingredient = docs
            .load::<Ingredient>(&association.ingredient)?
            .ok_or_else(|| {
                anyhow!(
                    "dangling association: {} references missing {}",
                    dish.id(),
                    association.ingredient
                )
            })?;
        ingredients.push(IngredientView::from(&ingredient));
    }
    Ok(DishView::project(dish, ingredients))
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Catalog<M> {
    pub fn new(db: Pool<M>) -> Self {
        Catalog {
            db,
            idgen: IdGen::new(),
        }
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Queryable<ListDishes>
    for Catalog<M>
{
    fn query(&self, _: ListDishes) -> Result<Vec<DishView>> {
        let mut docs = self.db.get()?;
        let dishes = docs.list::<Dish>()?;
        debug!("Listing {} dishes", dishes.len());

        let mut views = Vec::with_capacity(dishes.len());
        for dish in &dishes {
            views.push(present(&mut *docs, dish)?);
        }
        Ok(views)
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Queryable<GetDish>
    for Catalog<M>
{
    fn query(&self, GetDish(id): GetDish) -> Result<DishView> {
        let mut docs = self.db.get()?;
        let dish = docs
            .load::<Dish>(&id)?
            .ok_or(CatalogError::NotFound(id))?;
        present(&mut *docs, &dish)
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Commandable<CreateDish>
    for Catalog<M>
{
    fn execute(&self, CreateDish(input): CreateDish) -> Result<DishView> {
        let spec = input.into_spec()?;
        let mut docs = self.db.get()?;

        let id = self.idgen.generate();
        let associations = associations::reconcile(&mut *docs, id, &spec.ingredient_ids)?;
        let mut dish = Dish::new(id, spec, associations);
        docs.save(&mut dish)?;
        info!("Created dish {}: {}", dish.id(), dish.name);

        present(&mut *docs, &dish)
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Commandable<UpdateDish>
    for Catalog<M>
{
    fn execute(&self, UpdateDish(id, input): UpdateDish) -> Result<DishView> {
        let patch = input.into_patch()?;
        let mut docs = self.db.get()?;

        let mut dish = docs
            .load::<Dish>(&id)?
            .ok_or(CatalogError::NotFound(id))?;

        // An explicit id list, empty included, replaces the whole
        // association set; an absent one leaves it alone.
        if let Some(ingredient_ids) = &patch.ingredient_ids {
            let associations = associations::reconcile(&mut *docs, id, ingredient_ids)?;
            dish.replace_associations(associations);
        }
        dish.apply(patch);

        docs.save(&mut dish)?;
        info!("Updated dish {}", dish.id());

        present(&mut *docs, &dish)
    }
}

impl<M: r2d2::ManageConnection<Connection = D>, D: Storage + Send + 'static> Commandable<DeleteDish>
    for Catalog<M>
{
    fn execute(&self, DeleteDish(id): DeleteDish) -> Result<()> {
        let mut docs = self.db.get()?;
        // Associations are owned by the dish document, so removing the
        // document removes them with it.
        if !docs.delete::<Dish>(&id)? {
            return Err(CatalogError::NotFound(id).into());
        }
        info!("Deleted dish {}", id);
        Ok(())
    }
}

impl<M: r2d2::ManageConnection> Clone for Catalog<M> {
    fn clone(&self) -> Self {
        Catalog {
            db: self.db.clone(),
            idgen: self.idgen.clone(),
        }
    }
}
