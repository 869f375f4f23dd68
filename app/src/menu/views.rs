//! External representations and the pure conversions in and out of
//! them. Nothing here touches storage.

use serde::{Deserialize, Serialize};

use infra::ids::Id;

use super::models::{Dish, Ingredient};
use super::CatalogError;

/// What callers see for one dish. `ingredients` is always present,
/// possibly empty, in association order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishView {
    pub id: Id<Dish>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    pub ingredients: Vec<IngredientView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientView {
    pub id: Id<Ingredient>,
    pub name: String,
}

/// Raw creation input as supplied by a caller; `into_spec` is the only
/// way to turn it into something the catalog will persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDishInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredient_ids: Vec<Id<Ingredient>>,
}

/// A validated creation request.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDishSpec {
    pub(crate) name: String,
    pub(crate) description: Option<String>,
    pub(crate) price: f64,
    pub(crate) image_url: Option<String>,
    pub(crate) ingredient_ids: Vec<Id<Ingredient>>,
}

/// Raw partial-update input. Absent fields mean "leave unchanged".
/// `ingredient_ids` is three-valued: absent leaves the association set
/// alone, an explicit list (empty included) replaces it outright.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub ingredient_ids: Option<Vec<Id<Ingredient>>>,
}

/// A validated patch; every field optional, `None` meaning unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DishPatch {
    pub(crate) name: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) price: Option<f64>,
    pub(crate) image_url: Option<String>,
    pub(crate) ingredient_ids: Option<Vec<Id<Ingredient>>>,
}

fn validate_price(price: f64) -> Result<f64, CatalogError> {
    if price.is_finite() && price > 0.0 {
        Ok(price)
    } else {
        Err(CatalogError::Validation(
            "price must be greater than zero".to_string(),
        ))
    }
}

impl NewDishInput {
    pub fn into_spec(self) -> Result<NewDishSpec, CatalogError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::Validation(
                "dish name is required".to_string(),
            ));
        }
        let price = validate_price(self.price)?;

        Ok(NewDishSpec {
            name,
            description: self.description,
            price,
            image_url: self.image_url,
            ingredient_ids: self.ingredient_ids,
        })
    }
}

impl PatchInput {
    pub fn into_patch(self) -> Result<DishPatch, CatalogError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(CatalogError::Validation(
                    "dish name must not be empty".to_string(),
                ));
            }
        }
        let price = self.price.map(validate_price).transpose()?;

        Ok(DishPatch {
            name: self.name,
            description: self.description,
            price,
            image_url: self.image_url,
            ingredient_ids: self.ingredient_ids,
        })
    }
}

impl DishView {
    /// Project a dish and its eagerly loaded ingredients; the catalog
    /// resolves the ingredient list in association order beforehand.
    pub(crate) fn project(dish: &Dish, ingredients: Vec<IngredientView>) -> Self {
        DishView {
            id: dish.meta.id,
            name: dish.name.clone(),
            description: dish.description.clone(),
            price: dish.price,
            image_url: dish.image_url.clone(),
            ingredients,
        }
    }
}

impl From<&Ingredient> for IngredientView {
    fn from(ingredient: &Ingredient) -> Self {
        IngredientView {
            id: ingredient.meta.id,
            name: ingredient.name.clone(),
        }
    }
}
