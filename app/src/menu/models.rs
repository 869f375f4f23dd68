use serde::{Deserialize, Serialize};

use infra::documents::{DocMeta, HasMeta};
use infra::ids::{Entity, Id};

use super::views::{DishPatch, NewDishSpec};

/// A menu dish. Owns its association list outright: the associations
/// live and die with the dish document, while ingredients are only
/// referenced by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    #[serde(flatten)]
    pub(crate) meta: DocMeta<Dish>,
    pub(crate) name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    pub(crate) price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) image_url: Option<String>,
    #[serde(default)]
    pub(crate) ingredients: Vec<Association>,
}

/// A reusable named component, stored on its own and referenced by any
/// number of dishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(flatten)]
    pub(crate) meta: DocMeta<Ingredient>,
    pub(crate) name: String,
}

/// Junction record between one dish and one ingredient; unique per
/// (dish, ingredient) pair within the owning dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub(crate) dish: Id<Dish>,
    pub(crate) ingredient: Id<Ingredient>,
}

impl Dish {
    pub(crate) fn new(id: Id<Dish>, spec: NewDishSpec, ingredients: Vec<Association>) -> Self {
        Dish {
            meta: DocMeta::new_with_id(id),
            name: spec.name,
            description: spec.description,
            price: spec.price,
            image_url: spec.image_url,
            ingredients,
        }
    }

    pub fn id(&self) -> Id<Dish> {
        self.meta.id
    }

    /// Apply the scalar fields of a patch; absent fields keep their
    /// prior value. Associations are replaced separately by the
    /// catalog, once reconciled.
    pub(crate) fn apply(&mut self, patch: DishPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(image_url) = patch.image_url {
            self.image_url = Some(image_url);
        }
    }

    pub(crate) fn replace_associations(&mut self, associations: Vec<Association>) {
        self.ingredients = associations;
    }
}

impl Ingredient {
    pub(crate) fn new(id: Id<Ingredient>, name: &str) -> Self {
        Ingredient {
            meta: DocMeta::new_with_id(id),
            name: name.to_string(),
        }
    }

    pub fn id(&self) -> Id<Ingredient> {
        self.meta.id
    }
}

impl Entity for Dish {
    const PREFIX: &'static str = "dish";
}

impl HasMeta for Dish {
    fn meta(&self) -> &DocMeta<Self> {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut DocMeta<Self> {
        &mut self.meta
    }
}

impl Entity for Ingredient {
    const PREFIX: &'static str = "ingredient";
}

impl HasMeta for Ingredient {
    fn meta(&self) -> &DocMeta<Self> {
        &self.meta
    }
    fn meta_mut(&mut self) -> &mut DocMeta<Self> {
        &mut self.meta
    }
}
