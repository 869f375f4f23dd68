use std::collections::BTreeSet;

use anyhow::Result;

use infra::ids::Id;
use infra::persistence::Storage;

use super::models::{Association, Dish, Ingredient};
use super::CatalogError;

/// Reconcile a requested ingredient id list into a validated
/// association set for `dish`.
///
/// Ids are walked in input order; duplicates collapse to one
/// association. The first id with no matching ingredient fails the
/// whole call with `UnknownIngredient`, and nothing is committed: the
/// caller decides what to do with the returned set.
pub(super) fn reconcile<D: Storage>(
    docs: &mut D,
    dish: Id<Dish>,
    requested: &[Id<Ingredient>],
) -> Result<Vec<Association>> {
    let mut seen = BTreeSet::new();
    let mut associations = Vec::with_capacity(requested.len());
    for &ingredient in requested {
        if !seen.insert(ingredient) {
            continue;
        }
        if docs.load::<Ingredient>(&ingredient)?.is_none() {
            return Err(CatalogError::UnknownIngredient(ingredient).into());
        }
        associations.push(Association { dish, ingredient });
    }
    Ok(associations)
}
