//! Guarded with `#[cfg(test)]` from `lib.rs`

use anyhow::Result;
use r2d2::Pool;

use infra::ids::IdGen;
use infra::memory::MemoryConnectionManager;

use crate::menu::{
    AddIngredient, Catalog, CatalogError, CreateDish, DeleteDish, GetDish, Ingredient,
    IngredientView, Ingredients, ListDishes, ListIngredients, NewDishInput, PatchInput,
    UpdateDish,
};
use crate::services::{Commandable, Queryable};


fn catalog(pool: &Pool<MemoryConnectionManager>) -> Catalog<MemoryConnectionManager> {
    Catalog::new(pool.clone())
}

fn seed_ingredient(pool: &Pool<MemoryConnectionManager>, name: &str) -> Result<IngredientView> {
    Ingredients::new(pool.clone()).execute(AddIngredient {
        name: name.to_string(),
    })
}

fn pizza(ingredient_ids: Vec<infra::ids::Id<Ingredient>>) -> NewDishInput {
    NewDishInput {
        name: "Pizza".to_string(),
        description: None,
        price: 9.5,
        image_url: None,
        ingredient_ids,
    }
}

#[test]
fn created_dish_round_trips_through_get() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);
    let cheese = seed_ingredient(&pool, "Cheese")?;
    let tomato = seed_ingredient(&pool, "Tomato")?;

    let created = catalog.execute(CreateDish(pizza(vec![cheese.id, tomato.id])))?;
    let fetched = catalog.query(GetDish(created.id))?;

    assert_eq!(fetched.name, "Pizza");
    assert_eq!(fetched.price, 9.5);
    let got: Vec<_> = fetched.ingredients.iter().map(|i| i.id).collect();
    assert_eq!(got, vec![cheese.id, tomato.id]);
    Ok(())
}

#[test]
fn create_with_unknown_ingredient_persists_nothing() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);
    let cheese = seed_ingredient(&pool, "Cheese")?;
    let bogus = IdGen::new().generate::<Ingredient>();

    let err = catalog
        .execute(CreateDish(pizza(vec![cheese.id, bogus])))
        .expect_err("create should fail");

    assert_eq!(
        err.downcast_ref::<CatalogError>(),
        Some(&CatalogError::UnknownIngredient(bogus)),
        "Error: {:?}",
        err
    );
    assert!(
        err.to_string().contains(&bogus.to_string()),
        "error should cite the offending id: {}",
        err
    );
    assert_eq!(catalog.query(ListDishes)?, vec![]);
    Ok(())
}

#[test]
fn duplicate_ingredient_ids_collapse_to_one_association() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);
    let cheese = seed_ingredient(&pool, "Cheese")?;

    let created = catalog.execute(CreateDish(pizza(vec![cheese.id, cheese.id])))?;

    assert_eq!(created.ingredients.len(), 1);
    assert_eq!(created.ingredients[0].id, cheese.id);
    Ok(())
}

#[test]
fn update_replaces_associations_wholesale() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);
    let cheese = seed_ingredient(&pool, "Cheese")?;
    let tomato = seed_ingredient(&pool, "Tomato")?;
    let basil = seed_ingredient(&pool, "Basil")?;

    let created = catalog.execute(CreateDish(pizza(vec![cheese.id, tomato.id])))?;

    // The new set overlaps the old one; the old set must still go.
    catalog.execute(UpdateDish(
        created.id,
        PatchInput {
            ingredient_ids: Some(vec![basil.id, cheese.id]),
            ..PatchInput::default()
        },
    ))?;

    let fetched = catalog.query(GetDish(created.id))?;
    let got: Vec<_> = fetched.ingredients.iter().map(|i| i.id).collect();
    assert_eq!(got, vec![basil.id, cheese.id]);
    Ok(())
}

#[test]
fn empty_patch_changes_nothing() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);
    let cheese = seed_ingredient(&pool, "Cheese")?;

    let created = catalog.execute(CreateDish(NewDishInput {
        description: Some("wood fired".to_string()),
        image_url: Some("http://example.com/pizza.png".to_string()),
        ..pizza(vec![cheese.id])
    }))?;

    let updated = catalog.execute(UpdateDish(created.id, PatchInput::default()))?;

    assert_eq!(updated, created);
    assert_eq!(catalog.query(GetDish(created.id))?, created);
    Ok(())
}

#[test]
fn explicit_empty_ingredient_list_clears_associations() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);
    let cheese = seed_ingredient(&pool, "Cheese")?;

    let created = catalog.execute(CreateDish(pizza(vec![cheese.id])))?;
    catalog.execute(UpdateDish(
        created.id,
        PatchInput {
            ingredient_ids: Some(vec![]),
            ..PatchInput::default()
        },
    ))?;

    let fetched = catalog.query(GetDish(created.id))?;
    assert_eq!(fetched.ingredients, vec![]);
    Ok(())
}

#[test]
fn patch_overrides_only_supplied_fields() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);
    let cheese = seed_ingredient(&pool, "Cheese")?;

    let created = catalog.execute(CreateDish(NewDishInput {
        description: Some("wood fired".to_string()),
        ..pizza(vec![cheese.id])
    }))?;

    let updated = catalog.execute(UpdateDish(
        created.id,
        PatchInput {
            price: Some(11.0),
            ..PatchInput::default()
        },
    ))?;

    assert_eq!(updated.price, 11.0);
    assert_eq!(updated.name, created.name);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.ingredients, created.ingredients);
    Ok(())
}

#[test]
fn update_with_invalid_price_leaves_dish_unchanged() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);

    let created = catalog.execute(CreateDish(pizza(vec![])))?;
    let err = catalog
        .execute(UpdateDish(
            created.id,
            PatchInput {
                price: Some(-3.0),
                ..PatchInput::default()
            },
        ))
        .expect_err("update should fail");

    assert!(matches!(
        err.downcast_ref::<CatalogError>(),
        Some(CatalogError::Validation(_))
    ));
    assert_eq!(catalog.query(GetDish(created.id))?, created);
    Ok(())
}

#[test]
fn update_of_missing_dish_is_not_found() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);
    let id = IdGen::new().generate();

    let err = catalog
        .execute(UpdateDish(id, PatchInput::default()))
        .expect_err("update should fail");

    assert_eq!(
        err.downcast_ref::<CatalogError>(),
        Some(&CatalogError::NotFound(id))
    );
    Ok(())
}

#[test]
fn delete_then_get_returns_not_found_twice() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);

    let created = catalog.execute(CreateDish(pizza(vec![])))?;
    catalog.execute(DeleteDish(created.id))?;

    let err = catalog
        .query(GetDish(created.id))
        .expect_err("get should fail");
    assert_eq!(
        err.downcast_ref::<CatalogError>(),
        Some(&CatalogError::NotFound(created.id))
    );

    let err = catalog
        .execute(DeleteDish(created.id))
        .expect_err("second delete should fail");
    assert_eq!(
        err.downcast_ref::<CatalogError>(),
        Some(&CatalogError::NotFound(created.id))
    );
    Ok(())
}

#[test]
fn creation_view_equals_reloaded_view() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);
    let cheese = seed_ingredient(&pool, "Cheese")?;
    let tomato = seed_ingredient(&pool, "Tomato")?;

    let created = catalog.execute(CreateDish(NewDishInput {
        description: Some("wood fired".to_string()),
        image_url: Some("http://example.com/pizza.png".to_string()),
        ..pizza(vec![cheese.id, tomato.id])
    }))?;

    assert_eq!(catalog.query(GetDish(created.id))?, created);
    Ok(())
}

#[test]
fn pizza_scenario() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);
    let cheese = seed_ingredient(&pool, "Cheese")?;
    let tomato = seed_ingredient(&pool, "Tomato")?;

    let created = catalog.execute(CreateDish(pizza(vec![cheese.id, tomato.id])))?;
    assert_eq!(created.name, "Pizza");
    assert_eq!(created.price, 9.5);
    assert_eq!(
        created.ingredients,
        vec![
            IngredientView {
                id: cheese.id,
                name: "Cheese".to_string()
            },
            IngredientView {
                id: tomato.id,
                name: "Tomato".to_string()
            },
        ]
    );

    let bogus = IdGen::new().generate::<Ingredient>();
    let err = catalog
        .execute(CreateDish(pizza(vec![cheese.id, bogus])))
        .expect_err("create should fail");
    assert!(
        err.to_string().contains(&bogus.to_string()),
        "validation should cite {}: {}",
        bogus,
        err
    );
    Ok(())
}

#[test]
fn listing_includes_every_dish_and_tolerates_emptiness() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let catalog = catalog(&pool);

    assert_eq!(catalog.query(ListDishes)?, vec![]);

    let a = catalog.execute(CreateDish(pizza(vec![])))?;
    let b = catalog.execute(CreateDish(NewDishInput {
        name: "Salad".to_string(),
        price: 4.25,
        ..pizza(vec![])
    }))?;

    let mut listed: Vec<_> = catalog.query(ListDishes)?.into_iter().map(|d| d.id).collect();
    let mut expected = vec![a.id, b.id];
    listed.sort();
    expected.sort();
    assert_eq!(listed, expected);
    Ok(())
}

#[test]
fn seeded_pantry_is_idempotent() -> Result<()> {
    env_logger::try_init().unwrap_or_default();
    let pool = junk_drawer::pool()?;
    let ingredients = Ingredients::new(pool.clone());

    ingredients.setup()?;
    let first = ingredients.query(ListIngredients)?;
    ingredients.setup()?;
    let second = ingredients.query(ListIngredients)?;

    assert_eq!(first, second);
    assert!(first.iter().any(|i| i.name == "Cheese"));
    Ok(())
}
