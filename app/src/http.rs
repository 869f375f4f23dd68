//! HTTP boundary. Routes decode into catalog requests, the catalog
//! runs on the blocking pool, and outcomes map to status codes here —
//! server faults are logged once, with the operation named, and leave
//! only an opaque message outward.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use log::*;
use serde::Serialize;
use serde_json::json;
use tokio::task;

use infra::ids::Id;
use infra::persistence::Storage;

use crate::menu::{
    Catalog, CatalogError, CreateDish, DeleteDish, Dish, GetDish, ListDishes, NewDishInput,
    PatchInput, UpdateDish,
};
use crate::services::{Commandable, Queryable};

pub fn router<M, D>(catalog: Arc<Catalog<M>>) -> Router
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
{
    Router::new()
        .route(
            "/dishes",
            get(list_dishes::<M, D>).post(create_dish::<M, D>),
        )
        .route(
            "/dishes/:id",
            get(get_dish::<M, D>)
                .put(update_dish::<M, D>)
                .delete(delete_dish::<M, D>),
        )
        .with_state(catalog)
}

async fn list_dishes<M, D>(State(catalog): State<Arc<Catalog<M>>>) -> Response
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
{
    run("list dishes", StatusCode::OK, move || {
        catalog.query(ListDishes)
    })
    .await
}

async fn get_dish<M, D>(
    State(catalog): State<Arc<Catalog<M>>>,
    Path(id): Path<String>,
) -> Response
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
{
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    run("get dish", StatusCode::OK, move || catalog.query(GetDish(id))).await
}

async fn create_dish<M, D>(
    State(catalog): State<Arc<Catalog<M>>>,
    Json(input): Json<NewDishInput>,
) -> Response
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
{
    run("create dish", StatusCode::CREATED, move || {
        catalog.execute(CreateDish(input))
    })
    .await
}

async fn update_dish<M, D>(
    State(catalog): State<Arc<Catalog<M>>>,
    Path(id): Path<String>,
    Json(input): Json<PatchInput>,
) -> Response
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
{
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    run("update dish", StatusCode::OK, move || {
        catalog.execute(UpdateDish(id, input))
    })
    .await
}

async fn delete_dish<M, D>(
    State(catalog): State<Arc<Catalog<M>>>,
    Path(id): Path<String>,
) -> Response
where
    M: r2d2::ManageConnection<Connection = D>,
    D: Storage + Send + 'static,
{
    let id = match parse_id(&id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match task::spawn_blocking(move || catalog.execute(DeleteDish(id))).await {
        Ok(Ok(())) => StatusCode::NO_CONTENT.into_response(),
        Ok(Err(err)) => fault("delete dish", err),
        Err(join) => fault("delete dish", anyhow!("worker gone: {}", join)),
    }
}

/// An id that does not even parse cannot name a dish; report it the
/// same way as an absent one.
fn parse_id(raw: &str) -> Result<Id<Dish>, Response> {
    raw.parse::<Id<Dish>>().map_err(|err| {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("{}: {}", err, raw) })),
        )
            .into_response()
    })
}

async fn run<T, F>(op: &'static str, ok: StatusCode, f: F) -> Response
where
    T: Serialize + Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    match task::spawn_blocking(f).await {
        Ok(Ok(value)) => (ok, Json(value)).into_response(),
        Ok(Err(err)) => fault(op, err),
        Err(join) => fault(op, anyhow!("worker gone: {}", join)),
    }
}

fn fault(op: &'static str, err: anyhow::Error) -> Response {
    let status = match err.downcast_ref::<CatalogError>() {
        Some(CatalogError::NotFound(_)) => StatusCode::NOT_FOUND,
        Some(_) => StatusCode::BAD_REQUEST,
        None => {
            error!("{}: {:?}", op, err);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response();
        }
    };
    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
