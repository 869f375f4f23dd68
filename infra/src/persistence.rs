use anyhow::Result;
use err_derive::Error;
use log::*;
use postgres::NoTls;
use r2d2_postgres::PostgresConnectionManager;
use serde::{de::DeserializeOwned, Serialize};

use crate::documents::{HasMeta, Version};
use crate::ids::{key_prefix, Entity, Id};

/// Raised when a save loses the version race; the document in hand was
/// loaded before someone else's write.
#[derive(Debug, Error, PartialEq, Eq)]
#[error(display = "stale document version")]
pub struct ConcurrencyError;

/// One aggregate per document. `save` is a compare-and-swap on the
/// document's version, so each call either commits the whole document
/// or changes nothing.
pub trait Storage {
    fn load<D: DeserializeOwned + Entity>(&mut self, id: &Id<D>) -> Result<Option<D>>;
    fn save<D: Serialize + Entity + HasMeta>(&mut self, document: &mut D) -> Result<()>;
    fn delete<D: Entity>(&mut self, id: &Id<D>) -> Result<bool>;
    fn list<D: DeserializeOwned + Entity>(&mut self) -> Result<Vec<D>>;
}

const SETUP_SQL: &str = include_str!("persistence.sql");
const LOAD_SQL: &str = "SELECT body FROM documents WHERE id = $1";
const LIST_SQL: &str = "SELECT body FROM documents WHERE id LIKE $1 ORDER BY id";
const DELETE_SQL: &str = "DELETE FROM documents WHERE id = $1";
const INSERT_SQL: &str = "INSERT INTO documents (id, body) \
                          VALUES ($1::jsonb ->> '_id', $1::jsonb) \
                          ON CONFLICT (id) DO NOTHING";
const UPDATE_SQL: &str = "UPDATE documents \
                          SET body = $1::jsonb \
                          WHERE id = $1::jsonb ->> '_id' \
                          AND body ->> '_version' = $2";

/// Postgres-backed document store: one jsonb row per document, keyed
/// by the serialized id.
pub struct Documents {
    client: postgres::Client,
}

impl Documents {
    pub fn new(client: postgres::Client) -> Self {
        Documents { client }
    }

    pub fn setup(&mut self) -> Result<()> {
        self.client.batch_execute(SETUP_SQL)?;
        Ok(())
    }

    pub fn client_mut(&mut self) -> &mut postgres::Client {
        &mut self.client
    }

    fn write<D: Serialize + Entity + HasMeta>(
        &mut self,
        document: &D,
        expected: &Version,
    ) -> Result<()> {
        let body = serde_json::to_value(document)?;
        let nrows = if expected.is_initial() {
            self.client.execute(INSERT_SQL, &[&body])?
        } else {
            self.client
                .execute(UPDATE_SQL, &[&body, &expected.as_str().to_string()])?
        };
        debug!("Write of {} modified {} rows", document.meta().id, nrows);
        if nrows != 1 {
            warn!("Version mismatch writing {}", document.meta().id);
            return Err(ConcurrencyError.into());
        }
        Ok(())
    }
}

impl Storage for Documents {
    fn load<D: DeserializeOwned + Entity>(&mut self, id: &Id<D>) -> Result<Option<D>> {
        let row = self.client.query_opt(LOAD_SQL, &[&id.to_string()])?;
        match row {
            Some(row) => {
                let body: serde_json::Value = row.get(0);
                Ok(Some(serde_json::from_value(body)?))
            }
            None => Ok(None),
        }
    }

    fn save<D: Serialize + Entity + HasMeta>(&mut self, document: &mut D) -> Result<()> {
        let prev = document.meta().version.clone();
        document.meta_mut().version = Version::fresh();
        let res = self.write(&*document, &prev);
        if res.is_err() {
            document.meta_mut().version = prev;
        }
        res
    }

    fn delete<D: Entity>(&mut self, id: &Id<D>) -> Result<bool> {
        let nrows = self.client.execute(DELETE_SQL, &[&id.to_string()])?;
        debug!("Delete of {} removed {} rows", id, nrows);
        Ok(nrows > 0)
    }

    fn list<D: DeserializeOwned + Entity>(&mut self) -> Result<Vec<D>> {
        let pattern = format!("{}%", key_prefix::<D>());
        let rows = self.client.query(LIST_SQL, &[&pattern])?;
        let mut documents = Vec::with_capacity(rows.len());
        for row in rows {
            let body: serde_json::Value = row.get(0);
            documents.push(serde_json::from_value(body)?);
        }
        Ok(documents)
    }
}

#[derive(Debug)]
pub struct DocumentConnectionManager {
    inner: PostgresConnectionManager<NoTls>,
}

impl DocumentConnectionManager {
    pub fn new(inner: PostgresConnectionManager<NoTls>) -> Self {
        DocumentConnectionManager { inner }
    }

    pub fn from_url(url: &str) -> Result<Self, postgres::Error> {
        let config = url.parse::<postgres::Config>()?;
        Ok(Self::new(PostgresConnectionManager::new(config, NoTls)))
    }
}

impl r2d2::ManageConnection for DocumentConnectionManager {
    type Connection = Documents;
    type Error = postgres::Error;

    fn connect(&self) -> Result<Documents, postgres::Error> {
        use r2d2::ManageConnection;
        Ok(Documents::new(self.inner.connect()?))
    }

    fn is_valid(&self, conn: &mut Documents) -> Result<(), postgres::Error> {
        conn.client.simple_query("").map(|_| ())
    }

    fn has_broken(&self, conn: &mut Documents) -> bool {
        conn.client.is_closed()
    }
}
