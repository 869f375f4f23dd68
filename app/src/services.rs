//! The narrow seam between the catalog and whatever drives it. A
//! request value (`ListDishes`, `CreateDish`, ...) names one catalog
//! operation and carries its input; `Resp` names the successful
//! outcome. Boundaries (HTTP handlers, the `fm` CLI, scenario tests)
//! hold a `Queryable`/`Commandable` and stay ignorant of pools,
//! storage, and reconciliation.

use anyhow::Result;

/// One operation's input, tied to its success type.
pub trait Request {
    type Resp;
}

/// Read-only catalog operations: listing the menu, fetching one dish.
pub trait Queryable<Req: Request> {
    fn query(&self, req: Req) -> Result<Req::Resp>;
}

/// State-changing catalog operations: create, update, delete.
pub trait Commandable<Req: Request> {
    fn execute(&self, req: Req) -> Result<Req::Resp>;
}
