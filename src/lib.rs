//! Barrow — cart and catalog services for a storefront backend.
//!
//! The cart side is the interesting part: one document per owner, mutated
//! only through [`domain::carts::CartsService`], with price snapshots taken
//! at add time and a read-time repair path that filters line items whose
//! products no longer resolve. Persistence sits behind store traits so the
//! engine can be wired to Postgres in production and to in-memory documents
//! in tests.

pub mod context;
pub mod database;
pub mod domain;
pub mod ids;
pub mod storage;

#[cfg(test)]
mod test;
