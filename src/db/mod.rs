pub mod postgres;

pub use postgres::{MaterialsStore, PgMaterialsStore};

#[cfg(test)]
pub use postgres::MockMaterialsStore;
