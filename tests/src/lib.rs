#[macro_use]
mod macros;

pub mod db;
mod export_test;
mod isolation;
pub mod output;

// Re-export for use in macros
pub use export_test::ExportTest;
pub use output::{column, export, export_until, ids, AvroFile, Export};

use dbexport::Driver;
use dbexport_core::{
    schema::Object,
    stmt::{Value, ValueRecord},
    Dialect,
};
use std::sync::Arc;

#[async_trait::async_trait]
pub trait Setup: Send + Sync + 'static {
    fn dialect(&self) -> Dialect;

    /// A driver reading this setup's database.
    async fn driver(&self) -> Arc<dyn Driver>;

    /// Creates `object`. Column types are spelled in [`Self::dialect`].
    async fn create(&self, object: Object);

    /// Inserts rows in one commit. Each row holds every column, in order.
    async fn insert(&self, table: &str, rows: Vec<ValueRecord>);

    /// Drops everything this setup created.
    async fn cleanup(&self) -> dbexport::Result<()>;

    /// Picks the spelling of a column type for this setup's dialect.
    fn ty<'a>(&self, standard: &'a str, postgres: &'a str) -> &'a str {
        match self.dialect() {
            Dialect::GoogleStandardSql => standard,
            Dialect::PostgreSql => postgres,
        }
    }
}

/// Builds a row from values convertible into [`Value`].
#[macro_export]
macro_rules! row {
    ( $( $value:expr ),* $(,)? ) => {
        dbexport_core::stmt::ValueRecord::from_vec(vec![
            $( dbexport_core::stmt::Value::from($value) ),*
        ])
    };
}

/// `count` singer rows: `(id, name, score)` with ids `1..=count`.
pub fn singers(count: i64) -> Vec<ValueRecord> {
    (1..=count)
        .map(|id| {
            ValueRecord::from_vec(vec![
                Value::I64(id),
                Value::String(format!("singer-{id}")),
                if id % 10 == 0 {
                    Value::Null
                } else {
                    Value::F64(id as f64 / 2.0)
                },
            ])
        })
        .collect()
}

/// Creates `T_Singers(id, name, score)` keyed by `id`.
pub async fn create_singers<S: Setup + ?Sized>(setup: &S, name: &str) {
    use dbexport_core::schema::Field;

    setup
        .create(Object::table(
            name,
            vec![
                Field::new("id", setup.ty("INT64", "bigint")).not_null(),
                Field::new("name", setup.ty("STRING(MAX)", "text")),
                Field::new("score", setup.ty("FLOAT64", "double precision")),
            ],
            vec!["id".to_string()],
        ))
        .await;
}
