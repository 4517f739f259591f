use crate::{isolation::TestIsolation, Setup};

use dbexport::Driver;
use dbexport_core::{
    schema::{Object, ObjectKind},
    stmt::{Value, ValueRecord},
    Dialect,
};
use std::sync::Arc;
use tokio_postgres::{Client, NoTls};

/// Each test exports its own schema.
pub struct SetupPostgreSQL {
    isolation: TestIsolation,
}

impl SetupPostgreSQL {
    pub fn new() -> Self {
        Self {
            isolation: TestIsolation::new(),
        }
    }

    fn url() -> String {
        std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost:5432/dbexport_test".to_string())
    }

    async fn client(&self) -> Client {
        let (client, connection) = tokio_postgres::connect(&Self::url(), NoTls)
            .await
            .expect("failed to connect to PostgreSQL");

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                eprintln!("PostgreSQL connection error: {e}");
            }
        });

        client
    }

    async fn execute(&self, sql: &str) {
        self.client()
            .await
            .batch_execute(sql)
            .await
            .unwrap_or_else(|e| panic!("{sql}: {e}"));
    }

    fn table(&self, name: &str) -> String {
        format!("{}.{}", ident(&self.isolation.schema_name()), ident(name))
    }
}

impl Default for SetupPostgreSQL {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Setup for SetupPostgreSQL {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSql
    }

    async fn driver(&self) -> Arc<dyn Driver> {
        self.execute(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            ident(&self.isolation.schema_name())
        ))
        .await;

        let url = format!("{}?schema={}", Self::url(), self.isolation.schema_name());
        dbexport::connect(&url).await.unwrap()
    }

    async fn create(&self, object: Object) {
        let ObjectKind::Table { primary_key } = &object.kind else {
            panic!("PostgreSQL databases only have tables");
        };

        self.execute(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}",
            ident(&self.isolation.schema_name())
        ))
        .await;

        let mut columns = vec![];
        for field in &object.fields {
            let mut column = format!("{} {}", ident(&field.name), field.sql_type);
            if let Some(generated) = &field.generated {
                column.push_str(&format!(
                    " GENERATED ALWAYS AS ({}) STORED",
                    generated.expression
                ));
            }
            if !field.nullable {
                column.push_str(" NOT NULL");
            }
            columns.push(column);
        }

        if !primary_key.is_empty() {
            let key: Vec<_> = primary_key.iter().map(|name| ident(name)).collect();
            columns.push(format!("PRIMARY KEY ({})", key.join(", ")));
        }

        self.execute(&format!(
            "CREATE TABLE {} ({})",
            self.table(&object.name),
            columns.join(", ")
        ))
        .await;
    }

    async fn insert(&self, table: &str, rows: Vec<ValueRecord>) {
        if rows.is_empty() {
            return;
        }

        let rows: Vec<String> = rows
            .iter()
            .map(|row| {
                let values: Vec<_> = row.iter().map(literal).collect();
                format!("({})", values.join(", "))
            })
            .collect();

        self.execute(&format!(
            "INSERT INTO {} VALUES {}",
            self.table(table),
            rows.join(", ")
        ))
        .await;
    }

    async fn cleanup(&self) -> dbexport::Result<()> {
        let sql = format!(
            "DROP SCHEMA IF EXISTS {} CASCADE",
            ident(&self.isolation.schema_name())
        );
        self.client()
            .await
            .batch_execute(&sql)
            .await
            .map_err(dbexport::Error::driver)
    }
}

fn ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::F32(v) => format!("{v}::real"),
        Value::F64(v) => format!("{v}::double precision"),
        Value::String(v) => format!("'{}'", v.replace('\'', "''")),
        Value::Bytes(v) => {
            let hex: String = v.iter().map(|b| format!("{b:02x}")).collect();
            format!("'\\x{hex}'::bytea")
        }
        Value::List(items) => {
            let items: Vec<_> = items.iter().map(literal).collect();
            format!("ARRAY[{}]", items.join(", "))
        }
        Value::Record(_) => panic!("PostgreSQL has no struct columns"),
    }
}
