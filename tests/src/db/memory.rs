use crate::Setup;

use dbexport::Driver;
use dbexport_core::{schema::Object, stmt::ValueRecord, Dialect};
use dbexport_driver_memory::Memory;
use std::sync::Arc;

pub struct SetupMemory {
    pub db: Memory,
}

impl SetupMemory {
    pub fn google_standard_sql() -> Self {
        Self {
            db: Memory::google_standard_sql(),
        }
    }

    pub fn postgresql() -> Self {
        Self {
            db: Memory::postgresql(),
        }
    }
}

#[async_trait::async_trait]
impl Setup for SetupMemory {
    fn dialect(&self) -> Dialect {
        self.db.dialect()
    }

    async fn driver(&self) -> Arc<dyn Driver> {
        Arc::new(self.db.clone())
    }

    async fn create(&self, object: Object) {
        self.db.create(object).unwrap();
    }

    async fn insert(&self, table: &str, rows: Vec<ValueRecord>) {
        self.db.insert(table, rows).unwrap();
    }

    async fn cleanup(&self) -> dbexport::Result<()> {
        Ok(())
    }
}
