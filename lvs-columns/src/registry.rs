use std::sync::Arc;

use tracing::debug;

use crate::column::Column;
use crate::dynamic::DynamicColumn;
use crate::error::ColumnError;

/// The dynamic columns registered for a single table, keyed by name.
#[derive(Debug, Default)]
pub struct DynamicColumns {
    columns: ahash::HashMap<String, Arc<dyn DynamicColumn>>,
}

impl DynamicColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a dynamic column under its own name.
    ///
    /// Names are unique within a table, registering a name twice fails.
    pub fn register(&mut self, column: Arc<dyn DynamicColumn>) -> Result<(), ColumnError> {
        let name = column.name();
        if self.columns.contains_key(&name) {
            return Err(ColumnError::DuplicateDynamicColumn(name));
        }
        self.columns.insert(name, column);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn DynamicColumn>> {
        self.columns.get(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.columns.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DynamicColumn>> {
        self.columns.values()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Binds the column referenced as `<dynamic>:<name>:<arguments>`.
    ///
    /// For example `rrddata:load:load1:1426411073:1426416473:60` binds a
    /// column named `load` using the `rrddata` dynamic column.
    pub fn resolve(&self, reference: &str) -> Result<Box<dyn Column>, ColumnError> {
        let Some((dynamic_name, rest)) = reference.split_once(':') else {
            return Err(ColumnError::MissingSeparator(reference.to_string()));
        };

        let Some(dynamic) = self.columns.get(dynamic_name) else {
            return Err(ColumnError::UnknownDynamicColumn(dynamic_name.to_string()));
        };

        let Some((name, arguments)) = rest.split_once(':') else {
            return Err(ColumnError::MissingSeparator(dynamic_name.to_string()));
        };
        if name.is_empty() {
            return Err(ColumnError::EmptyColumnName(dynamic_name.to_string()));
        }

        debug!(dynamic = dynamic_name, column = name, "Resolving dynamic column reference");
        dynamic.create_column(name, arguments)
    }
}
