use std::fmt::{Debug, Formatter};
use std::io;
use std::marker::PhantomData;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use super::{BackingKind, DynamicColumn, DynamicColumnDef, DYNAMIC_COLUMN_DESCRIPTION};
use crate::column::{Column, ColumnType, Row};
use crate::error::{ColumnError, ColumnKindLabel, ConstructionError};
use crate::filter::{Filter, RelationalOperator};
use crate::monitoring::{Core, RowKind};
use crate::offsets::ColumnOffsets;

/// A dynamic column exposing files stored per host.
///
/// The argument string is a path relative to the directory of the host the
/// row belongs to, i.e. `<base>/<host name>/<arguments>`.
pub struct DynamicFileColumn<R> {
    def: DynamicColumnDef,
    core: Arc<dyn Core>,
    base_path: Arc<PathBuf>,
    _row: PhantomData<fn() -> R>,
}

impl<R> Debug for DynamicFileColumn<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicFileColumn")
            .field("def", &self.def)
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

impl<R: RowKind> DynamicFileColumn<R> {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        core: Arc<dyn Core>,
        base_path: PathBuf,
        offsets: ColumnOffsets,
    ) -> Self {
        Self {
            def: DynamicColumnDef::new(name, description, offsets),
            core,
            base_path: Arc::new(base_path),
            _row: PhantomData,
        }
    }

    #[inline]
    pub fn base_path(&self) -> &Path {
        self.base_path.as_path()
    }

    fn validate(&self, arguments: &str) -> Result<PathBuf, ConstructionError> {
        let invalid = |reason: String| ConstructionError::invalid_arguments(self.def.name_str(), reason);

        if arguments.is_empty() {
            return Err(invalid("missing file path".to_string()));
        }

        let path = Path::new(arguments);
        if !is_below(path) {
            return Err(invalid(format!("invalid file path '{arguments}'")));
        }
        Ok(path.to_path_buf())
    }
}

impl<R: RowKind> DynamicColumn for DynamicFileColumn<R> {
    fn definition(&self) -> &DynamicColumnDef {
        &self.def
    }

    fn kind(&self) -> BackingKind {
        BackingKind::File
    }

    fn create_column(&self, name: &str, arguments: &str) -> Result<Box<dyn Column>, ColumnError> {
        let relative = self.validate(arguments)?;
        Ok(Box::new(FileColumn::<R> {
            name: name.to_string(),
            description: DYNAMIC_COLUMN_DESCRIPTION.to_string(),
            offsets: *self.def.offsets(),
            core: self.core.clone(),
            base_path: self.base_path.clone(),
            relative,
            _row: PhantomData,
        }))
    }
}

/// A column bound to a single file below each host directory.
pub struct FileColumn<R> {
    name: String,
    description: String,
    offsets: ColumnOffsets,
    core: Arc<dyn Core>,
    base_path: Arc<PathBuf>,
    relative: PathBuf,
    _row: PhantomData<fn() -> R>,
}

impl<R: RowKind> FileColumn<R> {
    /// Returns the file the column reads for the given row.
    ///
    /// Hosts whose name is not a single plain path component have no files.
    pub fn path(&self, row: &Row<'_>) -> Option<PathBuf> {
        let object = row.locate(&self.offsets)?;
        let location = R::locate(self.core.as_ref(), object)?;

        let host = Path::new(location.host_name());
        if !is_below(host) || host.components().count() != 1 {
            return None;
        }
        Some(self.base_path.join(host).join(&self.relative))
    }
}

/// Whether `path` is a non-empty relative path which cannot leave the directory it is joined to.
fn is_below(path: &Path) -> bool {
    let mut components = path.components().peekable();
    components.peek().is_some() && components.all(|c| matches!(c, Component::Normal(_)))
}

impl<R: RowKind> Column for FileColumn<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn offsets(&self) -> &ColumnOffsets {
        &self.offsets
    }

    fn column_type(&self) -> ColumnType {
        ColumnType::Blob
    }

    fn output(&self, row: &Row<'_>) -> Result<Value, ColumnError> {
        let Some(path) = self.path(row) else {
            return Ok(Value::Null);
        };

        match std::fs::read(&path) {
            Ok(content) => Ok(Value::String(String::from_utf8_lossy(&content).into_owned())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Value::Null),
            Err(e) => Err(e.into()),
        }
    }

    fn create_filter(
        &self,
        _operator: RelationalOperator,
        _value: &str,
    ) -> Result<Box<dyn Filter>, ColumnError> {
        Err(ColumnError::UnsupportedOperation {
            kind: ColumnKindLabel::Bound(BackingKind::File),
            column: self.name.clone(),
        })
    }
}
