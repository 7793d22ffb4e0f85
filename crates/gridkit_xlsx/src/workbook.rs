//! Workbook façade: sheet registry plus the backend that sheets flush into.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::backend::{GridBackend, SheetBackend, SpecGridSheet};
use crate::conf::derive_default_workbook_options;
use crate::error::{GridError, Result};
use crate::sheet::SheetBuilder;
use crate::spec::{EnumWorkbookFormat, SpecSheetReport, SpecWorkbookOptions};
use crate::util::{derive_unique_sheet_name, sanitize_sheet_name};
use crate::writer::XlsxBackend;

////////////////////////////////////////////////////////////////////////////////
// #region SheetRegistry

#[derive(Debug, Default)]
struct RegistryState {
    l_builders: Vec<Arc<SheetBuilder>>,
    dict_idx_by_name: HashMap<String, usize>,
    set_sheet_names: BTreeSet<String>,
}

/// Name -> sheet builder map; each name gets exactly one builder, in creation order.
#[derive(Debug)]
pub struct SheetRegistry {
    sheet_name_replace_to: String,
    state: RwLock<RegistryState>,
}

impl Default for SheetRegistry {
    fn default() -> Self {
        Self::new("_")
    }
}

impl SheetRegistry {
    /// Create an empty registry; `replace_to` substitutes illegal sheet-name characters.
    pub fn new(replace_to: &str) -> Self {
        Self {
            sheet_name_replace_to: replace_to.to_string(),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Builder registered as `name`, created on first request.
    pub fn sheet_builder(&self, name: &str) -> Arc<SheetBuilder> {
        if let Some(builder) = self.get(name) {
            return builder;
        }

        let mut state = self.state.write();
        if let Some(&idx) = state.dict_idx_by_name.get(name) {
            return Arc::clone(&state.l_builders[idx]);
        }
        let c_sanitized = sanitize_sheet_name(name, &self.sheet_name_replace_to);
        let c_sheet_name = derive_unique_sheet_name(&c_sanitized, &mut state.set_sheet_names);
        if c_sheet_name != name {
            tracing::debug!(name, sheet_name = %c_sheet_name, "sheet name adjusted");
        }

        let builder = Arc::new(SheetBuilder::new(name, c_sheet_name));
        let n_idx = state.l_builders.len();
        state.l_builders.push(Arc::clone(&builder));
        state.dict_idx_by_name.insert(name.to_string(), n_idx);
        builder
    }

    /// Builder registered as `name`, if any.
    pub fn get(&self, name: &str) -> Option<Arc<SheetBuilder>> {
        let state = self.state.read();
        state
            .dict_idx_by_name
            .get(name)
            .map(|&idx| Arc::clone(&state.l_builders[idx]))
    }

    /// Requested names in creation order.
    pub fn names(&self) -> Vec<String> {
        self.state
            .read()
            .l_builders
            .iter()
            .map(|builder| builder.name().to_string())
            .collect()
    }

    /// All builders in creation order.
    pub fn builders(&self) -> Vec<Arc<SheetBuilder>> {
        self.state.read().l_builders.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().l_builders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WorkbookBuilder

/// Workbook under construction.
///
/// Sheet builders are shared (`Arc`) and can be appended to from any thread; flushing and
/// saving need `&mut self` because they write into the single backend.
pub struct WorkbookBuilder {
    options: SpecWorkbookOptions,
    registry: Arc<SheetRegistry>,
    backend: Box<dyn SheetBackend>,
}

impl Default for WorkbookBuilder {
    fn default() -> Self {
        Self::new(derive_default_workbook_options())
    }
}

impl WorkbookBuilder {
    pub fn new(options: SpecWorkbookOptions) -> Self {
        let backend: Box<dyn SheetBackend> = match options.rule_format {
            EnumWorkbookFormat::Xlsx => Box::new(XlsxBackend::new()),
            EnumWorkbookFormat::Grid => Box::new(GridBackend::new()),
        };
        Self {
            registry: Arc::new(SheetRegistry::new(&options.sheet_name_replace_to)),
            options,
            backend,
        }
    }

    pub fn options(&self) -> &SpecWorkbookOptions {
        &self.options
    }

    pub fn format(&self) -> EnumWorkbookFormat {
        self.backend.format()
    }

    /// Shared registry, for handing sheet access to worker threads.
    pub fn registry(&self) -> Arc<SheetRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn sheet_builder(&self, name: &str) -> Arc<SheetBuilder> {
        self.registry.sheet_builder(name)
    }

    fn builder(&self, name: &str) -> Result<Arc<SheetBuilder>> {
        self.registry
            .get(name)
            .ok_or_else(|| GridError::SheetNotFound(name.to_string()))
    }

    /// Create backend sheets for every registered builder, in creation order.
    fn ensure_sheets(&mut self) -> Result<()> {
        for builder in self.registry.builders() {
            self.backend.ensure_sheet(builder.sheet_name())?;
        }
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////////////
    // #region Flush

    /// Flush one sheet. Returns whether anything was written.
    pub fn flush_sheet(&mut self, name: &str) -> Result<bool> {
        let builder = self.builder(name)?;
        self.ensure_sheets()?;
        builder.flush(self.backend.as_mut())
    }

    /// Flush every sheet in creation order. Returns the number of sheets that wrote data.
    pub fn flush(&mut self) -> Result<usize> {
        self.ensure_sheets()?;
        let mut cnt_flushed = 0usize;
        for builder in self.registry.builders() {
            if builder.flush(self.backend.as_mut())? {
                cnt_flushed += 1;
            }
        }
        Ok(cnt_flushed)
    }

    /// Flush everything and serialize the document.
    pub fn save_to_buffer(&mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.backend.serialize()
    }

    /// Flush everything and write the document to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let v_bytes = self.save_to_buffer()?;
        std::fs::write(path.as_ref(), v_bytes)?;
        tracing::debug!(path = %path.as_ref().display(), "workbook saved");
        Ok(())
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
    // #region Handles

    /// Native xlsx workbook, for adjustments the layout engine does not cover.
    ///
    /// Pending appends of every sheet are flushed first.
    pub fn xlsx_workbook(&mut self) -> Result<&mut Workbook> {
        let actual = self.backend.format();
        if actual == EnumWorkbookFormat::Xlsx {
            self.flush()?;
        }
        self.backend
            .xlsx_workbook_mut()
            .ok_or(GridError::InvalidHandle {
                expected: EnumWorkbookFormat::Xlsx,
                actual,
            })
    }

    /// Native worksheet behind the sheet registered as `name`, flushed like
    /// [`Self::xlsx_workbook`].
    pub fn xlsx_worksheet(&mut self, name: &str) -> Result<&mut Worksheet> {
        let builder = self.builder(name)?;
        let workbook = self.xlsx_workbook()?;
        Ok(workbook.worksheet_from_name(builder.sheet_name())?)
    }

    /// Materialized grid of the sheet registered as `name`, after flushing pending appends.
    pub fn grid_sheet(&mut self, name: &str) -> Result<&SpecGridSheet> {
        let actual = self.backend.format();
        if actual != EnumWorkbookFormat::Grid {
            return Err(GridError::InvalidHandle {
                expected: EnumWorkbookFormat::Grid,
                actual,
            });
        }
        let builder = self.builder(name)?;
        self.flush()?;
        self.backend
            .grid_sheet(builder.sheet_name())
            .ok_or_else(|| GridError::SheetNotFound(name.to_string()))
    }

    /// Per-sheet reports in creation order.
    pub fn reports(&self) -> Vec<SpecSheetReport> {
        self.registry
            .builders()
            .iter()
            .map(|builder| builder.report())
            .collect()
    }

    // #endregion
    ////////////////////////////////////////////////////////////////////////////
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
