use std::collections::BTreeMap;

use palletinator::conf::{derive_default_pallet_policy, derive_default_program_options};
use palletinator::{
    DesignFetchError, DesignId, DesignResolver, EnumCellValue, Pallet, PalletCell, PalletConfig,
    PalletError, PalletType, ReportPalletProgram, ReportSides, RowRecord, SpecColumnNames,
    TUP_SIDE_HEADERS, build_pallet_program, flip_pallet_sides, parse_pallet, parse_sides,
    restore_pallet_columns,
};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyBytes;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "palletinator.pallet.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

const TUP_COLUMN_NAME_KEYS: [&str; 12] = [
    "callout",
    "parent_zppk",
    "baby_zppk",
    "team_key",
    "team_name",
    "requested_pallet_count",
    "date_column",
    "color_description",
    "logo_description",
    "side",
    "column",
    "row",
];

////////////////////////////////////////////////////////////////////////////////
// #region Resolver

/// Python catalog object exposing `lookup(key)` and `fetch_image(design_id, size)`.
struct PyDesignResolver {
    resolver: Py<PyAny>,
}

impl DesignResolver for PyDesignResolver {
    fn lookup(&self, key_prefix: &str) -> Option<DesignId> {
        Python::with_gil(|py| {
            self.resolver
                .bind(py)
                .call_method1("lookup", (key_prefix,))
                .and_then(|value| value.extract::<Option<u64>>())
                .ok()
                .flatten()
                .map(DesignId)
        })
    }

    fn fetch_image(
        &self,
        design_id: DesignId,
        size_max: (u32, u32),
    ) -> Result<Vec<u8>, DesignFetchError> {
        Python::with_gil(|py| {
            let value = self
                .resolver
                .bind(py)
                .call_method1("fetch_image", (design_id.0, size_max))
                .map_err(|err| DesignFetchError::Unavailable(err.to_string()))?;
            let bytes = value
                .downcast::<PyBytes>()
                .map_err(|err| DesignFetchError::Decode(err.to_string()))?;
            Ok(bytes.as_bytes().to_vec())
        })
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Models

#[pyclass(name = "PalletCell")]
#[derive(Debug, Clone)]
struct PyPalletCell {
    #[pyo3(get)]
    display_text: String,
    #[pyo3(get)]
    metadata: BTreeMap<String, String>,
}

impl From<&PalletCell> for PyPalletCell {
    fn from(cell: &PalletCell) -> Self {
        Self {
            display_text: cell.display_text.clone(),
            metadata: cell.metadata.clone(),
        }
    }
}

#[pyclass(name = "Pallet")]
#[derive(Debug, Clone)]
struct PyPallet {
    inner: Pallet,
}

#[pymethods]
impl PyPallet {
    #[getter]
    fn metadata(&self) -> BTreeMap<String, String> {
        self.inner.metadata.clone()
    }

    #[getter]
    fn side_count(&self) -> usize {
        self.inner.sides.len()
    }

    #[getter]
    fn cell_count(&self) -> usize {
        self.inner.cell_count()
    }

    /// Nested `[side][column][cell]` lists, 0-based.
    fn to_list(&self) -> Vec<Vec<Vec<PyPalletCell>>> {
        self.inner
            .sides
            .iter()
            .map(|side| {
                side.columns
                    .iter()
                    .map(|column| column.cells.iter().map(PyPalletCell::from).collect())
                    .collect()
            })
            .collect()
    }

    /// Cells of a 1-based (side, column) slot; empty when out of range.
    fn cells(&self, side: usize, column: usize) -> Vec<PyPalletCell> {
        self.inner
            .cells(side, column)
            .iter()
            .map(PyPalletCell::from)
            .collect()
    }
}

#[pyclass(name = "ReportSides")]
#[derive(Debug, Clone)]
struct PyReportSides {
    inner: ReportSides,
}

#[pymethods]
impl PyReportSides {
    #[getter]
    fn cnt_slots(&self) -> u64 {
        self.inner.cnt_slots
    }

    #[getter]
    fn cnt_trimmed(&self) -> u64 {
        self.inner.cnt_trimmed
    }

    #[getter]
    fn cnt_fetched(&self) -> u64 {
        self.inner.cnt_fetched
    }

    #[getter]
    fn cnt_reused(&self) -> u64 {
        self.inner.cnt_reused
    }

    #[getter]
    fn fallback_count(&self) -> u64 {
        self.inner.fallback_count()
    }

    #[getter]
    fn warnings(&self) -> Vec<String> {
        self.inner.warnings.clone()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.inner.to_dict()
    }

    #[pyo3(signature = (prefix = "[SIDES]"))]
    fn format(&self, prefix: &str) -> String {
        self.inner.format(prefix)
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

#[pyclass(name = "PalletConfig")]
#[derive(Debug, Clone)]
struct PyPalletConfig {
    #[pyo3(get)]
    zppk: String,
    #[pyo3(get)]
    team_key: String,
    #[pyo3(get)]
    team_name: String,
    #[pyo3(get)]
    callout: String,
    #[pyo3(get)]
    dc_target: String,
    #[pyo3(get)]
    pallet_type: String,
    #[pyo3(get)]
    required_count: u64,
    #[pyo3(get)]
    sides: Vec<Vec<String>>,
}

impl From<&PalletConfig> for PyPalletConfig {
    fn from(config: &PalletConfig) -> Self {
        let pallet_type = match config.pallet_type {
            PalletType::Full => "FULL",
            PalletType::Half => "HALF",
            PalletType::Tower => "TOWER",
        };
        Self {
            zppk: config.zppk.clone(),
            team_key: config.team_key.clone(),
            team_name: config.team_name.clone(),
            callout: config.callout.clone(),
            dc_target: config.dc_target.clone(),
            pallet_type: pallet_type.to_string(),
            required_count: config.required_count,
            sides: config.sides.clone(),
        }
    }
}

#[pyclass(name = "ReportPalletProgram")]
#[derive(Debug, Clone)]
struct PyReportPalletProgram {
    inner: ReportPalletProgram,
}

#[pymethods]
impl PyReportPalletProgram {
    #[getter]
    fn configs(&self) -> Vec<PyPalletConfig> {
        self.inner.configs.iter().map(PyPalletConfig::from).collect()
    }

    #[getter]
    fn cnt_rows_grouped(&self) -> u64 {
        self.inner.cnt_rows_grouped
    }

    #[getter]
    fn cnt_rows_ungrouped(&self) -> u64 {
        self.inner.cnt_rows_ungrouped
    }

    #[getter]
    fn sides(&self) -> PyReportSides {
        PyReportSides {
            inner: self.inner.sides.clone(),
        }
    }

    #[getter]
    fn warnings(&self) -> Vec<String> {
        self.inner.warnings.clone()
    }

    #[pyo3(signature = (prefix = "[PROGRAM]"))]
    fn format(&self, prefix: &str) -> String {
        self.inner.format(prefix)
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Conversion

fn map_pallet_error(exception: PalletError) -> PyErr {
    PyValueError::new_err(exception.to_string())
}

fn extract_cell_value(value: &Bound<'_, PyAny>) -> PyResult<EnumCellValue> {
    if value.is_none() {
        return Ok(EnumCellValue::None);
    }
    if let Ok(text) = value.extract::<String>() {
        return Ok(EnumCellValue::String(text));
    }
    if let Ok(number) = value.extract::<f64>() {
        return Ok(EnumCellValue::Number(number));
    }
    Ok(EnumCellValue::String(value.str()?.extract::<String>()?))
}

fn parse_column_names(column_names: &BTreeMap<String, Option<String>>) -> PyResult<SpecColumnNames> {
    if let Some(key) = column_names
        .keys()
        .find(|key| !TUP_COLUMN_NAME_KEYS.contains(&key.as_str()))
    {
        return Err(PyValueError::new_err(format!(
            "Invalid column name key: `{key}`. Expected one of: {TUP_COLUMN_NAME_KEYS:?}"
        )));
    }
    let get_optional = |key: &str| column_names.get(key).cloned().flatten();
    let get_required = |key: &str| {
        get_optional(key)
            .ok_or_else(|| PyValueError::new_err(format!("Missing column name for `{key}`")))
    };

    Ok(SpecColumnNames {
        callout: get_optional("callout"),
        parent_zppk: get_required("parent_zppk")?,
        baby_zppk: get_required("baby_zppk")?,
        team_key: get_required("team_key")?,
        team_name: get_required("team_name")?,
        requested_pallet_count: get_required("requested_pallet_count")?,
        date_column: get_optional("date_column"),
        color_description: get_required("color_description")?,
        logo_description: get_required("logo_description")?,
        side: get_optional("side"),
        column: get_required("column")?,
        row: get_required("row")?,
    })
}

fn build_rows(
    records: &[BTreeMap<String, Bound<'_, PyAny>>],
    column_names: &BTreeMap<String, Option<String>>,
) -> PyResult<Vec<RowRecord>> {
    let spec_column_names = parse_column_names(column_names)?;
    records
        .iter()
        .map(|record| {
            let record = record
                .iter()
                .map(|(key, value)| Ok((key.clone(), extract_cell_value(value)?)))
                .collect::<PyResult<BTreeMap<_, _>>>()?;
            RowRecord::build_from(&record, &spec_column_names).map_err(map_pallet_error)
        })
        .collect()
}

fn derive_headers(headers: Option<Vec<String>>) -> Vec<String> {
    headers.unwrap_or_else(|| derive_default_pallet_policy().side_headers)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Functions

#[pyfunction(name = "parse_pallet")]
#[pyo3(signature = (records, column_names, if_repeat_columns = false))]
fn parse_pallet_py<'py>(
    records: Vec<BTreeMap<String, Bound<'py, PyAny>>>,
    column_names: BTreeMap<String, Option<String>>,
    if_repeat_columns: bool,
) -> PyResult<PyPallet> {
    let rows = build_rows(&records, &column_names)?;
    let pallet = parse_pallet(&rows, if_repeat_columns, &derive_default_pallet_policy())
        .map_err(map_pallet_error)?;
    Ok(PyPallet { inner: pallet })
}

#[pyfunction(name = "parse_sides")]
#[pyo3(signature = (records, column_names, resolver, if_repeat_columns = false))]
fn parse_sides_py<'py>(
    py: Python<'py>,
    records: Vec<BTreeMap<String, Bound<'py, PyAny>>>,
    column_names: BTreeMap<String, Option<String>>,
    resolver: Py<PyAny>,
    if_repeat_columns: bool,
) -> PyResult<(Vec<Vec<String>>, PyReportSides)> {
    let rows = build_rows(&records, &column_names)?;
    let resolver = PyDesignResolver { resolver };
    let policy = derive_default_pallet_policy();

    let aggregate = py.allow_threads(|| parse_sides(&rows, if_repeat_columns, &resolver, &policy));
    let aggregate = aggregate.map_err(map_pallet_error)?;
    Ok((
        aggregate.columns,
        PyReportSides {
            inner: aggregate.report,
        },
    ))
}

#[pyfunction(name = "flip_pallet_sides")]
#[pyo3(signature = (columns, headers = None))]
fn flip_pallet_sides_py(
    columns: Vec<Vec<String>>,
    headers: Option<Vec<String>>,
) -> PyResult<Vec<Vec<String>>> {
    flip_pallet_sides(&columns, &derive_headers(headers)).map_err(map_pallet_error)
}

#[pyfunction(name = "restore_pallet_columns")]
#[pyo3(signature = (rows, headers = None))]
fn restore_pallet_columns_py(
    rows: Vec<Vec<String>>,
    headers: Option<Vec<String>>,
) -> PyResult<Vec<Vec<String>>> {
    restore_pallet_columns(&rows, &derive_headers(headers)).map_err(map_pallet_error)
}

#[pyfunction(name = "build_pallet_configs")]
#[pyo3(signature = (records, column_names, resolver, num_workers_max = None))]
fn build_pallet_configs_py<'py>(
    py: Python<'py>,
    records: Vec<BTreeMap<String, Bound<'py, PyAny>>>,
    column_names: BTreeMap<String, Option<String>>,
    resolver: Py<PyAny>,
    num_workers_max: Option<usize>,
) -> PyResult<PyReportPalletProgram> {
    let rows = build_rows(&records, &column_names)?;
    let resolver = PyDesignResolver { resolver };
    let mut spec_program_options = derive_default_program_options();
    spec_program_options.num_workers_max = num_workers_max;

    let report_program =
        py.allow_threads(|| build_pallet_program(rows, &resolver, &spec_program_options));
    let report_program = report_program.map_err(map_pallet_error)?;
    Ok(PyReportPalletProgram {
        inner: report_program,
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[pymodule]
fn _palletinator_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PyPalletCell>()?;
    module.add_class::<PyPallet>()?;
    module.add_class::<PyReportSides>()?;
    module.add_class::<PyPalletConfig>()?;
    module.add_class::<PyReportPalletProgram>()?;
    module.add_function(wrap_pyfunction!(parse_pallet_py, module)?)?;
    module.add_function(wrap_pyfunction!(parse_sides_py, module)?)?;
    module.add_function(wrap_pyfunction!(flip_pallet_sides_py, module)?)?;
    module.add_function(wrap_pyfunction!(restore_pallet_columns_py, module)?)?;
    module.add_function(wrap_pyfunction!(build_pallet_configs_py, module)?)?;
    module.add("SIDE_HEADERS", TUP_SIDE_HEADERS.to_vec())?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
