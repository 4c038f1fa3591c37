//! Python bindings for rebridge
//!
//! Exposes `Option`, `Pattern`, `Match` and `Region` as the `rebridge`
//! module. Offsets seen from Python are always character offsets, whatever
//! encoding a search ran in.

use pyo3::exceptions::{PyIndexError, PyKeyError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyString;
use rebridge_core::{Match, MatchCursor, Options, Pattern, Region, RegexError};

fn to_py_err(e: RegexError) -> PyErr {
    match e {
        RegexError::InvalidGroupIndex(_) => PyIndexError::new_err(e.to_string()),
        RegexError::UnknownGroupName(_) => PyKeyError::new_err(e.to_string()),
        RegexError::Engine(_) => PyRuntimeError::new_err(e.to_string()),
        _ => PyValueError::new_err(e.to_string()),
    }
}

/// Engine option flags
#[pyclass(name = "Option", frozen)]
pub struct PyOption;

#[pymethods]
impl PyOption {
    #[classattr]
    const NONE: u32 = Options::NONE.bits();
    #[classattr]
    const IGNORECASE: u32 = Options::IGNORECASE.bits();
    #[classattr]
    const EXTEND: u32 = Options::EXTEND.bits();
    #[classattr]
    const MULTILINE: u32 = Options::MULTILINE.bits();
    #[classattr]
    const SINGLELINE: u32 = Options::SINGLELINE.bits();
    #[classattr]
    const FIND_LONGEST: u32 = Options::FIND_LONGEST.bits();
    #[classattr]
    const FIND_NOT_EMPTY: u32 = Options::FIND_NOT_EMPTY.bits();
    #[classattr]
    const NEGATE_SINGLELINE: u32 = Options::NEGATE_SINGLELINE.bits();
}

/// A character region `[begin, end)`
#[pyclass(name = "Region", frozen, eq, hash)]
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PyRegion {
    #[pyo3(get)]
    begin: usize,
    #[pyo3(get)]
    end: usize,
}

impl From<Region> for PyRegion {
    fn from(region: Region) -> Self {
        PyRegion {
            begin: region.begin,
            end: region.end,
        }
    }
}

#[pymethods]
impl PyRegion {
    #[new]
    fn new(begin: usize, end: usize) -> Self {
        PyRegion { begin, end }
    }

    fn __repr__(&self) -> String {
        format!("Region(begin={}, end={})", self.begin, self.end)
    }
}

/// A compiled pattern
#[pyclass(name = "Pattern", frozen)]
pub struct PyPattern {
    inner: Pattern,
}

#[pymethods]
impl PyPattern {
    #[new]
    #[pyo3(signature = (pattern, *, options = 0))]
    fn new(pattern: &str, options: u32) -> PyResult<Self> {
        let options = Options::from_bits(options)
            .ok_or_else(|| PyValueError::new_err(format!("unknown option bits {options:#x}")))?;
        let inner = Pattern::new(pattern, options).map_err(to_py_err)?;
        Ok(PyPattern { inner })
    }

    /// The pattern source
    #[getter]
    fn pattern(&self) -> &str {
        self.inner.as_str()
    }

    /// The option bits
    #[getter]
    fn options(&self) -> u32 {
        self.inner.options().bits()
    }

    /// First match at or after character offset `start`
    #[pyo3(signature = (text, *, start = 0))]
    fn search(slf: &Bound<'_, Self>, text: &str, start: usize) -> PyResult<Option<PyMatch>> {
        let found = slf
            .get()
            .inner
            .search_at(text, start)
            .map_err(to_py_err)?;
        Ok(found.map(|m| PyMatch::snapshot(slf, &m)))
    }

    /// Lazy iterator over all matches; each step runs one search
    #[pyo3(signature = (text, *, start = 0))]
    fn finditer(slf: &Bound<'_, Self>, text: &str, start: usize) -> PyResult<PyMatchIterator> {
        let inner = &slf.get().inner;
        let cursor = inner
            .match_cursor(&inner.wrap(text), start)
            .map_err(to_py_err)?;
        Ok(PyMatchIterator {
            pattern: slf.clone().unbind(),
            cursor,
        })
    }

    /// List of all matches
    #[pyo3(signature = (text, *, start = 0))]
    fn findall(slf: &Bound<'_, Self>, text: &str, start: usize) -> PyResult<Vec<PyMatch>> {
        slf.get()
            .inner
            .find_iter_at(text, start)
            .map_err(to_py_err)?
            .map(|found| found.map(|m| PyMatch::snapshot(slf, &m)).map_err(to_py_err))
            .collect()
    }

    /// Group numbers carrying `name`
    fn get_group_numbers(&self, name: &str) -> PyResult<Vec<usize>> {
        self.inner.group_numbers_by_name(name).map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "rebridge.Pattern({:?}, options={})",
            self.inner.as_str(),
            self.inner.options().bits()
        )
    }
}

/// Iterator returned by `Pattern.finditer`
#[pyclass(name = "MatchIterator")]
pub struct PyMatchIterator {
    pattern: Py<PyPattern>,
    cursor: MatchCursor,
}

#[pymethods]
impl PyMatchIterator {
    fn __iter__(slf: PyRef<'_, Self>) -> PyRef<'_, Self> {
        slf
    }

    fn __next__(mut slf: PyRefMut<'_, Self>) -> PyResult<Option<PyMatch>> {
        let py = slf.py();
        let pattern = slf.pattern.clone_ref(py).into_bound(py);
        match slf.cursor.advance(&pattern.get().inner) {
            Some(found) => found
                .map(|m| Some(PyMatch::snapshot(&pattern, &m)))
                .map_err(to_py_err),
            None => Ok(None),
        }
    }
}

#[derive(FromPyObject)]
enum GroupKey {
    Index(isize),
    Name(String),
}

#[derive(IntoPyObject)]
enum GroupValue {
    One(Option<String>),
    Many(Vec<Option<String>>),
}

/// One successful search
#[pyclass(name = "Match", frozen)]
pub struct PyMatch {
    pattern: Py<PyPattern>,
    whole: Region,
    regions: Vec<Option<Region>>,
    groups: Vec<Option<String>>,
}

impl PyMatch {
    fn snapshot(pattern: &Bound<'_, PyPattern>, m: &Match<'_>) -> Self {
        PyMatch {
            pattern: pattern.clone().unbind(),
            whole: m.region(),
            regions: m.regions().to_vec(),
            groups: m
                .groups()
                .into_iter()
                .map(|group| group.map(str::to_string))
                .collect(),
        }
    }

    fn group_by_number(&self, index: usize) -> PyResult<Option<String>> {
        self.groups
            .get(index)
            .cloned()
            .ok_or_else(|| to_py_err(RegexError::InvalidGroupIndex(index)))
    }
}

#[pymethods]
impl PyMatch {
    /// The pattern that produced this match
    #[getter]
    fn pattern(&self, py: Python<'_>) -> Py<PyPattern> {
        self.pattern.clone_ref(py)
    }

    #[getter]
    fn start(&self) -> usize {
        self.whole.begin
    }

    #[getter]
    fn end(&self) -> usize {
        self.whole.end
    }

    #[getter]
    fn region(&self) -> PyRegion {
        self.whole.into()
    }

    /// Regions of every group; `None` where a group did not take part
    #[getter]
    fn regions(&self) -> Vec<Option<PyRegion>> {
        self.regions
            .iter()
            .map(|region| region.map(PyRegion::from))
            .collect()
    }

    /// Text of a group by number, or of every group carrying a name
    fn group(&self, key: GroupKey) -> PyResult<GroupValue> {
        match key {
            GroupKey::Index(index) => {
                let index = usize::try_from(index)
                    .map_err(|_| PyIndexError::new_err(format!("invalid group index {index}")))?;
                self.group_by_number(index).map(GroupValue::One)
            }
            GroupKey::Name(name) => self
                .pattern
                .get()
                .inner
                .group_numbers_by_name(&name)
                .map_err(to_py_err)?
                .into_iter()
                .map(|index| self.group_by_number(index))
                .collect::<PyResult<_>>()
                .map(GroupValue::Many),
        }
    }

    /// Texts of all groups, group 0 first
    fn groups(&self) -> Vec<Option<String>> {
        self.groups.clone()
    }

    fn __repr__(&self, py: Python<'_>) -> PyResult<String> {
        let text = self.groups.first().cloned().flatten().unwrap_or_default();
        let quoted = PyString::new(py, &text).repr()?;
        Ok(format!(
            "<rebridge.Match region={}, match={}>",
            self.whole, quoted
        ))
    }
}

/// Rebridge Python module
#[pymodule(name = "rebridge")]
fn rebridge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyOption>()?;
    m.add_class::<PyPattern>()?;
    m.add_class::<PyMatch>()?;
    m.add_class::<PyMatchIterator>()?;
    m.add_class::<PyRegion>()?;
    Ok(())
}
