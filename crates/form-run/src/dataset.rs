//! Parameter and violation frames built from externally labelled records.

use std::collections::BTreeSet;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

use form_core::errors::{codes, FormError};
use form_core::{Exemplar, ExemplarId, Form, ParamValue, PuzzleId, Signal};
use form_eval::ReferenceTable;
use form_puzzle::StrategyRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::parametrise::Parametriser;

/// Patient and lead identifying a labelled record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    /// Patient identifier.
    pub patient_id: String,
    /// Lead name.
    pub lead: String,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.patient_id, self.lead)
    }
}

/// One signal with point coordinates placed by an external labeller.
#[derive(Debug, Clone)]
pub struct LabelledRecord {
    /// Patient identifier.
    pub patient_id: String,
    /// Lead name.
    pub lead: String,
    /// Raw lead signal.
    pub signal: Signal,
    /// Point name to coordinate in seconds.
    pub points: IndexMap<String, f64>,
}

impl LabelledRecord {
    /// Record key.
    pub fn key(&self) -> RecordKey {
        RecordKey {
            patient_id: self.patient_id.clone(),
            lead: self.lead.clone(),
        }
    }
}

/// Row per record, column per form parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersFrame {
    /// Parameter names in form order.
    pub columns: Vec<String>,
    /// Record keys in row order.
    pub keys: Vec<RecordKey>,
    /// Values; `None` where the record has no value.
    pub rows: Vec<Vec<Option<ParamValue>>>,
}

/// Row per record, column per HC id; `true` marks a violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationsFrame {
    /// HC ids in form order.
    pub columns: Vec<PuzzleId>,
    /// Record keys in row order.
    pub keys: Vec<RecordKey>,
    /// Violation flags.
    pub rows: Vec<Vec<bool>>,
}

/// A record that could not be parametrised.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedRecord {
    /// Record key.
    pub key: RecordKey,
    /// Why it was skipped.
    pub error: FormError,
}

/// Parametrised records of one form.
#[derive(Debug, Clone)]
pub struct LabelledDataset {
    parameters: ParametersFrame,
    violations: ViolationsFrame,
    skipped: Vec<SkippedRecord>,
}

fn to_exemplar(index: usize, record: &LabelledRecord, form: &Form) -> Result<Exemplar, FormError> {
    let mut exemplar = Exemplar::new(ExemplarId::from_raw(index as u64), record.signal.clone());
    for (name, t) in &record.points {
        if form.point_by_name(name).is_none() {
            return Err(FormError::dataset(codes::DATASET_COLUMN, "record places an undeclared point")
                .with_context("point", name.as_str()));
        }
        if !exemplar.add_point(name, *t, None)? {
            return Err(FormError::dataset(codes::DATASET_SHAPE, "labelled point lies outside the signal")
                .with_context("point", name.as_str())
                .with_context("t", t.to_string()));
        }
    }
    Ok(exemplar)
}

impl LabelledDataset {
    /// Parametrises every record; failing records are skipped and listed.
    ///
    /// Schema and binding failures of the form itself are returned.
    pub fn build(form: &Form, registry: &StrategyRegistry, records: &[LabelledRecord]) -> Result<Self, FormError> {
        let parametriser = Parametriser::new(form, registry)?;
        let columns: Vec<String> = form.parameters.iter().map(|param| param.name.clone()).collect();
        let hc_ids: Vec<PuzzleId> = form.hcs().map(|hc| hc.id).collect();
        let mut parameters = ParametersFrame {
            columns,
            keys: Vec::new(),
            rows: Vec::new(),
        };
        let mut violations = ViolationsFrame {
            columns: hc_ids,
            keys: Vec::new(),
            rows: Vec::new(),
        };
        let mut skipped = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let key = record.key();
            let outcome = to_exemplar(index, record, form).and_then(|mut exemplar| {
                parametriser.parametrise(&mut exemplar)?;
                Ok(exemplar)
            });
            let exemplar = match outcome {
                Ok(exemplar) => exemplar,
                Err(error) => {
                    warn!(record = %key, code = error.code(), "record skipped");
                    skipped.push(SkippedRecord { key, error });
                    continue;
                }
            };
            parameters.rows.push(
                parameters
                    .columns
                    .iter()
                    .map(|name| exemplar.parameter(name).cloned())
                    .collect(),
            );
            parameters.keys.push(key.clone());
            violations
                .rows
                .push(violations.columns.iter().map(|id| exemplar.failed_hcs().contains(id)).collect());
            violations.keys.push(key);
        }
        info!(
            form = %form.name,
            records = parameters.rows.len(),
            skipped = skipped.len(),
            "labelled dataset built"
        );
        Ok(Self {
            parameters,
            violations,
            skipped,
        })
    }

    /// Parameter values per record.
    pub fn parameters_frame(&self) -> &ParametersFrame {
        &self.parameters
    }

    /// HC violations per record.
    pub fn violations_frame(&self) -> &ViolationsFrame {
        &self.violations
    }

    /// Records that failed parametrisation.
    pub fn skipped(&self) -> &[SkippedRecord] {
        &self.skipped
    }

    /// Number of parametrised records.
    pub fn len(&self) -> usize {
        self.parameters.rows.len()
    }

    /// Whether no record was parametrised.
    pub fn is_empty(&self) -> bool {
        self.parameters.rows.is_empty()
    }

    fn column(&self, name: &str) -> Result<usize, FormError> {
        self.parameters
            .columns
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| {
                FormError::dataset(codes::DATASET_COLUMN, "form declares no such parameter")
                    .with_context("parameter", name)
            })
    }

    /// Values of one parameter, skipping records without one.
    pub fn parameter_values(&self, name: &str) -> Result<Vec<ParamValue>, FormError> {
        let idx = self.column(name)?;
        Ok(self.parameters.rows.iter().filter_map(|row| row[idx].clone()).collect())
    }

    /// Records violating at least one HC.
    pub fn ids_with_any_violation(&self) -> Vec<&RecordKey> {
        self.violations
            .keys
            .iter()
            .zip(&self.violations.rows)
            .filter(|(_, row)| row.iter().any(|violated| *violated))
            .map(|(key, _)| key)
            .collect()
    }

    /// Records violating `hc`.
    pub fn ids_with_violation(&self, hc: PuzzleId) -> Result<Vec<&RecordKey>, FormError> {
        let idx = self.violations.columns.iter().position(|id| *id == hc).ok_or_else(|| {
            FormError::dataset(codes::DATASET_COLUMN, "form declares no such hard condition")
                .with_context("hc_id", hc.to_string())
        })?;
        Ok(self
            .violations
            .keys
            .iter()
            .zip(&self.violations.rows)
            .filter(|(_, row)| row[idx])
            .map(|(key, _)| key)
            .collect())
    }

    /// Numeric table over `columns` for fitting evaluators.
    ///
    /// Records lacking a value are dropped; with `exclude_violations` so are
    /// records violating any HC.
    pub fn to_reference_table(&self, columns: &[String], exclude_violations: bool) -> Result<ReferenceTable, FormError> {
        let indices = columns
            .iter()
            .map(|name| self.column(name))
            .collect::<Result<Vec<_>, _>>()?;
        let violating: BTreeSet<&RecordKey> = if exclude_violations {
            self.ids_with_any_violation().into_iter().collect()
        } else {
            BTreeSet::new()
        };
        let mut rows = Vec::new();
        for (key, row) in self.parameters.keys.iter().zip(&self.parameters.rows) {
            if violating.contains(key) {
                continue;
            }
            let values: Option<Vec<f64>> = indices
                .iter()
                .map(|idx| row[*idx].as_ref().and_then(ParamValue::as_f64))
                .collect();
            if let Some(values) = values.filter(|values| values.iter().all(|v| v.is_finite())) {
                rows.push(values);
            }
        }
        ReferenceTable::new(columns.to_vec(), rows)
    }

    /// Writes the parameters frame as CSV with `patient_id,lead` key columns.
    pub fn write_parameters_csv<W: io::Write>(&self, writer: W) -> Result<(), FormError> {
        let mut wtr = csv::Writer::from_writer(writer);
        let header = ["patient_id", "lead"]
            .into_iter()
            .map(str::to_string)
            .chain(self.parameters.columns.iter().cloned());
        wtr.write_record(header).map_err(export_error)?;
        for (key, row) in self.parameters.keys.iter().zip(&self.parameters.rows) {
            let cells = [key.patient_id.clone(), key.lead.clone()]
                .into_iter()
                .chain(row.iter().map(|value| value.as_ref().map(ToString::to_string).unwrap_or_default()));
            wtr.write_record(cells).map_err(export_error)?;
        }
        wtr.flush().map_err(|err| export_error(err.into()))
    }

    /// Writes the violations frame as CSV, one column per HC id.
    pub fn write_violations_csv<W: io::Write>(&self, writer: W) -> Result<(), FormError> {
        let mut wtr = csv::Writer::from_writer(writer);
        let header = ["patient_id", "lead"]
            .into_iter()
            .map(str::to_string)
            .chain(self.violations.columns.iter().map(ToString::to_string));
        wtr.write_record(header).map_err(export_error)?;
        for (key, row) in self.violations.keys.iter().zip(&self.violations.rows) {
            let cells = [key.patient_id.clone(), key.lead.clone()]
                .into_iter()
                .chain(row.iter().map(ToString::to_string));
            wtr.write_record(cells).map_err(export_error)?;
        }
        wtr.flush().map_err(|err| export_error(err.into()))
    }

    /// Writes both frames as `parameters.csv` and `violations.csv` under `dir`.
    pub fn export_csv(&self, dir: &Path) -> Result<(), FormError> {
        let path = dir.join("parameters.csv");
        self.write_parameters_csv(create(&path)?)
            .map_err(|err| err.with_context("path", path.display().to_string()))?;
        let path = dir.join("violations.csv");
        self.write_violations_csv(create(&path)?)
            .map_err(|err| err.with_context("path", path.display().to_string()))
    }
}

fn create(path: &Path) -> Result<File, FormError> {
    File::create(path).map_err(|err| {
        FormError::dataset(codes::DATASET_EXPORT, err.to_string()).with_context("path", path.display().to_string())
    })
}

fn export_error(err: csv::Error) -> FormError {
    FormError::dataset(codes::DATASET_EXPORT, err.to_string())
}
