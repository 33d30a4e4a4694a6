use crate::error::RepoError;
use crate::import::ImportRow;
use crate::record::{cell_text, StudentRecord, COLUMNS, COL_ROLL_NUMBER};
use crate::store::Worksheet;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBucket {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressPoint {
    pub roll_number: String,
    pub attendance: f64,
    pub study_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidImportRow {
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_number: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub rows_total: usize,
    pub added: Vec<String>,
    pub duplicates: Vec<String>,
    pub invalid: Vec<InvalidImportRow>,
}

/// Upper bound on `marks_histogram` buckets accepted from callers.
pub const MAX_HISTOGRAM_BUCKETS: usize = 1000;

/// Student records over one worksheet. Roll numbers are compared by their
/// textual form everywhere, so `"007"` and `"7"` are different students.
pub struct Repository<W: Worksheet> {
    sheet: W,
}

impl<W: Worksheet> Repository<W> {
    /// Takes ownership of an opened worksheet. The header must be exactly
    /// `COLUMNS`, since appends are positional.
    pub fn new(sheet: W) -> Result<Self, RepoError> {
        if sheet.header() != COLUMNS {
            let missing: Vec<String> = COLUMNS
                .iter()
                .filter(|c| !sheet.header().iter().any(|h| h == *c))
                .map(|c| c.to_string())
                .collect();
            // Same names in a different order still cannot take positional writes.
            return Err(if missing.is_empty() {
                RepoError::InvalidArgument(format!(
                    "worksheet {} has columns out of order: {}",
                    sheet.title(),
                    sheet.header().join(", ")
                ))
            } else {
                RepoError::SchemaMismatch { missing }
            });
        }
        Ok(Self { sheet })
    }

    #[cfg(test)]
    pub fn sheet(&self) -> &W {
        &self.sheet
    }

    pub fn add(&mut self, record: &StudentRecord) -> Result<(), RepoError> {
        record.validate()?;
        let rows = self.sheet.list_all()?;
        let exists = rows.iter().any(|row| {
            row.get(COL_ROLL_NUMBER)
                .map(|v| cell_text(v) == record.roll_number)
                .unwrap_or(false)
        });
        if exists {
            warn!(roll_number = %record.roll_number, "rejected duplicate roll number");
            return Err(RepoError::DuplicateKey(record.roll_number.clone()));
        }
        self.sheet.append_row(record.to_cells())?;
        info!(roll_number = %record.roll_number, sheet = self.sheet.title(), "student added");
        Ok(())
    }

    /// Removes the first row whose roll number matches and returns the
    /// worksheet row number it occupied.
    pub fn delete(&mut self, roll_number: &str) -> Result<usize, RepoError> {
        if roll_number.trim().is_empty() {
            return Err(RepoError::InvalidRecord(
                "roll number must not be empty".into(),
            ));
        }
        let rows = self.sheet.list_all()?;
        let position = rows.iter().position(|row| {
            row.get(COL_ROLL_NUMBER)
                .map(|v| cell_text(v) == roll_number)
                .unwrap_or(false)
        });
        let Some(i) = position else {
            return Err(RepoError::NotFound(roll_number.to_string()));
        };
        // Row 1 is the header.
        let row = i + 2;
        self.sheet.delete_row(row)?;
        info!(roll_number, row, "student deleted");
        Ok(row)
    }

    pub fn list_all(&self) -> Result<Vec<StudentRecord>, RepoError> {
        let rows = self.sheet.list_all()?;
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                StudentRecord::from_row(row).map_err(|message| RepoError::MalformedRow {
                    row: i + 2,
                    message,
                })
            })
            .collect()
    }

    /// Highest marks first; equal marks keep table order.
    pub fn top_n_by_marks(&self, n: usize) -> Result<Vec<StudentRecord>, RepoError> {
        let mut records = self.list_all()?;
        records.sort_by(|a, b| b.marks.partial_cmp(&a.marks).unwrap_or(Ordering::Equal));
        records.truncate(n);
        Ok(records)
    }

    pub fn filter_by_roll_substring(&self, query: &str) -> Result<Vec<StudentRecord>, RepoError> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|r| r.roll_number.contains(query))
            .collect())
    }

    pub fn average_marks_by_subject(&self) -> Result<BTreeMap<String, f64>, RepoError> {
        let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        for r in self.list_all()? {
            let e = sums.entry(r.subject).or_insert((0.0, 0));
            e.0 += r.marks;
            e.1 += 1;
        }
        Ok(sums
            .into_iter()
            .map(|(subject, (sum, n))| (subject, sum / n as f64))
            .collect())
    }

    /// Equal-width buckets over [min, max] of current marks. The last
    /// bucket includes `max`. When every mark is equal the result is one
    /// bucket `[m, m]` holding all records. `bucket_count` must lie in
    /// `1..=MAX_HISTOGRAM_BUCKETS`.
    pub fn marks_histogram(&self, bucket_count: usize) -> Result<Vec<HistogramBucket>, RepoError> {
        if bucket_count == 0 {
            return Err(RepoError::InvalidArgument(
                "bucket count must be at least 1".into(),
            ));
        }
        if bucket_count > MAX_HISTOGRAM_BUCKETS {
            return Err(RepoError::InvalidArgument(format!(
                "bucket count must be at most {MAX_HISTOGRAM_BUCKETS}, got {bucket_count}"
            )));
        }
        let marks: Vec<f64> = self.list_all()?.into_iter().map(|r| r.marks).collect();
        let Some((min, max)) = marks.iter().fold(None, |acc: Option<(f64, f64)>, &m| {
            Some(match acc {
                None => (m, m),
                Some((lo, hi)) => (lo.min(m), hi.max(m)),
            })
        }) else {
            return Ok(Vec::new());
        };

        if max <= min {
            return Ok(vec![HistogramBucket {
                lower: min,
                upper: max,
                count: marks.len(),
            }]);
        }

        let width = (max - min) / bucket_count as f64;
        let mut buckets: Vec<HistogramBucket> = (0..bucket_count)
            .map(|i| HistogramBucket {
                lower: min + width * i as f64,
                upper: if i + 1 == bucket_count {
                    max
                } else {
                    min + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();
        for m in marks {
            let i = (((m - min) / width).floor() as usize).min(bucket_count - 1);
            buckets[i].count += 1;
        }
        Ok(buckets)
    }

    pub fn progress_series(&self) -> Result<Vec<ProgressPoint>, RepoError> {
        Ok(self
            .list_all()?
            .into_iter()
            .map(|r| ProgressPoint {
                roll_number: r.roll_number,
                attendance: r.attendance,
                study_hours: r.study_hours,
            })
            .collect())
    }

    /// Adds each row independently. Duplicates and bad rows are reported and
    /// skipped. A store failure stops the import with `ImportInterrupted`,
    /// which lists the rows already committed.
    pub fn import_rows(&mut self, rows: Vec<ImportRow>) -> Result<ImportReport, RepoError> {
        let mut report = ImportReport {
            rows_total: rows.len(),
            ..ImportReport::default()
        };
        for row in rows {
            let record = match row.parsed {
                Ok(r) => r,
                Err(message) => {
                    report.invalid.push(InvalidImportRow {
                        line: row.line,
                        roll_number: row.roll_number,
                        message,
                    });
                    continue;
                }
            };
            match self.add(&record) {
                Ok(()) => report.added.push(record.roll_number),
                Err(RepoError::DuplicateKey(roll)) => report.duplicates.push(roll),
                Err(RepoError::InvalidRecord(message)) => {
                    debug!(line = row.line, %message, "skipping invalid import row");
                    report.invalid.push(InvalidImportRow {
                        line: row.line,
                        roll_number: row.roll_number,
                        message,
                    });
                }
                Err(e) => {
                    warn!(line = row.line, added = report.added.len(), error = %e, "import interrupted");
                    return Err(RepoError::ImportInterrupted {
                        added: report.added,
                        source: Box::new(e),
                    });
                }
            }
        }
        info!(
            total = report.rows_total,
            added = report.added.len(),
            duplicates = report.duplicates.len(),
            invalid = report.invalid.len(),
            "import finished"
        );
        Ok(report)
    }
}
