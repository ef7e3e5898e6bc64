use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use ac_types::{AcResult, Column, DataError, Dataset};

/// Loads header-row CSV files into a [`Dataset`].
///
/// A column is numeric when every non-empty cell parses as a float;
/// anything else is kept as raw text. Empty cells are missing values.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    delimiter: u8,
}

impl CsvLoader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Load a dataset from a CSV file on disk
    pub fn load_csv_file<P: AsRef<Path>>(&self, file_path: P) -> AcResult<Dataset> {
        let path = file_path.as_ref();
        tracing::info!("Loading CSV data from: {}", path.display());

        let file = std::fs::File::open(path).map_err(|e| DataError::LoadingFailed {
            message: format!("Failed to open CSV file {}: {}", path.display(), e),
        })?;

        let dataset = self.load_csv_reader(file)?;
        tracing::info!(
            "Loaded {} rows x {} columns from {}",
            dataset.len(),
            dataset.columns().len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Load a dataset from any CSV byte stream
    pub fn load_csv_reader<R: Read>(&self, reader: R) -> AcResult<Dataset> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to read CSV headers: {}", e),
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        Self::validate_headers(&headers)?;
        tracing::debug!("CSV headers: {:?}", headers);

        let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for (line_num, result) in rdr.records().enumerate() {
            // Header is line 1.
            let line = line_num + 2;
            let record = result.map_err(|e| DataError::LoadingFailed {
                message: format!("Failed to read CSV record at line {}: {}", line, e),
            })?;

            if record.len() != headers.len() {
                return Err(DataError::ParseError {
                    message: format!(
                        "CSV record at line {} has {} fields, expected {}",
                        line,
                        record.len(),
                        headers.len()
                    ),
                }
                .into());
            }

            for (column, field) in cells.iter_mut().zip(record.iter()) {
                let field = field.trim();
                column.push(if field.is_empty() {
                    None
                } else {
                    Some(field.to_string())
                });
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| Self::typed_column(name, values))
            .collect();

        Dataset::new(columns)
    }

    fn validate_headers(headers: &[String]) -> AcResult<()> {
        if headers.is_empty() {
            return Err(DataError::InvalidFormat {
                message: "CSV file has no header row".to_string(),
            }
            .into());
        }

        let mut seen = HashSet::new();
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                return Err(DataError::InvalidFormat {
                    message: format!("CSV header {} is empty", i + 1),
                }
                .into());
            }
            if !seen.insert(header.as_str()) {
                return Err(DataError::DuplicateColumn {
                    column: header.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn typed_column(name: String, values: Vec<Option<String>>) -> Column {
        let parsed: Option<Vec<f64>> = values
            .iter()
            .map(|cell| match cell {
                None => Some(f64::NAN),
                Some(s) => s.parse::<f64>().ok(),
            })
            .collect();

        match parsed {
            Some(numbers) if values.iter().any(Option::is_some) => Column::numeric(name, numbers),
            _ => Column::text(name, values),
        }
    }
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ac_types::{AcError, ColumnKind};
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn infers_numeric_and_text_columns() {
        let csv = "age,city,price\n31,paris,\"1,000\"\n45,oslo,\"2,500\"\n,paris,\"3,000\"\n";
        let dataset = CsvLoader::new().load_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.column_names(), vec!["age", "city", "price"]);

        let age = dataset.column("age").unwrap();
        assert_eq!(age.kind(), ColumnKind::Numeric);
        let ages = age.as_numeric().unwrap();
        assert_eq!(&ages[..2], &[31.0, 45.0]);
        assert!(ages[2].is_nan());

        assert_eq!(dataset.column("city").unwrap().kind(), ColumnKind::Text);
        // Thousands separators are not parsed at load time.
        assert_eq!(dataset.column("price").unwrap().kind(), ColumnKind::Text);
    }

    #[test]
    fn all_empty_column_is_text() {
        let csv = "a,b\n1,\n2,\n";
        let dataset = CsvLoader::new().load_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(dataset.column("b").unwrap().kind(), ColumnKind::Text);
    }

    #[test]
    fn rejects_ragged_rows() {
        let csv = "a,b\n1,2\n3\n";
        let err = CsvLoader::new().load_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AcError::Data(DataError::ParseError { .. })));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn rejects_duplicate_headers() {
        let csv = "a,a\n1,2\n";
        let err = CsvLoader::new().load_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, AcError::Data(DataError::DuplicateColumn { .. })));
    }

    #[test]
    fn loads_from_file_with_custom_delimiter() -> AcResult<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "x;label")?;
        writeln!(file, "1.5;yes")?;
        writeln!(file, "2.5;no")?;
        file.flush()?;

        let dataset = CsvLoader::with_delimiter(b';').load_csv_file(file.path())?;
        assert_eq!(dataset.len(), 2);
        assert_eq!(
            dataset.column("x").unwrap().as_numeric(),
            Some(&[1.5, 2.5][..])
        );
        Ok(())
    }

    #[test]
    fn missing_file_is_loading_error() {
        let err = CsvLoader::new()
            .load_csv_file("/definitely/not/here.csv")
            .unwrap_err();
        assert!(matches!(err, AcError::Data(DataError::LoadingFailed { .. })));
    }
}
