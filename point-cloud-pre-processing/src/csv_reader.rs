/// Tabular point cloud input
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

use crate::error::{PreprocessError, Result};
use crate::point_cloud::PointCloud;

/// Read a CSV file with a header row naming `x`, `y`, `z` and any number of
/// further numeric columns.
pub fn read_csv(path: &Path) -> Result<PointCloud> {
    let file = File::open(path).map_err(|e| PreprocessError::io(path, e))?;
    let cloud = read_csv_from(BufReader::new(file))?;
    info!(
        path = %path.display(),
        points = cloud.len(),
        variables = cloud.variable_names().len(),
        "CSV loaded"
    );
    Ok(cloud)
}

/// Parse CSV text. Empty cells become NaN; any other non-numeric cell is
/// rejected with its data row and column.
pub fn read_csv_from<R: Read>(reader: R) -> Result<PointCloud> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); headers.len()];

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        for (column, (field, values)) in record.iter().zip(columns.iter_mut()).enumerate() {
            let value = if field.is_empty() {
                f64::NAN
            } else {
                field.parse::<f64>().map_err(|_| PreprocessError::InvalidNumber {
                    row,
                    column: headers[column].clone(),
                    value: field.to_string(),
                })?
            };
            values.push(value);
        }
    }

    PointCloud::from_columns(headers.into_iter().zip(columns).collect())
}
