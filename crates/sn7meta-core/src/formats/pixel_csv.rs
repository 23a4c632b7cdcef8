//! Pixel ground-truth CSV reader
//!
//! The SpaceNet7 table (`sn7_train_ground_truth_pix.csv`) has one row per
//! building observation: `filename`, building `id` and a pixel-space
//! `geometry`. Only `filename` and the id column are required.

use std::io::Read;
use std::path::Path;

use crate::error::{Result, Sn7Error};
use crate::models::PixelRecord;

const FORMAT: &str = "CSV";

/// Reader for the pixel ground-truth table
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelCsvReader;

impl PixelCsvReader {
    /// Read every row of the CSV at `path`
    pub fn read_path(&self, path: &Path) -> Result<Vec<PixelRecord>> {
        let file = std::fs::File::open(path)?;
        let records = self.read_from(file, path)?;
        tracing::info!(path = %path.display(), rows = records.len(), "Read pixel table");
        Ok(records)
    }

    /// Read rows from any reader; `path` is only used in error messages
    pub fn read_from<R: Read>(&self, source: R, path: &Path) -> Result<Vec<PixelRecord>> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(source);

        let headers = reader.headers().map_err(|e| csv_error(path, e))?.clone();
        check_headers(&headers, path)?;

        reader
            .deserialize::<PixelRecord>()
            .enumerate()
            .map(|(idx, row)| {
                row.map_err(|e| Sn7Error::Format {
                    format: FORMAT.to_string(),
                    path: path.to_path_buf(),
                    reason: format!("row {}: {}", idx + 1, e),
                })
            })
            .collect()
    }
}

fn check_headers(headers: &csv::StringRecord, path: &Path) -> Result<()> {
    let has = |name: &str| headers.iter().any(|h| h == name);

    if !has("filename") {
        return Err(Sn7Error::Format {
            format: FORMAT.to_string(),
            path: path.to_path_buf(),
            reason: "missing required column 'filename'".to_string(),
        });
    }
    if !has("id") && !has("building_id") {
        return Err(Sn7Error::Format {
            format: FORMAT.to_string(),
            path: path.to_path_buf(),
            reason: "missing building id column ('id' or 'building_id')".to_string(),
        });
    }
    Ok(())
}

fn csv_error(path: &Path, err: csv::Error) -> Sn7Error {
    Sn7Error::Format { format: FORMAT.to_string(), path: path.to_path_buf(), reason: err.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_read_pixel_rows() {
        let data = "\
filename,id,geometry
global_monthly_2018_01_mosaic_L15-0331E-1257N_1327_3160_13,0,\"POLYGON ((0 0, 1 0, 1 1, 0 0))\"
global_monthly_2018_01_mosaic_L15-0331E-1257N_1327_3160_13,1,
";
        let rows = PixelCsvReader.read_from(data.as_bytes(), Path::new("pix.csv")).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].building_id, 0);
        assert_eq!(rows[0].geometry.as_deref(), Some("POLYGON ((0 0, 1 0, 1 1, 0 0))"));
        assert_eq!(rows[1].building_id, 1);
    }

    #[test]
    fn test_building_id_header_alias() {
        let data = "filename,building_id\nsome_mosaic_chip,42\n";
        let rows = PixelCsvReader.read_from(data.as_bytes(), Path::new("pix.csv")).unwrap();
        assert_eq!(rows[0].building_id, 42);
        assert!(rows[0].geometry.is_none());
    }

    #[test]
    fn test_missing_filename_column() {
        let data = "name,id\nx,1\n";
        let err = PixelCsvReader.read_from(data.as_bytes(), Path::new("pix.csv")).unwrap_err();
        assert!(err.to_string().contains("filename"));
    }

    #[test]
    fn test_bad_row_reports_line() {
        let data = "filename,id\na,1\nb,not-a-number\n";
        let err = PixelCsvReader.read_from(data.as_bytes(), Path::new("pix.csv")).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_read_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "filename,id").unwrap();
        writeln!(file, "global_monthly_2018_01_mosaic_L15-0331E-1257N_1327_3160_13,7").unwrap();

        let rows = PixelCsvReader.read_path(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].building_id, 7);
    }
}
