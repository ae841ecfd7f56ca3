//! URL lists from CSV files

use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::youtube::normalize_input;

/// Read video URLs from the first column of a CSV document.
///
/// The first row is a header. Cells that are neither YouTube links nor bare video ids are skipped.
pub fn read_url_list<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut urls = Vec::new();
    for (row, record) in csv_reader.records().enumerate() {
        let record = record?;
        let Some(cell) = record.get(0) else {
            continue;
        };
        match normalize_input(cell) {
            Some(url) => urls.push(url),
            None if !cell.trim().is_empty() => debug!("Skipping row {}: {:?}", row + 2, cell),
            None => {}
        }
    }
    Ok(urls)
}

/// Read video URLs from a CSV file on disk
pub fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path)?;
    let urls = read_url_list(file)?;
    info!("📄 Read {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_skipped_and_ids_expanded() {
        let csv = "url,note\nhttps://www.youtube.com/watch?v=dQw4w9WgXcQ,first\ndQw4w9WgXcQ\n\n  https://youtu.be/H5TAW-0X7eQ  ,x\nnot a link at all\n";
        let urls = read_url_list(csv.as_bytes()).unwrap();

        assert_eq!(
            urls,
            vec![
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
                "https://youtu.be/H5TAW-0X7eQ",
            ]
        );
    }

    #[test]
    fn test_header_only() {
        assert!(read_url_list("url\n".as_bytes()).unwrap().is_empty());
        assert!(read_url_list("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");
        std::fs::write(&path, "url\nH5TAW-0X7eQ\n").unwrap();

        let urls = read_url_file(&path).unwrap();
        assert_eq!(urls, vec!["https://www.youtube.com/watch?v=H5TAW-0X7eQ"]);
    }
}
