//! CSV and YAML work queues.
//!
//! A queue is a flat file where each entry carries a `status` flag. A job
//! picks the first `pending` entry, processes it, flips the flag and
//! rewrites the whole file. Columns and keys the job does not know about
//! are carried through unchanged.

use crate::models::{PdfJob, Status};
use serde_yaml::Value;
use std::error::Error;
use std::io;
use std::path::Path;
use tracing::{debug, info, instrument};

const STATUS_COLUMN: &str = "status";

/// An in-memory CSV queue with its header row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvQueue {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvQueue {
    /// Read a queue file. Short rows are padded with empty cells; cells past
    /// the header are kept and written back unchanged.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let file = std::fs::File::open(path)?;
        let queue = Self::from_reader(file)?;
        info!(rows = queue.len(), "Loaded CSV queue");
        Ok(queue)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, Box<dyn Error>> {
        let mut rdr = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(str::to_string).collect();
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            rows.push(row);
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column(&self, field: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == field)
    }

    /// Index of the first pending row. Without a `status` column every row
    /// counts as pending.
    pub fn next_pending(&self) -> Option<usize> {
        match self.column(STATUS_COLUMN) {
            Some(col) => self.rows.iter().position(|row| Status::is_pending(&row[col])),
            None if !self.rows.is_empty() => Some(0),
            None => None,
        }
    }

    /// Trimmed value of `field` in `row`, or an empty string.
    pub fn get(&self, row: usize, field: &str) -> &str {
        self.column(field)
            .and_then(|col| self.rows.get(row).map(|r| r[col].trim()))
            .unwrap_or("")
    }

    /// Write `status` into `row`, adding the `status` column if the file has none.
    pub fn set_status(&mut self, row: usize, status: Status) {
        let col = match self.column(STATUS_COLUMN) {
            Some(col) => col,
            None => {
                let col = self.headers.len();
                self.headers.push(STATUS_COLUMN.to_string());
                // Rows longer than the header keep their extra cells after the new column.
                for r in &mut self.rows {
                    r.insert(col, Status::Pending.as_str().to_string());
                }
                col
            }
        };
        if let Some(r) = self.rows.get_mut(row) {
            debug!(row, %status, "Setting row status");
            r[col] = status.as_str().to_string();
        }
    }

    pub fn to_writer<W: io::Write>(&self, writer: W) -> Result<(), Box<dyn Error>> {
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Rewrite the queue file with the original header order.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        let mut buf = Vec::new();
        self.to_writer(&mut buf)?;
        std::fs::write(path, buf)?;
        info!(rows = self.rows.len(), "Saved CSV queue");
        Ok(())
    }
}

/// The YAML list of PDF jobs. Jobs are kept as raw YAML so unknown keys
/// survive a rewrite; only the selected job is parsed into a [`PdfJob`].
#[derive(Debug, Clone, Default)]
pub struct PdfQueue {
    jobs: Vec<Value>,
}

impl PdfQueue {
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self, Box<dyn Error>> {
        let raw = std::fs::read_to_string(path)?;
        let queue = Self::parse(&raw)?;
        info!(jobs = queue.len(), "Loaded PDF queue");
        Ok(queue)
    }

    pub fn parse(raw: &str) -> Result<Self, Box<dyn Error>> {
        match serde_yaml::from_str::<Value>(raw)? {
            Value::Sequence(jobs) => Ok(Self { jobs }),
            Value::Null => Ok(Self::default()),
            _ => Err("PDF queue must be a YAML list of jobs".into()),
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Index of the first job whose status is pending (a missing status counts).
    pub fn next_pending(&self) -> Option<usize> {
        self.jobs.iter().position(|job| {
            job.get(STATUS_COLUMN)
                .and_then(Value::as_str)
                .is_none_or(Status::is_pending)
        })
    }

    pub fn job(&self, index: usize) -> Result<PdfJob, Box<dyn Error>> {
        let raw = self
            .jobs
            .get(index)
            .ok_or_else(|| format!("no PDF job at index {index}"))?;
        Ok(serde_yaml::from_value(raw.clone())?)
    }

    pub fn set_status(&mut self, index: usize, status: Status) {
        if let Some(Value::Mapping(map)) = self.jobs.get_mut(index) {
            map.insert(
                Value::String(STATUS_COLUMN.to_string()),
                Value::String(status.as_str().to_string()),
            );
        }
    }

    pub fn to_yaml(&self) -> Result<String, Box<dyn Error>> {
        Ok(serde_yaml::to_string(&self.jobs)?)
    }

    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn Error>> {
        std::fs::write(path, self.to_yaml()?)?;
        info!(jobs = self.jobs.len(), "Saved PDF queue");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUEUE: &str = "title,url,tags,body,status\n\
        Ahorro diario,,finanzas,Resumen uno,done\n\
        Regla 1-1-1,https://example.com,productividad,Resumen dos,Pending\n\
        Tercera,,,,pending\n";

    #[test]
    fn test_next_pending_is_case_insensitive() {
        let queue = CsvQueue::from_reader(QUEUE.as_bytes()).unwrap();
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.next_pending(), Some(1));
        assert_eq!(queue.get(1, "title"), "Regla 1-1-1");
        assert_eq!(queue.get(1, "missing"), "");
    }

    #[test]
    fn test_no_pending_rows() {
        let queue = CsvQueue::from_reader("title,status\nUno,done\nDos,draft\n".as_bytes()).unwrap();
        assert_eq!(queue.next_pending(), None);
    }

    #[test]
    fn test_empty_status_cell_is_not_pending() {
        let queue = CsvQueue::from_reader("title,status\nUno,\nDos,pending\n".as_bytes()).unwrap();
        assert_eq!(queue.next_pending(), Some(1));
    }

    #[test]
    fn test_missing_status_column_treats_rows_as_pending() {
        let mut queue = CsvQueue::from_reader("title,body\nUno,a\nDos,b\n".as_bytes()).unwrap();
        assert_eq!(queue.next_pending(), Some(0));

        queue.set_status(0, Status::Done);
        assert_eq!(queue.headers(), ["title", "body", "status"]);
        assert_eq!(queue.get(0, "status"), "done");
        assert_eq!(queue.next_pending(), Some(1));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let queue = CsvQueue::from_reader("title,url,status\nUno\n".as_bytes()).unwrap();
        assert_eq!(queue.get(0, "url"), "");
        assert_eq!(queue.get(0, "status"), "");
    }

    #[test]
    fn test_long_rows_keep_extra_cells() {
        let mut queue =
            CsvQueue::from_reader("title,status\nUno,done,extra-cell\nDos,pending\n".as_bytes()).unwrap();
        assert_eq!(queue.next_pending(), Some(1));
        queue.set_status(1, Status::Done);

        let mut out = Vec::new();
        queue.to_writer(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "title,status\nUno,done,extra-cell\nDos,done\n"
        );
    }

    #[test]
    fn test_added_status_column_precedes_extra_cells() {
        let mut queue = CsvQueue::from_reader("title\nUno,nota\nDos\n".as_bytes()).unwrap();
        queue.set_status(0, Status::Done);
        assert_eq!(queue.get(0, "status"), "done");
        assert_eq!(queue.get(1, "status"), "pending");

        let mut out = Vec::new();
        queue.to_writer(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "title,status\nUno,done,nota\nDos,pending\n");
    }

    #[test]
    fn test_headers_are_written_back_verbatim() {
        let mut queue =
            CsvQueue::from_reader(" title,Body ,status\nUno,a,pending\n".as_bytes()).unwrap();
        assert_eq!(queue.get(0, "title"), "Uno");
        queue.set_status(0, Status::Done);

        let mut out = Vec::new();
        queue.to_writer(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), " title,Body ,status\nUno,a,done\n");
    }

    #[test]
    fn test_set_status_only_touches_selected_row() {
        let mut queue = CsvQueue::from_reader(QUEUE.as_bytes()).unwrap();
        queue.set_status(1, Status::Done);

        let mut out = Vec::new();
        queue.to_writer(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "title,url,tags,body,status\n\
             Ahorro diario,,finanzas,Resumen uno,done\n\
             Regla 1-1-1,https://example.com,productividad,Resumen dos,done\n\
             Tercera,,,,pending\n"
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.csv");
        std::fs::write(&path, "title,body,status\n\"Hola, mundo\",\"línea 1\nlínea 2\",pending\n").unwrap();

        let mut queue = CsvQueue::load(&path).unwrap();
        queue.set_status(0, Status::Draft);
        queue.save(&path).unwrap();

        let reloaded = CsvQueue::load(&path).unwrap();
        assert_eq!(reloaded.get(0, "title"), "Hola, mundo");
        assert_eq!(reloaded.get(0, "body"), "línea 1\nlínea 2");
        assert_eq!(reloaded.get(0, "status"), "draft");
    }

    const PDF_QUEUE: &str = r#"
- status: done
  meta: {title: Viejo, slug: viejo}
  sections: []
- meta:
    title: Nuevo
    slug: nuevo
    owner: marketing
  sections:
    - title: Uno
      text: Hola
  priority: 3
"#;

    #[test]
    fn test_pdf_queue_missing_status_is_pending() {
        let queue = PdfQueue::parse(PDF_QUEUE).unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.next_pending(), Some(1));
        let job = queue.job(1).unwrap();
        assert_eq!(job.meta.slug, "nuevo");
        assert_eq!(job.sections[0].text.as_deref(), Some("Hola"));
    }

    #[test]
    fn test_pdf_queue_preserves_unknown_keys() {
        let mut queue = PdfQueue::parse(PDF_QUEUE).unwrap();
        queue.set_status(1, Status::Done);
        let yaml = queue.to_yaml().unwrap();

        let reparsed = PdfQueue::parse(&yaml).unwrap();
        assert_eq!(reparsed.next_pending(), None);
        assert!(yaml.contains("priority: 3"));
        assert!(yaml.contains("owner: marketing"));
    }

    #[test]
    fn test_pdf_queue_rejects_mapping() {
        assert!(PdfQueue::parse("systems: []").is_err());
        assert!(PdfQueue::parse("").unwrap().is_empty());
    }
}
