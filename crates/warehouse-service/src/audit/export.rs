//! CSV rendering of audit entries.

use std::io::Write;

use chrono::SecondsFormat;

use warehouse_core::{AppError, AppResult, ErrorKind};
use warehouse_entity::audit::AuditRecord;
use warehouse_entity::audit::diff::render_diff;

/// Column order of every audit export.
pub const AUDIT_CSV_HEADER: [&str; 7] = [
    "ID",
    "Item ID",
    "Action",
    "Changed By (ID)",
    "Changed By (Username)",
    "Changed At",
    "Changes",
];

/// Write `records` as CSV, header first. Returns the number of data rows.
pub fn write_audit_csv<W: Write>(sink: W, records: &[AuditRecord]) -> AppResult<usize> {
    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(AUDIT_CSV_HEADER).map_err(csv_error)?;

    for record in records {
        let entry = &record.entry;
        writer
            .write_record([
                entry.id.to_string(),
                entry.item_id.to_string(),
                entry.action.to_string(),
                entry.changed_by.to_string(),
                record.username.clone(),
                entry.changed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                render_diff(entry.diff.as_ref()),
            ])
            .map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(records.len())
}

fn csv_error(err: csv::Error) -> AppError {
    AppError::with_source(ErrorKind::Internal, format!("CSV write failed: {err}"), err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;
    use warehouse_entity::audit::{AuditAction, AuditEntry};

    fn record(diff: Option<serde_json::Value>) -> AuditRecord {
        AuditRecord {
            entry: AuditEntry {
                id: 7,
                item_id: Uuid::nil(),
                action: AuditAction::Update,
                changed_by: Uuid::nil(),
                old_data: None,
                new_data: None,
                diff,
                changed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
            },
            username: "alice".into(),
        }
    }

    #[test]
    fn test_empty_export_is_header_only() {
        let mut out = Vec::new();
        assert_eq!(write_audit_csv(&mut out, &[]).unwrap(), 0);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ID,Item ID,Action,Changed By (ID),Changed By (Username),Changed At,Changes\n"
        );
    }

    #[test]
    fn test_row_layout() {
        let diff = json!({"quantity": {"old": 5, "new": 3}, "name": {"old": "A", "new": "B"}});
        let mut out = Vec::new();
        write_audit_csv(&mut out, &[record(Some(diff)), record(None)]).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let nil = Uuid::nil();
        assert_eq!(
            lines[1],
            format!("7,{nil},UPDATE,{nil},alice,2024-03-01T12:30:00Z,name: A -> B; quantity: 5 -> 3")
        );
        assert!(lines[2].ends_with("2024-03-01T12:30:00Z,"));
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let diff = json!({"location": {"old": "A, shelf 1", "new": "B"}});
        let mut out = Vec::new();
        write_audit_csv(&mut out, &[record(Some(diff))]).unwrap();

        let mut reader = csv::Reader::from_reader(out.as_slice());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[6], "location: A, shelf 1 -> B");
    }
}
