use std::{fs::OpenOptions, path::Path};

use serde::Serialize;

/// Append one record to the CSV file at `path`, creating it if absent.
///
/// The header row is written iff the file is empty at open time, so repeated
/// runs against the same path never duplicate it. The file is opened, written
/// and flushed within this call; nothing stays buffered across records.
pub fn append<R: Serialize>(path: &Path, header: &[&str], record: &R) -> csv::Result<()> {
    let file = OpenOptions::new().append(true).create(true).open(path)?;
    let fresh = file.metadata()?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    if fresh {
        writer.write_record(header)?;
    }
    writer.serialize(record)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use serde::Serialize;

    use super::append;

    const HEADER: [&str; 3] = ["Name", "Note", "Count"];

    #[derive(Serialize)]
    struct Row {
        name: &'static str,
        note: &'static str,
        count: &'static str,
    }

    fn temp_path(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("tscr-store-{name}-{}.csv", std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn fresh_file_gets_exactly_one_header() {
        let path = temp_path("fresh");
        let row = Row {
            name: "a",
            note: "b",
            count: "1",
        };

        append(&path, &HEADER, &row).unwrap();
        append(&path, &HEADER, &row).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, ["Name,Note,Count", "a,b,1", "a,b,1"]);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn existing_file_is_appended_without_a_second_header() {
        let path = temp_path("existing");
        fs::write(&path, "Name,Note,Count\nold,row,0\n").unwrap();

        append(
            &path,
            &HEADER,
            &Row {
                name: "new",
                note: "row",
                count: "9",
            },
        )
        .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("Name,Note,Count").count(), 1);
        assert!(content.ends_with("new,row,9\n"));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn fields_with_delimiters_round_trip() {
        let path = temp_path("quoting");
        let row = Row {
            name: "a, b",
            note: "line one\nline \"two\"",
            count: "1.2K",
        };

        append(&path, &HEADER, &row).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "a, b");
        assert_eq!(&record[1], "line one\nline \"two\"");
        assert_eq!(&record[2], "1.2K");

        let _ = fs::remove_file(&path);
    }
}
