use dataio_core::{
    DataError, DataReader, DataResult, DataWriter, Entity, SheetCodec, SheetConfig, SheetReader,
    SheetRow, SheetWriter, SourceKind,
};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
struct Employee {
    row: u32,
    name: String,
    team: String,
    enabled: bool,
}

impl Entity for Employee {
    type Id = u32;

    fn id(&self) -> &u32 {
        &self.row
    }

    fn set_id(&mut self, id: u32) {
        self.row = id;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Columns: name, team, active flag.
struct EmployeeCodec;

impl SheetCodec<Employee> for EmployeeCodec {
    fn decode(&self, row: &SheetRow) -> DataResult<Employee> {
        Ok(Employee {
            row: row.row_index(),
            name: row.cell(1)?.to_string(),
            team: row.cell(2)?.to_string(),
            enabled: row.cell(3)? == "yes",
        })
    }

    fn encode(&self, entity: &Employee) -> DataResult<SheetRow> {
        let active = if entity.enabled { "yes" } else { "no" };
        Ok(SheetRow::with_values(
            entity.row,
            1,
            [entity.name.as_str(), entity.team.as_str(), active],
        ))
    }
}

fn employee(row: u32, name: &str, team: &str) -> Employee {
    Employee {
        row,
        name: name.to_string(),
        team: team.to_string(),
        enabled: true,
    }
}

/// Writes `rows` (one slice of cells per worksheet row, starting at row 1)
/// into a fresh workbook with `Staff` and `Archive` worksheets.
fn build_workbook(dir: &Path, rows: &[&[&str]]) -> PathBuf {
    let path = dir.join("staff.xlsx");
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    book.new_sheet("Staff").unwrap();
    book.new_sheet("Archive").unwrap();

    let sheet = book.get_sheet_by_name_mut("Staff").unwrap();
    for (row_index, cells) in (1_u32..).zip(rows) {
        for (column, value) in (1_u32..).zip(cells.iter()) {
            sheet.get_cell_mut((column, row_index)).set_value(*value);
        }
    }
    umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();
    path
}

fn config(path: &Path) -> SheetConfig {
    SheetConfig::new(path, "Staff").with_columns(1, 3)
}

#[test]
fn scan_stops_after_more_blank_rows_than_the_threshold() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_workbook(
        dir.path(),
        &[
            &["Ada", "core", "yes"],
            &["Lin", "ops", "no"],
            &[],
            &[],
            &[],
            &[],
            &["Kay", "core", "yes"],
        ],
    );

    let reader = SheetReader::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    let staff: Vec<Employee> = reader.read_data().unwrap();

    assert_eq!(staff.len(), 2);
    assert_eq!(staff[1].name, "Lin");
    assert!(!staff[1].is_enabled());
}

#[test]
fn blank_run_at_the_threshold_keeps_scanning() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_workbook(
        dir.path(),
        &[&["Ada", "core", "yes"], &[], &[], &[], &["Kay", "core", "yes"]],
    );

    let reader = SheetReader::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    let rows = reader.read_rows().unwrap();

    let indexes: Vec<u32> = rows.iter().map(SheetRow::row_index).collect();
    assert_eq!(indexes, vec![1, 5]);

    let strict = SheetReader::<Employee, _>::try_new(config(&path), EmployeeCodec)
        .unwrap()
        .with_empty_run_limit(2)
        .unwrap();
    assert_eq!(strict.read_rows().unwrap().len(), 1);
}

#[test]
fn zero_empty_run_limit_is_rejected() {
    let err = SheetReader::<Employee, _>::try_new(config(Path::new("x.xlsx")), EmployeeCodec)
        .unwrap()
        .with_empty_run_limit(0)
        .err()
        .unwrap();
    assert!(matches!(err, DataError::InvalidConfig(_)));
}

#[test]
fn joined_rows_use_configured_separators() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_workbook(dir.path(), &[&["Ada", "core", "yes"], &["Lin", "", "no"]]);

    let reader = SheetReader::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    assert_eq!(
        reader.read_joined().unwrap(),
        vec!["Ada;core;yes".to_string(), "Lin;;no".to_string()]
    );

    let reader = reader.with_separators(",", " | ");
    assert_eq!(reader.read_text().unwrap(), "Ada,core,yes | Lin,,no");
}

#[test]
fn writing_an_existing_row_updates_it_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_workbook(
        dir.path(),
        &[
            &["Ada", "core", "yes", "note-1"],
            &["Lin", "ops", "yes", "note-2"],
            &["Kay", "core", "yes", "note-3"],
        ],
    );

    let writer = SheetWriter::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    let mut moved = employee(2, "Lin", "infra");
    moved.disable();
    assert!(writer.write_data(moved).unwrap());

    let reader = SheetReader::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    let staff: Vec<Employee> = reader.read_data().unwrap();
    assert_eq!(staff.len(), 3);
    assert_eq!(staff[0], employee(1, "Ada", "core"));
    assert_eq!(staff[1].team, "infra");
    assert!(!staff[1].is_enabled());
    assert_eq!(staff[2], employee(3, "Kay", "core"));

    let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    let sheet = book.get_sheet_by_name("Staff").unwrap();
    assert_eq!(sheet.get_value((4, 2)), "note-2");
}

#[test]
fn missing_worksheet_lists_available_names() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_workbook(dir.path(), &[&["Ada", "core", "yes"]]);

    let reader =
        SheetReader::<Employee, _>::try_new(SheetConfig::new(&path, "Payroll"), EmployeeCodec)
            .unwrap();
    match reader.read_data().unwrap_err() {
        DataError::NotFound {
            kind,
            location,
            available,
        } => {
            assert_eq!(kind, SourceKind::Worksheet);
            assert_eq!(location, "Payroll");
            assert_eq!(available, vec!["Staff".to_string(), "Archive".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }

    let writer =
        SheetWriter::<Employee, _>::try_new(SheetConfig::new(&path, "Payroll"), EmployeeCodec)
            .unwrap();
    assert!(writer.write_data(employee(1, "Ada", "core")).is_err());
}

#[test]
fn missing_workbook_is_not_found_unless_creation_is_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reports/new.xlsx");

    let err = SheetReader::<Employee, _>::try_new(config(&path), EmployeeCodec)
        .unwrap()
        .read_rows()
        .unwrap_err();
    assert!(matches!(
        err,
        DataError::NotFound {
            kind: SourceKind::File,
            ..
        }
    ));

    let writer = SheetWriter::<Employee, _>::try_new(
        config(&path).with_create_missing(true),
        EmployeeCodec,
    )
    .unwrap();
    assert!(writer
        .write_batch(vec![employee(1, "Ada", "core"), employee(2, "Lin", "ops")])
        .unwrap());

    let reader = SheetReader::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    let staff: Vec<Employee> = reader.read_data().unwrap();
    assert_eq!(staff, vec![employee(1, "Ada", "core"), employee(2, "Lin", "ops")]);
}

#[test]
fn row_index_zero_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_workbook(dir.path(), &[&["Ada", "core", "yes"]]);

    let writer = SheetWriter::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    let err = writer
        .write_rows(vec![SheetRow::with_values(0, 1, ["x"])])
        .unwrap_err();
    assert!(matches!(err, DataError::InvalidData(_)));
}

#[test]
fn rows_outside_the_configured_columns_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_workbook(dir.path(), &[&["Ada", "core", "yes", "note-1"]]);

    let writer = SheetWriter::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    let too_wide = SheetRow::with_values(1, 1, ["Ada", "core", "yes", "overwritten"]);
    let err = writer.write_rows(vec![too_wide]).unwrap_err();
    assert!(matches!(err, DataError::InvalidData(_)));

    let shifted = SheetRow::with_values(1, 2, ["core", "yes"]);
    let err = writer.write_rows(vec![shifted]).unwrap_err();
    assert!(matches!(err, DataError::InvalidData(_)));

    let book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    let sheet = book.get_sheet_by_name("Staff").unwrap();
    assert_eq!(sheet.get_value((1, 1)), "Ada");
    assert_eq!(sheet.get_value((4, 1)), "note-1");
}

#[test]
fn numeric_cells_read_with_their_display_format() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_workbook(dir.path(), &[&["Ada", "core", "yes"]]);

    let mut book = umya_spreadsheet::reader::xlsx::read(&path).unwrap();
    let sheet = book.get_sheet_by_name_mut("Staff").unwrap();
    sheet.get_cell_mut((2, 1)).set_value_number(3);
    sheet
        .get_style_mut((2, 1))
        .get_number_format_mut()
        .set_format_code(umya_spreadsheet::NumberingFormat::FORMAT_NUMBER_00);
    umya_spreadsheet::writer::xlsx::write(&book, &path).unwrap();

    let reader = SheetReader::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    let rows = reader.read_rows().unwrap();
    assert_eq!(rows[0].cell(2).unwrap(), "3.00");
}

#[tokio::test]
async fn async_paths_run_off_the_runtime_and_cancel_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = build_workbook(dir.path(), &[&["Ada", "core", "yes"]]);
    let token = CancellationToken::new();

    let writer = SheetWriter::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    assert!(writer
        .write_data_async(employee(2, "Lin", "ops"), Some(&token))
        .await
        .unwrap());

    let reader = SheetReader::<Employee, _>::try_new(config(&path), EmployeeCodec).unwrap();
    let staff: Vec<Employee> = reader.read_data_async(Some(&token)).await.unwrap();
    assert_eq!(staff.len(), 2);
    assert!(!token.is_cancelled());

    let missing = SheetReader::<Employee, _>::try_new(
        config(&dir.path().join("absent.xlsx")),
        EmployeeCodec,
    )
    .unwrap();
    assert!(missing.read_data_async(Some(&token)).await.is_err());
    assert!(token.is_cancelled());
}
