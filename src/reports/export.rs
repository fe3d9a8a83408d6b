use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};
use rust_xlsxwriter::{Format, Workbook};
use std::{
    fmt,
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::info;
use unicode_width::UnicodeWidthStr;

use crate::{
    error::{BursaryError, Result},
    reports::ReportTable,
    utils::{format_timestamp, truncate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = BursaryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(BursaryError::InvalidInput(format!(
                "unknown export format '{}' (expected xlsx, csv or pdf)",
                other
            ))),
        }
    }
}

/// Write `table` into `dir` as `<report name>.<ext>`. Returns `None` without
/// touching the filesystem when the table has no rows.
pub fn export(
    table: &ReportTable,
    format: ExportFormat,
    dir: &Path,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    if !table.can_export() {
        info!("{} has no rows; nothing exported", table.title());
        return Ok(None);
    }

    let path = dir.join(format!("{}.{}", table.kind.title(), format.extension()));
    match format {
        ExportFormat::Xlsx => write_xlsx(table, &path)?,
        ExportFormat::Csv => write_csv(table, &path)?,
        ExportFormat::Pdf => write_pdf(table, &path, now)?,
    }

    info!("Exported {} row(s) to {}", table.len(), path.display());
    Ok(Some(path))
}

fn write_csv(table: &ReportTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn write_xlsx(table: &ReportTable, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(table.kind.title())?;

    for (col, name) in table.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            sheet.write_string(r as u32 + 1, col as u16, value)?;
        }
    }

    for (col, width) in column_widths(table).into_iter().enumerate() {
        sheet.set_column_width(col as u16, width as f64 + 2.0)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn column_widths(table: &ReportTable) -> Vec<usize> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(col, name)| {
            table
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .map(|v| v.width())
                .chain(std::iter::once(name.width()))
                .max()
                .unwrap_or(0)
        })
        .collect()
}

// Landscape A4, in millimetres
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 14.0;
const TITLE_Y: f32 = PAGE_HEIGHT - 15.0;
const TABLE_TOP: f32 = PAGE_HEIGHT - 28.0;
const FOOTER_Y: f32 = 10.0;
const ROW_HEIGHT: f32 = 7.0;

fn write_pdf(table: &ReportTable, path: &Path, now: DateTime<Utc>) -> Result<()> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(table.title(), Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_error)?;

    let font_size = if table.columns.len() > 6 { 8.0 } else { 10.0 };
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    let col_width = usable / table.columns.len().max(1) as f32;
    // Helvetica averages roughly half an em per glyph
    let max_chars = ((col_width - 2.0) / (font_size * 0.3528 * 0.5)).max(3.0) as usize;
    let rows_per_page = ((TABLE_TOP - FOOTER_Y - 2.0 * ROW_HEIGHT) / ROW_HEIGHT).max(1.0) as usize;

    let footer = format!("Generated on: {}", format_timestamp(&now));

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    for (page_index, chunk) in table.rows.chunks(rows_per_page).enumerate() {
        if page_index > 0 {
            let (page, page_layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Table");
            layer = doc.get_page(page).get_layer(page_layer);
        }

        layer.use_text(table.title(), 18.0, Mm(MARGIN), Mm(TITLE_Y), &bold);
        draw_row(&layer, &bold, table.columns.as_slice(), TABLE_TOP, col_width, max_chars, font_size);
        rule(&layer, TABLE_TOP - 2.0);

        let mut y = TABLE_TOP - ROW_HEIGHT;
        for row in chunk {
            draw_row(&layer, &regular, row.as_slice(), y, col_width, max_chars, font_size);
            y -= ROW_HEIGHT;
        }

        layer.use_text(footer.clone(), 10.0, Mm(MARGIN), Mm(FOOTER_Y), &regular);
    }

    let mut writer = BufWriter::new(File::create(path)?);
    doc.save(&mut writer).map_err(pdf_error)?;
    Ok(())
}

fn draw_row<S: AsRef<str>>(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    cells: &[S],
    y: f32,
    col_width: f32,
    max_chars: usize,
    font_size: f32,
) {
    for (col, cell) in cells.iter().enumerate() {
        let x = MARGIN + col as f32 * col_width;
        layer.use_text(truncate(cell.as_ref(), max_chars), font_size, Mm(x), Mm(y), font);
    }
}

fn rule(layer: &PdfLayerReference, y: f32) {
    layer.set_outline_thickness(0.5);
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(MARGIN), Mm(y)), false),
            (Point::new(Mm(PAGE_WIDTH - MARGIN), Mm(y)), false),
        ],
        is_closed: false,
    });
}

fn pdf_error(e: impl fmt::Display) -> BursaryError {
    BursaryError::Export(format!("PDF: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fixtures::application;
    use crate::models::ApplicationStatus;
    use crate::reports::ReportKind;

    fn table(rows: usize) -> ReportTable {
        let apps: Vec<_> = (0..rows)
            .map(|i| application(&format!("A{}", i), ApplicationStatus::Approved))
            .collect();
        ReportTable::applications(&apps)
    }

    #[test]
    fn test_empty_dataset_exports_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let empty = table(0);

        for format in [ExportFormat::Xlsx, ExportFormat::Csv, ExportFormat::Pdf] {
            assert_eq!(export(&empty, format, dir.path(), Utc::now()).unwrap(), None);
        }
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_csv_export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = export(&table(2), ExportFormat::Csv, dir.path(), Utc::now())
            .unwrap()
            .unwrap();

        assert!(path.ends_with("Bursary Applications.csv"));
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Full Name,Admission No"));
        // amount contains a comma, so it is quoted
        assert!(lines[1].ends_with("\"KES 10,000\""));
    }

    #[test]
    fn test_xlsx_export_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export(&table(3), ExportFormat::Xlsx, dir.path(), Utc::now())
            .unwrap()
            .unwrap();

        assert_eq!(path.extension().unwrap(), "xlsx");
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_pdf_export_paginates() {
        let dir = tempfile::tempdir().unwrap();
        let path = export(&table(60), ExportFormat::Pdf, dir.path(), Utc::now())
            .unwrap()
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_disbursement_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![crate::models::DisbursementRecord {
            id: "7".to_string(),
            student: "Amina".to_string(),
            status: "Disbursed".to_string(),
            amount: 300.0,
        }];
        let table = ReportTable::disbursements(&records, None);
        assert_eq!(table.kind, ReportKind::Disbursements);

        let path = export(&table, ExportFormat::Csv, dir.path(), Utc::now())
            .unwrap()
            .unwrap();
        assert!(path.ends_with("Disbursement.csv"));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("Excel".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert!("docx".parse::<ExportFormat>().is_err());
    }
}
