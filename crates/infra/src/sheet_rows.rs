//! Spreadsheet row schema.
//!
//! The only place that knows about header spellings and cell formats. Tables arrive
//! as the Sheets values API returns them: a header row followed by data rows, each a
//! list of JSON cells (strings for formatted values, sometimes numbers or booleans).

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;

use toolcrib_core::{AliasKey, DomainError};
use toolcrib_inventory::InventoryRecord;

use crate::ports::StoreError;

/// Header columns written to an empty tab (`A` through `G`).
pub const COLUMNS: [&str; 7] = [
    "Name",
    "SKU",
    "Aliases",
    "Quantity",
    "Min Quantity",
    "Location",
    "Last Detected At",
];

const ALIAS_SEPARATOR: char = '|';

const NAME: &[&str] = &["Name", "Item", "Product"];
const SKU: &[&str] = &["SKU", "Sku"];
const ALIASES: &[&str] = &["Aliases"];
const QUANTITY: &[&str] = &["Quantity"];
const MIN_QUANTITY: &[&str] = &["Min Quantity", "MinQuantity"];
const LOCATION: &[&str] = &["Location"];
const LAST_DETECTED_AT: &[&str] = &["Last Detected At", "LastDetectedAt"];

/// Column positions resolved from a header row.
///
/// Reads and writes both go through the layout, so a tab with extra, missing or
/// reordered columns keeps its shape when records are written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetLayout {
    name: Option<usize>,
    sku: Option<usize>,
    aliases: Option<usize>,
    quantity: Option<usize>,
    min_quantity: Option<usize>,
    location: Option<usize>,
    last_detected_at: Option<usize>,
    width: usize,
}

impl SheetLayout {
    pub fn from_header(header: &[Value]) -> Self {
        let labels: Vec<String> = header.iter().map(|c| cell_text(Some(c)).trim().to_string()).collect();
        let find = |synonyms: &[&str]| labels.iter().position(|l| synonyms.contains(&l.as_str()));
        Self {
            name: find(NAME),
            sku: find(SKU),
            aliases: find(ALIASES),
            quantity: find(QUANTITY),
            min_quantity: find(MIN_QUANTITY),
            location: find(LOCATION),
            last_detected_at: find(LAST_DETECTED_AT),
            width: labels.len(),
        }
    }

    /// Layout of the header written to an empty tab.
    pub fn canonical() -> Self {
        Self::from_header(&header_row())
    }

    /// Rows cannot be matched or written without a name column.
    pub fn require_name(&self) -> Result<(), StoreError> {
        match self.name {
            Some(_) => Ok(()),
            None => Err(StoreError::Malformed {
                row: 1,
                source: DomainError::malformed(NAME[0], "header has no name column"),
            }),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Cells for `record` laid out under this header.
    ///
    /// Starts from `current` (the row being replaced, empty for appends), so cells
    /// under unknown headers survive. Fields without a column are not written.
    pub fn write_row(&self, record: &InventoryRecord, current: &[Value]) -> Vec<Value> {
        let mut cells = current.to_vec();
        if cells.len() < self.width {
            cells.resize(self.width, Value::from(""));
        }

        let fields = [
            (self.name, Value::from(record.name())),
            (self.sku, Value::from(record.sku().unwrap_or_default())),
            (self.aliases, Value::from(record.aliases().join(&ALIAS_SEPARATOR.to_string()))),
            (self.quantity, Value::from(record.quantity())),
            (self.min_quantity, Value::from(record.min_quantity())),
            (self.location, Value::from(record.location().unwrap_or_default())),
            (
                self.last_detected_at,
                Value::from(record.last_detected_at().map(|at| at.to_rfc3339()).unwrap_or_default()),
            ),
        ];
        for (idx, value) in fields {
            if let Some(idx) = idx {
                if idx >= cells.len() {
                    cells.resize(idx + 1, Value::from(""));
                }
                cells[idx] = value;
            }
        }
        cells
    }
}

/// A1 column letters for a zero-based index (`0` is `A`, `26` is `AA`).
pub fn column_letters(idx: usize) -> String {
    let mut n = idx + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.iter().rev().map(|&b| b as char).collect()
}

fn cell_text(cell: Option<&Value>) -> String {
    match cell {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn cell(row: &[Value], idx: Option<usize>) -> String {
    cell_text(idx.and_then(|i| row.get(i)))
}

fn is_blank_row(row: &[Value]) -> bool {
    row.iter().all(|c| cell_text(Some(c)).trim().is_empty())
}

fn parse_count(field: &str, raw: &str) -> Result<u32, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<u32>()
        .map_err(|_| DomainError::malformed(field, format!("expected a non-negative integer, got `{raw}`")))
}

/// RFC 3339, or a zone-less ISO-8601 timestamp taken as UTC.
fn parse_timestamp(raw: &str) -> Result<Option<DateTime<Utc>>, DomainError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| DomainError::malformed(LAST_DETECTED_AT[0], format!("expected an ISO-8601 timestamp, got `{raw}`")))
}

fn parse_row(row: &[Value], layout: &SheetLayout) -> Result<InventoryRecord, DomainError> {
    let name = cell(row, layout.name);
    if name.trim().is_empty() {
        return Err(DomainError::malformed(NAME[0], "row has values but no name"));
    }

    let aliases: Vec<String> = cell(row, layout.aliases)
        .split(ALIAS_SEPARATOR)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();

    let mut record = InventoryRecord::new(name.trim())?
        .with_sku(cell(row, layout.sku).trim())
        .with_aliases(aliases)
        .with_quantity(parse_count(QUANTITY[0], &cell(row, layout.quantity))?)
        .with_min_quantity(parse_count(MIN_QUANTITY[0], &cell(row, layout.min_quantity))?)
        .with_location(cell(row, layout.location).trim());

    if let Some(at) = parse_timestamp(&cell(row, layout.last_detected_at))? {
        record = record.with_last_detected_at(at);
    }

    Ok(record)
}

/// Parse a whole tab. Fully blank rows are skipped; any other unparseable row fails
/// the table, reporting its 1-based sheet row number.
pub fn parse_table(values: &[Vec<Value>]) -> Result<Vec<InventoryRecord>, StoreError> {
    let Some((header, rows)) = values.split_first() else {
        return Ok(Vec::new());
    };
    let layout = SheetLayout::from_header(header);

    rows.iter()
        .enumerate()
        .filter(|(_, row)| !is_blank_row(row))
        .map(|(idx, row)| {
            parse_row(row, &layout).map_err(|source| StoreError::Malformed { row: idx + 2, source })
        })
        .collect()
}

/// Sheet row number (1-based, header is row 1) of each named data row.
///
/// Only the name column is read, so a tab with malformed quantities can still be
/// written to. The first row carrying a name wins.
pub fn row_numbers_by_name(values: &[Vec<Value>]) -> Vec<(AliasKey, usize)> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };
    let layout = SheetLayout::from_header(header);

    let mut out: Vec<(AliasKey, usize)> = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(key) = AliasKey::normalize(&cell(row, layout.name)) else {
            continue;
        };
        if !out.iter().any(|(k, _)| *k == key) {
            out.push((key, idx + 2));
        }
    }
    out
}

/// Header row for an empty tab.
pub fn header_row() -> Vec<Value> {
    COLUMNS.iter().map(|c| Value::from(*c)).collect()
}
