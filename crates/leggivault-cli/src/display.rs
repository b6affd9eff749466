//! Text rendering for records, links and ingest reports.
//!
//! Records are rendered from their Arrow form (`vault::records_to_batch`):
//! a single row becomes a vertical card grouped by section, several rows
//! become a compact table.

use std::collections::BTreeMap;

use arrow::array::*;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use arrow::util::display::ArrayFormatter;
use arrow::util::pretty::pretty_format_batches;
use leggivault_core::vault;
use leggivault_ingest::IngestReport;
use leggivault_store::Resolution;

const MAX_LIST_ITEMS: usize = 10;

// ── Card section groupings ──

const IDENTITY: &[&str] = &[
    "codice_redazionale",
    "tipo",
    "numero_atto",
    "citation",
    "descrizione_atto",
    "titolo_alternativo",
];

const DATES: &[&str] = &["data_emanazione", "data_gu", "numero_gu", "data_vigenza"];

const IDENTIFIERS: &[&str] = &["normattiva_urn", "normattiva_link", "gu_link"];

const CAMERA: &[&str] = &[
    "camera_origine",
    "camera_numero",
    "camera_legislatura",
    "camera_firmatari",
    "camera_argomenti",
    "camera_documenti",
    "camera_votazione_finale",
];

const SENATO: &[&str] = &[
    "senato_origine",
    "senato_numero",
    "senato_legislatura",
    "senato_firmatari",
    "senato_argomenti",
    "senato_documenti",
    "senato_teseo",
];

const EXTRA: &[&str] = &["extra"];

const TABLE_COLUMNS: &[&str] = &["data_emanazione", "codice_redazionale", "citation", "titolo_atto"];

// ── Records ──

/// Print a single record as a vertical card grouped by section.
pub fn print_record_card(batch: &RecordBatch) -> anyhow::Result<()> {
    if batch.num_rows() == 0 {
        return Ok(());
    }
    let citation = get_utf8(batch, "citation").unwrap_or_default();
    let title = get_utf8(batch, "titolo_atto").unwrap_or_default();

    println!("=== {} ===", citation);
    if !title.is_empty() {
        println!("{}", title);
    }
    println!();

    print_section(batch, "Identity", IDENTITY);
    print_section(batch, "Dates", DATES);
    print_section(batch, "Identifiers", IDENTIFIERS);
    print_section(batch, "References", vault::REFERENCE_LISTS);
    print_section(batch, "Camera", CAMERA);
    print_section(batch, "Senato", SENATO);
    print_section(batch, "Other fields", EXTRA);

    Ok(())
}

/// Print several records as a table, one row each.
pub fn print_record_table(batch: &RecordBatch) -> anyhow::Result<()> {
    if batch.num_rows() == 0 {
        println!("No records.");
        return Ok(());
    }
    let schema = batch.schema();
    let indices = TABLE_COLUMNS
        .iter()
        .map(|name| schema.index_of(name))
        .collect::<Result<Vec<_>, _>>()?;
    let projected = batch.project(&indices)?;
    println!("{}", pretty_format_batches(&[projected])?);
    println!("{} record(s)", batch.num_rows());
    Ok(())
}

// ── Links ──

pub fn print_links(
    codice: &str,
    resolution: &Resolution,
    reachable: Option<&BTreeMap<String, usize>>,
) {
    let links = resolution.get(codice);
    let inbound: Vec<&str> = resolution.referenced_by(codice).collect();

    println!("Links");
    if links.is_empty() && inbound.is_empty() {
        println!("  (none)");
    }
    for (target, relation) in links.edges() {
        println!("  {:<26} {}", relation.as_str(), target);
    }
    print_items("dangling", links.dangling.iter().map(String::as_str));
    print_items("referenced_by", inbound.iter().copied());

    if let Some(reachable) = reachable {
        let mut by_hop: Vec<(&usize, &String)> = reachable.iter().map(|(c, h)| (h, c)).collect();
        by_hop.sort();
        println!("  reachable ({}):", by_hop.len());
        for (hop, target) in by_hop {
            println!("    {:<30}  hop {}", target, hop);
        }
    }
    println!();
}

pub fn print_dangling(resolution: &Resolution) {
    let count = resolution.dangling_count();
    if count == 0 {
        println!("No dangling references.");
        return;
    }
    println!("Dangling references ({count}):");
    for notice in resolution.dangling() {
        let codice = notice.codice.as_deref().unwrap_or("-");
        println!(
            "  {:<10} {:<8} {:<10} {}",
            notice.source,
            notice.relation.as_str(),
            codice,
            notice.uri
        );
    }
}

// ── Ingest report ──

pub fn print_report(report: &IngestReport) {
    println!("Ingest");
    println!("  {:<26} {}", "files", report.files);
    println!("  {:<26} {}", "blocks", report.blocks);
    println!("  {:<26} {}", "inserted", report.inserted.len());
    println!("  {:<26} {}", "rejected", report.failures.len());
    println!("  {:<26} {}", "warnings", report.warnings.len());
    println!("  {:<26} {}", "matched links", report.matched);
    println!("  {:<26} {}", "dangling references", report.dangling);
    println!();

    if !report.failures.is_empty() {
        println!("Rejected");
        for failure in &report.failures {
            println!("  {failure}");
        }
        println!();
    }
    if !report.warnings.is_empty() {
        println!("Warnings");
        for warning in &report.warnings {
            println!("  {warning}");
        }
        println!();
    }
}

// ── Section rendering ──

fn print_section(batch: &RecordBatch, header: &str, cols: &[&str]) {
    let has_data = cols.iter().any(|&col| {
        batch
            .column_by_name(col)
            .is_some_and(|c| !c.is_null(0))
    });
    if !has_data {
        return;
    }

    println!("{header}");
    for &col_name in cols {
        let Some(col) = batch.column_by_name(col_name) else {
            continue;
        };
        if col.is_null(0) {
            continue;
        }

        match col.data_type() {
            DataType::List(inner) if inner.data_type() == &DataType::Utf8 => {
                print_list_utf8(col.as_ref(), col_name)
            }
            _ => match ArrayFormatter::try_new(col.as_ref(), &Default::default()) {
                Ok(fmt) => println!("  {:<26} {}", col_name, fmt.value(0)),
                Err(_) => println!("  {:<26} ({})", col_name, col.data_type()),
            },
        }
    }
    println!();
}

// ── List<Utf8> ──

fn print_list_utf8(col: &dyn Array, col_name: &str) {
    let Some(list) = col.as_any().downcast_ref::<ListArray>() else {
        return;
    };
    let values = list.value(0);
    let Some(strings) = values.as_any().downcast_ref::<StringArray>() else {
        return;
    };
    let items = (0..strings.len())
        .filter(|&i| !strings.is_null(i))
        .map(|i| strings.value(i));
    print_items(col_name, items);
}

fn print_items<'a>(name: &str, items: impl Iterator<Item = &'a str>) {
    let items: Vec<&str> = items.collect();
    match items.len() {
        0 => {}
        1 => println!("  {:<26} {}", name, items[0]),
        len => {
            println!("  {} ({}):", name, len);
            for item in items.iter().take(MAX_LIST_ITEMS) {
                println!("    {}", item);
            }
            if len > MAX_LIST_ITEMS {
                println!("    ... and {} more", len - MAX_LIST_ITEMS);
            }
        }
    }
}

// ── Helpers ──

fn get_utf8(batch: &RecordBatch, col_name: &str) -> Option<String> {
    let col = batch.column_by_name(col_name)?;
    if col.is_null(0) {
        return None;
    }
    col.as_any()
        .downcast_ref::<StringArray>()
        .map(|arr| arr.value(0).to_string())
}
