//! Parse every `*.xml` in a directory and print the export as CSV.
//!
//! ```text
//! RUST_LOG=notafiscal=debug cargo run --example batch_report --features all -- ./xmls 05.255.986/0001-64
//! ```
//!
//! Arguments after the directory are own-company CNPJs/CPFs.

use std::error::Error;
use std::path::PathBuf;

use notafiscal::core::numeric::format_currency;
use notafiscal::core::*;
use notafiscal::parse::parse_batch;
use notafiscal::report::{Summary, write_csv};
use tracing::info;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let dir = PathBuf::from(args.next().ok_or("usage: batch_report <dir> [own-tax-id...]")?);
    let config = args.fold(EngineConfig::default(), |config, id| {
        config.with_own_company(&id)
    });

    let mut files = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        let is_xml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        if !is_xml {
            continue;
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = std::fs::read(&path)?;
        files.push((name, String::from_utf8_lossy(&bytes).into_owned()));
    }
    files.sort();
    info!(dir = %dir.display(), files = files.len(), "Processing directory");

    // Files are imported one at a time against the rows kept so far, so a
    // document exported twice under different names is reported once.
    let today = chrono::Local::now().date_naive();
    let mut kept: Vec<NormalizedRecord> = Vec::new();
    let mut failures = Vec::new();
    for (name, content) in &files {
        let outcome = parse_batch([(name, content)], &config);
        failures.extend(outcome.failures);
        let mut dedup = partition_duplicates(&kept, outcome.records);
        if !dedup.duplicates.is_empty() {
            info!(file = %name, rows = dedup.duplicates.len(), "Skipping rows already imported");
        }
        stamp_inserted(&mut dedup.fresh, today);
        kept.append(&mut dedup.fresh);
    }
    for failure in &failures {
        eprintln!("skipped {failure}");
    }

    let summary = Summary::from_records(&kept);
    eprintln!(
        "{} files, {} documents, {} rows ({} NF-e, {} CT-e), sale value {}",
        files.len() - failures.len(),
        summary.documents,
        summary.rows,
        summary.invoice_rows,
        summary.manifest_rows,
        format_currency(summary.total_sale_value),
    );

    write_csv(&mut std::io::stdout().lock(), &kept, today)?;
    Ok(())
}
