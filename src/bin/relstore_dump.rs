use clap::{Parser, ValueEnum};
use comfy_table::{Cell, Table as ComfyTable, presets::UTF8_FULL};
use relstore::core::TableMeta;
use relstore::{RecordLog, StorageConfig, Table, recover_table};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DumpFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "relstore_dump")]
#[command(about = "Print the schema, indexes and rows of a relstore table", long_about = None)]
struct Args {
    /// Table name to dump
    table: String,

    /// Data directory path (overrides config)
    #[arg(short = 'd', long)]
    data_dir: Option<PathBuf>,

    /// Config file (default: ./relstore.toml)
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Replay the record log before dumping
    #[arg(long)]
    recover: bool,

    /// Print only the schema and indexes
    #[arg(long)]
    schema_only: bool,

    /// Maximum number of rows to print
    #[arg(short = 'n', long)]
    limit: Option<usize>,

    /// Output format: table or json
    #[arg(short = 'f', long, value_enum, default_value = "table")]
    format: DumpFormat,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    // CLI args override config file and environment
    let mut config = StorageConfig::load(args.config.as_deref())?;
    if let Some(data_dir) = &args.data_dir {
        config.data_dir.clone_from(data_dir);
    }

    let mut table = Table::open(&config, &args.table)?;
    if args.recover {
        let log = RecordLog::open(&config.data_dir, config.wal_max_size)?;
        let stats = recover_table(&mut table, &log.read_all()?)?;
        eprintln!(
            "Recovered: {} inserted, {} deleted, {} skipped",
            stats.inserted, stats.deleted, stats.skipped
        );
    }

    let mut output = io::stdout().lock();
    match args.format {
        DumpFormat::Table => {
            dump_schema(table.table_meta(), &mut output)?;
            if !args.schema_only {
                dump_rows(&table, args.limit, &mut output)?;
            }
        }
        DumpFormat::Json => {
            dump_json(&table, args.schema_only, args.limit, &mut output)?;
        }
    }
    Ok(())
}

/// Fields, then scalar and vector indexes
fn dump_schema(meta: &TableMeta, output: &mut dyn Write) -> Result<(), Box<dyn std::error::Error>> {
    writeln!(output, "Table {} (id {}, {:?}, {} bytes per record)", meta.name, meta.table_id, meta.storage_format, meta.record_size())?;

    let mut fields = ComfyTable::new();
    fields.load_preset(UTF8_FULL);
    fields.set_header(["field", "type", "length", "nullable", "offset", "bytes"].map(Cell::new));
    for field in &meta.fields {
        fields.add_row([
            Cell::new(&field.name),
            Cell::new(field.attr_type),
            Cell::new(field.declared_len),
            Cell::new(field.nullable),
            Cell::new(field.offset),
            Cell::new(field.len),
        ]);
    }
    writeln!(output, "{fields}")?;

    if !meta.indexes.is_empty() || !meta.vector_indexes.is_empty() {
        let mut indexes = ComfyTable::new();
        indexes.load_preset(UTF8_FULL);
        indexes.set_header(["index", "kind", "fields", "options"].map(Cell::new));
        for index in &meta.indexes {
            let kind = if index.unique { "UNIQUE BTREE" } else { "BTREE" };
            indexes.add_row([
                Cell::new(&index.name),
                Cell::new(kind),
                Cell::new(index.fields.join(", ")),
                Cell::new(""),
            ]);
        }
        for index in &meta.vector_indexes {
            indexes.add_row([
                Cell::new(&index.name),
                Cell::new("IVFFLAT"),
                Cell::new(&index.field),
                Cell::new(format!(
                    "distance={}, lists={}, probes={}",
                    index.distance, index.lists, index.probes
                )),
            ]);
        }
        writeln!(output, "{indexes}")?;
    }
    Ok(())
}

fn dump_rows(table: &Table, limit: Option<usize>, output: &mut dyn Write) -> Result<(), Box<dyn std::error::Error>> {
    let mut rows = ComfyTable::new();
    rows.load_preset(UTF8_FULL);
    let mut header = vec![Cell::new("rid")];
    header.extend(table.table_meta().fields.iter().map(|f| Cell::new(&f.name)));
    rows.set_header(header);

    let mut count = 0;
    for record in table.get_record_scanner()?.take(limit.unwrap_or(usize::MAX)) {
        let mut row = vec![Cell::new(record.rid)];
        row.extend(table.record_values(&record)?.iter().map(Cell::new));
        rows.add_row(row);
        count += 1;
    }
    writeln!(output, "{rows}")?;
    writeln!(output, "({count} rows)")?;
    Ok(())
}

fn dump_json(
    table: &Table,
    schema_only: bool,
    limit: Option<usize>,
    output: &mut dyn Write,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut rows = Vec::new();
    if !schema_only {
        for record in table.get_record_scanner()?.take(limit.unwrap_or(usize::MAX)) {
            let values: Vec<String> = table.record_values(&record)?.iter().map(ToString::to_string).collect();
            rows.push(serde_json::json!({ "rid": record.rid, "values": values }));
        }
    }
    let dump = serde_json::json!({ "schema": table.table_meta(), "rows": rows });
    writeln!(output, "{}", serde_json::to_string_pretty(&dump)?)?;
    Ok(())
}
