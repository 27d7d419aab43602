use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use gobprims::Example;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One message of a stream, as listed by `inspect`.
#[derive(Serialize)]
pub struct MessageSummary {
    pub index: usize,
    pub kind: &'static str,
    pub type_id: i64,
    pub type_name: String,
    pub size: usize,
    pub detail: String,
}

pub fn print_record(record: &Example, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(record),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"]);
            for (field, value) in record_fields(record) {
                table.add_row(vec![field.to_string(), value]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for (field, value) in record_fields(record) {
                println!("{field:<8} {value}");
            }
        }
    }
}

pub fn print_messages(messages: &[MessageSummary], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for message in messages {
                print_json(message);
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "KIND", "ID", "TYPE", "SIZE", "DETAIL"]);
            for m in messages {
                table.add_row(vec![
                    m.index.to_string(),
                    m.kind.to_string(),
                    m.type_id.to_string(),
                    m.type_name.clone(),
                    m.size.to_string(),
                    m.detail.clone(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for m in messages {
                println!(
                    "#{} {} id={} type={} size={} {}",
                    m.index, m.kind, m.type_id, m.type_name, m.size, m.detail
                );
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn record_fields(record: &Example) -> Vec<(&'static str, String)> {
    vec![
        ("Bool", record.bool.to_string()),
        ("Int", record.int.to_string()),
        ("Uint", record.uint.to_string()),
        ("Float", record.float.to_string()),
        ("Bytes", format!("{:?}", record.bytes)),
        ("String", record.string.clone()),
        (
            "Nested",
            format!("{{X: {}, Y: {}}}", record.nested.x, record.nested.y),
        ),
    ]
}
