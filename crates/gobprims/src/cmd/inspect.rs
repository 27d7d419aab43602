use std::fs::File;
use std::io::BufReader;

use gobprims::codec::{GobError, TypeTable, WireType};
use gobprims::wire::{get_int, MessageReader, TypeId, WireError};

use crate::cmd::InspectArgs;
use crate::exit::{gob_error, io_error, wire_error, CliResult, SUCCESS};
use crate::output::{print_messages, MessageSummary, OutputFormat};

enum Entry {
    Definition { size: usize, wire: WireType },
    Value { size: usize, id: TypeId },
}

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.path)
        .map_err(|err| io_error(&format!("open {}", args.path.display()), err))?;
    let mut reader = MessageReader::new(BufReader::new(file));

    let mut types = TypeTable::new();
    let mut entries = Vec::new();
    loop {
        let mut message = match reader.read_message() {
            Ok(message) => message,
            Err(WireError::EndOfStream) => break,
            Err(err) => return Err(wire_error("read failed", err)),
        };
        let size = message.len();
        let id = get_int(&mut message).map_err(|err| wire_error("read failed", err))?;

        if id >= 0 {
            entries.push(Entry::Value { size, id });
            continue;
        }
        let id = id
            .checked_neg()
            .ok_or_else(|| gob_error("bad type definition", GobError::UndefinedType(id)))?;
        let wire =
            WireType::decode(&mut message).map_err(|err| gob_error("bad type definition", err))?;
        types
            .define(id, wire.clone())
            .map_err(|err| gob_error("bad type definition", err))?;
        entries.push(Entry::Definition { size, wire });
    }
    tracing::debug!(messages = entries.len(), types = types.len(), "stream inspected");

    let summaries: Vec<MessageSummary> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| summarize(index, entry, &types))
        .collect();
    print_messages(&summaries, format);
    Ok(SUCCESS)
}

// Summaries are built after the whole stream is read: a definition may
// refer to types defined after it.
fn summarize(index: usize, entry: &Entry, types: &TypeTable) -> MessageSummary {
    match entry {
        Entry::Definition { size, wire } => MessageSummary {
            index,
            kind: "definition",
            type_id: wire.id(),
            type_name: wire.name().to_string(),
            size: *size,
            detail: describe(wire, types),
        },
        Entry::Value { size, id } => MessageSummary {
            index,
            kind: "value",
            type_id: *id,
            type_name: types.describe(*id),
            size: *size,
            detail: String::new(),
        },
    }
}

fn describe(wire: &WireType, types: &TypeTable) -> String {
    match wire {
        WireType::Struct(t) => {
            let fields: Vec<String> = t
                .fields
                .iter()
                .map(|f| format!("{} {}", f.name, types.describe(f.id)))
                .collect();
            format!("struct {{{}}}", fields.join("; "))
        }
        WireType::Slice(t) => format!("slice of {}", types.describe(t.elem)),
        WireType::Array(t) => format!("array of {} {}", t.len, types.describe(t.elem)),
        WireType::Map(t) => format!(
            "map from {} to {}",
            types.describe(t.key),
            types.describe(t.elem)
        ),
    }
}

#[cfg(test)]
mod tests {
    use gobprims::codec::types::{CommonType, FieldType, StructType};

    use super::*;

    #[test]
    fn struct_detail_names_field_types() {
        let mut types = TypeTable::new();
        let point = WireType::Struct(StructType {
            common: CommonType {
                name: "Point".to_string(),
                id: 65,
            },
            fields: vec![
                FieldType {
                    name: "X".to_string(),
                    id: 2,
                },
                FieldType {
                    name: "Y".to_string(),
                    id: 2,
                },
            ],
        });
        types.define(65, point.clone()).unwrap();

        assert_eq!(describe(&point, &types), "struct {X int; Y int}");
        let value = summarize(1, &Entry::Value { size: 7, id: 65 }, &types);
        assert_eq!(value.type_name, "Point");
        assert_eq!(value.kind, "value");
    }
}
