use std::fs::File;
use std::io::BufReader;

use gobprims::codec::Decoder;
use gobprims::Example;

use crate::cmd::ReadArgs;
use crate::exit::{gob_error, io_error, CliResult, SUCCESS};
use crate::output::{print_record, OutputFormat};

pub fn run(args: ReadArgs, format: OutputFormat) -> CliResult<i32> {
    let file = File::open(&args.input)
        .map_err(|err| io_error(&format!("open {}", args.input.display()), err))?;

    let mut decoder = Decoder::new(BufReader::new(file));
    let record: Example = decoder
        .decode()
        .map_err(|err| gob_error("decode failed", err))?;
    tracing::debug!(types = decoder.types().len(), "record decoded");

    print_record(&record, format);
    Ok(SUCCESS)
}
