use gobprims::write_sample;

use crate::cmd::WriteArgs;
use crate::exit::{CliResult, SUCCESS};

/// Failures are reported on stdout and still exit successfully.
pub fn run(args: WriteArgs) -> CliResult<i32> {
    match write_sample(&args.output) {
        Ok(()) => tracing::info!(path = %args.output.display(), "sample record written"),
        Err(err) => {
            tracing::debug!(error = ?err, "write failed");
            println!("{err}");
        }
    }
    Ok(SUCCESS)
}
