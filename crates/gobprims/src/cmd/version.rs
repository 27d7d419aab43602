use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("gobprims {}", env!("CARGO_PKG_VERSION"));
    if !args.extended {
        return Ok(SUCCESS);
    }

    println!(
        "target: {}",
        option_env!("GOBPRIMS_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("GOBPRIMS_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("os: {}/{}", std::env::consts::OS, std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "max_message_size: {}",
        gobprims::wire::DEFAULT_MAX_MESSAGE
    );

    Ok(SUCCESS)
}
