//! Version command

use std::process::ExitCode;

use anyhow::Result;

use crate::cli::VersionArgs;

/// Crate version baked in at build time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run(args: VersionArgs) -> Result<ExitCode> {
    if args.json {
        let info = serde_json::json!({
            "name": "atomvault",
            "version": VERSION,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        println!("atomvault {}", VERSION);
    }

    Ok(ExitCode::SUCCESS)
}
