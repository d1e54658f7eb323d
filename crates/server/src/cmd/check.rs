use std::process::ExitCode;

use executor::check_toolchains;
use language::Registry;

use crate::error::ServerResult;

/// Print each language with the toolchain programs it is missing.
pub fn run_check() -> ServerResult<ExitCode> {
    let registry = Registry::builtin();
    let statuses = check_toolchains(&registry);

    let mut all_available = true;
    for status in &statuses {
        if status.is_available() {
            println!("[OK] {}", status.language);
        } else {
            all_available = false;
            println!("[MISSING] {}: {}", status.language, status.missing.join(", "));
        }
    }

    Ok(if all_available {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
