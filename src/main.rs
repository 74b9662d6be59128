use std::process::ExitCode;

use cgmeta::ui::output;

fn main() -> ExitCode {
    match cgmeta::cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
