use std::process::ExitCode;

fn main() -> ExitCode {
    pricedesk_cli::run()
}
