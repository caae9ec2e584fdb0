mod cli;
mod log;
mod svc;
#[cfg(test)]
mod test_utils;

use std::process::ExitCode;

use crate::cli::ux;

#[tokio::main]
async fn main() -> ExitCode {
    match cli::run().await {
        Ok(code) => code,
        Err(e) => {
            ux::present_error(e);
            ExitCode::FAILURE
        }
    }
}
