mod cli;
mod runner;

use wafscope::error::ISSUES_LINK;
use wafscope::WafError;

#[tokio::main]
async fn main() {
    let cli = cli::parse_cli();
    if let Err(e) = runner::run_from_cli(cli).await {
        match e.downcast_ref::<WafError>() {
            Some(WafError::Cancelled) => eprintln!("[x] user aborted scanning"),
            Some(known) => eprintln!("[x] {}", known),
            None => eprintln!(
                "[x] wafscope has caught an unhandled error with the error message: '{}'. You can create an issue here: '{}'",
                e, ISSUES_LINK
            ),
        }
        std::process::exit(1);
    }
}
