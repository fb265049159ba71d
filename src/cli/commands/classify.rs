//! Classify command - show the route a request would take

use crate::cli::args::ClassifyArgs;
use crate::config::Config;
use crate::error::SwResult;
use crate::http::{Request, RequestMode};
use crate::worker::{Strategy, WorkerSettings};

/// Execute the classify command
pub async fn execute(args: ClassifyArgs, config: &Config) -> SwResult<()> {
    let settings = WorkerSettings::from_config(config)?;
    let request = build_request(&args.url, args.navigate)?;

    let class = settings.classifier.classify(&request);
    println!("{} -> {}", class, Strategy::from(class));
    Ok(())
}

/// Parse a command-line URL into a request, as a navigation if asked
pub(crate) fn build_request(url: &str, navigate: bool) -> SwResult<Request> {
    let request = Request::parse(url)?;
    Ok(if navigate {
        request.with_mode(RequestMode::Navigate)
    } else {
        request
    })
}
