//! Fetch command - route one request through the active worker

use super::classify::build_request;
use super::Site;
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{SwError, SwResult};
use crate::http::Response;
use crate::worker::Strategy;
use console::style;
use std::io::{self, Write};
use tokio::fs;
use tracing::info;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> SwResult<()> {
    let site = Site::open(config)?;
    let registration = site.registration().await?;
    let worker = site.active(&registration)?;

    let mut request = build_request(&args.url, args.navigate)?.with_method(&args.method);
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(name, value);
    }
    if let Some(data) = args.data {
        request = request.with_body(data.into_bytes());
    }
    let class = worker.classify(&request);
    info!("{} {} classified {}", request.method, request.url, class);

    let handled = worker.handle_fetch(&request).await?;

    eprintln!(
        "{} {} {} {}",
        style(handled.response.status).bold(),
        style(format!("[{}]", handled.source)).cyan(),
        handled.response.header("content-type").unwrap_or("-"),
        style(Strategy::from(class)).dim()
    );

    if args.head {
        print_head(&handled.response)?;
    } else if let Some(path) = &args.output {
        fs::write(path, &handled.response.body)
            .await
            .map_err(|e| SwError::io(format!("writing {}", path.display()), e))?;
        info!("Wrote {} bytes to {}", handled.response.body.len(), path.display());
    } else {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(&handled.response.body)
            .and_then(|_| stdout.flush())
            .map_err(|e| SwError::io("writing response body", e))?;
    }

    // The refreshed entry must land before the process exits
    if let Some(revalidation) = handled.revalidation {
        revalidation.settled().await;
    }

    Ok(())
}

fn print_head(response: &Response) -> SwResult<()> {
    let mut stdout = io::stdout().lock();
    let mut write = || -> io::Result<()> {
        writeln!(stdout, "status: {}", response.status)?;
        writeln!(stdout, "type: {}", response.kind)?;
        writeln!(stdout, "url: {}", response.url)?;
        if response.redirected {
            writeln!(stdout, "redirected: true")?;
        }
        for (name, value) in &response.headers {
            writeln!(stdout, "{}: {}", name, value)?;
        }
        Ok(())
    };
    write().map_err(|e| SwError::io("writing response head", e))
}

/// Split a `Name: value` header argument
fn parse_header(raw: &str) -> SwResult<(&str, &str)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => Err(SwError::User(format!(
            "Invalid header {:?}; expected \"Name: value\"",
            raw
        ))),
    }
}
