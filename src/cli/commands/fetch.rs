//! Fetch command - answer one request through the worker
//!
//! The response body goes to stdout (or `--output`); the status line and any
//! client notice go to stderr so the body can be piped.

use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{PrecacheError, PrecacheResult};
use crate::net::{Method, Request, RequestMode};
use crate::worker::create_worker;
use console::style;
use std::io::{self, Write};
use tokio::fs;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> PrecacheResult<()> {
    let worker = create_worker(config).await?;

    let method: Method = args.method.parse()?;
    let mut request = Request::resolve(method, worker.scope(), &args.url)?;
    if args.no_cors {
        request = request.with_mode(RequestMode::NoCors);
    }

    let mut notices = match args.client.as_deref() {
        Some(id) => Some(worker.clients().register(id).await),
        None => None,
    };

    let event = worker.intercept(&request, args.client.as_deref()).await?;
    let class = event.class;
    let served = event.settled().await;
    let response = &served.response;

    eprintln!(
        "{} {} {} [{} via {}]",
        status_style(response.status),
        request.method,
        request.url,
        class,
        served.source
    );

    if let (Some(receiver), Some(id)) = (notices.as_mut(), args.client.as_deref()) {
        while let Ok(notice) = receiver.try_recv() {
            eprintln!(
                "{} {}: {}",
                style("notice").cyan(),
                id,
                serde_json::to_string(&notice)?
            );
        }
        worker.clients().unregister(id).await;
    }

    match args.output {
        Some(path) => fs::write(&path, &response.body)
            .await
            .map_err(|e| PrecacheError::io(format!("writing {}", path.display()), e))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&response.body)
                .and_then(|_| stdout.flush())
                .map_err(|e| PrecacheError::io("writing response body", e))?;
        }
    }

    Ok(())
}

fn status_style(status: u16) -> console::StyledObject<String> {
    let text = if status == 0 {
        "opaque".to_string()
    } else {
        status.to_string()
    };
    match status {
        0 => style(text).dim(),
        200..=299 => style(text).green(),
        300..=399 => style(text).cyan(),
        _ => style(text).red(),
    }
}
