//! Greeter demo binary.
//!
//! Acquires the directory and outbox, builds the server and sends one
//! `POST /greet` per command-line argument (default `Bob`) through it,
//! printing each response. Exits with status 1 if startup fails, for
//! example when `GREETER_MAIL_RELAY` is not `host:port`.

use std::process::ExitCode;
use std::sync::Arc;

use bytes::Bytes;
use http::header::CONTENT_TYPE;
use http_body_util::BodyExt;
use waypoint::core::{Error, ErrorKind, ResultExt, FORM_URLENCODED};
use waypoint::server::{ResourceScope, Server, ServerConfig};
use waypoint::telemetry::{init_logging, LogConfig};
use waypoint_greeter::{build_server, MemoryDirectory, Outbox, SERVICE_NAME};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{SERVICE_NAME}: {}", e.render());
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Error> {
    init_logging(&LogConfig::development().with_service_name(SERVICE_NAME))?;

    let mut scope = ResourceScope::new();
    let directory = scope
        .acquire("directory", || async {
            Ok::<_, Error>(
                MemoryDirectory::new()
                    .with_entry("Bob", "bob@example.com")
                    .with_entry("Ann", "ann@example.com"),
            )
        })
        .await?;
    let outbox = scope.acquire_blocking("outbox", Outbox::from_env)?;

    let server = build_server(directory, Arc::clone(&outbox), ServerConfig::default())?;

    let mut names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        names.push("Bob".to_string());
    }
    for name in &names {
        let (status, body) = greet(&server, name).await?;
        println!("{status} {body}");
    }

    tracing::info!(mails = outbox.sent().len(), "done");
    scope.release_all();
    Ok(())
}

async fn greet(server: &Server, name: &str) -> Result<(http::StatusCode, String), Error> {
    let form = serde_urlencoded::to_string([("name", name)])
        .wrap_err(ErrorKind::Request, "failed to encode form")?;
    let request = http::Request::post("/greet")
        .header(CONTENT_TYPE, FORM_URLENCODED)
        .body(Bytes::from(form))
        .wrap_err(ErrorKind::Request, "failed to build request")?;

    let response = server.serve(request).await;
    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .wrap_err(ErrorKind::Write, "failed to read response")?
        .to_bytes();
    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}
