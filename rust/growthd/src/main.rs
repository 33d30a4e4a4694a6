use std::io::{self, BufRead, Write};

use clap::Parser;
use growthd::config::Args;
use growthd::ipc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() {
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("growthd=info")),
        )
        .init();

    let args = Args::parse();
    info!("starting growthd v{}", env!("CARGO_PKG_VERSION"));

    let mut state = ipc::AppState::new(args.sheet.clone());
    if let Some(path) = args.workspace.as_deref() {
        // A bad startup workspace leaves the sidecar usable; the front-end can select another.
        if let Err(e) = ipc::select_workspace(&mut state, path, None) {
            warn!(code = e.code, "startup workspace not opened: {}", e.message);
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                warn!(error = %e, "unparseable request line");
                let resp = ipc::err("", "bad_json", e.to_string(), None);
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(stdout, "{}", resp);
        let _ = stdout.flush();
    }
    info!("stdin closed, shutting down");
}
