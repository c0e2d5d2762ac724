//! A long-running query session over one live [`RetrievalService`].
//!
//! Each input line is answered with exactly one line of JSON:
//!
//! - `<query>`           search with the default `k`
//! - `:k <n> <query>`    search with an explicit `k`
//! - `:reindex`          rebuild the index and report the outcome
//! - `:status`           report the service status
//! - `:quit` / `:exit`   end the session
//!
//! An optional background task reindexes on a fixed period, so queries
//! can be observed running against successive snapshots.

use std::{sync::Arc, time::Duration};

use serde_json::{Value, json};
use tokio::io::{
    AsyncBufRead,
    AsyncBufReadExt,
    AsyncWrite,
    AsyncWriteExt,
    BufReader,
};
use tracing::{debug, warn};

use crate::{
    error::{self, Error},
    search::SearchResponse,
    service::{ReindexOutcome, RetrievalService},
};

#[derive(Debug, Clone, Copy)]
pub struct ShellOptions {
    /// `k` used when a line does not specify one.
    pub default_k: usize,
    /// Reindex in the background on this period, if set.
    pub reindex_interval: Option<Duration>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Query { text: &'a str, k: usize },
    Reindex,
    Status,
    Quit,
    Invalid(String),
}

fn parse_command(line: &str, default_k: usize) -> Command<'_> {
    let Some(rest) = line.strip_prefix(':') else {
        return Command::Query {
            text: line,
            k: default_k,
        };
    };

    let (name, args) = rest
        .split_once(char::is_whitespace)
        .map_or((rest, ""), |(n, a)| (n, a.trim()));

    match name {
        "reindex" => Command::Reindex,
        "status" => Command::Status,
        "quit" | "exit" => Command::Quit,
        "k" => {
            let (n, text) = args
                .split_once(char::is_whitespace)
                .map_or((args, ""), |(n, t)| (n, t.trim()));
            match n.parse() {
                Ok(k) if !text.is_empty() => Command::Query { text, k },
                Ok(_) => Command::Invalid("usage: :k <n> <query>".into()),
                Err(_) => Command::Invalid(format!("invalid k: {n:?}")),
            }
        }
        other => Command::Invalid(format!("unknown command: :{other}")),
    }
}

/// Run a shell on stdin/stdout until EOF or `:quit`.
pub fn run_shell(
    service: Arc<RetrievalService>,
    options: ShellOptions,
) -> error::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let mut stdout = tokio::io::stdout();
        serve(
            service,
            BufReader::new(tokio::io::stdin()),
            &mut stdout,
            options,
        )
        .await
    })
}

/// Answer commands from `input` on `output`.
pub async fn serve<R, W>(
    service: Arc<RetrievalService>,
    input: R,
    output: &mut W,
    options: ShellOptions,
) -> error::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let ticker = options
        .reindex_interval
        .map(|period| tokio::spawn(periodic_reindex(service.clone(), period)));

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let reply = match parse_command(line, options.default_k) {
            Command::Quit => break,
            Command::Reindex => {
                serde_json::to_value(reindex_off_thread(service.clone()).await)?
            }
            Command::Status => serde_json::to_value(service.status())?,
            Command::Query { text, k } => query_reply(&service, text, k)?,
            Command::Invalid(message) => json!({ "error": message }),
        };

        output.write_all(reply.to_string().as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }

    if let Some(ticker) = ticker {
        ticker.abort();
    }
    Ok(())
}

fn query_reply(
    service: &RetrievalService,
    text: &str,
    k: usize,
) -> error::Result<Value> {
    match service.query(text, k) {
        Ok(hits) => Ok(serde_json::to_value(SearchResponse::new(
            text, k, &hits, false,
        ))?),
        Err(e) => Ok(json!({ "error": e.to_string() })),
    }
}

/// Reindex on the blocking pool. The calling command still waits for the
/// outcome, but the runtime stays free for the periodic ticker.
async fn reindex_off_thread(service: Arc<RetrievalService>) -> ReindexOutcome {
    match tokio::task::spawn_blocking(move || service.reindex()).await {
        Ok(outcome) => outcome,
        Err(e) => ReindexOutcome::Failed {
            reason: format!("reindex task failed: {e}"),
        },
    }
}

async fn periodic_reindex(service: Arc<RetrievalService>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    // The first tick completes immediately; the index is already fresh.
    interval.tick().await;
    loop {
        interval.tick().await;
        match reindex_off_thread(service.clone()).await {
            ReindexOutcome::Reindexed { generation, .. } => {
                debug!(generation, "periodic reindex")
            }
            ReindexOutcome::Failed { reason } => {
                warn!(%reason, "periodic reindex failed")
            }
        }
    }
}
