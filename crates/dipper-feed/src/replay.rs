//! File-replay stream sources.
//!
//! Replays captured stream payloads (one JSON object per line) through
//! the same decoders and channels a live transport would use. This is
//! the offline collaborator for paper sessions and deterministic
//! testing; malformed lines are logged and dropped, exactly like a bad
//! element on a live stream.

use crate::error::{FeedError, FeedResult};
use crate::parser::{decode_account_event, decode_trade};
use crate::sources::{AccountEventSource, TickSource, CHANNEL_CAPACITY};
use dipper_core::{AccountEvent, Symbol, Tick};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::sync::mpsc;
use tracing::{debug, warn};

async fn open_lines(path: &Path) -> FeedResult<Lines<BufReader<File>>> {
    let file = File::open(path).await?;
    Ok(BufReader::new(file).lines())
}

/// Tick stream replay from per-symbol capture files.
pub struct ReplayTickSource {
    files: HashMap<String, PathBuf>,
}

impl ReplayTickSource {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    /// Register the capture file for a symbol.
    pub fn with_file(mut self, symbol: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.files.insert(symbol.into(), path.into());
        self
    }
}

impl Default for ReplayTickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for ReplayTickSource {
    fn subscribe(&self, symbol: &Symbol) -> FeedResult<mpsc::Receiver<Tick>> {
        let path = self
            .files
            .get(&symbol.symbol)
            .cloned()
            .ok_or_else(|| FeedError::UnknownSymbol(symbol.symbol.clone()))?;
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let symbol_name = symbol.symbol.clone();

        tokio::spawn(async move {
            let mut lines = match open_lines(&path).await {
                Ok(lines) => lines,
                Err(e) => {
                    warn!(symbol = %symbol_name, error = %e, "Cannot open trade capture");
                    return;
                }
            };
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => match decode_trade(line.trim()) {
                        Ok(tick) => {
                            // awaiting keeps replay ordered under backpressure;
                            // a send error means the subscriber is gone
                            if tx.send(tick).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => {
                            warn!(symbol = %symbol_name, error = %e, "Dropping malformed trade line")
                        }
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!(symbol = %symbol_name, error = %e, "Trade replay read failed");
                        break;
                    }
                }
            }
            debug!(symbol = %symbol_name, "Trade replay finished");
        });

        Ok(rx)
    }
}

/// Account stream replay from a single capture file.
pub struct ReplayAccountSource {
    path: PathBuf,
}

impl ReplayAccountSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl AccountEventSource for ReplayAccountSource {
    fn events(&self) -> FeedResult<mpsc::Receiver<AccountEvent>> {
        let path = self.path.clone();
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut lines = match open_lines(&path).await {
                Ok(lines) => lines,
                Err(e) => {
                    warn!(error = %e, "Cannot open account capture");
                    return;
                }
            };
            'outer: loop {
                match lines.next_line().await {
                    Ok(Some(line)) if line.trim().is_empty() => continue,
                    Ok(Some(line)) => match decode_account_event(line.trim()) {
                        Ok(events) => {
                            for event in events {
                                if tx.send(event).await.is_err() {
                                    break 'outer;
                                }
                            }
                        }
                        Err(e) => warn!(error = %e, "Dropping malformed account line"),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Account replay read failed");
                        break;
                    }
                }
            }
            debug!("Account replay finished");
        });

        Ok(rx)
    }
}
