use std::path::Path;

use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ReportError;

const CHANNEL_CAPACITY: usize = 1024;

/// Cloneable handle feeding lines to a [`LineSink`].
#[derive(Clone)]
pub struct LineSinkTx {
    tx: mpsc::Sender<String>,
}

impl LineSinkTx {
    pub async fn send_line(&self, line: String) {
        if self.tx.send(line).await.is_err() {
            // writer closed
        }
    }
}

/// Single writer task appending lines to one file, so concurrent runs never
/// interleave partial lines.
pub struct LineSink {
    tx: LineSinkTx,
    handle: JoinHandle<()>,
}

impl LineSink {
    pub fn sender(&self) -> LineSinkTx {
        self.tx.clone()
    }

    /// Flush and wait for the writer. Every sender clone must be dropped first.
    pub async fn close(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "line sink writer task failed");
        }
    }
}

/// Create (truncate) `path`, write `header`, and spawn the writer task.
pub async fn start_line_sink(path: &Path, header: Option<&str>) -> Result<LineSink, ReportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        super::ensure_dir(parent).await?;
    }

    let write_err = |source| ReportError::Write {
        path: path.display().to_string(),
        source,
    };
    let mut file = tokio::fs::File::create(path).await.map_err(write_err)?;
    if let Some(header) = header {
        file.write_all(format!("{header}\n").as_bytes())
            .await
            .map_err(write_err)?;
    }

    let (tx, mut rx) = mpsc::channel::<String>(CHANNEL_CAPACITY);
    let shown = path.display().to_string();
    let handle = tokio::spawn(async move {
        while let Some(mut line) = rx.recv().await {
            if !line.ends_with('\n') {
                line.push('\n');
            }
            if let Err(e) = file.write_all(line.as_bytes()).await {
                tracing::warn!(path = %shown, error = %e, "line sink write failed");
                return;
            }
        }
        if let Err(e) = file.flush().await {
            tracing::warn!(path = %shown, error = %e, "line sink flush failed");
        }
    });

    Ok(LineSink {
        tx: LineSinkTx { tx },
        handle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_line_sink_writes_header_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("summary.csv");
        let sink = start_line_sink(&path, Some("a,b")).await.unwrap();

        let tx = sink.sender();
        tx.send_line("1,2".to_string()).await;
        tx.send_line("3,4\n".to_string()).await;
        drop(tx);
        sink.close().await;

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "a,b\n1,2\n3,4\n");
    }
}
