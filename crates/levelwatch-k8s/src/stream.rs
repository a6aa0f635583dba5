use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use anyhow::{Result, anyhow};
use futures::{AsyncBufRead, AsyncBufReadExt, Stream};
use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use kube::api::LogParams;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use levelwatch_types::decode_line;

/// Lines buffered between the reader task and the consumer
const LINE_CHANNEL_CAPACITY: usize = 256;

/// Lines of one pod's log stream
///
/// A background task owns the HTTP stream and forwards complete lines; it is
/// aborted when this value is dropped.
pub struct LogLines {
    rx: mpsc::Receiver<io::Result<String>>,
    task: JoinHandle<()>,
}

impl Stream for LogLines {
    type Item = io::Result<String>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for LogLines {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Start the reader task and wait until the API has accepted the log request
pub(crate) async fn open(api: Api<Pod>, pod_name: String, params: LogParams) -> Result<LogLines> {
    let (line_tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    let (ready_tx, ready_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let reader = match api.log_stream(&pod_name, &params).await {
            Ok(reader) => {
                let _ = ready_tx.send(Ok(()));
                reader
            }
            Err(e) => {
                let _ = ready_tx.send(Err(e));
                return;
            }
        };

        forward_lines(reader, &line_tx).await;
        tracing::debug!(pod = %pod_name, "log stream closed");
    });

    match ready_rx.await {
        Ok(Ok(())) => Ok(LogLines { rx, task }),
        Ok(Err(e)) => Err(e.into()),
        Err(_) => Err(anyhow!("log stream task exited before the stream opened")),
    }
}

/// Forward newline-delimited lines until EOF, a read error or a dropped consumer
///
/// Lines are decoded lossily so a stray non-UTF-8 byte does not end the tail.
async fn forward_lines<R: AsyncBufRead>(reader: R, line_tx: &mpsc::Sender<io::Result<String>>) {
    let mut reader = std::pin::pin!(reader);
    loop {
        let mut buf = Vec::new();
        let line = match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => Ok(decode_line(buf)),
            Err(e) => Err(e),
        };

        let failed = line.is_err();
        if line_tx.send(line).await.is_err() {
            // Consumer dropped, stop streaming
            break;
        }
        if failed {
            break;
        }
    }
}
