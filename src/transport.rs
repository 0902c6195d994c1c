use std::sync::mpsc as std_mpsc;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use tokio::sync::{mpsc, oneshot};

use crate::error::ArchicadError;

const TRANSPORT_QUEUE_CAPACITY: usize = 64;

#[derive(Debug)]
pub(crate) struct Transport {
    request_tx: mpsc::Sender<TransportRequest>,
}

#[derive(Debug)]
struct TransportRequest {
    request_bytes: Vec<u8>,
    response_tx: oneshot::Sender<Result<Vec<u8>, ArchicadError>>,
}

impl Transport {
    /// Spawns the worker that owns the HTTP connection to `endpoint`.
    ///
    /// Commands are posted one at a time in submission order.
    pub(crate) fn connect(endpoint: &str, timeout: Duration) -> Result<Self, ArchicadError> {
        let (request_tx, mut request_rx) =
            mpsc::channel::<TransportRequest>(TRANSPORT_QUEUE_CAPACITY);
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), ArchicadError>>();

        let worker_endpoint = endpoint.to_string();
        let worker_name = format!("archicad-ipc-transport-{}", std::process::id());
        thread::Builder::new()
            .name(worker_name)
            .spawn(move || {
                let http = match configured_client(&worker_endpoint, timeout) {
                    Ok(http) => {
                        let _ = ready_tx.send(Ok(()));
                        http
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                while let Some(request) = request_rx.blocking_recv() {
                    let response =
                        http_roundtrip(&http, &worker_endpoint, request.request_bytes, timeout);
                    let _ = request.response_tx.send(response);
                }
            })
            .map_err(|err| ArchicadError::Connection {
                endpoint: endpoint.to_string(),
                reason: err.to_string(),
            })?;

        ready_rx
            .recv()
            .map_err(|_| ArchicadError::TransportClosed)??;

        Ok(Self { request_tx })
    }

    pub(crate) async fn roundtrip(&self, request_bytes: Vec<u8>) -> Result<Vec<u8>, ArchicadError> {
        let (response_tx, response_rx) = oneshot::channel();

        self.request_tx
            .send(TransportRequest {
                request_bytes,
                response_tx,
            })
            .await
            .map_err(|_| ArchicadError::TransportClosed)?;

        response_rx.await.map_err(|_| ArchicadError::TransportClosed)?
    }
}

pub(crate) fn endpoint_url(host: &str, port: u16) -> String {
    format!("http://{host}:{port}")
}

fn configured_client(endpoint: &str, timeout: Duration) -> Result<HttpClient, ArchicadError> {
    HttpClient::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(|err| ArchicadError::Connection {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        })
}

fn http_roundtrip(
    http: &HttpClient,
    endpoint: &str,
    request_bytes: Vec<u8>,
    timeout: Duration,
) -> Result<Vec<u8>, ArchicadError> {
    let response = http
        .post(endpoint)
        .header(CONTENT_TYPE, "application/json")
        .body(request_bytes)
        .send()
        .map_err(|err| map_send_error(err, endpoint, timeout))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ArchicadError::TransportReceive {
            reason: format!("HTTP status {status}"),
        });
    }

    let body = response
        .bytes()
        .map_err(|err| map_receive_error(err, timeout))?;

    Ok(body.to_vec())
}

fn map_send_error(error: reqwest::Error, endpoint: &str, timeout: Duration) -> ArchicadError {
    if error.is_timeout() {
        return ArchicadError::Timeout { timeout };
    }

    if error.is_connect() {
        return ArchicadError::Connection {
            endpoint: endpoint.to_string(),
            reason: error.to_string(),
        };
    }

    ArchicadError::TransportSend {
        reason: error.to_string(),
    }
}

fn map_receive_error(error: reqwest::Error, timeout: Duration) -> ArchicadError {
    if error.is_timeout() {
        return ArchicadError::Timeout { timeout };
    }

    ArchicadError::TransportReceive {
        reason: error.to_string(),
    }
}
