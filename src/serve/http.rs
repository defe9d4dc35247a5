//! Minimal HTTP endpoint for the prediction service.
//!
//! One handler, not a web framework: `GET /predict` with query parameters.
//! For classification, `?text=...` maps onto the artifact's text column and
//! the response body is `Positive` or `Negative`. For regression, the
//! remaining parameters are coerced against the stored input schema and the
//! body is the decimal prediction. Request-scoped failures answer 400/500
//! without touching other in-flight requests.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};
use url::Url;

use crate::dataset::loader::coerce;
use crate::dataset::Row;
use crate::error::{HarrierError, Result};
use crate::schema::ColumnType;
use crate::serve::PredictionService;
use crate::store::Artifact;

/// Accept connections forever, answering each request from the service.
pub async fn serve(service: Arc<PredictionService>, listener: TcpListener) -> Result<()> {
    info!(addr = %listener.local_addr()?, "prediction endpoint listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let service = service.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, service).await {
                error!(%peer, error = %e, "connection handling failed");
            }
        });
    }
}

/// Bind an address and serve on it.
pub async fn bind_and_serve(service: Arc<PredictionService>, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(service, listener).await
}

async fn handle_connection(stream: TcpStream, service: Arc<PredictionService>) -> Result<()> {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader.read_line(&mut request_line).await?;

    // Drain the header block; nothing in it affects the response.
    loop {
        let mut header = String::new();
        let n = reader.read_line(&mut header).await?;
        if n == 0 || header == "\r\n" || header == "\n" {
            break;
        }
    }

    let mut stream = reader.into_inner();
    let (status, body) = match respond(&request_line, &service).await {
        Ok(body) => ("200 OK", body),
        Err(HarrierError::InvalidInput(message)) => {
            debug!(%message, "rejected request");
            ("400 Bad Request", message)
        }
        Err(e) => {
            error!(error = %e, "request failed");
            ("500 Internal Server Error", e.to_string())
        }
    };

    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

async fn respond(request_line: &str, service: &PredictionService) -> Result<String> {
    let mut parts = request_line.split_whitespace();
    let method = parts
        .next()
        .ok_or_else(|| HarrierError::invalid_input("empty request line"))?;
    let target = parts
        .next()
        .ok_or_else(|| HarrierError::invalid_input("missing request target"))?;

    if method != "GET" {
        return Err(HarrierError::invalid_input(format!(
            "unsupported method '{method}'"
        )));
    }

    let url = Url::parse(&format!("http://localhost{target}"))
        .map_err(|e| HarrierError::invalid_input(format!("bad request target: {e}")))?;

    if url.path() != "/predict" {
        return Err(HarrierError::invalid_input(format!(
            "no such endpoint '{}'",
            url.path()
        )));
    }

    let artifact = service.artifact().await?;
    let input = row_from_query(&artifact, &url)?;
    let prediction = service.predict(&input).await?;
    Ok(prediction.to_string())
}

/// Build a typed input row from decoded query parameters.
///
/// Parameters matching schema columns are coerced to the declared type;
/// the `text` shorthand maps onto the first pipeline-required text column,
/// matching the classification endpoint shape `GET /predict?text=...`.
fn row_from_query(artifact: &Artifact, url: &Url) -> Result<Row> {
    let mut row = Row::new();

    for (key, value) in url.query_pairs() {
        let column = if artifact.schema.has_column(&key) {
            key.to_string()
        } else if key == "text" {
            text_input_column(artifact)?
        } else {
            return Err(HarrierError::invalid_input(format!(
                "unknown parameter '{key}'"
            )));
        };

        let column_type = artifact
            .schema
            .get_column(&column)
            .map(|c| c.column_type)
            .unwrap_or(ColumnType::Text);
        let typed = coerce(&value, column_type).ok_or_else(|| {
            HarrierError::invalid_input(format!(
                "parameter '{column}' value '{value}' is not a valid {column_type}"
            ))
        })?;
        row.set(column, typed);
    }

    Ok(row)
}

/// The first pipeline-required input column declared as text. Also used by
/// the CLI `predict --text` shorthand.
pub(crate) fn text_input_column(artifact: &Artifact) -> Result<String> {
    artifact
        .pipeline
        .required_input_columns()
        .into_iter()
        .find(|name| {
            artifact
                .schema
                .get_column(name)
                .is_some_and(|c| c.column_type == ColumnType::Text)
        })
        .map(|name| name.to_string())
        .ok_or_else(|| {
            HarrierError::invalid_input("this model has no text input; pass named fields")
        })
}
