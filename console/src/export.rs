//! Lead export to CSV

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info};

use crate::actions::dispatcher::ActionDispatcher;
use crate::authn::permissions::Capability;
use crate::errors::ConsoleError;
use crate::filesys::file::File;
use crate::http::client::RawBody;
use crate::http::response::{backend_message, GENERIC_FAILURE};
use crate::sync::query::ListQuery;

/// Bodies below this size hold at most a CSV header
pub const MIN_EXPORT_BYTES: usize = 50;

/// Export contents ready to be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl ExportBlob {
    /// Normalize a response body.
    ///
    /// Binary and text bodies are kept as they are. A JSON body that is a
    /// string, or an object with a string `data` field, is unwrapped first.
    /// Any other JSON object carries no CSV and is read as a backend error.
    pub fn from_body(body: RawBody) -> Result<Self, ConsoleError> {
        let is_json = body
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("json"));

        if is_json {
            match serde_json::from_slice::<Value>(&body.bytes) {
                Ok(Value::String(text)) => return Ok(Self::csv(text)),
                Ok(Value::Object(o)) => {
                    if let Some(Value::String(text)) = o.get("data") {
                        return Ok(Self::csv(text.clone()));
                    }
                    let message = backend_message(&Value::Object(o))
                        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                    return Err(ConsoleError::Backend {
                        status: None,
                        message,
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            bytes: body.bytes,
            content_type: body.content_type.unwrap_or_else(|| "text/csv".to_string()),
        })
    }

    fn csv(text: String) -> Self {
        Self {
            bytes: text.into_bytes(),
            content_type: "text/csv".to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reject header-only exports
    pub fn ensure_has_rows(&self, min_bytes: usize) -> Result<(), ConsoleError> {
        if self.len() < min_bytes {
            debug!("Export body is {} bytes, below {}", self.len(), min_bytes);
            return Err(ConsoleError::EmptyExport);
        }
        Ok(())
    }
}

/// `leads_export_<YYYY-MM-DD>.csv`
pub fn default_file_name(date: NaiveDate) -> String {
    format!("leads_export_{}.csv", date.format("%Y-%m-%d"))
}

/// Where and how to write exports
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub directory: PathBuf,
    pub min_bytes: usize,
}

impl ExportOptions {
    pub fn target(&self, explicit: Option<&Path>, today: NaiveDate) -> PathBuf {
        match explicit {
            Some(path) => path.to_path_buf(),
            None => self.directory.join(default_file_name(today)),
        }
    }
}

/// Export the leads matching `query`'s filters and write them to disk.
///
/// Nothing is written when the export is empty.
pub async fn export_leads(
    dispatcher: &ActionDispatcher,
    options: &ExportOptions,
    query: &ListQuery,
    explicit_path: Option<&Path>,
) -> Result<PathBuf, ConsoleError> {
    let notifier = dispatcher.notifier();
    if let Err(e) = dispatcher.permissions().require(Capability::ExportLeads) {
        notifier.error(e.user_message());
        return Err(e);
    }

    let result = async {
        let body = dispatcher
            .backend()
            .export_leads(&query.to_filter_params())
            .await?;
        let blob = ExportBlob::from_body(body)?;
        blob.ensure_has_rows(options.min_bytes)?;

        let target = options.target(explicit_path, chrono::Local::now().date_naive());
        File::new(&target).write_atomic(&blob.bytes).await?;
        Ok::<_, ConsoleError>((target, blob.len()))
    }
    .await;

    match result {
        Ok((target, size)) => {
            info!("Wrote {} bytes of leads to {}", size, target.display());
            notifier.success(format!("Leads exported to {}", target.display()));
            Ok(target)
        }
        Err(e) => {
            notifier.error(e.user_message());
            Err(e)
        }
    }
}
