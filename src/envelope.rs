use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// The single result object written to stdout.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_name: Option<String>,
    /// Base64-encoded report workbook
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file: Option<String>,
}

impl ScrapeResponse {
    pub fn success(message: impl Into<String>, file_name: impl Into<String>, file: &[u8]) -> Self {
        Self {
            success: true,
            message: message.into(),
            file_name: Some(file_name.into()),
            file: Some(STANDARD.encode(file)),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            file_name: None,
            file: None,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decoded report bytes, if the response carries a file.
    pub fn decode_file(&self) -> Option<Vec<u8>> {
        self.file
            .as_deref()
            .and_then(|encoded| STANDARD.decode(encoded).ok())
    }

    /// Locate the response in captured stdout.
    ///
    /// Text printed before the payload is ignored. Messages may themselves
    /// contain `{`, so each candidate opening brace is tried from the end
    /// until one parses through to the end of the output.
    pub fn from_captured_output(output: &str) -> Result<Self> {
        let output = output.trim_end();
        let mut last_error = None;
        for (start, _) in output.rmatch_indices('{') {
            match serde_json::from_str(&output[start..]) {
                Ok(response) => return Ok(response),
                Err(e) => last_error = Some(e),
            }
        }
        match last_error {
            Some(e) => Err(e.into()),
            None => Ok(serde_json::from_str(output)?),
        }
    }
}
