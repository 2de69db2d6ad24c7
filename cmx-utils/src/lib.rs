//! Shared utility functions for CMX crates.

/// Metric name encoding for backend query strings.
///
/// Metric names are free-form strings coming from the backend (`RMSE`,
/// `Bias (%)`, `Q95/Q05`, ...). They are percent-encoded when placed in a
/// query string and decoded before display or comparison.
pub mod metric {
    use std::borrow::Cow;

    /// Percent-encode a metric name for use as a query parameter value.
    pub fn encode(metric: &str) -> Cow<'_, str> {
        urlencoding::encode(metric)
    }

    /// Decode a percent-encoded metric name.
    ///
    /// Fails if the decoded bytes are not valid UTF-8.
    pub fn decode(encoded: &str) -> anyhow::Result<String> {
        Ok(urlencoding::decode(encoded)?.into_owned())
    }

    /// Decode a metric name, falling back to the raw value when it is not
    /// a valid percent-encoding.
    pub fn decode_lossy(encoded: &str) -> String {
        decode(encoded).unwrap_or_else(|_| encoded.to_string())
    }

}
