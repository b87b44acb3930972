use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::debug;

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

pub trait CensusClient {
    fn fetch(&self, fields: &[&str], year: i32) -> Result<RawTable, SyncError>;
}

#[derive(Clone)]
pub struct CensusHttpClient {
    client: Client,
    base_url: String,
    state_fips: String,
}

impl CensusHttpClient {
    pub fn new(
        base_url: &str,
        state_fips: &str,
        timeout: Duration,
        verify_tls: bool,
    ) -> Result<Self, SyncError> {
        let client = http_client(timeout, verify_tls)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            state_fips: state_fips.to_string(),
        })
    }

    pub fn profile_url(&self, fields: &[&str], year: i32) -> String {
        format!(
            "{}/{year}/acs/acs5/profile?get={}&for=county%20subdivision:*&in=state:{}&in=county:*",
            self.base_url,
            fields.join(","),
            self.state_fips
        )
    }
}

impl CensusClient for CensusHttpClient {
    fn fetch(&self, fields: &[&str], year: i32) -> Result<RawTable, SyncError> {
        let url = self.profile_url(fields, year);
        debug!(%url, "requesting ACS profile");
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        classify_response(status, &body, year)
    }
}

pub(crate) fn http_client(timeout: Duration, verify_tls: bool) -> Result<Client, SyncError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(&format!("census-sync/{}", env!("CARGO_PKG_VERSION")))
            .map_err(|err| SyncError::Transport(err.to_string()))?,
    );
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .danger_accept_invalid_certs(!verify_tls)
        .build()
        .map_err(|err| SyncError::Transport(err.to_string()))
}

/// Server errors abort the run. Any other status falls through to the body,
/// where a non-table reply marks the year as unpublished.
pub fn classify_response(status: u16, body: &str, year: i32) -> Result<RawTable, SyncError> {
    if (500..600).contains(&status) {
        return Err(SyncError::TransportStatus {
            status,
            message: body.to_string(),
        });
    }
    parse_table(body, year)
}

/// Parses a response body. Anything that is not a JSON array of arrays means
/// the year has not been published.
pub fn parse_table(body: &str, year: i32) -> Result<RawTable, SyncError> {
    let rows: Vec<Vec<Value>> =
        serde_json::from_str(body).map_err(|_| SyncError::DataUnavailable { year })?;
    let mut rows = rows.into_iter();
    let header = rows
        .next()
        .ok_or(SyncError::DataUnavailable { year })?
        .into_iter()
        .map(|cell| match cell {
            Value::String(name) => Ok(name),
            other => Err(SyncError::SchemaMismatch(format!(
                "header cell is not a string: {other}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rows = rows
        .enumerate()
        .map(|(index, row)| {
            if row.len() != header.len() {
                return Err(SyncError::SchemaMismatch(format!(
                    "row {} has {} cells, header has {}",
                    index + 1,
                    row.len(),
                    header.len()
                )));
            }
            row.into_iter().map(cell_text).collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RawTable { header, rows })
}

fn cell_text(cell: Value) -> Result<Option<String>, SyncError> {
    match cell {
        Value::Null => Ok(None),
        Value::String(text) => Ok(Some(text)),
        Value::Number(number) => Ok(Some(number.to_string())),
        other => Err(SyncError::SchemaMismatch(format!(
            "cell is not a scalar: {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn profile_url_lists_fields_and_region() {
        let client = CensusHttpClient::new(
            "https://api.census.gov/data/",
            "72",
            Duration::from_secs(5),
            true,
        )
        .unwrap();
        let url = client.profile_url(&["DP03_0051E", "DP03_0052E"], 2019);
        assert_eq!(
            url,
            "https://api.census.gov/data/2019/acs/acs5/profile?get=DP03_0051E,DP03_0052E\
             &for=county%20subdivision:*&in=state:72&in=county:*"
        );
    }

    #[test]
    fn server_error_is_transport_status() {
        let err = classify_response(503, "upstream unavailable", 2019).unwrap_err();
        assert_matches!(err, SyncError::TransportStatus { status: 503, message } if message == "upstream unavailable");
        let err = classify_response(500, "[[\"DP03_0051E\"]]", 2019).unwrap_err();
        assert_matches!(err, SyncError::TransportStatus { status: 500, .. });
    }

    #[test]
    fn not_found_html_is_unavailable() {
        let err = classify_response(404, "<html>404 Not Found</html>", 2024).unwrap_err();
        assert_matches!(err, SyncError::DataUnavailable { year: 2024 });
        let err = classify_response(200, "<html>unknown geography</html>", 2011).unwrap_err();
        assert_matches!(err, SyncError::DataUnavailable { year: 2011 });
    }

    #[test]
    fn ok_json_is_parsed() {
        let table = classify_response(200, r#"[["DP03_0051E","state"],["120","72"]]"#, 2019).unwrap();
        assert_eq!(table.header, vec!["DP03_0051E", "state"]);
        assert_eq!(table.rows.len(), 1);
    }

    #[test]
    fn html_body_is_unavailable() {
        let err = parse_table("<html>404 Not Found</html>", 2024).unwrap_err();
        assert_matches!(err, SyncError::DataUnavailable { year: 2024 });
    }

    #[test]
    fn json_object_is_unavailable() {
        let err = parse_table(r#"{"error": "unknown variable"}"#, 2013).unwrap_err();
        assert_matches!(err, SyncError::DataUnavailable { year: 2013 });
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let body = r#"[["DP03_0051E","state"],["120"]]"#;
        let err = parse_table(body, 2015).unwrap_err();
        assert_matches!(err, SyncError::SchemaMismatch(_));
    }

    #[test]
    fn numbers_and_nulls_are_kept() {
        let body = r#"[["DP03_0051E","DP03_0052E","state"],[120,null,"72"]]"#;
        let table = parse_table(body, 2015).unwrap();
        assert_eq!(table.header, vec!["DP03_0051E", "DP03_0052E", "state"]);
        assert_eq!(
            table.rows,
            vec![vec![Some("120".to_string()), None, Some("72".to_string())]]
        );
    }
}
