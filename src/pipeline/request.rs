use crate::foundation::core::PressureToWorldZ;
use crate::foundation::error::{RollvarError, RollvarResult};

/// Request-key parameter carrying the two log-pressure mapping scalars as
/// `"<log_pBottom_hPa>/<deltaZ_per_logP>"`. The pipeline strips this key
/// before forwarding the request upstream.
pub const LOGP_SCALED_KEY: &str = "TRAJECTORY_ROLLVAR_LOGP_SCALED";

/// A string-encoded set of parameters identifying one unit of cacheable
/// work.
///
/// Keys are ordered and unique; `to_request_string` and `parse` round-trip,
/// so a request doubles as a deterministic cache key for the external
/// scheduler.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DataRequest {
    entries: Vec<(String, String)>,
}

impl DataRequest {
    /// An empty request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `KEY=VALUE;KEY=VALUE` encoded request.
    pub fn parse(encoded: &str) -> RollvarResult<Self> {
        let mut request = Self::new();
        for part in encoded.split(';').filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| RollvarError::request(format!("malformed entry `{part}`")))?;
            request.insert(key, value);
        }
        Ok(request)
    }

    /// Set a parameter, replacing any existing value for the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// The value for a key, if present.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the request carries a key.
    pub fn contains(&self, key: &str) -> bool {
        self.value(key).is_some()
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Deterministic `KEY=VALUE;...` encoding, the inverse of `parse`.
    pub fn to_request_string(&self) -> String {
        self.entries
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Parse the `"<log_pBottom_hPa>/<deltaZ_per_logP>"` mapping value.
pub fn parse_logp_mapping(value: &str) -> RollvarResult<PressureToWorldZ> {
    let (log_p, slope) = value.split_once('/').ok_or_else(|| {
        RollvarError::request(format!(
            "mapping value `{value}` must be `<log_pBottom_hPa>/<deltaZ_per_logP>`"
        ))
    })?;
    let log_p_bottom_hpa: f64 = log_p
        .trim()
        .parse()
        .map_err(|_| RollvarError::request(format!("invalid log_pBottom_hPa `{log_p}`")))?;
    let delta_z_per_log_p: f64 = slope
        .trim()
        .parse()
        .map_err(|_| RollvarError::request(format!("invalid deltaZ_per_logP `{slope}`")))?;
    Ok(PressureToWorldZ {
        log_p_bottom_hpa,
        delta_z_per_log_p,
    })
}

/// Split a request into the mapping parameters and the stripped request to
/// forward upstream.
pub(crate) fn split_request(
    request: &DataRequest,
) -> RollvarResult<(PressureToWorldZ, DataRequest)> {
    let mut forward = request.clone();
    let value = forward
        .remove(LOGP_SCALED_KEY)
        .ok_or_else(|| RollvarError::request(format!("missing key {LOGP_SCALED_KEY}")))?;
    let mapping = parse_logp_mapping(&value)?;
    Ok((mapping, forward))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/request.rs"]
mod tests;
