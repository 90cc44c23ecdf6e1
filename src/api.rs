//! HTTP client for the camera's control endpoints.
//!
//! Parameter writes are fire-and-forget: the panel never blocks on the
//! camera, and a failed request is logged and superseded by the next
//! user-driven change.

use std::fmt;

use gloo_net::http::Request;
use serde::Deserialize;
use serde_json::json;
use wasm_bindgen_futures::spawn_local;

/// A camera parameter with its own control endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraParam {
    RedGain,
    BlueGain,
    AnalogueGain,
    /// Exposure time in microseconds.
    ExposureTime,
}

impl CameraParam {
    pub fn path(self) -> &'static str {
        match self {
            CameraParam::RedGain => "/red_gain",
            CameraParam::BlueGain => "/blue_gain",
            CameraParam::AnalogueGain => "/analogue_gain",
            CameraParam::ExposureTime => "/exposure_time",
        }
    }
}

/// Snapshot of the device state served by `GET /params`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CameraParams {
    pub analogue_gain: f64,
    /// (red, blue)
    pub colour_gains: (f64, f64),
    /// Microseconds.
    pub exposure_time: u32,
    pub resolution: (u32, u32),
}

#[derive(Debug)]
pub enum ApiError {
    Request(gloo_net::Error),
    Status(u16),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Request(err) => write!(f, "request failed: {err}"),
            ApiError::Status(code) => write!(f, "camera answered HTTP {code}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<gloo_net::Error> for ApiError {
    fn from(err: gloo_net::Error) -> Self {
        ApiError::Request(err)
    }
}

/// Client for the camera configuration server.
#[derive(Clone)]
pub struct CameraApi {
    base: String,
}

impl CameraApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    /// Post `{"value": v}` to the parameter's endpoint. Fire-and-forget:
    /// errors are logged, never retried.
    pub fn set_parameter(&self, param: CameraParam, value: f64) {
        let url = format!("{}{}", self.base, param.path());
        spawn_local(async move {
            if let Err(err) = post_json(&url, &json!({ "value": value })).await {
                log::error!("Setting {url} to {value} failed: {err}");
            }
        });
    }

    /// Ask the camera to capture and save a full-resolution frame.
    pub fn trigger_capture(&self) {
        let url = format!("{}/capture", self.base);
        spawn_local(async move {
            if let Err(err) = post_json(&url, &json!({})).await {
                log::error!("Capture request failed: {err}");
            }
        });
    }

    /// Fetch the camera's current parameters, used once at startup to
    /// seed the controls.
    pub async fn fetch_params(&self) -> Result<CameraParams, ApiError> {
        let url = format!("{}/params", self.base);
        let response = Request::get(&url).send().await?;
        if !response.ok() {
            return Err(ApiError::Status(response.status()));
        }
        Ok(response.json::<CameraParams>().await?)
    }
}

async fn post_json(url: &str, body: &serde_json::Value) -> Result<(), ApiError> {
    let response = Request::post(url).json(body)?.send().await?;
    if response.ok() {
        Ok(())
    } else {
        Err(ApiError::Status(response.status()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_paths() {
        assert_eq!(CameraParam::RedGain.path(), "/red_gain");
        assert_eq!(CameraParam::BlueGain.path(), "/blue_gain");
        assert_eq!(CameraParam::AnalogueGain.path(), "/analogue_gain");
        assert_eq!(CameraParam::ExposureTime.path(), "/exposure_time");
    }

    #[test]
    fn params_deserialize_from_device_json() {
        let params: CameraParams = serde_json::from_str(
            r#"{
                "analogue_gain": 1.0,
                "colour_gains": [1.5, 2.0],
                "exposure_time": 10000,
                "resolution": [2028, 1520]
            }"#,
        )
        .unwrap();
        assert_eq!(params.colour_gains, (1.5, 2.0));
        assert_eq!(params.exposure_time, 10_000);
    }
}
