//! Application-level configuration constants.

// Camera device addresses
pub const CAMERA_HOST: &str = "vaflya.local";
pub const CONTROL_PORT: u16 = 4500;
pub const STREAM_PORT: u16 = 5000;

// UI behavior
pub const POST_DEBOUNCE_MS: u32 = 150;

// Image stream pacing
pub const MAX_FPS: f64 = 25.0;
pub const MIN_FRAME_INTERVAL_MS: f64 = 1000.0 / MAX_FPS;
pub const FETCH_RETRY_MS: u32 = 500;
pub const WATCHDOG_TICK_MS: u32 = 1000;
pub const WATCHDOG_STALL_MS: f64 = 2000.0;

// Control ranges: colour gains are linear, analogue gain is linear,
// exposure runs on the exponential scale in seconds (1/8000 s to 32 s).
pub const COLOUR_GAIN_MIN: f64 = 0.0;
pub const COLOUR_GAIN_MAX: f64 = 8.0;
pub const ANALOGUE_GAIN_MIN: f64 = 1.0;
pub const ANALOGUE_GAIN_MAX: f64 = 16.0;
pub const EXPOSURE_MIN_SECS: f64 = 0.000125;
pub const EXPOSURE_MAX_SECS: f64 = 32.0;

pub fn control_base() -> String {
    format!("http://{CAMERA_HOST}:{CONTROL_PORT}")
}

pub fn stream_base() -> String {
    format!("http://{CAMERA_HOST}:{STREAM_PORT}")
}
