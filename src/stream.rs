//! Polling loop feeding the live view image element.
//!
//! The camera serves single frames as data-URL strings; the loop fetches
//! them back-to-back with a minimum inter-frame interval (25 fps cap), an
//! in-flight guard against overlapping requests, a fixed 500 ms backoff
//! on errors, and a watchdog that restarts a stalled loop. All the
//! formerly page-global counters live on this object so the loop dies
//! with its owner.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_net::http::Request;
use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlImageElement;
use yew::Callback;

use crate::config::{
    FETCH_RETRY_MS, MIN_FRAME_INTERVAL_MS, WATCHDOG_STALL_MS, WATCHDOG_TICK_MS,
};

/// Running counters for the stream readout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StreamStats {
    pub frames: u64,
    pub bytes: u64,
    pub last_latency_ms: u32,
}

/// Delay before the next fetch so that fetch starts stay at least
/// `min_interval` ms apart.
pub fn frame_delay_ms(now: f64, last_fetch_start: f64, min_interval: f64) -> u32 {
    (min_interval - (now - last_fetch_start)).max(0.0).round() as u32
}

/// Whether the watchdog should issue a fetch: nothing completed for
/// `stall_ms` and no request is currently live.
pub fn watchdog_should_refetch(
    now: f64,
    last_completed: f64,
    in_flight: bool,
    stall_ms: f64,
) -> bool {
    !in_flight && now - last_completed > stall_ms
}

pub struct ImageStream {
    image: HtmlImageElement,
    base: String,
    running: Cell<bool>,
    in_flight: Cell<bool>,
    last_fetch_start: Cell<f64>,
    /// Last time any fetch finished, success or error. The watchdog
    /// compares against this so persistent errors keep their 500 ms
    /// rhythm instead of stacking watchdog fetches on top.
    last_completed: Cell<f64>,
    stats: Cell<StreamStats>,
    pending: RefCell<Option<Timeout>>,
    watchdog: RefCell<Option<Interval>>,
    on_stats: Callback<StreamStats>,
}

impl ImageStream {
    pub fn new(image: HtmlImageElement, base: String, on_stats: Callback<StreamStats>) -> Rc<Self> {
        Rc::new(Self {
            image,
            base,
            running: Cell::new(false),
            in_flight: Cell::new(false),
            last_fetch_start: Cell::new(0.0),
            last_completed: Cell::new(0.0),
            stats: Cell::new(StreamStats::default()),
            pending: RefCell::new(None),
            watchdog: RefCell::new(None),
            on_stats,
        })
    }

    /// Begin polling: one immediate fetch plus the reconnect watchdog.
    pub fn start(self: &Rc<Self>) {
        if self.running.replace(true) {
            return;
        }
        self.last_completed.set(js_sys::Date::now());

        let stream = Rc::clone(self);
        *self.watchdog.borrow_mut() = Some(Interval::new(WATCHDOG_TICK_MS, move || {
            let now = js_sys::Date::now();
            if watchdog_should_refetch(
                now,
                stream.last_completed.get(),
                stream.in_flight.get(),
                WATCHDOG_STALL_MS,
            ) {
                log::warn!("Image stream stalled, reconnecting");
                stream.fetch_frame();
            }
        }));

        self.fetch_frame();
    }

    /// Halt polling. A response already in flight is ignored when it
    /// lands.
    pub fn stop(&self) {
        self.running.set(false);
        self.pending.borrow_mut().take();
        self.watchdog.borrow_mut().take();
    }

    fn fetch_frame(self: &Rc<Self>) {
        if !self.running.get() || self.in_flight.get() {
            return;
        }
        self.in_flight.set(true);
        let started = js_sys::Date::now();
        self.last_fetch_start.set(started);

        let stream = Rc::clone(self);
        let url = format!("{}/c?{}", self.base, started as u64);
        spawn_local(async move {
            let result = match Request::get(&url).send().await {
                Ok(response) => response.text().await,
                Err(err) => Err(err),
            };
            let now = js_sys::Date::now();
            stream.in_flight.set(false);
            // update on error too, so a dead camera is retried on the
            // backoff timer rather than hammered by the watchdog
            stream.last_completed.set(now);
            if !stream.running.get() {
                return;
            }
            match result {
                Ok(data_url) => {
                    if !data_url.starts_with("data:image") {
                        log::debug!("Unexpected frame payload prefix");
                    }
                    stream.image.set_src(&data_url);
                    let mut stats = stream.stats.get();
                    stats.frames += 1;
                    stats.bytes += data_url.len() as u64;
                    stats.last_latency_ms = (now - started).max(0.0) as u32;
                    stream.stats.set(stats);
                    stream.on_stats.emit(stats);
                    stream.schedule_next();
                }
                Err(err) => {
                    log::error!("Frame fetch failed: {err}");
                    stream.schedule_retry();
                }
            }
        });
    }

    fn schedule_next(self: &Rc<Self>) {
        let delay = frame_delay_ms(
            js_sys::Date::now(),
            self.last_fetch_start.get(),
            MIN_FRAME_INTERVAL_MS,
        );
        let stream = Rc::clone(self);
        *self.pending.borrow_mut() = Some(Timeout::new(delay, move || {
            stream.fetch_frame();
        }));
    }

    fn schedule_retry(self: &Rc<Self>) {
        let stream = Rc::clone(self);
        *self.pending.borrow_mut() = Some(Timeout::new(FETCH_RETRY_MS, move || {
            stream.fetch_frame();
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pacing_enforces_the_frame_interval() {
        // fetch finished instantly: wait out the full interval
        assert_eq!(frame_delay_ms(1000.0, 1000.0, 40.0), 40);
        // fetch took longer than the interval: go again immediately
        assert_eq!(frame_delay_ms(1100.0, 1000.0, 40.0), 0);
        // partial interval elapsed
        assert_eq!(frame_delay_ms(1025.0, 1000.0, 40.0), 15);
    }

    #[test]
    fn watchdog_fires_only_when_stalled_and_idle() {
        // fresh completion: no refetch
        assert!(!watchdog_should_refetch(3000.0, 1500.0, false, 2000.0));
        // stalled and idle: refetch
        assert!(watchdog_should_refetch(4000.0, 1500.0, false, 2000.0));
        // stalled but a request is live: leave it alone
        assert!(!watchdog_should_refetch(4000.0, 1500.0, true, 2000.0));
    }
}
