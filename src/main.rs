//! Camera control panel: entry point and page controller.
//!
//! Wires the slider widgets, the control API client, the live image loop
//! and the theme switch into one Yew component tree. Everything the old
//! page kept in module-level globals (frame counters, in-flight flags,
//! debounce timers) lives in this component's state and dies with it.

use std::cell::Cell;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use gloo_utils::document;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, HtmlImageElement};
use yew::prelude::*;

use gravicam_panel::SliderChange;

mod api;
mod components;
mod config;
mod hooks;
mod stream;
mod utils;
mod widget;

use api::{CameraApi, CameraParam};
use components::{CaptureButton, ControlRow, StreamStatsView, ThemeSwitch};
use config::{
    ANALOGUE_GAIN_MAX, ANALOGUE_GAIN_MIN, COLOUR_GAIN_MAX, COLOUR_GAIN_MIN, EXPOSURE_MAX_SECS,
    EXPOSURE_MIN_SECS, POST_DEBOUNCE_MS,
};
use hooks::use_validated_input;
use stream::{ImageStream, StreamStats};
use utils::{load_theme, micros_to_secs, parse_exposure_secs, secs_to_micros, store_theme};
use widget::{ensure_styles, SliderWidget};

/// Create a debounced callback that cancels any previous pending call.
fn debounce_callback<T: 'static>(
    timer_handle: &UseStateHandle<Option<Timeout>>,
    callback: Callback<T>,
    value: T,
    delay_ms: u32,
) {
    let timer_handle_clone = timer_handle.clone();
    let handle = Timeout::new(delay_ms, move || {
        callback.emit(value);
        timer_handle_clone.set(None);
    });
    // Replacing the handle drops (and thereby cancels) the old timer.
    timer_handle.set(Some(handle));
}

/// The slider widgets owned by the page, built on mount and destroyed on
/// teardown.
#[derive(Default)]
struct PanelSliders {
    red: Option<Rc<SliderWidget>>,
    blue: Option<Rc<SliderWidget>>,
    analogue: Option<Rc<SliderWidget>>,
    exposure: Option<Rc<SliderWidget>>,
}

impl PanelSliders {
    fn all(&self) -> [&Option<Rc<SliderWidget>>; 4] {
        [&self.red, &self.blue, &self.analogue, &self.exposure]
    }
}

/// Primary application component wiring state, effects, and UI elements.
#[function_component(Main)]
fn main_component() -> Html {
    let theme = use_state(load_theme);
    let stats = use_state(StreamStats::default);

    // Host elements for the imperative widgets
    let red_host = use_node_ref();
    let blue_host = use_node_ref();
    let analogue_host = use_node_ref();
    let exposure_host = use_node_ref();
    let image_ref = use_node_ref();

    let sliders = use_mut_ref(PanelSliders::default);
    // Set while programmatically seeding sliders so their change
    // notifications update readouts without posting back to the camera.
    let seeding = use_mut_ref(|| Cell::new(false));

    let api = CameraApi::new(config::control_base());

    // Formatted value readouts next to each label
    let red_readout = use_state(String::new);
    let blue_readout = use_state(String::new);
    let analogue_readout = use_state(String::new);
    let exposure_readout = use_state(String::new);

    // One debounce timer per parameter so adjusting one gain never
    // swallows another's pending post
    let red_timer = use_state(|| None::<Timeout>);
    let blue_timer = use_state(|| None::<Timeout>);
    let analogue_timer = use_state(|| None::<Timeout>);
    let exposure_timer = use_state(|| None::<Timeout>);

    let post_param = {
        let api = api.clone();
        Callback::from(move |(param, value): (CameraParam, f64)| {
            api.set_parameter(param, value);
        })
    };

    // Exposure also takes committed text entry ("1/250", "10ms", "0.5")
    let exposure_commit = {
        let sliders = sliders.clone();
        Callback::from(move |secs: f64| {
            let widget = sliders.borrow().exposure.clone();
            if let Some(widget) = widget {
                if (widget.value() - secs).abs() > f64::EPSILON {
                    widget.set_value(secs);
                }
            }
        })
    };
    let exposure_input = use_validated_input(
        micros_to_secs(10_000),
        |raw| parse_exposure_secs(raw),
        |secs: &f64| secs.to_string(),
        exposure_commit,
    );

    // Build the widgets once the host divs exist; tear them down with the
    // component.
    {
        let red_host = red_host.clone();
        let blue_host = blue_host.clone();
        let analogue_host = analogue_host.clone();
        let exposure_host = exposure_host.clone();
        let sliders = sliders.clone();
        let seeding = seeding.clone();
        let api = api.clone();
        let post_param = post_param.clone();
        let red_readout = red_readout.clone();
        let blue_readout = blue_readout.clone();
        let analogue_readout = analogue_readout.clone();
        let exposure_readout = exposure_readout.clone();
        let red_timer = red_timer.clone();
        let blue_timer = blue_timer.clone();
        let analogue_timer = analogue_timer.clone();
        let exposure_timer = exposure_timer.clone();
        let exposure_set_text = exposure_input.set_value.clone();

        use_effect_with((), move |_| {
            ensure_styles();

            let gain_handler = |param: CameraParam,
                               readout: UseStateHandle<String>,
                               timer: UseStateHandle<Option<Timeout>>|
             -> Rc<dyn Fn(SliderChange)> {
                let post = post_param.clone();
                let seeding = seeding.clone();
                Rc::new(move |change: SliderChange| {
                    readout.set(change.formatted.clone());
                    if !seeding.borrow().get() {
                        debounce_callback(
                            &timer,
                            post.clone(),
                            (param, change.value),
                            POST_DEBOUNCE_MS,
                        );
                    }
                })
            };

            let exposure_handler: Rc<dyn Fn(SliderChange)> = {
                let post = post_param.clone();
                let seeding = seeding.clone();
                let readout = exposure_readout.clone();
                let timer = exposure_timer.clone();
                let set_text = exposure_set_text.clone();
                Rc::new(move |change: SliderChange| {
                    readout.set(format!("{} s", change.formatted));
                    set_text.emit(change.value);
                    if !seeding.borrow().get() {
                        // the device wants whole microseconds
                        let wire = f64::from(secs_to_micros(change.value));
                        debounce_callback(
                            &timer,
                            post.clone(),
                            (CameraParam::ExposureTime, wire),
                            POST_DEBOUNCE_MS,
                        );
                    }
                })
            };

            let mount = |host: &NodeRef, handler: Rc<dyn Fn(SliderChange)>, initial: f64| {
                let host = host.cast::<Element>()?;
                let widget = SliderWidget::mount(&host);
                widget.set_on_change(handler);
                widget.set_value(initial);
                Some(widget)
            };

            // Device defaults until /params answers
            seeding.borrow().set(true);
            {
                let mut panel = sliders.borrow_mut();
                panel.red = mount(
                    &red_host,
                    gain_handler(CameraParam::RedGain, red_readout, red_timer),
                    1.0,
                );
                panel.blue = mount(
                    &blue_host,
                    gain_handler(CameraParam::BlueGain, blue_readout, blue_timer),
                    1.0,
                );
                panel.analogue = mount(
                    &analogue_host,
                    gain_handler(CameraParam::AnalogueGain, analogue_readout, analogue_timer),
                    1.0,
                );
                panel.exposure = mount(&exposure_host, exposure_handler, micros_to_secs(10_000));
            }
            seeding.borrow().set(false);

            // Seed the controls from the camera's actual state
            {
                let api = api.clone();
                let sliders = sliders.clone();
                let seeding = seeding.clone();
                spawn_local(async move {
                    match api.fetch_params().await {
                        Ok(params) => {
                            log::info!(
                                "Camera online: {}x{}, exposure {} us",
                                params.resolution.0,
                                params.resolution.1,
                                params.exposure_time
                            );
                            let panel = sliders.borrow();
                            seeding.borrow().set(true);
                            if let Some(w) = &panel.red {
                                w.set_value(params.colour_gains.0);
                            }
                            if let Some(w) = &panel.blue {
                                w.set_value(params.colour_gains.1);
                            }
                            if let Some(w) = &panel.analogue {
                                w.set_value(params.analogue_gain);
                            }
                            if let Some(w) = &panel.exposure {
                                w.set_value(micros_to_secs(params.exposure_time));
                            }
                            seeding.borrow().set(false);
                        }
                        Err(err) => {
                            log::warn!("Could not read camera state, keeping defaults: {err}");
                        }
                    }
                });
            }

            let sliders = sliders.clone();
            move || {
                for widget in sliders.borrow().all().into_iter().flatten() {
                    widget.destroy();
                }
            }
        });
    }

    // Live image loop, started on mount and stopped on teardown
    {
        let image_ref = image_ref.clone();
        let stats = stats.clone();
        use_effect_with((), move |_| {
            let on_stats = Callback::from(move |s: StreamStats| stats.set(s));
            let stream = image_ref
                .cast::<HtmlImageElement>()
                .map(|image| ImageStream::new(image, config::stream_base(), on_stats));
            if let Some(stream) = &stream {
                stream.start();
            } else {
                log::error!("Live view image element missing");
            }
            move || {
                if let Some(stream) = &stream {
                    stream.stop();
                }
            }
        });
    }

    // Apply and persist the theme
    {
        let theme_value = *theme;
        use_effect_with(theme_value, move |&theme| {
            if let Some(body) = document().body() {
                body.set_class_name(theme.body_class());
            }
            || ()
        });
    }

    let on_theme_toggle = {
        let theme = theme.clone();
        Callback::from(move |_| {
            let next = theme.toggled();
            store_theme(next);
            theme.set(next);
        })
    };

    let on_capture = {
        let api = api.clone();
        let exposure_secs = exposure_input.value;
        Callback::from(move |_| {
            log::debug!("Capture requested at {exposure_secs} s exposure");
            api.trigger_capture();
        })
    };

    html! {
        <div class="container">
            <header class="panel-header">
                <h1>{ "gravicam" }</h1>
                <ThemeSwitch theme={*theme} ontoggle={on_theme_toggle} />
            </header>

            <div class="live-view">
                <img id="screen" ref={image_ref} alt="live view" />
                <StreamStatsView stats={*stats} />
            </div>

            <div class="controls">
                <ControlRow
                    label="Red gain"
                    host_ref={red_host}
                    min_value={COLOUR_GAIN_MIN}
                    max_value={COLOUR_GAIN_MAX}
                    scale="linear"
                    readout={(*red_readout).clone()}
                />
                <ControlRow
                    label="Blue gain"
                    host_ref={blue_host}
                    min_value={COLOUR_GAIN_MIN}
                    max_value={COLOUR_GAIN_MAX}
                    scale="linear"
                    readout={(*blue_readout).clone()}
                />
                <ControlRow
                    label="Analogue gain"
                    host_ref={analogue_host}
                    min_value={ANALOGUE_GAIN_MIN}
                    max_value={ANALOGUE_GAIN_MAX}
                    scale="linear"
                    readout={(*analogue_readout).clone()}
                />
                <ControlRow
                    label="Exposure"
                    host_ref={exposure_host}
                    min_value={EXPOSURE_MIN_SECS}
                    max_value={EXPOSURE_MAX_SECS}
                    scale="exponential"
                    readout={(*exposure_readout).clone()}
                >
                    <input
                        type="text"
                        class={if exposure_input.error.is_some() { "exposure-entry invalid" } else { "exposure-entry" }}
                        placeholder="1/250, 10ms, 0.5"
                        value={exposure_input.text.clone()}
                        oninput={exposure_input.on_text_input.clone()}
                        onchange={exposure_input.on_commit.clone()}
                        onkeydown={exposure_input.on_keydown.clone()}
                    />
                    if let Some(ref err) = exposure_input.error {
                        <div class="input-error">{ err }</div>
                    }
                </ControlRow>

                <CaptureButton onclick={on_capture} />
            </div>
        </div>
    }
}

/// Entry point: logging, panic hook, renderer.
fn main() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    yew::Renderer::<Main>::new().render();
}
