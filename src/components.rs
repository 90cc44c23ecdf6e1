//! Pure Yew view components for the camera panel.
//!
//! These are stateless pieces rendering from props; all behaviour stays
//! in the page controller.

use yew::prelude::*;

use crate::stream::StreamStats;
use crate::utils::Theme;

/// Labelled host row for one slider control. The imperative slider
/// widget mounts into the `host_ref` div and reads its configuration
/// from the custom attributes rendered here.
#[derive(Properties, PartialEq)]
pub struct ControlRowProps {
    pub label: AttrValue,
    pub host_ref: NodeRef,
    pub min_value: f64,
    pub max_value: f64,
    /// `linear`, `exponential` or `logarithmic`.
    pub scale: AttrValue,
    /// Formatted current value, shown next to the label.
    pub readout: AttrValue,
    #[prop_or_default]
    pub children: Children,
}

#[function_component(ControlRow)]
pub fn control_row(props: &ControlRowProps) -> Html {
    html! {
        <div class="form-group">
            <label>
                { props.label.clone() }
                <span class="slider-value">{ props.readout.clone() }</span>
            </label>
            <div
                class="cam-slider"
                ref={props.host_ref.clone()}
                min-value={props.min_value.to_string()}
                max-value={props.max_value.to_string()}
                scale={props.scale.clone()}
            />
            { props.children.clone() }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ThemeSwitchProps {
    pub theme: Theme,
    pub ontoggle: Callback<()>,
}

/// Checkbox toggling light/dark page themes (checked = light, matching
/// the original control panel).
#[function_component(ThemeSwitch)]
pub fn theme_switch(props: &ThemeSwitchProps) -> Html {
    let ontoggle = props.ontoggle.clone();
    html! {
        <label class="theme-switch">
            <input type="checkbox"
                checked={props.theme == Theme::Light}
                onchange={Callback::from(move |_| ontoggle.emit(()))}
            />
            { "Light theme" }
        </label>
    }
}

#[derive(Properties, PartialEq)]
pub struct CaptureButtonProps {
    pub onclick: Callback<()>,
}

#[function_component(CaptureButton)]
pub fn capture_button(props: &CaptureButtonProps) -> Html {
    let onclick = props.onclick.clone();
    html! {
        <button class="capture-button" onclick={Callback::from(move |_| onclick.emit(()))}>
            { "Capture" }
        </button>
    }
}

#[derive(Properties, PartialEq)]
pub struct StreamStatsViewProps {
    pub stats: StreamStats,
}

/// One-line stream health readout under the live view.
#[function_component(StreamStatsView)]
pub fn stream_stats_view(props: &StreamStatsViewProps) -> Html {
    let stats = &props.stats;
    let transferred = stats.bytes as f64 / (1024.0 * 1024.0);
    html! {
        <div class="stream-stats">
            { format!(
                "{} frames · {:.1} MiB · {} ms",
                stats.frames, transferred, stats.last_latency_ms
            ) }
        </div>
    }
}
