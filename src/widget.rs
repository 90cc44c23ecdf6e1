//! DOM half of the custom slider control.
//!
//! A slider is a plain widget object mounted into a host element: it
//! builds its own viewport/body/tick subtree, installs its own pointer
//! listeners and runs inertia on animation frames. It is not a custom
//! element — the host page composes it and talks to it through
//! [`SliderWidget::set_value`] / [`SliderWidget::value`] and a change
//! callback. All numeric mapping is delegated to the library crate.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use gloo_events::{EventListener, EventListenerOptions, EventListenerPhase};
use gloo_render::{request_animation_frame, AnimationFrame};
use gloo_utils::document;
use wasm_bindgen::JsCast;
use web_sys::{Element, Event, MouseEvent, TouchEvent};

use gravicam_panel::{
    drag_velocity, format_value, inertia_active, inertia_step, SliderChange, SliderSpec,
};

const STYLE_ELEMENT_ID: &str = "cam-slider-styles";

const STYLE_SHEET: &str = "
.cam-slider { display: block; position: relative; margin: 20px 0; }
.slider-viewport { overflow: hidden; position: relative; background: var(--slider-bg, #f5f5f5); border-radius: 6px; box-shadow: 0 1px 4px rgba(0,0,0,0.1); }
.slider-body { height: 30px; position: relative; touch-action: none; cursor: grab; }
.slider-tick { width: 1px; height: 15px; background: #aaa; position: absolute; top: 8px; border-radius: 1px; }
.slider-tick.major { height: 22px; width: 2px; background: #666; top: 4px; }
.tick-label { position: absolute; bottom: -15px; transform: translateX(-50%); font-size: 9px; color: #666; white-space: nowrap; }
.centre-marker { position: absolute; width: 0; height: 0; left: 50%; z-index: 10; transform: translateX(-50%); }
.marker-top { top: 0; border-left: 5px solid transparent; border-right: 5px solid transparent; border-top: 5px solid #3498db; }
.marker-bottom { bottom: 0; border-left: 5px solid transparent; border-right: 5px solid transparent; border-bottom: 5px solid #3498db; }
";

/// Install the slider stylesheet once per document. Safe to call again;
/// later calls are no-ops.
pub fn ensure_styles() {
    let doc = document();
    if doc.get_element_by_id(STYLE_ELEMENT_ID).is_some() {
        return;
    }
    let Ok(style) = doc.create_element("style") else {
        return;
    };
    style.set_id(STYLE_ELEMENT_ID);
    style.set_text_content(Some(STYLE_SHEET));
    if let Some(head) = doc.head() {
        let _ = head.append_child(&style);
    }
}

#[derive(Default)]
struct DragState {
    dragging: bool,
    /// Pointer x at drag start.
    start_x: f64,
    /// Body offset at drag start.
    origin: f64,
    last_x: f64,
    /// 0.0 means no move sample yet this drag.
    last_move_ms: f64,
    velocity: f64,
}

pub struct SliderWidget {
    spec: SliderSpec,
    viewport: Element,
    body: Element,
    offset: Cell<f64>,
    drag: RefCell<DragState>,
    frame: RefCell<Option<AnimationFrame>>,
    listeners: RefCell<Vec<EventListener>>,
    on_change: RefCell<Option<Rc<dyn Fn(SliderChange)>>>,
}

impl SliderWidget {
    /// Build the slider into `host`, reading its configuration from the
    /// host's custom attributes (`viewport-width`, `multiplier`,
    /// `min-value`, `max-value`, `scale`, `tick-density`).
    pub fn mount(host: &Element) -> Rc<Self> {
        let spec = SliderSpec::from_attrs(|name| host.get_attribute(name));
        Self::mount_with_spec(host, spec)
    }

    pub fn mount_with_spec(host: &Element, spec: SliderSpec) -> Rc<Self> {
        let doc = document();
        let viewport = doc
            .create_element("div")
            .expect("create slider viewport");
        viewport.set_class_name("slider-viewport");
        let _ = viewport.set_attribute(
            "style",
            &format!("width: {}px;", spec.viewport_width),
        );

        let body = doc.create_element("div").expect("create slider body");
        body.set_class_name("slider-body");

        let tick_values = spec.tick_values();
        let spacing = spec.body_width() / (tick_values.len().saturating_sub(1).max(1)) as f64;
        for (i, value) in tick_values.iter().enumerate() {
            let tick = doc.create_element("div").expect("create tick");
            let major = i % 2 == 0;
            tick.set_class_name(if major { "slider-tick major" } else { "slider-tick" });
            let _ = tick.set_attribute("style", &format!("left: {}px;", i as f64 * spacing));
            if major {
                let label = doc.create_element("div").expect("create tick label");
                label.set_class_name("tick-label");
                label.set_text_content(Some(&format_value(*value)));
                let _ = tick.append_child(&label);
            }
            let _ = body.append_child(&tick);
        }

        for marker_class in ["centre-marker marker-top", "centre-marker marker-bottom"] {
            let marker = doc.create_element("div").expect("create marker");
            marker.set_class_name(marker_class);
            let _ = viewport.append_child(&marker);
        }
        // body below the markers so they stay visible
        let _ = viewport.insert_before(&body, viewport.first_child().as_ref());
        let _ = host.append_child(&viewport);

        let widget = Rc::new(Self {
            spec,
            viewport,
            body,
            offset: Cell::new(0.0),
            drag: RefCell::new(DragState::default()),
            frame: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
            on_change: RefCell::new(None),
        });
        widget.apply_offset(0.0);
        widget.install_listeners();
        widget
    }

    /// Register the change callback. Fires on every position mutation.
    pub fn set_on_change(&self, callback: Rc<dyn Fn(SliderChange)>) {
        *self.on_change.borrow_mut() = Some(callback);
    }

    /// Move the slider to `value`, clamped to the configured range.
    /// Cancels any running inertia, repositions the body and emits a
    /// change notification.
    pub fn set_value(&self, value: f64) {
        self.frame.borrow_mut().take();
        self.drag.borrow_mut().velocity = 0.0;
        self.apply_offset(self.spec.offset_of_value(value));
        self.emit_change();
    }

    /// Value implied by the current body position.
    pub fn value(&self) -> f64 {
        self.spec.value_at_offset(self.offset.get())
    }

    /// Position as 0–100.
    pub fn percentage(&self) -> f64 {
        self.spec.percentage_at(self.offset.get()) * 100.0
    }

    /// Remove listeners, cancel pending frames and detach the widget's
    /// DOM subtree from the host.
    pub fn destroy(&self) {
        self.listeners.borrow_mut().clear();
        self.frame.borrow_mut().take();
        self.on_change.borrow_mut().take();
        self.viewport.remove();
    }

    fn apply_offset(&self, offset: f64) {
        let clamped = self.spec.clamp_offset(offset);
        self.offset.set(clamped);
        let _ = self.body.set_attribute(
            "style",
            &format!("width: {}px; left: {clamped}px;", self.spec.body_width()),
        );
    }

    fn emit_change(&self) {
        let callback = self.on_change.borrow().clone();
        if let Some(callback) = callback {
            callback(SliderChange::at_offset(&self.spec, self.offset.get()));
        }
    }

    fn start_drag(&self, client_x: f64) {
        self.frame.borrow_mut().take();
        let mut drag = self.drag.borrow_mut();
        drag.dragging = true;
        drag.start_x = client_x;
        drag.origin = self.offset.get();
        drag.last_x = client_x;
        drag.last_move_ms = 0.0;
        drag.velocity = 0.0;
    }

    fn process_drag(&self, client_x: f64) {
        {
            let mut drag = self.drag.borrow_mut();
            if !drag.dragging {
                return;
            }
            let now = js_sys::Date::now();
            let next = drag.origin + (client_x - drag.start_x);
            // Only follow the pointer while the body stays in range; past
            // the edge the position holds still.
            if (-self.spec.travel()..=0.0).contains(&next) {
                self.apply_offset(next);
                if drag.last_move_ms > 0.0 {
                    if let Some(v) = drag_velocity(client_x - drag.last_x, now - drag.last_move_ms)
                    {
                        drag.velocity = v;
                    }
                }
            }
            drag.last_x = client_x;
            drag.last_move_ms = now;
        }
        self.emit_change();
    }

    fn end_drag(self: &Rc<Self>) {
        let velocity = {
            let mut drag = self.drag.borrow_mut();
            if !drag.dragging {
                return;
            }
            drag.dragging = false;
            drag.velocity
        };
        log::debug!("drag released at {:.1}% (velocity {velocity:.2})", self.percentage());
        if inertia_active(velocity) {
            self.schedule_inertia_frame();
        }
    }

    fn inertia_tick(self: &Rc<Self>) {
        let velocity = {
            let mut drag = self.drag.borrow_mut();
            let (next, v) = inertia_step(&self.spec, self.offset.get(), drag.velocity);
            self.apply_offset(next);
            drag.velocity = v;
            v
        };
        self.emit_change();
        if inertia_active(velocity) {
            self.schedule_inertia_frame();
        }
    }

    fn schedule_inertia_frame(self: &Rc<Self>) {
        let widget = Rc::clone(self);
        *self.frame.borrow_mut() = Some(request_animation_frame(move |_timestamp| {
            widget.frame.borrow_mut().take();
            widget.inertia_tick();
        }));
    }

    fn install_listeners(self: &Rc<Self>) {
        let mut listeners = Vec::new();
        let doc = document();
        // bubble-phase, passive off: the drag handlers call prevent_default
        fn active() -> EventListenerOptions {
            EventListenerOptions {
                phase: EventListenerPhase::Bubble,
                passive: false,
            }
        }

        let widget = Rc::clone(self);
        listeners.push(EventListener::new_with_options(
            &self.body,
            "mousedown",
            active(),
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<MouseEvent>() else {
                    return;
                };
                widget.start_drag(f64::from(event.client_x()));
                event.prevent_default();
            },
        ));

        let widget = Rc::clone(self);
        listeners.push(EventListener::new(&doc, "mousemove", move |event: &Event| {
            if let Some(event) = event.dyn_ref::<MouseEvent>() {
                widget.process_drag(f64::from(event.client_x()));
            }
        }));

        let widget = Rc::clone(self);
        listeners.push(EventListener::new(&doc, "mouseup", move |_event: &Event| {
            widget.end_drag();
        }));

        let widget = Rc::clone(self);
        listeners.push(EventListener::new_with_options(
            &self.body,
            "touchstart",
            active(),
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                if let Some(touch) = event.touches().get(0) {
                    widget.start_drag(f64::from(touch.client_x()));
                    event.prevent_default();
                }
            },
        ));

        let widget = Rc::clone(self);
        listeners.push(EventListener::new_with_options(
            &doc,
            "touchmove",
            active(),
            move |event: &Event| {
                let Some(event) = event.dyn_ref::<TouchEvent>() else {
                    return;
                };
                if let Some(touch) = event.touches().get(0) {
                    widget.process_drag(f64::from(touch.client_x()));
                    if widget.drag.borrow().dragging {
                        event.prevent_default();
                    }
                }
            },
        ));

        for done in ["touchend", "touchcancel"] {
            let widget = Rc::clone(self);
            listeners.push(EventListener::new(&doc, done, move |_event: &Event| {
                widget.end_drag();
            }));
        }

        *self.listeners.borrow_mut() = listeners;
    }
}
