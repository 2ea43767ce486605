//! Browser bindings: canvas surface, input listeners, animation frames
//!
//! Everything registered against the page is held by a guard and released on
//! `unmount()` or drop. Mount never throws into the host page: missing
//! window/canvas/context is logged and yields no handle.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use glam::Vec2;
use thiserror::Error;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, HtmlElement, KeyboardEvent,
    PointerEvent, Window,
};

use crate::config::EngineConfig;
use crate::driver::{FrameLoop, ScoreQueue};
use crate::renderer::{Color, Surface, TextStyle};
use crate::sim::{Action, Arcade, Phase, Rect, is_text_entry};

/// Reasons the widget could not be mounted
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("no window")]
    NoWindow,
    #[error("no document")]
    NoDocument,
    #[error("no element with id {0:?}")]
    NoCanvas(String),
    #[error("element {0:?} is not a canvas")]
    NotACanvas(String),
    #[error("2d context unavailable")]
    NoContext,
    #[error("javascript error: {0}")]
    Js(String),
}

impl From<JsValue> for PlatformError {
    fn from(value: JsValue) -> Self {
        PlatformError::Js(format!("{value:?}"))
    }
}

/// `Surface` over a 2D canvas context
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
    size: Vec2,
}

impl CanvasSurface {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, PlatformError> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or(PlatformError::NoContext)?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| PlatformError::NoContext)?;
        Ok(Self {
            ctx,
            size: Vec2::new(canvas.width() as f32, canvas.height() as f32),
        })
    }
}

impl Surface for CanvasSurface {
    fn size(&self) -> Vec2 {
        self.size
    }

    fn clear(&mut self, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx
            .fill_rect(0.0, 0.0, f64::from(self.size.x), f64::from(self.size.y));
    }

    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(
            f64::from(rect.pos.x),
            f64::from(rect.pos.y),
            f64::from(rect.size.x),
            f64::from(rect.size.y),
        );
    }

    fn fill_text(&mut self, text: &str, pos: Vec2, style: TextStyle) {
        self.ctx.set_fill_style_str(&style.color.to_css());
        self.ctx.set_font(&format!("{}px monospace", style.size));
        self.ctx.set_text_align(style.align.as_str());
        if let Err(e) = self.ctx.fill_text(text, f64::from(pos.x), f64::from(pos.y)) {
            log::trace!("fill_text failed: {:?}", e);
        }
    }
}

/// An event listener that is removed when released or dropped
struct ListenerGuard {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(Event)>,
    active: bool,
}

impl ListenerGuard {
    fn register(
        target: &EventTarget,
        kind: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<Self, PlatformError> {
        let closure = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            kind,
            closure,
            active: true,
        })
    }

    fn release(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Err(e) = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref())
        {
            log::warn!("failed to remove {} listener: {:?}", self.kind, e);
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.release();
    }
}

/// A pending `setTimeout`, cleared when released or dropped
struct TimeoutGuard {
    window: Window,
    handle: Option<i32>,
    _closure: Closure<dyn FnMut()>,
}

impl TimeoutGuard {
    fn schedule(
        window: &Window,
        delay_ms: u32,
        callback: impl FnMut() + 'static,
    ) -> Result<Self, PlatformError> {
        let closure = Closure::<dyn FnMut()>::new(callback);
        let handle = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay_ms.min(i32::MAX as u32) as i32,
        )?;
        Ok(Self {
            window: window.clone(),
            handle: Some(handle),
            _closure: closure,
        })
    }

    fn clear(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.window.clear_timeout_with_handle(handle);
        }
    }
}

impl Drop for TimeoutGuard {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Everything one mounted widget owns
struct Widget {
    window: Window,
    arcade: Box<dyn Arcade>,
    surface: CanvasSurface,
    frame_loop: FrameLoop,
    /// Canvas pixels per CSS pixel, for pointer coordinates
    pixel_scale: f32,
    raf_id: Option<i32>,
    listeners: Vec<ListenerGuard>,
    auto_close: Option<TimeoutGuard>,
}

impl Widget {
    /// Stop the loop and release every page registration.
    ///
    /// Closures stay owned by their guards until the mount is dropped, so
    /// this is safe to call from inside one of them.
    fn release(&mut self) {
        self.frame_loop.stop();
        if let Some(id) = self.raf_id.take() {
            if let Err(e) = self.window.cancel_animation_frame(id) {
                log::warn!("cancel_animation_frame failed: {:?}", e);
            }
        }
        for listener in &mut self.listeners {
            listener.release();
        }
        if let Some(timeout) = self.auto_close.as_mut() {
            timeout.clear();
        }
        self.arcade.input_mut().clear();
    }

    fn frame(&mut self) {
        let Widget {
            arcade,
            surface,
            frame_loop,
            ..
        } = self;
        frame_loop.frame(arcade.as_mut(), surface);
    }

    /// Tap or confirm key: start or restart when not playing
    fn confirm(&mut self) {
        if self.arcade.phase() != Phase::Playing {
            self.arcade.confirm();
        }
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// Frame bookkeeping shared by the mount and its frame closure
#[derive(Default)]
struct FrameState {
    /// Set while the frame closure is running
    in_frame: Cell<bool>,
    /// Set once torn down; the frame closure stops rescheduling
    closing: Cell<bool>,
    scores: ScoreQueue,
    on_score_change: Option<js_sys::Function>,
}

impl FrameState {
    /// Hand staged scores to the page. Must run with no widget borrow held:
    /// the page may read from or unmount the handle inside its callback.
    fn flush_scores(&self) {
        let Some(callback) = self.on_score_change.as_ref() else {
            return;
        };
        for score in self.scores.drain() {
            if let Err(e) = callback.call1(&JsValue::NULL, &JsValue::from(score)) {
                log::warn!("onScoreChange threw: {:?}", e);
            }
            if self.closing.get() {
                break;
            }
        }
    }
}

/// A mounted widget. Dropping it tears everything down.
struct Mount {
    window: Window,
    widget: Rc<RefCell<Widget>>,
    frame: Rc<FrameState>,
    frame_callback: FrameCallback,
}

impl Mount {
    fn teardown(&mut self) {
        self.frame.closing.set(true);
        match self.widget.try_borrow_mut() {
            Ok(mut widget) => widget.release(),
            Err(_) => log::warn!("arcade busy during teardown"),
        }

        // Breaks the frame closure's reference to itself
        let Some(closure) = self.frame_callback.borrow_mut().take() else {
            return;
        };
        if !self.frame.in_frame.get() {
            return;
        }
        // Unmounted from inside the frame closure (via onScoreChange): free it
        // after it returns
        let deferred = Closure::once_into_js(move || drop(closure));
        if let Err(e) = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(deferred.unchecked_ref(), 0)
        {
            log::warn!("could not defer frame callback release: {:?}", e);
        }
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        self.teardown();
        log::info!("arcade unmounted");
    }
}

fn request_frame(window: &Window, callback: &FrameCallback) -> Option<i32> {
    let callback = callback.borrow();
    let closure = callback.as_ref()?;
    match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
        Ok(id) => Some(id),
        Err(e) => {
            log::warn!("request_animation_frame failed: {:?}", e);
            None
        }
    }
}

/// Whether a key event came from a control that takes typed text
fn from_text_entry(event: &Event) -> bool {
    let Some(target) = event.target() else {
        return false;
    };
    if let Some(el) = target.dyn_ref::<HtmlElement>() {
        return is_text_entry(&el.tag_name(), el.is_content_editable());
    }
    false
}

fn keyboard_listeners(
    window: &Window,
    widget: &Weak<RefCell<Widget>>,
) -> Result<Vec<ListenerGuard>, PlatformError> {
    let target: &EventTarget = window.as_ref();

    let down = {
        let widget = widget.clone();
        ListenerGuard::register(target, "keydown", move |event: Event| {
            let Some(widget) = widget.upgrade() else { return };
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else { return };
            let text_entry = from_text_entry(&event);
            let mut w = widget.borrow_mut();
            if let Some(action) = w.arcade.input_mut().key_down(&key.code(), text_entry) {
                // Keep arrows and space from scrolling the page
                event.prevent_default();
                if action == Action::Confirm && !key.repeat() {
                    w.confirm();
                }
            }
        })?
    };

    let up = {
        let widget = widget.clone();
        ListenerGuard::register(target, "keyup", move |event: Event| {
            let Some(widget) = widget.upgrade() else { return };
            let Some(key) = event.dyn_ref::<KeyboardEvent>() else { return };
            let text_entry = from_text_entry(&event);
            widget
                .borrow_mut()
                .arcade
                .input_mut()
                .key_up(&key.code(), text_entry);
        })?
    };

    // Focus loss would otherwise leave keys stuck down
    let blur = {
        let widget = widget.clone();
        ListenerGuard::register(target, "blur", move |_event: Event| {
            if let Some(widget) = widget.upgrade() {
                widget.borrow_mut().arcade.input_mut().clear();
            }
        })?
    };

    Ok(vec![down, up, blur])
}

fn pointer_listeners(
    canvas: &HtmlCanvasElement,
    widget: &Weak<RefCell<Widget>>,
) -> Result<Vec<ListenerGuard>, PlatformError> {
    let target: &EventTarget = canvas.as_ref();

    let press = {
        let widget = widget.clone();
        ListenerGuard::register(target, "pointerdown", move |event: Event| {
            let Some(widget) = widget.upgrade() else { return };
            let Some(pointer) = event.dyn_ref::<PointerEvent>() else { return };
            event.prevent_default();
            let mut w = widget.borrow_mut();
            let x = pointer.offset_x() as f32 * w.pixel_scale;
            let width = w.surface.size().x;
            w.arcade.input_mut().pointer_hold(Action::from_touch_x(x, width));
            w.confirm();
        })?
    };

    let drag = {
        let widget = widget.clone();
        ListenerGuard::register(target, "pointermove", move |event: Event| {
            let Some(widget) = widget.upgrade() else { return };
            let Some(pointer) = event.dyn_ref::<PointerEvent>() else { return };
            if pointer.buttons() == 0 {
                return;
            }
            let mut w = widget.borrow_mut();
            let x = pointer.offset_x() as f32 * w.pixel_scale;
            let width = w.surface.size().x;
            w.arcade.input_mut().pointer_hold(Action::from_touch_x(x, width));
        })?
    };

    let mut guards = vec![press, drag];
    for kind in ["pointerup", "pointercancel", "pointerleave"] {
        let widget = widget.clone();
        guards.push(ListenerGuard::register(target, kind, move |_event: Event| {
            if let Some(widget) = widget.upgrade() {
                widget.borrow_mut().arcade.input_mut().pointer_release();
            }
        })?);
    }
    Ok(guards)
}

fn mount(
    canvas_id: &str,
    config: &EngineConfig,
    on_score_change: Option<js_sys::Function>,
) -> Result<Mount, PlatformError> {
    let window = web_sys::window().ok_or(PlatformError::NoWindow)?;
    let document = window.document().ok_or(PlatformError::NoDocument)?;
    let canvas = document
        .get_element_by_id(canvas_id)
        .ok_or_else(|| PlatformError::NoCanvas(canvas_id.to_owned()))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| PlatformError::NotACanvas(canvas_id.to_owned()))?;

    let (width, height) = config.playfield();
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);
    canvas.style().set_property("touch-action", "none")?;
    let client_width = canvas.client_width().max(1) as f32;
    let surface = CanvasSurface::new(&canvas)?;

    let frame = Rc::new(FrameState {
        on_score_change,
        ..FrameState::default()
    });
    let mut arcade = crate::build(config);
    if frame.on_score_change.is_some() {
        arcade.set_score_callback(frame.scores.sink());
    }

    let widget = Rc::new(RefCell::new(Widget {
        window: window.clone(),
        arcade,
        surface,
        frame_loop: FrameLoop::new(),
        pixel_scale: width / client_width,
        raf_id: None,
        listeners: Vec::new(),
        auto_close: None,
    }));
    let weak = Rc::downgrade(&widget);

    // Guards collected here are released by their Drop if a later step fails
    let mut listeners = keyboard_listeners(&window, &weak)?;
    listeners.extend(pointer_listeners(&canvas, &weak)?);

    let auto_close = match config.auto_close_ms {
        Some(delay) => {
            let weak = weak.clone();
            Some(TimeoutGuard::schedule(&window, delay, move || {
                if let Some(widget) = weak.upgrade() {
                    log::info!("arcade auto-closed");
                    widget.borrow_mut().release();
                }
            })?)
        }
        None => None,
    };

    let frame_callback: FrameCallback = Rc::new(RefCell::new(None));
    {
        let weak = weak.clone();
        let window = window.clone();
        let frame = frame.clone();
        let next = frame_callback.clone();
        *frame_callback.borrow_mut() = Some(Closure::<dyn FnMut(f64)>::new(move |_time: f64| {
            let running = {
                let Some(widget) = weak.upgrade() else { return };
                let Ok(mut w) = widget.try_borrow_mut() else { return };
                w.frame();
                w.frame_loop.is_running()
            };

            frame.in_frame.set(true);
            frame.flush_scores();
            frame.in_frame.set(false);
            if !running || frame.closing.get() {
                return;
            }

            let raf_id = request_frame(&window, &next);
            if let Some(widget) = weak.upgrade() {
                if let Ok(mut w) = widget.try_borrow_mut() {
                    w.raf_id = raf_id;
                }
            }
        }));
    }

    {
        let mut w = widget.borrow_mut();
        w.listeners = listeners;
        w.auto_close = auto_close;
        w.frame_loop.start();
        w.raf_id = request_frame(&window, &frame_callback);
    }

    log::info!(
        "arcade mounted on #{} ({}, seed {:?})",
        canvas_id,
        config.game,
        config.seed
    );
    Ok(Mount {
        window,
        widget,
        frame,
        frame_callback,
    })
}

/// JS handle to a mounted game
#[wasm_bindgen]
pub struct ArcadeHandle {
    mount: Option<Mount>,
}

#[wasm_bindgen]
impl ArcadeHandle {
    /// Stop the loop and remove every listener and timer. Idempotent, and
    /// safe to call from inside `onScoreChange`.
    pub fn unmount(&mut self) {
        self.mount.take();
    }

    pub fn score(&self) -> u32 {
        self.mount
            .as_ref()
            .and_then(|m| m.widget.try_borrow().ok().map(|w| w.arcade.score()))
            .unwrap_or(0)
    }

    pub fn phase(&self) -> String {
        let phase = self
            .mount
            .as_ref()
            .and_then(|m| m.widget.try_borrow().ok().map(|w| w.arcade.phase()))
            .unwrap_or_default();
        format!("{phase:?}")
    }
}

/// Mount a game on the canvas with id `canvas_id`.
///
/// `config_json` is an `EngineConfig` object (may be empty). Returns
/// `undefined` instead of throwing when the page cannot host the game.
#[wasm_bindgen(js_name = mountArcade)]
pub fn mount_arcade(
    canvas_id: &str,
    config_json: &str,
    on_score_change: Option<js_sys::Function>,
) -> Option<ArcadeHandle> {
    console_error_panic_hook::set_once();
    // Already initialised on a second mount
    let _ = console_log::init_with_level(log::Level::Info);

    let config = match EngineConfig::from_json(config_json) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("{e}; using defaults");
            EngineConfig::default()
        }
    };

    match mount(canvas_id, &config, on_score_change) {
        Ok(mount) => Some(ArcadeHandle { mount: Some(mount) }),
        Err(e) => {
            log::warn!("arcade not mounted: {e}");
            None
        }
    }
}
