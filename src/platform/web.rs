//! Browser backend: canvas 2D surface, requestAnimationFrame, LocalStorage
//!
//! `mount` wires one game to one canvas and returns a `GameHandle`. The
//! handle owns every listener and the frame callback; `unmount` (or dropping
//! the handle) cancels the pending frame and removes all listeners.

use std::cell::RefCell;
use std::f64::consts::TAU;
use std::rc::{Rc, Weak};

use glam::Vec2;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    CanvasRenderingContext2d, Event, EventTarget, HtmlCanvasElement, HtmlElement,
    HtmlImageElement, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, KeyboardEvent,
    MouseEvent, Storage, TouchEvent, Window,
};

use crate::driver::{Driver, FrameHandle, FrameScheduler, FrameSlot, LoopPhase};
use crate::error::{ArcadeError, Result};
use crate::games;
use crate::highscores::ScoreStore;
use crate::renderer::{Backdrop, Color, Surface};
use crate::settings::Settings;
use crate::sim::{GameRules, Key, KeyRouting, RawInput, route_key};

/// Canvas 2D context drawing in playfield coordinates
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    field: Vec2,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement, field: Vec2) -> Result<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(ArcadeError::SurfaceUnavailable)?;
        Ok(Self { canvas, ctx, field })
    }

    /// Canvas CSS box to playfield coordinates
    fn to_field(&self, client_x: f64, client_y: f64) -> (f32, f32) {
        let rect = self.canvas.get_bounding_client_rect();
        let sx = self.field.x as f64 / rect.width().max(1.0);
        let sy = self.field.y as f64 / rect.height().max(1.0);
        (
            ((client_x - rect.left()) * sx) as f32,
            ((client_y - rect.top()) * sy) as f32,
        )
    }
}

impl Surface for CanvasSurface {
    type Image = HtmlImageElement;

    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn clear(&mut self, color: Color) {
        let size = self.size();
        let _ = self.ctx.set_transform(
            (size.x / self.field.x) as f64,
            0.0,
            0.0,
            (size.y / self.field.y) as f64,
            0.0,
            0.0,
        );
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(0.0, 0.0, self.field.x as f64, self.field.y as f64);
    }

    fn draw_image(&mut self, image: &HtmlImageElement) {
        if let Err(e) = self.ctx.draw_image_with_html_image_element_and_dw_and_dh(
            image,
            0.0,
            0.0,
            self.field.x as f64,
            self.field.y as f64,
        ) {
            log::debug!("draw_image failed: {:?}", e);
        }
    }

    fn fill_rect(&mut self, center: Vec2, size: Vec2, color: Color) {
        let min = center - size * 0.5;
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.fill_rect(min.x as f64, min.y as f64, size.x as f64, size.y as f64);
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.begin_path();
        if self
            .ctx
            .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU)
            .is_ok()
        {
            self.ctx.fill();
        }
    }

    fn fill_text(&mut self, pos: Vec2, text: &str, size_px: f32, color: Color) {
        self.ctx.set_fill_style_str(&color.to_css());
        self.ctx.set_font(&format!("{}px sans-serif", size_px.round()));
        let _ = self.ctx.fill_text(text, pos.x as f64, pos.y as f64);
    }
}

/// `requestAnimationFrame` with one persistent callback
pub struct RafScheduler {
    window: Window,
    callback: Closure<dyn FnMut(f64)>,
    slot: FrameSlot,
}

impl RafScheduler {
    pub fn new(window: Window, callback: Closure<dyn FnMut(f64)>, slot: FrameSlot) -> Self {
        Self {
            window,
            callback,
            slot,
        }
    }
}

impl FrameScheduler for RafScheduler {
    fn request(&mut self) -> Option<FrameHandle> {
        let handle = self
            .window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
            .ok()
            .map(FrameHandle);
        self.slot.set(handle);
        handle
    }

    fn cancel(&mut self, handle: FrameHandle) {
        self.slot.release(handle);
        let _ = self.window.cancel_animation_frame(handle.0);
    }
}

/// Whether a key event was aimed at a form field or other editable element
fn is_editable(target: Option<EventTarget>) -> bool {
    let Some(target) = target else {
        return false;
    };
    target.dyn_ref::<HtmlInputElement>().is_some()
        || target.dyn_ref::<HtmlTextAreaElement>().is_some()
        || target.dyn_ref::<HtmlSelectElement>().is_some()
        || target
            .dyn_ref::<HtmlElement>()
            .is_some_and(|el| el.is_content_editable())
}

/// High scores in `window.localStorage`
pub struct LocalStore {
    storage: Option<Storage>,
}

impl LocalStore {
    pub fn new() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();
        if storage.is_none() {
            log::warn!("LocalStorage unavailable, high scores will not persist");
        }
        Self { storage }
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreStore for LocalStore {
    fn read(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| ArcadeError::Storage("LocalStorage unavailable".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|e| ArcadeError::Storage(format!("{:?}", e)))
    }
}

/// Event listener removed again on drop
struct Listener {
    target: EventTarget,
    event: &'static str,
    callback: Closure<dyn FnMut(Event)>,
}

impl Listener {
    fn new(
        target: &EventTarget,
        event: &'static str,
        handler: impl FnMut(Event) + 'static,
    ) -> std::result::Result<Self, JsValue> {
        let callback = Closure::<dyn FnMut(Event)>::new(handler);
        target.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())?;
        Ok(Self {
            target: target.clone(),
            event,
            callback,
        })
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
    }
}

/// Background image whose load callbacks are detached on drop
struct ImageLoader {
    image: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

impl Drop for ImageLoader {
    fn drop(&mut self) {
        self.image.set_onload(None);
        self.image.set_onerror(None);
    }
}

type WebDriver = Driver<Box<dyn GameRules>, CanvasSurface>;

struct Mounted {
    driver: WebDriver,
    scheduler: RafScheduler,
}

impl Mounted {
    fn input(&mut self, event: RawInput) {
        let Mounted { driver, scheduler } = self;
        driver.handle_input(&event, scheduler);
    }
}

/// Run `f` on the mounted game if it is still alive and not already borrowed
fn with_mounted(weak: &Weak<RefCell<Mounted>>, f: impl FnOnce(&mut Mounted)) {
    if let Some(mounted) = weak.upgrade() {
        if let Ok(mut m) = mounted.try_borrow_mut() {
            f(&mut m);
        }
    }
}

fn js_error(e: ArcadeError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// A running game. Call `unmount` (or drop it) to stop everything.
#[wasm_bindgen]
pub struct GameHandle {
    mounted: Option<Rc<RefCell<Mounted>>>,
    listeners: Vec<Listener>,
    loader: Option<ImageLoader>,
    window: Window,
    frame: FrameSlot,
}

#[wasm_bindgen]
impl GameHandle {
    /// Cancel the pending frame and remove every listener
    pub fn unmount(&mut self) {
        self.listeners.clear();
        self.loader = None;
        if let Some(mounted) = self.mounted.take() {
            match mounted.try_borrow_mut() {
                Ok(mut m) => {
                    let Mounted { driver, scheduler } = &mut *m;
                    driver.stop(scheduler);
                }
                Err(_) => {
                    log::warn!("Unmount during a game callback, cancelling the frame directly");
                    if let Some(handle) = self.frame.take() {
                        let _ = self.window.cancel_animation_frame(handle.0);
                    }
                }
            }
        }
    }

    pub fn restart(&mut self) {
        if let Some(mounted) = &self.mounted {
            if let Ok(mut m) = mounted.try_borrow_mut() {
                let Mounted { driver, scheduler } = &mut *m;
                driver.restart(scheduler);
            }
        }
    }

    pub fn score(&self) -> u32 {
        self.mounted
            .as_ref()
            .and_then(|m| m.try_borrow().ok().map(|m| m.driver.state().score))
            .map(|s| s.min(u32::MAX as u64) as u32)
            .unwrap_or(0)
    }

    pub fn best(&self) -> Option<u32> {
        self.mounted
            .as_ref()
            .and_then(|m| m.try_borrow().ok().and_then(|m| m.driver.best_score()))
            .map(|s| s.min(u32::MAX as u64) as u32)
    }

    pub fn is_over(&self) -> bool {
        self.mounted
            .as_ref()
            .and_then(|m| m.try_borrow().ok().map(|m| m.driver.phase() == LoopPhase::Terminal))
            .unwrap_or(false)
    }
}

impl Drop for GameHandle {
    fn drop(&mut self) {
        self.unmount();
    }
}

/// Mount `game` on the canvas with id `canvas_id`.
///
/// `background` is an optional image URL; the game's solid color is used
/// until it loads, and for good if it fails.
#[wasm_bindgen]
pub fn mount(
    canvas_id: &str,
    game: &str,
    background: Option<String>,
) -> std::result::Result<GameHandle, JsValue> {
    console_error_panic_hook::set_once();
    // Already initialised on a second mount
    let _ = console_log::init_with_level(log::Level::Info);

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let canvas = document
        .get_element_by_id(canvas_id)
        .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        .ok_or_else(|| {
            log::error!("Canvas #{} not found", canvas_id);
            js_error(ArcadeError::SurfaceUnavailable)
        })?;

    let rules = games::by_name(game).map_err(js_error)?;
    let field = rules.config().playfield;
    let surface = CanvasSurface::new(canvas.clone(), field).map_err(js_error)?;
    let seed = js_sys::Date::now() as u64;
    let driver = Driver::new(
        rules,
        surface,
        Settings::load(),
        Box::new(LocalStore::new()),
        seed,
    )
    .map_err(js_error)?;

    let frame = FrameSlot::new();
    let mounted = Rc::new_cyclic(|weak: &Weak<RefCell<Mounted>>| {
        let weak = weak.clone();
        let on_frame = Closure::<dyn FnMut(f64)>::new(move |time: f64| {
            with_mounted(&weak, |m| {
                // Cancelled frames never fire, so the pending one is ours
                if let Some(handle) = m.driver.pending_frame() {
                    let Mounted { driver, scheduler } = m;
                    driver.on_frame(handle, time, scheduler);
                }
            });
        });
        RefCell::new(Mounted {
            driver,
            scheduler: RafScheduler::new(window.clone(), on_frame, frame.clone()),
        })
    });

    let mut listeners = Vec::new();
    let weak = Rc::downgrade(&mounted);

    {
        let weak = weak.clone();
        listeners.push(Listener::new(&window, "keydown", move |event: Event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let key = match route_key(&event.key(), is_editable(event.target())) {
                KeyRouting::Ignore => return,
                KeyRouting::Forward(key) => key,
                KeyRouting::Capture(key) => {
                    event.prevent_default();
                    key
                }
            };
            with_mounted(&weak, |m| m.input(RawInput::KeyDown(key)));
        })?);
    }
    {
        // Releases always go through so no key stays held after focus moves
        let weak = weak.clone();
        listeners.push(Listener::new(&window, "keyup", move |event: Event| {
            let Some(event) = event.dyn_ref::<KeyboardEvent>() else {
                return;
            };
            let key = Key::from_dom(&event.key());
            if key != Key::Other {
                with_mounted(&weak, |m| m.input(RawInput::KeyUp(key)));
            }
        })?);
    }

    for name in ["mousemove", "mousedown", "mouseup"] {
        let weak = weak.clone();
        listeners.push(Listener::new(&canvas, name, move |event: Event| {
            let Some(event) = event.dyn_ref::<MouseEvent>() else {
                return;
            };
            let (cx, cy) = (event.client_x() as f64, event.client_y() as f64);
            with_mounted(&weak, |m| {
                let (x, y) = m.driver.surface().to_field(cx, cy);
                let raw = match name {
                    "mousedown" => RawInput::PointerDown { x, y },
                    "mouseup" => RawInput::PointerUp,
                    _ => RawInput::PointerMove { x, y },
                };
                m.input(raw);
            });
        })?);
    }

    for name in ["touchstart", "touchmove", "touchend"] {
        let weak = weak.clone();
        listeners.push(Listener::new(&canvas, name, move |event: Event| {
            let Some(event) = event.dyn_ref::<TouchEvent>() else {
                return;
            };
            event.prevent_default();
            let touch = event.touches().get(0);
            with_mounted(&weak, |m| {
                let raw = match (name, &touch) {
                    ("touchend", _) => RawInput::TouchEnd,
                    (_, None) => return,
                    (_, Some(t)) => {
                        let (x, y) = m
                            .driver
                            .surface()
                            .to_field(t.client_x() as f64, t.client_y() as f64);
                        if name == "touchstart" {
                            RawInput::TouchStart { x, y }
                        } else {
                            RawInput::TouchMove { x, y }
                        }
                    }
                };
                m.input(raw);
            });
        })?);
    }

    let loader = match background {
        Some(url) => Some(load_backdrop(&mounted, &url)?),
        None => None,
    };

    {
        let mut m = mounted.borrow_mut();
        let Mounted { driver, scheduler } = &mut *m;
        driver.start(scheduler);
    }
    log::info!("Mounted {} on #{}", game, canvas_id);

    Ok(GameHandle {
        mounted: Some(mounted),
        listeners,
        loader,
        window,
        frame,
    })
}

fn load_backdrop(
    mounted: &Rc<RefCell<Mounted>>,
    url: &str,
) -> std::result::Result<ImageLoader, JsValue> {
    let image = HtmlImageElement::new()?;
    {
        let mut m = mounted.borrow_mut();
        let fallback = m.driver.palette().background;
        m.driver.set_backdrop(Backdrop::pending(fallback));
    }

    let onload = {
        let weak = Rc::downgrade(mounted);
        let image = image.clone();
        Closure::<dyn FnMut()>::new(move || {
            let image = image.clone();
            with_mounted(&weak, move |m| m.driver.backdrop_mut().set_ready(image));
        })
    };
    let onerror = {
        let weak = Rc::downgrade(mounted);
        let url = url.to_string();
        Closure::<dyn FnMut()>::new(move || {
            with_mounted(&weak, |m| {
                m.driver.backdrop_mut().mark_failed(&url);
            });
        })
    };
    image.set_onload(Some(onload.as_ref().unchecked_ref()));
    image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    image.set_src(url);

    Ok(ImageLoader {
        image,
        _onload: onload,
        _onerror: onerror,
    })
}
