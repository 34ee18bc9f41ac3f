//! Dagscape entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, MouseEvent, TouchEvent};

    use dagscape::audio::AudioManager;
    use dagscape::renderer::{Camera, SceneRenderState, pick_block};
    use dagscape::settings::Settings;
    use dagscape::sim::{BlockKind, Notifier, SimPhase, SimState, StatsSink, tick};
    use dagscape::theme::Theme;

    /// Application instance holding all state
    struct App {
        sim: SimState,
        render_state: Option<SceneRenderState>,
        camera: Camera,
        audio: AudioManager,
        settings: Settings,
        last_time: f64,
        // Device pixel ratio, for pointer-to-surface conversion
        dpr: f64,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl App {
        fn new(theme: Theme, seed: u64, settings: Settings) -> Self {
            let mut audio = AudioManager::new();
            audio.set_master_volume(settings.master_volume);
            audio.set_muted(settings.muted);
            Self {
                sim: SimState::new(theme, seed),
                render_state: None,
                camera: Camera::new(),
                audio,
                settings,
                last_time: 0.0,
                dpr: 1.0,
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
            }
        }

        /// Advance the simulation and camera for one frame
        fn update(&mut self, dt: f32, time: f64) {
            let App { sim, audio, .. } = self;
            let mut stats = DomStats;
            let mut cue = AudioCue { audio };
            tick(sim, js_sys::Date::now(), &mut stats, &mut cue);

            if let Some(head) = self.sim.history.newest() {
                self.camera.follow(head.pos.z, dt);
            }

            // Track frame times for FPS
            self.frame_times[self.frame_index] = time;
            self.frame_index = (self.frame_index + 1) % 60;
            let oldest_time = self.frame_times[self.frame_index];
            if oldest_time > 0.0 {
                let elapsed = time - oldest_time;
                if elapsed > 0.0 {
                    self.fps = (60000.0 / elapsed).round() as u32;
                }
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            let App {
                sim,
                render_state,
                camera,
                settings,
                ..
            } = self;
            if let Some(render_state) = render_state {
                match render_state.render(sim, settings, camera, time) {
                    Ok(_) => {}
                    Err(wgpu::SurfaceError::Lost) => {
                        render_state.resize(render_state.size.0, render_state.size.1);
                    }
                    Err(wgpu::SurfaceError::OutOfMemory) => {
                        log::error!("Out of memory!");
                    }
                    Err(e) => log::warn!("Render error: {:?}", e),
                }
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let window = web_sys::window().unwrap();
            let document = window.document().unwrap();

            // Update FPS
            if self.settings.show_fps {
                if let Some(el) = document.query_selector("#hud-fps .hud-value").ok().flatten() {
                    el.set_text_content(Some(&self.fps.to_string()));
                }
            }

            // Phase overlays
            set_visible(&document, "start-overlay", self.sim.phase == SimPhase::Idle);
            set_visible(
                &document,
                "syncing-overlay",
                self.sim.phase == SimPhase::Syncing,
            );
            set_visible(&document, "paused-overlay", self.sim.phase == SimPhase::Paused);

            // Details panel for the selected block
            let selected = self
                .sim
                .selection
                .get()
                .and_then(|id| self.sim.history.get(id));
            match selected {
                Some(block) => {
                    if let Some(el) = document.get_element_by_id("detail-hash") {
                        el.set_text_content(Some(&block.short_hash()));
                    }
                    if let Some(el) = document.get_element_by_id("detail-kind") {
                        el.set_text_content(Some(block.kind.as_str()));
                    }
                    if let Some(el) = document.get_element_by_id("detail-parents") {
                        let parents = if block.parents.is_empty() {
                            "genesis".to_string()
                        } else {
                            block
                                .parents
                                .iter()
                                .map(|p| format!("#{p}"))
                                .collect::<Vec<_>>()
                                .join(", ")
                        };
                        el.set_text_content(Some(&parents));
                    }
                    if let Some(el) = document.get_element_by_id("detail-work") {
                        el.set_text_content(Some(&format!("{:.3e}", block.work)));
                    }
                    if let Some(el) = document.get_element_by_id("detail-time") {
                        let date = js_sys::Date::new(&JsValue::from_f64(block.created_at_ms));
                        let time: String = date.to_locale_time_string("en-US").into();
                        el.set_text_content(Some(&time));
                    }
                    set_visible(&document, "details", true);
                }
                // Covers both "nothing selected" and a stale selection
                // whose block has been evicted.
                None => set_visible(&document, "details", false),
            }
        }
    }

    /// Show or hide an overlay element by toggling the hidden class
    fn set_visible(document: &web_sys::Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    /// Stats sink writing straight to the HUD counters, bypassing any
    /// reactive machinery - at a few writes per second this is free.
    struct DomStats;

    impl StatsSink for DomStats {
        fn report(&mut self, rate: f32, height: u64) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            if let Some(el) = document.query_selector("#hud-rate .hud-value").ok().flatten() {
                let text = if rate >= 100.0 {
                    format!("{rate:.0}")
                } else {
                    format!("{rate:.1}")
                };
                el.set_text_content(Some(&text));
            }
            if let Some(el) = document
                .query_selector("#hud-height .hud-value")
                .ok()
                .flatten()
            {
                el.set_text_content(Some(&format_grouped(height)));
            }
        }
    }

    /// Thousands-separated display form for the height counter
    fn format_grouped(n: u64) -> String {
        let digits = n.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(c);
        }
        out
    }

    /// Notification collaborator backed by the audio manager
    struct AudioCue<'a> {
        audio: &'a AudioManager,
    }

    impl Notifier for AudioCue<'_> {
        fn notify(&mut self, kind: BlockKind) {
            self.audio.play_block(kind);
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Dagscape starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        // Skin from the URL query, defaulting to Kaspa
        let query = window.location().search().unwrap_or_default();
        let theme = Theme::from_query(&query);
        let cfg = theme.config();
        log::info!("Theme: {}", cfg.name);

        // Hide loading indicator
        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        // Theme-specific HUD labels
        if let Some(el) = document.get_element_by_id("hud-network-name") {
            el.set_text_content(Some(cfg.name));
        }
        if let Some(el) = document.query_selector("#hud-rate .hud-label").ok().flatten() {
            el.set_text_content(Some(cfg.rate_label));
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        // Set canvas size
        let dpr = window.device_pixel_ratio();
        let client_w = canvas.client_width();
        let client_h = canvas.client_height();
        let width = (client_w as f64 * dpr) as u32;
        let height = (client_h as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        // Initialize application
        let seed = js_sys::Date::now() as u64;
        let settings = Settings::load();
        let app = Rc::new(RefCell::new(App::new(theme, seed, settings)));
        app.borrow_mut().dpr = dpr;

        log::info!("Initialized with seed: {}", seed);

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .expect("Failed to create surface");

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to get adapter");

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let render_state = SceneRenderState::new(surface, &adapter, width, height).await;
        app.borrow_mut().render_state = Some(render_state);

        // One-shot height fetch; either branch flips readiness
        spawn_height_fetch(app.clone());

        // Input and control wiring
        setup_pointer_handlers(&canvas, app.clone());
        setup_keyboard(app.clone());
        setup_buttons(app.clone());
        setup_auto_pause(app.clone());

        // Show HUD
        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.set_attribute("class", "");
        }

        // Start frame loop
        request_animation_frame(app);

        log::info!("Dagscape running!");
    }

    fn spawn_height_fetch(app: Rc<RefCell<App>>) {
        let cfg = app.borrow().sim.config();
        wasm_bindgen_futures::spawn_local(async move {
            match dagscape::chain::fetch_base_height(cfg).await {
                Ok(height) => {
                    log::info!("Chain height: {}", height);
                    app.borrow_mut().sim.on_chain_height(height, js_sys::Date::now());
                }
                Err(e) => {
                    log::warn!("Height fetch failed: {}", e);
                    app.borrow_mut().sim.on_chain_failed(js_sys::Date::now());
                }
            }
        });
    }

    fn setup_pointer_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Click - select the block under the pointer, or clear
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut a = app.borrow_mut();
                a.audio.resume();
                let dpr = a.dpr as f32;
                let x = event.offset_x() as f32 * dpr;
                let y = event.offset_y() as f32 * dpr;
                let resolution = (
                    canvas_clone.width() as f32,
                    canvas_clone.height() as f32,
                );
                let picked = pick_block(&a.sim.history, &a.camera, resolution, x, y);
                match picked {
                    Some(id) => log::info!("Selected block #{id}"),
                    None => log::info!("Selection cleared"),
                }
                a.sim.selection.set(picked);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch - same selection path via the first touch point
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    let mut a = app.borrow_mut();
                    a.audio.resume();
                    let rect = canvas_clone.get_bounding_client_rect();
                    let dpr = a.dpr as f32;
                    let x = (touch.client_x() as f32 - rect.left() as f32) * dpr;
                    let y = (touch.client_y() as f32 - rect.top() as f32) * dpr;
                    let resolution = (
                        canvas_clone.width() as f32,
                        canvas_clone.height() as f32,
                    );
                    let picked = pick_block(&a.sim.history, &a.camera, resolution, x, y);
                    a.sim.selection.set(picked);
                }
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
            let mut a = app.borrow_mut();
            match event.key().as_str() {
                " " | "Escape" => a.sim.toggle_pause(js_sys::Date::now()),
                "m" | "M" => {
                    let muted = !a.settings.muted;
                    a.settings.muted = muted;
                    a.audio.set_muted(muted);
                    a.settings.save();
                    log::info!("Muted: {}", muted);
                }
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Start button
        if let Some(btn) = document.get_element_by_id("start-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                a.audio.resume();
                a.sim.start(js_sys::Date::now());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Pause/resume button
        if let Some(btn) = document.get_element_by_id("pause-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                app.borrow_mut().sim.toggle_pause(js_sys::Date::now());
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mute button
        if let Some(btn) = document.get_element_by_id("mute-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                let muted = !a.settings.muted;
                a.settings.muted = muted;
                a.audio.set_muted(muted);
                a.settings.save();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let document = window.document().unwrap();

        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut a = app.borrow_mut();
                    if a.sim.phase == SimPhase::Running {
                        a.sim.toggle_pause(js_sys::Date::now());
                        log::info!("Auto-paused (tab hidden)");
                    }
                }
            });
            let _ = document.add_event_listener_with_callback(
                "visibilitychange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Window blur (click outside)
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut a = app.borrow_mut();
                if a.sim.phase == SimPhase::Running {
                    a.sim.toggle_pause(js_sys::Date::now());
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            frame_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn frame_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                1.0 / 60.0
            };
            a.last_time = time;

            a.update(dt.min(0.1), time);
            a.render(time);
            a.update_hud();
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Dagscape (native) starting...");
    log::info!("Native mode is a headless smoke run - use `trunk serve` for the browser version");

    smoke_run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn smoke_run() {
    use dagscape::sim::{SimState, StatsSink, tick};
    use dagscape::theme::Theme;

    struct StdoutStats {
        last: Option<(f32, u64)>,
    }

    impl StatsSink for StdoutStats {
        fn report(&mut self, rate: f32, height: u64) {
            self.last = Some((rate, height));
        }
    }

    let mut state = SimState::new(Theme::Kaspa, 0xDA65CAFE);
    state.on_chain_failed(0.0);
    state.start(0.0);

    let interval = state.config().spawn_interval_ms;
    let mut stats = StdoutStats { last: None };
    for i in 0..60 {
        tick(&mut state, (i + 1) as f64 * interval, &mut stats, &mut ());
    }

    let (rate, height) = stats.last.expect("no stats reported");
    println!(
        "smoke run: {} blocks in history (cap {}), height {}, rate {:.1}",
        state.history.len(),
        state.config().history_cap,
        height,
        rate
    );
    assert_eq!(state.generated, 60);
    println!("✓ Growth loop OK");
}
