//! Cosmic Breaker entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, MouseEvent, TouchEvent};

    use cosmic_breaker::audio::AudioManager;
    use cosmic_breaker::consts::*;
    use cosmic_breaker::platform::{LocalStore, clock_seed};
    use cosmic_breaker::renderer::{RenderState, scene};
    use cosmic_breaker::sim::{Game, GameEvent, GamePhase, TickInput};
    use cosmic_breaker::{GameError, HighScore, QualityPreset, Settings, Tuning, format_number};

    /// Browser-side app holding the game and its outputs
    struct App {
        game: Game,
        settings: Settings,
        render_state: Option<RenderState>,
        audio: Option<AudioManager>,
        store: Option<LocalStore>,
        canvas: HtmlCanvasElement,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        last_intensity: f32,
    }

    impl App {
        fn new(game: Game, settings: Settings, canvas: HtmlCanvasElement) -> Self {
            Self {
                game,
                settings,
                render_state: None,
                audio: None,
                store: None,
                canvas,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                last_intensity: -1.0,
            }
        }

        /// Audio needs a user gesture; build it lazily on the first one
        fn ensure_audio(&mut self) {
            if let Some(audio) = &self.audio {
                audio.resume();
                return;
            }
            match AudioManager::new(&self.settings, clock_seed()) {
                Ok(audio) => self.audio = Some(audio),
                Err(e) => log::warn!("Audio disabled: {e}"),
            }
        }

        /// Pointer x in canvas pixels to a paddle target
        fn pointer_to_target(&mut self, x: f32) {
            let w = self.canvas.client_width() as f32;
            let h = self.canvas.client_height() as f32;
            self.input.target_x = Some(scene::screen_to_field_x(x, w, h));
        }

        fn start_run(&mut self) {
            self.ensure_audio();
            self.accumulator = 0.0;
            match self.game.phase {
                GamePhase::GameOver => self.game.restart(),
                _ => self.game.start(),
            }
        }

        fn toggle_mute(&mut self) {
            let muted = match &mut self.audio {
                Some(audio) => audio.toggle_mute(),
                None => self.settings.toggle_mute(),
            };
            self.settings.muted = muted;
            log::info!("Muted: {muted}");
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(MAX_FRAME_DT);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let input = self.input.clone();
                self.game.tick(&input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.release = false;
                self.input.pause = false;
            }
            if substeps == MAX_SUBSTEPS {
                self.accumulator = self.accumulator.min(SIM_DT);
            }

            for event in self.game.drain_events() {
                self.handle_event(&event);
            }

            if let Some(audio) = &mut self.audio {
                if (self.game.music_intensity - self.last_intensity).abs() > 0.01 {
                    audio.set_music_intensity(self.game.music_intensity);
                    self.last_intensity = self.game.music_intensity;
                }
                audio.pump();
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

        fn handle_event(&mut self, event: &GameEvent) {
            if let Some(audio) = &mut self.audio {
                audio.handle(event);
            }
            match *event {
                GameEvent::GameOver {
                    score,
                    new_high_score,
                } => {
                    if new_high_score {
                        self.save_high_score();
                    }
                    log::info!("Final score {}", format_number(score));
                }
                GameEvent::PowerUpStarted(kind) => log::debug!("Power-up on: {}", kind.name()),
                GameEvent::PowerUpEnded(kind) => log::debug!("Power-up off: {}", kind.name()),
                _ => {}
            }
        }

        fn save_high_score(&mut self) {
            let Some(store) = &mut self.store else {
                return;
            };
            if let Err(e) = self.game.high_score.save(store) {
                log::warn!("Could not save high score: {e}");
            }
        }

        /// Render the current frame
        fn render(&mut self, time: f64) {
            if let Some(render_state) = &mut self.render_state {
                let vertices = scene::build(
                    &self.game,
                    &self.settings,
                    (time / 1000.0) as f32,
                    render_state.aspect(),
                );
                match render_state.render(&vertices) {
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

        /// Match the canvas backing store to its CSS size
        fn resize(&mut self) {
            let Some(window) = web_sys::window() else {
                return;
            };
            let dpr = window.device_pixel_ratio();
            let w = (self.canvas.client_width() as f64 * dpr) as u32;
            let h = (self.canvas.client_height() as f64 * dpr) as u32;
            if w == 0 || h == 0 {
                return;
            }
            self.canvas.set_width(w);
            self.canvas.set_height(h);
            if let Some(render_state) = &mut self.render_state {
                render_state.resize(w, h);
            }
            self.game.set_aspect(w as f32 / h as f32);
        }

        /// Update HUD elements in DOM
        fn update_hud(&self, document: &Document) {
            let set_text = |id: &str, text: &str| {
                if let Some(el) = document.get_element_by_id(id) {
                    el.set_text_content(Some(text));
                }
            };
            let set_visible = |id: &str, visible: bool| {
                if let Some(el) = document.get_element_by_id(id) {
                    let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
                }
            };

            set_text("score-value", &format_number(self.game.score));
            set_text(
                "high-score-value",
                &format_number(self.game.high_score.best),
            );
            set_text("balls-value", &self.game.balls_remaining.to_string());
            if self.settings.show_fps {
                set_text("fps-value", &self.fps.to_string());
            }

            set_visible("start-screen", self.game.phase == GamePhase::Start);
            set_visible("game-over", self.game.phase == GamePhase::GameOver);
            if self.game.phase == GamePhase::GameOver {
                set_text("final-score", &format_number(self.game.score));
            }

            set_text("mute-button", if self.settings.muted { "🔇" } else { "🔊" });

            if let Some(container) = document.get_element_by_id("power-ups-container") {
                let mut html = String::new();
                for active in self.game.power_ups.active() {
                    let kind = active.kind;
                    let fraction = self.game.power_ups.remaining_fraction(kind).unwrap_or(0.0);
                    html.push_str(&format!(
                        "<div class=\"power-up\" title=\"{}\" style=\"border-color:#{:06x}\">\
                         <span>{}</span><div class=\"timer\" style=\"width:{:.0}%\"></div></div>",
                        kind.name(),
                        kind.color(),
                        kind.icon(),
                        fraction * 100.0
                    ));
                }
                container.set_inner_html(&html);
            }
        }
    }

    /// Read balance overrides from `<script id="game-config" type="application/json">`
    fn load_tuning(document: &Document) -> Tuning {
        let Some(json) = document
            .get_element_by_id("game-config")
            .and_then(|el| el.text_content())
        else {
            return Tuning::default();
        };
        match Tuning::from_json(&json) {
            Ok(tuning) => {
                log::info!("Loaded tuning from page config");
                tuning
            }
            Err(e) => {
                log::warn!("Ignoring page config: {e}");
                Tuning::default()
            }
        }
    }

    pub async fn run() -> Result<(), GameError> {
        log::info!("Cosmic Breaker starting...");

        let window = web_sys::window().ok_or_else(|| GameError::Render("no window".into()))?;
        let document = window
            .document()
            .ok_or_else(|| GameError::Render("no document".into()))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into().ok())
            .ok_or_else(|| GameError::Render("no canvas element".into()))?;

        let quality = canvas
            .get_attribute("data-quality")
            .and_then(|q| QualityPreset::from_str(&q))
            .unwrap_or_default();
        let settings = Settings::from_preset(quality);

        let seed = clock_seed();
        let mut game = Game::new(load_tuning(&document), seed);
        game.particles.set_quality_scale(settings.particle_scale());

        let store = match LocalStore::open() {
            Ok(store) => {
                game.high_score = HighScore::load_or_default(&store);
                Some(store)
            }
            Err(e) => {
                log::warn!("High score will not persist: {e}");
                None
            }
        };
        log::info!("Game initialized with seed: {}", seed);

        let app = Rc::new(RefCell::new(App::new(game, settings, canvas.clone())));
        app.borrow_mut().store = store;
        app.borrow_mut().resize();

        // Initialize WebGPU
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        let surface = instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))
            .map_err(|e| GameError::Render(format!("create surface: {e}")))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| GameError::Render(format!("no adapter: {e}")))?;

        log::info!("Using adapter: {:?}", adapter.get_info().name);

        let (width, height) = (canvas.width(), canvas.height());
        let render_state = RenderState::new(surface, &adapter, width, height).await?;
        app.borrow_mut().render_state = Some(render_state);

        setup_input_handlers(&canvas, app.clone());
        setup_buttons(&document, app.clone());
        setup_auto_pause(app.clone());
        setup_resize(app.clone());

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        request_animation_frame(app);

        log::info!("Cosmic Breaker running!");
        Ok(())
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: Rc<RefCell<App>>) {
        // Mouse move - absolute position maps to paddle x
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                app.borrow_mut().pointer_to_target(event.offset_x() as f32);
            });
            let _ = canvas
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse click - release
        {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                a.ensure_audio();
                a.input.release = true;
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch move and touch start (start also releases)
        for (name, release) in [("touchmove", false), ("touchstart", true)] {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut a = app.borrow_mut();
                if release {
                    a.ensure_audio();
                    a.input.release = true;
                }
                if let Some(touch) = event.touches().get(0) {
                    let rect = canvas_clone.get_bounding_client_rect();
                    let x = touch.client_x() as f32 - rect.left() as f32;
                    a.pointer_to_target(x);
                }
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let Some(window) = web_sys::window() else {
                return;
            };
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut a = app.borrow_mut();
                match event.key().as_str() {
                    " " => {
                        event.prevent_default();
                        match a.game.phase {
                            GamePhase::Start | GamePhase::GameOver => a.start_run(),
                            _ => a.input.release = true,
                        }
                    }
                    "p" | "P" | "Escape" => a.input.pause = true,
                    "m" | "M" => a.toggle_mute(),
                    "i" | "I" => {
                        a.input.idle_mode = !a.input.idle_mode;
                        log::info!("Idle mode: {}", a.input.idle_mode);
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(document: &Document, app: Rc<RefCell<App>>) {
        for id in ["start-button", "restart-button"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let app = app.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    app.borrow_mut().start_run();
                });
                let _ =
                    btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        if let Some(btn) = document.get_element_by_id("mute-button") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                a.ensure_audio();
                a.toggle_mute();
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Visibility change (tab switch, minimize)
        {
            let app = app.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                    let mut a = app.borrow_mut();
                    if a.game.phase == GamePhase::Playing {
                        a.input.pause = true;
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
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut a = app.borrow_mut();
                if a.game.phase == GamePhase::Playing {
                    a.input.pause = true;
                    log::info!("Auto-paused (window blur)");
                }
            });
            let _ =
                window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            app.borrow_mut().resize();
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        {
            let mut a = app.borrow_mut();

            let dt = if a.last_time > 0.0 {
                ((time - a.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            a.last_time = time;

            a.update(dt, time);
            a.render(time);
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                a.update_hud(&document);
            }
        }

        request_animation_frame(app);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    console_error_panic_hook::set_once();
    if console_log::init_with_level(log::Level::Info).is_err() {
        web_sys::console::warn_1(&"logger already initialized".into());
    }
    if let Err(e) = wasm_game::run().await {
        log::error!("Cosmic Breaker failed to start: {e}");
        if let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("loading"))
        {
            el.set_text_content(Some(&format!("Could not start: {e}")));
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Headless demo: the autopilot plays one run and the result is logged.
///
/// Usage: `cosmic-breaker [tuning.json] [seconds]`
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use cosmic_breaker::consts::SIM_DT;
    use cosmic_breaker::platform::clock_seed;
    use cosmic_breaker::sim::{Game, GameEvent, GamePhase, TickInput};
    use cosmic_breaker::{Tuning, format_number};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Cosmic Breaker (native) starting headless autopilot run...");

    let mut args = std::env::args().skip(1);
    let tuning = match args.next() {
        Some(path) => match std::fs::read_to_string(&path)
            .map_err(|e| cosmic_breaker::GameError::Storage(format!("{path}: {e}")))
            .and_then(|json| Tuning::from_json(&json))
        {
            Ok(tuning) => tuning,
            Err(e) => {
                log::warn!("Using default tuning: {e}");
                Tuning::default()
            }
        },
        None => Tuning::default(),
    };
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(300.0);

    let seed = clock_seed();
    let mut game = Game::new(tuning, seed);
    game.set_aspect(16.0 / 9.0);
    game.start();

    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut bricks_hit = 0u32;
    let mut power_ups = 0u32;
    let mut balls_lost = 0u32;
    let steps = (seconds / SIM_DT) as u32;
    for _ in 0..steps {
        game.tick(&input, SIM_DT);
        for event in game.drain_events() {
            match event {
                GameEvent::BrickHit { .. } => bricks_hit += 1,
                GameEvent::PowerUpCollected(kind) => {
                    power_ups += 1;
                    log::debug!("Collected {}", kind.name());
                }
                GameEvent::BallLost => balls_lost += 1,
                GameEvent::LevelUp { difficulty } => log::info!("Difficulty {difficulty:.1}"),
                _ => {}
            }
        }
        if game.phase == GamePhase::GameOver {
            break;
        }
    }

    log::info!(
        "Run finished after {:.1}s: score {}, {} brick hits, {} power-ups, {} balls lost, phase {:?}",
        game.time,
        format_number(game.score),
        bricks_hit,
        power_ups,
        balls_lost,
        game.phase
    );
    // Native runs keep no storage; the best score only lives for this run
    log::info!("Session best: {}", format_number(game.high_score.best));
}
