//! Invader Waves entry point
//!
//! The browser build runs the full game; the native build plays a headless
//! autopilot run and reports the score.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent};

    use invader_waves::audio::{AudioManager, SoundEffect};
    use invader_waves::consts::*;
    use invader_waves::highscores::{HighScores, format_age, now_ms};
    use invader_waves::renderer::{Palette, RenderState, build_scene};
    use invader_waves::settings::Settings;
    use invader_waves::sim::{GameEvent, GameState, TickInput, move_axis_from_keys, tick};
    use invader_waves::tuning::GameSettings;
    use invader_waves::ui::{Button, Panel, UiState};

    /// Movement keys currently held
    #[derive(Default)]
    struct HeldKeys {
        left: bool,
        right: bool,
    }

    /// Game instance holding all state
    struct Game {
        state: GameState,
        ui: UiState,
        settings: Settings,
        high_scores: HighScores,
        audio: AudioManager,
        render_state: Option<RenderState>,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        keys: HeldKeys,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
        pointer_locked: bool,
        /// Leaderboard needs redrawing
        scores_dirty: bool,
    }

    impl Game {
        fn new(seed: u64) -> Self {
            let settings = Settings::load();
            let mut audio = AudioManager::new();
            audio.set_gain(settings.effective_sfx_gain());

            Self {
                state: GameState::new(seed, GameSettings::default()),
                ui: UiState::new(),
                settings,
                high_scores: HighScores::load(),
                audio,
                render_state: None,
                accumulator: 0.0,
                last_time: 0.0,
                input: TickInput::default(),
                keys: HeldKeys::default(),
                frame_times: [0.0; 60],
                frame_index: 0,
                fps: 0,
                pointer_locked: false,
                scores_dirty: true,
            }
        }

        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                self.input.move_axis = move_axis_from_keys(self.keys.left, self.keys.right);
                let input = self.input.clone();
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input.fire = false;
                self.input.shotgun = false;
                self.input.increase_difficulty = false;

                self.dispatch_events();
            }

            // Demo mode presses through menus on its own
            if self.input.autopilot && matches!(self.ui.panel(), Panel::Start | Panel::NextWave) {
                self.ui.confirm(&mut self.state);
                self.dispatch_events();
            }

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

        /// Fan simulation events out to the UI, audio and leaderboard
        fn dispatch_events(&mut self) {
            for event in self.state.drain_events() {
                self.ui.handle_event(&event);
                if let Some(effect) = SoundEffect::for_event(&event) {
                    self.audio.play(effect);
                }
                if event == GameEvent::GameOver {
                    self.record_score();
                }
            }
        }

        fn record_score(&mut self) {
            let rank = self
                .high_scores
                .add_score(self.state.score, self.state.wave, now_ms());
            if rank.is_some() {
                self.audio.play(SoundEffect::HighScore);
                self.high_scores.save();
                self.scores_dirty = true;
            }
        }

        /// Apply a preference change from the keyboard and persist it
        fn change_settings(&mut self, change: impl FnOnce(&mut Settings)) {
            change(&mut self.settings);
            self.audio.set_gain(self.settings.effective_sfx_gain());
            self.settings.save();
            log::info!(
                "Settings: {} quality, preview {}, contrast {}, reduced motion {}, volume {:.1}",
                self.settings.quality.as_str(),
                self.settings.path_preview,
                self.settings.high_contrast,
                self.settings.reduced_motion,
                self.settings.master_volume
            );
        }

        fn press(&mut self, button: Button) {
            self.audio.resume();
            self.ui.press(button, &mut self.state);
            self.dispatch_events();
        }

        /// Render the current frame
        fn render(&mut self) {
            let Some(render_state) = self.render_state.as_mut() else {
                return;
            };
            let vertices = build_scene(&self.state, &self.settings);
            let clear = Palette::for_settings(self.settings.high_contrast).background;
            match render_state.render(&vertices, clear) {
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

        /// Mirror UI state onto the DOM
        fn update_hud(&mut self, document: &Document) {
            set_text(document, "hud-score", &self.ui.score_label);
            set_text(document, "hud-wave", &self.ui.wave_label);
            set_text(
                document,
                "hud-rounds",
                &format!(
                    "{}/{}",
                    self.state.player.magazine.rounds(),
                    self.state.player.magazine.capacity()
                ),
            );
            set_text(document, "hud-fps", &self.fps.to_string());
            set_hidden(document, "hud-fps-item", !self.settings.show_fps);
            set_hidden(document, "autopilot-badge", !self.input.autopilot);

            let vis = self.ui.visibility();
            set_hidden(document, "background", !vis.background);
            set_hidden(document, Button::StartGame.element_id(), !vis.start_button);
            set_hidden(document, Button::NextWave.element_id(), !vis.next_wave_button);
            set_hidden(document, "game-over", !vis.game_over);

            // Focus ring follows the selected button
            for button in [Button::StartGame, Button::NextWave, Button::BackToStart] {
                if let Some(el) = document.get_element_by_id(button.element_id()) {
                    let _ = el
                        .class_list()
                        .toggle_with_force("selected", self.ui.selected() == Some(button));
                }
            }

            // Locking needs a user gesture; release can happen any time
            if !self.ui.cursor_locked() && self.pointer_locked {
                document.exit_pointer_lock();
            }
            if let Some(canvas) = document.get_element_by_id("canvas") {
                let _ = canvas
                    .class_list()
                    .toggle_with_force("hide-cursor", self.ui.cursor_locked());
            }

            if self.scores_dirty {
                self.scores_dirty = false;
                if let Some(list) = document.get_element_by_id("highscores-list") {
                    let now = now_ms();
                    let rows: String = self
                        .high_scores
                        .entries
                        .iter()
                        .enumerate()
                        .map(|(i, e)| {
                            format!(
                                "<li><span>{}.</span> {} <small>wave {} · {}</small></li>",
                                i + 1,
                                e.score,
                                e.wave,
                                format_age(e.timestamp, now)
                            )
                        })
                        .collect();
                    list.set_inner_html(&rows);
                }
            }
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_hidden(document: &Document, id: &str, hidden: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.class_list().toggle_with_force("hidden", hidden);
        }
    }

    fn request_pointer_lock(document: &Document) {
        if let Some(canvas) = document.get_element_by_id("canvas") {
            let _ = canvas.request_pointer_lock();
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Invader Waves starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let dpr = window.device_pixel_ratio();
        let width = (canvas.client_width() as f64 * dpr) as u32;
        let height = (canvas.client_height() as f64 * dpr) as u32;
        canvas.set_width(width);
        canvas.set_height(height);

        let seed = js_sys::Date::now() as u64;
        let game = Rc::new(RefCell::new(Game::new(seed)));
        log::info!("Game initialized with seed: {}", seed);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::BROWSER_WEBGPU,
            ..Default::default()
        });

        match instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone())) {
            Ok(surface) => {
                let adapter = instance
                    .request_adapter(&wgpu::RequestAdapterOptions {
                        power_preference: wgpu::PowerPreference::HighPerformance,
                        compatible_surface: Some(&surface),
                        force_fallback_adapter: false,
                    })
                    .await;
                match adapter {
                    Ok(adapter) => {
                        log::info!("Using adapter: {:?}", adapter.get_info().name);
                        match RenderState::new(surface, &adapter, width, height).await {
                            Ok(render_state) => game.borrow_mut().render_state = Some(render_state),
                            Err(e) => log::error!("Failed to create device: {}", e),
                        }
                    }
                    Err(e) => log::error!("No suitable GPU adapter: {}", e),
                }
            }
            Err(e) => log::error!("Failed to create surface: {}", e),
        }

        setup_input_handlers(game.clone());
        setup_buttons(game.clone());
        setup_focus_handlers(game.clone());
        setup_resize_handler(game.clone(), canvas);

        if let Some(hud) = document.get_element_by_id("hud") {
            let _ = hud.class_list().remove_1("hidden");
        }

        request_animation_frame(game);

        log::info!("Invader Waves running!");
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let Some(document) = window.document() else {
            return;
        };

        // Pointer lock changes (Escape releases it in every browser)
        {
            let game = game.clone();
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let locked = doc.pointer_lock_element().is_some();
                log::info!("Pointer lock {}", if locked { "acquired" } else { "released" });
                game.borrow_mut().pointer_locked = locked;
            });
            let _ = document.add_event_listener_with_callback(
                "pointerlockchange",
                closure.as_ref().unchecked_ref(),
            );
            closure.forget();
        }

        // Key down
        {
            let game = game.clone();
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                let fresh = !event.repeat();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.keys.left = true,
                    "ArrowRight" | "d" | "D" => g.keys.right = true,
                    " " if fresh => g.input.fire = true,
                    "Shift" if fresh => g.input.shotgun = true,
                    "k" | "K" if fresh => g.input.increase_difficulty = true,
                    "i" | "I" if fresh => {
                        g.input.autopilot = !g.input.autopilot;
                        log::info!("Autopilot: {}", g.input.autopilot);
                    }
                    // Preferences
                    "q" | "Q" if fresh => g.change_settings(|s| s.apply_preset(s.quality.next())),
                    "p" | "P" if fresh => g.change_settings(|s| s.path_preview = !s.path_preview),
                    "h" | "H" if fresh => g.change_settings(|s| s.high_contrast = !s.high_contrast),
                    "m" | "M" if fresh => {
                        g.change_settings(|s| s.reduced_motion = !s.reduced_motion)
                    }
                    "f" | "F" if fresh => g.change_settings(|s| s.show_fps = !s.show_fps),
                    "-" => g.change_settings(|s| s.adjust_master_volume(-0.1)),
                    "=" | "+" => g.change_settings(|s| s.adjust_master_volume(0.1)),
                    "Enter" if fresh => {
                        let g = &mut *g;
                        if g.ui.confirm(&mut g.state) {
                            g.dispatch_events();
                        }
                        if g.ui.cursor_locked() && !g.pointer_locked {
                            request_pointer_lock(&doc);
                        }
                    }
                    _ => return,
                }
                event.prevent_default();
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Key up
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                match event.key().as_str() {
                    "ArrowLeft" | "a" | "A" => g.keys.left = false,
                    "ArrowRight" | "d" | "D" => g.keys.right = false,
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        for button in [Button::StartGame, Button::NextWave, Button::BackToStart] {
            let Some(el) = document.get_element_by_id(button.element_id()) else {
                log::warn!("Missing button #{}", button.element_id());
                continue;
            };
            let game = game.clone();
            let doc = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let mut g = game.borrow_mut();
                g.press(button);
                if g.ui.cursor_locked() && !g.pointer_locked {
                    request_pointer_lock(&doc);
                }
            });
            let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_focus_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };

        // Window blur: drop held keys, optionally mute
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                let mut g = game.borrow_mut();
                g.keys = HeldKeys::default();
                if g.settings.mute_on_blur {
                    g.audio.set_muted(true);
                }
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::FocusEvent| {
                game.borrow_mut().audio.set_muted(false);
            });
            let _ =
                window.add_event_listener_with_callback("focus", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Keep the canvas backing store and surface at the displayed size
    fn setup_resize_handler(game: Rc<RefCell<Game>>, canvas: HtmlCanvasElement) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let win = window.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let dpr = win.device_pixel_ratio();
            let width = (canvas.client_width() as f64 * dpr) as u32;
            let height = (canvas.client_height() as f64 * dpr) as u32;
            if width == 0 || height == 0 {
                return;
            }
            canvas.set_width(width);
            canvas.set_height(height);
            if let Some(render_state) = game.borrow_mut().render_state.as_mut() {
                render_state.resize(width, height);
                log::debug!("Resized to {}x{}", width, height);
            }
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
            if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                g.update_hud(&document);
            }
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::fmt;
    use std::path::PathBuf;

    use clap::Parser;

    use invader_waves::audio::SoundEffect;
    use invader_waves::consts::SIM_DT;
    use invader_waves::highscores::{HighScores, now_ms};
    use invader_waves::sim::{GameState, TickInput, tick};
    use invader_waves::tuning::{GameSettings, TuningError};
    use invader_waves::ui::{Panel, UiState};

    /// Seed used when none is given on the command line
    const DEFAULT_SEED: u64 = 1978;
    /// Ten minutes of play at 120 Hz
    const MAX_TICKS: u64 = 120 * 60 * 10;

    #[derive(Parser, Debug)]
    #[command(name = "invader-waves")]
    #[command(about = "Headless autopilot run of Invader Waves")]
    pub struct Cli {
        /// Tuning JSON; built-in balance when omitted
        pub tuning: Option<PathBuf>,
        /// Simulation RNG seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        pub seed: u64,
    }

    #[derive(Debug)]
    pub enum CliError {
        Io {
            path: PathBuf,
            source: std::io::Error,
        },
        Tuning(TuningError),
    }

    impl fmt::Display for CliError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Self::Io { path, source } => {
                    write!(f, "cannot read {}: {}", path.display(), source)
                }
                Self::Tuning(err) => write!(f, "{err}"),
            }
        }
    }

    impl std::error::Error for CliError {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            match self {
                Self::Io { source, .. } => Some(source),
                Self::Tuning(err) => Some(err),
            }
        }
    }

    impl From<TuningError> for CliError {
        fn from(err: TuningError) -> Self {
            Self::Tuning(err)
        }
    }

    fn load_tuning(path: Option<&PathBuf>) -> Result<GameSettings, CliError> {
        let Some(path) = path else {
            log::info!("Using built-in tuning");
            return Ok(GameSettings::default());
        };
        let json = std::fs::read_to_string(path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?;
        let settings = GameSettings::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(settings)
    }

    pub fn run(cli: &Cli) -> Result<(), CliError> {
        let settings = load_tuning(cli.tuning.as_ref())?;
        let seed = cli.seed;

        let mut state = GameState::new(seed, settings);
        let mut ui = UiState::new();
        let mut high_scores = HighScores::load();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };

        log::info!("Autopilot run, seed {}", seed);
        ui.start_game(&mut state);

        for _ in 0..MAX_TICKS {
            tick(&mut state, &input, SIM_DT);

            for event in state.drain_events() {
                log::debug!("t={} {:?}", state.time_ticks, event);
                if let Some(effect) = SoundEffect::for_event(&event) {
                    log::trace!("sfx {:?}", effect);
                }
                ui.handle_event(&event);
            }

            match ui.panel() {
                Panel::NextWave => {
                    ui.confirm(&mut state);
                }
                Panel::GameOver => break,
                _ => {}
            }
        }

        if ui.panel() != Panel::GameOver {
            log::warn!("Tick limit reached on wave {}", state.wave);
        }

        let rank = high_scores.add_score(state.score, state.wave, now_ms());
        high_scores.save();

        println!(
            "Score {} on wave {} after {:.1}s (seed {})",
            ui.score_label,
            ui.wave_label,
            state.time_ticks as f32 * SIM_DT,
            seed
        );
        if let Some(rank) = rank {
            println!("High score rank #{rank}");
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_cli_defaults() {
            let cli = Cli::try_parse_from(["invader-waves"]).expect("parse");
            assert_eq!(cli.seed, DEFAULT_SEED);
            assert!(cli.tuning.is_none());

            let cli = Cli::try_parse_from(["invader-waves", "hard.json", "--seed", "42"])
                .expect("parse");
            assert_eq!(cli.seed, 42);
            assert_eq!(cli.tuning, Some(PathBuf::from("hard.json")));
        }

        #[test]
        fn test_cli_rejects_bad_seed() {
            assert!(Cli::try_parse_from(["invader-waves", "--seed", "-1"]).is_err());
        }

        #[test]
        fn test_missing_tuning_file() {
            let path = PathBuf::from("/nonexistent/tuning.json");
            let err = load_tuning(Some(&path)).unwrap_err();
            assert!(matches!(err, CliError::Io { .. }));
            assert!(err.to_string().starts_with("cannot read"));
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Invader Waves (native) starting...");

    let cli = headless::Cli::parse();
    if let Err(e) = headless::run(&cli) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
