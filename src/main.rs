//! ArbiStrike entry point
//!
//! Browser host (canvas, DOM overlays, fetch) on wasm32; a headless typing bot
//! on native targets.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlCanvasElement, KeyboardEvent};

    use arbistrike::audio::{AudioManager, SoundEffect};
    use arbistrike::challenge::{ChallengeStore, ScoreSubmission, SubmitError, report_score};
    use arbistrike::net::ApiClient;
    use arbistrike::renderer::{
        CanvasRenderer, HudView, Overlay, format_score, leaderboard_rows, submission_message,
    };
    use arbistrike::settings::FailureMode;
    use arbistrike::sim::SessionState;
    use arbistrike::{ChallengeContext, HighScores, Session, Settings, platform};

    /// Game instance holding all state
    struct Game {
        session: Session,
        settings: Settings,
        renderer: Option<CanvasRenderer>,
        audio: AudioManager,
        api: Option<ApiClient>,
        last_time: f64,
        /// Overlay shown last frame, so the DOM is only touched on change
        shown_overlay: Option<Overlay>,
    }

    impl Game {
        fn new(settings: Settings, seed: u64) -> Self {
            let session = Session::new(settings.game_config(), HighScores::load(), seed);
            let mut audio = AudioManager::new();
            audio.set_master_volume(settings.effective_volume());
            Self {
                session,
                settings,
                renderer: None,
                audio,
                api: ApiClient::from_location(),
                last_time: 0.0,
                shown_overlay: None,
            }
        }

        /// Advance the session and present the frame
        fn update(&mut self, dt: f32, time: f64) {
            self.session.frame(dt);

            let events = self.session.drain_events();
            for event in &events {
                if let Some(effect) = SoundEffect::for_event(event) {
                    self.audio.play(effect);
                }
            }

            if let Some(renderer) = &mut self.renderer {
                renderer.observe(&self.session.game, &events, time, self.settings.reduced_motion);
                renderer.render(&self.session.game, time);
            }
        }

        fn start_run(&mut self) {
            if self.session.status() == SessionState::Running {
                return;
            }
            self.session.game.config = self.settings.game_config();
            let seed = js_sys::Date::now() as u64;
            if self.session.start(seed) {
                self.audio.resume();
                log::info!("Run started with seed: {}", seed);
            }
        }

        fn toggle_failure_mode(&mut self) {
            self.settings.failure_mode = match self.settings.failure_mode {
                FailureMode::Instant => FailureMode::Lives,
                FailureMode::Lives => FailureMode::Instant,
            };
            self.settings.save();
            if let Some(doc) = document() {
                set_text(&doc, "mode-btn", &format!("Mode: {}", self.settings.failure_mode.as_str()));
            }
        }

        fn toggle_sound(&mut self) {
            self.settings.audio_enabled = !self.settings.audio_enabled;
            self.audio.set_master_volume(self.settings.effective_volume());
            self.settings.save();
            if let Some(doc) = document() {
                let label = if self.settings.audio_enabled { "Sound: On" } else { "Sound: Off" };
                set_text(&doc, "sound-btn", label);
            }
        }

        /// Fit the playfield to the canvas element
        fn resize(&mut self, canvas: &HtmlCanvasElement) {
            let width = canvas.client_width() as f32;
            let height = canvas.client_height() as f32;
            self.session.resize(width, height);
            let playfield = self.session.game.playfield;
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(playfield.width, playfield.height, dpr);
            }
        }

        /// Update HUD elements in DOM
        fn update_hud(&mut self) {
            let Some(doc) = document() else { return };
            let hud = HudView::from_session(&self.session);

            set_text(&doc, "hud-score", &hud.score);
            set_text(&doc, "hud-best", &hud.best);
            set_text(&doc, "hud-phase", hud.phase);
            set_text(&doc, "hud-wave", &hud.wave.to_string());
            set_text(&doc, "hud-streak", &hud.streak.to_string());
            set_text(&doc, "hud-accuracy", &format!("{}%", hud.accuracy));
            match hud.lives {
                Some(lives) => {
                    set_visible(&doc, "hud-lives-item", true);
                    set_text(&doc, "hud-lives", &lives.to_string());
                }
                None => set_visible(&doc, "hud-lives-item", false),
            }

            let overlay = Overlay::for_state(self.session.status());
            if overlay == Overlay::GameOver {
                // Submission status changes while the card is up
                let status = submission_message(self.session.submission_state());
                set_text(&doc, "submit-status", status.as_deref().unwrap_or(""));
                set_visible(&doc, "restart-btn", self.session.can_start());
            }
            if self.shown_overlay == Some(overlay) {
                return;
            }
            self.shown_overlay = Some(overlay);

            if matches!(overlay, Overlay::Menu | Overlay::GameOver) {
                self.show_leaderboard(&doc);
            }

            set_visible(&doc, "menu", overlay == Overlay::Menu);
            set_visible(&doc, "pause-menu", overlay == Overlay::Paused);
            set_visible(&doc, "game-over", overlay == Overlay::GameOver);

            if overlay == Overlay::GameOver {
                if let Some(summary) = self.session.summary() {
                    set_text(&doc, "final-score", &format_score(summary.score));
                    set_text(&doc, "final-wpm", &summary.wpm.to_string());
                    set_text(&doc, "final-accuracy", &format!("{}%", summary.accuracy));
                    set_text(&doc, "final-destroyed", &summary.destroyed.to_string());
                    set_text(&doc, "final-streak", &summary.longest_streak.to_string());
                    set_text(&doc, "final-wave", &summary.wave.to_string());
                    let share = if self.session.challenge().is_none() {
                        summary.share_text()
                    } else {
                        String::new()
                    };
                    set_text(&doc, "share-text", &share);
                }
                set_visible(&doc, "new-best", self.session.is_new_best());
            }
        }

        /// Fill both leaderboard lists with the local top runs
        fn show_leaderboard(&self, doc: &Document) {
            let scores = self.session.high_scores();
            // Rows hold only digits and fixed words
            let html: String = if scores.is_empty() {
                "<li>No scores yet</li>".to_string()
            } else {
                leaderboard_rows(scores, js_sys::Date::now())
                    .iter()
                    .map(|row| {
                        format!(
                            "<li>#{} {} &middot; {} WPM &middot; {}% &middot; wave {} &middot; {}</li>",
                            row.rank, row.score, row.wpm, row.accuracy, row.wave, row.age
                        )
                    })
                    .collect()
            };
            for id in ["leaderboard-menu", "leaderboard-over"] {
                if let Some(list) = doc.get_element_by_id(id) {
                    list.set_inner_html(&html);
                }
            }
        }
    }

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(doc: &Document, id: &str, text: &str) {
        if let Some(el) = doc.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_visible(doc: &Document, id: &str, visible: bool) {
        if let Some(el) = doc.get_element_by_id(id) {
            let _ = if visible {
                el.class_list().remove_1("hidden")
            } else {
                el.class_list().add_1("hidden")
            };
        }
    }

    /// Send the run's score and feed the outcome back to the session
    fn spawn_submission(game: Rc<RefCell<Game>>, submission: ScoreSubmission) {
        let (api, role, info) = {
            let g = game.borrow();
            let role = g.session.challenge().map(|c| c.role);
            (g.api.clone(), role, g.session.challenge_info().cloned())
        };

        wasm_bindgen_futures::spawn_local(async move {
            // Without a loaded record, report_score looks the challenge up first
            let result = match (api, role) {
                (Some(api), Some(role)) => {
                    report_score(&api, &api, &submission, role, info.as_ref()).await
                }
                _ => Err(SubmitError::Transport("challenge API unavailable".into())),
            };
            game.borrow_mut().session.record_submission_result(result);
        });
    }

    /// Load the stored challenge so the follow-up after submission is known
    fn load_challenge_info(game: Rc<RefCell<Game>>, context: ChallengeContext) {
        let Some(api) = game.borrow().api.clone() else { return };
        wasm_bindgen_futures::spawn_local(async move {
            match api.fetch_challenge(context.challenge_id).await {
                Ok(info) => {
                    if info.role_of(context.player.fid) != Some(context.role) {
                        log::warn!(
                            "fid {} does not hold the {} seat of challenge {}",
                            context.player.fid,
                            context.role.as_str(),
                            info.id
                        );
                    }
                    game.borrow_mut().session.set_challenge_info(info);
                }
                Err(e) => log::error!("Failed to load challenge {}: {}", context.challenge_id, e),
            }
        });
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("ArbiStrike starting...");

        let Some(document) = document() else {
            log::error!("No document");
            return;
        };

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("Canvas element #canvas not found");
            return;
        };

        let settings = Settings::load();
        let game = Rc::new(RefCell::new(Game::new(settings, js_sys::Date::now() as u64)));

        match CanvasRenderer::new(canvas.clone()) {
            Ok(renderer) => game.borrow_mut().renderer = Some(renderer),
            Err(e) => log::error!("Renderer unavailable: {}", e),
        }
        game.borrow_mut().resize(&canvas);

        if let Some(context) = ChallengeContext::from_params(platform::query_param) {
            game.borrow_mut().session.set_challenge(context.clone());
            set_visible(&document, "challenge-banner", true);
            load_challenge_info(game.clone(), context);
        }

        {
            let g = game.borrow();
            set_text(&document, "mode-btn", &format!("Mode: {}", g.settings.failure_mode.as_str()));
            let label = if g.settings.audio_enabled { "Sound: On" } else { "Sound: Off" };
            set_text(&document, "sound-btn", label);
        }

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.class_list().add_1("hidden");
        }

        setup_keyboard(game.clone());
        setup_buttons(game.clone());
        setup_resize(game.clone(), canvas);
        setup_auto_pause(game.clone());

        request_animation_frame(game);
    }

    fn setup_keyboard(game: Rc<RefCell<Game>>) {
        let Some(document) = document() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if event.repeat() || event.ctrl_key() || event.meta_key() || event.alt_key() {
                return;
            }
            let key = event.key();
            let mut g = game.borrow_mut();
            match g.session.status() {
                SessionState::Running | SessionState::Paused => {
                    if key == "Escape" || key.chars().count() == 1 {
                        event.prevent_default();
                    }
                    g.session.handle_key(&key);
                }
                SessionState::Idle | SessionState::Ended => {
                    if key == "Enter" {
                        g.start_run();
                    }
                }
            }
        });
        let _ = document.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn on_click(id: &str, game: &Rc<RefCell<Game>>, action: fn(&mut Game)) {
        let Some(btn) = document().and_then(|d| d.get_element_by_id(id)) else { return };
        let game = game.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
            action(&mut game.borrow_mut());
        });
        let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_buttons(game: Rc<RefCell<Game>>) {
        on_click("start-btn", &game, Game::start_run);
        on_click("restart-btn", &game, Game::start_run);
        on_click("resume-btn", &game, |g| {
            g.session.toggle_pause();
        });
        on_click("quit-btn", &game, |g| g.session.dispose());
        on_click("mode-btn", &game, Game::toggle_failure_mode);
        on_click("sound-btn", &game, Game::toggle_sound);
    }

    fn setup_resize(game: Rc<RefCell<Game>>, canvas: HtmlCanvasElement) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().resize(&canvas);
        });
        let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        let submission = {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.update(dt, time);
            g.update_hud();
            g.session.take_submission()
        };

        if let Some(submission) = submission {
            spawn_submission(game.clone(), submission);
        }

        request_animation_frame(game);
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let Some(document) = window.document() else { return };

        // Visibility change (tab switch, minimize)
        {
            let game = game.clone();
            let document_clone = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
                let mut g = game.borrow_mut();
                if hidden {
                    g.session.auto_pause();
                }
                let mute = hidden && g.settings.mute_on_blur;
                g.audio.set_muted(mute);
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
                game.borrow_mut().session.auto_pause();
            });
            let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

/// Headless run with a typing bot: roughly 40% of frames land a keystroke,
/// one in twenty of them wrong
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use arbistrike::consts::SIM_DT;
    use arbistrike::sim::SessionState;
    use arbistrike::{HighScores, Session, Settings};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    env_logger::init();
    log::info!("ArbiStrike (native) starting headless bot run...");
    log::info!("Run with `trunk serve` for the playable web version");

    let seed = std::env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let settings = Settings::load();
    let mut session = Session::new(settings.game_config(), HighScores::load(), seed);
    let mut bot = Pcg32::seed_from_u64(seed ^ 0x5eed);
    session.start(seed);

    // Ten simulated minutes at most
    let max_frames = (600.0 / SIM_DT) as u32;
    for _ in 0..max_frames {
        session.frame(SIM_DT);
        if session.status() != SessionState::Running {
            break;
        }
        if !bot.random_bool(0.4) {
            continue;
        }

        let game = &session.game;
        let key = if bot.random_bool(0.05) {
            Some('z')
        } else {
            // Keep typing the lock, else pick whatever is lowest on screen
            game.locked_enemy()
                .or_else(|| {
                    game.enemies
                        .iter()
                        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
                })
                .and_then(|e| e.next_char())
        };
        if let Some(key) = key {
            session.key_press(key);
        }
    }
    session.finish_run();

    match session.summary() {
        Some(summary) => {
            log::info!(
                "Bot run over after {:.1}s in phase {}",
                summary.duration_seconds,
                session.game.phase.as_str()
            );
            println!("{}", summary.share_text());
        }
        None => log::warn!("Run produced no summary"),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
