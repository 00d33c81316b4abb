//! Christmas Tree Bowling entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, PointerEvent};

    use glam::Vec2;
    use tree_bowling::audio::{Conductor, WebAudioSink};
    use tree_bowling::consts::*;
    use tree_bowling::renderer::{CanvasRenderer, draw_list};
    use tree_bowling::settings::Settings;
    use tree_bowling::sim::{
        GameEvent, Playground, PointerKind, TickInput, TouchEvent, TouchPhase, TouchSample,
        dispatch, tick, tilt_to_angles,
    };

    /// Game instance holding all state
    struct Game {
        playground: Playground,
        renderer: CanvasRenderer,
        conductor: Conductor,
        settings: Settings,
        accumulator: f32,
        last_time: f64,
        input: TickInput,
        // FPS tracking
        frame_times: [f64; 60],
        frame_index: usize,
        fps: u32,
    }

    impl Game {
        /// Run simulation ticks
        fn update(&mut self, dt: f32, time: f64) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                tick(&mut self.playground, &self.input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                // Clear one-shot inputs after processing
                self.input = TickInput::default();
            }

            let mut sounds = Vec::new();
            for event in self.playground.drain_events() {
                match event {
                    GameEvent::Sound(intent) => sounds.push(intent),
                    GameEvent::Launched { impulse } => log::debug!("Launched {}", impulse),
                    GameEvent::Reset { trees } => log::debug!("Reset to {} trees", trees),
                }
            }
            dispatch(sounds, &mut self.conductor);

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
        fn render(&self) {
            let camera = self.playground.camera();
            let commands = draw_list(
                &self.playground.scene,
                &camera,
                self.playground.viewport,
                self.playground.snow.flakes(),
            );
            self.renderer.render(&commands);
            if self.settings.show_fps {
                self.renderer.overlay(&format!("{} fps", self.fps));
            }
        }

        /// Match the canvas to its CSS size at device resolution
        fn fit_canvas(&mut self, canvas: &HtmlCanvasElement) {
            let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio());
            let width = (canvas.client_width() as f64 * dpr) as u32;
            let height = (canvas.client_height() as f64 * dpr) as u32;
            let viewport = self.renderer.resize(width, height);
            self.input.viewport = Some(viewport);
        }
    }

    /// Convert a DOM pointer event into a touch sample in canvas pixels
    fn touch_sample(event: &PointerEvent) -> TouchSample {
        let dpr = web_sys::window().map_or(1.0, |w| w.device_pixel_ratio()) as f32;
        let location = Vec2::new(event.offset_x() as f32, event.offset_y() as f32) * dpr;
        match event.pointer_type().as_str() {
            "pen" => {
                let (altitude, azimuth) =
                    tilt_to_angles(event.tilt_x() as f32, event.tilt_y() as f32);
                TouchSample::stylus(location, altitude, azimuth)
            }
            "touch" => TouchSample::pointer(location, PointerKind::Direct),
            _ => TouchSample::pointer(location, PointerKind::Mouse),
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Christmas Tree Bowling starting...");

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document to attach to");
            return;
        };

        let Some(canvas) = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("No <canvas id=\"canvas\"> found");
            return;
        };

        let Some(renderer) = CanvasRenderer::new(canvas.clone()) else {
            log::error!("Canvas 2D context unavailable");
            return;
        };

        let settings = Settings::load();
        let seed = js_sys::Date::now() as u64;
        let conductor = Conductor::from_settings(Box::new(WebAudioSink::new()), &settings);
        let game = Rc::new(RefCell::new(Game {
            playground: Playground::new(seed, &settings),
            renderer,
            conductor,
            settings,
            accumulator: 0.0,
            last_time: 0.0,
            input: TickInput::default(),
            frame_times: [0.0; 60],
            frame_index: 0,
            fps: 0,
        }));
        game.borrow_mut().fit_canvas(&canvas);

        log::info!("Game initialized with seed: {}", seed);

        setup_input_handlers(&canvas, game.clone());
        setup_resize(canvas, game.clone());
        setup_reset_button(game.clone());

        request_animation_frame(game);

        log::info!("Christmas Tree Bowling running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let phases = [
            ("pointerdown", TouchPhase::Began),
            ("pointermove", TouchPhase::Moved),
            ("pointerup", TouchPhase::Ended),
            ("pointercancel", TouchPhase::Cancelled),
        ];
        for (name, phase) in phases {
            let game = game.clone();
            let target = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                // Hover moves without a press are not aiming
                if phase == TouchPhase::Moved && event.buttons() == 0 {
                    return;
                }
                event.prevent_default();
                if phase == TouchPhase::Began {
                    let _ = target.set_pointer_capture(event.pointer_id());
                }
                let sample = touch_sample(&event);
                game.borrow_mut()
                    .input
                    .touches
                    .push(TouchEvent::new(phase, sample));
            });
            let _ = canvas.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_resize(canvas: HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().fit_canvas(&canvas);
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

            // Calculate delta time
            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            g.last_time = time;

            g.update(dt, time);
            g.render();
        }

        request_animation_frame(game);
    }

    fn setup_reset_button(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };

        if let Some(btn) = document.get_element_by_id("reset-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                game.borrow_mut().input.reset = true;
                log::info!("Reset requested");
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Christmas Tree Bowling (native) starting...");
    log::info!(
        "Native mode plays a scripted session headless - run with `trunk serve` for the web version"
    );

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| tree_bowling::Settings::DEFAULT_PATH.to_string());
    let settings = tree_bowling::Settings::load_from(&path);
    headless::run(&settings);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::cell::RefCell;
    use std::f32::consts::FRAC_PI_2;
    use std::rc::Rc;

    use glam::Vec2;
    use tree_bowling::audio::{Conductor, Instrument, Note, NoteSink, OfflineSynth};
    use tree_bowling::consts::SIM_DT;
    use tree_bowling::renderer::draw_list;
    use tree_bowling::settings::Settings;
    use tree_bowling::sim::{
        GameEvent, Playground, SoundCue, TickInput, TouchEvent, TouchPhase, TouchSample, dispatch,
        formation_positions, tick,
    };

    const SAMPLE_RATE: u32 = 44_100;

    /// Lets the session read the synth back after the conductor owns it
    struct SharedSynth(Rc<RefCell<OfflineSynth>>);

    impl NoteSink for SharedSynth {
        fn play(&mut self, instrument: &Instrument, note: Note) {
            self.0.borrow_mut().play(instrument, note);
        }
    }

    /// Stylus throws: (altitude, azimuth)
    fn throws() -> [(f32, Vec2); 4] {
        [
            (FRAC_PI_2, Vec2::X),
            (1.2, Vec2::X),
            (1.2, Vec2::new(-1.0, 0.0)),
            (1.0, Vec2::new(0.6, -0.8)),
        ]
    }

    pub fn run(settings: &Settings) {
        let seed = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64);
        let synth = Rc::new(RefCell::new(OfflineSynth::new(SAMPLE_RATE)));
        let mut conductor =
            Conductor::from_settings(Box::new(SharedSynth(synth.clone())), settings);
        let mut playground = Playground::new(seed, settings);
        let viewport = playground.viewport;
        let center = Vec2::new(viewport.width / 2.0, viewport.height / 2.0);

        log::info!("Session seed: {}", seed);

        let mut bells = 0;
        let mut metal = 0;
        let mut run_ticks = |playground: &mut Playground, input: &TickInput, count: usize| {
            for i in 0..count {
                let input = if i == 0 { input.clone() } else { TickInput::default() };
                tick(playground, &input, SIM_DT);
                let intents: Vec<_> = playground
                    .drain_events()
                    .into_iter()
                    .filter_map(|event| match event {
                        GameEvent::Sound(intent) => Some(intent),
                        _ => None,
                    })
                    .collect();
                for intent in &intents {
                    match intent.cue {
                        SoundCue::Bells => bells += 1,
                        SoundCue::MetalBar => metal += 1,
                    }
                }
                dispatch(intents, &mut conductor);
                synth.borrow_mut().advance(SIM_DT);
            }
        };

        // Let the formation settle
        run_ticks(&mut playground, &TickInput::default(), 120);

        for (round, (altitude, azimuth)) in throws().into_iter().enumerate() {
            let sample = TouchSample::stylus(center, altitude, azimuth);
            let throw = TickInput {
                touches: vec![
                    TouchEvent::new(TouchPhase::Began, sample),
                    TouchEvent::new(TouchPhase::Ended, sample),
                ],
                ..Default::default()
            };
            run_ticks(&mut playground, &throw, 240);

            let slots = formation_positions(playground.rows, playground.spacing);
            let knocked = playground
                .trees
                .iter()
                .zip(&slots)
                .filter(|(tree, slot)| {
                    playground
                        .scene
                        .world_position(**tree)
                        .is_some_and(|p| (p - **slot).length() > 0.5)
                })
                .count();
            let commands = draw_list(
                &playground.scene,
                &playground.camera(),
                viewport,
                playground.snow.flakes(),
            );
            log::info!(
                "Throw {}: {} of {} trees knocked, {} shapes on screen",
                round + 1,
                knocked,
                playground.trees.len(),
                commands.len()
            );

            let reset = TickInput {
                reset: true,
                ..Default::default()
            };
            run_ticks(&mut playground, &reset, 120);
        }

        let synth = synth.borrow();
        log::info!(
            "Session done: {} bells, {} metal bar, {} notes rendered ({:.1}s audio, peak {:.3})",
            bells,
            metal,
            synth.notes_played(),
            synth.samples().len() as f32 / synth.sample_rate() as f32,
            synth.peak()
        );
    }
}
