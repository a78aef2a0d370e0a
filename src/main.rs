//! Purchasing Power Pig entry point
//!
//! Handles platform-specific initialization and runs the simulation loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlInputElement, KeyboardEvent, MouseEvent};

    use purchasing_power_pig::persistence::LocalStoragePreferences;
    use purchasing_power_pig::sim::finance::BalanceState;
    use purchasing_power_pig::sim::{
        Field, SavingsVehicle, Scheduler, SchedulerEvent, SimulationEngine, SimulationState, Topic,
    };
    use purchasing_power_pig::{Settings, SliderInput, SystemClock, platform};

    /// Engine plus the timer driving it
    struct App {
        engine: SimulationEngine,
        scheduler: Scheduler,
    }

    impl App {
        fn new(settings: Settings) -> Self {
            Self {
                engine: SimulationEngine::new(
                    settings,
                    Box::new(SystemClock),
                    Box::new(LocalStoragePreferences),
                ),
                scheduler: Scheduler::new(),
            }
        }

        /// Advance timers; inflation drops go straight into the mug
        fn update(&mut self, now_ms: f64) {
            for event in self.scheduler.update(now_ms, &mut self.engine) {
                match event {
                    SchedulerEvent::InflationApplied { dollars, .. } => {
                        self.engine.land_inflation_drop(dollars);
                    }
                    SchedulerEvent::Finished { date } => {
                        log::info!("30 years complete ({})", date);
                    }
                    _ => {}
                }
            }
        }
    }

    fn document() -> Option<web_sys::Document> {
        web_sys::window()?.document()
    }

    fn set_text(id: &str, text: &str) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            el.set_text_content(Some(text));
        }
    }

    fn set_height(id: &str, percent: f64) {
        if let Some(el) = document().and_then(|d| d.get_element_by_id(id)) {
            let _ = el.set_attribute("style", &format!("height: {:.2}%", percent));
        }
    }

    /// Read a slider's current string value
    fn slider_value(input: SliderInput) -> Option<String> {
        document()?
            .get_element_by_id(input.as_str())?
            .dyn_into::<HtmlInputElement>()
            .ok()
            .map(|el| el.value())
    }

    fn render_state(state: &SimulationState) {
        set_height("pig-liquid", state.fill_level);
        set_height("mug-liquid", state.mug_fill_level);
        set_text("sim-date", &state.current_sim_date.format("%b %Y").to_string());
        set_text("total-bank-savings", &format!("${:.0}", state.total_bank_savings));
        set_text("nominal-saved", &format!("${:.0}", state.nominal_dollars_saved));
        let lost = (1.0 - 1.0 / state.cumulative_inflation_factor) * 100.0;
        set_text("pp-lost", &format!("{:.1}%", lost));
        let balance = match state.savings_vehicle {
            SavingsVehicle::Usd => format!("${:.0}", state.total_savings),
            SavingsVehicle::Btc => format!("₿{:.4}", state.total_savings_btc),
        };
        set_text("total-savings", &balance);
    }

    fn render_balance_hint(settings: &Settings) {
        let hint = match settings.balance_state() {
            BalanceState::Balanced => "Balanced",
            BalanceState::Grow => "Growing",
            BalanceState::Shrink => "Shrinking",
        };
        set_text("balance-hint", hint);
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }
        log::info!("Purchasing Power Pig starting...");

        let mut settings = Settings::default();
        for input in [
            SliderInput::StartingAmount,
            SliderInput::MonthlySavings,
            SliderInput::InflationPct,
        ] {
            if let Some(raw) = slider_value(input) {
                settings.set_from_raw(input, &raw);
            }
        }
        render_balance_hint(&settings);

        let app = Rc::new(RefCell::new(App::new(settings)));
        {
            let mut a = app.borrow_mut();
            a.engine.subscribe(Topic::Any, |state, _| render_state(state));
            a.engine
                .subscribe(Topic::Field(Field::Phase), |state, _| {
                    set_text("phase", &format!("{:?}", state.phase));
                });
            render_state(a.engine.state());
        }

        setup_sliders(app.clone());
        setup_buttons(app.clone());
        setup_keyboard(app.clone());
        request_animation_frame(app);

        log::info!("Purchasing Power Pig ready - press Enter to start");
    }

    fn setup_sliders(app: Rc<RefCell<App>>) {
        let Some(document) = document() else { return };
        for input in [
            SliderInput::StartingAmount,
            SliderInput::MonthlySavings,
            SliderInput::InflationPct,
        ] {
            let Some(el) = document.get_element_by_id(input.as_str()) else {
                log::warn!("Slider #{} missing", input.as_str());
                continue;
            };
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let mut a = app.borrow_mut();
                if let Some(raw) = slider_value(input) {
                    a.engine.set_input(input, &raw);
                }
                render_balance_hint(a.engine.settings());
                // Starting amount only matters before the run begins
                if input == SliderInput::StartingAmount && a.engine.state().is_start_state() {
                    a.engine.reset_simulation(None);
                }
            });
            let _ = el.add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_buttons(app: Rc<RefCell<App>>) {
        let Some(document) = document() else { return };

        if let Some(btn) = document.get_element_by_id("start-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                let App { engine, scheduler } = &mut *a;
                if engine.state().is_start_state() {
                    scheduler.start(platform::now_ms(), engine);
                } else {
                    engine.toggle_pause();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let app = app.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                let App { engine, scheduler } = &mut *a;
                scheduler.restart(platform::now_ms(), engine);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("vehicle-toggle") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut a = app.borrow_mut();
                let next = a.engine.state().savings_vehicle.other();
                if !a.engine.set_savings_vehicle(next) {
                    log::warn!("Savings vehicle unchanged");
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_keyboard(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            let mut a = app.borrow_mut();
            let App { engine, scheduler } = &mut *a;
            match event.key().as_str() {
                "Enter" if engine.state().is_start_state() => {
                    scheduler.start(platform::now_ms(), engine);
                }
                " " | "Escape" => {
                    engine.toggle_pause();
                }
                _ => {}
            }
        });
        let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            app.borrow_mut().update(time);
            request_animation_frame(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_app::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use purchasing_power_pig::consts::MONTH_INTERVAL_MS;
    use purchasing_power_pig::sim::{
        Field, SavingsVehicle, Scheduler, SchedulerEvent, SimulationEngine, Topic,
    };
    use purchasing_power_pig::{MemoryPreferences, Settings, SliderInput, SystemClock};

    env_logger::init();
    log::info!("Purchasing Power Pig (native, headless) starting...");

    // [start] [monthly] [inflation%] [usd|btc]
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut settings = Settings::default();
    for (input, raw) in [
        SliderInput::StartingAmount,
        SliderInput::MonthlySavings,
        SliderInput::InflationPct,
    ]
    .into_iter()
    .zip(args.iter())
    {
        settings.set_from_raw(input, raw);
    }
    let vehicle = args
        .get(3)
        .and_then(|v| SavingsVehicle::from_str(v))
        .unwrap_or_default();

    println!(
        "Start ${:.0}, saving ${:.0}/month, {:.1}% inflation, held in {} ({:?})",
        settings.starting_amount,
        settings.monthly_savings,
        settings.inflation_pct,
        vehicle.as_str(),
        settings.balance_state(),
    );

    let mut engine = SimulationEngine::new(
        settings,
        Box::new(SystemClock),
        Box::new(MemoryPreferences::with_vehicle(vehicle)),
    );
    engine.subscribe(Topic::Field(Field::MonthsElapsed), |state, _| {
        if state.months_elapsed % 60 == 0 {
            println!(
                "  {}  pig {:5.1}%  mug {:5.1}%  lost ${:.0}",
                state.current_sim_date.format("%Y-%m"),
                state.fill_level,
                state.mug_fill_level,
                state.total_bank_savings
            );
        }
    });

    // Simulated wall clock; no sleeping
    let mut scheduler = Scheduler::new();
    let mut now = 0.0;
    scheduler.start(now, &mut engine);
    while !engine.state().is_simulation_finished() || scheduler.pending_inflation() > 0 {
        now += MONTH_INTERVAL_MS / 4.0;
        for event in scheduler.update(now, &mut engine) {
            if let SchedulerEvent::InflationApplied { dollars, .. } = event {
                engine.land_inflation_drop(dollars);
            }
        }
    }

    let gain_loss = engine.gained_or_lost_info();
    println!(
        "After 30 years: purchasing power ${:.0} vs ${:.0} saved ({:?}), {:.1}% of a dollar's value lost",
        engine.purchasing_power_value(),
        engine.state().nominal_dollars_saved,
        gain_loss,
        engine.purchasing_power_lost_percent(),
    );
    match serde_json::to_string_pretty(&engine.snapshot()) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Could not serialize final state: {}", e),
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
