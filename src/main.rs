mod app;
mod cli;
mod config;
mod error;
mod logic;
mod models;
mod prediction;
mod simulation;
mod ui;

use anyhow::Context;
use app::{App, Screen};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use logic::{AgricultureSystem, CycleSummary};
use prediction::TrainingSummary;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use ui::screens::{AlertsScreen, CropsScreen, DashboardScreen, HistoryScreen, SensorsScreen};

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Dashboard);
    let tui = matches!(command, Commands::Dashboard);
    init_logging(cli.verbose, tui, cli.data_dir.as_ref())?;

    match command {
        Commands::Dashboard => {
            let config = Config::load_or_default(cli.config).context("loading configuration")?;
            run_dashboard(&config)
        }
        Commands::Run {
            cycles,
            interval,
            train,
            pins,
            pin_secs,
        } => {
            let config = Config::load_or_default(cli.config).context("loading configuration")?;
            run_headless(&config, cycles, interval, train, &pins, pin_secs)
        }
        Commands::Train { path } => {
            let config = Config::load_or_default(cli.config).context("loading configuration")?;
            run_training(&config, path)
        }
        Commands::Report { cycles } => {
            let config = Config::load_or_default(cli.config).context("loading configuration")?;
            let mut system = AgricultureSystem::new(&config)?;
            if config.predictor.dataset.is_some() {
                if let Err(e) = system.train_predictor(None) {
                    eprintln!("Training failed, using heuristic predictions: {}", e);
                }
            }
            for _ in 0..cycles {
                system.update_cycle();
            }
            let report = system.generate_report();
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Init => {
            Config::setup_interactive(cli.config).context("interactive setup")?;
            Ok(())
        }
        Commands::Check => run_check(cli.config),
    }
}

/// Log to stderr for console commands and to a file under the data
/// directory while the TUI owns the terminal.
fn init_logging(verbose: u8, tui: bool, data_dir: Option<&PathBuf>) -> anyhow::Result<()> {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if tui {
        let path = Config::log_path(data_dir).context("resolving log file location")?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
    Ok(())
}

fn run_headless(
    config: &Config,
    cycles: u64,
    interval: u64,
    train: Option<PathBuf>,
    pins: &[(String, f64)],
    pin_secs: u64,
) -> anyhow::Result<()> {
    let mut system = AgricultureSystem::new(config)?;

    let train = train.or_else(|| config.predictor.dataset.clone());
    if let Some(path) = train {
        match system.train_predictor(Some(&path)) {
            Ok(summary) => print_training(&summary),
            Err(e) => eprintln!("Training failed, using heuristic predictions: {}", e),
        }
    }

    println!(
        "{}: {} sensors, {} crops",
        config.farm.name,
        system.sensors().len(),
        system.crops().len()
    );

    if !pins.is_empty() {
        let hold = i64::try_from(pin_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .context("--pin-secs is out of range")?;
        for (sensor_id, value) in pins {
            let fault = system
                .pin_value(sensor_id, *value, hold)
                .with_context(|| format!("pinning {}", sensor_id))?;
            println!(
                "Pinned {} at {} for {}s",
                sensor_id,
                fault.value,
                hold.num_seconds()
            );
        }
    }

    for i in 0..cycles {
        let summary = system.update_cycle();
        print_cycle(&summary);
        if interval > 0 && i + 1 < cycles {
            std::thread::sleep(Duration::from_secs(interval));
        }
    }

    let report = system.generate_report();
    println!();
    println!(
        "Status: {}  Active alerts: {}  Irrigation: {}",
        report.system_status,
        report.active_alerts,
        if report.irrigation_active { "on" } else { "off" }
    );
    Ok(())
}

fn run_training(config: &Config, path: Option<PathBuf>) -> anyhow::Result<()> {
    let mut system = AgricultureSystem::new(config)?;
    let summary = system
        .train_predictor(path.as_deref())
        .context("training yield model")?;
    print_training(&summary);

    let cycle = system.update_cycle();
    println!();
    println!("Predicted yields:");
    for (crop, kg) in &cycle.yields {
        println!("  {:<12} {:>10.1} kg/ha", crop, kg);
    }
    Ok(())
}

fn run_check(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    println!("Checking configuration...");
    let config = Config::load(config_path).context("configuration is invalid")?;
    println!("  Config: OK");
    println!(
        "  Farm: {} ({}), {} sensors, {} crops",
        config.farm.name,
        config.farm.field_id,
        config.sensors.len(),
        config.crops.len()
    );

    match &config.predictor.dataset {
        Some(path) if path.exists() => println!("  Dataset: {}", path.display()),
        Some(path) => println!("  Dataset: MISSING ({})", path.display()),
        None => println!("  Dataset: not configured (heuristic predictions)"),
    }
    Ok(())
}

fn print_training(summary: &TrainingSummary) {
    println!(
        "Trained on {} rows ({} dropped), in-sample R² {:.3}",
        summary.samples, summary.dropped_rows, summary.r2
    );
    println!(
        "  {} trees, {} nodes; crop types: {}",
        summary.trees,
        summary.nodes,
        summary.crop_types.join(", ")
    );
    let mut ranked = summary.feature_importances.clone();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    for (name, importance) in ranked.iter().take(7) {
        println!("  {:<28} {:.3}", name, importance);
    }
}

fn print_cycle(summary: &CycleSummary) {
    let readings = summary
        .readings
        .iter()
        .map(|(id, v)| format!("{}={:.2}", id, v))
        .collect::<Vec<_>>()
        .join(" ");
    let yields = summary
        .yields
        .iter()
        .map(|(crop, kg)| format!("{}={:.0}", crop, kg))
        .collect::<Vec<_>>()
        .join(" ");
    println!(
        "[{}] cycle {} {}: {} | yields {}",
        summary.timestamp.format("%H:%M:%S"),
        summary.cycle,
        summary.status,
        readings,
        yields
    );
    for sensor_id in &summary.recovered {
        println!("    recovered: {}", sensor_id);
    }
    for alert in &summary.alerts_raised {
        println!("    {} {}", alert.alert_type.symbol(), alert.message);
    }
}

fn run_dashboard(config: &Config) -> anyhow::Result<()> {
    let mut app = App::new(config)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result.context("dashboard")
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
) -> error::Result<()> {
    loop {
        if app.cycle_due(Instant::now()) {
            app.run_cycle();
        }

        terminal.draw(|f| {
            let area = f.area();

            match app.screen {
                Screen::Dashboard => {
                    let screen = DashboardScreen::new(&app.system)
                        .with_status(app.status_message.as_deref());
                    f.render_widget(screen, area);
                }
                Screen::Sensors => {
                    let screen = SensorsScreen::new(&app.system)
                        .with_selection(app.sensors_state.selected_index)
                        .editing_pin(app.pin_entry.editing, &app.pin_entry.buffer);
                    f.render_widget(screen, area);
                }
                Screen::Crops => {
                    let screen = CropsScreen::new(&app.system)
                        .with_selection(app.crops_state.selected_index);
                    f.render_widget(screen, area);
                }
                Screen::Alerts => {
                    let active = app.active_alerts();
                    let rules = app.system.rules();
                    let screen = AlertsScreen::new(&active)
                        .with_total(app.system.all_alerts().len())
                        .with_selection(app.alerts_state.selected_index)
                        .with_rules(&rules);
                    f.render_widget(screen, area);
                }
                Screen::History => {
                    let index = app.crops_state.selected_index;
                    let yields = app.yield_history(index);
                    let crop_name = app
                        .system
                        .crops()
                        .get(index)
                        .map(|c| c.label())
                        .unwrap_or_default();
                    let screen = HistoryScreen::new(&app.history)
                        .with_yields(&crop_name, &yields)
                        .with_buffered(app.system.learning_history().len());
                    f.render_widget(screen, area);
                }
            }
        })?;

        // Poll with a short timeout so cycles keep running without input
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.quit();
                    }
                    _ if app.pin_entry.editing => handle_pin_input(app, key.code),
                    KeyCode::Char('q') => app.quit(),
                    KeyCode::Esc => app.switch_screen(Screen::Dashboard),
                    KeyCode::Char('u') => app.run_cycle(),
                    KeyCode::Char('t') => app.train(),
                    KeyCode::Char('f') => app.inject_fault_on_selected(),
                    KeyCode::Char('x') => app.stop_irrigation(),
                    KeyCode::Char(c) => {
                        if let Some(screen) = Screen::from_key(c) {
                            app.switch_screen(screen);
                        } else {
                            handle_screen_input(app, key.code);
                        }
                    }
                    _ => handle_screen_input(app, key.code),
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn handle_screen_input(app: &mut App, code: KeyCode) {
    match app.screen {
        Screen::Sensors => {
            let count = app.system.sensors().len();
            match code {
                KeyCode::Up => app.sensors_state.prev(),
                KeyCode::Down => app.sensors_state.next(count),
                KeyCode::Char('p') => app.start_pin(),
                KeyCode::Char('r') => app.read_selected(),
                _ => {}
            }
        }
        Screen::Crops | Screen::History => {
            let count = app.system.crops().len();
            match code {
                KeyCode::Up => app.crops_state.prev(),
                KeyCode::Down => app.crops_state.next(count),
                _ => {}
            }
        }
        Screen::Alerts => {
            let count = app.active_alerts().len();
            match code {
                KeyCode::Up => app.alerts_state.prev(),
                KeyCode::Down => app.alerts_state.next(count),
                KeyCode::Enter => app.resolve_selected_alert(),
                _ => {}
            }
        }
        Screen::Dashboard => {}
    }
}

fn handle_pin_input(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Enter => app.confirm_pin(),
        KeyCode::Esc => app.pin_entry.cancel(),
        KeyCode::Backspace => app.pin_entry.pop(),
        KeyCode::Char(c) => app.pin_entry.push(c),
        _ => {}
    }
}
