/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::fs::File;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use tracing_subscriber::EnvFilter;

use config::GameConfig;
use sim::event::GameEvent;
use sim::level::load_level_list;
use sim::step;
use sim::world::{Phase, WorldState};
use ui::input::{InputState, KeyBindings};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

/// Message durations, in frames.
const MSG_SHORT: u32 = 60;
const MSG_LONG: u32 = 200;

fn main() {
    let config = GameConfig::load();
    init_logging(&config);

    let levels = load_level_list(&config.levels_dir);
    let mut world = WorldState::new(levels);
    let keys = KeyBindings::from_config(&config.controls);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut world, &mut renderer, &keys, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        tracing::error!(error = %e, "game loop failed");
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Slidebox!");
}

/// The terminal belongs to the renderer, so logs only go to a file.
fn init_logging(config: &GameConfig) {
    let Some(path) = &config.log_file else { return };
    let file = match File::create(path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: could not open log file {}: {e}", path.display());
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("slidebox=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    tracing::info!(path = %path.display(), "logging started");
}

fn game_loop(
    world: &mut WorldState,
    renderer: &mut Renderer,
    keys: &KeyBindings,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_keys(world, &kb, keys) {
            break;
        }

        if last_tick.elapsed() >= tick_rate {
            if let Some(report) = step::step(world, false) {
                announce(world, &report.events);
            }
            last_tick = Instant::now();
        }

        world.tick_ui();
        renderer.render(world)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Returns true when the player asked to quit.
fn handle_keys(world: &mut WorldState, kb: &InputState, keys: &KeyBindings) -> bool {
    match world.phase {
        Phase::Title => {
            if kb.any_pressed(&[KeyCode::Esc, KeyCode::Char('q'), KeyCode::Char('Q')]) {
                return true;
            }
            if kb.was_pressed(KeyCode::Enter) {
                if world.levels.is_empty() {
                    world.set_message("No levels available", MSG_LONG);
                } else if let Err(e) = step::start_game(world) {
                    world.set_message(&e.to_string(), MSG_LONG);
                }
            }
        }
        Phase::Playing => handle_playing(world, kb, keys),
    }
    false
}

fn handle_playing(world: &mut WorldState, kb: &InputState, keys: &KeyBindings) {
    if kb.was_pressed(KeyCode::Esc) {
        step::return_to_title(world);
        return;
    }

    if kb.any_pressed(&[KeyCode::Char('p'), KeyCode::Char('P')]) {
        if step::toggle_pause(world) {
            tracing::debug!("paused");
        }
        return;
    }

    if kb.any_pressed(&keys.reset) {
        match step::restart_level(world) {
            Ok(()) => world.set_message("Level reset", MSG_SHORT),
            Err(e) => world.set_message(&e.to_string(), MSG_LONG),
        }
        return;
    }

    if kb.any_pressed(&[KeyCode::Char('t'), KeyCode::Char('T')]) {
        if let Some(report) = step::step(world, true) {
            announce(world, &report.events);
        }
        return;
    }

    if kb.was_pressed(KeyCode::Char(' ')) {
        match step::advance_level(world) {
            Ok(true) => {
                let name = world.current_def().map(|d| d.name.clone()).unwrap_or_default();
                world.set_message(&name, MSG_SHORT);
            }
            Ok(false) => {}
            Err(e) => world.set_message(&e.to_string(), MSG_LONG),
        }
        return;
    }

    if !world.paused {
        if let Some(dir) = keys.direction(kb) {
            step::steer_players(world, dir);
        }
    }
}

/// Surface the interesting events on the message bar.
fn announce(world: &mut WorldState, events: &[GameEvent]) {
    for e in events {
        match e {
            GameEvent::LevelSolved => {
                let msg = if world.has_next_level() {
                    "Level solved!"
                } else {
                    "Every level solved!"
                };
                world.set_message(msg, MSG_LONG);
            }
            GameEvent::PlayerFinished { .. } if !world.is_level_complete() => {
                world.set_message("Player home", MSG_SHORT);
            }
            _ => {}
        }
    }
}
