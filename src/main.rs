//! Arcade engine entry point
//!
//! On the web the library is loaded as a module and `mountArcade` is called
//! by the host page. Natively this runs one game headless under the demo
//! autopilot and prints a summary:
//!
//! ```text
//! arcade-engine [game] [seed] [frames]
//! ```

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use arcade_engine::renderer::PaintList;
    use arcade_engine::{EngineConfig, GameKind, driver};

    env_logger::init();

    let mut args = std::env::args().skip(1);
    let game = match args.next().map(|s| s.parse::<GameKind>()).transpose() {
        Ok(game) => game.unwrap_or_default(),
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let seed = args
        .next()
        .unwrap_or_else(|| arcade_engine::consts::DEFAULT_SEED.to_owned());
    let frames = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(60 * 60);

    let config = EngineConfig::new(game, seed);
    let (width, height) = config.playfield();
    let mut arcade = arcade_engine::build(&config);
    arcade.set_score_callback(Box::new(|score| log::debug!("score {}", score)));

    log::info!("{} (native) starting, seed {:?}", arcade.name(), arcade.seed());
    arcade.confirm();

    let mut surface = PaintList::new(width, height);
    let ticks = driver::run_headless(arcade.as_mut(), &mut surface, frames, true);

    println!(
        "{} seed={:?} ticks={} score={} lives={} phase={:?}",
        arcade.name(),
        arcade.seed(),
        ticks,
        arcade.score(),
        arcade.lives(),
        arcade.phase()
    );
    log::info!("last frame: {} paint commands", surface.commands().len());
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The wasm entry point is `mountArcade`
}
