//! Tilecade entry point
//!
//! Native: a headless runner that plays the game with the autopilot for a
//! fixed number of frames and prints a summary. The browser build is driven
//! from JavaScript through `tilecade::web`.

#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use std::path::PathBuf;

    use clap::Parser;

    use tilecade::audio::SilentAudio;
    use tilecade::consts::FIXED_DT;
    use tilecade::input::Autopilot;
    use tilecade::modes::LoadState;
    use tilecade::persistence::{BestScoreStore, FileStore, MemoryStore};
    use tilecade::renderer::NullRenderer;
    use tilecade::{Difficulty, Game, Settings};

    #[derive(Parser, Debug)]
    #[command(name = "tilecade", about = "Run a tilecade title headless under the autopilot")]
    struct Cli {
        /// Run seed (overrides the title's)
        #[arg(long)]
        seed: Option<u64>,

        /// Rendered frames to simulate at 60 fps
        #[arg(long, default_value_t = 3600)]
        frames: u32,

        /// Title name, used as the storage key prefix
        #[arg(long)]
        title: Option<String>,

        /// Title settings JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where to keep the best score (kept in memory if omitted)
        #[arg(long)]
        best_score_file: Option<PathBuf>,

        /// easy, normal or hard
        #[arg(long)]
        difficulty: Option<String>,
    }

    pub fn run() {
        let cli = Cli::parse();

        let mut settings = cli
            .config
            .as_deref()
            .map(Settings::load)
            .unwrap_or_default();
        if let Some(title) = cli.title {
            settings.title = title;
        }
        if let Some(seed) = cli.seed {
            settings.seed = Some(seed);
        }
        if let Some(name) = cli.difficulty.as_deref() {
            match Difficulty::from_str(name) {
                Some(d) => settings.difficulty = d,
                None => log::warn!(
                    "Unknown difficulty '{}', keeping {}",
                    name,
                    settings.difficulty.as_str()
                ),
            }
        }

        let store: Box<dyn BestScoreStore> = match cli.best_score_file {
            Some(path) => Box::new(FileStore::new(path)),
            None => Box::new(MemoryStore::default()),
        };
        let base_seed = settings.seed.unwrap_or(12345);
        let mut game = Game::new(settings, base_seed, store, Box::new(SilentAudio));
        game.set_load_state(LoadState::Ready);

        let mut pilot = Autopilot::new();
        let mut renderer = NullRenderer::default();
        let mut steps = 0u64;
        for _ in 0..cli.frames {
            game.drive(&mut pilot);
            steps += game.frame(FIXED_DT, &mut renderer) as u64;
        }

        let session = &game.session;
        println!("Frames:     {}", renderer.frames);
        println!("Steps:      {}", steps);
        println!("Mode:       {}", game.mode().as_str());
        println!("Runs:       {}", session.runs);
        if let Some(sim) = &session.sim {
            println!("Seed:       {}", sim.seed);
            println!(
                "Level:      {}/{}",
                sim.level_index() + 1,
                sim.config.level_count
            );
            println!("Player hp:  {}/{}", sim.player.hp, sim.player.max_hp);
            println!("Enemies:    {}", sim.enemies.len());
        }
        println!("Score:      {}", session.score());
        println!("Best score: {}", session.best_score);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Tilecade (native) starting...");
    headless::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is tilecade::web::start, this is just to satisfy the compiler
}
