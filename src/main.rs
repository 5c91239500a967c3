use clap::Parser;
use rust_board_games::config::{Config, init_logging};
use rust_board_games::ui::GameController;
use tracing::info;

fn main() {
    let config = Config::parse();
    init_logging(config.log_level.as_deref());
    info!(game = %config.game, difficulty = %config.difficulty, "starting");

    let mut controller = GameController::new(config);
    controller.run();
}
