use wasm_bindgen::prelude::*;

pub mod error;
pub mod game;
pub mod hazards;
pub mod levels;
pub mod outcome;
pub mod palette;
pub mod render;
pub mod scene;
pub mod session;
pub mod signals;
pub mod steering;
pub mod unlock;

pub use error::SetupError;
pub use game::EggGame;
pub use levels::LevelCatalog;

shelter_web::export_game!(EggGame, "protect-the-egg");

/// Start a level directly. Returns whether a session is running afterwards.
#[wasm_bindgen]
pub fn game_start_level(id: u32) -> bool {
    with_runner(|r| {
        r.with_game(|game, ctx| {
            let _ = game.start_level(ctx, id);
            game.is_playing()
        })
    })
}

#[wasm_bindgen]
pub fn game_restart() {
    with_runner(|r| {
        r.with_game(|game, ctx| {
            let _ = game.restart(ctx);
        })
    });
}

#[wasm_bindgen]
pub fn game_menu() {
    with_runner(|r| r.with_game(|game, ctx| game.return_to_menu(ctx)));
}

#[wasm_bindgen]
pub fn get_highest_unlocked() -> u32 {
    with_runner(|r| r.game().highest_unlocked())
}

/// The level catalog grouped by category, as JSON for the menu.
#[wasm_bindgen]
pub fn get_level_catalog_json() -> String {
    with_runner(|r| match r.game().catalog().to_json() {
        Ok(json) => json,
        Err(e) => {
            log::error!("{:#}", e);
            "[]".to_string()
        }
    })
}
