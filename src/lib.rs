pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;

pub fn build_state() -> anyhow::Result<state::AppState> {
    let seed_raw = include_str!("../seed/trivia_seed.json");
    let seed: state::SeedData = serde_json::from_str(seed_raw)?;
    Ok(state::AppState::new(seed))
}
