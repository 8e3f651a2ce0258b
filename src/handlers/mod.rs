// handlers/mod.rs - Handler tiers
//
// Public (no auth) → Protected (JWT auth, principal injected by middleware)
pub mod protected;
pub mod public;

#[cfg(test)]
mod tests;
