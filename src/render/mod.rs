pub mod hud;

pub use hud::hud_lines;
