// Widget rendering functions, one module per zone.

pub mod roster;
pub mod status_bar;
