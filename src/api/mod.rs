pub mod presence;
pub mod terminal;
