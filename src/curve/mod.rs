pub mod hilbert;
pub mod palette;
