mod canvas;

pub use canvas::{braille_char, BrailleCanvas};
