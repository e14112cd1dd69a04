mod align;
pub use align::AlignApp;

mod filter_len;
pub use filter_len::FilterLenApp;
