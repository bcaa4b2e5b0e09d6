pub mod lpf;
