pub mod command;
pub mod decode;
pub mod generate;
pub mod info;
mod output;
mod progress;
