pub mod audio;
pub mod recording;
pub mod settings;
