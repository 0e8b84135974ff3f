mod common;
mod media;
mod settings;
mod webhook;
