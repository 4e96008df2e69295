#![deny(warnings)]

pub mod config;
pub mod panel;
pub mod synth;
pub mod view;
pub mod voice;
