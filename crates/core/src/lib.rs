#![deny(warnings)]

pub mod align;
pub mod config;
pub mod convert;
pub mod intake;
pub mod pipeline;
pub mod recognize;
pub mod score;
pub mod text;
