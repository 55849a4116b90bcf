//! Runtime values: the tagged model and its canonical literal form.

pub mod canonical;
pub mod model;
