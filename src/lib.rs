//! A typed, path-keyed and reference-counted resource cache.
//!
//! The `ResourceCache` mediates between the places bytes come from (`StreamProvider`s), the
//! code that turns bytes into usable objects (`ResourceLoader`s), the code that derives one
//! object from another (`ResourceConverter`s) or from an in-memory value (`ResourceCreator`s),
//! and everybody that holds on to the results.
//!
//! See the [`res`](res/index.html) module for an overview.

#[macro_use]
extern crate failure;
#[macro_use]
extern crate log;
#[macro_use]
extern crate bitflags;

pub mod errors;
pub mod utils;
#[macro_use]
pub mod res;

pub mod prelude {
    pub use crate::errors::Error;
    pub use crate::res::prelude::*;
}
