//! choice::core — data model and the preprocessing chain up to design
//! matrices.
//!
//! Order of use: [`io`] → [`reshape`] → [`data`] → [`split`] → [`schema`] →
//! [`encoder`] phase 1 → [`scaler`] → [`encoder`] phase 2. [`options`] holds
//! the configuration for every step.

pub mod data;
pub mod encoder;
pub mod io;
pub mod options;
pub mod reshape;
pub mod scaler;
pub mod schema;
pub mod split;
