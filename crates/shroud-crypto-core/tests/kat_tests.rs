#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

//! Known-answer tests for every primitive.
//!
//! Vectors are locked: a change here means previously stored blobs no
//! longer decrypt.

mod kat_vectors;
