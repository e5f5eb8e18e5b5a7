// Build script for the metronome engine crate.
//
// Nothing to generate: the engine is a plain Rust library with optional
// `desktop` (cpal) and `web` (wasm-bindgen/web-sys) backends selected at
// compile time via Cargo features.

fn main() {
    println!("cargo:rerun-if-changed=src/api.rs");
}
