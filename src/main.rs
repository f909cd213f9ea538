//! # Voxel Stream Demo Entry Point
//!
//! Calls into the library's `run()`, which streams chunks around a viewpoint
//! flying over generated terrain without a GPU.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

fn main() {
    if let Err(err) = voxel_stream::run() {
        log::error!("{err}");
        eprintln!("voxel-stream: {err}");
        std::process::exit(1);
    }
}
