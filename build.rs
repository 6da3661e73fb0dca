fn main() {
    // Generates `built.rs` in OUT_DIR with the package version and build metadata.
    if let Err(err) = built::write_built_file() {
        panic!("failed to acquire build-time information: {err}");
    }
}
