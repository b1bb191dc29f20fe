fn main() {
    // Exposes package and compiler versions to `ModelMetadata` via `built_info`.
    built::write_built_file().expect("Failed to generate build info");
}
