fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::path::PathBuf::from(std::env::var("OUT_DIR")?);

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .file_descriptor_set_path(out_dir.join("usage_descriptor.bin"))
        .compile_protos(&["../proto/micros/usage/v1/usage.proto"], &["../proto"])?;

    println!("cargo:rerun-if-changed=../proto/micros/usage/v1/usage.proto");

    Ok(())
}
