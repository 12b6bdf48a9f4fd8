use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Use the bundled protoc so builds do not depend on a system install
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    let well_known = protoc_bin_vendored::include_path()?;

    tonic_build::configure()
        .build_server(false)
        .compile_protos(
            &["proto/bfd.proto", "proto/gobgp.proto"],
            &[std::path::PathBuf::from("proto"), well_known],
        )?;

    println!("cargo:rerun-if-changed=proto");
    Ok(())
}
