/// The generated protobuf bindings are committed under `src/generated`.
/// Set `LOCALNET_REGEN_PROTO=1` (requires `protoc` on PATH) to rebuild them
/// after editing `proto/localnet.proto`.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/localnet.proto");
    println!("cargo:rerun-if-env-changed=LOCALNET_REGEN_PROTO");

    if std::env::var_os("LOCALNET_REGEN_PROTO").is_none() {
        return Ok(());
    }

    tonic_build::configure()
        .out_dir("src/generated")
        .bytes(["."])
        .compile_protos(&["proto/localnet.proto"], &["proto"])
        .unwrap_or_else(|e| panic!("protobuf compile error: {e}"));

    Ok(())
}
