//! Compile the EigenDA v2 protobufs.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_protos(
            &[
                "../../proto/common/common.proto",
                "../../proto/common/v2/common_v2.proto",
                "../../proto/disperser/v2/disperser_v2.proto",
                "../../proto/retriever/v2/retriever_v2.proto",
            ],
            &["../../proto"],
        )?;

    Ok(())
}
