/// Builds the gRPC client and server code for `proto/frame.proto` using
/// `tonic-prost-build`.
///
/// Besides the message types and service bindings, the build emits an encoded
/// `FileDescriptorSet` (`frame_descriptor.bin`) into `OUT_DIR`. The server
/// feeds it to `tonic-reflection` so tools like `grpcurl` can discover
/// `frame.FrameService` without a local copy of the proto.
///
/// # Panics
///
/// Panics if `OUT_DIR` is missing or code generation fails; both abort the
/// build with the underlying error.
use std::env;
use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let descriptor_path = out_dir.join("frame_descriptor.bin");

    println!("cargo:rerun-if-changed=proto/frame.proto");

    let mut config = tonic_prost_build::Config::new();
    config.file_descriptor_set_path(&descriptor_path);

    tonic_prost_build::configure()
        .compile_with_config(config, &["proto/frame.proto"], &["proto"])
        .unwrap();
}
