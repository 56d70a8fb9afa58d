use core::{fmt, hint::black_box};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use frame_tonic_core::proto::{GetFrameRequest, frame_service_client::FrameServiceClient};
use futures::stream::{FuturesUnordered, StreamExt};
use std::{
    net::TcpStream,
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};
use tokio::runtime::Builder;
use tonic::{
    codec::CompressionEncoding,
    transport::{Channel, Uri},
};

const RPC_ADDR: &str = "127.0.0.1:50051";
const HEALTH_ADDR: &str = "127.0.0.1:50052";

#[derive(Clone, Copy, Debug)]
enum Compression {
    None,
    Gzip,
    Zstd,
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

impl From<Compression> for Option<CompressionEncoding> {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => None,
            Compression::Gzip => Some(CompressionEncoding::Gzip),
            Compression::Zstd => Some(CompressionEncoding::Zstd),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct GrpcBenchParams {
    concurrency: usize,
    compression: Compression,
}

fn grpc_bench(c: &mut Criterion) {
    let uri = Uri::try_from(format!("http://{RPC_ADDR}")).expect("Invalid URI");
    // Start the server. This may require a full compilation so set the timeout
    // high.
    let mut server = Command::new("cargo")
        .args([
            "run",
            "--bin",
            "frame-tonic-server",
            "--release",
            "--",
            "--rpc-addr",
            RPC_ADDR,
            "--health-addr",
            HEALTH_ADDR,
        ])
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("Failed to start frame-tonic-server");
    wait_for_port(RPC_ADDR, 300);

    let concurrency_cases = [1, 8, 64, 256];
    let compression_cases = [Compression::None, Compression::Gzip, Compression::Zstd];

    let mut cases = Vec::new();
    for &concurrency in &concurrency_cases {
        for &compression in &compression_cases {
            cases.push(GrpcBenchParams {
                concurrency,
                compression,
            });
        }
    }
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();

    for params in &cases {
        let mut group = c.benchmark_group("grpc/get_frame");
        group.throughput(Throughput::Elements(params.concurrency as u64));

        group.bench_function(
            format!(
                "conc/{}/comp/{}",
                params.concurrency, params.compression
            ),
            |b| {
                b.to_async(&rt).iter_custom(|iters| {
                    let uri = uri.clone();
                    async move {
                        let channel = Channel::builder(uri)
                            .connect()
                            .await
                            .expect("Failed to connect to server");

                        let start = Instant::now();
                        for _ in 0..iters {
                            run_get_frame_bench(&channel, params).await;
                        }
                        start.elapsed()
                    }
                });
            },
        );

        group.finish();
    }

    if server.kill().is_err() {
        eprintln!("failed to kill server");
    }
}

async fn run_get_frame_bench(channel: &Channel, params: &GrpcBenchParams) {
    let mut tasks = FuturesUnordered::new();

    for id in 0..params.concurrency as i32 {
        let channel = channel.clone();
        let compression = params.compression;

        tasks.push(tokio::spawn(async move {
            let mut client = FrameServiceClient::new(channel);
            if let Some(encoding) = compression.into() {
                client = client.accept_compressed(encoding).send_compressed(encoding);
            }

            let frame = client
                .get_frame(GetFrameRequest { id })
                .await
                .expect("get_frame failed")
                .into_inner();
            assert_eq!(frame.id, id, "frame id must echo the request");
            black_box(frame);
        }));
    }

    while let Some(res) = tasks.next().await {
        res.unwrap();
    }
}

pub fn wait_for_port(addr: &str, timeout_secs: u64) {
    let start = Instant::now();
    while start.elapsed().as_secs() < timeout_secs {
        if TcpStream::connect(addr).is_ok() {
            return;
        }
        thread::sleep(Duration::from_millis(100));
    }
    panic!("Server did not start listening on {}", addr);
}

criterion_group!(grpc_benches, grpc_bench);
criterion_main!(grpc_benches);
