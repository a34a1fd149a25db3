#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    deployer::start(std::env::args()).await
}
