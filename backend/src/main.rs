#[tokio::main]
async fn main() -> anyhow::Result<()> {
    attendance_server::start_server().await
}
