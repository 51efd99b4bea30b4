#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), flight_client::ClientError> {
    flight_client::run_with_config().await
}
