#[actix_web::main]
async fn main() -> std::io::Result<()> {
    barangay_server::run().await
}
