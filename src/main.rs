#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tabular_analytics_lib::run().await
}
