use user_testing::Service;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    user_testing::run(Service::Results).await
}
